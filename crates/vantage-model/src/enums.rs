//! Type-safe enumerations for pipeline metadata.
//!
//! Everywhere the wire formats carry free-form strings (statuses, decisions,
//! operation tags, strategy tokens) the model uses closed enumerations with
//! exhaustive matching. The `as_str` forms are the persisted wire strings.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle of a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    Active,
    Processing,
    Completed,
    Failed,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Active => "active",
            ProjectStatus::Processing => "processing",
            ProjectStatus::Completed => "completed",
            ProjectStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of a single uploaded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    Queued,
    Processing,
    Completed,
    Failed,
}

impl UploadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadStatus::Queued => "queued",
            UploadStatus::Processing => "processing",
            UploadStatus::Completed => "completed",
            UploadStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of an asynchronous job (cleaning, extraction).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStatus::Running)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of a domain detection job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DomainJobStatus {
    Pending,
    Completed,
    Confirmed,
}

impl DomainJobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DomainJobStatus::Pending => "pending",
            DomainJobStatus::Completed => "completed",
            DomainJobStatus::Confirmed => "confirmed",
        }
    }
}

impl fmt::Display for DomainJobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User-experience decision derived from the classification confidence band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DomainDecision {
    /// Confidence at or above 85: accept the top domain without review.
    #[serde(rename = "auto_detect")]
    AutoDetect,
    /// Confidence in [65, 85): offer the top three domains for selection.
    #[serde(rename = "show_top_3")]
    ShowTop3,
    /// Confidence below 65: offer the full domain list.
    #[serde(rename = "manual_select")]
    ManualSelect,
    /// The user confirmed a domain explicitly.
    #[serde(rename = "confirmed")]
    Confirmed,
}

impl DomainDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            DomainDecision::AutoDetect => "auto_detect",
            DomainDecision::ShowTop3 => "show_top_3",
            DomainDecision::ManualSelect => "manual_select",
            DomainDecision::Confirmed => "confirmed",
        }
    }
}

impl fmt::Display for DomainDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validity of a detected or user-specified relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationshipStatus {
    Valid,
    Invalid,
    Manual,
}

impl RelationshipStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationshipStatus::Valid => "valid",
            RelationshipStatus::Invalid => "invalid",
            RelationshipStatus::Manual => "manual",
        }
    }
}

impl fmt::Display for RelationshipStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cardinality of a relationship. One-to-many is the only detected kind;
/// the target side holds the unique column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationshipKind {
    #[serde(rename = "1:many")]
    OneToMany,
}

impl RelationshipKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationshipKind::OneToMany => "1:many",
        }
    }
}

impl fmt::Display for RelationshipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The four ordered cleaning pipeline stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CleaningOperation {
    Imputation,
    OutlierDetection,
    Deduplication,
    Standardization,
}

impl CleaningOperation {
    /// Fixed execution order: imputing first preserves outlier visibility,
    /// dedup before standardisation preserves lossless equality, and
    /// standardisation last guarantees the output format.
    pub const ORDER: [CleaningOperation; 4] = [
        CleaningOperation::Imputation,
        CleaningOperation::OutlierDetection,
        CleaningOperation::Deduplication,
        CleaningOperation::Standardization,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CleaningOperation::Imputation => "imputation",
            CleaningOperation::OutlierDetection => "outlier_detection",
            CleaningOperation::Deduplication => "deduplication",
            CleaningOperation::Standardization => "standardization",
        }
    }

    /// Progress percentage once this stage has finished.
    pub fn completion_percent(&self) -> u8 {
        match self {
            CleaningOperation::Imputation => 25,
            CleaningOperation::OutlierDetection => 50,
            CleaningOperation::Deduplication => 75,
            CleaningOperation::Standardization => 100,
        }
    }
}

impl fmt::Display for CleaningOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one audited operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogStatus {
    Success,
    Error,
}

impl LogStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogStatus::Success => "success",
            LogStatus::Error => "error",
        }
    }
}

impl fmt::Display for LogStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical semantic type inferred for a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Numeric,
    Date,
    Phone,
    Email,
    Boolean,
    Categorical,
    TextId,
    Text,
}

impl ColumnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Numeric => "numeric",
            ColumnType::Date => "date",
            ColumnType::Phone => "phone",
            ColumnType::Email => "email",
            ColumnType::Boolean => "boolean",
            ColumnType::Categorical => "categorical",
            ColumnType::TextId => "text_id",
            ColumnType::Text => "text",
        }
    }

    /// Columns compared by case-insensitive string equality during
    /// deduplication.
    pub fn is_text_like(&self) -> bool {
        matches!(self, ColumnType::Text | ColumnType::Categorical)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColumnType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "numeric" => Ok(ColumnType::Numeric),
            "date" => Ok(ColumnType::Date),
            "phone" => Ok(ColumnType::Phone),
            "email" => Ok(ColumnType::Email),
            "boolean" => Ok(ColumnType::Boolean),
            "categorical" => Ok(ColumnType::Categorical),
            "text_id" => Ok(ColumnType::TextId),
            "text" => Ok(ColumnType::Text),
            _ => Err(format!("Unknown column type: {s}")),
        }
    }
}

/// Null replacement strategy for one column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImputationStrategy {
    #[serde(rename = "MEDIAN")]
    Median,
    #[serde(rename = "MODE")]
    Mode,
    #[serde(rename = "FORWARD-FILL")]
    ForwardFill,
}

impl ImputationStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImputationStrategy::Median => "MEDIAN",
            ImputationStrategy::Mode => "MODE",
            ImputationStrategy::ForwardFill => "FORWARD-FILL",
        }
    }
}

impl fmt::Display for ImputationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImputationStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "MEDIAN" => Ok(ImputationStrategy::Median),
            "MODE" => Ok(ImputationStrategy::Mode),
            "FORWARD-FILL" | "FORWARD_FILL" => Ok(ImputationStrategy::ForwardFill),
            _ => Err(format!("Unknown imputation strategy: {s}")),
        }
    }
}

/// Output format rule for one column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StandardizationRule {
    #[serde(rename = "E164")]
    E164,
    #[serde(rename = "LOWERCASE")]
    Lowercase,
    #[serde(rename = "ISO8601")]
    Iso8601,
    #[serde(rename = "NUMBER")]
    Number,
}

impl StandardizationRule {
    pub fn as_str(&self) -> &'static str {
        match self {
            StandardizationRule::E164 => "E164",
            StandardizationRule::Lowercase => "LOWERCASE",
            StandardizationRule::Iso8601 => "ISO8601",
            StandardizationRule::Number => "NUMBER",
        }
    }
}

impl fmt::Display for StandardizationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StandardizationRule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "E164" => Ok(StandardizationRule::E164),
            "LOWERCASE" => Ok(StandardizationRule::Lowercase),
            "ISO8601" => Ok(StandardizationRule::Iso8601),
            "NUMBER" => Ok(StandardizationRule::Number),
            _ => Err(format!("Unknown standardization rule: {s}")),
        }
    }
}

/// Chart rendering kinds for dashboard specs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Line,
    Bar,
    Pie,
    Scatter,
    KpiCard,
}

impl ChartKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChartKind::Line => "line",
            ChartKind::Bar => "bar",
            ChartKind::Pie => "pie",
            ChartKind::Scatter => "scatter",
            ChartKind::KpiCard => "kpi_card",
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
