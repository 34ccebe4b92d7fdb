//! The cleaning pipeline.
//!
//! Four ordered stages run over an in-memory record set, each reading a
//! snapshot, producing the next one, and emitting one audit log entry with
//! before and after statistics:
//!
//! 1. **Imputation** fills nulls so later stages see complete columns.
//! 2. **Outlier detection** flags (or removes) IQR outliers while the
//!    original values are still visible.
//! 3. **Deduplication** runs before standardisation so equality is judged
//!    on the lossless values.
//! 4. **Standardisation** runs last, guaranteeing the output format.
//!
//! The audit log is the canonical record of what cleaning did; every
//! user-facing summary derives from it.

pub mod auto_config;
pub mod datetime;
pub mod dedupe;
pub mod executor;
pub mod impute;
pub mod outliers;
pub mod report;
pub mod stage;
pub mod standardize;
pub mod stats;

pub use auto_config::{build_auto_config, has_exact_duplicates, merge_with_defaults};
pub use executor::{CleaningOutcome, ExecutorOptions, run_pipeline};
pub use report::{CleaningReport, OperationSummary, generate_report};
pub use stage::{CleaningStage, StageContext, StageOutcome};
pub use stats::snapshot;
