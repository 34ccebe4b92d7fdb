//! Rule-based domain classification.
//!
//! The classifier scores the combined column universe of a project against
//! the domain signature library. Column comparison is case-insensitive and
//! whitespace/underscore-insensitive; keyword matching is substring after
//! the same normalisation and counts at most once per domain.
//!
//! Scoring per domain:
//!
//! ```text
//! score      = 30 * primary hits + 15 * secondary hits + 10 * keyword hits
//! max        = 30 * |primary|    + 15 * |secondary|    + 10 * |keywords|
//! confidence = round(100 * score / max)
//! ```
//!
//! Confidence at or above 85 auto-detects; from 65 the top three domains
//! are offered; below that the full list is returned. Score ties break by
//! library declaration order.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use vantage_model::{DomainDecision, DomainScore};
use vantage_standards::{DomainSignature, SignatureLibrary};

const PRIMARY_WEIGHT: u32 = 30;
const SECONDARY_WEIGHT: u32 = 15;
const KEYWORD_WEIGHT: u32 = 10;

const AUTO_DETECT_CONFIDENCE: u8 = 85;
const SHOW_TOP_3_CONFIDENCE: u8 = 65;

/// Outcome of classifying one column universe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Classification {
    pub domain: String,
    pub confidence: u8,
    pub decision: DomainDecision,
    /// Primary signature columns found in the universe.
    pub primary_matches: Vec<String>,
    /// Secondary signature columns found in the universe.
    pub secondary_matches: Vec<String>,
    /// Keywords found as substrings of column names.
    pub keyword_matches: Vec<String>,
    /// The three best domains by score, for the review band.
    pub top_alternatives: Vec<String>,
    /// Complete score map over the signature library.
    pub all_scores: BTreeMap<String, DomainScore>,
}

/// Normalises a column name for comparison: case, whitespace and
/// underscores are not significant.
pub fn normalize_column(name: &str) -> String {
    name.chars()
        .filter(|ch| !ch.is_whitespace() && *ch != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

struct DomainMatch {
    primary: Vec<String>,
    secondary: Vec<String>,
    keywords: Vec<String>,
    score: DomainScore,
}

fn score_domain(signature: &DomainSignature, universe: &[String]) -> DomainMatch {
    let primary: Vec<String> = signature
        .primary_columns
        .iter()
        .filter(|column| universe.contains(&normalize_column(column)))
        .cloned()
        .collect();
    let secondary: Vec<String> = signature
        .secondary_columns
        .iter()
        .filter(|column| universe.contains(&normalize_column(column)))
        .cloned()
        .collect();
    let keywords: Vec<String> = signature
        .keywords
        .iter()
        .filter(|keyword| {
            let needle = normalize_column(keyword);
            !needle.is_empty() && universe.iter().any(|column| column.contains(&needle))
        })
        .cloned()
        .collect();

    let score = PRIMARY_WEIGHT * primary.len() as u32
        + SECONDARY_WEIGHT * secondary.len() as u32
        + KEYWORD_WEIGHT * keywords.len() as u32;
    let max_score = PRIMARY_WEIGHT * signature.primary_columns.len() as u32
        + SECONDARY_WEIGHT * signature.secondary_columns.len() as u32
        + KEYWORD_WEIGHT * signature.keywords.len() as u32;
    let confidence = if max_score == 0 {
        0
    } else {
        (100.0 * f64::from(score) / f64::from(max_score)).round() as u8
    };

    DomainMatch {
        primary,
        secondary,
        keywords,
        score: DomainScore {
            score,
            max_score,
            confidence: confidence.min(100),
        },
    }
}

/// Classifies a column universe against the signature library.
pub fn classify(columns: &[String], library: &SignatureLibrary) -> Classification {
    let universe: Vec<String> = columns.iter().map(|name| normalize_column(name)).collect();

    let mut matches: Vec<(&DomainSignature, DomainMatch)> = library
        .domains()
        .iter()
        .map(|signature| (signature, score_domain(signature, &universe)))
        .collect();
    // Stable sort keeps library declaration order on equal scores.
    matches.sort_by(|a, b| b.1.score.score.cmp(&a.1.score.score));

    let all_scores: BTreeMap<String, DomainScore> = matches
        .iter()
        .map(|(signature, matched)| (signature.domain.clone(), matched.score))
        .collect();
    let top_alternatives: Vec<String> = matches
        .iter()
        .take(3)
        .map(|(signature, _)| signature.domain.clone())
        .collect();

    let (best_signature, best_match) = matches
        .into_iter()
        .next()
        .expect("signature library is never empty");

    let confidence = best_match.score.confidence;
    let decision = if confidence >= AUTO_DETECT_CONFIDENCE {
        DomainDecision::AutoDetect
    } else if confidence >= SHOW_TOP_3_CONFIDENCE {
        DomainDecision::ShowTop3
    } else {
        DomainDecision::ManualSelect
    };

    debug!(
        domain = %best_signature.domain,
        confidence,
        decision = %decision,
        "classified column universe"
    );

    Classification {
        domain: best_signature.domain.clone(),
        confidence,
        decision,
        primary_matches: best_match.primary,
        secondary_matches: best_match.secondary,
        keyword_matches: best_match.keywords,
        top_alternatives,
        all_scores,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signature(
        domain: &str,
        primary: &[&str],
        secondary: &[&str],
        keywords: &[&str],
    ) -> DomainSignature {
        DomainSignature {
            domain: domain.to_string(),
            label: domain.to_string(),
            primary_columns: primary.iter().map(|s| (*s).to_string()).collect(),
            secondary_columns: secondary.iter().map(|s| (*s).to_string()).collect(),
            keywords: keywords.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    fn columns(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn normalisation_ignores_case_whitespace_and_underscores() {
        assert_eq!(normalize_column("Order ID"), "orderid");
        assert_eq!(normalize_column("order_id"), "orderid");
        assert_eq!(normalize_column("ORDERID"), "orderid");
    }

    #[test]
    fn subscription_universe_auto_detects_saas() {
        let library = SignatureLibrary::load_default().unwrap();
        let result = classify(
            &columns(&[
                "subscription_id",
                "customer_id",
                "mrr",
                "arr",
                "churn",
                "plan",
                "tier",
                "signup_date",
            ]),
            &library,
        );
        assert_eq!(result.domain, "saas");
        assert!(result.confidence >= 85, "confidence {}", result.confidence);
        assert_eq!(result.decision, DomainDecision::AutoDetect);
        for expected in ["subscription_id", "mrr", "arr", "churn", "customer_id"] {
            assert!(
                result.primary_matches.iter().any(|m| m == expected),
                "missing primary match {expected}"
            );
        }
    }

    #[test]
    fn score_map_covers_every_domain_with_bounded_confidence() {
        let library = SignatureLibrary::load_default().unwrap();
        let result = classify(&columns(&["OrderID", "CustomerID", "Date"]), &library);
        assert_eq!(result.all_scores.len(), library.len());
        for score in result.all_scores.values() {
            assert!(score.confidence <= 100);
        }
        let top_confidence = result.all_scores.get(&result.domain).unwrap().confidence;
        assert_eq!(top_confidence, result.confidence);
    }

    #[test]
    fn sparse_order_columns_rank_retail_or_ecommerce_first() {
        let library = SignatureLibrary::load_default().unwrap();
        let result = classify(&columns(&["OrderID", "CustomerID", "Date"]), &library);
        assert!(result.domain == "retail" || result.domain == "ecommerce");
    }

    #[test]
    fn band_boundaries_are_inclusive() {
        // One primary, ten secondary, two keywords: max = 30 + 150 + 20 = 200.
        let library = SignatureLibrary::from_signatures(vec![signature(
            "banded",
            &["p0"],
            &["s0", "s1", "s2", "s3", "s4", "s5", "s6", "s7", "s8", "s9"],
            &["kwa", "kwb"],
        )])
        .unwrap();

        // 30 + 8*15 + 2*10 = 170 of 200 = 85 exactly -> auto_detect.
        let auto = columns(&[
            "p0", "s0", "s1", "s2", "s3", "s4", "s5", "s6", "s7", "has_kwa", "has_kwb",
        ]);
        let result = classify(&auto, &library);
        assert_eq!(result.confidence, 85);
        assert_eq!(result.decision, DomainDecision::AutoDetect);

        // 30 + 6*15 + 10 = 130 of 200 = 65 exactly -> show_top_3.
        let review = columns(&["p0", "s0", "s1", "s2", "s3", "s4", "s5", "has_kwa"]);
        let result = classify(&review, &library);
        assert_eq!(result.confidence, 65);
        assert_eq!(result.decision, DomainDecision::ShowTop3);

        // 30 + 6*15 = 120 of 200 = 60 -> manual_select.
        let manual = columns(&["p0", "s0", "s1", "s2", "s3", "s4", "s5"]);
        let result = classify(&manual, &library);
        assert_eq!(result.confidence, 60);
        assert_eq!(result.decision, DomainDecision::ManualSelect);
    }

    #[test]
    fn ties_break_by_declaration_order() {
        let library = SignatureLibrary::from_signatures(vec![
            signature("first", &["shared"], &[], &[]),
            signature("second", &["shared"], &[], &[]),
        ])
        .unwrap();
        let result = classify(&columns(&["shared"]), &library);
        assert_eq!(result.domain, "first");
    }

    #[test]
    fn keywords_count_once_per_domain() {
        let library = SignatureLibrary::from_signatures(vec![signature(
            "kw",
            &["anchor"],
            &[],
            &["order"],
        )])
        .unwrap();
        let result = classify(
            &columns(&["order_id", "order_date", "order_total", "anchor"]),
            &library,
        );
        let score = result.all_scores.get("kw").unwrap();
        // 30 for the primary anchor and 10 for the keyword, despite three
        // columns containing it.
        assert_eq!(score.score, 40);
    }
}
