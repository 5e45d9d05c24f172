//! Per-resource copy outcomes

use std::fmt;

use cx_porter_core::ResourceCategory;
use serde::{Deserialize, Serialize};

/// What happened to one resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "reason", rename_all = "snake_case")]
pub enum CopyOutcome {
    Created,
    /// The destination already had a resource with this display name
    SkippedDuplicate,
    /// Creation or reference rewriting failed
    Failed(String),
}

impl CopyOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopyRecord {
    pub category: ResourceCategory,
    pub display_name: String,
    #[serde(flatten)]
    pub outcome: CopyOutcome,
}

/// Outcomes of a copy run, in processing order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopyReport {
    records: Vec<CopyRecord>,
}

impl CopyReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, category: ResourceCategory, display_name: impl Into<String>, outcome: CopyOutcome) {
        self.records.push(CopyRecord {
            category,
            display_name: display_name.into(),
            outcome,
        });
    }

    pub fn records(&self) -> &[CopyRecord] {
        &self.records
    }

    /// Outcome of the first record matching category and display name
    pub fn outcome_of(&self, category: ResourceCategory, display_name: &str) -> Option<&CopyOutcome> {
        self.records
            .iter()
            .find(|r| r.category == category && r.display_name == display_name)
            .map(|r| &r.outcome)
    }

    pub fn created(&self) -> usize {
        self.count(|o| matches!(o, CopyOutcome::Created))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, CopyOutcome::SkippedDuplicate))
    }

    pub fn failed(&self) -> usize {
        self.count(CopyOutcome::is_failed)
    }

    fn count(&self, predicate: impl Fn(&CopyOutcome) -> bool) -> usize {
        self.records.iter().filter(|r| predicate(&r.outcome)).count()
    }

    /// No resource failed (duplicates are fine)
    pub fn is_clean(&self) -> bool {
        self.failed() == 0
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn merge(&mut self, other: CopyReport) {
        self.records.extend(other.records);
    }
}

impl fmt::Display for CopyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} created, {} skipped, {} failed",
            self.created(),
            self.skipped(),
            self.failed()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_and_lookup() {
        let mut report = CopyReport::new();
        report.push(ResourceCategory::Webhooks, "OrderWebhook", CopyOutcome::Created);
        report.push(ResourceCategory::Intents, "Order Pizza", CopyOutcome::SkippedDuplicate);
        assert!(report.is_clean());

        report.push(
            ResourceCategory::Intents,
            "Cancel Order",
            CopyOutcome::Failed("Lookup error".to_string()),
        );
        assert!(!report.is_clean());
        assert_eq!((report.created(), report.skipped(), report.failed()), (1, 1, 1));
        assert_eq!(
            report.outcome_of(ResourceCategory::Intents, "Order Pizza"),
            Some(&CopyOutcome::SkippedDuplicate)
        );
        assert_eq!(report.to_string(), "1 created, 1 skipped, 1 failed");
    }

    #[test]
    fn test_record_serialization() {
        let mut report = CopyReport::new();
        report.push(ResourceCategory::EntityTypes, "size", CopyOutcome::Failed("boom".to_string()));
        let json = serde_json::to_value(&report).unwrap();
        let record = &json["records"][0];
        assert_eq!(record["category"], "entities");
        assert_eq!(record["outcome"], "failed");
        assert_eq!(record["reason"], "boom");
    }
}
