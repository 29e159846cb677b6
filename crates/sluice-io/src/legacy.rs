//! Normalization of legacy structure properties.
//!
//! Older structure files carry properties that are no longer supported, and
//! older key spellings for properties that still are. Unsupported properties
//! are removed from their record (with a warning); old spellings are renamed.
//! Records themselves are never dropped.

use sluice_core::DiagnosticIssue;
use tracing::{debug, warn};

use crate::ini::Record;

struct RemovalRule {
    section: &'static str,
    key: &'static str,
    applies: fn(&str) -> bool,
    reason: &'static str,
}

fn any_value(_: &str) -> bool {
    true
}

fn legacy_friction(value: &str) -> bool {
    ["StricklerNikuradse", "deBosBijkerk"]
        .iter()
        .any(|legacy| value.trim().eq_ignore_ascii_case(legacy))
}

const REMOVAL_RULES: &[RemovalRule] = &[
    RemovalRule {
        section: "Structure",
        key: "compound",
        applies: any_value,
        reason: "compound membership is defined by compound sections",
    },
    RemovalRule {
        section: "Structure",
        key: "compoundName",
        applies: any_value,
        reason: "compound membership is defined by compound sections",
    },
    RemovalRule {
        section: "Structure",
        key: "polylinefile",
        applies: any_value,
        reason: "polyline geometry is not supported for branch structures",
    },
    RemovalRule {
        section: "Structure",
        key: "frictionType",
        applies: legacy_friction,
        reason: "friction type is no longer supported, the default friction is used",
    },
    RemovalRule {
        section: "Structure",
        key: "bedFrictionType",
        applies: legacy_friction,
        reason: "friction type is no longer supported, the default friction is used",
    },
];

/// Old key spelling and its current name.
const RENAMES: &[(&str, &str)] = &[
    ("levelcenter", "crestLevel"),
    ("crest_level", "crestLevel"),
    ("sill_level", "crestLevel"),
    ("widthcenter", "crestWidth"),
    ("lower_edge_level", "gateLowerEdgeLevel"),
    ("opening_width", "gateOpeningWidth"),
    ("door_opening_width", "gateOpeningWidth"),
    ("widthleftW1", "upstream1Width"),
    ("levelleftZb1", "upstream1Level"),
    ("widthleftWsdl", "upstream2Width"),
    ("levelleftZbsl", "upstream2Level"),
    ("widthrightWsdr", "downstream1Width"),
    ("levelrightZbsr", "downstream1Level"),
    ("widthrightW2", "downstream2Width"),
    ("levelrightZb2", "downstream2Level"),
];

/// One removed property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyDiagnostic {
    /// Structure id if the record has one, section name otherwise
    pub record: String,
    pub key: String,
    pub value: String,
    pub line: usize,
    pub reason: &'static str,
}

impl LegacyDiagnostic {
    pub fn message(&self) -> String {
        format!(
            "Removed unsupported property '{} = {}': {}",
            self.key, self.value, self.reason
        )
    }

    pub fn to_issue(&self) -> DiagnosticIssue {
        DiagnosticIssue::warning("legacy", self.message())
            .with_entity(self.record.clone())
            .with_line(self.line)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Normalized {
    pub records: Vec<Record>,
    pub removed: Vec<LegacyDiagnostic>,
}

/// Remove unsupported legacy properties and rename old keys.
pub fn normalize(records: Vec<Record>) -> Normalized {
    let mut removed = Vec::new();
    let records = records
        .into_iter()
        .map(|record| normalize_record(record, &mut removed))
        .collect();
    Normalized { records, removed }
}

fn normalize_record(mut record: Record, removed: &mut Vec<LegacyDiagnostic>) -> Record {
    let label = record
        .value("id")
        .map(str::to_string)
        .unwrap_or_else(|| record.name.clone());

    let section = record.name.clone();
    record.properties.retain(|property| {
        let rule = REMOVAL_RULES.iter().find(|rule| {
            section.eq_ignore_ascii_case(rule.section)
                && property.key.eq_ignore_ascii_case(rule.key)
                && (rule.applies)(&property.value)
        });
        let Some(rule) = rule else {
            return true;
        };

        let diagnostic = LegacyDiagnostic {
            record: label.clone(),
            key: property.key.clone(),
            value: property.value.clone(),
            line: property.line,
            reason: rule.reason,
        };
        warn!(
            structure = %diagnostic.record,
            line = diagnostic.line,
            "{}",
            diagnostic.message()
        );
        removed.push(diagnostic);
        false
    });

    if record.is_section("Structure") {
        for property in &mut record.properties {
            if let Some((old, new)) = RENAMES
                .iter()
                .find(|(old, _)| property.key.eq_ignore_ascii_case(old))
            {
                debug!(structure = %label, line = property.line, "Renamed '{}' to '{}'", old, new);
                property.key = new.to_string();
            }
        }
    }

    record
}

#[cfg(test)]
mod tests {
    use super::*;

    fn structure(id: &str) -> Record {
        Record::new("Structure", 1)
            .with_property("id", id, 2)
            .with_property("type", "culvert", 3)
    }

    #[test]
    fn test_removes_unconditional_legacy_keys() {
        let record = structure("C1")
            .with_property("compound", "1", 4)
            .with_property("CompoundName", "CS1", 5)
            .with_property("polylinefile", "c1.pli", 6);

        let normalized = normalize(vec![record]);
        let keys: Vec<&str> = normalized.records[0]
            .properties
            .iter()
            .map(|p| p.key.as_str())
            .collect();

        assert_eq!(keys, vec!["id", "type"]);
        assert_eq!(normalized.removed.len(), 3);
        assert_eq!(normalized.removed[1].line, 5);
        assert_eq!(normalized.removed[1].record, "C1");
    }

    #[test]
    fn test_friction_removed_only_for_legacy_values() {
        let legacy = structure("C1").with_property("bedFrictionType", "stricklerNikuradse", 4);
        let current = structure("C2").with_property("bedFrictionType", "Manning", 4);

        let normalized = normalize(vec![legacy, current]);
        assert!(normalized.records[0].property("bedFrictionType").is_none());
        assert_eq!(normalized.records[1].value("bedFrictionType"), Some("Manning"));
        assert_eq!(normalized.removed.len(), 1);
    }

    #[test]
    fn test_other_sections_untouched() {
        let general = Record::new("General", 1).with_property("compound", "1", 2);
        let normalized = normalize(vec![general.clone()]);
        assert_eq!(normalized.records[0], general);
        assert!(normalized.removed.is_empty());
    }

    #[test]
    fn test_old_keys_renamed() {
        let record = structure("G1")
            .with_property("levelcenter", "1.5", 4)
            .with_property("widthleftW1", "10", 5);

        let normalized = normalize(vec![record]);
        let record = &normalized.records[0];
        assert_eq!(record.value("crestLevel"), Some("1.5"));
        assert_eq!(record.value("upstream1Width"), Some("10"));
        assert!(normalized.removed.is_empty());
    }

    #[test]
    fn test_issue_carries_line_and_entity() {
        let normalized = normalize(vec![structure("W9").with_property("polylinefile", "w.pli", 8)]);
        let issue = normalized.removed[0].to_issue();
        assert_eq!(issue.line, Some(8));
        assert_eq!(issue.entity.as_deref(), Some("W9"));
        assert!(issue.message.contains("polylinefile"));
    }
}
