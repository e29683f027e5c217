//! Structural validation of candidate archives.
//!
//! Runs on untyped JSON before anything is deserialized, so a bad archive
//! reports every problem at once instead of the first serde error. All
//! rules are checked and accumulated; warnings never make an archive
//! invalid.

use std::collections::HashSet;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::model::EntityKind;
use crate::version::{Compatibility, check_compatibility};

// ── Known keys ───────────────────────────────────────────────

/// Singleton collections, which must be objects when present.
pub const SINGLETON_KEYS: [&str; 3] = ["settings", "automationServerConfig", "deployPreferences"];

/// Collections of which at least one must carry data.
const CONTENT_KEYS: [&str; 4] = ["projects", "workflows", "worktreeTemplates", "settings"];

const EXPORT_TYPES: [&str; 2] = ["full", "partial"];

/// Entity fields holding Unix milliseconds or a date string.
const TIMESTAMP_FIELDS: [&str; 2] = ["createdAt", "updatedAt"];

// ── Report ───────────────────────────────────────────────────

/// Every problem found in one candidate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }
}

// ── Rules ────────────────────────────────────────────────────

/// Validate a candidate archive.
#[must_use]
pub fn validate_archive(candidate: &Value) -> ValidationReport {
    let mut report = ValidationReport::default();

    let Some(root) = candidate.as_object() else {
        report.error("Archive must be a JSON object");
        return report;
    };

    check_metadata(root.get("metadata"), &mut report);
    check_data(root.get("data"), &mut report);

    tracing::debug!(
        errors = report.errors.len(),
        warnings = report.warnings.len(),
        "Archive validated"
    );
    report
}

fn check_metadata(metadata: Option<&Value>, report: &mut ValidationReport) {
    let Some(metadata) = metadata else {
        report.error("Missing metadata");
        return;
    };
    let Some(metadata) = metadata.as_object() else {
        report.error("metadata must be an object");
        return;
    };

    match metadata.get("version").and_then(Value::as_str) {
        None => report.error("metadata.version must be a string"),
        Some(version) => match check_compatibility(version) {
            Ok(Compatibility::Supported) => {}
            Ok(newer @ Compatibility::Newer { .. }) => {
                report.warnings.extend(newer.warning());
            }
            Err(e) => report.error(e.to_string()),
        },
    }

    if !metadata.get("exportedAt").is_some_and(Value::is_string) {
        report.error("metadata.exportedAt must be a string");
    }

    match metadata.get("exportType").and_then(Value::as_str) {
        Some(t) if EXPORT_TYPES.contains(&t) => {}
        _ => report.error("metadata.exportType must be \"full\" or \"partial\""),
    }
}

fn check_data(data: Option<&Value>, report: &mut ValidationReport) {
    let Some(data) = data else {
        report.error("Missing data");
        return;
    };
    let Some(data) = data.as_object() else {
        report.error("data must be an object");
        return;
    };

    if !CONTENT_KEYS.iter().any(|key| has_content(data, key)) {
        report.error(
            "data must contain at least one of projects, workflows, worktreeTemplates or settings",
        );
    }

    for kind in EntityKind::ALL {
        if let Some(value) = data.get(kind.collection_key()) {
            check_collection(kind, value, report);
        }
    }

    if let Some(value) = data.get("deployAccounts") {
        if !value.is_array() && !value.is_null() {
            report.error("data.deployAccounts must be an array");
        }
    }

    for key in SINGLETON_KEYS {
        if let Some(value) = data.get(key) {
            if !value.is_object() && !value.is_null() {
                report.error(format!("data.{key} must be an object"));
            }
        }
    }
}

/// Present, not null, and not an empty array.
fn has_content(data: &Map<String, Value>, key: &str) -> bool {
    match data.get(key) {
        None | Some(Value::Null) => false,
        Some(Value::Array(items)) => !items.is_empty(),
        Some(_) => true,
    }
}

fn check_collection(kind: EntityKind, value: &Value, report: &mut ValidationReport) {
    let key = kind.collection_key();
    let Some(items) = value.as_array() else {
        if !value.is_null() {
            report.error(format!("data.{key} must be an array"));
        }
        return;
    };

    let id_field = kind.id_field();
    let mut seen = HashSet::new();
    for (index, item) in items.iter().enumerate() {
        match item.get(id_field).and_then(Value::as_str) {
            Some(id) if !id.is_empty() => {
                if !seen.insert(id) {
                    report.error(format!("data.{key}[{index}]: duplicate {id_field} {id:?}"));
                }
            }
            _ => report.error(format!("data.{key}[{index}]: missing {id_field}")),
        }

        for field in TIMESTAMP_FIELDS {
            match item.get(field) {
                None | Some(Value::Null | Value::String(_)) => {}
                Some(value) if value.is_i64() => {}
                Some(_) => report.error(format!(
                    "data.{key}[{index}].{field} must be milliseconds or a date string"
                )),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn archive(version: &str, data: Value) -> Value {
        json!({
            "metadata": {
                "version": version,
                "appVersion": "0.1.0",
                "exportedAt": "2025-01-20T10:00:00Z",
                "exportType": "full"
            },
            "data": data
        })
    }

    #[test]
    fn test_rejects_non_object() {
        for candidate in [Value::Null, json!([1, 2]), json!("archive"), json!(42)] {
            let report = validate_archive(&candidate);
            assert_eq!(report.errors.len(), 1);
            assert!(!report.is_valid());
        }
    }

    #[test]
    fn test_rejects_missing_metadata() {
        let report = validate_archive(&json!({"data": {"settings": {}}}));
        assert!(report.errors.contains(&"Missing metadata".to_string()));
    }

    #[test]
    fn test_rejects_malformed_version() {
        let report = validate_archive(&archive("1.0", json!({"settings": {}})));
        assert!(!report.is_valid());
        assert!(report.errors[0].contains("Invalid version format"));
    }

    #[test]
    fn test_rejects_version_below_minimum() {
        let report = validate_archive(&archive("0.1.0", json!({"settings": {}})));
        assert!(!report.is_valid());
        assert!(report.errors[0].contains("older than"));
    }

    #[test]
    fn test_newer_version_only_warns() {
        let report = validate_archive(&archive("9.0.0", json!({"settings": {}})));
        assert!(report.is_valid());
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn test_accepts_minimal_settings_archive() {
        let report = validate_archive(&archive(
            "1.0.0",
            json!({"settings": {"keyboardShortcuts": {"save": "Cmd+S"}}}),
        ));
        assert!(report.is_valid(), "{:?}", report.errors);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_requires_some_content() {
        let report = validate_archive(&archive(
            "1.1.0",
            json!({"projects": [], "settings": null, "aiProviders": [{"id": "a"}]}),
        ));
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("at least one of"));
    }

    #[test]
    fn test_reports_every_bad_item() {
        let report = validate_archive(&archive(
            "1.1.0",
            json!({
                "projects": [{"id": "p1"}, {"name": "no id"}, {"id": ""}, {"id": "p1"}],
                "projectAiSettings": [{"providerId": "x"}]
            }),
        ));
        assert_eq!(
            report.errors,
            vec![
                "data.projects[1]: missing id",
                "data.projects[2]: missing id",
                "data.projects[3]: duplicate id \"p1\"",
                "data.projectAiSettings[0]: missing projectId",
            ]
        );
    }

    #[test]
    fn test_accumulates_across_sections() {
        let report = validate_archive(&json!({
            "metadata": {"version": 1, "exportType": "delta"},
            "data": {"workflows": {"id": "wf"}, "settings": [], "projects": [{"id": "p"}]}
        }));
        assert_eq!(report.errors.len(), 5);
    }

    #[test]
    fn test_timestamps_accept_millis_and_strings() {
        let report = validate_archive(&archive(
            "1.1.0",
            json!({
                "projects": [
                    {"id": "p1", "createdAt": 1_700_000_000_000_i64, "updatedAt": "2025-01-01T00:00:00Z"},
                    {"id": "p2", "createdAt": 1.5, "updatedAt": true}
                ]
            }),
        ));
        assert_eq!(
            report.errors,
            vec![
                "data.projects[1].createdAt must be milliseconds or a date string",
                "data.projects[1].updatedAt must be milliseconds or a date string",
            ]
        );
    }

    #[test]
    fn test_singleton_errors_in_fixed_order() {
        let report = validate_archive(&archive(
            "1.1.0",
            json!({
                "projects": [{"id": "p"}],
                "deployPreferences": 1,
                "automationServerConfig": [],
                "settings": "dark"
            }),
        ));
        assert_eq!(
            report.errors,
            vec![
                "data.settings must be an object",
                "data.automationServerConfig must be an object",
                "data.deployPreferences must be an object",
            ]
        );
    }
}
