//! JSON import/export document.
//!
//! Exports carry every record, soft-deleted ones included, so an import
//! reproduces the trash as well as the active view.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::engine::Ledger;
use crate::entity::{Company, Contribution, Contributor};
use crate::error::Result;
use crate::validation::Validation;

pub const EXPORT_VERSION: &str = "1.0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub company: Company,
    pub contributors: Vec<Contributor>,
    pub contributions: Vec<Contribution>,
}

pub fn export(ledger: &Ledger) -> ExportDocument {
    ExportDocument {
        version: EXPORT_VERSION.to_string(),
        exported_at: Utc::now(),
        company: ledger.company().clone(),
        contributors: ledger.contributors().to_vec(),
        contributions: ledger.contributions().to_vec(),
    }
}

fn expect_field<'a>(
    object: &'a serde_json::Map<String, Value>,
    field: &str,
    kind: &str,
    check: fn(&Value) -> bool,
    reasons: &mut Vec<String>,
) -> Option<&'a Value> {
    match object.get(field) {
        None => {
            reasons.push(format!("missing field '{}'", field));
            None
        }
        Some(value) if !check(value) => {
            reasons.push(format!("field '{}' must be {}", field, kind));
            None
        }
        Some(value) => Some(value),
    }
}

/// Decode each element on its own so a bad record is reported by position.
fn decode_items<T: serde::de::DeserializeOwned>(
    field: &str,
    items: &[Value],
    reasons: &mut Vec<String>,
) -> Vec<T> {
    let mut decoded = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        match serde_json::from_value::<T>(item.clone()) {
            Ok(value) => decoded.push(value),
            Err(e) => reasons.push(format!("{}[{}]: {}", field, index, e)),
        }
    }
    decoded
}

/// Check shape, field types and record integrity of an import document.
pub fn validate_document(value: &Value) -> Validation<ExportDocument> {
    let mut reasons = Vec::new();
    let Some(object) = value.as_object() else {
        return Validation::Invalid(vec!["document must be a JSON object".to_string()]);
    };

    let version = expect_field(object, "version", "a string", Value::is_string, &mut reasons);
    let exported_at = expect_field(object, "exportedAt", "a string", Value::is_string, &mut reasons);
    let company = expect_field(object, "company", "an object", Value::is_object, &mut reasons);
    let contributors =
        expect_field(object, "contributors", "an array", Value::is_array, &mut reasons);
    let contributions =
        expect_field(object, "contributions", "an array", Value::is_array, &mut reasons);

    let exported_at = exported_at.and_then(Value::as_str).and_then(|s| {
        DateTime::parse_from_rfc3339(s)
            .map(|d| d.with_timezone(&Utc))
            .map_err(|_| reasons.push(format!("exportedAt '{}' is not an RFC 3339 timestamp", s)))
            .ok()
    });
    let company = company.and_then(|c| {
        serde_json::from_value::<Company>(c.clone())
            .map_err(|e| reasons.push(format!("company: {}", e)))
            .ok()
    });
    let contributors: Vec<Contributor> = contributors
        .and_then(Value::as_array)
        .map(|items| decode_items("contributors", items, &mut reasons))
        .unwrap_or_default();
    let contributions: Vec<Contribution> = contributions
        .and_then(Value::as_array)
        .map(|items| decode_items("contributions", items, &mut reasons))
        .unwrap_or_default();

    let mut seen = HashSet::new();
    for contributor in &contributors {
        if !seen.insert(contributor.base.id) {
            reasons.push(format!("duplicate contributor id {}", contributor.base.id));
        }
        if !contributor.hourly_rate.is_finite() || contributor.hourly_rate < 0.0 {
            reasons.push(format!(
                "contributor {} has an invalid hourly rate",
                contributor.base.id
            ));
        }
    }
    let mut seen = HashSet::new();
    for contribution in &contributions {
        let id = contribution.base.id;
        if !seen.insert(id) {
            reasons.push(format!("duplicate contribution id {}", id));
        }
        if !contribution.value.is_finite() || contribution.value < 0.0 {
            reasons.push(format!("contribution {} has an invalid value", id));
        }
        if !contribution.slices.is_finite() || contribution.slices < 0.0 {
            reasons.push(format!("contribution {} has invalid slices", id));
        }
    }

    if !reasons.is_empty() {
        return Validation::Invalid(reasons);
    }

    match (version.and_then(Value::as_str), exported_at, company) {
        (Some(version), Some(exported_at), Some(company)) => Validation::Valid(ExportDocument {
            version: version.to_string(),
            exported_at,
            company,
            contributors,
            contributions,
        }),
        _ => Validation::Invalid(vec!["incomplete import document".to_string()]),
    }
}

/// Parse and validate import text.
pub fn parse_document(text: &str) -> Result<ExportDocument> {
    let value: Value = serde_json::from_str(text)?;
    validate_document(&value).into_result()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{NewContribution, NewContributor};
    use crate::entity::ContributionType;
    use chrono::NaiveDate;
    use serde_json::json;

    fn sample_ledger() -> Ledger {
        let mut ledger = Ledger::new();
        ledger.set_company(Company {
            name: "Acme".to_string(),
            ..Default::default()
        });
        let ada = ledger
            .add_contributor(NewContributor {
                name: "Ada".to_string(),
                hourly_rate: 80.0,
                ..Default::default()
            })
            .unwrap()
            .base
            .id;
        let work = ledger
            .add_contribution(NewContribution {
                contributor_id: ada,
                contribution_type: ContributionType::Time,
                value: 5.0,
                date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
                description: Some("Prototype".to_string()),
                created_by: None,
            })
            .unwrap()
            .base
            .id;
        ledger
            .add_contribution(NewContribution {
                contributor_id: ada,
                contribution_type: ContributionType::Cash,
                value: 500.0,
                date: NaiveDate::from_ymd_opt(2024, 5, 2).unwrap(),
                description: None,
                created_by: None,
            })
            .unwrap();
        ledger.soft_delete_contribution(&work).unwrap();
        ledger
    }

    #[test]
    fn test_export_uses_document_field_names() {
        let value = serde_json::to_value(export(&sample_ledger())).unwrap();
        assert_eq!(value["version"], EXPORT_VERSION);
        assert!(value["exportedAt"].is_string());
        assert_eq!(value["company"]["name"], "Acme");
        assert_eq!(value["contributors"].as_array().unwrap().len(), 1);
        assert_eq!(value["contributions"][0]["type"], "time");
        assert_eq!(value["contributions"][0]["state"], "deleted");
    }

    #[test]
    fn test_exported_text_imports_into_the_same_state() {
        let source = sample_ledger();
        let text = serde_json::to_string_pretty(&export(&source)).unwrap();
        let document = parse_document(&text).unwrap();

        let mut target = Ledger::new();
        target.replace_all(document);
        assert_eq!(target.contributions(), source.contributions());
        assert_eq!(target.summary(), source.summary());
        assert_eq!(target.trash().contributions.len(), 1);
        assert!(target.activity().is_empty());
    }

    #[test]
    fn test_missing_and_mistyped_fields() {
        let result = validate_document(&json!({
            "version": 1,
            "company": {},
            "contributors": {},
        }));
        let reasons = result.reasons();
        assert!(reasons.iter().any(|r| r.contains("'version' must be a string")));
        assert!(reasons.iter().any(|r| r.contains("missing field 'exportedAt'")));
        assert!(reasons.iter().any(|r| r.contains("'contributors' must be an array")));
        assert!(reasons.iter().any(|r| r.contains("missing field 'contributions'")));
    }

    #[test]
    fn test_bad_record_is_reported_by_index() {
        let mut value = serde_json::to_value(export(&sample_ledger())).unwrap();
        value["contributions"][1]["type"] = json!("stock");
        let result = validate_document(&value);
        assert!(!result.is_valid());
        assert!(result.reasons()[0].starts_with("contributions[1]"));
    }

    #[test]
    fn test_duplicate_ids_are_rejected() {
        let mut value = serde_json::to_value(export(&sample_ledger())).unwrap();
        let first = value["contributors"][0].clone();
        value["contributors"].as_array_mut().unwrap().push(first);
        let result = validate_document(&value);
        assert!(result
            .reasons()
            .iter()
            .any(|r| r.starts_with("duplicate contributor id")));
    }

    #[test]
    fn test_non_object_document() {
        assert!(parse_document("[]").is_err());
        assert!(parse_document("not json").is_err());
    }
}
