//! Drafts proposed by an AI assistant.
//!
//! A suggestion is never applied directly. Once a person accepts it, it is
//! turned into a [`NewContribution`] and goes through
//! [`Ledger::add_contribution`] like any other entry.

use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::{ContributorEquity, Ledger, NewContribution};
use crate::entity::{Company, Confidence, ContributionType};
use crate::error::{Result, SlicePieError};
use crate::validation::Validation;

/// Contribution-shaped draft returned by an assistant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ContributionSuggestion {
    /// Contribution type: time, cash, non-cash, idea or relationship
    #[serde(rename = "type")]
    pub contribution_type: String,
    /// Hours for time, dollars for every other type
    pub value: f64,
    /// Why the assistant proposes this entry
    #[serde(default)]
    pub reasoning: String,
    /// low, medium or high
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<String>,
}

/// A suggestion whose fields have been checked.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckedSuggestion {
    pub contribution_type: ContributionType,
    pub value: f64,
    pub reasoning: String,
    pub confidence: Option<Confidence>,
}

impl ContributionSuggestion {
    pub fn check(&self) -> Validation<CheckedSuggestion> {
        let mut reasons = Vec::new();

        let contribution_type = self
            .contribution_type
            .parse::<ContributionType>()
            .map_err(|e| reasons.push(e))
            .ok();
        let confidence = match &self.confidence {
            Some(c) => match c.parse::<Confidence>() {
                Ok(c) => Some(c),
                Err(e) => {
                    reasons.push(e);
                    None
                }
            },
            None => None,
        };
        if !self.value.is_finite() || self.value <= 0.0 {
            reasons.push("suggested value must be a positive number".to_string());
        }

        match contribution_type {
            Some(contribution_type) if reasons.is_empty() => Validation::Valid(CheckedSuggestion {
                contribution_type,
                value: self.value,
                reasoning: self.reasoning.trim().to_string(),
                confidence,
            }),
            _ => Validation::Invalid(reasons),
        }
    }

    /// Turn an accepted draft into ledger input.
    ///
    /// The reasoning becomes the description unless one is supplied.
    pub fn accept(
        &self,
        contributor_id: Uuid,
        date: NaiveDate,
        description: Option<String>,
    ) -> Result<NewContribution> {
        let checked = self.check().into_result()?;
        let description = description.or_else(|| {
            Some(checked.reasoning.clone()).filter(|r| !r.is_empty())
        });
        Ok(NewContribution {
            contributor_id,
            contribution_type: checked.contribution_type,
            value: checked.value,
            date,
            description,
            created_by: Some("assistant".to_string()),
        })
    }
}

/// Strip a Markdown code fence and surrounding prose from an assistant reply.
fn extract_json(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}

/// Parse a suggestion out of a free-form assistant reply.
pub fn parse_suggestion(text: &str) -> Result<ContributionSuggestion> {
    let json = extract_json(text)
        .ok_or_else(|| SlicePieError::invalid("no JSON object found in suggestion"))?;
    let suggestion: ContributionSuggestion = serde_json::from_str(json)?;
    suggestion.check().into_result()?;
    Ok(suggestion)
}

#[derive(Debug, Clone, Serialize)]
pub struct ContextContributor {
    pub id: Uuid,
    pub name: String,
    pub hourly_rate: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContextContribution {
    pub contributor: String,
    #[serde(rename = "type")]
    pub contribution_type: ContributionType,
    pub value: f64,
    pub date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// What an assistant is shown when drafting a suggestion.
#[derive(Debug, Clone, Serialize)]
pub struct SuggestionContext {
    pub company: Company,
    pub contribution_types: Vec<String>,
    pub contributors: Vec<ContextContributor>,
    pub equity: Vec<ContributorEquity>,
    /// Most recent first.
    pub recent_contributions: Vec<ContextContribution>,
}

impl SuggestionContext {
    pub fn from_ledger(ledger: &Ledger, recent: usize) -> Self {
        let mut contributions: Vec<_> = ledger.active_contributions().collect();
        contributions.sort_by(|a, b| b.date.cmp(&a.date));

        Self {
            company: ledger.company().clone(),
            contribution_types: ContributionType::ALL
                .iter()
                .map(|t| t.to_string())
                .collect(),
            contributors: ledger
                .active_contributors()
                .map(|c| ContextContributor {
                    id: c.base.id,
                    name: c.name.clone(),
                    hourly_rate: c.hourly_rate,
                })
                .collect(),
            equity: ledger.summary().contributors,
            recent_contributions: contributions
                .into_iter()
                .take(recent)
                .map(|c| ContextContribution {
                    contributor: ledger.contributor_name(&c.contributor_id).to_string(),
                    contribution_type: c.contribution_type,
                    value: c.value,
                    date: c.date,
                    description: c.description.clone(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::NewContributor;

    #[test]
    fn test_parse_fenced_reply() {
        let reply = "Here is my suggestion:\n```json\n{\"type\": \"time\", \"value\": 6, \
                     \"reasoning\": \"Six hours of design work\", \"confidence\": \"medium\"}\n```";
        let suggestion = parse_suggestion(reply).unwrap();
        assert_eq!(suggestion.contribution_type, "time");
        assert_eq!(suggestion.value, 6.0);
    }

    #[test]
    fn test_rejects_bad_drafts() {
        assert!(parse_suggestion("no json here").is_err());
        assert!(parse_suggestion(r#"{"type": "stock", "value": 1}"#).is_err());
        assert!(parse_suggestion(r#"{"type": "cash", "value": -1}"#).is_err());
        assert!(
            parse_suggestion(r#"{"type": "cash", "value": 1, "confidence": "certain"}"#).is_err()
        );
    }

    #[test]
    fn test_accept_goes_through_ledger() {
        let mut ledger = Ledger::new();
        let ada = ledger
            .add_contributor(NewContributor {
                name: "Ada".to_string(),
                hourly_rate: 50.0,
                ..Default::default()
            })
            .unwrap()
            .base
            .id;

        let suggestion = ContributionSuggestion {
            contribution_type: "time".to_string(),
            value: 3.0,
            reasoning: "Pairing session".to_string(),
            confidence: Some("high".to_string()),
        };
        let date = NaiveDate::from_ymd_opt(2024, 4, 2).unwrap();
        let input = suggestion.accept(ada, date, None).unwrap();
        assert_eq!(input.description.as_deref(), Some("Pairing session"));

        let contribution = ledger.add_contribution(input).unwrap();
        assert_eq!(contribution.slices, 300.0);

        let context = SuggestionContext::from_ledger(&ledger, 10);
        assert_eq!(context.contributors.len(), 1);
        assert_eq!(context.recent_contributions.len(), 1);
        assert_eq!(context.contribution_types.len(), 5);
    }
}
