//! Data-health warnings for a slicepie ledger.
//!
//! None of these stop anything from working. They point at records that
//! quietly contribute nothing, or at a store that has grown large.

use uuid::Uuid;

use crate::engine::Ledger;
use crate::entity::ContributionType;

/// Ledger file size above which a warning is shown (10MB).
pub const LEDGER_SIZE_WARNING_THRESHOLD: u64 = 10 * 1024 * 1024;

/// Something in the ledger worth a second look.
#[derive(Debug, Clone, PartialEq)]
pub enum Warning {
    /// Contributions pointing at a contributor that no longer exists.
    OrphanContributions { count: usize },
    /// Active `time` contributions recorded while the rate was zero.
    ZeroRateTime {
        contributor_id: Uuid,
        name: String,
        count: usize,
    },
    /// Active contributor without any active contribution.
    NoContributions { contributor_id: Uuid, name: String },
    /// Ledger file size exceeds the recommended threshold.
    LargeLedger { size_mb: f64, threshold_mb: f64 },
}

/// Inspect the ledger (and optionally its file size) and collect warnings.
pub fn check_ledger(ledger: &Ledger, file_size: Option<u64>) -> Vec<Warning> {
    let mut warnings = Vec::new();

    let orphans = ledger
        .contributions()
        .iter()
        .filter(|c| ledger.contributor(&c.contributor_id).is_none())
        .count();
    if orphans > 0 {
        warnings.push(Warning::OrphanContributions { count: orphans });
    }

    for contributor in ledger.active_contributors() {
        let active: Vec<_> = ledger
            .contributions_of(&contributor.base.id)
            .filter(|c| c.is_active())
            .collect();

        let zero_rate = active
            .iter()
            .filter(|c| c.contribution_type == ContributionType::Time && c.slices == 0.0)
            .count();
        if zero_rate > 0 {
            warnings.push(Warning::ZeroRateTime {
                contributor_id: contributor.base.id,
                name: contributor.name.clone(),
                count: zero_rate,
            });
        }

        if active.is_empty() {
            warnings.push(Warning::NoContributions {
                contributor_id: contributor.base.id,
                name: contributor.name.clone(),
            });
        }
    }

    if let Some(size) = file_size {
        if size > LEDGER_SIZE_WARNING_THRESHOLD {
            warnings.push(Warning::LargeLedger {
                size_mb: size as f64 / (1024.0 * 1024.0),
                threshold_mb: LEDGER_SIZE_WARNING_THRESHOLD as f64 / (1024.0 * 1024.0),
            });
        }
    }

    warnings
}

/// Format a warning for display.
pub fn format_warning(warning: &Warning) -> String {
    match warning {
        Warning::OrphanContributions { count } => format!(
            "Warning: {} contribution(s) belong to an unknown contributor and are not counted",
            count
        ),
        Warning::ZeroRateTime { name, count, .. } => format!(
            "Warning: {} has {} time contribution(s) worth 0 slices (hourly rate was 0)",
            name, count
        ),
        Warning::NoContributions { name, .. } => {
            format!("Warning: {} has no contributions yet", name)
        }
        Warning::LargeLedger {
            size_mb,
            threshold_mb,
        } => format!(
            "Warning: ledger.loro size ({:.1}MB) exceeds recommended {:.0}MB",
            size_mb, threshold_mb
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{NewContribution, NewContributor};
    use chrono::NaiveDate;

    fn person(ledger: &mut Ledger, name: &str, rate: f64) -> Uuid {
        ledger
            .add_contributor(NewContributor {
                name: name.to_string(),
                hourly_rate: rate,
                ..Default::default()
            })
            .unwrap()
            .base
            .id
    }

    fn hours(ledger: &mut Ledger, owner: Uuid, value: f64) {
        ledger
            .add_contribution(NewContribution {
                contributor_id: owner,
                contribution_type: ContributionType::Time,
                value,
                date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                description: None,
                created_by: None,
            })
            .unwrap();
    }

    #[test]
    fn test_healthy_ledger_has_no_warnings() {
        let mut ledger = Ledger::new();
        let ada = person(&mut ledger, "Ada", 50.0);
        hours(&mut ledger, ada, 2.0);
        assert!(check_ledger(&ledger, Some(1024)).is_empty());
    }

    #[test]
    fn test_zero_rate_and_empty_contributor() {
        let mut ledger = Ledger::new();
        let ada = person(&mut ledger, "Ada", 0.0);
        hours(&mut ledger, ada, 2.0);
        person(&mut ledger, "Grace", 10.0);

        let warnings = check_ledger(&ledger, None);
        assert_eq!(warnings.len(), 2);
        assert!(matches!(&warnings[0], Warning::ZeroRateTime { count: 1, .. }));
        assert!(matches!(&warnings[1], Warning::NoContributions { name, .. } if name == "Grace"));
    }

    #[test]
    fn test_orphans_after_import() {
        let mut source = Ledger::new();
        let ada = person(&mut source, "Ada", 10.0);
        hours(&mut source, ada, 1.0);

        let mut document = crate::transfer::export(&source);
        document.contributors.clear();
        let mut ledger = Ledger::new();
        ledger.replace_all(document);

        let warnings = check_ledger(&ledger, None);
        assert_eq!(warnings, vec![Warning::OrphanContributions { count: 1 }]);
    }

    #[test]
    fn test_large_ledger_warning() {
        let warnings = check_ledger(&Ledger::new(), Some(15 * 1024 * 1024));
        match &warnings[0] {
            Warning::LargeLedger { size_mb, .. } => {
                assert!(*size_mb > 14.0 && *size_mb < 16.0);
            }
            other => panic!("Expected LargeLedger warning, got {:?}", other),
        }
    }

    #[test]
    fn test_format_messages() {
        let msg = format_warning(&Warning::LargeLedger {
            size_mb: 15.5,
            threshold_mb: 10.0,
        });
        assert!(msg.contains("15.5"));
        assert!(msg.contains("10"));

        let msg = format_warning(&Warning::OrphanContributions { count: 3 });
        assert!(msg.contains('3'));
    }
}
