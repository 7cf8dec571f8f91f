use std::fs;
use std::path::{Path, PathBuf};

use loro::{LoroDoc, LoroValue, ValueOrContainer};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::config::Config;
use crate::engine::{Ledger, LedgerChange, LedgerSnapshot};
use crate::error::{Result, SlicePieError};

pub const SLICEPIE_DIR: &str = ".slicepie";
const LEDGER_FILE: &str = "ledger.loro";
const LEDGER_MAP: &str = "ledger";

/// Key-value store backed by a Loro document.
///
/// Every value is kept as a JSON string under its key in a single Loro map.
pub struct LoroStore {
    doc: LoroDoc,
    dir: PathBuf,
    path: PathBuf,
}

impl LoroStore {
    /// Initialize a new slicepie project
    pub fn init(root: &Path) -> Result<Self> {
        let dir = root.join(SLICEPIE_DIR);
        let path = dir.join(LEDGER_FILE);

        if path.exists() {
            return Err(SlicePieError::AlreadyInitialized);
        }

        fs::create_dir_all(&dir)?;

        let store = Self {
            doc: LoroDoc::new(),
            dir,
            path,
        };
        store.save()?;

        Ok(store)
    }

    /// Open an existing slicepie project
    pub fn open(root: &Path) -> Result<Self> {
        let dir = root.join(SLICEPIE_DIR);
        let path = dir.join(LEDGER_FILE);

        if !path.exists() {
            return Err(SlicePieError::NotInitialized);
        }

        let bytes = fs::read(&path)?;
        let doc = LoroDoc::new();
        doc.import(&bytes)?;

        Ok(Self { doc, dir, path })
    }

    /// Save the document to disk
    pub fn save(&self) -> Result<()> {
        let bytes = self.doc.export(loro::ExportMode::Snapshot)?;
        fs::write(&self.path, bytes)?;
        Ok(())
    }

    /// The `.slicepie` directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Size of the ledger file on disk, in bytes
    pub fn file_size(&self) -> Result<u64> {
        Ok(fs::metadata(&self.path)?.len())
    }

    /// Read a value, or its default when the key has never been written.
    pub fn get<T: DeserializeOwned + Default>(&self, key: &str) -> Result<T> {
        match self.doc.get_map(LEDGER_MAP).get(key) {
            None => Ok(T::default()),
            Some(ValueOrContainer::Value(LoroValue::String(json))) => {
                Ok(serde_json::from_str(&json.to_string())?)
            }
            Some(_) => Err(SlicePieError::Storage(format!(
                "unexpected value stored under '{}'",
                key
            ))),
        }
    }

    /// Write a value and commit. Call [`save`](Self::save) to persist.
    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let json = serde_json::to_string(value)?;
        self.doc.get_map(LEDGER_MAP).insert(key, json)?;
        self.doc.commit();
        Ok(())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.doc.get_map(LEDGER_MAP).get(key).is_some()
    }

    /// Build a ledger from the stored keys.
    pub fn load_ledger(&self, config: &Config) -> Result<Ledger> {
        let snapshot = LedgerSnapshot {
            company: self.get(LedgerChange::Company.key())?,
            contributors: self.get(LedgerChange::Contributors.key())?,
            contributions: self.get(LedgerChange::Contributions.key())?,
            activity: self.get(LedgerChange::Activity.key())?,
            valuation: self.get(LedgerChange::Valuation.key())?,
            valuation_history: self.get(LedgerChange::ValuationHistory.key())?,
        };
        Ok(Ledger::from_snapshot(
            snapshot,
            config.activity_limit,
            config.valuation_history_limit,
        ))
    }

    fn write_key(&self, ledger: &Ledger, change: LedgerChange) -> Result<()> {
        let key = change.key();
        match change {
            LedgerChange::Company => self.set(key, ledger.company()),
            LedgerChange::Contributors => self.set(key, &ledger.contributors()),
            LedgerChange::Contributions => self.set(key, &ledger.contributions()),
            LedgerChange::Activity => self.set(key, &ledger.activity().to_vec()),
            LedgerChange::Valuation => self.set(key, ledger.valuation_config()),
            LedgerChange::ValuationHistory => self.set(key, &ledger.valuation_history()),
        }
    }

    /// Write the keys the ledger touched since the last flush, then save.
    ///
    /// Returns the keys that were written.
    pub fn flush(&self, ledger: &mut Ledger) -> Result<Vec<LedgerChange>> {
        let changes = ledger.take_changes();
        if changes.is_empty() {
            return Ok(changes);
        }
        for change in &changes {
            self.write_key(ledger, *change)?;
        }
        self.save()?;
        debug!(
            keys = ?changes.iter().map(|c| c.key()).collect::<Vec<_>>(),
            "flushed ledger"
        );
        Ok(changes)
    }

    /// Write every key regardless of pending changes.
    pub fn write_all(&self, ledger: &mut Ledger) -> Result<()> {
        ledger.take_changes();
        for change in LedgerChange::ALL {
            self.write_key(ledger, change)?;
        }
        self.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{NewContribution, NewContributor};
    use crate::entity::{Company, ContributionType, Contributor};
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn ledger_with_work() -> Ledger {
        let mut ledger = Ledger::new();
        let ada = ledger
            .add_contributor(NewContributor {
                name: "Ada".to_string(),
                hourly_rate: 75.0,
                ..Default::default()
            })
            .unwrap()
            .base
            .id;
        let work = ledger
            .add_contribution(NewContribution {
                contributor_id: ada,
                contribution_type: ContributionType::Time,
                value: 8.0,
                date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
                description: None,
                created_by: None,
            })
            .unwrap()
            .base
            .id;
        ledger.soft_delete_contributor(&ada).unwrap();
        ledger.restore_contribution(&work).unwrap();
        ledger
    }

    #[test]
    fn test_init_creates_slicepie_directory() {
        let tmp = TempDir::new().unwrap();
        let _store = LoroStore::init(tmp.path()).unwrap();

        assert!(tmp.path().join(".slicepie").exists());
        assert!(tmp.path().join(".slicepie/ledger.loro").exists());
    }

    #[test]
    fn test_init_fails_if_already_initialized() {
        let tmp = TempDir::new().unwrap();
        LoroStore::init(tmp.path()).unwrap();

        let result = LoroStore::init(tmp.path());
        assert!(matches!(result, Err(SlicePieError::AlreadyInitialized)));
    }

    #[test]
    fn test_open_fails_if_not_initialized() {
        let tmp = TempDir::new().unwrap();

        let result = LoroStore::open(tmp.path());
        assert!(matches!(result, Err(SlicePieError::NotInitialized)));
    }

    #[test]
    fn test_get_missing_key_is_default() {
        let tmp = TempDir::new().unwrap();
        let store = LoroStore::init(tmp.path()).unwrap();
        let contributors: Vec<Contributor> = store.get("contributors").unwrap();
        assert!(contributors.is_empty());
        assert!(!store.contains("contributors"));
    }

    #[test]
    fn test_set_survives_reopen() {
        let tmp = TempDir::new().unwrap();
        {
            let store = LoroStore::init(tmp.path()).unwrap();
            store
                .set(
                    "company",
                    &Company {
                        name: "Acme".to_string(),
                        ..Default::default()
                    },
                )
                .unwrap();
            store.save().unwrap();
        }
        let store = LoroStore::open(tmp.path()).unwrap();
        let company: Company = store.get("company").unwrap();
        assert_eq!(company.name, "Acme");
    }

    #[test]
    fn test_flush_writes_only_touched_keys() {
        let tmp = TempDir::new().unwrap();
        let store = LoroStore::init(tmp.path()).unwrap();
        let mut ledger = ledger_with_work();

        let written = store.flush(&mut ledger).unwrap();
        assert!(written.contains(&LedgerChange::Contributions));
        assert!(!written.contains(&LedgerChange::Valuation));
        assert!(!store.contains("valuation"));
        assert!(store.flush(&mut ledger).unwrap().is_empty());
    }

    #[test]
    fn test_ledger_round_trips_through_disk() {
        let tmp = TempDir::new().unwrap();
        let mut ledger = ledger_with_work();
        {
            let store = LoroStore::init(tmp.path()).unwrap();
            store.write_all(&mut ledger).unwrap();
        }

        let store = LoroStore::open(tmp.path()).unwrap();
        let loaded = store.load_ledger(&Config::default()).unwrap();
        assert_eq!(loaded.snapshot(), ledger.snapshot());
        assert_eq!(loaded.activity().len(), 2);
        assert!(store.file_size().unwrap() > 0);
    }

    #[test]
    fn test_corrupt_value_is_a_storage_error() {
        let tmp = TempDir::new().unwrap();
        let store = LoroStore::init(tmp.path()).unwrap();
        store.doc.get_map(LEDGER_MAP).insert("contributors", 42).unwrap();
        let result: Result<Vec<Contributor>> = store.get("contributors");
        assert!(matches!(result, Err(SlicePieError::Storage(_))));
    }
}
