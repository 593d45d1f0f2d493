// 📒 Usage Ledger - remembers which 6-digit prefixes were seen before
// JSON file backed, rewritten after every mutation
//
// Two different "BIN" notions live in this crate:
// - prefix key (6 digits): identity of a ledger entry, defined here
// - seed prefix (12 digits): what regeneration keeps fixed, see extractor
// They are independent; the ledger never looks at the seed prefix.

use crate::error::LedgerError;
use crate::network::Brand;
use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::{error, info, warn};

pub const DEFAULT_LEDGER_FILE: &str = "bin_database.json";

/// Digits in a ledger key
pub const PREFIX_KEY_LEN: usize = 6;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ============================================================================
// ENTRY
// ============================================================================

/// LedgerEntry - usage metadata for one prefix
///
/// On disk the prefix is the JSON object key, so `prefix_key` is filled in
/// after loading rather than serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    #[serde(skip)]
    pub prefix_key: String,

    #[serde(rename = "card_type", default = "unknown_brand")]
    pub brand: String,

    #[serde(rename = "first_used", with = "timestamp")]
    pub first_seen: NaiveDateTime,

    #[serde(rename = "last_used", with = "timestamp")]
    pub last_seen: NaiveDateTime,

    #[serde(rename = "usage_count", default)]
    pub use_count: u64,
}

fn unknown_brand() -> String {
    Brand::Unknown.name().to_string()
}

mod timestamp {
    use super::TIMESTAMP_FORMAT;
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&value.format(TIMESTAMP_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, TIMESTAMP_FORMAT).map_err(serde::de::Error::custom)
    }
}

/// LedgerStats - what the ledger currently holds
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LedgerStats {
    pub total_prefixes: usize,
    pub by_brand: BTreeMap<String, usize>,
}

/// Ledger key for a card number: its first 6 digits (fewer if it is shorter)
///
/// Separators are ignored, so "5154 6200..." and "515462..." share a key.
pub fn prefix_key(number: &str) -> String {
    number
        .chars()
        .filter(|c| c.is_ascii_digit())
        .take(PREFIX_KEY_LEN)
        .collect()
}

/// Human-readable reuse notice for a previously seen prefix
pub fn warning_text(entry: &LedgerEntry) -> String {
    let mut warning = String::from("⚠️ Warning: this BIN has been used before!\n");
    warning += &format!("📅 First used: {}\n", entry.first_seen.format("%d/%m/%Y"));
    warning += &format!("🔢 Times used: {}\n", entry.use_count);
    warning += &format!("💳 Card type: {}\n", entry.brand);
    warning
}

// ============================================================================
// LEDGER
// ============================================================================

type Entries = BTreeMap<String, LedgerEntry>;

/// UsageLedger - one instance per process, shared by reference
///
/// All reads and writes go through one mutex; `observe` and `record_at`
/// hold it across lookup, mutation and the file write.
pub struct UsageLedger {
    path: Option<PathBuf>,
    entries: Mutex<Entries>,
}

impl UsageLedger {
    /// Open the ledger stored at `path`
    ///
    /// A missing, unreadable or corrupt file gives an empty ledger.
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();

        let entries = if path.exists() {
            match load_entries(&path) {
                Ok(entries) => {
                    info!(path = %path.display(), prefixes = entries.len(), "ledger loaded");
                    entries
                }
                Err(e) => {
                    warn!(error = %e, "starting with an empty ledger");
                    Entries::new()
                }
            }
        } else {
            info!(path = %path.display(), "no ledger file yet, starting empty");
            Entries::new()
        };

        UsageLedger {
            path: Some(path),
            entries: Mutex::new(entries),
        }
    }

    /// Ledger that never touches the filesystem
    pub fn in_memory() -> Self {
        UsageLedger {
            path: None,
            entries: Mutex::new(Entries::new()),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn lock(&self) -> MutexGuard<'_, Entries> {
        // A panic while holding the lock leaves the map itself intact
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Entry for the number's 6-digit prefix, if seen before
    pub fn lookup(&self, number: &str) -> Option<LedgerEntry> {
        self.lock().get(&prefix_key(number)).cloned()
    }

    /// Count one more use of the number's prefix and persist
    pub fn record(&self, number: &str, brand: Brand) -> LedgerEntry {
        self.record_at(number, brand, Local::now().naive_local())
    }

    /// `record` with an explicit timestamp
    pub fn record_at(&self, number: &str, brand: Brand, now: NaiveDateTime) -> LedgerEntry {
        let mut entries = self.lock();
        let entry = upsert(&mut entries, number, brand, now);
        self.persist(&entries);
        entry
    }

    /// Lookup + record as one critical section
    ///
    /// # Returns
    /// The entry as it was before this observation (`None` = first sighting)
    pub fn observe(&self, number: &str, brand: Brand) -> Option<LedgerEntry> {
        self.observe_at(number, brand, Local::now().naive_local())
    }

    pub fn observe_at(&self, number: &str, brand: Brand, now: NaiveDateTime) -> Option<LedgerEntry> {
        let mut entries = self.lock();
        let previous = entries.get(&prefix_key(number)).cloned();
        upsert(&mut entries, number, brand, now);
        self.persist(&entries);
        previous
    }

    /// Write the whole ledger to its file (no-op for in-memory ledgers)
    pub fn save(&self) -> Result<(), LedgerError> {
        let entries = self.lock();
        match &self.path {
            Some(path) => write_entries(path, &entries),
            None => Ok(()),
        }
    }

    fn persist(&self, entries: &Entries) {
        if let Some(path) = &self.path {
            if let Err(e) = write_entries(path, entries) {
                error!(error = %e, "ledger not saved, keeping in-memory state");
            }
        }
    }

    pub fn stats(&self) -> LedgerStats {
        let entries = self.lock();
        let mut by_brand = BTreeMap::new();
        for entry in entries.values() {
            *by_brand.entry(entry.brand.clone()).or_insert(0) += 1;
        }

        LedgerStats {
            total_prefixes: entries.len(),
            by_brand,
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

fn upsert(entries: &mut Entries, number: &str, brand: Brand, now: NaiveDateTime) -> LedgerEntry {
    let key = prefix_key(number);

    let entry = entries
        .entry(key.clone())
        .and_modify(|e| {
            e.use_count = e.use_count.saturating_add(1);
            // Never move backwards, even if the clock does
            e.last_seen = now.max(e.last_seen);
        })
        .or_insert_with(|| {
            info!(prefix = %key, brand = brand.name(), "new prefix recorded");
            LedgerEntry {
                prefix_key: key.clone(),
                brand: brand.name().to_string(),
                first_seen: now,
                last_seen: now,
                use_count: 1,
            }
        });

    entry.clone()
}

fn load_entries(path: &Path) -> Result<Entries, LedgerError> {
    let content = fs::read_to_string(path).map_err(|source| LedgerError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    // Decoded per entry; an unreadable entry is skipped, the rest kept
    let raw: BTreeMap<String, serde_json::Value> =
        serde_json::from_str(&content).map_err(|source| LedgerError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    let mut entries = Entries::new();
    for (key, value) in raw {
        match serde_json::from_value::<LedgerEntry>(value) {
            Ok(mut entry) => {
                entry.prefix_key = key.clone();
                entries.insert(key, entry);
            }
            Err(e) => warn!(prefix = %key, error = %e, "skipping unreadable ledger entry"),
        }
    }

    Ok(entries)
}

fn write_entries(path: &Path, entries: &Entries) -> Result<(), LedgerError> {
    let json = serde_json::to_string_pretty(entries)?;
    fs::write(path, json).map_err(|source| LedgerError::Write {
        path: path.to_path_buf(),
        source,
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 15)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn temp_ledger_path() -> PathBuf {
        std::env::temp_dir().join(format!("cardsynth-ledger-{}.json", uuid::Uuid::new_v4()))
    }

    #[test]
    fn test_prefix_key() {
        assert_eq!(prefix_key("5154620012228852"), "515462");
        assert_eq!(prefix_key("5154 6200 1222 8852"), "515462");
        assert_eq!(prefix_key("4111"), "4111");
        assert_eq!(prefix_key(""), "");
    }

    #[test]
    fn test_record_twice_increments() {
        let ledger = UsageLedger::in_memory();

        let first = ledger.record_at("5154620012228852", Brand::Mastercard, at(10, 0, 0));
        assert_eq!(first.use_count, 1);
        assert_eq!(first.first_seen, at(10, 0, 0));
        assert_eq!(first.last_seen, at(10, 0, 0));

        // Different tail, same 6-digit prefix
        let second = ledger.record_at("5154629999999999", Brand::Mastercard, at(11, 30, 0));
        assert_eq!(second.use_count, 2);
        assert_eq!(second.first_seen, at(10, 0, 0));
        assert_eq!(second.last_seen, at(11, 30, 0));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_last_seen_never_goes_backwards() {
        let ledger = UsageLedger::in_memory();
        ledger.record_at("4532015112830366", Brand::Visa, at(12, 0, 0));
        let entry = ledger.record_at("4532015112830366", Brand::Visa, at(9, 0, 0));
        assert_eq!(entry.last_seen, at(12, 0, 0));
        assert!(entry.last_seen >= entry.first_seen);
    }

    #[test]
    fn test_lookup() {
        let ledger = UsageLedger::in_memory();
        assert!(ledger.lookup("4532015112830366").is_none());

        ledger.record_at("4532015112830366", Brand::Visa, at(8, 0, 0));
        let entry = ledger.lookup("4532019999999999").unwrap();
        assert_eq!(entry.prefix_key, "453201");
        assert_eq!(entry.brand, "Visa");
    }

    #[test]
    fn test_observe_returns_previous_state() {
        let ledger = UsageLedger::in_memory();
        assert!(ledger.observe_at("6011000000000004", Brand::Discover, at(1, 0, 0)).is_none());

        let previous = ledger
            .observe_at("6011000000000004", Brand::Discover, at(2, 0, 0))
            .unwrap();
        assert_eq!(previous.use_count, 1);
        assert_eq!(ledger.lookup("6011000000000004").unwrap().use_count, 2);
    }

    #[test]
    fn test_warning_text() {
        let entry = LedgerEntry {
            prefix_key: "515462".to_string(),
            brand: "Mastercard".to_string(),
            first_seen: at(10, 0, 0),
            last_seen: at(11, 0, 0),
            use_count: 3,
        };

        let text = warning_text(&entry);
        assert!(text.contains("15/10/2026"));
        assert!(text.contains("Times used: 3"));
        assert!(text.contains("Mastercard"));
        assert!(!text.contains("10:00"));
    }

    #[test]
    fn test_persist_and_reload() {
        let path = temp_ledger_path();

        {
            let ledger = UsageLedger::open(&path);
            assert!(ledger.is_empty());
            ledger.record_at("5154620012228852", Brand::Mastercard, at(10, 0, 0));
            ledger.record_at("5154620012228852", Brand::Mastercard, at(10, 5, 0));
            ledger.record_at("4532015112830366", Brand::Visa, at(10, 6, 0));
        }

        let reloaded = UsageLedger::open(&path);
        assert_eq!(reloaded.len(), 2);
        let entry = reloaded.lookup("515462").unwrap();
        assert_eq!(entry.prefix_key, "515462");
        assert_eq!(entry.use_count, 2);
        assert_eq!(entry.first_seen, at(10, 0, 0));
        assert_eq!(entry.last_seen, at(10, 5, 0));

        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_file_format() {
        let path = temp_ledger_path();
        let ledger = UsageLedger::open(&path);
        ledger.record_at("5154620012228852", Brand::Mastercard, at(10, 0, 0));

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["515462"]["card_type"], "Mastercard");
        assert_eq!(raw["515462"]["first_used"], "2026-10-15 10:00:00");
        assert_eq!(raw["515462"]["last_used"], "2026-10-15 10:00:00");
        assert_eq!(raw["515462"]["usage_count"], 1);
        assert!(raw["515462"].get("prefix_key").is_none());

        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_reads_existing_file() {
        let path = temp_ledger_path();
        fs::write(
            &path,
            r#"{
  "453201": {
    "card_type": "VISA",
    "first_used": "2025-01-02 03:04:05",
    "last_used": "2025-06-07 08:09:10",
    "usage_count": 7
  }
}"#,
        )
        .unwrap();

        let ledger = UsageLedger::open(&path);
        let entry = ledger.lookup("4532015112830366").unwrap();
        assert_eq!(entry.brand, "VISA");
        assert_eq!(entry.use_count, 7);

        let updated = ledger.record_at("4532015112830366", Brand::Visa, at(0, 0, 0));
        assert_eq!(updated.use_count, 8);
        // Brand recorded on first sighting is kept
        assert_eq!(updated.brand, "VISA");

        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_corrupt_file_gives_empty_ledger() {
        let path = temp_ledger_path();
        fs::write(&path, "{ not json").unwrap();

        let ledger = UsageLedger::open(&path);
        assert!(ledger.is_empty());

        // Still usable, and the next record overwrites the bad file
        ledger.record_at("4532015112830366", Brand::Visa, at(1, 2, 3));
        assert_eq!(UsageLedger::open(&path).len(), 1);

        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_bad_entry_does_not_drop_the_others() {
        let path = temp_ledger_path();
        let json = r#"{
  "453201": {"card_type": "Visa", "first_used": "2026-01-02 03:04:05", "last_used": "2026-01-02 03:04:05", "usage_count": 4},
  "515462": {"card_type": "Mastercard", "first_used": "yesterday", "last_used": "2026-01-02 03:04:05", "usage_count": 1},
  "601100": {"first_used": "2026-02-01 00:00:00", "last_used": "2026-02-01 00:00:00"}
}"#;
        fs::write(&path, json).unwrap();

        let ledger = UsageLedger::open(&path);
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.lookup("453201").unwrap().use_count, 4);
        assert!(ledger.lookup("515462").is_none());

        // Missing card_type and usage_count fall back to defaults
        let sparse = ledger.lookup("601100").unwrap();
        assert_eq!(sparse.brand, "Unknown");
        assert_eq!(sparse.use_count, 0);

        // Recording another prefix keeps the readable ones on disk
        ledger.record_at("378282246310005", Brand::AmericanExpress, at(1, 2, 3));
        let reloaded = UsageLedger::open(&path);
        assert_eq!(reloaded.len(), 3);
        assert_eq!(reloaded.lookup("453201").unwrap().use_count, 4);

        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_write_failure_is_not_fatal() {
        // A directory path cannot be written as a file
        let dir = std::env::temp_dir().join(format!("cardsynth-dir-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();

        let ledger = UsageLedger::open(&dir);
        let entry = ledger.record_at("4532015112830366", Brand::Visa, at(1, 0, 0));
        assert_eq!(entry.use_count, 1);
        assert_eq!(ledger.lookup("4532015112830366").unwrap().use_count, 1);
        assert!(matches!(ledger.save(), Err(LedgerError::Write { .. })));

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_stats() {
        let ledger = UsageLedger::in_memory();
        ledger.record_at("4532015112830366", Brand::Visa, at(1, 0, 0));
        ledger.record_at("4916000000000000", Brand::Visa, at(1, 0, 0));
        ledger.record_at("5154620012228852", Brand::Mastercard, at(1, 0, 0));
        ledger.record_at("5154620012228852", Brand::Mastercard, at(2, 0, 0));

        let stats = ledger.stats();
        assert_eq!(stats.total_prefixes, 3);
        assert_eq!(stats.by_brand.get("Visa"), Some(&2));
        assert_eq!(stats.by_brand.get("Mastercard"), Some(&1));
    }

    #[test]
    fn test_concurrent_records_do_not_lose_updates() {
        let ledger = std::sync::Arc::new(UsageLedger::in_memory());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let ledger = ledger.clone();
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        ledger.record("5154620012228852", Brand::Mastercard);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(ledger.lookup("5154620012228852").unwrap().use_count, 400);
    }
}
