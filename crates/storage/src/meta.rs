//! Per-item metadata
//!
//! Every item may carry a companion metadata item under `<id>.meta`: a
//! case-insensitive string-keyed bag of [`MetaValue`]s holding timestamps,
//! the encryption flag, the writing application's version and the item's
//! backup records. Values are an explicit sum type decoded at the point of
//! use; there are no dynamic casts.

use chrono::{DateTime, Utc};
use savepoint_core::{
    META_ACCESS_TIME, META_APPLICATION_VERSION, META_BACKUPS, META_CREATION_TIME, META_ENCRYPTED,
    META_MODIFICATION_TIME, META_SUFFIX,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The metadata companion identifier for an item
#[must_use]
pub fn meta_identifier(identifier: &str) -> String {
    format!("{identifier}{META_SUFFIX}")
}

/// Whether an identifier names a metadata companion item
#[must_use]
pub fn is_meta_identifier(identifier: &str) -> bool {
    identifier.ends_with(META_SUFFIX)
}

/// A timestamped, separately-identified copy of an item's content, tracked
/// in the owning item's metadata. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct BackupRecord {
    /// Identifier of the backup copy
    pub identifier: String,
    /// When the backup was taken
    pub backup_time_utc: DateTime<Utc>,
}

/// A single metadata value
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum MetaValue {
    Bool(bool),
    Integer(i64),
    Text(String),
    Timestamp(DateTime<Utc>),
    Backups(Vec<BackupRecord>),
}

impl MetaValue {
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            MetaValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            MetaValue::Integer(value) => Some(*value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            MetaValue::Text(value) => Some(value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            MetaValue::Timestamp(value) => Some(*value),
            _ => None,
        }
    }
}

/// Case-insensitive property bag persisted alongside each item
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct StorageMetaData {
    entries: HashMap<String, MetaValue>,
}

impl StorageMetaData {
    /// Look up a value, ignoring key case
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&MetaValue> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v)
    }

    /// Insert a value, replacing any existing entry whose key differs only
    /// in case
    pub fn set(&mut self, key: impl Into<String>, value: MetaValue) {
        let key = key.into();
        self.entries.retain(|k, _| !k.eq_ignore_ascii_case(&key));
        self.entries.insert(key, value);
    }

    /// Remove a value, ignoring key case
    pub fn remove(&mut self, key: &str) -> Option<MetaValue> {
        let existing = self
            .entries
            .keys()
            .find(|k| k.eq_ignore_ascii_case(key))
            .cloned()?;
        self.entries.remove(&existing)
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    // --- Typed accessors for the well-known keys ---

    #[must_use]
    pub fn creation_time(&self) -> Option<DateTime<Utc>> {
        self.get(META_CREATION_TIME).and_then(MetaValue::as_timestamp)
    }

    #[must_use]
    pub fn modification_time(&self) -> Option<DateTime<Utc>> {
        self.get(META_MODIFICATION_TIME)
            .and_then(MetaValue::as_timestamp)
    }

    #[must_use]
    pub fn access_time(&self) -> Option<DateTime<Utc>> {
        self.get(META_ACCESS_TIME).and_then(MetaValue::as_timestamp)
    }

    #[must_use]
    pub fn encrypted(&self) -> Option<bool> {
        self.get(META_ENCRYPTED).and_then(MetaValue::as_bool)
    }

    #[must_use]
    pub fn application_version(&self) -> Option<&str> {
        self.get(META_APPLICATION_VERSION)
            .and_then(MetaValue::as_text)
    }

    /// Recorded backups, oldest first. May reference items that no longer
    /// exist on the backend.
    #[must_use]
    pub fn backups(&self) -> &[BackupRecord] {
        match self.get(META_BACKUPS) {
            Some(MetaValue::Backups(records)) => records,
            _ => &[],
        }
    }

    pub fn set_backups(&mut self, records: Vec<BackupRecord>) {
        self.set(META_BACKUPS, MetaValue::Backups(records));
    }

    pub fn push_backup(&mut self, record: BackupRecord) {
        let mut records = self.backups().to_vec();
        records.push(record);
        self.set_backups(records);
    }

    /// Stamp the bag for a write: creation time is set only once,
    /// modification time and the encrypted flag are always refreshed.
    pub fn stamp_write(&mut self, now: DateTime<Utc>, encrypted: bool) {
        if self.creation_time().is_none() {
            self.set(META_CREATION_TIME, MetaValue::Timestamp(now));
        }
        self.set(META_MODIFICATION_TIME, MetaValue::Timestamp(now));
        self.set(META_ENCRYPTED, MetaValue::Bool(encrypted));
    }

    /// Stamp the bag for a read: only the access time is refreshed.
    pub fn stamp_read(&mut self, now: DateTime<Utc>) {
        self.set(META_ACCESS_TIME, MetaValue::Timestamp(now));
    }

    pub fn stamp_application_version(&mut self, version: &str) {
        self.set(
            META_APPLICATION_VERSION,
            MetaValue::Text(version.to_string()),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_case_insensitive() {
        let mut meta = StorageMetaData::default();
        meta.set("Encrypted", MetaValue::Bool(true));

        assert_eq!(meta.get("encrypted").and_then(MetaValue::as_bool), Some(true));
        assert!(meta.contains("ENCRYPTED"));

        // Re-setting under different case replaces rather than duplicates
        meta.set("encrypted", MetaValue::Bool(false));
        assert_eq!(meta.len(), 1);
        assert_eq!(meta.encrypted(), Some(false));
    }

    #[test]
    fn accessors_decode_only_their_own_variant() {
        let mut meta = StorageMetaData::default();
        meta.set("SaveSlot", MetaValue::Integer(3));
        meta.set("Label", MetaValue::Text("main".to_string()));

        assert_eq!(meta.get("saveslot").and_then(MetaValue::as_integer), Some(3));
        assert_eq!(meta.get("SaveSlot").and_then(MetaValue::as_text), None);
        assert_eq!(meta.get("Label").and_then(MetaValue::as_integer), None);
    }

    #[test]
    fn stamp_write_sets_creation_time_only_once() {
        let mut meta = StorageMetaData::default();
        let first = Utc::now();
        meta.stamp_write(first, false);

        let later = first + chrono::Duration::seconds(60);
        meta.stamp_write(later, true);

        assert_eq!(meta.creation_time(), Some(first));
        assert_eq!(meta.modification_time(), Some(later));
        assert_eq!(meta.encrypted(), Some(true));
    }

    #[test]
    fn backup_records_round_trip_through_json() {
        let mut meta = StorageMetaData::default();
        meta.push_backup(BackupRecord {
            identifier: "player/save1123456789.backup".to_string(),
            backup_time_utc: Utc::now(),
        });

        let json = serde_json::to_string(&meta).unwrap();
        let parsed: StorageMetaData = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.backups().len(), 1);
        assert_eq!(parsed, meta);
    }

    #[test]
    fn backup_record_uses_pascal_case_field_names() {
        let record = BackupRecord {
            identifier: "a.backup".to_string(),
            backup_time_utc: Utc::now(),
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"Identifier\""));
        assert!(json.contains("\"BackupTimeUtc\""));
    }

    #[test]
    fn meta_identifier_appends_reserved_suffix() {
        assert_eq!(meta_identifier("player/save1"), "player/save1.meta");
        assert!(is_meta_identifier("player/save1.meta"));
        assert!(!is_meta_identifier("player/save1"));
    }
}
