//! Backup lifecycle
//!
//! Backups are timestamped copies of an item tracked inside the owning
//! item's metadata. A backup identifier is derived deterministically from
//! the owner's identifier plus a nanosecond timestamp plus the reserved
//! backup suffix, so two backups of the same item never collide in
//! practice. Backup copies go through the normal copy path and are
//! therefore catalog-tracked like any other item.

use crate::meta::BackupRecord;
use crate::results::{ClearResult, DeleteResult};
use crate::store::Storage;
use chrono::{DateTime, Utc};
use savepoint_core::{Result, BACKUP_SUFFIX};
use tracing::{debug, warn};

/// The backup identifier for an item at a given instant
#[must_use]
pub fn backup_identifier(identifier: &str, at: DateTime<Utc>) -> String {
    let ticks = at
        .timestamp_nanos_opt()
        .unwrap_or_else(|| at.timestamp_micros());
    format!("{identifier}{ticks}{BACKUP_SUFFIX}")
}

impl Storage {
    /// Copy the item to a derived backup identifier and record the backup
    /// in the item's metadata.
    pub async fn create_backup(&self, identifier: &str) -> Result<BackupRecord> {
        let now = Utc::now();
        let backup_id = backup_identifier(identifier, now);
        let copy = self.copy_item(identifier, &backup_id, true).await?;

        let record = BackupRecord {
            identifier: copy.identifier.unwrap_or(backup_id),
            backup_time_utc: now,
        };
        let mut meta = self.load_metadata(identifier).await?;
        meta.push_backup(record.clone());
        self.save_metadata(identifier, &meta).await?;
        debug!(identifier, backup = %record.identifier, "created backup");
        Ok(record)
    }

    /// All recorded backups for the item, oldest first. Entries may be
    /// stale: a recorded backup is not guaranteed to still exist on the
    /// backend.
    pub async fn backups(&self, identifier: &str) -> Result<Vec<BackupRecord>> {
        Ok(self.load_metadata(identifier).await?.backups().to_vec())
    }

    /// The most recent recorded backup whose item still exists on the
    /// backend. Stale records are skipped, not purged.
    pub async fn latest_backup(&self, identifier: &str) -> Result<Option<BackupRecord>> {
        let mut latest: Option<BackupRecord> = None;
        for record in self.backups(identifier).await? {
            if !self.exists(&record.identifier).await? {
                continue;
            }
            let newer = latest
                .as_ref()
                .map(|best| record.backup_time_utc > best.backup_time_utc)
                .unwrap_or(true);
            if newer {
                latest = Some(record);
            }
        }
        Ok(latest)
    }

    /// Restore a backup by moving it over the live item. Returns `false`,
    /// never an error, when the backup no longer exists.
    pub async fn restore_backup(&self, identifier: &str, backup: &BackupRecord) -> Result<bool> {
        if !self.exists(&backup.identifier).await? {
            warn!(identifier, backup = %backup.identifier, "backup no longer exists, restore skipped");
            return Ok(false);
        }
        self.move_item(&backup.identifier, identifier, true).await?;
        debug!(identifier, backup = %backup.identifier, "restored backup");
        Ok(true)
    }

    /// Restore the most recent still-existing backup. Returns `false` when
    /// there is none.
    pub async fn restore_latest_backup(&self, identifier: &str) -> Result<bool> {
        match self.latest_backup(identifier).await? {
            Some(backup) => self.restore_backup(identifier, &backup).await,
            None => Ok(false),
        }
    }

    /// Delete one recorded backup. When the backup item is already gone the
    /// result is a failure and the metadata record list is left untouched;
    /// otherwise the record is removed and persisted before the item is
    /// physically deleted.
    pub async fn delete_backup(
        &self,
        identifier: &str,
        backup: &BackupRecord,
    ) -> Result<DeleteResult> {
        if !self.exists(&backup.identifier).await? {
            return Ok(DeleteResult::failure());
        }

        let mut meta = self.load_metadata(identifier).await?;
        let remaining: Vec<BackupRecord> = meta
            .backups()
            .iter()
            .filter(|record| record.identifier != backup.identifier)
            .cloned()
            .collect();
        meta.set_backups(remaining);
        self.save_metadata(identifier, &meta).await?;

        self.delete(&backup.identifier).await
    }

    /// Delete every recorded backup, continuing past individual failures,
    /// then clear the record list unconditionally (stale entries are
    /// dropped too).
    pub async fn delete_backups(&self, identifier: &str) -> Result<ClearResult> {
        let mut meta = self.load_metadata(identifier).await?;
        let records = meta.backups().to_vec();

        let mut succeeded = true;
        let mut identifiers = Vec::with_capacity(records.len());
        for record in &records {
            identifiers.push(record.identifier.clone());
            match self.exists(&record.identifier).await {
                Ok(true) => match self.delete(&record.identifier).await {
                    Ok(result) => succeeded &= result.succeeded,
                    Err(e) => {
                        warn!(identifier, backup = %record.identifier, error = %e,
                            "failed to delete backup");
                        succeeded = false;
                    }
                },
                Ok(false) => succeeded = false,
                Err(e) => {
                    warn!(identifier, backup = %record.identifier, error = %e,
                        "failed to check backup existence");
                    succeeded = false;
                }
            }
        }

        meta.set_backups(Vec::new());
        self.save_metadata(identifier, &meta).await?;
        Ok(ClearResult {
            succeeded,
            identifiers,
        })
    }

    /// Remove an item together with all of its recorded backups.
    pub async fn delete_and_backups(&self, identifier: &str) -> Result<DeleteResult> {
        self.delete_backups(identifier).await?;
        self.delete(identifier).await
    }
}
