//! The punishment registry.
//!
//! Authoritative in-memory record of active bans, IP bans and mutes.
//!
//! # Architecture
//!
//! - Loaded from the store on startup ([`PunishmentRegistry::load`])
//! - Punish/pardon mutate memory synchronously and journal the change
//! - [`PunishmentRegistry::save`] drains the journal into the store
//! - Expired punishments are lifted lazily by `is_banned` / `is_muted`
//!
//! Membership is decided from memory only. Each kind's table and journal sit
//! behind one lock, which is what keeps a subject from holding two
//! punishments of the same kind.

use super::expiry::{self, ExpiryCheck, check_expiry};
use super::journal::Table;
use super::store::PunishmentStore;
use super::types::{IpKey, Player, Punishment, PunishmentKind, Subject, TableKey};
use crate::db::{DbError, PunishmentRow};
use crate::error::PunishError;
use crate::metrics;
use futures_util::future::join_all;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Outcome of a bulk load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub bans: usize,
    pub ip_bans: usize,
    pub mutes: usize,
    /// Kinds whose rows could not be read.
    pub failed: Vec<PunishmentKind>,
}

/// Outcome of one [`PunishmentRegistry::save`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushReport {
    pub inserted: usize,
    pub deleted: usize,
    /// Writes the store rejected. They are back in the journal.
    pub failed: usize,
    /// Inserts held back because a delete for the same key failed.
    pub deferred: usize,
}

impl FlushReport {
    /// Writes attempted, successful or not.
    pub fn writes(&self) -> usize {
        self.inserted + self.deleted + self.failed
    }

    pub fn is_empty(&self) -> bool {
        self.writes() == 0 && self.deferred == 0
    }
}

/// Counts for one kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableStats {
    pub active: usize,
    pub pending_creates: usize,
    pub pending_deletes: usize,
}

/// Counts for every kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryStats {
    pub bans: TableStats,
    pub ip_bans: TableStats,
    pub mutes: TableStats,
}

/// In-memory registry of active punishments, journaled to a store.
pub struct PunishmentRegistry {
    store: Arc<dyn PunishmentStore>,
    bans: Mutex<Table<Uuid>>,
    ip_bans: Mutex<Table<IpKey>>,
    mutes: Mutex<Table<Uuid>>,
    /// Serializes saves so a journal is never written out of order.
    flush_lock: tokio::sync::Mutex<()>,
}

impl PunishmentRegistry {
    /// Create an empty registry over `store`. Nothing is loaded yet.
    pub fn new(store: Arc<dyn PunishmentStore>) -> Self {
        Self {
            store,
            bans: Mutex::new(Table::new()),
            ip_bans: Mutex::new(Table::new()),
            mutes: Mutex::new(Table::new()),
            flush_lock: tokio::sync::Mutex::new(()),
        }
    }

    // ========================================================================
    // Load
    // ========================================================================

    /// Read every kind from the store into memory.
    ///
    /// Safe to run while the registry is in use: a row never overrides a
    /// punishment issued in the meantime, nor revives one pardoned in the
    /// meantime. A kind that fails to load is reported and left empty.
    ///
    /// Saves wait for the load to finish. Otherwise a pardon could be saved
    /// while the rows are in flight, and the stale row would bring it back.
    pub async fn load(&self) -> LoadReport {
        let _guard = self.flush_lock.lock().await;

        let (bans, ip_bans, mutes) = tokio::join!(
            self.store.load_all(PunishmentKind::Ban),
            self.store.load_all(PunishmentKind::IpBan),
            self.store.load_all(PunishmentKind::Mute),
        );

        let mut failed = Vec::new();
        let report = LoadReport {
            bans: Self::fill(&self.bans, PunishmentKind::Ban, bans, &mut failed),
            ip_bans: Self::fill(&self.ip_bans, PunishmentKind::IpBan, ip_bans, &mut failed),
            mutes: Self::fill(&self.mutes, PunishmentKind::Mute, mutes, &mut failed),
            failed,
        };

        info!(
            bans = report.bans,
            ip_bans = report.ip_bans,
            mutes = report.mutes,
            "Punishments loaded"
        );
        report
    }

    /// Run [`Self::load`] in the background. The registry answers queries
    /// right away, without the stored punishments until the load lands.
    pub fn spawn_load(self: &Arc<Self>) -> JoinHandle<LoadReport> {
        let registry = Arc::clone(self);
        tokio::spawn(async move { registry.load().await })
    }

    fn fill<K: TableKey>(
        table: &Mutex<Table<K>>,
        kind: PunishmentKind,
        rows: Result<Vec<PunishmentRow>, DbError>,
        failed: &mut Vec<PunishmentKind>,
    ) -> usize {
        let rows = match rows {
            Ok(rows) => rows,
            Err(e) => {
                warn!(kind = %kind, error = %e, "Failed to load punishments");
                failed.push(kind);
                return 0;
            }
        };

        let mut table = table.lock();
        let mut loaded = 0;
        for row in rows {
            match K::from_subject(row.key) {
                Some(key) => {
                    if table.load(key, row.punishment) {
                        loaded += 1;
                    }
                }
                None => warn!(kind = %kind, key = %row.key, "Skipping row keyed for another table"),
            }
        }
        loaded
    }

    // ========================================================================
    // Generic primitives
    // ========================================================================

    fn punish_in<K: TableKey>(
        table: &Mutex<Table<K>>,
        kind: PunishmentKind,
        key: K,
        punishment: Punishment,
        subject: impl FnOnce() -> Subject,
    ) -> Result<(), PunishError> {
        let moderator_id = punishment.moderator_id;
        let expires_at = punishment.expires_at;

        if !table.lock().punish(key, punishment) {
            metrics::record_rejected(kind.name(), "already_punished");
            return Err(PunishError::AlreadyPunished {
                kind,
                subject: subject(),
            });
        }

        metrics::record_punish(kind.name());
        info!(kind = %kind, subject = %key, moderator_id, expires_at, "Punishment issued");
        Ok(())
    }

    fn pardon_in<K: TableKey>(
        table: &Mutex<Table<K>>,
        kind: PunishmentKind,
        key: K,
        subject: impl FnOnce() -> Subject,
    ) -> Result<Punishment, PunishError> {
        let Some(removed) = table.lock().pardon(&key) else {
            metrics::record_rejected(kind.name(), "not_punished");
            return Err(PunishError::NotPunished {
                kind,
                subject: subject(),
            });
        };

        metrics::record_pardon(kind.name());
        info!(kind = %kind, subject = %key, "Punishment pardoned");
        Ok(removed)
    }

    /// Whether `key` holds an unexpired punishment. An expired one is
    /// pardoned on the spot.
    fn check_active<K: TableKey>(
        table: &Mutex<Table<K>>,
        kind: PunishmentKind,
        key: K,
        now: i64,
    ) -> bool {
        let mut table = table.lock();
        let Some(punishment) = table.get(&key) else {
            return false;
        };

        match check_expiry(punishment, now) {
            ExpiryCheck::Active => true,
            ExpiryCheck::Expired => {
                let lifted = table.pardon(&key);
                metrics::record_expiry(kind.name());
                debug!(
                    kind = %kind,
                    subject = %key,
                    expired_at = ?lifted.and_then(|p| p.expires_at),
                    "Expired punishment lifted"
                );
                false
            }
        }
    }

    /// Resolve the moderator and build the punishment they are issuing.
    async fn issue(
        &self,
        reason: Option<String>,
        expires_at: Option<i64>,
        moderator: &str,
    ) -> Result<Punishment, PunishError> {
        let moderator_id = self
            .store
            .find_player_by_name(moderator)
            .await?
            .ok_or_else(|| PunishError::ModeratorNotFound(moderator.to_string()))?;

        Ok(Punishment::new(reason, expires_at, moderator_id))
    }

    // ========================================================================
    // Typed operations
    // ========================================================================

    /// Ban a player. Fails if the moderator is unknown or the player is
    /// already banned.
    pub async fn ban(
        &self,
        player: &Player,
        reason: Option<String>,
        expires_at: Option<i64>,
        moderator: &str,
    ) -> Result<Punishment, PunishError> {
        let punishment = self.issue(reason, expires_at, moderator).await?;
        Self::punish_in(
            &self.bans,
            PunishmentKind::Ban,
            player.uid,
            punishment.clone(),
            || Subject::Player(player.name.clone()),
        )?;
        Ok(punishment)
    }

    /// Lift a player's ban, returning it.
    pub fn unban(&self, player: &Player) -> Result<Punishment, PunishError> {
        Self::pardon_in(&self.bans, PunishmentKind::Ban, player.uid, || {
            Subject::Player(player.name.clone())
        })
    }

    /// Ban an address.
    pub async fn ip_ban(
        &self,
        ip: IpKey,
        reason: Option<String>,
        expires_at: Option<i64>,
        moderator: &str,
    ) -> Result<Punishment, PunishError> {
        let punishment = self.issue(reason, expires_at, moderator).await?;
        Self::punish_in(&self.ip_bans, PunishmentKind::IpBan, ip, punishment.clone(), || {
            Subject::Ip(ip)
        })?;
        Ok(punishment)
    }

    /// Lift an address ban, returning it.
    pub fn ip_unban(&self, ip: IpKey) -> Result<Punishment, PunishError> {
        Self::pardon_in(&self.ip_bans, PunishmentKind::IpBan, ip, || Subject::Ip(ip))
    }

    /// Mute a player.
    pub async fn mute(
        &self,
        player: &Player,
        reason: Option<String>,
        expires_at: Option<i64>,
        moderator: &str,
    ) -> Result<Punishment, PunishError> {
        let punishment = self.issue(reason, expires_at, moderator).await?;
        Self::punish_in(
            &self.mutes,
            PunishmentKind::Mute,
            player.uid,
            punishment.clone(),
            || Subject::Player(player.name.clone()),
        )?;
        Ok(punishment)
    }

    /// Lift a player's mute, returning it.
    pub fn unmute(&self, player: &Player) -> Result<Punishment, PunishError> {
        Self::pardon_in(&self.mutes, PunishmentKind::Mute, player.uid, || {
            Subject::Player(player.name.clone())
        })
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Whether the player is banned by uid or by address.
    pub fn is_banned(&self, player: &Player) -> bool {
        self.is_banned_at(player, expiry::now())
    }

    /// [`Self::is_banned`] against an explicit clock.
    ///
    /// Both tables are always checked, so an expired ip-ban is lifted even
    /// when the uid ban is still in force.
    pub fn is_banned_at(&self, player: &Player, now: i64) -> bool {
        let banned = Self::check_active(&self.bans, PunishmentKind::Ban, player.uid, now);
        let ip_banned = Self::check_active(&self.ip_bans, PunishmentKind::IpBan, player.ip, now);
        banned || ip_banned
    }

    /// Whether the player is muted.
    pub fn is_muted(&self, player: &Player) -> bool {
        self.is_muted_at(player, expiry::now())
    }

    /// [`Self::is_muted`] against an explicit clock.
    pub fn is_muted_at(&self, player: &Player, now: i64) -> bool {
        Self::check_active(&self.mutes, PunishmentKind::Mute, player.uid, now)
    }

    /// The player's ban record, expired or not.
    pub fn ban_of(&self, uid: &Uuid) -> Option<Punishment> {
        self.bans.lock().get(uid).cloned()
    }

    /// The address's ban record, expired or not.
    pub fn ip_ban_of(&self, ip: IpKey) -> Option<Punishment> {
        self.ip_bans.lock().get(&ip).cloned()
    }

    /// The player's mute record, expired or not.
    pub fn mute_of(&self, uid: &Uuid) -> Option<Punishment> {
        self.mutes.lock().get(uid).cloned()
    }

    pub fn stats(&self) -> RegistryStats {
        fn table_stats<K: TableKey>(table: &Mutex<Table<K>>) -> TableStats {
            let table = table.lock();
            TableStats {
                active: table.len(),
                pending_creates: table.pending_creates(),
                pending_deletes: table.pending_deletes(),
            }
        }

        RegistryStats {
            bans: table_stats(&self.bans),
            ip_bans: table_stats(&self.ip_bans),
            mutes: table_stats(&self.mutes),
        }
    }

    // ========================================================================
    // Save
    // ========================================================================

    /// Write everything journaled since the last save to the store.
    ///
    /// Per kind, deletes go out before inserts. Failed writes are logged and
    /// put back in the journal for the next save.
    pub async fn save(&self) -> FlushReport {
        let _guard = self.flush_lock.lock().await;

        let mut report = FlushReport::default();
        self.flush_table(&self.bans, PunishmentKind::Ban, &mut report).await;
        self.flush_table(&self.ip_bans, PunishmentKind::IpBan, &mut report).await;
        self.flush_table(&self.mutes, PunishmentKind::Mute, &mut report).await;

        let stats = self.stats();
        metrics::set_active(PunishmentKind::Ban.name(), stats.bans.active);
        metrics::set_active(PunishmentKind::IpBan.name(), stats.ip_bans.active);
        metrics::set_active(PunishmentKind::Mute.name(), stats.mutes.active);

        if report.failed > 0 {
            warn!(
                inserted = report.inserted,
                deleted = report.deleted,
                failed = report.failed,
                deferred = report.deferred,
                "Punishments saved with failures"
            );
        } else if !report.is_empty() {
            debug!(
                inserted = report.inserted,
                deleted = report.deleted,
                "Punishments saved"
            );
        }
        report
    }

    async fn flush_table<K: TableKey + Send>(
        &self,
        table: &Mutex<Table<K>>,
        kind: PunishmentKind,
        report: &mut FlushReport,
    ) {
        let drained = table.lock().drain();
        if drained.is_empty() {
            return;
        }

        let store = self.store.as_ref();

        let results = join_all(
            drained
                .deletes
                .iter()
                .map(|key| store.delete(kind, (*key).into())),
        )
        .await;

        let mut failed_deletes = Vec::new();
        for (key, result) in drained.deletes.into_iter().zip(results) {
            match result {
                Ok(_) => {
                    report.deleted += 1;
                    metrics::record_write("delete", true);
                }
                Err(e) => {
                    warn!(kind = %kind, subject = %key, error = %e, "Failed to delete punishment, will retry");
                    report.failed += 1;
                    metrics::record_write("delete", false);
                    failed_deletes.push(key);
                }
            }
        }

        // An insert may not overtake a delete of the same key
        let (mut retry, creates): (Vec<_>, Vec<_>) = drained
            .creates
            .into_iter()
            .partition(|(key, _)| failed_deletes.contains(key));
        report.deferred += retry.len();

        let results = join_all(
            creates
                .iter()
                .map(|(key, punishment)| store.insert(kind, (*key).into(), punishment)),
        )
        .await;

        for ((key, punishment), result) in creates.into_iter().zip(results) {
            match result {
                Ok(()) => {
                    report.inserted += 1;
                    metrics::record_write("insert", true);
                }
                Err(e) => {
                    warn!(kind = %kind, subject = %key, error = %e, "Failed to insert punishment, will retry");
                    report.failed += 1;
                    metrics::record_write("insert", false);
                    retry.push((key, punishment));
                }
            }
        }

        if retry.is_empty() && failed_deletes.is_empty() {
            return;
        }

        let mut table = table.lock();
        for (key, punishment) in retry {
            table.requeue_create(key, punishment);
        }
        table.requeue_deletes(failed_deletes);
    }
}
