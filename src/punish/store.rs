//! Persistence gateway for the registry.
//!
//! The registry never asks the store whether someone is punished; it only
//! bulk-loads at startup, writes journaled changes on save, and resolves
//! moderator names.

use super::types::{Punishment, PunishmentKind, SubjectKey};
use crate::db::{Database, DbError, PunishmentRow};
use async_trait::async_trait;

/// Durable storage behind a [`PunishmentRegistry`](super::PunishmentRegistry).
#[async_trait]
pub trait PunishmentStore: Send + Sync {
    /// Every stored punishment of one kind.
    async fn load_all(&self, kind: PunishmentKind) -> Result<Vec<PunishmentRow>, DbError>;

    /// Write a punishment, replacing any row under the same key.
    async fn insert(
        &self,
        kind: PunishmentKind,
        key: SubjectKey,
        punishment: &Punishment,
    ) -> Result<(), DbError>;

    /// Remove a punishment. Returns whether a row existed.
    async fn delete(&self, kind: PunishmentKind, key: SubjectKey) -> Result<bool, DbError>;

    /// Resolve a player name to the id stored as `moderator`.
    async fn find_player_by_name(&self, name: &str) -> Result<Option<i64>, DbError>;
}

#[async_trait]
impl PunishmentStore for Database {
    async fn load_all(&self, kind: PunishmentKind) -> Result<Vec<PunishmentRow>, DbError> {
        self.punishments().load_all(kind).await
    }

    async fn insert(
        &self,
        kind: PunishmentKind,
        key: SubjectKey,
        punishment: &Punishment,
    ) -> Result<(), DbError> {
        self.punishments().insert(kind, key, punishment).await
    }

    async fn delete(&self, kind: PunishmentKind, key: SubjectKey) -> Result<bool, DbError> {
        self.punishments().delete(kind, key).await
    }

    async fn find_player_by_name(&self, name: &str) -> Result<Option<i64>, DbError> {
        self.players().find_id_by_name(name).await
    }
}
