//! Repository for bans, IP bans and mutes.

mod models;
mod queries;

pub use models::PunishmentRow;

use crate::db::DbError;
use crate::punish::{Punishment, PunishmentKind, SubjectKey};
use sqlx::SqlitePool;

/// Repository for punishment rows.
pub struct PunishmentRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> PunishmentRepository<'a> {
    /// Create a new punishment repository.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Get every stored punishment of one kind.
    pub async fn load_all(&self, kind: PunishmentKind) -> Result<Vec<PunishmentRow>, DbError> {
        queries::load_punishments(self.pool, kind).await
    }

    /// Store a punishment, replacing any row under the same key.
    pub async fn insert(
        &self,
        kind: PunishmentKind,
        key: SubjectKey,
        punishment: &Punishment,
    ) -> Result<(), DbError> {
        queries::insert_punishment(self.pool, kind, key, punishment).await
    }

    /// Remove a punishment.
    pub async fn delete(&self, kind: PunishmentKind, key: SubjectKey) -> Result<bool, DbError> {
        queries::delete_punishment(self.pool, kind, key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::punish::IpKey;
    use uuid::Uuid;

    #[tokio::test]
    async fn insert_load_delete() {
        let db = Database::new(":memory:").await.unwrap();
        let repo = db.punishments();
        let uid = Uuid::new_v4();
        let ban = Punishment::new(Some("spam".into()), Some(1_900_000_000), 3);

        repo.insert(PunishmentKind::Ban, uid.into(), &ban).await.unwrap();
        let rows = repo.load_all(PunishmentKind::Ban).await.unwrap();
        assert_eq!(
            rows,
            vec![PunishmentRow {
                key: SubjectKey::Player(uid),
                punishment: ban,
            }]
        );

        // Tables are independent
        assert!(repo.load_all(PunishmentKind::Mute).await.unwrap().is_empty());

        assert!(repo.delete(PunishmentKind::Ban, uid.into()).await.unwrap());
        assert!(!repo.delete(PunishmentKind::Ban, uid.into()).await.unwrap());
        assert!(repo.load_all(PunishmentKind::Ban).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn ip_keys_round_trip_as_integers() {
        let db = Database::new(":memory:").await.unwrap();
        let repo = db.punishments();
        let ip = IpKey::new(u32::MAX);
        let ban = Punishment::new(None, None, 1);

        repo.insert(PunishmentKind::IpBan, ip.into(), &ban).await.unwrap();
        let rows = repo.load_all(PunishmentKind::IpBan).await.unwrap();
        assert_eq!(rows[0].key, SubjectKey::Ip(ip));
        assert_eq!(rows[0].punishment, ban);
    }

    #[tokio::test]
    async fn insert_replaces_existing_row() {
        let db = Database::new(":memory:").await.unwrap();
        let repo = db.punishments();
        let uid = Uuid::new_v4();

        repo.insert(PunishmentKind::Mute, uid.into(), &Punishment::new(None, None, 1))
            .await
            .unwrap();
        repo.insert(PunishmentKind::Mute, uid.into(), &Punishment::new(Some("again".into()), None, 2))
            .await
            .unwrap();

        let rows = repo.load_all(PunishmentKind::Mute).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].punishment.moderator_id, 2);
    }

    #[tokio::test]
    async fn mismatched_key_is_rejected() {
        let db = Database::new(":memory:").await.unwrap();
        let result = db
            .punishments()
            .insert(PunishmentKind::IpBan, Uuid::new_v4().into(), &Punishment::new(None, None, 1))
            .await;
        assert!(matches!(result, Err(DbError::KeyMismatch { table: "ip_bans", .. })));
    }
}
