//! Player repository.
//!
//! Players are recorded as they are seen so that moderators can be
//! resolved from a name to the numeric id stored on each punishment.
//! Names are not unique over time: when a name moves to another uid, the
//! most recently recorded holder wins.

use super::DbError;
use crate::punish::Player;
use sqlx::SqlitePool;

/// Repository for player records.
pub struct PlayerRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> PlayerRepository<'a> {
    /// Create a new player repository.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Record a player, refreshing name and ip if the uid is known.
    /// Returns the player's id.
    pub async fn upsert(&self, player: &Player) -> Result<i64, DbError> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO players (uid, name, ip, seen)
            VALUES (?, ?, ?, (SELECT COALESCE(MAX(seen), 0) + 1 FROM players))
            ON CONFLICT(uid) DO UPDATE
                SET name = excluded.name, ip = excluded.ip, seen = excluded.seen
            RETURNING id
            "#,
        )
        .bind(player.uid.to_string())
        .bind(&player.name)
        .bind(i64::from(player.ip.raw()))
        .fetch_one(self.pool)
        .await?;

        Ok(id)
    }

    /// Resolve a player name (case-insensitive) to the id of its current
    /// holder.
    pub async fn find_id_by_name(&self, name: &str) -> Result<Option<i64>, DbError> {
        let id = sqlx::query_scalar::<_, i64>(
            "SELECT id FROM players WHERE name = ? ORDER BY seen DESC LIMIT 1",
        )
        .bind(name)
        .fetch_optional(self.pool)
        .await?;

        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use crate::db::Database;
    use crate::punish::{IpKey, Player};
    use uuid::Uuid;

    #[tokio::test]
    async fn upsert_and_resolve() {
        let db = Database::new(":memory:").await.unwrap();
        let players = db.players();
        let bob = Player::new(Uuid::new_v4(), "Bob", IpKey::new(167_772_161));

        let id = players.upsert(&bob).await.unwrap();
        assert_eq!(players.find_id_by_name("Bob").await.unwrap(), Some(id));
        assert_eq!(players.find_id_by_name("bob").await.unwrap(), Some(id));
        assert_eq!(players.find_id_by_name("Carol").await.unwrap(), None);
    }

    #[tokio::test]
    async fn upsert_keeps_id_on_rename() {
        let db = Database::new(":memory:").await.unwrap();
        let players = db.players();
        let uid = Uuid::new_v4();

        let first = players
            .upsert(&Player::new(uid, "Bob", IpKey::new(1)))
            .await
            .unwrap();
        let second = players
            .upsert(&Player::new(uid, "Robert", IpKey::new(2)))
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(players.find_id_by_name("Bob").await.unwrap(), None);
        assert_eq!(players.find_id_by_name("Robert").await.unwrap(), Some(first));
    }

    #[tokio::test]
    async fn name_taken_over_by_another_uid_resolves_to_newest_holder() {
        let db = Database::new(":memory:").await.unwrap();
        let players = db.players();
        let old = Player::new(Uuid::new_v4(), "Bob", IpKey::new(1));
        let new = Player::new(Uuid::new_v4(), "bob", IpKey::new(2));

        let old_id = players.upsert(&old).await.unwrap();
        let new_id = players.upsert(&new).await.unwrap();
        assert_ne!(old_id, new_id);
        assert_eq!(players.find_id_by_name("Bob").await.unwrap(), Some(new_id));

        // Seen again under the name, the first uid holds it once more
        players.upsert(&old).await.unwrap();
        assert_eq!(players.find_id_by_name("BOB").await.unwrap(), Some(old_id));
    }
}
