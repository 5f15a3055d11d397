//! Integration test common infrastructure.
//!
//! Builds registries over real SQLite databases with a few known players.

#![allow(dead_code)]

use std::sync::Arc;
use uuid::Uuid;
use warden::db::Database;
use warden::punish::{IpKey, Player, PunishmentRegistry};

/// A database with players Bob (moderator), Alice and Carol recorded.
/// Uids are fixed so the same file can be reopened.
pub struct Fixture {
    pub db: Database,
    pub bob: Player,
    pub alice: Player,
    pub carol: Player,
}

impl Fixture {
    pub async fn open(path: &str) -> Self {
        let db = Database::new(path).await.expect("open database");
        let bob = Player::new(Uuid::from_u128(0xb0b), "Bob", IpKey::new(167_772_162));
        let alice = Player::new(Uuid::from_u128(0xa11ce), "Alice", IpKey::new(167_772_161));
        let carol = Player::new(Uuid::from_u128(0xca201), "Carol", IpKey::new(3_232_235_777));
        for player in [&bob, &alice, &carol] {
            db.players().upsert(player).await.expect("record player");
        }
        Self {
            db,
            bob,
            alice,
            carol,
        }
    }

    pub async fn memory() -> Self {
        Self::open(":memory:").await
    }

    /// A fresh, unloaded registry over this database.
    pub fn registry(&self) -> Arc<PunishmentRegistry> {
        Arc::new(PunishmentRegistry::new(Arc::new(self.db.clone())))
    }
}
