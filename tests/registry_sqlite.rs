//! Integration tests for the punishment registry against SQLite.

mod common;

use common::Fixture;
use warden::error::PunishError;
use warden::punish::{IpKey, PunishmentKind, SubjectKey};

#[tokio::test]
async fn ban_save_unban_save() {
    let fx = Fixture::memory().await;
    let registry = fx.registry();
    registry.load().await;

    let ban = registry
        .ban(&fx.alice, Some("griefing".into()), None, "Bob")
        .await
        .unwrap();
    assert!(registry.is_banned(&fx.alice));
    assert!(!registry.is_banned(&fx.carol));

    let report = registry.save().await;
    assert_eq!(report.inserted, 1);
    let rows = fx.db.punishments().load_all(PunishmentKind::Ban).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].key, SubjectKey::Player(fx.alice.uid));
    assert_eq!(rows[0].punishment, ban);

    registry.unban(&fx.alice).unwrap();
    assert!(!registry.is_banned(&fx.alice));
    assert_eq!(registry.save().await.deleted, 1);
    assert!(fx.db.punishments().load_all(PunishmentKind::Ban).await.unwrap().is_empty());

    // Nothing left to write
    assert!(registry.save().await.is_empty());
}

#[tokio::test]
async fn moderator_id_comes_from_players_table() {
    let fx = Fixture::memory().await;
    let registry = fx.registry();
    let bob_id = fx.db.players().find_id_by_name("Bob").await.unwrap().unwrap();

    let mute = registry.mute(&fx.carol, None, None, "bob").await.unwrap();
    assert_eq!(mute.moderator_id, bob_id);

    let err = registry.mute(&fx.alice, None, None, "Nobody").await.unwrap_err();
    assert!(matches!(err, PunishError::ModeratorNotFound(ref name) if name == "Nobody"));
    assert!(!registry.is_muted(&fx.alice));
}

#[tokio::test]
async fn moderator_name_follows_its_newest_holder() {
    let fx = Fixture::memory().await;
    let registry = fx.registry();
    let old_id = fx.db.players().find_id_by_name("Bob").await.unwrap().unwrap();

    let new_bob = warden::punish::Player::new(uuid::Uuid::new_v4(), "BOB", fx.bob.ip);
    let new_id = fx.db.players().upsert(&new_bob).await.unwrap();
    assert_ne!(new_id, old_id);

    let ban = registry.ban(&fx.alice, None, None, "Bob").await.unwrap();
    assert_eq!(ban.moderator_id, new_id);
}

#[tokio::test]
async fn duplicate_and_missing_punishments_render_messages() {
    let fx = Fixture::memory().await;
    let registry = fx.registry();

    registry.ban(&fx.alice, None, None, "Bob").await.unwrap();
    let err = registry.ban(&fx.alice, None, None, "Bob").await.unwrap_err();
    assert_eq!(err.error_code(), "already_punished");
    assert_eq!(err.message(), "Alice is already banned!");

    let err = registry.unmute(&fx.alice).unwrap_err();
    assert_eq!(err.message(), "Alice is not muted!");

    let err = registry.ip_unban(fx.carol.ip).unwrap_err();
    assert_eq!(err.message(), "IP 192.168.1.1 is not banned!");
}

#[tokio::test]
async fn ip_ban_catches_every_player_on_the_address() {
    let fx = Fixture::memory().await;
    let registry = fx.registry();
    let shared = warden::punish::Player::new(uuid::Uuid::new_v4(), "AliceAlt", fx.alice.ip);

    registry.ip_ban(fx.alice.ip, None, None, "Bob").await.unwrap();
    assert!(registry.is_banned(&fx.alice));
    assert!(registry.is_banned(&shared));
    assert!(!registry.is_banned(&fx.bob));
    assert!(registry.ban_of(&fx.alice.uid).is_none());

    registry.save().await;
    let rows = fx.db.punishments().load_all(PunishmentKind::IpBan).await.unwrap();
    assert_eq!(rows[0].key, SubjectKey::Ip(IpKey::new(167_772_161)));
}

#[tokio::test]
async fn expired_punishment_is_deleted_on_next_save() {
    let fx = Fixture::memory().await;
    let registry = fx.registry();

    registry.mute(&fx.alice, None, Some(1_000), "Bob").await.unwrap();
    registry.save().await;
    assert_eq!(fx.db.punishments().load_all(PunishmentKind::Mute).await.unwrap().len(), 1);

    assert!(registry.is_muted_at(&fx.alice, 999));
    assert!(registry.is_muted_at(&fx.alice, 1_000));
    assert!(!registry.is_muted_at(&fx.alice, 1_001));
    assert!(registry.mute_of(&fx.alice.uid).is_none());

    assert_eq!(registry.save().await.deleted, 1);
    assert!(fx.db.punishments().load_all(PunishmentKind::Mute).await.unwrap().is_empty());
}

#[tokio::test]
async fn punish_then_pardon_before_save_leaves_no_row() {
    let fx = Fixture::memory().await;
    let registry = fx.registry();

    registry.ban(&fx.carol, None, None, "Bob").await.unwrap();
    registry.unban(&fx.carol).unwrap();
    registry.save().await;

    assert!(fx.db.punishments().load_all(PunishmentKind::Ban).await.unwrap().is_empty());
    let stats = registry.stats();
    assert_eq!(stats.bans.active, 0);
    assert_eq!(stats.bans.pending_creates, 0);
    assert_eq!(stats.bans.pending_deletes, 0);
}
