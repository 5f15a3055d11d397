//! Periodic save task.
//!
//! Flushes the registry journal on a fixed interval until told to stop.
//! Shutdown is only observed between saves, so a save is never cut short
//! with its drained entries unwritten.

use super::PunishmentRegistry;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Spawn the autosave task.
///
/// Runs [`PunishmentRegistry::save`] every `period` until `shutdown` turns
/// true or its sender is dropped.
pub fn spawn_autosave_task(
    registry: Arc<PunishmentRegistry>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // First tick completes immediately; nothing to save yet
        interval.tick().await;

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let report = registry.save().await;
                    if !report.is_empty() {
                        debug!(
                            inserted = report.inserted,
                            deleted = report.deleted,
                            failed = report.failed,
                            "Autosave completed"
                        );
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Autosave task stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::punish::{IpKey, Player, PunishmentKind};
    use uuid::Uuid;

    #[tokio::test]
    async fn autosave_flushes_on_interval_and_stops() {
        let db = Database::new(":memory:").await.unwrap();
        let bob = Player::new(Uuid::new_v4(), "Bob", IpKey::new(1));
        db.players().upsert(&bob).await.unwrap();

        let registry = Arc::new(PunishmentRegistry::new(Arc::new(db.clone())));
        let alice = Player::new(Uuid::new_v4(), "Alice", IpKey::new(2));
        registry.ban(&alice, None, None, "Bob").await.unwrap();

        let (tx, rx) = watch::channel(false);
        let task = spawn_autosave_task(Arc::clone(&registry), Duration::from_millis(20), rx);

        let mut stored = 0;
        for _ in 0..200 {
            stored = db.punishments().load_all(PunishmentKind::Ban).await.unwrap().len();
            if stored == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(stored, 1);
        assert_eq!(registry.stats().bans.pending_creates, 0);

        tx.send(true).unwrap();
        task.await.unwrap();
    }
}
