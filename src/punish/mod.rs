//! Punishment registry: bans, IP bans and mutes.
//!
//! - [`types`]: punishment records, kinds and subject keys
//! - [`expiry`]: lazy expiration check
//! - [`journal`]: per-kind table with its deferred-write journal
//! - [`registry`]: the registry and its typed operations
//! - [`store`]: persistence gateway trait
//! - [`autosave`]: periodic save task

pub mod autosave;
pub mod expiry;
mod journal;
mod registry;
pub mod store;
mod types;

pub use autosave::spawn_autosave_task;
pub use expiry::{ExpiryCheck, check_expiry};
pub use registry::{FlushReport, LoadReport, PunishmentRegistry, RegistryStats, TableStats};
pub use store::PunishmentStore;
pub use types::{IpKey, Player, Punishment, PunishmentKind, Subject, SubjectKey, TableKey};
