//! warden - punishment registry for game servers.
//!
//! Keeps active bans, IP bans and mutes in memory, answers membership
//! queries from memory, and journals changes to SQLite on save.

pub mod config;
pub mod db;
pub mod error;
pub mod http;
pub mod metrics;
pub mod punish;
