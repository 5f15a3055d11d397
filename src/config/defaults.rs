//! Default value functions for configuration.

/// Returns `true` (for serde defaults).
pub fn default_true() -> bool {
    true
}

pub fn default_database_path() -> String {
    "warden.db".to_string()
}

/// Seconds between autosaves.
pub fn default_autosave_interval() -> u64 {
    60
}
