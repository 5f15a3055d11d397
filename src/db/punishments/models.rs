//! Punishment row models.

use crate::punish::{Punishment, SubjectKey};

/// One stored punishment: `{ uid|ip, reason, expiration, moderator }`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PunishmentRow {
    /// Subject the punishment is filed under.
    pub key: SubjectKey,
    pub punishment: Punishment,
}
