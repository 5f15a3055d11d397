//! Punishment records and the keys they are filed under.

use std::fmt;
use std::hash::Hash;
use std::net::Ipv4Addr;
use uuid::Uuid;

/// The three kinds of punishment the registry tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PunishmentKind {
    /// Player ban, keyed by player uid.
    Ban,
    /// Address ban, keyed by numeric IPv4.
    IpBan,
    /// Player mute, keyed by player uid.
    Mute,
}

impl PunishmentKind {
    /// Every kind, in load/flush order.
    pub const ALL: [PunishmentKind; 3] = [Self::Ban, Self::IpBan, Self::Mute];

    /// Short label used in logs and metrics.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Ban => "ban",
            Self::IpBan => "ip-ban",
            Self::Mute => "mute",
        }
    }

    /// Backing SQL table.
    pub fn table_name(&self) -> &'static str {
        match self {
            Self::Ban => "bans",
            Self::IpBan => "ip_bans",
            Self::Mute => "mutes",
        }
    }

    /// Column holding the subject key in [`Self::table_name`].
    pub fn key_column(&self) -> &'static str {
        match self {
            Self::Ban | Self::Mute => "uid",
            Self::IpBan => "ip",
        }
    }

    /// Message shown when punishing a subject that is already punished.
    pub fn already_punished_template(&self) -> &'static str {
        match self {
            Self::Ban => "%player% is already banned!",
            Self::IpBan => "IP %ip% is already banned!",
            Self::Mute => "%player% is already muted!",
        }
    }

    /// Message shown when pardoning a subject that is not punished.
    pub fn not_punished_template(&self) -> &'static str {
        match self {
            Self::Ban => "%player% is not banned!",
            Self::IpBan => "IP %ip% is not banned!",
            Self::Mute => "%player% is not muted!",
        }
    }
}

impl fmt::Display for PunishmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An active punishment. Never edited in place: replacing one means
/// pardoning and punishing again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Punishment {
    /// Reason given by the moderator.
    pub reason: Option<String>,
    /// Unix timestamp after which the punishment lapses (None = permanent).
    pub expires_at: Option<i64>,
    /// Player id of the issuing moderator.
    pub moderator_id: i64,
}

impl Punishment {
    pub fn new(reason: Option<String>, expires_at: Option<i64>, moderator_id: i64) -> Self {
        Self {
            reason,
            expires_at,
            moderator_id,
        }
    }
}

/// Numeric IPv4 encoding used as the ip-ban key (`10.0.0.1` is `167772161`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IpKey(u32);

impl IpKey {
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl From<Ipv4Addr> for IpKey {
    fn from(addr: Ipv4Addr) -> Self {
        Self(u32::from(addr))
    }
}

impl From<IpKey> for Ipv4Addr {
    fn from(key: IpKey) -> Self {
        Ipv4Addr::from(key.0)
    }
}

impl fmt::Display for IpKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Ipv4Addr::from(*self))
    }
}

/// A key as it crosses the storage boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubjectKey {
    Player(Uuid),
    Ip(IpKey),
}

impl From<Uuid> for SubjectKey {
    fn from(uid: Uuid) -> Self {
        Self::Player(uid)
    }
}

impl From<IpKey> for SubjectKey {
    fn from(ip: IpKey) -> Self {
        Self::Ip(ip)
    }
}

impl fmt::Display for SubjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Player(uid) => write!(f, "{}", uid),
            Self::Ip(ip) => write!(f, "{}", ip),
        }
    }
}

/// Key type of one punishment table.
pub trait TableKey: Copy + Eq + Hash + fmt::Display + Into<SubjectKey> {
    /// Narrow a storage key back to this table's key type.
    fn from_subject(key: SubjectKey) -> Option<Self>;
}

impl TableKey for Uuid {
    fn from_subject(key: SubjectKey) -> Option<Self> {
        match key {
            SubjectKey::Player(uid) => Some(uid),
            SubjectKey::Ip(_) => None,
        }
    }
}

impl TableKey for IpKey {
    fn from_subject(key: SubjectKey) -> Option<Self> {
        match key {
            SubjectKey::Ip(ip) => Some(ip),
            SubjectKey::Player(_) => None,
        }
    }
}

/// A player as the registry sees one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub uid: Uuid,
    pub name: String,
    pub ip: IpKey,
}

impl Player {
    pub fn new(uid: Uuid, name: impl Into<String>, ip: impl Into<IpKey>) -> Self {
        Self {
            uid,
            name: name.into(),
            ip: ip.into(),
        }
    }
}

/// The human-facing side of a key, interpolated into error messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subject {
    Player(String),
    Ip(IpKey),
}

impl Subject {
    /// Template placeholder name and its value.
    pub fn placeholder(&self) -> (&'static str, String) {
        match self {
            Self::Player(name) => ("player", name.clone()),
            Self::Ip(ip) => ("ip", ip.to_string()),
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Player(name) => f.write_str(name),
            Self::Ip(ip) => write!(f, "{}", ip),
        }
    }
}
