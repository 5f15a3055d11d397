//! Punishment query operations.
//!
//! One set of queries serves all three tables; [`PunishmentKind`] supplies
//! the table and key column, and the key is bound as TEXT (uid) or INTEGER
//! (ip) to match.

use super::models::PunishmentRow;
use crate::db::DbError;
use crate::punish::{IpKey, Punishment, PunishmentKind, SubjectKey};
use sqlx::SqlitePool;
use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments};
use tracing::warn;
use uuid::Uuid;

type SqliteQuery<'q> = Query<'q, Sqlite, SqliteArguments<'q>>;

/// Bind a subject key, refusing keys that don't belong in `kind`'s table.
fn bind_key<'q>(
    query: SqliteQuery<'q>,
    kind: PunishmentKind,
    key: SubjectKey,
) -> Result<SqliteQuery<'q>, DbError> {
    match (kind, key) {
        (PunishmentKind::Ban | PunishmentKind::Mute, SubjectKey::Player(uid)) => {
            Ok(query.bind(uid.to_string()))
        }
        (PunishmentKind::IpBan, SubjectKey::Ip(ip)) => Ok(query.bind(i64::from(ip.raw()))),
        _ => Err(DbError::KeyMismatch {
            table: kind.table_name(),
            key: key.to_string(),
        }),
    }
}

/// Insert (or replace) a punishment row.
pub async fn insert_punishment(
    pool: &SqlitePool,
    kind: PunishmentKind,
    key: SubjectKey,
    punishment: &Punishment,
) -> Result<(), DbError> {
    let query = format!(
        r#"
        INSERT OR REPLACE INTO {} ({}, reason, expiration, moderator)
        VALUES (?, ?, ?, ?)
        "#,
        kind.table_name(),
        kind.key_column()
    );

    bind_key(sqlx::query(&query), kind, key)?
        .bind(punishment.reason.as_deref())
        .bind(punishment.expires_at)
        .bind(punishment.moderator_id)
        .execute(pool)
        .await?;

    Ok(())
}

/// Delete a punishment row. Returns whether a row existed.
pub async fn delete_punishment(
    pool: &SqlitePool,
    kind: PunishmentKind,
    key: SubjectKey,
) -> Result<bool, DbError> {
    let query = format!(
        "DELETE FROM {} WHERE {} = ?",
        kind.table_name(),
        kind.key_column()
    );

    let result = bind_key(sqlx::query(&query), kind, key)?
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Load every row of `kind`, expired ones included.
///
/// Rows whose key doesn't decode are skipped with a warning.
pub async fn load_punishments(
    pool: &SqlitePool,
    kind: PunishmentKind,
) -> Result<Vec<PunishmentRow>, DbError> {
    let query = format!(
        "SELECT {}, reason, expiration, moderator FROM {}",
        kind.key_column(),
        kind.table_name()
    );

    let rows = match kind {
        PunishmentKind::IpBan => {
            sqlx::query_as::<_, (i64, Option<String>, Option<i64>, i64)>(&query)
                .fetch_all(pool)
                .await?
                .into_iter()
                .filter_map(|(ip, reason, expiration, moderator)| {
                    let Ok(raw) = u32::try_from(ip) else {
                        warn!(table = kind.table_name(), ip, "Skipping row with out-of-range ip");
                        return None;
                    };
                    Some(PunishmentRow {
                        key: SubjectKey::Ip(IpKey::new(raw)),
                        punishment: Punishment::new(reason, expiration, moderator),
                    })
                })
                .collect()
        }
        PunishmentKind::Ban | PunishmentKind::Mute => {
            sqlx::query_as::<_, (String, Option<String>, Option<i64>, i64)>(&query)
                .fetch_all(pool)
                .await?
                .into_iter()
                .filter_map(|(uid, reason, expiration, moderator)| {
                    let Ok(uid) = Uuid::parse_str(&uid) else {
                        warn!(table = kind.table_name(), uid = %uid, "Skipping row with malformed uid");
                        return None;
                    };
                    Some(PunishmentRow {
                        key: SubjectKey::Player(uid),
                        punishment: Punishment::new(reason, expiration, moderator),
                    })
                })
                .collect()
        }
    };

    Ok(rows)
}
