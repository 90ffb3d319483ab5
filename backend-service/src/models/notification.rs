//! Notification record as stored in the `notification` table.

use crate::config::DB_UTC_OFFSET_SECS;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::{Column, FromRow, Row, TypeInfo};
use uuid::Uuid;

/// Body used when a lookup yields no row.
pub const NO_MESSAGE_FOUND: &str = "No message found";

/// A single notification.
///
/// Field order and JSON key names are part of the external response format.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "CreatedAt")]
    pub created_at: String,
    #[serde(rename = "UpdatedAt")]
    pub updated_at: String,
    #[serde(rename = "IsRead")]
    pub is_read: bool,
    #[serde(rename = "IsDeleted")]
    pub is_deleted: bool,
    #[serde(rename = "Verification")]
    pub verification: bool,
    #[serde(rename = "Email")]
    pub email: String,
    #[serde(rename = "Body")]
    pub body: String,
}

impl Notification {
    /// Record returned in place of a failed lookup: echoes the requested id,
    /// everything else empty.
    pub fn placeholder(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            body: NO_MESSAGE_FOUND.to_string(),
            ..Default::default()
        }
    }
}

// Columns are read by position, matching `SELECT *` on the notification table.
impl<'r> FromRow<'r, PgRow> for Notification {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: text_column(row, 0)?,
            created_at: text_column(row, 1)?,
            updated_at: text_column(row, 2)?,
            is_read: row.try_get(3)?,
            is_deleted: row.try_get(4)?,
            verification: row.try_get(5)?,
            email: row.try_get(6)?,
            body: row.try_get(7)?,
        })
    }
}

/// Decode a column into its textual form.
///
/// Timestamps and non-text identifiers are rendered rather than rejected.
/// `timestamptz` is shown in the session time zone; `timestamp` and `date`
/// are taken as UTC. NULL is an error.
fn text_column(row: &PgRow, index: usize) -> Result<String, sqlx::Error> {
    let type_name = row.try_column(index)?.type_info().name().to_string();

    let text = match type_name.as_str() {
        "TIMESTAMPTZ" => {
            let session = FixedOffset::east_opt(DB_UTC_OFFSET_SECS)
                .ok_or_else(|| sqlx::Error::Decode("invalid session UTC offset".into()))?;
            rfc3339_nano(
                &row.try_get::<DateTime<Utc>, _>(index)?
                    .with_timezone(&session),
            )
        }
        "TIMESTAMP" => rfc3339_nano(
            &row.try_get::<NaiveDateTime, _>(index)?
                .and_utc()
                .fixed_offset(),
        ),
        "DATE" => rfc3339_nano(
            &row.try_get::<NaiveDate, _>(index)?
                .and_time(NaiveTime::MIN)
                .and_utc()
                .fixed_offset(),
        ),
        "INT2" => row.try_get::<i16, _>(index)?.to_string(),
        "INT4" => row.try_get::<i32, _>(index)?.to_string(),
        "INT8" => row.try_get::<i64, _>(index)?.to_string(),
        "UUID" => row.try_get::<Uuid, _>(index)?.to_string(),
        _ => row.try_get::<String, _>(index)?,
    };

    Ok(text)
}

/// RFC 3339 with nanosecond precision, trailing fractional zeros dropped,
/// and `Z` for a zero offset: `2024-04-01T09:00:00.5+09:00`.
pub fn rfc3339_nano(timestamp: &DateTime<FixedOffset>) -> String {
    let mut out = timestamp.format("%Y-%m-%dT%H:%M:%S").to_string();

    let nanos = timestamp.nanosecond() % 1_000_000_000;
    if nanos > 0 {
        let fraction = format!("{:09}", nanos);
        out.push('.');
        out.push_str(fraction.trim_end_matches('0'));
    }

    if timestamp.offset().local_minus_utc() == 0 {
        out.push('Z');
    } else {
        out.push_str(&timestamp.format("%:z").to_string());
    }

    out
}
