use crate::error::FutureSightError;
use crate::model::{Banner, BannerCardInfo, BannerCategory};
use crate::planner::UserResources;
use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Date format of the `banners` date columns
const STORED_DATE_FORMAT: &str = "%Y-%m-%d";

pub const SETTING_JEWELS: &str = "jewels";
pub const SETTING_CHARACTER_TICKETS: &str = "character_tickets";
pub const SETTING_SINGLE_TICKETS: &str = "single_tickets";
pub const SETTING_DAILY_JEWEL_INCOME: &str = "daily_jewel_income";
pub const SETTING_DATA_VERSION: &str = "data_version";

/// Event for audit trail: refreshes, track/untrack, data updates
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Event {
    pub event_id: String,
    pub timestamp: DateTime<Utc>,
    pub event_type: String,
    pub entity_type: String,
    pub entity_id: String,
    pub data: serde_json::Value,
    pub actor: String,
}

impl Event {
    pub fn new(
        event_type: &str,
        entity_type: &str,
        entity_id: &str,
        data: serde_json::Value,
        actor: &str,
    ) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event_type: event_type.to_string(),
            entity_type: entity_type.to_string(),
            entity_id: entity_id.to_string(),
            data,
            actor: actor.to_string(),
        }
    }
}

/// Open (or create) the database file and make sure the schema exists
pub fn open_database(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)
        .with_context(|| format!("Failed to open database {}", path.display()))?;
    setup_database(&conn)?;
    Ok(conn)
}

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    // ==========================================================================
    // Banners Table (featured entities stored as JSON)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS banners (
            id TEXT PRIMARY KEY,
            position INTEGER NOT NULL,
            name TEXT NOT NULL,
            category TEXT NOT NULL,
            source_start_date TEXT NOT NULL,
            source_end_date TEXT NOT NULL,
            image_reference TEXT,
            external_link_url TEXT,
            is_tracked INTEGER NOT NULL DEFAULT 0,
            featured_entities TEXT NOT NULL,
            updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    // ==========================================================================
    // Settings Table (user resources, local data version)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )",
        [],
    )?;

    // ==========================================================================
    // Events Table (audit trail)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS events (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            event_id TEXT UNIQUE NOT NULL,
            timestamp TEXT NOT NULL,
            event_type TEXT NOT NULL,
            entity_type TEXT NOT NULL,
            entity_id TEXT NOT NULL,
            data TEXT NOT NULL,
            actor TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    // ==========================================================================
    // Indexes
    // ==========================================================================
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_banners_category ON banners(category)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_banners_tracked ON banners(is_tracked)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_events_entity ON events(entity_type, entity_id)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_events_timestamp ON events(timestamp)",
        [],
    )?;

    Ok(())
}

// ============================================================================
// BANNERS
// ============================================================================

const BANNER_COLUMNS: &str = "id, name, category, source_start_date, source_end_date,
    image_reference, external_link_url, is_tracked, featured_entities";

fn conversion_error(
    column: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(err))
}

fn parse_stored_date(row: &Row, column: usize) -> rusqlite::Result<NaiveDate> {
    let text: String = row.get(column)?;
    NaiveDate::parse_from_str(&text, STORED_DATE_FORMAT).map_err(|e| conversion_error(column, e))
}

fn banner_from_row(row: &Row) -> rusqlite::Result<Banner> {
    let category_str: String = row.get(2)?;
    let category = BannerCategory::parse(&category_str)
        .ok_or_else(|| conversion_error(2, FutureSightError::UnknownCategory(category_str)))?;

    let featured_json: String = row.get(8)?;
    let featured_entities: Vec<BannerCardInfo> =
        serde_json::from_str(&featured_json).map_err(|e| conversion_error(8, e))?;

    Ok(Banner {
        id: row.get(0)?,
        name: row.get(1)?,
        category,
        source_start_date: parse_stored_date(row, 3)?,
        source_end_date: parse_stored_date(row, 4)?,
        image_reference: row.get(5)?,
        external_link_url: row.get(6)?,
        is_tracked: row.get(7)?,
        featured_entities,
    })
}

fn query_banners(conn: &Connection, filter: &str, args: &[&dyn rusqlite::ToSql]) -> Result<Vec<Banner>> {
    let sql = format!(
        "SELECT {} FROM banners {} ORDER BY position",
        BANNER_COLUMNS, filter
    );
    let mut stmt = conn.prepare(&sql)?;

    let banners = stmt
        .query_map(args, banner_from_row)?
        .collect::<Result<Vec<_>, _>>()
        .context("Failed to read stored banners")?;

    Ok(banners)
}

/// All stored banners, in the order they were last written
pub fn load_all_banners(conn: &Connection) -> Result<Vec<Banner>> {
    query_banners(conn, "", &[])
}

pub fn get_tracked_banners(conn: &Connection) -> Result<Vec<Banner>> {
    query_banners(conn, "WHERE is_tracked = 1", &[])
}

pub fn get_banners_by_category(conn: &Connection, category: BannerCategory) -> Result<Vec<Banner>> {
    query_banners(conn, "WHERE category = ?1", &[&category.as_str()])
}

/// Replace the whole banner table in one transaction
///
/// A repeated id overwrites the earlier row: the last banner with an id wins.
pub fn replace_all_banners(conn: &Connection, banners: &[Banner]) -> Result<usize> {
    let tx = conn.unchecked_transaction()?;

    tx.execute("DELETE FROM banners", [])?;

    {
        let mut stmt = tx.prepare(
            "INSERT OR REPLACE INTO banners (
                id, position, name, category, source_start_date, source_end_date,
                image_reference, external_link_url, is_tracked, featured_entities
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        )?;

        for (position, banner) in banners.iter().enumerate() {
            let featured_json = serde_json::to_string(&banner.featured_entities)?;

            stmt.execute(params![
                banner.id,
                position as i64,
                banner.name,
                banner.category.as_str(),
                banner.source_start_date.format(STORED_DATE_FORMAT).to_string(),
                banner.source_end_date.format(STORED_DATE_FORMAT).to_string(),
                banner.image_reference,
                banner.external_link_url,
                banner.is_tracked,
                featured_json,
            ])
            .with_context(|| format!("Failed to store banner {}", banner.id))?;
        }
    }

    let stored: i64 = tx.query_row("SELECT COUNT(*) FROM banners", [], |row| row.get(0))?;
    tx.commit()?;
    Ok(stored as usize)
}

/// Set the tracked flag of one banner
pub fn set_tracked(conn: &Connection, banner_id: &str, is_tracked: bool) -> Result<()> {
    let changed = conn.execute(
        "UPDATE banners SET is_tracked = ?1, updated_at = CURRENT_TIMESTAMP WHERE id = ?2",
        params![is_tracked, banner_id],
    )?;

    if changed == 0 {
        return Err(FutureSightError::BannerNotFound(banner_id.to_string()).into());
    }

    Ok(())
}

pub fn get_banner(conn: &Connection, banner_id: &str) -> Result<Option<Banner>> {
    let sql = format!("SELECT {} FROM banners WHERE id = ?1", BANNER_COLUMNS);
    let banner = conn
        .query_row(&sql, [banner_id], banner_from_row)
        .optional()?;
    Ok(banner)
}

pub fn count_banners(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM banners", [], |row| row.get(0))?;

    Ok(count)
}

// ============================================================================
// SETTINGS
// ============================================================================

pub fn get_setting(conn: &Connection, key: &str) -> Result<Option<String>> {
    let value = conn
        .query_row("SELECT value FROM settings WHERE key = ?1", [key], |row| row.get(0))
        .optional()?;
    Ok(value)
}

pub fn set_setting(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO settings (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        params![key, value],
    )?;
    Ok(())
}

/// Integer setting, `default` when unset
fn get_i64_setting(conn: &Connection, key: &str, default: i64) -> Result<i64> {
    match get_setting(conn, key)? {
        Some(value) => value.trim().parse::<i64>().map_err(|_| {
            FutureSightError::InvalidSetting {
                key: key.to_string(),
                value,
            }
            .into()
        }),
        None => Ok(default),
    }
}

pub fn load_user_resources(conn: &Connection) -> Result<UserResources> {
    let defaults = UserResources::default();

    Ok(UserResources {
        jewels: get_i64_setting(conn, SETTING_JEWELS, defaults.jewels)?,
        character_tickets: get_i64_setting(conn, SETTING_CHARACTER_TICKETS, defaults.character_tickets)?,
        single_tickets: get_i64_setting(conn, SETTING_SINGLE_TICKETS, defaults.single_tickets)?,
        daily_jewel_income: get_i64_setting(conn, SETTING_DAILY_JEWEL_INCOME, defaults.daily_jewel_income)?,
    })
}

pub fn save_user_resources(conn: &Connection, resources: &UserResources) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    for (key, value) in [
        (SETTING_JEWELS, resources.jewels),
        (SETTING_CHARACTER_TICKETS, resources.character_tickets),
        (SETTING_SINGLE_TICKETS, resources.single_tickets),
        (SETTING_DAILY_JEWEL_INCOME, resources.daily_jewel_income),
    ] {
        set_setting(&tx, key, &value.to_string())?;
    }
    tx.commit()?;
    Ok(())
}

/// Version of the downloaded data set; 0 when nothing was downloaded yet
pub fn get_local_data_version(conn: &Connection) -> Result<i64> {
    get_i64_setting(conn, SETTING_DATA_VERSION, 0)
}

pub fn set_local_data_version(conn: &Connection, version: i64) -> Result<()> {
    set_setting(conn, SETTING_DATA_VERSION, &version.to_string())
}

// ============================================================================
// EVENTS
// ============================================================================

/// Insert event into audit trail
pub fn insert_event(conn: &Connection, event: &Event) -> Result<()> {
    let data_json = serde_json::to_string(&event.data)?;

    conn.execute(
        "INSERT INTO events (
            event_id, timestamp, event_type, entity_type, entity_id, data, actor
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            event.event_id,
            event.timestamp.to_rfc3339(),
            event.event_type,
            event.entity_type,
            event.entity_id,
            data_json,
            event.actor,
        ],
    )?;

    Ok(())
}

/// Get events for a specific entity, newest first
pub fn get_events_for_entity(
    conn: &Connection,
    entity_type: &str,
    entity_id: &str,
) -> Result<Vec<Event>> {
    let mut stmt = conn.prepare(
        "SELECT event_id, timestamp, event_type, entity_type, entity_id, data, actor
         FROM events
         WHERE entity_type = ?1 AND entity_id = ?2
         ORDER BY timestamp DESC, id DESC",
    )?;

    let events = stmt
        .query_map(params![entity_type, entity_id], |row| {
            let timestamp_str: String = row.get(1)?;
            let data_json: String = row.get(5)?;

            Ok(Event {
                event_id: row.get(0)?,
                timestamp: DateTime::parse_from_rfc3339(&timestamp_str)
                    .map_err(|e| conversion_error(1, e))?
                    .with_timezone(&Utc),
                event_type: row.get(2)?,
                entity_type: row.get(3)?,
                entity_id: row.get(4)?,
                data: serde_json::from_str(&data_json).map_err(|e| conversion_error(5, e))?,
                actor: row.get(6)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(events)
}
