// 📂 Data Source - raw feed files, override directory first
//
// Three JSON files feed an ingestion pass:
//   timetable.json   schedule rows
//   characters.json  { resource_key: display_name }
//   cards.json       { resource_key: { name, type } }  (older files: flat strings)
//
// A downloaded copy in the override directory shadows the bundled copy.
// Missing files, unreadable files and undecodable JSON all degrade to
// empty inputs; none of them is an error for the caller.

use crate::lookup::RawLookupEntry;
use crate::schedule::RawScheduleRow;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const SCHEDULE_FILE: &str = "timetable.json";
pub const ENTITY_TABLE_FILE: &str = "characters.json";
pub const ITEM_TABLE_FILE: &str = "cards.json";

/// Files fetched by an update, in download order
pub const DATA_FILES: [&str; 3] = [ITEM_TABLE_FILE, ENTITY_TABLE_FILE, SCHEDULE_FILE];

// ============================================================================
// TABLE TYPES
// ============================================================================

/// Value of the current `cards.json` format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub subtype: String,
}

pub type EntityTable = IndexMap<String, String>;
pub type ItemTable = IndexMap<String, ItemInfo>;

/// Everything one ingestion pass reads
#[derive(Debug, Clone, Default)]
pub struct FeedInputs {
    pub rows: Vec<RawScheduleRow>,
    pub entity_entries: IndexMap<String, RawLookupEntry>,
    pub item_entries: IndexMap<String, RawLookupEntry>,
}

// ============================================================================
// DATA SOURCE
// ============================================================================

/// Where raw feed text comes from
pub trait DataSource {
    /// Text of a data file, or `None` when it is absent or unreadable
    fn read_text(&self, file_name: &str) -> Option<String>;
}

/// Filesystem source: override directory, then bundled directory
#[derive(Debug, Clone, Default)]
pub struct FileDataSource {
    pub override_dir: Option<PathBuf>,
    pub bundled_dir: Option<PathBuf>,
}

impl FileDataSource {
    pub fn new(override_dir: impl Into<PathBuf>, bundled_dir: impl Into<PathBuf>) -> Self {
        FileDataSource {
            override_dir: Some(override_dir.into()),
            bundled_dir: Some(bundled_dir.into()),
        }
    }

    /// Source with only a bundled directory
    pub fn bundled_only(bundled_dir: impl Into<PathBuf>) -> Self {
        FileDataSource {
            override_dir: None,
            bundled_dir: Some(bundled_dir.into()),
        }
    }
}

impl DataSource for FileDataSource {
    fn read_text(&self, file_name: &str) -> Option<String> {
        // An existing override shadows the bundled file even when it cannot be read
        if let Some(dir) = &self.override_dir {
            let path = dir.join(file_name);
            if path.exists() {
                return read_optional(&path);
            }
        }

        let path = self.bundled_dir.as_ref()?.join(file_name);
        read_optional(&path)
    }
}

fn read_optional(path: &Path) -> Option<String> {
    match fs::read_to_string(path) {
        Ok(text) => Some(text),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => None,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "unreadable data file treated as absent");
            None
        }
    }
}

// ============================================================================
// DECODING
// ============================================================================

/// Decode `timetable.json`; anything malformed yields no rows
pub fn decode_schedule(text: &str) -> Vec<RawScheduleRow> {
    serde_json::from_str(text).unwrap_or_else(|err| {
        warn!(error = %err, "malformed schedule feed ignored");
        Vec::new()
    })
}

/// Decode `characters.json`; anything malformed yields an empty table
pub fn decode_entity_table(text: &str) -> EntityTable {
    serde_json::from_str(text).unwrap_or_else(|err| {
        warn!(error = %err, "malformed character table ignored");
        IndexMap::new()
    })
}

type ItemTableDecoder = fn(&str) -> serde_json::Result<ItemTable>;

/// Item table formats, newest first
const ITEM_TABLE_DECODERS: &[(&str, ItemTableDecoder)] = &[
    ("typed", decode_typed_items),
    ("flat", decode_flat_items),
];

/// Decode `cards.json`, trying each known format in order
pub fn decode_item_table(text: &str) -> ItemTable {
    for (format, decoder) in ITEM_TABLE_DECODERS {
        match decoder(text) {
            Ok(table) => {
                debug!(format, entries = table.len(), "decoded item table");
                return table;
            }
            Err(err) => debug!(format, error = %err, "item table format did not match"),
        }
    }

    warn!("item table matched no known format, ignored");
    IndexMap::new()
}

fn decode_typed_items(text: &str) -> serde_json::Result<ItemTable> {
    serde_json::from_str(text)
}

/// Older `cards.json`: names only, every subtype unknown
fn decode_flat_items(text: &str) -> serde_json::Result<ItemTable> {
    let flat: IndexMap<String, String> = serde_json::from_str(text)?;
    Ok(flat
        .into_iter()
        .map(|(key, name)| {
            let info = ItemInfo {
                name,
                subtype: crate::lookup::UNKNOWN_SUBTYPE.to_string(),
            };
            (key, info)
        })
        .collect())
}

/// Lookup entries for the character index
pub fn entity_entries(table: &EntityTable) -> IndexMap<String, RawLookupEntry> {
    table
        .iter()
        .map(|(key, name)| (key.clone(), RawLookupEntry::untyped(key, name)))
        .collect()
}

/// Lookup entries for the item index
pub fn item_entries(table: &ItemTable) -> IndexMap<String, RawLookupEntry> {
    table
        .iter()
        .map(|(key, info)| (key.clone(), RawLookupEntry::typed(key, &info.name, &info.subtype)))
        .collect()
}

/// Read and decode all three files
///
/// An empty schedule short-circuits: the lookup tables are not read.
pub fn load_inputs(source: &dyn DataSource) -> FeedInputs {
    let rows = source
        .read_text(SCHEDULE_FILE)
        .map(|text| decode_schedule(&text))
        .unwrap_or_default();

    if rows.is_empty() {
        debug!("schedule feed empty, lookup tables skipped");
        return FeedInputs::default();
    }

    let entity_table = source
        .read_text(ENTITY_TABLE_FILE)
        .map(|text| decode_entity_table(&text))
        .unwrap_or_default();
    let item_table = source
        .read_text(ITEM_TABLE_FILE)
        .map(|text| decode_item_table(&text))
        .unwrap_or_default();

    FeedInputs {
        rows,
        entity_entries: entity_entries(&entity_table),
        item_entries: item_entries(&item_table),
    }
}

// ============================================================================
// TESTS
// ============================================================================
