// 🎴 Banner Model - what ingestion produces and the store persists
//
// Identity: `id` ("<row>-C" / "<row>-S"), stable across refreshes
// Values: everything else, rewritten by every refresh except `is_tracked`

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// Days between a source-region release and the localized release.
pub const DEFAULT_OFFSET_DAYS: i64 = 490;

// ============================================================================
// BANNER CATEGORY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BannerCategory {
    /// Character pool (rolled with character tickets)
    Character,

    /// Item / support card pool (rolled with single tickets)
    Item,
}

impl BannerCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            BannerCategory::Character => "CHARACTER",
            BannerCategory::Item => "ITEM",
        }
    }

    /// Suffix appended to the row id for banners of this category
    pub fn id_suffix(&self) -> &'static str {
        match self {
            BannerCategory::Character => "C",
            BannerCategory::Item => "S",
        }
    }

    /// Parse a stored or user-supplied category name (case-insensitive)
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "CHARACTER" => Some(BannerCategory::Character),
            "ITEM" => Some(BannerCategory::Item),
            _ => None,
        }
    }
}

// ============================================================================
// CARD SUBTYPE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CardSubtype {
    Speed,
    Stamina,
    Power,
    Guts,
    Wisdom,
    Friend,
    Group,
    Unknown,
}

impl CardSubtype {
    pub fn as_str(&self) -> &'static str {
        match self {
            CardSubtype::Speed => "SPEED",
            CardSubtype::Stamina => "STAMINA",
            CardSubtype::Power => "POWER",
            CardSubtype::Guts => "GUTS",
            CardSubtype::Wisdom => "WISDOM",
            CardSubtype::Friend => "FRIEND",
            CardSubtype::Group => "GROUP",
            CardSubtype::Unknown => "UNKNOWN",
        }
    }

    /// Read a lookup-table subtype tag. Total: anything unrecognized is `Unknown`.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "SPEED" => CardSubtype::Speed,
            "STAMINA" => CardSubtype::Stamina,
            "POWER" => CardSubtype::Power,
            "GUTS" => CardSubtype::Guts,
            "WISDOM" => CardSubtype::Wisdom,
            "FRIEND" => CardSubtype::Friend,
            "GROUP" => CardSubtype::Group,
            _ => CardSubtype::Unknown,
        }
    }
}

// ============================================================================
// BANNER
// ============================================================================

/// One featured entity on a banner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BannerCardInfo {
    pub name: String,
    pub subtype: CardSubtype,
    pub image_reference: Option<String>,
}

/// A time-boxed promotional pool, dated in the source region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Banner {
    pub id: String,
    pub name: String,
    pub category: BannerCategory,
    pub source_start_date: NaiveDate,
    pub source_end_date: NaiveDate,

    #[serde(default)]
    pub image_reference: Option<String>,

    #[serde(default)]
    pub external_link_url: Option<String>,

    /// Set only by the user; ingestion carries it forward
    #[serde(default)]
    pub is_tracked: bool,

    /// Never empty for an emitted banner
    pub featured_entities: Vec<BannerCardInfo>,
}

impl Banner {
    /// Predicted localized start date (`source_start_date + offset_days`)
    pub fn predicted_local_start(&self, offset_days: i64) -> NaiveDate {
        shift_date(self.source_start_date, offset_days)
    }

    /// Predicted localized end date (`source_end_date + offset_days`)
    pub fn predicted_local_end(&self, offset_days: i64) -> NaiveDate {
        shift_date(self.source_end_date, offset_days)
    }
}

fn shift_date(date: NaiveDate, offset_days: i64) -> NaiveDate {
    date.checked_add_signed(Duration::days(offset_days))
        .unwrap_or(date)
}
