// 🗂️ Lookup Index - three key spaces over one set of resolved entities
//
// A lookup table maps a resource key ("chara_card_1001_100101.png") to a
// display name. The schedule feed names entities loosely, so each entry is
// reachable through three independent key spaces:
//
//   normalized name  → first writer wins
//   exact name       → last writer wins
//   identifier       → first writer wins (last `_` segment of the resource id)
//
// Resolution results depend on this asymmetry; keep it exact.

use crate::normalize::normalize_name;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Subtype tag used when a lookup table carries none
pub const UNKNOWN_SUBTYPE: &str = "UNKNOWN";

/// Image extensions stripped from a resource key to get the resource id
const IMAGE_EXTENSIONS: &[&str] = &[".png", ".webp", ".jpg", ".jpeg"];

/// Resource ids with at least this many `_` segments expose an identifier
const MIN_IDENTIFIER_SEGMENTS: usize = 4;

// ============================================================================
// ENTRY TYPES
// ============================================================================

/// One line of a lookup table, before indexing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawLookupEntry {
    pub resource_key: String,
    pub display_name: String,
    pub subtype: String,
}

impl RawLookupEntry {
    /// Entry from a flat `resource_key -> display_name` table
    pub fn untyped(resource_key: &str, display_name: &str) -> Self {
        RawLookupEntry {
            resource_key: resource_key.to_string(),
            display_name: display_name.to_string(),
            subtype: UNKNOWN_SUBTYPE.to_string(),
        }
    }

    pub fn typed(resource_key: &str, display_name: &str, subtype: &str) -> Self {
        RawLookupEntry {
            resource_key: resource_key.to_string(),
            display_name: display_name.to_string(),
            subtype: subtype.to_string(),
        }
    }
}

/// What a successful lookup yields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedEntity {
    /// Resource key without its image extension
    pub resource_id: String,
    pub subtype: String,
    pub display_name: String,
}

/// Which key space a key lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySpace {
    Normalized,
    Exact,
    Identifier,
}

// ============================================================================
// LOOKUP INDEX
// ============================================================================

/// Multi-key index over one lookup table
///
/// Entities live once in an arena; each key space maps keys to arena slots.
/// `scan_order` holds every distinct key string in the order it was first
/// written, across all spaces, for the substring fallback of the resolver.
#[derive(Debug, Clone, Default)]
pub struct LookupIndex {
    entities: Vec<ResolvedEntity>,
    normalized: IndexMap<String, usize>,
    exact: IndexMap<String, usize>,
    identifiers: IndexMap<String, usize>,
    scan_order: IndexMap<String, usize>,
}

impl LookupIndex {
    /// Empty index (nothing resolves)
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index from a lookup table, in the table's iteration order
    pub fn build(entries: &IndexMap<String, RawLookupEntry>) -> Self {
        let mut index = LookupIndex::new();
        for entry in entries.values() {
            index.insert(entry);
        }

        debug!(
            entities = index.entities.len(),
            normalized = index.normalized.len(),
            exact = index.exact.len(),
            identifiers = index.identifiers.len(),
            "built lookup index"
        );

        index
    }

    fn insert(&mut self, entry: &RawLookupEntry) {
        let resource_id = strip_image_extension(&entry.resource_key).to_string();
        let slot = self.entities.len();
        self.entities.push(ResolvedEntity {
            resource_id: resource_id.clone(),
            subtype: entry.subtype.clone(),
            display_name: entry.display_name.trim().to_string(),
        });

        // 1. Normalized name: first writer wins
        let normalized = normalize_name(&entry.display_name);
        if !normalized.is_empty() && !self.normalized.contains_key(&normalized) {
            self.normalized.insert(normalized.clone(), slot);
            self.scan_order.entry(normalized).or_insert(slot);
        }

        // 2. Exact trimmed name: last writer wins (keeps its first position)
        let exact = entry.display_name.trim();
        // Blank names get no exact key: "" would be a substring of every candidate
        if !exact.is_empty() {
            self.exact.insert(exact.to_string(), slot);
            self.scan_order.insert(exact.to_string(), slot);
        }

        // 3. Identifier suffix: first writer wins
        if let Some(identifier) = identifier_of(&resource_id) {
            if !self.identifiers.contains_key(identifier) {
                self.identifiers.insert(identifier.to_string(), slot);
                self.scan_order.entry(identifier.to_string()).or_insert(slot);
            }
        }
    }

    /// Look up a key in one key space
    pub fn get(&self, space: KeySpace, key: &str) -> Option<&ResolvedEntity> {
        let map = match space {
            KeySpace::Normalized => &self.normalized,
            KeySpace::Exact => &self.exact,
            KeySpace::Identifier => &self.identifiers,
        };
        map.get(key).map(|&slot| &self.entities[slot])
    }

    /// Every key across all spaces, in first-insertion order
    pub fn scan_keys(&self) -> impl Iterator<Item = (&str, &ResolvedEntity)> + '_ {
        self.scan_order
            .iter()
            .map(move |(key, &slot)| (key.as_str(), &self.entities[slot]))
    }

    /// Number of lookup entries indexed
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Number of distinct keys across all spaces
    pub fn key_count(&self) -> usize {
        self.scan_order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

/// Drop a known image extension from a resource key
pub fn strip_image_extension(resource_key: &str) -> &str {
    IMAGE_EXTENSIONS
        .iter()
        .find_map(|ext| resource_key.strip_suffix(*ext))
        .unwrap_or(resource_key)
}

/// Compact identifier encoded in a resource id
///
/// `"chara_card_1001_100101"` → `Some("100101")`; ids with fewer than four
/// `_` segments carry none.
pub fn identifier_of(resource_id: &str) -> Option<&str> {
    let segments: Vec<&str> = resource_id.split('_').collect();
    if segments.len() < MIN_IDENTIFIER_SEGMENTS {
        return None;
    }
    segments.last().copied().filter(|id| !id.is_empty())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn table(entries: &[RawLookupEntry]) -> IndexMap<String, RawLookupEntry> {
        entries
            .iter()
            .map(|e| (e.resource_key.clone(), e.clone()))
            .collect()
    }

    #[test]
    fn test_strip_image_extension() {
        assert_eq!(strip_image_extension("support_card_s_30001.png"), "support_card_s_30001");
        assert_eq!(strip_image_extension("chara_1001.webp"), "chara_1001");
        assert_eq!(strip_image_extension("chara_1001"), "chara_1001");
        assert_eq!(strip_image_extension("chara.png.txt"), "chara.png.txt");
    }

    #[test]
    fn test_identifier_of() {
        assert_eq!(identifier_of("chara_card_1001_100101"), Some("100101"));
        assert_eq!(identifier_of("a_b_c_d_e"), Some("e"));
        assert_eq!(identifier_of("support_card_30001"), None);
        assert_eq!(identifier_of("chara_card_1001_"), None);
        assert_eq!(identifier_of(""), None);
    }

    #[test]
    fn test_build_populates_all_key_spaces() {
        let index = LookupIndex::build(&table(&[RawLookupEntry::typed(
            "support_card_s_30028.png",
            " Kitasan Black ",
            "SPEED",
        )]));

        let by_exact = index.get(KeySpace::Exact, "Kitasan Black").unwrap();
        assert_eq!(by_exact.resource_id, "support_card_s_30028");
        assert_eq!(by_exact.subtype, "SPEED");
        assert_eq!(by_exact.display_name, "Kitasan Black");

        assert!(index.get(KeySpace::Normalized, "KitasanBlack").is_some());
        assert!(index.get(KeySpace::Identifier, "30028").is_some());
        assert_eq!(index.entity_count(), 1);
        assert_eq!(index.key_count(), 3);
    }

    #[test]
    fn test_collision_normalized_first_wins_exact_last_wins() {
        // Both names normalize to "SpecialWeek"; only the second is exactly "Special Week"
        let index = LookupIndex::build(&table(&[
            RawLookupEntry::untyped("chara_a.png", "Special Week"),
            RawLookupEntry::untyped("chara_b.png", "Special・Week"),
            RawLookupEntry::untyped("chara_c.png", "Special Week"),
        ]));

        assert_eq!(
            index.get(KeySpace::Normalized, "SpecialWeek").unwrap().resource_id,
            "chara_a"
        );
        assert_eq!(
            index.get(KeySpace::Exact, "Special Week").unwrap().resource_id,
            "chara_c"
        );
        assert_eq!(
            index.get(KeySpace::Exact, "Special・Week").unwrap().resource_id,
            "chara_b"
        );
    }

    #[test]
    fn test_identifier_first_writer_wins() {
        let index = LookupIndex::build(&table(&[
            RawLookupEntry::untyped("chara_card_1001_100101.png", "First"),
            RawLookupEntry::untyped("other_card_2002_100101.png", "Second"),
        ]));

        assert_eq!(
            index.get(KeySpace::Identifier, "100101").unwrap().display_name,
            "First"
        );
    }

    #[test]
    fn test_blank_display_name_adds_no_name_keys() {
        let index = LookupIndex::build(&table(&[RawLookupEntry::untyped(
            "chara_card_1001_100101.png",
            "  ",
        )]));

        assert_eq!(index.entity_count(), 1);
        assert!(index.get(KeySpace::Exact, "").is_none());
        assert_eq!(index.key_count(), 1);
        assert!(index.get(KeySpace::Identifier, "100101").is_some());
    }

    #[test]
    fn test_scan_order_keeps_first_position_on_overwrite() {
        let index = LookupIndex::build(&table(&[
            RawLookupEntry::untyped("a.png", "Gold Ship"),
            RawLookupEntry::untyped("b.png", "Vodka"),
            RawLookupEntry::untyped("c.png", "Gold Ship"),
        ]));

        let keys: Vec<(&str, &str)> = index
            .scan_keys()
            .map(|(key, entity)| (key, entity.resource_id.as_str()))
            .collect();

        assert_eq!(
            keys,
            vec![("GoldShip", "a"), ("Gold Ship", "c"), ("Vodka", "b")]
        );
    }

    #[test]
    fn test_empty_table_builds_empty_index() {
        let index = LookupIndex::build(&IndexMap::new());
        assert!(index.is_empty());
        assert_eq!(index.scan_keys().count(), 0);
    }
}
