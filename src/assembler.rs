// 🏗️ Banner Assembler - schedule rows + lookup indices → banners
//
// One row yields up to two banners:
//   <id>-C  character pool, resolved against the character index
//   <id>-S  item pool, prefix-stripped then resolved against the item index
//
// Nothing here fails: a bad row is skipped, an unknown name keeps its raw
// text and gets no image.

use crate::lookup::LookupIndex;
use crate::model::{Banner, BannerCardInfo, BannerCategory, CardSubtype};
use crate::resolver::resolve_name;
use crate::schedule::{parse_row, ParsedRow, RawScheduleRow};
use tracing::{debug, trace};

/// Application namespace embedded in image references
pub const DEFAULT_RESOURCE_NAMESPACE: &str = "com.saxpenguin.umamusumefuturesight";

/// Separator between featured names in a banner title
pub const NAME_SEPARATOR: &str = " / ";

/// Highest character position at which a rarity prefix hyphen is stripped
const MAX_PREFIX_HYPHEN_POSITION: usize = 3;

// ============================================================================
// BANNER ASSEMBLER
// ============================================================================

#[derive(Debug, Clone)]
pub struct BannerAssembler {
    /// Namespace for `android.resource://<namespace>/drawable/<id>` references
    pub resource_namespace: String,
}

impl BannerAssembler {
    /// Assembler using the default application namespace
    pub fn new() -> Self {
        Self::with_namespace(DEFAULT_RESOURCE_NAMESPACE)
    }

    pub fn with_namespace(namespace: &str) -> Self {
        BannerAssembler {
            resource_namespace: namespace.to_string(),
        }
    }

    /// Image reference consumed by the rendering layer. The exact shape is
    /// stored with every banner; do not change it.
    pub fn image_reference(&self, resource_id: &str) -> String {
        format!(
            "android.resource://{}/drawable/{}",
            self.resource_namespace, resource_id
        )
    }

    /// Turn feed rows into banners, preserving feed order
    pub fn assemble(
        &self,
        rows: &[RawScheduleRow],
        entity_index: &LookupIndex,
        item_index: &LookupIndex,
    ) -> Vec<Banner> {
        let mut banners = Vec::new();
        let mut rejected = 0;

        for (index, row) in rows.iter().enumerate() {
            match parse_row(row, index) {
                Some(parsed) => {
                    banners.extend(self.assemble_row(&parsed, entity_index, item_index));
                }
                None => {
                    rejected += 1;
                    trace!(position = index, id = %row.id, "skipped row with unparseable dates");
                }
            }
        }

        debug!(
            rows = rows.len(),
            rejected,
            banners = banners.len(),
            "assembled banners"
        );

        banners
    }

    /// Zero, one or two banners for one validated row
    pub fn assemble_row(
        &self,
        parsed: &ParsedRow,
        entity_index: &LookupIndex,
        item_index: &LookupIndex,
    ) -> Vec<Banner> {
        let mut banners = Vec::with_capacity(2);

        if !parsed.entity_pool.is_empty() {
            let cards = self.entity_cards(&parsed.entity_pool, entity_index);
            banners.push(build_banner(parsed, BannerCategory::Character, cards));
        }

        if !parsed.item_pool.is_empty() {
            let cards = self.item_cards(&parsed.item_pool, item_index);
            banners.push(build_banner(parsed, BannerCategory::Item, cards));
        }

        banners
    }

    /// Character cards never carry a stat subtype
    fn entity_cards(&self, pool: &[String], index: &LookupIndex) -> Vec<BannerCardInfo> {
        pool.iter()
            .map(|name| match resolve_name(name, index) {
                Some(hit) => BannerCardInfo {
                    name: hit.entity.display_name.clone(),
                    subtype: CardSubtype::Unknown,
                    image_reference: Some(self.image_reference(&hit.entity.resource_id)),
                },
                None => {
                    trace!(name = %name, "unresolved character name");
                    unresolved_card(name)
                }
            })
            .collect()
    }

    /// Item names lose their rarity prefix before lookup; the original name
    /// stays as the fallback display name
    fn item_cards(&self, pool: &[String], index: &LookupIndex) -> Vec<BannerCardInfo> {
        pool.iter()
            .map(|name| match resolve_name(strip_category_prefix(name), index) {
                Some(hit) => BannerCardInfo {
                    name: hit.entity.display_name.clone(),
                    subtype: CardSubtype::from_tag(&hit.entity.subtype),
                    image_reference: Some(self.image_reference(&hit.entity.resource_id)),
                },
                None => {
                    trace!(name = %name, "unresolved item name");
                    unresolved_card(name)
                }
            })
            .collect()
    }
}

impl Default for BannerAssembler {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

fn build_banner(parsed: &ParsedRow, category: BannerCategory, cards: Vec<BannerCardInfo>) -> Banner {
    let name = cards
        .iter()
        .map(|card| card.name.as_str())
        .collect::<Vec<_>>()
        .join(NAME_SEPARATOR);
    let image_reference = cards.first().and_then(|card| card.image_reference.clone());

    Banner {
        id: format!("{}-{}", parsed.base_id, category.id_suffix()),
        name,
        category,
        source_start_date: parsed.source_start_date,
        source_end_date: parsed.source_end_date,
        image_reference,
        external_link_url: None,
        is_tracked: false,
        featured_entities: cards,
    }
}

fn unresolved_card(name: &str) -> BannerCardInfo {
    BannerCardInfo {
        name: name.to_string(),
        subtype: CardSubtype::Unknown,
        image_reference: None,
    }
}

/// Strip a rarity prefix such as `"SSR-"` from an item name
///
/// Only a first hyphen at character position 1, 2 or 3 counts as a prefix:
/// `"SSR-Card Name"` → `"Card Name"`, `"Card-Name"` stays as is.
pub fn strip_category_prefix(name: &str) -> &str {
    let trimmed = name.trim();
    let hyphen = trimmed
        .char_indices()
        .enumerate()
        .find(|(_, (_, c))| *c == '-');

    match hyphen {
        Some((position, (byte_index, _))) if (1..=MAX_PREFIX_HYPHEN_POSITION).contains(&position) => {
            trimmed[byte_index + 1..].trim()
        }
        _ => trimmed,
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::RawLookupEntry;
    use chrono::NaiveDate;
    use indexmap::IndexMap;

    fn index_of(entries: &[RawLookupEntry]) -> LookupIndex {
        let table: IndexMap<String, RawLookupEntry> = entries
            .iter()
            .map(|e| (e.resource_key.clone(), e.clone()))
            .collect();
        LookupIndex::build(&table)
    }

    #[test]
    fn test_strip_category_prefix() {
        assert_eq!(strip_category_prefix("SSR-Card Name"), "Card Name");
        assert_eq!(strip_category_prefix("R-Card"), "Card");
        assert_eq!(strip_category_prefix("SSRR-Card"), "SSRR-Card");
        assert_eq!(strip_category_prefix("-Card"), "-Card");
        assert_eq!(strip_category_prefix(" SR - Card "), "Card");
        assert_eq!(strip_category_prefix("Card Name"), "Card Name");
        assert_eq!(strip_category_prefix("SSR-[Hot]-Card"), "[Hot]-Card");
        assert_eq!(strip_category_prefix("ＳＳＲ-北部玄駒"), "北部玄駒");
    }

    #[test]
    fn test_unresolved_character_row() {
        let rows = vec![RawScheduleRow::new("5", "2023/10/19", "2023/10/30")
            .with_entity_pool(&["Alpha", "Beta"])];

        let banners = BannerAssembler::new().assemble(&rows, &LookupIndex::new(), &LookupIndex::new());

        assert_eq!(banners.len(), 1);
        let banner = &banners[0];
        assert_eq!(banner.id, "5-C");
        assert_eq!(banner.category, BannerCategory::Character);
        assert_eq!(banner.name, "Alpha / Beta");
        assert_eq!(banner.source_start_date, NaiveDate::from_ymd_opt(2023, 10, 19).unwrap());
        assert_eq!(banner.source_end_date, NaiveDate::from_ymd_opt(2023, 10, 30).unwrap());
        assert_eq!(banner.image_reference, None);
        assert!(!banner.is_tracked);
        assert_eq!(banner.featured_entities.len(), 2);
        for card in &banner.featured_entities {
            assert_eq!(card.image_reference, None);
            assert_eq!(card.subtype, CardSubtype::Unknown);
        }
    }

    #[test]
    fn test_bad_date_row_yields_nothing() {
        let rows = vec![RawScheduleRow::new("1", "bad-date", "2023/10/30")
            .with_entity_pool(&["Alpha"])
            .with_item_pool(&["SSR-Card"])];

        let banners = BannerAssembler::new().assemble(&rows, &LookupIndex::new(), &LookupIndex::new());
        assert!(banners.is_empty());
    }

    #[test]
    fn test_item_prefix_stripped_and_subtype_read() {
        let items = index_of(&[RawLookupEntry::typed(
            "support_card_s_30028.png",
            "Card・Name",
            "SPEED",
        )]);
        let rows = vec![RawScheduleRow::new("9", "2023/10/2", "2023/10/11")
            .with_item_pool(&["SSR-Card Name", "SR-Unknown Card"])];

        let banners = BannerAssembler::new().assemble(&rows, &LookupIndex::new(), &items);

        assert_eq!(banners.len(), 1);
        let banner = &banners[0];
        assert_eq!(banner.id, "9-S");
        assert_eq!(banner.category, BannerCategory::Item);

        let resolved = &banner.featured_entities[0];
        assert_eq!(resolved.name, "Card・Name");
        assert_eq!(resolved.subtype, CardSubtype::Speed);
        assert_eq!(
            resolved.image_reference.as_deref(),
            Some("android.resource://com.saxpenguin.umamusumefuturesight/drawable/support_card_s_30028")
        );

        // Fallback keeps the original, prefixed name
        let unresolved = &banner.featured_entities[1];
        assert_eq!(unresolved.name, "SR-Unknown Card");
        assert_eq!(unresolved.subtype, CardSubtype::Unknown);
        assert_eq!(unresolved.image_reference, None);

        assert_eq!(banner.name, "Card・Name / SR-Unknown Card");
        assert_eq!(banner.image_reference, resolved.image_reference);
    }

    #[test]
    fn test_unrecognized_item_subtype_is_unknown() {
        let items = index_of(&[RawLookupEntry::typed("card_x.png", "Odd Card", "INTELLIGENCE")]);
        let rows = vec![RawScheduleRow::new("2", "2023/10/2", "2023/10/11").with_item_pool(&["Odd Card"])];

        let banners = BannerAssembler::new().assemble(&rows, &LookupIndex::new(), &items);
        assert_eq!(banners[0].featured_entities[0].subtype, CardSubtype::Unknown);
        assert!(banners[0].featured_entities[0].image_reference.is_some());
    }

    #[test]
    fn test_character_subtype_ignores_table_tag() {
        let characters = index_of(&[RawLookupEntry::typed("chara_a.png", "Alpha", "SPEED")]);
        let rows = vec![RawScheduleRow::new("3", "2023/10/2", "2023/10/11").with_entity_pool(&["Alpha"])];

        let banners = BannerAssembler::new().assemble(&rows, &characters, &LookupIndex::new());
        assert_eq!(banners[0].featured_entities[0].subtype, CardSubtype::Unknown);
    }

    #[test]
    fn test_row_with_both_pools_yields_two_banners_in_order() {
        let characters = index_of(&[RawLookupEntry::untyped(
            "chara_card_1001_100101.png",
            "Special Week",
        )]);
        let rows = vec![
            RawScheduleRow::new("", "2023/10/2", "2023/10/11")
                .with_entity_pool(&["（復刻）Special・Week", "Unknown Girl"])
                .with_item_pool(&["SSR-Card"]),
            RawScheduleRow::new("7", "2023/10/11", "2023/10/19").with_entity_pool(&["100101"]),
        ];

        let banners = BannerAssembler::with_namespace("org.example.app").assemble(
            &rows,
            &characters,
            &LookupIndex::new(),
        );

        let ids: Vec<&str> = banners.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["row-1-C", "row-1-S", "7-C"]);

        assert_eq!(banners[0].name, "Special Week / Unknown Girl");
        assert_eq!(
            banners[0].image_reference.as_deref(),
            Some("android.resource://org.example.app/drawable/chara_card_1001_100101")
        );
        assert_eq!(banners[2].featured_entities[0].name, "Special Week");
    }

    #[test]
    fn test_blank_pools_yield_no_banner() {
        let rows = vec![RawScheduleRow::new("4", "2023/10/2", "2023/10/11")
            .with_entity_pool(&["", "  "])
            .with_item_pool(&[])];

        let banners = BannerAssembler::new().assemble(&rows, &LookupIndex::new(), &LookupIndex::new());
        assert!(banners.is_empty());
    }

    #[test]
    fn test_empty_feed() {
        let banners = BannerAssembler::new().assemble(&[], &LookupIndex::new(), &LookupIndex::new());
        assert!(banners.is_empty());
    }
}
