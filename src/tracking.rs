// 📌 Tracking Merge - carry the user's tracked flags across a refresh
//
// Ingestion always produces `is_tracked = false`. Before the fresh list
// replaces the stored one, every id the user tracked gets its flag back.
// Banners that vanished from the feed lose their tracked state with them.

use crate::model::Banner;
use std::collections::HashSet;

/// Apply previously tracked flags to a freshly assembled banner list
pub fn merge_tracked(fresh: Vec<Banner>, previous: &[Banner]) -> Vec<Banner> {
    let tracked_ids: HashSet<&str> = previous
        .iter()
        .filter(|banner| banner.is_tracked)
        .map(|banner| banner.id.as_str())
        .collect();

    fresh
        .into_iter()
        .map(|mut banner| {
            banner.is_tracked = tracked_ids.contains(banner.id.as_str());
            banner
        })
        .collect()
}
