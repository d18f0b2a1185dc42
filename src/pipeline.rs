// 🔄 Ingestion Pipeline - data source → indices → banners → tracked merge
//
// One pass is pure apart from reading the three input files. Nothing here
// fails: every bad input has already degraded to something empty.

use crate::assembler::BannerAssembler;
use crate::lookup::LookupIndex;
use crate::model::Banner;
use crate::source::{load_inputs, DataSource, FeedInputs};
use crate::tracking::merge_tracked;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Assemble banners from already-decoded inputs
pub fn ingest_inputs(inputs: &FeedInputs, assembler: &BannerAssembler) -> Vec<Banner> {
    let entity_index = LookupIndex::build(&inputs.entity_entries);
    let item_index = LookupIndex::build(&inputs.item_entries);

    assembler.assemble(&inputs.rows, &entity_index, &item_index)
}

/// Drop earlier banners whose id repeats later in the list
///
/// A feed that reuses a row id produces duplicate banner ids; the last one
/// wins, at its own position.
pub fn keep_last_per_id(banners: Vec<Banner>) -> Vec<Banner> {
    let last_index: HashMap<String, usize> = banners
        .iter()
        .enumerate()
        .map(|(index, banner)| (banner.id.clone(), index))
        .collect();

    if last_index.len() == banners.len() {
        return banners;
    }

    let before = banners.len();
    let kept: Vec<Banner> = banners
        .into_iter()
        .enumerate()
        .filter(|(index, banner)| last_index.get(&banner.id) == Some(index))
        .map(|(_, banner)| banner)
        .collect();

    warn!(dropped = before - kept.len(), "repeated banner ids in feed, last row kept");
    kept
}

/// Read a data source and assemble its banners, all untracked
pub fn ingest(source: &dyn DataSource, assembler: &BannerAssembler) -> Vec<Banner> {
    let inputs = load_inputs(source);
    keep_last_per_id(ingest_inputs(&inputs, assembler))
}

/// Full pass: ingest, then carry tracked flags over from `previous`
pub fn run(source: &dyn DataSource, assembler: &BannerAssembler, previous: &[Banner]) -> Vec<Banner> {
    let fresh = ingest(source, assembler);
    let merged = merge_tracked(fresh, previous);

    debug!(
        banners = merged.len(),
        tracked = merged.iter().filter(|b| b.is_tracked).count(),
        "ingestion pass complete"
    );

    merged
}
