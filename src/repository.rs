// 🗄️ Banner Repository - ingestion pass + store + audit trail
//
// The single place a refresh is written. Callers serialize refreshes
// against tracking writes; a track/untrack landing mid-refresh can be lost.

use crate::assembler::BannerAssembler;
use crate::db::{self, Event};
use crate::model::{Banner, BannerCategory};
use crate::pipeline;
use crate::source::DataSource;
use anyhow::Result;
use rusqlite::Connection;
use tracing::{debug, info};

pub const BANNER_SET_ENTITY: &str = "banner_set";
pub const BANNER_ENTITY: &str = "banner";

pub struct BannerRepository<'a> {
    conn: &'a Connection,
    source: &'a dyn DataSource,
    assembler: BannerAssembler,
    actor: String,
}

impl<'a> BannerRepository<'a> {
    pub fn new(conn: &'a Connection, source: &'a dyn DataSource, assembler: BannerAssembler) -> Self {
        BannerRepository {
            conn,
            source,
            assembler,
            actor: "repository".to_string(),
        }
    }

    /// Builder pattern: name recorded on audit events
    pub fn with_actor(mut self, actor: &str) -> Self {
        self.actor = actor.to_string();
        self
    }

    /// Re-ingest the data source and store the result
    ///
    /// An empty pass keeps the cached banners and returns them instead.
    pub fn refresh(&self) -> Result<Vec<Banner>> {
        let previous = db::load_all_banners(self.conn)?;
        let fresh = pipeline::run(self.source, &self.assembler, &previous);

        if fresh.is_empty() {
            info!(cached = previous.len(), "refresh produced no banners, keeping cached data");
            self.log_event(
                "refresh_skipped",
                BANNER_SET_ENTITY,
                "all",
                serde_json::json!({ "cached": previous.len() }),
            )?;
            return Ok(previous);
        }

        db::replace_all_banners(self.conn, &fresh)?;

        let tracked = fresh.iter().filter(|b| b.is_tracked).count();
        info!(banners = fresh.len(), tracked, previous = previous.len(), "banners refreshed");
        self.log_event(
            "banners_refreshed",
            BANNER_SET_ENTITY,
            "all",
            serde_json::json!({
                "banners": fresh.len(),
                "tracked": tracked,
                "previous": previous.len(),
            }),
        )?;

        Ok(fresh)
    }

    /// Stored banners, ingesting first when the store is empty
    pub fn get_banners(&self) -> Result<Vec<Banner>> {
        let stored = db::load_all_banners(self.conn)?;
        if stored.is_empty() {
            debug!("store empty, refreshing");
            return self.refresh();
        }
        Ok(stored)
    }

    pub fn get_banners_by_category(&self, category: BannerCategory) -> Result<Vec<Banner>> {
        if db::count_banners(self.conn)? == 0 {
            self.refresh()?;
        }
        db::get_banners_by_category(self.conn, category)
    }

    pub fn tracked_banners(&self) -> Result<Vec<Banner>> {
        db::get_tracked_banners(self.conn)
    }

    /// Set a banner's tracked flag; unknown ids are `BannerNotFound`
    pub fn set_tracked(&self, banner_id: &str, is_tracked: bool) -> Result<()> {
        db::set_tracked(self.conn, banner_id, is_tracked)?;

        let event_type = if is_tracked { "banner_tracked" } else { "banner_untracked" };
        self.log_event(
            event_type,
            BANNER_ENTITY,
            banner_id,
            serde_json::json!({ "is_tracked": is_tracked }),
        )?;

        info!(banner_id, is_tracked, "tracking updated");
        Ok(())
    }

    /// Flip the flag from the caller's current view; returns the new value
    pub fn toggle_tracked(&self, banner_id: &str, currently_tracked: bool) -> Result<bool> {
        let is_tracked = !currently_tracked;
        self.set_tracked(banner_id, is_tracked)?;
        Ok(is_tracked)
    }

    fn log_event(
        &self,
        event_type: &str,
        entity_type: &str,
        entity_id: &str,
        data: serde_json::Value,
    ) -> Result<()> {
        let event = Event::new(event_type, entity_type, entity_id, data, &self.actor);
        db::insert_event(self.conn, &event)
    }
}
