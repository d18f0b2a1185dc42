// ⬇️ Data Update - pull a newer data set into the override directory
//
// 1. Ask the remote config for the published data version
// 2. Compare with the locally recorded version
// 3. Download every data file into the override directory
// 4. Record the new version (only when all downloads succeeded)
//
// No retries. A later check simply tries again.

use crate::db::{self, Event};
use crate::source::DATA_FILES;
use anyhow::{Context, Result};
use rusqlite::Connection;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Publishes the current data version
pub trait RemoteConfig {
    /// `None` when the config could not be fetched
    fn fetch_data_version(&self) -> Option<i64>;
}

/// Fetches one data file by name
pub trait FeedDownloader {
    fn download(&self, file_name: &str) -> Result<Vec<u8>>;
}

pub struct DataUpdateManager<'a, R: RemoteConfig, D: FeedDownloader> {
    conn: &'a Connection,
    remote: R,
    downloader: D,
    target_dir: PathBuf,
}

impl<'a, R: RemoteConfig, D: FeedDownloader> DataUpdateManager<'a, R, D> {
    pub fn new(conn: &'a Connection, remote: R, downloader: D, target_dir: impl Into<PathBuf>) -> Self {
        DataUpdateManager {
            conn,
            remote,
            downloader,
            target_dir: target_dir.into(),
        }
    }

    /// Download a newer data set if one is published
    ///
    /// Returns `true` only when files were replaced and the version recorded.
    pub fn check_for_updates(&self) -> Result<bool> {
        let Some(remote_version) = self.remote.fetch_data_version() else {
            warn!("remote config unavailable, update skipped");
            return Ok(false);
        };

        let local_version = db::get_local_data_version(self.conn)?;
        if remote_version <= local_version {
            debug!(remote_version, local_version, "data set up to date");
            return Ok(false);
        }

        if !self.download_data_files()? {
            return Ok(false);
        }

        db::set_local_data_version(self.conn, remote_version)?;
        db::insert_event(
            self.conn,
            &Event::new(
                "data_updated",
                "data_set",
                &remote_version.to_string(),
                serde_json::json!({
                    "previous_version": local_version,
                    "files": DATA_FILES,
                }),
                "update_manager",
            ),
        )?;

        info!(remote_version, local_version, "data set updated");
        Ok(true)
    }

    /// Stops at the first failed download; earlier files stay written
    fn download_data_files(&self) -> Result<bool> {
        fs::create_dir_all(&self.target_dir).with_context(|| {
            format!("Failed to create data directory {}", self.target_dir.display())
        })?;

        for file_name in DATA_FILES {
            let bytes = match self.downloader.download(file_name) {
                Ok(bytes) => bytes,
                Err(err) => {
                    warn!(file_name, error = %err, "download failed, update abandoned");
                    return Ok(false);
                }
            };

            let path = self.target_dir.join(file_name);
            fs::write(&path, &bytes)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            debug!(file_name, bytes = bytes.len(), "data file written");
        }

        Ok(true)
    }
}
