// Future Sight - Core Library
// Banner ingestion, name resolution, persistence and pull planning.
// Exposes all modules for use in CLI, API server, and tests

pub mod normalize;  // Name normalization
pub mod model;      // Banner, categories, subtypes
pub mod lookup;     // Lookup index (three key spaces)
pub mod resolver;   // Tiered name resolution
pub mod schedule;   // Schedule row validation
pub mod assembler;  // Rows → banners
pub mod tracking;   // Tracked flag carry-over
pub mod source;     // Data files, override → bundled
pub mod pipeline;   // One ingestion pass
pub mod error;
pub mod db;
pub mod config;
pub mod repository;
pub mod update;
pub mod planner;

// Re-export commonly used types
pub use normalize::normalize_name;
pub use model::{Banner, BannerCardInfo, BannerCategory, CardSubtype, DEFAULT_OFFSET_DAYS};
pub use lookup::{KeySpace, LookupIndex, RawLookupEntry, ResolvedEntity};
pub use resolver::{resolve, resolve_name, MatchTier, Resolution};
pub use schedule::{parse_row, ParsedRow, RawScheduleRow};
pub use assembler::{BannerAssembler, DEFAULT_RESOURCE_NAMESPACE};
pub use tracking::merge_tracked;
pub use source::{DataSource, FeedInputs, FileDataSource, ItemInfo};
pub use pipeline::ingest;
pub use error::FutureSightError;
pub use db::{
    Event,
    open_database, setup_database,
    load_all_banners, replace_all_banners, set_tracked, get_banner,
    get_tracked_banners, get_banners_by_category, count_banners,
    get_setting, set_setting, load_user_resources, save_user_resources,
    get_local_data_version, set_local_data_version,
    insert_event, get_events_for_entity,
};
pub use config::AppConfig;
pub use repository::BannerRepository;
pub use update::{DataUpdateManager, FeedDownloader, RemoteConfig};
pub use planner::{plan, BannerProjection, ResourceCalculator, UserResources};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
