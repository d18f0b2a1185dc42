use anyhow::{bail, Context, Result};
use chrono::Local;
use rusqlite::Connection;
use std::env;
use tracing_subscriber::EnvFilter;

use future_sight::repository::BANNER_ENTITY;
use future_sight::{
    get_events_for_entity, load_user_resources, open_database, plan, save_user_resources,
    AppConfig, Banner, BannerAssembler, BannerCategory, BannerRepository, FileDataSource,
    ResourceCalculator, UserResources,
};

const USAGE: &str = "Usage: future-sight <command>

Commands:
  import                          Ingest data files into the database
  list [character|item]           List banners (default command)
  track <banner-id>               Track a banner
  untrack <banner-id>             Stop tracking a banner
  history <banner-id>             Show the audit trail of a banner
  plan                            Project resources onto tracked banners
  resources <jewels> <character_tickets> <single_tickets> [daily_income]
                                  Save current resources";

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env()?;
    let args: Vec<String> = env::args().skip(1).collect();
    let command = args.first().map(String::as_str).unwrap_or("list");

    match command {
        "import" => run_import(&config),
        "list" => run_list(&config, args.get(1).map(String::as_str)),
        "track" => run_track(&config, required_arg(&args, 1, "banner-id")?, true),
        "untrack" => run_track(&config, required_arg(&args, 1, "banner-id")?, false),
        "history" => run_history(&config, required_arg(&args, 1, "banner-id")?),
        "plan" => run_plan(&config),
        "resources" => run_resources(&config, &args[1..]),
        "help" | "--help" | "-h" => {
            println!("{}", USAGE);
            Ok(())
        }
        other => {
            eprintln!("❌ Unknown command: {}\n", other);
            eprintln!("{}", USAGE);
            std::process::exit(2);
        }
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("future_sight=info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn required_arg<'a>(args: &'a [String], index: usize, name: &str) -> Result<&'a str> {
    match args.get(index) {
        Some(value) => Ok(value.as_str()),
        None => bail!("missing <{}>\n\n{}", name, USAGE),
    }
}

fn open(config: &AppConfig) -> Result<(Connection, FileDataSource)> {
    let conn = open_database(&config.database_path)?;
    Ok((conn, config.data_source()))
}

fn run_import(config: &AppConfig) -> Result<()> {
    println!("📥 Future Sight - Data Import");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let (conn, source) = open(config)?;
    let repo = BannerRepository::new(&conn, &source, BannerAssembler::with_namespace(&config.resource_namespace))
        .with_actor("cli");

    let banners = repo.refresh()?;
    let tracked = banners.iter().filter(|b| b.is_tracked).count();

    println!("✓ Database: {}", config.database_path.display());
    println!("✓ Stored {} banners ({} tracked)", banners.len(), tracked);

    Ok(())
}

fn run_list(config: &AppConfig, category: Option<&str>) -> Result<()> {
    let (conn, source) = open(config)?;
    let repo = BannerRepository::new(&conn, &source, BannerAssembler::with_namespace(&config.resource_namespace));

    let banners = match category {
        Some(value) => {
            let category = BannerCategory::parse(value)
                .with_context(|| format!("unknown category '{}' (expected character or item)", value))?;
            repo.get_banners_by_category(category)?
        }
        None => repo.get_banners()?,
    };

    if banners.is_empty() {
        println!("No banners. Check the data directories:");
        println!("   override: {}", config.data_dir.display());
        println!("   bundled:  {}", config.assets_dir.display());
        return Ok(());
    }

    for banner in &banners {
        print_banner(banner, config.offset_days);
    }
    println!("\n{} banners", banners.len());

    Ok(())
}

fn print_banner(banner: &Banner, offset_days: i64) {
    let marker = if banner.is_tracked { "★" } else { " " };
    println!(
        "{} {:<10} {:<9} {} → {}  (local ≈ {})  {}",
        marker,
        banner.id,
        banner.category.as_str(),
        banner.source_start_date,
        banner.source_end_date,
        banner.predicted_local_start(offset_days),
        banner.name
    );
}

fn run_track(config: &AppConfig, banner_id: &str, is_tracked: bool) -> Result<()> {
    let (conn, source) = open(config)?;
    let repo = BannerRepository::new(&conn, &source, BannerAssembler::with_namespace(&config.resource_namespace))
        .with_actor("cli");

    // Make sure there is something to track on a fresh database
    repo.get_banners()?;
    repo.set_tracked(banner_id, is_tracked)?;

    if is_tracked {
        println!("★ Tracking {}", banner_id);
    } else {
        println!("✓ No longer tracking {}", banner_id);
    }

    Ok(())
}

fn run_history(config: &AppConfig, banner_id: &str) -> Result<()> {
    let (conn, _) = open(config)?;

    let events = get_events_for_entity(&conn, BANNER_ENTITY, banner_id)?;
    if events.is_empty() {
        println!("No events for {}", banner_id);
    }
    for event in events {
        println!("{}  {:<18} by {}", event.timestamp.to_rfc3339(), event.event_type, event.actor);
    }

    Ok(())
}

fn run_plan(config: &AppConfig) -> Result<()> {
    let (conn, source) = open(config)?;
    let repo = BannerRepository::new(&conn, &source, BannerAssembler::with_namespace(&config.resource_namespace));

    let resources = load_user_resources(&conn)?;
    let tracked = repo.tracked_banners()?;
    let today = Local::now().date_naive();

    println!("💎 Jewels {} · character tickets {} · single tickets {} · +{}/day",
        resources.jewels,
        resources.character_tickets,
        resources.single_tickets,
        resources.daily_jewel_income
    );
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    if tracked.is_empty() {
        println!("No tracked banners. Use: future-sight track <banner-id>");
        return Ok(());
    }

    let calculator = ResourceCalculator::new();
    for projection in plan(&tracked, &resources, today, config.offset_days, &calculator) {
        let verdict = if projection.can_spark { "✅ spark" } else { "⚠️  short" };
        println!(
            "{}  {:<10} {:>5} pulls  {}  {}",
            projection.predicted_start,
            projection.banner.id,
            projection.projected_pulls,
            verdict,
            projection.banner.name
        );
    }

    Ok(())
}

fn run_resources(config: &AppConfig, args: &[String]) -> Result<()> {
    if args.len() < 3 {
        bail!("expected <jewels> <character_tickets> <single_tickets> [daily_income]\n\n{}", USAGE);
    }

    let number = |index: usize, name: &str| -> Result<i64> {
        args[index]
            .parse()
            .with_context(|| format!("{} must be a whole number, got '{}'", name, args[index]))
    };

    let conn = open_database(&config.database_path)?;
    let stored = load_user_resources(&conn)?;

    let resources = UserResources {
        jewels: number(0, "jewels")?,
        character_tickets: number(1, "character_tickets")?,
        single_tickets: number(2, "single_tickets")?,
        daily_jewel_income: match args.get(3) {
            Some(_) => number(3, "daily_income")?,
            None => stored.daily_jewel_income,
        },
    };

    save_user_resources(&conn, &resources)?;
    println!("✓ Resources saved");

    Ok(())
}
