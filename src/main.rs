pub mod columns;
pub mod config;
pub mod dataset;
pub mod db {
    pub mod models;
}
pub mod error;
pub mod schema;
pub mod services {
    pub mod outdoor;
    pub mod refs;
    #[cfg(test)]
    pub mod testing;
    pub mod unpivot;
}

use crate::config::Config;
use crate::dataset::Dataset;
use crate::error::LoadError;
use crate::services::{outdoor, refs, unpivot};
use diesel::prelude::*;
use diesel::SqliteConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use log::{error, info};
use std::path::PathBuf;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

fn apply_database_migrations(conn: &mut SqliteConnection) -> Result<(), String> {
    match conn.run_pending_migrations(MIGRATIONS) {
        Ok(applied) => {
            if applied.is_empty() {
                info!("Database schema is up to date; no migrations were applied");
            } else {
                let names = applied.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(", ");
                info!("Applied {} database migration(s): {}", applied.len(), names);
            }
            Ok(())
        }
        // Tables created outside our migration history collide here; report
        // that distinctly from other migration failures.
        Err(e) if e.to_string().contains("already exists") => {
            Err(LoadError::SchemaExists(e.to_string()).to_string())
        }
        Err(e) => Err(format!("Applying database migrations failed: {}", e)),
    }
}

pub fn run() -> Result<(), String> {
    // 1) Load config
    let cfg = Config::from_env()?;
    info!(
        "Config loaded (csv={}, database={}, insert_batch_size={}, reload={})",
        cfg.csv_path.display(),
        cfg.database_url,
        cfg.insert_batch_size,
        cfg.reload
    );

    // 2) Connect DB
    let mut conn =
        SqliteConnection::establish(&cfg.database_url).map_err(|e| format!("DB connection failed: {}", e))?;
    diesel::sql_query("PRAGMA foreign_keys = ON")
        .execute(&mut conn)
        .map_err(|e| format!("enabling foreign keys failed: {}", e))?;
    info!("Connected to database");

    // 3) Apply pending database migrations
    apply_database_migrations(&mut conn)?;

    // 4) Open the dataset and validate its shape (header only; rows stream later)
    let dataset = Dataset::open(&cfg.csv_path).map_err(|e| format!("opening dataset failed: {}", e))?;
    info!("Dataset opened: {} column(s)", dataset.headers().len());

    // 5) Re-run policy: abort on a populated store, or truncate when asked
    refs::enforce_rerun_policy(&mut conn, cfg.reload).map_err(|e| e.to_string())?;

    // 6) Dimensions first; fact loaders resolve against the frozen lookup
    let lookup = refs::load_dimensions(&mut conn, dataset.headers())
        .map_err(|e| format!("dimension load failed: {}", e))?;

    // 7) Outdoor fact table
    let outdoor_plan = outdoor::OutdoorPlan::from_headers(dataset.headers()).map_err(|e| e.to_string())?;
    let outdoor_rows = outdoor::load(
        &mut conn,
        &outdoor_plan,
        dataset.records().map_err(|e| e.to_string())?,
        cfg.insert_batch_size,
    )
    .map_err(|e| format!("outdoor load failed: {}", e))?;
    info!(
        "Outdoor load complete ({} row(s) across {} metric column(s))",
        outdoor_rows,
        outdoor_plan.column_count()
    );

    // 8) Zone unpivot
    let plan = unpivot::UnpivotPlan::from_headers(dataset.headers(), &lookup).map_err(|e| e.to_string())?;
    let zone_rows = unpivot::load(
        &mut conn,
        &plan,
        dataset.records().map_err(|e| e.to_string())?,
        cfg.insert_batch_size,
    )
    .map_err(|e| format!("unpivot load failed: {}", e))?;
    info!(
        "Unpivot complete ({} row(s) from {} (zone, measurement) column(s))",
        zone_rows,
        plan.entry_count()
    );

    Ok(())
}

fn configure_env_from_cli() -> Result<Option<PathBuf>, String> {
    let mut args = std::env::args_os();
    args.next(); // skip program name

    let mut env_file: Option<PathBuf> = None;
    while let Some(arg) = args.next() {
        match arg.to_str() {
            Some("--env-file") => {
                let value = args
                    .next()
                    .ok_or_else(|| "`--env-file` requires a path argument".to_string())?;
                env_file = Some(PathBuf::from(value));
            }
            Some(s) if s.starts_with("--env-file=") => {
                env_file = Some(PathBuf::from(&s["--env-file=".len()..]));
            }
            Some(other) => return Err(format!("unrecognised argument: {}", other)),
            None => return Err("argument contains invalid UTF-8".to_string()),
        }
    }

    if let Some(path) = env_file {
        dotenvy::from_path(&path).map_err(|e| format!("loading {} failed: {}", path.display(), e))?;
        Ok(Some(path))
    } else {
        // A missing default .env is fine; anything else is not.
        match dotenvy::dotenv() {
            Ok(path) => Ok(Some(path)),
            Err(e) if e.not_found() => Ok(None),
            Err(e) => Err(format!("loading .env failed: {}", e)),
        }
    }
}

fn main() {
    let loaded_env = match configure_env_from_cli() {
        Ok(path) => path,
        Err(err) => {
            eprintln!("fatal: {}", err);
            std::process::exit(1);
        }
    };

    // Init logging after environment so RUST_LOG from .env is respected.
    let default_filter = env_logger::Env::default().default_filter_or("info");
    env_logger::Builder::from_env(default_filter)
        .format_timestamp_secs()
        .init();

    if let Some(path) = loaded_env.as_ref() {
        info!("Environment loaded from .env file: {}", path.display());
    }

    info!(
        "netzero-sqlite {} (git {}) starting",
        env!("CARGO_PKG_VERSION"),
        env!("BUILD_TIME_GIT_HASH")
    );
    if let Err(e) = run() {
        error!("fatal: {}", e);
        std::process::exit(1);
    }
}
