//! Database connection and schema
//!
//! The store is an embedded SQLite database. The schema is created
//! idempotently at startup; entity tables key on natural identifiers
//! (race key, race key + horse number, pedigree id) so that re-ingesting
//! a record replaces the stored row in full.

use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use tracing::info;

/// Default database URL for local use
pub const DEFAULT_DATABASE_URL: &str = "sqlite://turf.db";

/// Database configuration
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub url: String,
    pub max_connections: u32,
    pub connect_timeout_secs: u64,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: 5,
            connect_timeout_secs: 30,
        }
    }
}

/// Open a connection pool, creating the database file if missing
pub async fn connect(config: &DbConfig) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&config.url)
        .context("Invalid database URL")?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal);

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
        .connect_with(options)
        .await
        .context("Failed to open database")?;

    Ok(pool)
}

/// Create all tables and indexes if they do not exist
pub async fn init_schema(pool: &SqlitePool) -> Result<()> {
    let statements = [
        r#"
        CREATE TABLE IF NOT EXISTS races (
            race_key TEXT PRIMARY KEY,
            year TEXT NOT NULL,
            monthday TEXT NOT NULL,
            venue_code TEXT,
            venue_name TEXT,
            meeting INTEGER,
            day INTEGER,
            race_number INTEGER,
            name TEXT,
            secondary_name TEXT,
            grade_code TEXT,
            grade TEXT,
            category_code TEXT,
            category TEXT,
            distance_m INTEGER,
            track_code TEXT,
            track_name TEXT,
            weather_code TEXT,
            weather TEXT,
            turf_going_code TEXT,
            turf_going TEXT,
            dirt_going_code TEXT,
            dirt_going TEXT,
            post_time TEXT,
            entered_count INTEGER,
            starter_count INTEGER,
            data_class TEXT,
            created_at TEXT DEFAULT (datetime('now')),
            updated_at TEXT DEFAULT (datetime('now'))
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS results (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            race_key TEXT NOT NULL,
            horse_number INTEGER,
            pedigree_id TEXT,
            horse_name TEXT,
            sex_code TEXT,
            sex TEXT,
            age INTEGER,
            coat_code TEXT,
            jockey_code TEXT,
            jockey_name TEXT,
            jockey_short_name TEXT,
            trainer_code TEXT,
            trainer_name TEXT,
            trainer_stable TEXT,
            carried_weight INTEGER,
            body_weight INTEGER,
            weight_change TEXT,
            incident_code TEXT,
            incident TEXT,
            finish_position INTEGER,
            time TEXT,
            margin TEXT,
            win_odds INTEGER,
            favorite_rank INTEGER,
            prize_main INTEGER,
            prize_bonus INTEGER,
            data_class TEXT,
            created_at TEXT DEFAULT (datetime('now')),
            updated_at TEXT DEFAULT (datetime('now')),
            UNIQUE(race_key, horse_number)
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS horses (
            pedigree_id TEXT PRIMARY KEY,
            name TEXT,
            birth_date TEXT,
            sex_code TEXT,
            sex TEXT,
            breed_code TEXT,
            breed TEXT,
            coat_code TEXT,
            coat TEXT,
            bloodline TEXT,
            sire_id TEXT,
            dam_id TEXT,
            broodmare_sire_id TEXT,
            region_code TEXT,
            region TEXT,
            trainer_code TEXT,
            trainer_name TEXT,
            owner_code TEXT,
            owner_name TEXT,
            breeder_code TEXT,
            breeder_name TEXT,
            birthplace TEXT,
            deletion_flag TEXT,
            data_class TEXT,
            created_at TEXT DEFAULT (datetime('now')),
            updated_at TEXT DEFAULT (datetime('now'))
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS odds (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            race_key TEXT NOT NULL,
            horse_number INTEGER NOT NULL,
            win_odds INTEGER,
            place_odds_low INTEGER,
            place_odds_high INTEGER,
            win_favorite INTEGER,
            place_favorite INTEGER,
            data_class TEXT,
            created_at TEXT DEFAULT (datetime('now')),
            UNIQUE(race_key, horse_number)
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS weights (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            race_key TEXT NOT NULL,
            horse_number INTEGER NOT NULL,
            body_weight INTEGER,
            change_sign TEXT,
            change TEXT,
            data_class TEXT,
            created_at TEXT DEFAULT (datetime('now')),
            UNIQUE(race_key, horse_number)
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS schedules (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            year TEXT NOT NULL,
            date TEXT NOT NULL,
            venue_code TEXT NOT NULL,
            venue_name TEXT,
            meeting INTEGER,
            day INTEGER,
            weekday TEXT,
            revision_flag TEXT,
            created_at TEXT DEFAULT (datetime('now')),
            UNIQUE(year, date, venue_code, meeting, day)
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS checkpoints (
            run_id TEXT PRIMARY KEY,
            run_type TEXT NOT NULL,
            data_spec TEXT NOT NULL,
            from_cursor TEXT,
            to_cursor TEXT,
            records_read INTEGER NOT NULL DEFAULT 0,
            records_errored INTEGER NOT NULL DEFAULT 0,
            status TEXT NOT NULL,
            started_at TEXT DEFAULT (datetime('now')),
            finished_at TEXT
        )
        "#,
        "CREATE INDEX IF NOT EXISTS idx_races_date ON races(year, monthday)",
        "CREATE INDEX IF NOT EXISTS idx_races_venue ON races(venue_code)",
        "CREATE INDEX IF NOT EXISTS idx_results_pedigree ON results(pedigree_id)",
        "CREATE INDEX IF NOT EXISTS idx_results_jockey ON results(jockey_code)",
        "CREATE INDEX IF NOT EXISTS idx_horses_sire ON horses(sire_id)",
        "CREATE INDEX IF NOT EXISTS idx_checkpoints_spec ON checkpoints(data_spec, status)",
    ];

    for statement in statements {
        sqlx::query(statement)
            .execute(pool)
            .await
            .context("Failed to apply schema statement")?;
    }

    info!("database schema ready");
    Ok(())
}
