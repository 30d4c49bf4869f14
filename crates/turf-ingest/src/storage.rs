//! Persistence mapper
//!
//! Maps decoded records onto upserts against the entity tables. Every
//! write replaces the stored row in full on its natural key; dependent
//! rows (results, odds, weights) are accepted even when the referenced
//! race has not arrived yet. Records the store does not model persist
//! nothing.
//!
//! Batch commits are two-stage: one transaction for the whole batch,
//! and on any transactional failure a full rollback followed by a
//! per-record retry outside a transaction, so one bad record cannot
//! discard its batchmates.

use anyhow::{Context, Result};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, error, warn};

use crate::codes;
use crate::decode::models::{
    AnnualSchedule, BodyWeight, DecodedRecord, HorseEntry, HorseMaster, OddsWinPlace, RaceDetail,
};

/// Outcome of one batch commit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOutcome {
    /// Records persisted
    pub persisted: usize,
    /// Records dropped after the per-record retry also failed
    pub dropped: usize,
    /// Whether the per-record fallback path ran
    pub fallback_used: bool,
}

/// Per-table row counts for the stats surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TableCounts {
    pub races: i64,
    pub results: i64,
    pub horses: i64,
    pub odds: i64,
    pub weights: i64,
    pub schedules: i64,
}

/// Write path over the entity tables
#[derive(Clone)]
pub struct RecordStore {
    db: SqlitePool,
}

impl RecordStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Persist a batch: transactional first, per-record fallback second.
    ///
    /// The transactional stage either commits every record or has no
    /// effect at all; the fallback stage rescues the valid remainder and
    /// drops only the records that fail individually.
    pub async fn save_batch(&self, records: &[DecodedRecord]) -> Result<BatchOutcome> {
        if records.is_empty() {
            return Ok(BatchOutcome {
                persisted: 0,
                dropped: 0,
                fallback_used: false,
            });
        }

        match self.save_batch_tx(records).await {
            Ok(()) => Ok(BatchOutcome {
                persisted: records.len(),
                dropped: 0,
                fallback_used: false,
            }),
            Err(e) => {
                warn!(
                    batch = records.len(),
                    error = %e,
                    "batch transaction failed, rolled back; retrying per record"
                );
                self.save_records_individually(records).await
            },
        }
    }

    async fn save_batch_tx(&self, records: &[DecodedRecord]) -> Result<()> {
        let mut tx = self.db.begin().await.context("Failed to begin transaction")?;
        for record in records {
            self.persist(&mut tx, record).await?;
        }
        tx.commit().await.context("Failed to commit batch")?;
        Ok(())
    }

    /// Best-effort fallback: one record at a time, each failure logged
    /// and that record alone dropped
    async fn save_records_individually(&self, records: &[DecodedRecord]) -> Result<BatchOutcome> {
        let mut dropped = 0usize;

        for record in records {
            let mut conn = self
                .db
                .acquire()
                .await
                .context("Failed to acquire connection for fallback")?;
            if let Err(e) = self.persist(&mut conn, record).await {
                error!(kind = record.kind(), error = %e, "record dropped after individual retry");
                dropped += 1;
            }
        }

        Ok(BatchOutcome {
            persisted: records.len() - dropped,
            dropped,
            fallback_used: true,
        })
    }

    /// Persist a single record on a caller-supplied connection
    pub async fn persist(
        &self,
        conn: &mut SqliteConnection,
        record: &DecodedRecord,
    ) -> Result<()> {
        match record {
            DecodedRecord::RaceDetail(ra) => save_race(conn, ra).await,
            DecodedRecord::HorseEntry(se) => save_result(conn, se).await,
            DecodedRecord::HorseMaster(um) => save_horse(conn, um).await,
            DecodedRecord::OddsWinPlace(o1) => save_odds(conn, o1).await,
            DecodedRecord::BodyWeight(wf) => save_weights(conn, wf).await,
            DecodedRecord::AnnualSchedule(ys) => save_schedule(conn, ys).await,
            DecodedRecord::Unrecognized { tag, length, .. } => {
                debug!(tag = %tag, length = length, "unmodeled record kind, nothing persisted");
                Ok(())
            },
        }
    }

    /// Row counts across the entity tables
    pub async fn table_counts(&self) -> Result<TableCounts> {
        Ok(TableCounts {
            races: self.count("races").await?,
            results: self.count("results").await?,
            horses: self.count("horses").await?,
            odds: self.count("odds").await?,
            weights: self.count("weights").await?,
            schedules: self.count("schedules").await?,
        })
    }

    /// Newest race date on record, as `YYYYMMDD`
    pub async fn latest_race_day(&self) -> Result<Option<String>> {
        sqlx::query_scalar("SELECT MAX(year || monthday) FROM races")
            .fetch_one(&self.db)
            .await
            .context("Failed to query latest race date")
    }

    async fn count(&self, table: &str) -> Result<i64> {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&self.db)
            .await
            .with_context(|| format!("Failed to count rows in {table}"))
    }
}

async fn save_race(conn: &mut SqliteConnection, record: &RaceDetail) -> Result<()> {
    sqlx::query(
        r#"
        INSERT OR REPLACE INTO races (
            race_key, year, monthday, venue_code, venue_name,
            meeting, day, race_number, name, secondary_name,
            grade_code, grade, category_code, category,
            distance_m, track_code, track_name,
            weather_code, weather, turf_going_code, turf_going,
            dirt_going_code, dirt_going, post_time,
            entered_count, starter_count, data_class, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14,
                  ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26, ?27,
                  datetime('now'))
        "#,
    )
    .bind(record.key.canonical())
    .bind(&record.key.year)
    .bind(&record.key.monthday)
    .bind(&record.key.venue_code)
    .bind(codes::venue_name(&record.key.venue_code))
    .bind(record.key.meeting.parse::<i64>().ok())
    .bind(record.key.day.parse::<i64>().ok())
    .bind(record.key.race_number.parse::<i64>().ok())
    .bind(&record.name)
    .bind(&record.secondary_name)
    .bind(&record.grade_code)
    .bind(codes::grade_name(&record.grade_code))
    .bind(&record.category_code)
    .bind(codes::category_name(&record.category_code))
    .bind(record.distance_m)
    .bind(&record.track_code)
    .bind(codes::track_name(&record.track_code))
    .bind(&record.weather_code)
    .bind(codes::weather_name(&record.weather_code))
    .bind(&record.turf_going_code)
    .bind(codes::going_name(&record.turf_going_code))
    .bind(&record.dirt_going_code)
    .bind(codes::going_name(&record.dirt_going_code))
    .bind(&record.post_time)
    .bind(record.entered_count)
    .bind(record.starter_count)
    .bind(&record.header.data_class)
    .execute(conn)
    .await
    .context("Failed to upsert race")?;

    Ok(())
}

async fn save_result(conn: &mut SqliteConnection, record: &HorseEntry) -> Result<()> {
    sqlx::query(
        r#"
        INSERT OR REPLACE INTO results (
            race_key, horse_number, pedigree_id, horse_name,
            sex_code, sex, age, coat_code,
            jockey_code, jockey_name, jockey_short_name,
            trainer_code, trainer_name, trainer_stable,
            carried_weight, body_weight, weight_change,
            incident_code, incident,
            finish_position, time, margin, win_odds, favorite_rank,
            prize_main, prize_bonus, data_class, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14,
                  ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26, ?27,
                  datetime('now'))
        "#,
    )
    .bind(record.key.canonical())
    .bind(record.horse_number)
    .bind(&record.pedigree_id)
    .bind(&record.horse_name)
    .bind(&record.sex_code)
    .bind(codes::sex_name(&record.sex_code))
    .bind(record.age)
    .bind(&record.coat_code)
    .bind(&record.jockey.code)
    .bind(&record.jockey.name)
    .bind(&record.jockey.short_name)
    .bind(&record.trainer.code)
    .bind(&record.trainer.name)
    .bind(&record.trainer.stable)
    .bind(record.carried_weight)
    .bind(record.body_weight)
    .bind(&record.weight_change)
    .bind(&record.incident_code)
    .bind(codes::incident_name(&record.incident_code))
    .bind(record.result.finish_position)
    .bind(&record.result.time)
    .bind(&record.result.margin)
    .bind(record.result.win_odds)
    .bind(record.result.favorite_rank)
    .bind(record.prize.main)
    .bind(record.prize.bonus)
    .bind(&record.header.data_class)
    .execute(conn)
    .await
    .context("Failed to upsert result")?;

    Ok(())
}

async fn save_horse(conn: &mut SqliteConnection, record: &HorseMaster) -> Result<()> {
    sqlx::query(
        r#"
        INSERT OR REPLACE INTO horses (
            pedigree_id, name, birth_date,
            sex_code, sex, breed_code, breed, coat_code, coat,
            bloodline, sire_id, dam_id, broodmare_sire_id,
            region_code, region, trainer_code, trainer_name,
            owner_code, owner_name, breeder_code, breeder_name,
            birthplace, deletion_flag, data_class, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14,
                  ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, datetime('now'))
        "#,
    )
    .bind(&record.pedigree_id)
    .bind(&record.horse_name)
    .bind(&record.birth_date.raw)
    .bind(&record.sex_code)
    .bind(codes::sex_name(&record.sex_code))
    .bind(&record.breed_code)
    .bind(codes::breed_name(&record.breed_code))
    .bind(&record.coat_code)
    .bind(codes::coat_name(&record.coat_code))
    .bind(&record.bloodline)
    .bind(&record.sire_id)
    .bind(&record.dam_id)
    .bind(&record.broodmare_sire_id)
    .bind(&record.region_code)
    .bind(codes::region_name(&record.region_code))
    .bind(&record.trainer.code)
    .bind(&record.trainer.name)
    .bind(&record.owner.code)
    .bind(&record.owner.name)
    .bind(&record.breeder.code)
    .bind(&record.breeder.name)
    .bind(&record.birthplace)
    .bind(&record.deletion_flag)
    .bind(&record.header.data_class)
    .execute(conn)
    .await
    .context("Failed to upsert horse")?;

    Ok(())
}

async fn save_odds(conn: &mut SqliteConnection, record: &OddsWinPlace) -> Result<()> {
    let race_key = record.key.canonical();

    for entry in &record.entries {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO odds (
                race_key, horse_number,
                win_odds, place_odds_low, place_odds_high,
                win_favorite, place_favorite, data_class
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&race_key)
        .bind(entry.horse_number)
        .bind(entry.win_odds)
        .bind(entry.place_odds_low)
        .bind(entry.place_odds_high)
        .bind(entry.win_favorite)
        .bind(entry.place_favorite)
        .bind(&record.header.data_class)
        .execute(&mut *conn)
        .await
        .context("Failed to upsert odds row")?;
    }

    Ok(())
}

async fn save_weights(conn: &mut SqliteConnection, record: &BodyWeight) -> Result<()> {
    let race_key = record.key.canonical();

    for entry in &record.entries {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO weights (
                race_key, horse_number,
                body_weight, change_sign, change, data_class
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&race_key)
        .bind(entry.horse_number)
        .bind(entry.body_weight)
        .bind(&entry.change_sign)
        .bind(&entry.change)
        .bind(&record.header.data_class)
        .execute(&mut *conn)
        .await
        .context("Failed to upsert weight row")?;
    }

    Ok(())
}

async fn save_schedule(conn: &mut SqliteConnection, record: &AnnualSchedule) -> Result<()> {
    for fixture in &record.fixtures {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO schedules (
                year, date, venue_code, venue_name,
                meeting, day, weekday, revision_flag
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&record.year)
        .bind(&fixture.date)
        .bind(&fixture.venue_code)
        .bind(codes::venue_name(&fixture.venue_code))
        .bind(fixture.meeting.parse::<i64>().ok())
        .bind(fixture.day.parse::<i64>().ok())
        .bind(&fixture.weekday)
        .bind(&record.revision_flag)
        .execute(&mut *conn)
        .await
        .context("Failed to upsert schedule row")?;
    }

    Ok(())
}
