//! Decoded record models
//!
//! Typed views over the six record kinds the store models, plus the
//! generic passthrough for everything else. Numeric fields are `Option`
//! throughout: the wire format blank-fills unknown values and a blank is
//! not a zero.

use serde::{Deserialize, Serialize};

use super::fields::{DateField, TimeField};

/// Composite race identity
///
/// All referencing tables use the canonical concatenated form as the
/// foreign key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RaceKey {
    /// Four-digit year
    pub year: String,
    /// `MMDD`
    pub monthday: String,
    /// Two-digit racecourse code
    pub venue_code: String,
    /// Meeting number within the year
    pub meeting: String,
    /// Day number within the meeting
    pub day: String,
    /// Race number on the card
    pub race_number: String,
}

impl RaceKey {
    /// Canonical string form: fields concatenated in fixed order
    pub fn canonical(&self) -> String {
        format!(
            "{}{}{}{}{}{}",
            self.year, self.monthday, self.venue_code, self.meeting, self.day, self.race_number
        )
    }
}

/// Header fields common to every known record kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RecordHeader {
    /// Data classification flag: provisional vs. confirmed data for the
    /// same key. Provenance only; conflict resolution is last-write-wins.
    pub data_class: String,
    /// Creation date stamped by the source
    pub created_date: DateField,
}

/// A coded party reference (owner, breeder, trainer on the master record)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PartyRef {
    pub code: String,
    pub name: String,
}

/// Jockey reference carried on a horse entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct JockeyRef {
    pub code: String,
    pub name: String,
    pub short_name: String,
}

/// Trainer reference carried on a horse entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TrainerRef {
    pub code: String,
    pub name: String,
    pub short_name: String,
    pub stable: String,
}

/// Prize money block on a horse entry (units as delivered by the source)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PrizeMoney {
    pub main: Option<i64>,
    pub bonus: Option<i64>,
    pub earned_main: Option<i64>,
    pub earned_total: Option<i64>,
}

/// Per-race result block on a horse entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct EntryResult {
    pub finish_position: Option<i64>,
    /// Race time formatted `M:SS.f`
    pub time: Option<String>,
    pub margin_code: String,
    pub margin: String,
    pub provisional_flag: String,
    /// Win odds in tenths
    pub win_odds: Option<i64>,
    pub favorite_rank: Option<i64>,
}

/// `RA` - race detail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RaceDetail {
    pub header: RecordHeader,
    /// Creation time; only this kind carries one
    pub created_time: TimeField,
    pub key: RaceKey,
    pub weekday: String,
    pub name: String,
    pub secondary_name: String,
    pub finish_order_summary: String,
    pub grade_code: String,
    pub category_code: String,
    pub symbol_code: String,
    pub weight_rule_code: String,
    pub condition_code: String,
    pub distance_m: Option<i64>,
    pub track_code: String,
    pub course_division: String,
    /// Post time `HHMM`
    pub post_time: String,
    pub entered_count: Option<i64>,
    pub starter_count: Option<i64>,
    pub finisher_count: Option<i64>,
    pub weather_code: String,
    pub turf_going_code: String,
    pub dirt_going_code: String,
    /// Per-lap times, populated prefix only (up to 25)
    pub lap_times: Vec<String>,
    /// Opening furlong times (up to 4)
    pub opening_furlongs: Vec<String>,
    /// Closing furlong times (up to 3)
    pub closing_furlongs: Vec<String>,
}

/// `SE` - one horse's entry and result in one race
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct HorseEntry {
    pub header: RecordHeader,
    pub key: RaceKey,
    pub horse_number: Option<i64>,
    pub pedigree_id: String,
    pub horse_name: String,
    pub sex_code: String,
    pub age: Option<i64>,
    pub region_code: String,
    pub breed_code: String,
    pub coat_code: String,
    /// Owner block as registered at entry time
    pub registered_owner: PartyRef,
    /// Carried weight in tenths of a kilogram
    pub carried_weight: Option<i64>,
    pub blinkers: String,
    pub jockey: JockeyRef,
    pub body_weight: Option<i64>,
    pub weight_change: String,
    pub incident_code: String,
    pub trainer: TrainerRef,
    pub owner: PartyRef,
    pub prize: PrizeMoney,
    pub result: EntryResult,
}

/// `UM` - horse master, keyed by pedigree registration number
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct HorseMaster {
    pub header: RecordHeader,
    pub pedigree_id: String,
    pub deletion_flag: String,
    pub registered_date: DateField,
    pub deregistered_date: DateField,
    pub horse_name: String,
    pub birth_date: DateField,
    pub sex_code: String,
    pub breed_code: String,
    pub coat_code: String,
    pub bloodline: String,
    pub sire_id: String,
    pub dam_id: String,
    pub broodmare_sire_id: String,
    pub region_code: String,
    pub trainer: PartyRef,
    pub owner: PartyRef,
    pub breeder: PartyRef,
    pub birthplace: String,
}

/// One populated slot of the win/place odds group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OddsEntry {
    pub horse_number: i64,
    /// Win odds in tenths
    pub win_odds: Option<i64>,
    pub place_odds_low: Option<i64>,
    pub place_odds_high: Option<i64>,
    pub win_favorite: Option<i64>,
    pub place_favorite: Option<i64>,
}

/// `O1` - win/place odds snapshot for one race
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct OddsWinPlace {
    pub header: RecordHeader,
    pub key: RaceKey,
    pub win_sales_total: String,
    pub place_sales_total: String,
    pub win_refund_total: String,
    pub place_refund_total: String,
    /// Populated slots only (up to 28)
    pub entries: Vec<OddsEntry>,
}

/// One populated slot of the body-weight group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightEntry {
    pub horse_number: i64,
    pub body_weight: Option<i64>,
    pub change_sign: String,
    pub change: String,
}

/// `WF` - pre-race body weights for one race
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BodyWeight {
    pub header: RecordHeader,
    pub key: RaceKey,
    /// Populated slots only (up to 28)
    pub entries: Vec<WeightEntry>,
}

/// One fixture in the annual schedule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fixture {
    /// `YYYYMMDD`
    pub date: String,
    pub venue_code: String,
    pub meeting: String,
    pub day: String,
    pub weekday: String,
}

/// `YS` - annual racing schedule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AnnualSchedule {
    pub header: RecordHeader,
    pub year: String,
    pub revision_flag: String,
    /// Populated slots only (up to 397)
    pub fixtures: Vec<Fixture>,
}

/// One decoded physical record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecodedRecord {
    RaceDetail(RaceDetail),
    HorseEntry(HorseEntry),
    HorseMaster(HorseMaster),
    OddsWinPlace(OddsWinPlace),
    BodyWeight(BodyWeight),
    AnnualSchedule(AnnualSchedule),
    /// Record kinds the store does not model: captured, never an error
    Unrecognized {
        tag: String,
        length: usize,
        raw: Vec<u8>,
    },
}

impl DecodedRecord {
    /// Short kind label for logging
    pub fn kind(&self) -> &'static str {
        match self {
            DecodedRecord::RaceDetail(_) => "race_detail",
            DecodedRecord::HorseEntry(_) => "horse_entry",
            DecodedRecord::HorseMaster(_) => "horse_master",
            DecodedRecord::OddsWinPlace(_) => "odds_win_place",
            DecodedRecord::BodyWeight(_) => "body_weight",
            DecodedRecord::AnnualSchedule(_) => "annual_schedule",
            DecodedRecord::Unrecognized { .. } => "unrecognized",
        }
    }
}
