//! Record decoding
//!
//! Dispatches on the 2-character type tag at the head of each physical
//! record and applies that kind's fixed offset table. Offsets below are
//! 1-based, matching the provider's layout documentation.
//!
//! Repeated groups are constant-width arrays where only a prefix is
//! populated: each slot's identifying field is read first, and an absent
//! slot is skipped without touching its remaining sub-fields while the
//! cursor still advances by the slot width.

use thiserror::Error;

use super::fields::{date, integer, race_time, text, time};
use super::models::{
    AnnualSchedule, BodyWeight, DecodedRecord, EntryResult, Fixture, HorseEntry, HorseMaster,
    JockeyRef, OddsEntry, OddsWinPlace, PartyRef, PrizeMoney, RaceDetail, RaceKey, RecordHeader,
    TrainerRef, WeightEntry,
};

/// Maximum lap-time slots in a race detail record
pub const MAX_LAP_TIMES: usize = 25;
/// Maximum per-horse slots in odds and body-weight records
pub const MAX_HORSE_SLOTS: usize = 28;
/// Maximum fixture slots in an annual schedule record
pub const MAX_FIXTURES: usize = 397;

/// Decode failure; only structurally hopeless input is an error
#[derive(Error, Debug, PartialEq, Eq)]
pub enum DecodeError {
    #[error("record shorter than the 2-byte type tag ({len} bytes)")]
    TooShort { len: usize },
}

/// Decode one physical record.
///
/// Known tags get their typed variant; any other tag is captured as
/// [`DecodedRecord::Unrecognized`] and is **not** an error.
pub fn decode(buf: &[u8]) -> Result<DecodedRecord, DecodeError> {
    if buf.len() < 2 {
        return Err(DecodeError::TooShort { len: buf.len() });
    }

    let tag = String::from_utf8_lossy(&buf[0..2]).to_string();

    let record = match tag.as_str() {
        "RA" => DecodedRecord::RaceDetail(decode_race_detail(buf)),
        "SE" => DecodedRecord::HorseEntry(decode_horse_entry(buf)),
        "UM" => DecodedRecord::HorseMaster(decode_horse_master(buf)),
        "O1" => DecodedRecord::OddsWinPlace(decode_odds_win_place(buf)),
        "WF" => DecodedRecord::BodyWeight(decode_body_weight(buf)),
        "YS" => DecodedRecord::AnnualSchedule(decode_annual_schedule(buf)),
        _ => DecodedRecord::Unrecognized {
            tag,
            length: buf.len(),
            raw: buf.to_vec(),
        },
    };

    Ok(record)
}

fn header(buf: &[u8]) -> RecordHeader {
    RecordHeader {
        data_class: text(buf, 3, 1),
        created_date: date(buf, 4),
    }
}

fn race_key(buf: &[u8], start: usize) -> RaceKey {
    RaceKey {
        year: text(buf, start, 4),
        monthday: text(buf, start + 4, 4),
        venue_code: text(buf, start + 8, 2),
        meeting: text(buf, start + 10, 2),
        day: text(buf, start + 12, 2),
        race_number: text(buf, start + 14, 2),
    }
}

/// A 3-byte sectional time slot is present iff non-blank and not "000"
fn push_sectional(buf: &[u8], start: usize, out: &mut Vec<String>) {
    let value = text(buf, start, 3);
    if !value.is_empty() && value != "000" {
        out.push(value);
    }
}

fn decode_race_detail(buf: &[u8]) -> RaceDetail {
    let mut record = RaceDetail {
        header: header(buf),
        created_time: time(buf, 12),
        key: race_key(buf, 18),
        weekday: text(buf, 34, 2),
        name: text(buf, 36, 60),
        secondary_name: text(buf, 96, 60),
        finish_order_summary: text(buf, 156, 100),
        grade_code: text(buf, 256, 1),
        category_code: text(buf, 257, 2),
        symbol_code: text(buf, 259, 3),
        weight_rule_code: text(buf, 262, 1),
        condition_code: text(buf, 263, 2),
        distance_m: integer(buf, 266, 4),
        track_code: text(buf, 270, 2),
        course_division: text(buf, 272, 1),
        post_time: text(buf, 273, 4),
        entered_count: integer(buf, 277, 2),
        starter_count: integer(buf, 279, 2),
        finisher_count: integer(buf, 281, 2),
        weather_code: text(buf, 283, 1),
        turf_going_code: text(buf, 284, 1),
        dirt_going_code: text(buf, 285, 1),
        lap_times: Vec::new(),
        opening_furlongs: Vec::new(),
        closing_furlongs: Vec::new(),
    };

    for i in 0..MAX_LAP_TIMES {
        push_sectional(buf, 286 + i * 3, &mut record.lap_times);
    }
    for i in 0..4 {
        push_sectional(buf, 361 + i * 3, &mut record.opening_furlongs);
    }
    for i in 0..3 {
        push_sectional(buf, 373 + i * 3, &mut record.closing_furlongs);
    }

    record
}

fn decode_horse_entry(buf: &[u8]) -> HorseEntry {
    HorseEntry {
        header: header(buf),
        key: race_key(buf, 12),
        horse_number: integer(buf, 28, 2),
        pedigree_id: text(buf, 30, 10),
        horse_name: text(buf, 40, 36),
        sex_code: text(buf, 76, 1),
        age: integer(buf, 77, 2),
        region_code: text(buf, 79, 1),
        breed_code: text(buf, 80, 1),
        coat_code: text(buf, 81, 2),
        registered_owner: PartyRef {
            code: text(buf, 83, 6),
            name: text(buf, 89, 64),
        },
        carried_weight: integer(buf, 153, 3),
        blinkers: text(buf, 156, 1),
        jockey: JockeyRef {
            code: text(buf, 157, 5),
            name: text(buf, 162, 34),
            short_name: text(buf, 196, 8),
        },
        body_weight: integer(buf, 204, 3),
        weight_change: text(buf, 207, 3),
        incident_code: text(buf, 210, 1),
        trainer: TrainerRef {
            code: text(buf, 211, 5),
            name: text(buf, 216, 34),
            short_name: text(buf, 250, 8),
            stable: text(buf, 258, 4),
        },
        owner: PartyRef {
            code: text(buf, 262, 6),
            name: text(buf, 268, 64),
        },
        prize: PrizeMoney {
            main: integer(buf, 332, 8),
            bonus: integer(buf, 340, 8),
            earned_main: integer(buf, 348, 8),
            earned_total: integer(buf, 356, 8),
        },
        result: EntryResult {
            finish_position: integer(buf, 364, 2),
            time: race_time(buf, 366),
            margin_code: text(buf, 370, 1),
            margin: text(buf, 371, 3),
            provisional_flag: text(buf, 374, 1),
            win_odds: integer(buf, 375, 4),
            favorite_rank: integer(buf, 379, 2),
        },
    }
}

fn decode_horse_master(buf: &[u8]) -> HorseMaster {
    HorseMaster {
        header: header(buf),
        pedigree_id: text(buf, 12, 10),
        deletion_flag: text(buf, 22, 1),
        registered_date: date(buf, 23),
        deregistered_date: date(buf, 31),
        horse_name: text(buf, 39, 36),
        birth_date: date(buf, 75),
        sex_code: text(buf, 83, 1),
        breed_code: text(buf, 84, 1),
        coat_code: text(buf, 85, 2),
        bloodline: text(buf, 87, 60),
        sire_id: text(buf, 147, 10),
        dam_id: text(buf, 157, 10),
        broodmare_sire_id: text(buf, 167, 10),
        region_code: text(buf, 177, 1),
        trainer: PartyRef {
            code: text(buf, 178, 5),
            name: text(buf, 183, 34),
        },
        owner: PartyRef {
            code: text(buf, 217, 6),
            name: text(buf, 223, 64),
        },
        breeder: PartyRef {
            code: text(buf, 287, 6),
            name: text(buf, 293, 42),
        },
        birthplace: text(buf, 335, 20),
    }
}

fn decode_odds_win_place(buf: &[u8]) -> OddsWinPlace {
    let mut record = OddsWinPlace {
        header: header(buf),
        key: race_key(buf, 12),
        win_sales_total: text(buf, 28, 11),
        place_sales_total: text(buf, 39, 11),
        win_refund_total: text(buf, 50, 11),
        place_refund_total: text(buf, 61, 11),
        entries: Vec::new(),
    };

    // 16-byte slot per horse
    for i in 0..MAX_HORSE_SLOTS {
        let base = 72 + i * 16;
        let Some(horse_number) = integer(buf, base, 2).filter(|n| *n > 0) else {
            continue;
        };
        record.entries.push(OddsEntry {
            horse_number,
            win_odds: integer(buf, base + 2, 4),
            place_odds_low: integer(buf, base + 6, 4),
            place_odds_high: integer(buf, base + 10, 4),
            win_favorite: integer(buf, base + 14, 1),
            place_favorite: integer(buf, base + 15, 1),
        });
    }

    record
}

fn decode_body_weight(buf: &[u8]) -> BodyWeight {
    let mut record = BodyWeight {
        header: header(buf),
        key: race_key(buf, 12),
        entries: Vec::new(),
    };

    // 7-byte slot per horse
    for i in 0..MAX_HORSE_SLOTS {
        let base = 28 + i * 7;
        let Some(horse_number) = integer(buf, base, 2).filter(|n| *n > 0) else {
            continue;
        };
        record.entries.push(WeightEntry {
            horse_number,
            body_weight: integer(buf, base + 2, 3),
            change_sign: text(buf, base + 5, 1),
            change: text(buf, base + 6, 3),
        });
    }

    record
}

fn decode_annual_schedule(buf: &[u8]) -> AnnualSchedule {
    let mut record = AnnualSchedule {
        header: header(buf),
        year: text(buf, 12, 4),
        revision_flag: text(buf, 16, 1),
        fixtures: Vec::new(),
    };

    // 16-byte slot per fixture; stop once a slot would start past the end
    for i in 0..MAX_FIXTURES {
        let base = 17 + i * 16;
        if base + 16 > buf.len() + 1 {
            break;
        }
        let fixture_date = text(buf, base, 8);
        if fixture_date.is_empty() || fixture_date == "00000000" {
            continue;
        }
        record.fixtures.push(Fixture {
            date: fixture_date,
            venue_code: text(buf, base + 8, 2),
            meeting: text(buf, base + 10, 2),
            day: text(buf, base + 12, 2),
            weekday: text(buf, base + 14, 2),
        });
    }

    record
}
