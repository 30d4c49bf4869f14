//! Static code tables
//!
//! The wire format carries most categorical values as short numeric or
//! single-letter codes. These tables resolve them to display names at
//! persistence time. Unknown codes resolve to the code itself so that
//! new values introduced upstream survive round trips unharmed.

/// Racecourse codes
pub fn venue_name(code: &str) -> &str {
    match code {
        "01" => "Sapporo",
        "02" => "Hakodate",
        "03" => "Fukushima",
        "04" => "Niigata",
        "05" => "Tokyo",
        "06" => "Nakayama",
        "07" => "Chukyo",
        "08" => "Kyoto",
        "09" => "Hanshin",
        "10" => "Kokura",
        other => other,
    }
}

/// Graded-race codes
pub fn grade_name(code: &str) -> &str {
    match code {
        "A" => "G1",
        "B" => "G2",
        "C" => "G3",
        " " | "" => "ungraded",
        other => other,
    }
}

/// Race category codes (age conditions and jump races)
pub fn category_name(code: &str) -> &str {
    match code {
        "11" => "2yo",
        "12" => "3yo",
        "13" => "3yo and up",
        "14" => "4yo and up",
        "18" => "jump",
        other => other,
    }
}

/// Track layout codes
pub fn track_name(code: &str) -> &str {
    match code {
        "00" => "turf",
        "10" => "turf outer",
        "11" => "turf inner-outer",
        "12" => "turf outer-inner",
        "17" => "turf inner two laps",
        "18" => "turf outer two laps",
        "19" | "20" | "29" => "dirt",
        "21" => "dirt inner-outer",
        "22" => "dirt outer-inner",
        "23" => "dirt inner two laps",
        "24" => "dirt outer two laps",
        "51" => "jump turf",
        "52" => "jump turf-dirt",
        "53" => "jump dirt-turf",
        "54" => "jump dirt",
        "55" => "jump straight",
        "56" => "jump turf outer",
        "57" => "jump turf inner-outer",
        "58" => "jump turf outer-inner",
        "59" => "jump turf inner two laps",
        other => other,
    }
}

/// Weather codes
pub fn weather_name(code: &str) -> &str {
    match code {
        "1" => "fine",
        "2" => "cloudy",
        "3" => "rain",
        "4" => "light rain",
        "5" => "snow",
        "6" => "light snow",
        other => other,
    }
}

/// Going codes, shared by the turf and dirt scales
pub fn going_name(code: &str) -> &str {
    match code {
        "1" => "firm",
        "2" => "good",
        "3" => "yielding",
        "4" => "soft",
        other => other,
    }
}

/// Sex codes
pub fn sex_name(code: &str) -> &str {
    match code {
        "1" => "colt",
        "2" => "filly",
        "3" => "gelding",
        other => other,
    }
}

/// Breed codes
pub fn breed_name(code: &str) -> &str {
    match code {
        "1" => "thoroughbred",
        "2" => "arabian",
        other => other,
    }
}

/// Coat color codes
pub fn coat_name(code: &str) -> &str {
    match code {
        "01" => "chestnut",
        "02" => "dark chestnut",
        "03" => "bay",
        "04" => "dark bay",
        "05" => "brown",
        "06" => "black",
        "07" => "grey",
        "08" => "roan chestnut",
        "09" => "roan bay",
        "10" => "roan brown",
        "11" => "white",
        other => other,
    }
}

/// Training region codes
pub fn region_name(code: &str) -> &str {
    match code {
        "1" => "Miho",
        "2" => "Ritto",
        "3" => "regional",
        "4" => "overseas",
        other => other,
    }
}

/// Race incident codes carried on a horse entry
pub fn incident_name(code: &str) -> &str {
    match code {
        "0" => "none",
        "1" => "scratched",
        "2" => "excluded at start",
        "3" => "excluded",
        "4" => "pulled up",
        "5" => "disqualified",
        "6" => "remounted",
        "7" => "demoted",
        other => other,
    }
}
