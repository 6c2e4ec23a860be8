#![allow(dead_code)]

use std::io::Write as _;

use chrono::NaiveDate;
use occupancy_report::types::{BookingRecord, NO_EVENT};

pub const HEADER: &str = "hotel,arrival_date,year,month,season,occupancy_per_hari,is_holiday,is_event_day,is_canceled,adr,total_tamu,Name";

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub fn record(hotel: &str, day: &str, occupancy: f64) -> BookingRecord {
    let arrival_date = date(day);
    BookingRecord {
        hotel: hotel.to_string(),
        arrival_date,
        year: chrono::Datelike::year(&arrival_date),
        month: chrono::Datelike::month(&arrival_date),
        season: "Summer".to_string(),
        occupancy_per_hari: occupancy,
        is_holiday: false,
        is_event_day: false,
        is_canceled: false,
        adr: 100.0,
        total_tamu: 2,
        name: NO_EVENT.to_string(),
    }
}

/// Writes `rows` under the standard header into a temp file.
pub fn csv_file(rows: &[&str]) -> tempfile::NamedTempFile {
    let mut tmp = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    writeln!(tmp, "{HEADER}").unwrap();
    for row in rows {
        writeln!(tmp, "{row}").unwrap();
    }
    tmp.flush().unwrap();
    tmp
}

/// Ten bookings across two hotels around the 2016 year end. Three are
/// canceled, two are holidays, two are event days.
pub const SAMPLE_ROWS: [&str; 10] = [
    "City Hotel,2016-12-20,2016,12,Winter,40,0,0,0,100,2,",
    "City Hotel,2016-12-21,2016,12,Winter,45,0,0,1,110,2,",
    "City Hotel,2016-12-24,2016,12,Winter,70,1,0,0,150,3,Christmas Eve",
    "City Hotel,2016-12-25,2016,12,Winter,90,1,1,0,180,4,  Christmas  ",
    "City Hotel,2016-12-26,2016,12,Winter,50,0,0,1,120,2,",
    "Resort Hotel,2016-12-20,2016,12,Winter,30,0,0,0,80,2,",
    "Resort Hotel,2016-12-28,2016,12,Winter,55,0,1,0,95,2,Jazz Night",
    "Resort Hotel,2016-12-29,2016,12,Winter,35,0,0,1,85,1,",
    "Resort Hotel,2017-01-02,2017,1,Winter,25,0,0,0,70,2,No Event",
    "Resort Hotel,2017-01-03,2017,1,Winter,20,0,0,0,65,1,",
];
