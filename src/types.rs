use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize, Serializer};
use tabled::Tabled;

/// The single event-name value standing for "no associated event".
pub const NO_EVENT: &str = "No Event";

/// Columns the loader refuses to work without.
pub const REQUIRED_COLUMNS: [&str; 11] = [
    "hotel",
    "arrival_date",
    "year",
    "month",
    "season",
    "occupancy_per_hari",
    "is_holiday",
    "is_event_day",
    "is_canceled",
    "adr",
    "total_tamu",
];

#[derive(Debug, Deserialize)]
pub struct RawRow {
    pub hotel: Option<String>,
    pub arrival_date: Option<String>,
    pub year: Option<String>,
    pub month: Option<String>,
    pub season: Option<String>,
    pub occupancy_per_hari: Option<String>,
    pub is_holiday: Option<String>,
    pub is_event_day: Option<String>,
    pub is_canceled: Option<String>,
    pub adr: Option<String>,
    pub total_tamu: Option<String>,
    #[serde(rename = "Name", default)]
    pub name: Option<String>,
}

/// One normalized booking observation. Serializes back to the source
/// column layout so an export can be reloaded as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct BookingRecord {
    pub hotel: String,
    #[serde(serialize_with = "serialize_date")]
    pub arrival_date: NaiveDate,
    pub year: i32,
    pub month: u32,
    pub season: String,
    #[tabled(display_with = "display_2dp")]
    pub occupancy_per_hari: f64,
    #[serde(serialize_with = "serialize_flag")]
    #[tabled(display_with = "display_flag")]
    pub is_holiday: bool,
    #[serde(serialize_with = "serialize_flag")]
    #[tabled(display_with = "display_flag")]
    pub is_event_day: bool,
    #[serde(serialize_with = "serialize_flag")]
    #[tabled(display_with = "display_flag")]
    pub is_canceled: bool,
    #[tabled(display_with = "display_2dp")]
    pub adr: f64,
    pub total_tamu: u32,
    #[serde(rename = "Name")]
    #[tabled(rename = "Name")]
    pub name: String,
}

impl BookingRecord {
    pub fn day_type(&self) -> DayType {
        DayType::from_flags(self.is_holiday, self.is_event_day)
    }

    pub fn has_event_name(&self) -> bool {
        self.name != NO_EVENT
    }
}

fn serialize_flag<S: Serializer>(flag: &bool, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u8(u8::from(*flag))
}

fn serialize_date<S: Serializer>(date: &NaiveDate, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(&date.format("%Y-%m-%d"))
}

/// Four-way classification of a day from its holiday and event flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DayType {
    Normal,
    HolidayOnly,
    EventOnly,
    HolidayAndEvent,
}

impl DayType {
    pub fn from_flags(is_holiday: bool, is_event_day: bool) -> Self {
        match (is_holiday, is_event_day) {
            (false, false) => Self::Normal,
            (true, false) => Self::HolidayOnly,
            (false, true) => Self::EventOnly,
            (true, true) => Self::HolidayAndEvent,
        }
    }
}

impl fmt::Display for DayType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Normal => "Regular Day",
            Self::HolidayOnly => "Holiday",
            Self::EventOnly => "Event Day",
            Self::HolidayAndEvent => "Holiday & Event",
        };
        f.write_str(label)
    }
}

pub(crate) fn display_2dp(v: &f64) -> String {
    format!("{:.2}", v)
}

fn display_flag(flag: &bool) -> String {
    u8::from(*flag).to_string()
}

fn display_opt_2dp(v: &Option<f64>) -> String {
    v.map(|x| format!("{:.2}", x)).unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct DailyRow {
    #[serde(rename = "Date")]
    #[tabled(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Occupancy")]
    #[tabled(rename = "Occupancy", display_with = "display_2dp")]
    pub occupancy: f64,
    #[serde(rename = "IsHoliday")]
    #[tabled(rename = "IsHoliday")]
    pub is_holiday: bool,
    #[serde(rename = "IsEventDay")]
    #[tabled(rename = "IsEventDay")]
    pub is_event_day: bool,
    #[serde(rename = "TotalGuests")]
    #[tabled(rename = "TotalGuests")]
    pub total_guests: u64,
    #[serde(rename = "AvgAdr")]
    #[tabled(rename = "AvgAdr", display_with = "display_2dp")]
    pub avg_adr: f64,
    #[serde(rename = "Events")]
    #[tabled(rename = "Events")]
    pub events: String,
    #[serde(rename = "DayType")]
    #[tabled(rename = "DayType")]
    pub day_type: DayType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct MonthlyRow {
    #[serde(rename = "YearMonth")]
    #[tabled(rename = "YearMonth")]
    pub year_month: String,
    #[serde(rename = "Year")]
    #[tabled(skip)]
    pub year: i32,
    #[serde(rename = "Month")]
    #[tabled(skip)]
    pub month: u32,
    #[serde(rename = "Occupancy")]
    #[tabled(rename = "Occupancy", display_with = "display_2dp")]
    pub occupancy: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct SeasonRow {
    #[serde(rename = "Season")]
    #[tabled(rename = "Season")]
    pub season: String,
    #[serde(rename = "Occupancy")]
    #[tabled(rename = "Occupancy", display_with = "display_2dp")]
    pub occupancy: f64,
    #[serde(rename = "Rows")]
    #[tabled(rename = "Rows")]
    pub rows: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct WeekdayRow {
    #[serde(rename = "Weekday")]
    #[tabled(rename = "Weekday")]
    pub weekday: String,
    #[serde(rename = "Occupancy")]
    #[tabled(rename = "Occupancy", display_with = "display_2dp")]
    pub occupancy: f64,
    #[serde(rename = "Rows")]
    #[tabled(rename = "Rows")]
    pub rows: usize,
}

/// Five-number summary of raw occupancy for one day category.
#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct DistributionRow {
    #[serde(rename = "Category")]
    #[tabled(rename = "Category")]
    pub category: String,
    #[serde(rename = "Count")]
    #[tabled(rename = "Count")]
    pub count: usize,
    #[serde(rename = "Min")]
    #[tabled(rename = "Min", display_with = "display_opt_2dp")]
    pub min: Option<f64>,
    #[serde(rename = "Q1")]
    #[tabled(rename = "Q1", display_with = "display_opt_2dp")]
    pub q1: Option<f64>,
    #[serde(rename = "Median")]
    #[tabled(rename = "Median", display_with = "display_opt_2dp")]
    pub median: Option<f64>,
    #[serde(rename = "Q3")]
    #[tabled(rename = "Q3", display_with = "display_opt_2dp")]
    pub q3: Option<f64>,
    #[serde(rename = "Max")]
    #[tabled(rename = "Max", display_with = "display_opt_2dp")]
    pub max: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct TopDayRow {
    #[serde(rename = "ArrivalDate")]
    #[tabled(rename = "ArrivalDate")]
    pub arrival_date: NaiveDate,
    #[serde(rename = "Hotel")]
    #[tabled(rename = "Hotel")]
    pub hotel: String,
    #[serde(rename = "Name")]
    #[tabled(rename = "Name")]
    pub name: String,
    #[serde(rename = "Occupancy")]
    #[tabled(rename = "Occupancy", display_with = "display_2dp")]
    pub occupancy: f64,
    #[serde(rename = "Adr")]
    #[tabled(rename = "Adr", display_with = "display_2dp")]
    pub adr: f64,
    #[serde(rename = "TotalGuests")]
    #[tabled(rename = "TotalGuests")]
    pub total_guests: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct EventSummaryRow {
    #[serde(rename = "Date")]
    #[tabled(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "EventName")]
    #[tabled(rename = "EventName")]
    pub name: String,
    #[serde(rename = "Category")]
    #[tabled(rename = "Category")]
    pub category: String,
    #[serde(rename = "Occupancy")]
    #[tabled(rename = "Occupancy", display_with = "display_2dp")]
    pub occupancy: f64,
    #[serde(rename = "TotalGuests")]
    #[tabled(rename = "TotalGuests")]
    pub total_guests: u64,
    #[serde(rename = "AvgAdr")]
    #[tabled(rename = "AvgAdr", display_with = "display_2dp")]
    pub avg_adr: f64,
    #[serde(skip)]
    #[tabled(skip)]
    pub is_holiday: bool,
    #[serde(skip)]
    #[tabled(skip)]
    pub is_event_day: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct ComparisonRow {
    #[serde(rename = "Category")]
    #[tabled(rename = "Category")]
    pub category: String,
    #[serde(rename = "Occupancy")]
    #[tabled(rename = "Occupancy", display_with = "display_2dp")]
    pub occupancy: f64,
    #[serde(rename = "Rows")]
    #[tabled(rename = "Rows")]
    pub rows: usize,
}
