//! Grouped occupancy statistics. Every grouping in one query uses the same
//! [`AggFunc`].
use std::collections::BTreeMap;
use std::fmt;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::filter::FilteredView;
use crate::types::{
    BookingRecord, DailyRow, DayType, DistributionRow, MonthlyRow, SeasonRow, WeekdayRow,
};
use crate::util::{average, median, quantile_sorted};

const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum AggFunc {
    #[default]
    Mean,
    Median,
    Sum,
}

impl AggFunc {
    /// Aggregate of `values`; `0` for an empty slice.
    pub fn apply(self, values: &[f64]) -> f64 {
        match self {
            Self::Mean => average(values),
            Self::Median => median(values.to_vec()),
            Self::Sum => values.iter().sum(),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Mean => "Mean",
            Self::Median => "Median",
            Self::Sum => "Total",
        }
    }
}

impl fmt::Display for AggFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

fn occupancies<'r>(records: impl IntoIterator<Item = &'r BookingRecord>) -> Vec<f64> {
    records.into_iter().map(|r| r.occupancy_per_hari).collect()
}

/// `f` over the occupancy of every row in `records`.
pub fn aggregate_occupancy<'r>(
    records: impl IntoIterator<Item = &'r BookingRecord>,
    agg: AggFunc,
) -> f64 {
    agg.apply(&occupancies(records))
}

/// One row per arrival date, ascending.
pub fn daily(view: &FilteredView<'_>, agg: AggFunc) -> Vec<DailyRow> {
    #[derive(Default)]
    struct Acc<'r> {
        rows: Vec<&'r BookingRecord>,
        names: Vec<&'r str>,
    }

    let mut map: BTreeMap<NaiveDate, Acc<'_>> = BTreeMap::new();
    for r in view.records() {
        let e = map.entry(r.arrival_date).or_default();
        if r.has_event_name() && !e.names.contains(&r.name.as_str()) {
            e.names.push(&r.name);
        }
        e.rows.push(r);
    }

    map.into_iter()
        .map(|(date, acc)| {
            let is_holiday = acc.rows.iter().any(|r| r.is_holiday);
            let is_event_day = acc.rows.iter().any(|r| r.is_event_day);
            let day_type = DayType::from_flags(is_holiday, is_event_day);
            let adrs: Vec<f64> = acc.rows.iter().map(|r| r.adr).collect();
            let events = if acc.names.is_empty() {
                DayType::Normal.to_string()
            } else {
                acc.names.join(", ")
            };
            DailyRow {
                date,
                occupancy: aggregate_occupancy(acc.rows.iter().copied(), agg),
                is_holiday,
                is_event_day,
                total_guests: acc.rows.iter().map(|r| u64::from(r.total_tamu)).sum(),
                avg_adr: average(&adrs),
                events,
                day_type,
            }
        })
        .collect()
}

/// One row per (year, month), ascending.
pub fn monthly(view: &FilteredView<'_>, agg: AggFunc) -> Vec<MonthlyRow> {
    let mut map: BTreeMap<(i32, u32), Vec<f64>> = BTreeMap::new();
    for r in view.records() {
        map.entry((r.year, r.month))
            .or_default()
            .push(r.occupancy_per_hari);
    }
    map.into_iter()
        .map(|((year, month), values)| MonthlyRow {
            year_month: format!("{}-{:02}", year, month),
            year,
            month,
            occupancy: agg.apply(&values),
        })
        .collect()
}

/// One row per season, ordered by name.
pub fn seasonal(view: &FilteredView<'_>, agg: AggFunc) -> Vec<SeasonRow> {
    let mut map: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for r in view.records() {
        map.entry(r.season.as_str())
            .or_default()
            .push(r.occupancy_per_hari);
    }
    map.into_iter()
        .map(|(season, values)| SeasonRow {
            season: season.to_string(),
            occupancy: agg.apply(&values),
            rows: values.len(),
        })
        .collect()
}

fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Always seven rows, Monday through Sunday. Weekdays without rows
/// report `0`.
pub fn by_weekday(view: &FilteredView<'_>, agg: AggFunc) -> Vec<WeekdayRow> {
    let mut buckets: [Vec<f64>; 7] = Default::default();
    for r in view.records() {
        let idx = r.arrival_date.weekday().num_days_from_monday() as usize;
        buckets[idx].push(r.occupancy_per_hari);
    }
    WEEK.iter()
        .zip(buckets.iter())
        .map(|(day, values)| WeekdayRow {
            weekday: weekday_name(*day).to_string(),
            occupancy: agg.apply(values),
            rows: values.len(),
        })
        .collect()
}

/// Day-of-month (rows 1..=31) by month (columns 1..=12) grid.
///
/// Cells without observations stay `None`, unlike the scalar groupings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Heatmap {
    pub cells: [[Option<f64>; 12]; 31],
}

impl Heatmap {
    pub fn get(&self, day: u32, month: u32) -> Option<f64> {
        if !(1..=31).contains(&day) || !(1..=12).contains(&month) {
            return None;
        }
        self.cells[(day - 1) as usize][(month - 1) as usize]
    }

    pub fn filled_cells(&self) -> usize {
        self.cells.iter().flatten().filter(|c| c.is_some()).count()
    }
}

/// Months come from the `month` column and days from the arrival date.
pub fn heatmap(view: &FilteredView<'_>, agg: AggFunc) -> Heatmap {
    let mut groups: BTreeMap<(u32, u32), Vec<f64>> = BTreeMap::new();
    for r in view.records() {
        groups
            .entry((r.arrival_date.day(), r.month))
            .or_default()
            .push(r.occupancy_per_hari);
    }
    let mut cells = [[None; 12]; 31];
    for ((day, month), values) in groups {
        if (1..=12).contains(&month) {
            cells[(day - 1) as usize][(month - 1) as usize] = Some(agg.apply(&values));
        } else {
            tracing::warn!(month, "month outside 1..=12 left out of heatmap");
        }
    }
    Heatmap { cells }
}

fn distribution_row(category: &str, mut values: Vec<f64>) -> DistributionRow {
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let stat = |q: f64| (!values.is_empty()).then(|| quantile_sorted(&values, q));
    DistributionRow {
        category: category.to_string(),
        count: values.len(),
        min: values.first().copied(),
        q1: stat(0.25),
        median: stat(0.5),
        q3: stat(0.75),
        max: values.last().copied(),
    }
}

/// Raw occupancy spread for regular days, holidays and event days.
/// Event days overlap with the first two categories.
pub fn distribution(view: &FilteredView<'_>) -> Vec<DistributionRow> {
    vec![
        distribution_row(
            "Regular Day",
            occupancies(view.records().filter(|r| !r.is_holiday)),
        ),
        distribution_row(
            "Holiday",
            occupancies(view.records().filter(|r| r.is_holiday)),
        ),
        distribution_row(
            "Event Day",
            occupancies(view.records().filter(|r| r.is_event_day)),
        ),
    ]
}
