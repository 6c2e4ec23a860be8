use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::aggregate::AggFunc;
use crate::filter::FilteredView;
use crate::metrics::OccupancyMetrics;
use crate::types::{BookingRecord, ComparisonRow, EventSummaryRow, TopDayRow};
use crate::util::average;

fn top_by_occupancy<'r, F>(view: &FilteredView<'r>, n: usize, keep: F) -> Vec<TopDayRow>
where
    F: Fn(&BookingRecord) -> bool,
{
    let mut rows: Vec<&BookingRecord> = view.records().filter(|r| keep(r)).collect();
    // Stable sort keeps dataset order among equal occupancies.
    rows.sort_by(|a, b| {
        b.occupancy_per_hari
            .partial_cmp(&a.occupancy_per_hari)
            .unwrap_or(Ordering::Equal)
    });
    rows.into_iter()
        .take(n)
        .map(|r| TopDayRow {
            arrival_date: r.arrival_date,
            hotel: r.hotel.clone(),
            name: r.name.clone(),
            occupancy: r.occupancy_per_hari,
            adr: r.adr,
            total_guests: r.total_tamu,
        })
        .collect()
}

pub fn top_holidays(view: &FilteredView<'_>, n: usize) -> Vec<TopDayRow> {
    top_by_occupancy(view, n, |r| r.is_holiday)
}

pub fn top_events(view: &FilteredView<'_>, n: usize) -> Vec<TopDayRow> {
    top_by_occupancy(view, n, |r| r.is_event_day)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventSummary {
    pub rows: Vec<EventSummaryRow>,
    pub total: usize,
    pub holidays: usize,
    pub events: usize,
}

/// Holiday and event rows grouped by (date, event name), newest first.
pub fn event_summary(view: &FilteredView<'_>, agg: AggFunc) -> EventSummary {
    #[derive(Default)]
    struct Acc {
        occupancy: Vec<f64>,
        adr: Vec<f64>,
        guests: u64,
        is_holiday: bool,
        is_event_day: bool,
    }

    let mut map: BTreeMap<(NaiveDate, &str), Acc> = BTreeMap::new();
    for r in view.records().filter(|r| r.is_holiday || r.is_event_day) {
        let e = map.entry((r.arrival_date, r.name.as_str())).or_default();
        e.occupancy.push(r.occupancy_per_hari);
        e.adr.push(r.adr);
        e.guests += u64::from(r.total_tamu);
        e.is_holiday |= r.is_holiday;
        e.is_event_day |= r.is_event_day;
    }

    let mut rows: Vec<EventSummaryRow> = map
        .into_iter()
        .map(|((date, name), acc)| EventSummaryRow {
            date,
            name: name.to_string(),
            category: if acc.is_holiday { "Holiday" } else { "Event" }.to_string(),
            occupancy: agg.apply(&acc.occupancy),
            total_guests: acc.guests,
            avg_adr: average(&acc.adr),
            is_holiday: acc.is_holiday,
            is_event_day: acc.is_event_day,
        })
        .collect();
    // BTreeMap order is (date asc, name asc); flip only the date.
    rows.sort_by(|a, b| b.date.cmp(&a.date));

    EventSummary {
        total: rows.len(),
        holidays: rows.iter().filter(|r| r.is_holiday).count(),
        events: rows.iter().filter(|r| r.is_event_day).count(),
        rows,
    }
}

/// (Regular Day, Holiday) and (Non-Event, Event Day) comparison tables.
pub fn comparisons(m: &OccupancyMetrics) -> (Vec<ComparisonRow>, Vec<ComparisonRow>) {
    let row = |category: &str, occupancy: f64, rows: usize| ComparisonRow {
        category: category.to_string(),
        occupancy,
        rows,
    };
    (
        vec![
            row("Regular Day", m.occupancy_normal, m.regular_rows),
            row("Holiday", m.occupancy_holiday, m.holiday_rows),
        ],
        vec![
            row("Non-Event", m.occupancy_no_event, m.no_event_rows),
            row("Event Day", m.occupancy_event, m.event_rows),
        ],
    )
}
