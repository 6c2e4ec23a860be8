//! Scalar comparison metrics for a filtered view.
use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::Serialize;

use crate::aggregate::{aggregate_occupancy, AggFunc};
use crate::filter::{FilterSpec, FilteredView};
use crate::util::{average, percentage};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OccupancyMetrics {
    pub occupancy_normal: f64,
    pub occupancy_holiday: f64,
    pub occupancy_no_event: f64,
    pub occupancy_event: f64,
    pub diff_holiday: f64,
    pub diff_event: f64,
    pub total_bookings: usize,
    /// Share of the full dataset that survived the filters, in percent.
    pub share_of_total: f64,
    pub cancellation_rate: f64,
    pub avg_rate: f64,
    pub regular_rows: usize,
    pub holiday_rows: usize,
    pub no_event_rows: usize,
    pub event_rows: usize,
}

/// Period and hotel coverage of a view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewInfo {
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub hotels: usize,
}

/// Relative change of `value` over `baseline` in percent; `0` unless the
/// baseline is positive.
pub fn percent_delta(value: f64, baseline: f64) -> f64 {
    if baseline > 0.0 {
        (value - baseline) / baseline * 100.0
    } else {
        0.0
    }
}

impl OccupancyMetrics {
    /// `view` is the display population produced by `filters`. The
    /// cancellation rate is measured on the same filters with the
    /// exclude-canceled toggle switched off.
    pub fn compute(view: &FilteredView<'_>, filters: &FilterSpec, agg: AggFunc) -> Self {
        let dataset = view.dataset();

        let occupancy_normal = aggregate_occupancy(view.records().filter(|r| !r.is_holiday), agg);
        let occupancy_holiday = aggregate_occupancy(view.records().filter(|r| r.is_holiday), agg);
        let occupancy_no_event =
            aggregate_occupancy(view.records().filter(|r| !r.is_event_day), agg);
        let occupancy_event = aggregate_occupancy(view.records().filter(|r| r.is_event_day), agg);

        let holiday_rows = view.records().filter(|r| r.is_holiday).count();
        let event_rows = view.records().filter(|r| r.is_event_day).count();
        let total_bookings = view.len();

        let population = filters.without_cancel_exclusion().apply(dataset);
        let canceled = population.records().filter(|r| r.is_canceled).count();
        let cancellation_rate = percentage(canceled as f64, population.len() as f64);

        let adrs: Vec<f64> = view.records().map(|r| r.adr).collect();

        Self {
            occupancy_normal,
            occupancy_holiday,
            occupancy_no_event,
            occupancy_event,
            diff_holiday: percent_delta(occupancy_holiday, occupancy_normal),
            diff_event: percent_delta(occupancy_event, occupancy_no_event),
            total_bookings,
            share_of_total: percentage(total_bookings as f64, dataset.len() as f64),
            cancellation_rate,
            avg_rate: average(&adrs),
            regular_rows: total_bookings - holiday_rows,
            holiday_rows,
            no_event_rows: total_bookings - event_rows,
            event_rows,
        }
    }
}

impl ViewInfo {
    pub fn of(view: &FilteredView<'_>) -> Self {
        let hotels: BTreeSet<&str> = view.records().map(|r| r.hotel.as_str()).collect();
        Self {
            first_date: view.records().map(|r| r.arrival_date).min(),
            last_date: view.records().map(|r| r.arrival_date).max(),
            hotels: hotels.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::Dataset;
    use crate::types::{BookingRecord, NO_EVENT};

    fn rec(occ: f64, holiday: bool, event: bool, canceled: bool, adr: f64) -> BookingRecord {
        BookingRecord {
            hotel: "City Hotel".into(),
            arrival_date: NaiveDate::from_ymd_opt(2017, 8, 1).unwrap(),
            year: 2017,
            month: 8,
            season: "Summer".into(),
            occupancy_per_hari: occ,
            is_holiday: holiday,
            is_event_day: event,
            is_canceled: canceled,
            adr,
            total_tamu: 2,
            name: NO_EVENT.into(),
        }
    }

    #[test]
    fn holiday_delta() {
        let ds = Dataset::new(vec![
            rec(40.0, false, false, false, 100.0),
            rec(60.0, true, false, false, 200.0),
        ]);
        let spec = FilterSpec::default();
        let m = OccupancyMetrics::compute(&spec.apply(&ds), &spec, AggFunc::Mean);
        assert_eq!(m.occupancy_normal, 40.0);
        assert_eq!(m.occupancy_holiday, 60.0);
        assert_eq!(m.diff_holiday, 50.0);
        assert_eq!(m.avg_rate, 150.0);
        assert_eq!(m.share_of_total, 100.0);
        assert_eq!(m.holiday_rows, 1);
        assert_eq!(m.regular_rows, 1);
    }

    #[test]
    fn zero_baseline_is_guarded() {
        assert_eq!(percent_delta(60.0, 0.0), 0.0);
        let ds = Dataset::new(vec![
            rec(0.0, false, false, false, 100.0),
            rec(60.0, true, true, false, 100.0),
        ]);
        let spec = FilterSpec::default();
        let m = OccupancyMetrics::compute(&spec.apply(&ds), &spec, AggFunc::Sum);
        assert_eq!(m.diff_holiday, 0.0);
        assert_eq!(m.diff_event, 0.0);
    }

    #[test]
    fn empty_view_yields_zeros() {
        let ds = Dataset::new(vec![rec(50.0, false, false, false, 100.0)]);
        let spec = FilterSpec {
            holidays_only: true,
            ..Default::default()
        };
        let view = spec.apply(&ds);
        let m = OccupancyMetrics::compute(&view, &spec, AggFunc::Median);
        assert_eq!(m, OccupancyMetrics::default());
        let info = ViewInfo::of(&view);
        assert_eq!(info.first_date, None);
        assert_eq!(info.hotels, 0);
    }

    #[test]
    fn cancellation_rate_ignores_exclude_toggle() {
        let mut rows: Vec<BookingRecord> = (0..7)
            .map(|_| rec(50.0, false, false, false, 90.0))
            .collect();
        rows.extend((0..3).map(|_| rec(50.0, false, false, true, 90.0)));
        let ds = Dataset::new(rows);

        let shown = FilterSpec::default();
        let hidden = FilterSpec {
            exclude_canceled: true,
            ..Default::default()
        };
        let with = OccupancyMetrics::compute(&shown.apply(&ds), &shown, AggFunc::Mean);
        let without = OccupancyMetrics::compute(&hidden.apply(&ds), &hidden, AggFunc::Mean);
        assert_eq!(with.cancellation_rate, 30.0);
        assert_eq!(without.cancellation_rate, 30.0);
        assert_eq!(with.total_bookings, 10);
        assert_eq!(without.total_bookings, 7);
        assert_eq!(without.share_of_total, 70.0);
    }
}
