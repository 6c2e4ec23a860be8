//! One request-scoped pass: filter, aggregate, derive, describe.
use serde::Serialize;

use crate::aggregate::{self, AggFunc, Heatmap};
use crate::filter::{FilterSpec, FilteredView};
use crate::insight::Insights;
use crate::loader::Dataset;
use crate::metrics::{OccupancyMetrics, ViewInfo};
use crate::reports::{self, EventSummary};
use crate::types::{
    ComparisonRow, DailyRow, DistributionRow, MonthlyRow, SeasonRow, TopDayRow, WeekdayRow,
};

pub const DEFAULT_TOP_N: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryConfig {
    pub filters: FilterSpec,
    pub agg: AggFunc,
    pub top_n: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            filters: FilterSpec::default(),
            agg: AggFunc::default(),
            top_n: DEFAULT_TOP_N,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub agg: AggFunc,
    pub info: ViewInfo,
    pub metrics: OccupancyMetrics,
    pub insights: Insights,
    pub daily: Vec<DailyRow>,
    pub monthly: Vec<MonthlyRow>,
    pub seasonal: Vec<SeasonRow>,
    pub weekday: Vec<WeekdayRow>,
    pub heatmap: Heatmap,
    pub distribution: Vec<DistributionRow>,
    pub holiday_comparison: Vec<ComparisonRow>,
    pub event_comparison: Vec<ComparisonRow>,
    pub top_holidays: Vec<TopDayRow>,
    pub top_events: Vec<TopDayRow>,
    pub event_summary: EventSummary,
}

/// Either a full report or the explicit "nothing matched" state.
#[derive(Debug)]
pub enum QueryOutcome<'a> {
    NoData,
    Report {
        view: FilteredView<'a>,
        report: Box<Report>,
    },
}

pub fn run<'a>(dataset: &'a Dataset, query: &QueryConfig) -> QueryOutcome<'a> {
    let view = query.filters.apply(dataset);
    if view.is_empty() {
        tracing::warn!(rows = dataset.len(), "no rows match the selected filters");
        return QueryOutcome::NoData;
    }
    let report = build_report(&view, query);
    QueryOutcome::Report {
        view,
        report: Box::new(report),
    }
}

fn build_report(view: &FilteredView<'_>, query: &QueryConfig) -> Report {
    let agg = query.agg;
    let metrics = OccupancyMetrics::compute(view, &query.filters, agg);
    let insights = Insights::from_metrics(&metrics);
    let (holiday_comparison, event_comparison) = reports::comparisons(&metrics);
    tracing::debug!(rows = view.len(), %agg, "building report");

    Report {
        agg,
        info: ViewInfo::of(view),
        daily: aggregate::daily(view, agg),
        monthly: aggregate::monthly(view, agg),
        seasonal: aggregate::seasonal(view, agg),
        weekday: aggregate::by_weekday(view, agg),
        heatmap: aggregate::heatmap(view, agg),
        distribution: aggregate::distribution(view),
        holiday_comparison,
        event_comparison,
        top_holidays: reports::top_holidays(view, query.top_n),
        top_events: reports::top_events(view, query.top_n),
        event_summary: reports::event_summary(view, agg),
        metrics,
        insights,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BookingRecord, NO_EVENT};
    use chrono::NaiveDate;

    fn dataset() -> Dataset {
        let base = NaiveDate::from_ymd_opt(2017, 1, 2).unwrap();
        Dataset::new(
            (0..14)
                .map(|i| BookingRecord {
                    hotel: if i % 2 == 0 { "City Hotel" } else { "Resort Hotel" }.into(),
                    arrival_date: base + chrono::Days::new(i),
                    year: 2017,
                    month: 1,
                    season: "Winter".into(),
                    occupancy_per_hari: 30.0 + i as f64,
                    is_holiday: i == 5,
                    is_event_day: i == 9,
                    is_canceled: i == 3,
                    adr: 100.0,
                    total_tamu: 2,
                    name: NO_EVENT.into(),
                })
                .collect(),
        )
    }

    #[test]
    fn no_match_is_no_data() {
        let ds = dataset();
        let query = QueryConfig {
            filters: FilterSpec {
                seasons: Some(["Summer".to_string()].into_iter().collect()),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(matches!(run(&ds, &query), QueryOutcome::NoData));
    }

    #[test]
    fn full_report() {
        let ds = dataset();
        let query = QueryConfig {
            filters: FilterSpec {
                exclude_canceled: true,
                ..Default::default()
            },
            agg: AggFunc::Sum,
            top_n: 3,
        };
        let QueryOutcome::Report { view, report } = run(&ds, &query) else {
            panic!("expected a report");
        };
        assert_eq!(view.len(), 13);
        assert_eq!(report.metrics.total_bookings, 13);
        assert_eq!(report.daily.len(), 13);
        assert_eq!(report.weekday.len(), 7);
        assert_eq!(report.monthly.len(), 1);
        assert_eq!(report.info.hotels, 2);
        assert_eq!(report.top_holidays.len(), 1);
        assert_eq!(report.event_summary.total, 2);
        assert_eq!(report.agg, AggFunc::Sum);
        let weekday_total: f64 = report.weekday.iter().map(|w| w.occupancy).sum();
        assert_eq!(weekday_total, report.monthly[0].occupancy);
    }
}
