//! Conjunctive row filters and the non-destructive filtered view.
use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::Serialize;

use crate::loader::Dataset;
use crate::types::BookingRecord;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub enum HotelSelection {
    #[default]
    All,
    Named(String),
}

impl HotelSelection {
    /// `all` (any case) selects every hotel.
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("all") {
            Self::All
        } else {
            Self::Named(s.to_string())
        }
    }

    fn matches(&self, hotel: &str) -> bool {
        match self {
            Self::All => true,
            Self::Named(name) => name == hotel,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Request-scoped filter settings.
///
/// Multi-select dimensions are `Option<set>`: `None` leaves the dimension
/// unconstrained, `Some` with an empty set selects nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterSpec {
    pub hotel: HotelSelection,
    pub years: Option<BTreeSet<i32>>,
    pub date_range: Option<DateRange>,
    pub months: Option<BTreeSet<u32>>,
    pub seasons: Option<BTreeSet<String>>,
    pub holidays_only: bool,
    pub events_only: bool,
    pub exclude_canceled: bool,
}

impl FilterSpec {
    pub fn matches(&self, r: &BookingRecord) -> bool {
        self.hotel.matches(&r.hotel)
            && self.years.as_ref().map_or(true, |ys| ys.contains(&r.year))
            && self.date_range.map_or(true, |range| range.contains(r.arrival_date))
            && self.months.as_ref().map_or(true, |ms| ms.contains(&r.month))
            && self.seasons.as_ref().map_or(true, |ss| ss.contains(&r.season))
            && (!self.holidays_only || r.is_holiday)
            && (!self.events_only || r.is_event_day)
            && (!self.exclude_canceled || !r.is_canceled)
    }

    /// Same spec with the exclude-canceled toggle off; the population the
    /// cancellation rate is measured against.
    pub fn without_cancel_exclusion(&self) -> Self {
        Self {
            exclude_canceled: false,
            ..self.clone()
        }
    }

    pub fn apply<'a>(&self, dataset: &'a Dataset) -> FilteredView<'a> {
        let indices: Vec<usize> = dataset
            .records()
            .iter()
            .enumerate()
            .filter(|(_, r)| self.matches(r))
            .map(|(i, _)| i)
            .collect();
        tracing::debug!(
            input = dataset.len(),
            output = indices.len(),
            "applied filters"
        );
        FilteredView { dataset, indices }
    }

    /// Narrow an existing view further.
    pub fn refine<'a>(&self, view: &FilteredView<'a>) -> FilteredView<'a> {
        let indices = view
            .indices
            .iter()
            .copied()
            .filter(|&i| self.matches(&view.dataset.records()[i]))
            .collect();
        FilteredView {
            dataset: view.dataset,
            indices,
        }
    }
}

/// Row positions of a dataset that survived a filter, in dataset order.
#[derive(Debug, Clone)]
pub struct FilteredView<'a> {
    dataset: &'a Dataset,
    indices: Vec<usize>,
}

impl<'a> FilteredView<'a> {
    pub fn dataset(&self) -> &'a Dataset {
        self.dataset
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = &'a BookingRecord> + '_ {
        let records = self.dataset.records();
        self.indices.iter().map(move |&i| &records[i])
    }

    pub fn to_records(&self) -> Vec<BookingRecord> {
        self.records().cloned().collect()
    }
}
