//! Canned insight sentences derived from the percentage deltas.
use serde::Serialize;

use crate::metrics::OccupancyMetrics;

/// Deltas above this many percent count as a strong effect.
pub const STRONG_THRESHOLD: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Band {
    StronglyPositive,
    MildlyPositive,
    Negative,
    Neutral,
}

impl Band {
    /// Total over every `f64`; NaN lands in `Neutral`.
    pub fn classify(diff: f64) -> Self {
        if diff > STRONG_THRESHOLD {
            Self::StronglyPositive
        } else if diff > 0.0 {
            Self::MildlyPositive
        } else if diff < 0.0 {
            Self::Negative
        } else {
            Self::Neutral
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insights {
    pub holiday_band: Band,
    pub holiday: String,
    pub event_band: Band,
    pub event: String,
    pub cancellation: String,
}

pub fn holiday_sentence(holiday: f64, normal: f64, diff: f64) -> String {
    match Band::classify(diff) {
        Band::StronglyPositive => format!(
            "Holiday occupancy is {holiday:.2}%, which is {diff:+.1}% higher than regular days \
             ({normal:.2}%). Prioritize promotions during holidays."
        ),
        Band::MildlyPositive => format!(
            "Holiday occupancy ({holiday:.2}%) is slightly higher ({diff:+.1}%) than regular \
             days ({normal:.2}%)."
        ),
        Band::Negative => format!(
            "Holiday occupancy ({holiday:.2}%) is lower ({diff:+.1}%) than regular days \
             ({normal:.2}%). The holiday strategy needs review."
        ),
        Band::Neutral => {
            "Holiday and regular-day occupancy are roughly the same.".to_string()
        }
    }
}

pub fn event_sentence(event: f64, no_event: f64, diff: f64) -> String {
    match Band::classify(diff) {
        Band::StronglyPositive => format!(
            "Event days reach {event:.2}% occupancy, {diff:+.1}% higher than days without \
             events ({no_event:.2}%). Events are very effective at filling rooms."
        ),
        Band::MildlyPositive => format!(
            "Event-day occupancy ({event:.2}%) is slightly higher ({diff:+.1}%) than non-event \
             days ({no_event:.2}%)."
        ),
        Band::Negative => format!(
            "Event days ({event:.2}%) show a drop in occupancy ({diff:+.1}%) compared to days \
             without events ({no_event:.2}%). Check which events underperform."
        ),
        Band::Neutral => "Event-day and non-event-day occupancy are roughly the same.".to_string(),
    }
}

pub fn cancellation_sentence(rate: f64) -> String {
    format!(
        "With a cancellation rate of {rate:.1}%, management should review booking and deposit \
         policies to reduce losses."
    )
}

impl Insights {
    pub fn from_metrics(m: &OccupancyMetrics) -> Self {
        Self {
            holiday_band: Band::classify(m.diff_holiday),
            holiday: holiday_sentence(m.occupancy_holiday, m.occupancy_normal, m.diff_holiday),
            event_band: Band::classify(m.diff_event),
            event: event_sentence(m.occupancy_event, m.occupancy_no_event, m.diff_event),
            cancellation: cancellation_sentence(m.cancellation_rate),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn band_boundaries() {
        assert_eq!(Band::classify(5.1), Band::StronglyPositive);
        assert_eq!(Band::classify(5.0), Band::MildlyPositive);
        assert_eq!(Band::classify(0.01), Band::MildlyPositive);
        assert_eq!(Band::classify(0.0), Band::Neutral);
        assert_eq!(Band::classify(-0.01), Band::Negative);
        assert_eq!(Band::classify(f64::NAN), Band::Neutral);
        assert_eq!(Band::classify(f64::INFINITY), Band::StronglyPositive);
    }

    #[test]
    fn holiday_sentences_carry_values() {
        let s = holiday_sentence(60.0, 40.0, 50.0);
        assert!(s.contains("60.00%"));
        assert!(s.contains("+50.0%"));
        assert!(s.contains("40.00%"));
        assert!(s.contains("Prioritize"));

        let s = holiday_sentence(38.0, 40.0, -5.0);
        assert!(s.contains("-5.0%"));
        assert!(s.contains("needs review"));
    }

    #[test]
    fn event_sentences_by_band() {
        assert!(event_sentence(41.0, 40.0, 2.5).contains("slightly higher"));
        assert!(event_sentence(40.0, 40.0, 0.0).contains("roughly the same"));
    }

    #[test]
    fn empty_metrics_do_not_panic() {
        let insights = Insights::from_metrics(&OccupancyMetrics::default());
        assert_eq!(insights.holiday_band, Band::Neutral);
        assert_eq!(insights.event_band, Band::Neutral);
        assert!(insights.cancellation.contains("0.0%"));
    }
}
