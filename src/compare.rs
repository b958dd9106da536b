use crate::error::{ReportError, Result, YearSide};
use crate::kpi::Kpi;
use crate::types::{AggregateKey, AggregateRow};
use std::fmt;

/// Which aggregate row to compare across years.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySelector {
    DayOffset(i64),
    WeekBucket(i64),
}

impl KeySelector {
    fn matches(self, key: &AggregateKey) -> bool {
        match (self, key) {
            (KeySelector::DayOffset(o), AggregateKey::Day { day_offset, .. }) => *day_offset == o,
            (KeySelector::WeekBucket(b), AggregateKey::Week { week_bucket }) => *week_bucket == b,
            _ => false,
        }
    }
}

impl fmt::Display for KeySelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeySelector::DayOffset(o) => write!(f, "day offset {o}"),
            KeySelector::WeekBucket(b) => write!(f, "week bucket {b}"),
        }
    }
}

/// Year-over-year change for one KPI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeOutcome {
    /// Percent change truncated toward zero.
    Percent(i64),
    NoDataLastYear,
    NoDataThisYear,
}

impl fmt::Display for ChangeOutcome {
    /// `+13% YoY`, `-4% YoY`, `0% YoY`, or the bare sentinel text.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeOutcome::Percent(p) if *p > 0 => write!(f, "+{p}% YoY"),
            ChangeOutcome::Percent(p) => write!(f, "{p}% YoY"),
            ChangeOutcome::NoDataLastYear => f.write_str("no data for last year"),
            ChangeOutcome::NoDataThisYear => f.write_str("no data for this year"),
        }
    }
}

/// `(current - prior) / prior * 100`, truncated toward zero.
///
/// A prior value of zero, infinity or NaN yields [`ChangeOutcome::NoDataLastYear`];
/// otherwise a current value of zero or NaN yields [`ChangeOutcome::NoDataThisYear`].
pub fn percent_change(current: f64, prior: f64) -> ChangeOutcome {
    if prior == 0.0 || !prior.is_finite() {
        return ChangeOutcome::NoDataLastYear;
    }
    if current == 0.0 || current.is_nan() {
        return ChangeOutcome::NoDataThisYear;
    }
    // `as` saturates, so an infinite current value pins to i64::MAX.
    ChangeOutcome::Percent(((current - prior) / prior * 100.0).trunc() as i64)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KpiComparison {
    pub kpi: Kpi,
    pub current: f64,
    pub prior: f64,
    pub change: ChangeOutcome,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub key: KeySelector,
    pub kpis: Vec<KpiComparison>,
}

impl Comparison {
    pub fn kpi_list(&self) -> Vec<Kpi> {
        self.kpis.iter().map(|c| c.kpi).collect()
    }
}

fn select<'a>(rows: &'a [AggregateRow], key: KeySelector, side: YearSide) -> Result<&'a AggregateRow> {
    rows.iter()
        .find(|r| key.matches(&r.key))
        .ok_or(ReportError::NoMatchingKey { side, key })
}

/// Compare the current and prior aggregate rows selected by `key`.
///
/// A missing row on either side is an error: it means the wrong day or week
/// was requested.
pub fn compare(
    current: &[AggregateRow],
    prior: &[AggregateRow],
    kpis: &[Kpi],
    key: KeySelector,
) -> Result<Comparison> {
    let cur = select(current, key, YearSide::Current)?;
    let prev = select(prior, key, YearSide::Prior)?;

    let kpis = kpis
        .iter()
        .map(|&kpi| {
            let current = cur.kpi(kpi).ok_or(ReportError::KpiNotAggregated(kpi))?;
            let prior = prev.kpi(kpi).ok_or(ReportError::KpiNotAggregated(kpi))?;
            Ok(KpiComparison {
                kpi,
                current,
                prior,
                change: percent_change(current, prior),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Comparison { key, kpis })
}
