use crate::kpi::{Kpi, Measure};
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::BTreeMap;

/// One event-level record as it appears in a year's CSV export.
///
/// Every field is optional at this stage; the normalizer decides which
/// absences are fatal.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawRow {
    pub date_day: Option<String>,
    pub platform: Option<String>,
    pub campaign_name: Option<String>,
    pub media_spend: Option<String>,
    #[serde(rename = "lc_demand_digital_web_app_adobe")]
    pub demand: Option<String>,
    #[serde(rename = "lc_orders_digital_web_app_adobe")]
    pub orders: Option<String>,
    #[serde(rename = "lc_visits_digital_web_app_adobe")]
    pub visits: Option<String>,
    pub impressions: Option<String>,
    pub clicks: Option<String>,
}

/// Raw column names that must be present in every year's table.
pub const REQUIRED_COLUMNS: [&str; 9] = [
    "date_day",
    "platform",
    "campaign_name",
    "media_spend",
    "lc_demand_digital_web_app_adobe",
    "lc_orders_digital_web_app_adobe",
    "lc_visits_digital_web_app_adobe",
    "impressions",
    "clicks",
];

/// A year's raw rows together with the column names the source provided.
///
/// `RawRow` cannot tell an absent column from an empty cell, so the column
/// list travels with the rows and is checked before normalization.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub columns: Vec<String>,
    pub rows: Vec<RawRow>,
}

impl RawTable {
    pub fn new(columns: Vec<String>, rows: Vec<RawRow>) -> Self {
        Self { columns, rows }
    }

    /// First required column the source did not provide.
    pub fn missing_column(&self) -> Option<&'static str> {
        REQUIRED_COLUMNS
            .into_iter()
            .find(|col| !self.columns.iter().any(|c| c.trim() == *col))
    }
}

/// Summed additive measures for a row or a group of rows.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Measures {
    pub spend: f64,
    pub demand: f64,
    pub orders: f64,
    pub visits: f64,
    pub impressions: f64,
    pub clicks: f64,
}

impl Measures {
    pub fn get(&self, measure: Measure) -> f64 {
        match measure {
            Measure::Spend => self.spend,
            Measure::Demand => self.demand,
            Measure::Orders => self.orders,
            Measure::Visits => self.visits,
            Measure::Impressions => self.impressions,
            Measure::Clicks => self.clicks,
        }
    }

    pub fn add(&mut self, other: &Measures) {
        self.spend += other.spend;
        self.demand += other.demand;
        self.orders += other.orders;
        self.visits += other.visits;
        self.impressions += other.impressions;
        self.clicks += other.clicks;
    }

    pub fn kpi(&self, kpi: Kpi) -> f64 {
        let def = kpi.definition();
        kpi.compute(self.get(def.numerator), self.get(def.denominator))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRow {
    pub date: NaiveDate,
    pub platform: String,
    pub campaign_name: Option<String>,
    pub measures: Measures,
    /// Days from the anchor of the collection's year.
    pub day_offset: i64,
    pub week_bucket: i64,
}

/// Grouping key of an aggregate row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AggregateKey {
    Day { date: NaiveDate, day_offset: i64 },
    Week { week_bucket: i64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct AggregateRow {
    pub key: AggregateKey,
    pub measures: Measures,
    pub kpis: BTreeMap<Kpi, f64>,
}

impl AggregateRow {
    pub fn kpi(&self, kpi: Kpi) -> Option<f64> {
        self.kpis.get(&kpi).copied()
    }
}
