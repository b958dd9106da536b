// Static KPI catalog.
//
// Each KPI is a quotient of two additive measures with a fixed scale factor
// and display style. Aggregation and rendering both read from this table, so
// adding a KPI means adding one variant and one `definition` arm.
use crate::error::ReportError;
use std::fmt;
use std::str::FromStr;

/// Additive raw measures; these are the only columns ever summed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Measure {
    Spend,
    Demand,
    Orders,
    Visits,
    Impressions,
    Clicks,
}

/// How a KPI's actual value is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayStyle {
    /// `$4.56`
    Currency,
    /// `1.23%`
    Percent,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KpiDefinition {
    pub numerator: Measure,
    pub denominator: Measure,
    pub scale: f64,
    pub style: DisplayStyle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Kpi {
    Roas,
    Cpv,
    Cvr,
    Aov,
    Cpm,
    Cpc,
    Ctr,
}

impl Kpi {
    pub const ALL: [Kpi; 7] = [
        Kpi::Roas,
        Kpi::Cpv,
        Kpi::Cvr,
        Kpi::Aov,
        Kpi::Cpm,
        Kpi::Cpc,
        Kpi::Ctr,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Kpi::Roas => "ROAS",
            Kpi::Cpv => "CPV",
            Kpi::Cvr => "CVR",
            Kpi::Aov => "AOV",
            Kpi::Cpm => "CPM",
            Kpi::Cpc => "CPC",
            Kpi::Ctr => "CTR",
        }
    }

    pub fn definition(self) -> KpiDefinition {
        use DisplayStyle::*;
        use Measure::*;
        let (numerator, denominator, scale, style) = match self {
            Kpi::Roas => (Demand, Spend, 1.0, Currency),
            Kpi::Cpv => (Spend, Visits, 1.0, Currency),
            Kpi::Cvr => (Orders, Visits, 1.0, Percent),
            Kpi::Aov => (Demand, Orders, 1.0, Currency),
            Kpi::Cpm => (Spend, Impressions, 1000.0, Currency),
            Kpi::Cpc => (Spend, Clicks, 1.0, Currency),
            Kpi::Ctr => (Clicks, Impressions, 100.0, Percent),
        };
        KpiDefinition {
            numerator,
            denominator,
            scale,
            style,
        }
    }

    /// Computes the KPI from summed measures.
    ///
    /// Zero denominators are not guarded: the result is `inf` or `NaN` and is
    /// resolved later by the comparison step.
    pub fn compute(self, numerator: f64, denominator: f64) -> f64 {
        numerator / denominator * self.definition().scale
    }

    pub fn style(self) -> DisplayStyle {
        self.definition().style
    }
}

impl fmt::Display for Kpi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Kpi {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Kpi::ALL
            .into_iter()
            .find(|k| k.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ReportError::UnknownKpi(wanted.to_string()))
    }
}

/// Parses a comma-separated KPI list such as `ROAS,CPV,CPM`.
pub fn parse_kpi_list(s: &str) -> Result<Vec<Kpi>, ReportError> {
    s.split(',')
        .filter(|part| !part.trim().is_empty())
        .map(Kpi::from_str)
        .collect()
}
