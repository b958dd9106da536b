// Text and table rendering of comparisons.
//
// Nothing here touches the filesystem; the pipeline collects rendered output
// and hands it to a `ReportSink` only once every line has rendered.
use crate::calendar::relation_to_anchor;
use crate::compare::{Comparison, KpiComparison};
use crate::error::{ReportError, Result};
use crate::kpi::{DisplayStyle, Kpi};
use crate::util::format_2dp;
use chrono::NaiveDate;

/// `$4.55` for currency-style KPIs, `2.50%` for rate-style ones.
pub fn format_actual(kpi: Kpi, value: f64) -> String {
    match kpi.style() {
        DisplayStyle::Currency => format!("${}", format_2dp(value)),
        DisplayStyle::Percent => format!("{}%", format_2dp(value)),
    }
}

/// `ROAS Actual $4.55, +13% YoY`
pub fn metric_line(c: &KpiComparison) -> String {
    format!(
        "{} Actual {}, {}",
        c.kpi,
        format_actual(c.kpi, c.current),
        c.change
    )
}

/// Line-oriented report for chat delivery.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextReport {
    lines: Vec<String>,
}

impl TextReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Two header lines naming the report date and the prior-year comp date.
    pub fn push_header(&mut self, report_date: NaiveDate, comp_date: NaiveDate, day_offset: i64) {
        self.lines.push(format!(
            "Reporting for {} {}, {} days {} Black Friday.",
            report_date.format("%a"),
            report_date,
            day_offset.abs(),
            relation_to_anchor(day_offset)
        ));
        self.lines
            .push(format!("(Comping with {} {})", comp_date.format("%a"), comp_date));
    }

    pub fn push_section(&mut self, title: &str) {
        self.lines.push(String::new());
        self.lines.push(format!(" *=== {title} ===* "));
    }

    pub fn push_line(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    pub fn push_comparison(&mut self, comparison: &Comparison) {
        self.lines.extend(comparison.kpis.iter().map(metric_line));
    }

    #[cfg(test)]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn render(&self) -> String {
        let mut out = self.lines.join("\n");
        out.push('\n');
        out
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    pub label: String,
    /// `(actual, yoy)` per KPI, in the table's column order.
    pub cells: Vec<(String, String)>,
}

/// Tabular export: one row per segment, an `{actual, YoY}` column pair per KPI.
///
/// The column set is fixed by the KPI list given at creation; rows built from
/// a different KPI list are rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricTable {
    kpis: Vec<Kpi>,
    rows: Vec<TableRow>,
}

impl MetricTable {
    pub fn new(kpis: Vec<Kpi>) -> Self {
        Self {
            kpis,
            rows: Vec::new(),
        }
    }

    pub fn rows(&self) -> &[TableRow] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn append(&mut self, label: impl Into<String>, comparison: &Comparison) -> Result<()> {
        if comparison.kpi_list() != self.kpis {
            return Err(ReportError::SchemaMismatch);
        }
        let cells = comparison
            .kpis
            .iter()
            .map(|c| (format_actual(c.kpi, c.current), c.change.to_string()))
            .collect();
        self.rows.push(TableRow {
            label: label.into(),
            cells,
        });
        Ok(())
    }

    /// Header row: an empty label column, then `KPI`, `KPI YoY` pairs.
    pub fn header(&self) -> Vec<String> {
        std::iter::once(String::new())
            .chain(
                self.kpis
                    .iter()
                    .flat_map(|k| [k.name().to_string(), format!("{} YoY", k.name())]),
            )
            .collect()
    }

    pub fn records(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| {
                std::iter::once(row.label.clone())
                    .chain(row.cells.iter().flat_map(|(a, y)| [a.clone(), y.clone()]))
                    .collect()
            })
            .collect()
    }
}
