use crate::calendar::{to_offset, week_bucket};
use crate::error::{ReportError, Result};
use crate::types::{Measures, NormalizedRow, RawRow, RawTable};
use crate::util::{non_empty, parse_date_safe, parse_measure};
use csv::ReaderBuilder;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Source of raw rows for one year.
///
/// Implementations report the column names they actually provide; the
/// required-column check happens in `normalize_rows`, whatever the source.
pub trait TableLoader {
    fn load(&self, source: &str) -> Result<RawTable>;
}

/// Conventional source identifier for a year's export.
pub fn source_for_year(year: i32) -> String {
    format!("{year}.csv")
}

/// Reads `<data_dir>/<source>` as a CSV export with a header row.
#[derive(Debug, Clone)]
pub struct CsvTableLoader {
    data_dir: PathBuf,
}

impl CsvTableLoader {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }
}

impl TableLoader for CsvTableLoader {
    fn load(&self, source: &str) -> Result<RawTable> {
        let path = self.data_dir.join(source);
        let mut rdr = ReaderBuilder::new().flexible(true).from_path(&path)?;
        let columns: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();

        let mut rows = Vec::new();
        let mut skipped = 0usize;
        for result in rdr.deserialize::<RawRow>() {
            match result {
                Ok(row) => rows.push(row),
                Err(e) => {
                    skipped += 1;
                    debug!(source, error = %e, "skipping unreadable record");
                }
            }
        }
        if skipped > 0 {
            warn!(source, skipped, "some records could not be read");
        }
        Ok(RawTable::new(columns, rows))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub total_rows: usize,
    pub normalized_rows: usize,
    pub parse_errors: usize,
}

/// Normalize a single raw row against `year`'s anchor.
///
/// The anchor year is always the collection's year, even for rows whose date
/// falls in a neighbouring calendar year. Callers must have checked the
/// table's columns: an absent measure cell here is an empty one.
fn normalize_row(raw: &RawRow, year: i32, source_name: &str) -> Result<NormalizedRow> {
    let missing = |field: &'static str| ReportError::MissingField {
        field,
        source_name: source_name.to_string(),
    };

    let date_text = non_empty(raw.date_day.as_deref()).ok_or_else(|| missing("date_day"))?;
    let date = parse_date_safe(Some(date_text)).ok_or_else(|| ReportError::InvalidDate {
        value: date_text.to_string(),
    })?;
    let platform = non_empty(raw.platform.as_deref())
        .ok_or_else(|| missing("platform"))?
        .to_string();

    let measure = |field: &'static str, cell: &Option<String>| {
        parse_measure(cell.as_deref()).ok_or_else(|| ReportError::InvalidMeasure {
            field,
            value: cell.clone().unwrap_or_default(),
        })
    };
    let measures = Measures {
        spend: measure("media_spend", &raw.media_spend)?,
        demand: measure("lc_demand_digital_web_app_adobe", &raw.demand)?,
        orders: measure("lc_orders_digital_web_app_adobe", &raw.orders)?,
        visits: measure("lc_visits_digital_web_app_adobe", &raw.visits)?,
        impressions: measure("impressions", &raw.impressions)?,
        clicks: measure("clicks", &raw.clicks)?,
    };

    let day_offset = to_offset(date, year)?;
    Ok(NormalizedRow {
        date,
        platform,
        campaign_name: non_empty(raw.campaign_name.as_deref()).map(str::to_string),
        measures,
        day_offset,
        week_bucket: week_bucket(day_offset),
    })
}

/// Normalize a whole year's rows.
///
/// Structural problems (missing column or field, bad date) abort the
/// collection. Rows with an unparseable numeric cell are skipped and counted.
pub fn normalize_rows(
    table: &RawTable,
    year: i32,
    source_name: &str,
) -> Result<(Vec<NormalizedRow>, LoadReport)> {
    if let Some(field) = table.missing_column() {
        return Err(ReportError::MissingField {
            field,
            source_name: source_name.to_string(),
        });
    }

    let raw = &table.rows;
    let mut rows = Vec::with_capacity(raw.len());
    let mut parse_errors = 0usize;
    for r in raw {
        match normalize_row(r, year, source_name) {
            Ok(row) => rows.push(row),
            Err(ReportError::InvalidMeasure { field, value }) => {
                parse_errors += 1;
                debug!(source_name, field, value = %value, "skipping row with bad measure");
            }
            Err(e) => return Err(e),
        }
    }
    let report = LoadReport {
        total_rows: raw.len(),
        normalized_rows: rows.len(),
        parse_errors,
    };
    Ok((rows, report))
}
