use crate::compare::KeySelector;
use crate::kpi::Kpi;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ReportError>;

/// Which side of a year-over-year comparison a failure refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YearSide {
    Current,
    Prior,
}

impl std::fmt::Display for YearSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            YearSide::Current => f.write_str("current year"),
            YearSide::Prior => f.write_str("prior year"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ReportError {
    /// A required raw column is absent from a year's table.
    #[error("missing required field `{field}` in {source_name}")]
    MissingField {
        field: &'static str,
        source_name: String,
    },

    #[error("year {0} is outside the supported calendar range")]
    InvalidYear(i32),

    #[error("offset {offset} from the {year} anchor is outside the supported calendar range")]
    DateOutOfRange { year: i32, offset: i64 },

    #[error("could not parse date `{value}` (expected MM/DD/YYYY)")]
    InvalidDate { value: String },

    #[error("could not parse `{value}` in numeric column `{field}`")]
    InvalidMeasure { field: &'static str, value: String },

    /// The requested day offset / week bucket has no aggregate row.
    #[error("no {side} aggregate row for {key}")]
    NoMatchingKey { side: YearSide, key: KeySelector },

    #[error("KPI {0} was not computed for this aggregate")]
    KpiNotAggregated(Kpi),

    #[error("unknown KPI `{0}`")]
    UnknownKpi(String),

    #[error("row KPIs do not match the table's column schema")]
    SchemaMismatch,

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
