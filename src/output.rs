use crate::error::Result;
use crate::render::MetricTable;
use std::path::PathBuf;
use tabled::{builder::Builder, settings::Style};
use tracing::info;

/// Destination for rendered reports.
pub trait ReportSink {
    fn write_text(&mut self, name: &str, text: &str) -> Result<()>;
    fn write_table(&mut self, name: &str, table: &MetricTable) -> Result<()>;
}

/// Writes text blocks verbatim and tables as CSV under `out_dir`.
#[derive(Debug, Clone)]
pub struct FileSink {
    out_dir: PathBuf,
}

impl FileSink {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }
}

impl ReportSink for FileSink {
    fn write_text(&mut self, name: &str, text: &str) -> Result<()> {
        let path = self.out_dir.join(name);
        std::fs::write(&path, text)?;
        info!(path = %path.display(), "wrote text report");
        Ok(())
    }

    fn write_table(&mut self, name: &str, table: &MetricTable) -> Result<()> {
        let path = self.out_dir.join(name);
        let mut wtr = csv::Writer::from_path(&path)?;
        wtr.write_record(table.header())?;
        for record in table.records() {
            wtr.write_record(&record)?;
        }
        wtr.flush()?;
        info!(path = %path.display(), rows = table.rows().len(), "wrote metrics table");
        Ok(())
    }
}

/// Keeps everything in memory; handy for tests and dry runs.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pub texts: Vec<(String, String)>,
    pub tables: Vec<(String, MetricTable)>,
}

impl ReportSink for MemorySink {
    fn write_text(&mut self, name: &str, text: &str) -> Result<()> {
        self.texts.push((name.to_string(), text.to_string()));
        Ok(())
    }

    fn write_table(&mut self, name: &str, table: &MetricTable) -> Result<()> {
        self.tables.push((name.to_string(), table.clone()));
        Ok(())
    }
}

/// Markdown rendering of the first `max_rows` rows, for console previews.
pub fn preview_table(table: &MetricTable, max_rows: usize) -> String {
    if table.is_empty() {
        return "(no rows)".to_string();
    }
    let mut builder = Builder::default();
    builder.push_record(table.header());
    for record in table.records().into_iter().take(max_rows) {
        builder.push_record(record);
    }
    let mut t = builder.build();
    t.with(Style::markdown());
    t.to_string()
}
