// Entry point and high-level CLI flow.
//
// One invocation builds one report:
// - loads `<year>.csv` for the report year and the year before,
// - compares the report date against the same Black Friday offset last year,
// - prints the text message and table previews,
// - and only then writes the text file and CSV tables.
mod aggregate;
mod calendar;
mod compare;
mod error;
mod filter;
mod kpi;
mod loader;
mod output;
mod pipeline;
mod render;
mod types;
mod util;

use anyhow::Context;
use chrono::{Duration, Local, NaiveDate};
use clap::Parser;
use loader::CsvTableLoader;
use output::{preview_table, FileSink, MemorySink};
use pipeline::{Pipeline, ReportConfig, WeeklyMode};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "bf_yoy_report")]
#[command(about = "Black Friday aligned year-over-year KPI report")]
#[command(version)]
struct Cli {
    /// Day to report on (YYYY-MM-DD); defaults to yesterday
    #[arg(long, env = "BF_YOY__DATE")]
    date: Option<NaiveDate>,

    /// Directory holding `<year>.csv` exports
    #[arg(long, env = "BF_YOY__DATA_DIR", default_value = ".")]
    data_dir: PathBuf,

    /// Directory the report files are written to
    #[arg(long, env = "BF_YOY__OUT_DIR", default_value = ".")]
    out_dir: PathBuf,

    /// Platform broken out below the all-up numbers
    #[arg(long, env = "BF_YOY__PLATFORM", default_value = "meta")]
    platform: String,

    /// Campaign-name keyword of the always-present campaign segment
    #[arg(long, env = "BF_YOY__DYNAMIC_KEYWORD", default_value = "dynamic")]
    dynamic_keyword: String,

    /// Campaign-name keyword of the optional promo segment
    #[arg(long, env = "BF_YOY__PROMO_KEYWORD", default_value = "promo")]
    promo_keyword: String,

    /// Leave the promo segment out
    #[arg(long, default_value_t = false)]
    no_promo: bool,

    /// KPI columns of the exported tables
    #[arg(long, env = "BF_YOY__KPIS", default_value = "ROAS,CPV,CVR,AOV,CPM,CPC")]
    kpis: String,

    /// KPIs listed in the text message
    #[arg(long, env = "BF_YOY__TOPLINE_KPIS", default_value = "ROAS,CPV,CPM")]
    topline_kpis: String,

    /// When to build the weekly table
    #[arg(long, value_enum, env = "BF_YOY__WEEKLY", default_value_t = WeeklyMode::Auto)]
    weekly: WeeklyMode,

    /// Link to the weekly sheet, shown in the Monday note
    #[arg(long, env = "BF_YOY__WEEKLY_SHEET_URL")]
    weekly_sheet_url: Option<String>,

    /// Build and print the report without writing any files
    #[arg(long, default_value_t = false)]
    dry_run: bool,
}

impl Cli {
    fn into_config(self) -> anyhow::Result<RunOptions> {
        let report_date = self
            .date
            .unwrap_or_else(|| Local::now().date_naive() - Duration::days(1));
        let config = ReportConfig {
            report_date,
            platform: self.platform,
            dynamic_keyword: self.dynamic_keyword,
            promo_keyword: (!self.no_promo).then_some(self.promo_keyword),
            kpis: kpi::parse_kpi_list(&self.kpis).context("invalid --kpis")?,
            topline_kpis: kpi::parse_kpi_list(&self.topline_kpis)
                .context("invalid --topline-kpis")?,
            weekly: self.weekly,
            weekly_sheet_url: self.weekly_sheet_url,
        };
        Ok(RunOptions {
            config,
            data_dir: self.data_dir,
            out_dir: self.out_dir,
            dry_run: self.dry_run,
        })
    }
}

struct RunOptions {
    config: ReportConfig,
    data_dir: PathBuf,
    out_dir: PathBuf,
    dry_run: bool,
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout carries only the report.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bf_yoy_report=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let RunOptions {
        config,
        data_dir,
        out_dir,
        dry_run,
    } = Cli::parse().into_config()?;
    info!(
        report_date = %config.report_date,
        data_dir = %data_dir.display(),
        "starting report"
    );

    let loader = CsvTableLoader::new(&data_dir);
    let pipeline = Pipeline::load(config, &loader)
        .with_context(|| format!("failed to load exports from {}", data_dir.display()))?;
    let bundle = pipeline.run().context("failed to build report")?;

    print!("{}", bundle.text.render());
    println!();
    println!("Daily metrics:");
    println!("{}\n", preview_table(&bundle.daily, 3));
    if let Some(weekly) = &bundle.weekly {
        println!("Weekly metrics:");
        println!("{}\n", preview_table(weekly, 3));
    }

    if dry_run {
        let mut sink = MemorySink::default();
        bundle.write_to(&mut sink)?;
        info!(
            texts = sink.texts.len(),
            tables = sink.tables.len(),
            "dry run, nothing written"
        );
        return Ok(());
    }

    let mut sink = FileSink::new(&out_dir);
    bundle
        .write_to(&mut sink)
        .with_context(|| format!("failed to write report to {}", out_dir.display()))?;
    info!(
        rows = %util::format_int(bundle.daily.rows().len()),
        out_dir = %out_dir.display(),
        "report complete"
    );
    Ok(())
}
