// One report run: load both years, build segments, compare, render.
//
// State is threaded explicitly through `Pipeline`; the rendered `ReportBundle`
// is only handed to a sink after every segment rendered without error, so a
// failing run writes nothing.
use crate::aggregate::{by_day, by_week};
use crate::calendar::{from_offset, to_offset, week_bucket};
use crate::compare::{compare, Comparison, KeySelector};
use crate::error::Result;
use crate::filter::{by_campaign_keyword, by_platform};
use crate::kpi::Kpi;
use crate::loader::{normalize_rows, source_for_year, TableLoader};
use crate::output::ReportSink;
use crate::render::{MetricTable, TextReport};
use crate::types::NormalizedRow;
use chrono::{Datelike, NaiveDate, Weekday};
use tracing::{debug, info};

pub const TEXT_REPORT_FILE: &str = "slack_message.txt";
pub const DAILY_TABLE_FILE: &str = "full_metrics.csv";
pub const WEEKLY_TABLE_FILE: &str = "full_metrics_weekly.csv";

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum WeeklyMode {
    /// Only when the report date is a Sunday (i.e. the run happens on Monday).
    Auto,
    Always,
    Never,
}

#[derive(Debug, Clone)]
pub struct ReportConfig {
    pub report_date: NaiveDate,
    pub platform: String,
    pub dynamic_keyword: String,
    /// `None` disables the promo segment entirely.
    pub promo_keyword: Option<String>,
    /// Columns of the exported tables.
    pub kpis: Vec<Kpi>,
    /// KPIs listed in the text message.
    pub topline_kpis: Vec<Kpi>,
    pub weekly: WeeklyMode,
    pub weekly_sheet_url: Option<String>,
}

impl ReportConfig {
    pub fn current_year(&self) -> i32 {
        self.report_date.year()
    }

    pub fn prior_year(&self) -> i32 {
        self.current_year() - 1
    }

    fn is_monday_run(&self) -> bool {
        self.report_date.weekday() == Weekday::Sun
    }

    pub fn weekly_enabled(&self) -> bool {
        match self.weekly {
            WeeklyMode::Auto => self.is_monday_run(),
            WeeklyMode::Always => true,
            WeeklyMode::Never => false,
        }
    }

    /// Every KPI either output needs, in catalog order.
    fn all_kpis(&self) -> Vec<Kpi> {
        let mut all: Vec<Kpi> = self.kpis.iter().chain(&self.topline_kpis).copied().collect();
        all.sort();
        all.dedup();
        all
    }
}

/// A named slice of both years' rows.
#[derive(Debug, Clone)]
struct Segment {
    /// Row label prefix in the exported tables, e.g. `META DYNAMIC`.
    label: String,
    /// Section title in the text message.
    title: String,
    current: Vec<NormalizedRow>,
    prior: Vec<NormalizedRow>,
    /// Optional segments are skipped with a note when the current year is empty.
    optional: bool,
}

#[derive(Debug, Clone)]
pub struct ReportBundle {
    pub text: TextReport,
    pub daily: MetricTable,
    pub weekly: Option<MetricTable>,
}

impl ReportBundle {
    pub fn write_to(&self, sink: &mut dyn ReportSink) -> Result<()> {
        sink.write_text(TEXT_REPORT_FILE, &self.text.render())?;
        sink.write_table(DAILY_TABLE_FILE, &self.daily)?;
        if let Some(weekly) = &self.weekly {
            sink.write_table(WEEKLY_TABLE_FILE, weekly)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct Pipeline {
    config: ReportConfig,
    current: Vec<NormalizedRow>,
    prior: Vec<NormalizedRow>,
}

impl Pipeline {
    pub fn new(config: ReportConfig, current: Vec<NormalizedRow>, prior: Vec<NormalizedRow>) -> Self {
        Self {
            config,
            current,
            prior,
        }
    }

    /// Loads and normalizes `<year>.csv` for the current and prior year.
    pub fn load(config: ReportConfig, loader: &dyn TableLoader) -> Result<Self> {
        let current = load_year(loader, config.current_year())?;
        let prior = load_year(loader, config.prior_year())?;
        Ok(Self::new(config, current, prior))
    }

    fn segments(&self) -> Vec<Segment> {
        let cfg = &self.config;
        let platform_label = cfg.platform.to_uppercase();
        let current_platform = by_platform(&self.current, &cfg.platform);
        let prior_platform = by_platform(&self.prior, &cfg.platform);

        let mut segments = vec![
            Segment {
                label: "ALLUP".to_string(),
                title: "ALLUP SOCIAL COMMERCE".to_string(),
                current: self.current.clone(),
                prior: self.prior.clone(),
                optional: false,
            },
            Segment {
                label: format!("{platform_label} {}", cfg.dynamic_keyword.to_uppercase()),
                title: format!("{platform_label} {}", cfg.dynamic_keyword.to_uppercase()),
                current: by_campaign_keyword(&current_platform, &cfg.dynamic_keyword),
                prior: by_campaign_keyword(&prior_platform, &cfg.dynamic_keyword),
                optional: false,
            },
        ];
        if let Some(promo) = &cfg.promo_keyword {
            segments.push(Segment {
                label: format!("{platform_label} {}", promo.to_uppercase()),
                title: format!("{platform_label} {}", promo.to_uppercase()),
                current: by_campaign_keyword(&current_platform, promo),
                prior: by_campaign_keyword(&prior_platform, promo),
                optional: true,
            });
        }
        segments
    }

    /// Renders the text message and tables for the configured report date.
    pub fn run(&self) -> Result<ReportBundle> {
        let cfg = &self.config;
        let day_offset = to_offset(cfg.report_date, cfg.current_year())?;
        let comp_date = from_offset(cfg.prior_year(), day_offset)?;
        // Most recent complete Sunday-to-Saturday week before the report date,
        // not the partial week holding the report date itself. Intentional: on
        // a Sunday run the report date's own bucket holds only that Sunday.
        let last_week = week_bucket(day_offset) - 1;
        let all_kpis = cfg.all_kpis();
        info!(
            report_date = %cfg.report_date,
            comp_date = %comp_date,
            day_offset,
            weekly = cfg.weekly_enabled(),
            "building report"
        );

        let mut text = TextReport::new();
        text.push_header(cfg.report_date, comp_date, day_offset);
        // The note points at the weekly table, so it only goes out when one is built.
        if cfg.is_monday_run() && cfg.weekly_enabled() {
            text.push_line(monday_note(cfg.weekly_sheet_url.as_deref()));
        }

        let mut daily = MetricTable::new(cfg.kpis.clone());
        let mut weekly = cfg
            .weekly_enabled()
            .then(|| MetricTable::new(cfg.kpis.clone()));

        for segment in self.segments() {
            debug!(
                segment = %segment.label,
                current_rows = segment.current.len(),
                prior_rows = segment.prior.len(),
                "segment"
            );
            if segment.optional && segment.current.is_empty() {
                info!(segment = %segment.label, "no current-year rows, skipping segment");
                text.push_line("");
                text.push_line(format!("No {} data from this year.", title_case(&segment.label)));
                continue;
            }

            let current_days = by_day(&segment.current, &all_kpis);
            let prior_days = by_day(&segment.prior, &all_kpis);
            let key = KeySelector::DayOffset(day_offset);

            text.push_section(&segment.title);
            text.push_comparison(&compare(&current_days, &prior_days, &cfg.topline_kpis, key)?);
            let full = compare(&current_days, &prior_days, &cfg.kpis, key)?;
            log_comparison(&segment.label, &full);
            daily.append(format!("{} ({})", segment.label, cfg.report_date), &full)?;

            if let Some(weekly) = weekly.as_mut() {
                let current_weeks = by_week(&segment.current, &cfg.kpis);
                let prior_weeks = by_week(&segment.prior, &cfg.kpis);
                let week = compare(
                    &current_weeks,
                    &prior_weeks,
                    &cfg.kpis,
                    KeySelector::WeekBucket(last_week),
                )?;
                log_comparison(&segment.label, &week);
                weekly.append(format!("{} (last week)", segment.label), &week)?;
            }
        }

        Ok(ReportBundle {
            text,
            daily,
            weekly,
        })
    }
}

fn load_year(loader: &dyn TableLoader, year: i32) -> Result<Vec<NormalizedRow>> {
    let source = source_for_year(year);
    let raw = loader.load(&source)?;
    let (rows, report) = normalize_rows(&raw, year, &source)?;
    info!(
        year,
        source = %source,
        total_rows = report.total_rows,
        normalized_rows = report.normalized_rows,
        parse_errors = report.parse_errors,
        "loaded year"
    );
    Ok(rows)
}

fn log_comparison(segment: &str, comparison: &Comparison) {
    for c in &comparison.kpis {
        debug!(
            segment,
            key = %comparison.key,
            kpi = %c.kpi,
            current = c.current,
            prior = c.prior,
            change = %c.change,
            "compared"
        );
    }
}

fn monday_note(sheet_url: Option<&str>) -> String {
    match sheet_url {
        Some(url) => format!(" *Today is Monday!* Find data from last week <{url}|here>."),
        None => format!(" *Today is Monday!* Find data from last week in {WEEKLY_TABLE_FILE}."),
    }
}

/// `META PROMO` -> `Meta Promo`
fn title_case(label: &str) -> String {
    label
        .split_whitespace()
        .map(|word| {
            let lower = word.to_lowercase();
            let mut chars = lower.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ReportError, YearSide};
    use crate::output::MemorySink;
    use crate::types::{RawRow, RawTable, REQUIRED_COLUMNS};
    use std::collections::HashMap;

    /// Serves every required column, with rows keyed by source name.
    struct MapLoader(HashMap<String, Vec<RawRow>>);

    impl TableLoader for MapLoader {
        fn load(&self, source: &str) -> Result<RawTable> {
            let columns = REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect();
            Ok(RawTable::new(columns, self.0.get(source).cloned().unwrap_or_default()))
        }
    }

    fn raw(date: &str, platform: &str, campaign: &str, spend: f64, demand: f64) -> RawRow {
        RawRow {
            date_day: Some(date.to_string()),
            platform: Some(platform.to_string()),
            campaign_name: Some(campaign.to_string()),
            media_spend: Some(spend.to_string()),
            demand: Some(demand.to_string()),
            orders: Some("10".into()),
            visits: Some("100".into()),
            impressions: Some("10000".into()),
            clicks: Some("50".into()),
        }
    }

    fn config(report_date: NaiveDate) -> ReportConfig {
        ReportConfig {
            report_date,
            platform: "meta".into(),
            dynamic_keyword: "dynamic".into(),
            promo_keyword: Some("promo".into()),
            kpis: vec![Kpi::Roas, Kpi::Cpv, Kpi::Cvr, Kpi::Aov, Kpi::Cpm, Kpi::Cpc],
            topline_kpis: vec![Kpi::Roas, Kpi::Cpv, Kpi::Cpm],
            weekly: WeeklyMode::Auto,
            weekly_sheet_url: None,
        }
    }

    /// Fri 2025-11-28 (BF) and Fri 2024-11-29 (BF), with the dynamic campaign
    /// on meta and a google row that only shows up in ALLUP.
    fn loader() -> MapLoader {
        let mut map = HashMap::new();
        map.insert(
            "2025.csv".to_string(),
            vec![
                raw("11/28/2025", "meta", "FY25_Dynamic_Prospecting", 150.0, 700.0),
                raw("11/28/2025", "meta", "FY25_always_on", 50.0, 211.0),
                raw("11/28/2025", "google", "dynamic_search", 100.0, 100.0),
                raw("11/27/2025", "meta", "FY25_Dynamic_Prospecting", 10.0, 10.0),
            ],
        );
        map.insert(
            "2024.csv".to_string(),
            vec![
                raw("11/29/2024", "meta", "FY24_dynamic", 150.0, 600.0),
                raw("11/29/2024", "meta", "FY24_always_on", 50.0, 200.0),
                raw("11/29/2024", "google", "dynamic_search", 100.0, 100.0),
                raw("11/28/2024", "meta", "FY24_dynamic", 10.0, 10.0),
            ],
        );
        MapLoader(map)
    }

    fn black_friday_2025() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 11, 28).unwrap()
    }

    #[test]
    fn daily_report_end_to_end() {
        let pipeline = Pipeline::load(config(black_friday_2025()), &loader()).unwrap();
        let bundle = pipeline.run().unwrap();
        let lines = bundle.text.lines();

        assert_eq!(lines[0], "Reporting for Fri 2025-11-28, 0 days from Black Friday.");
        assert_eq!(lines[1], "(Comping with Fri 2024-11-29)");
        // ALLUP: 1011/300 vs 900/300.
        assert!(lines.contains(&" *=== ALLUP SOCIAL COMMERCE ===* ".to_string()));
        assert!(lines.contains(&"ROAS Actual $3.37, +12% YoY".to_string()));
        // META DYNAMIC: 700/150 vs 600/150.
        assert!(lines.contains(&" *=== META DYNAMIC ===* ".to_string()));
        assert!(lines.contains(&"ROAS Actual $4.67, +16% YoY".to_string()));
        assert!(lines.contains(&"No Meta Promo data from this year.".to_string()));

        assert_eq!(bundle.daily.rows().len(), 2);
        assert_eq!(bundle.daily.rows()[0].label, "ALLUP (2025-11-28)");
        assert_eq!(bundle.daily.rows()[1].label, "META DYNAMIC (2025-11-28)");
        assert_eq!(bundle.daily.header().len(), 1 + 2 * 6);
        // Friday run: no weekly table.
        assert!(bundle.weekly.is_none());
    }

    #[test]
    fn promo_segment_rendered_when_present() {
        let mut loader = loader();
        for (source, date) in [("2025.csv", "11/28/2025"), ("2024.csv", "11/29/2024")] {
            loader
                .0
                .get_mut(source)
                .unwrap()
                .push(raw(date, "meta", "bf_PROMO_sale", 20.0, 60.0));
        }
        let bundle = Pipeline::load(config(black_friday_2025()), &loader)
            .unwrap()
            .run()
            .unwrap();
        assert!(bundle.text.lines().contains(&" *=== META PROMO ===* ".to_string()));
        assert_eq!(bundle.daily.rows().len(), 3);
        assert_eq!(bundle.daily.rows()[2].label, "META PROMO (2025-11-28)");
    }

    /// Adds the Sunday after Black Friday (offset 2) to both years.
    fn sunday_loader() -> MapLoader {
        let mut loader = loader();
        loader.0.get_mut("2025.csv").unwrap().push(raw("11/30/2025", "meta", "dynamic", 5.0, 5.0));
        loader.0.get_mut("2024.csv").unwrap().push(raw("12/01/2024", "meta", "dynamic", 5.0, 5.0));
        loader
    }

    fn sunday_2025() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 11, 30).unwrap()
    }

    #[test]
    fn sunday_runs_add_weekly_table_and_note() {
        // Sun 2025-11-30 is offset 2; last complete week is bucket 0.
        let bundle = Pipeline::load(config(sunday_2025()), &sunday_loader())
            .unwrap()
            .run()
            .unwrap();
        assert_eq!(bundle.text.lines()[1], "(Comping with Sun 2024-12-01)");
        assert!(bundle.text.lines()[2].starts_with(" *Today is Monday!*"));
        let weekly = bundle.weekly.expect("weekly table on Sunday");
        assert_eq!(weekly.rows()[0].label, "ALLUP (last week)");
        // Week 0 ALLUP: (1011 + 10) / 310 vs (900 + 10) / 310.
        assert_eq!(weekly.rows()[0].cells[0], ("$3.29".to_string(), "+12% YoY".to_string()));
    }

    #[test]
    fn monday_note_follows_the_weekly_table() {
        let mut cfg = config(sunday_2025());
        cfg.weekly = WeeklyMode::Never;
        let bundle = Pipeline::load(cfg, &sunday_loader()).unwrap().run().unwrap();
        assert!(bundle.weekly.is_none());
        assert!(!bundle.text.lines().iter().any(|l| l.contains("Today is Monday")));
        assert_eq!(bundle.text.lines()[2], "");
    }

    #[test]
    fn missing_prior_day_fails_the_run() {
        let mut loader = loader();
        loader.0.insert("2024.csv".to_string(), vec![raw("11/28/2024", "meta", "dynamic", 1.0, 1.0)]);
        let err = Pipeline::load(config(black_friday_2025()), &loader)
            .unwrap()
            .run()
            .unwrap_err();
        assert!(matches!(err, ReportError::NoMatchingKey { side: YearSide::Prior, .. }));
    }

    #[test]
    fn failed_run_writes_nothing() {
        let mut loader = loader();
        loader.0.insert("2024.csv".to_string(), Vec::new());
        let mut sink = MemorySink::default();
        let result = Pipeline::load(config(black_friday_2025()), &loader)
            .and_then(|p| p.run())
            .and_then(|bundle| bundle.write_to(&mut sink));
        assert!(result.is_err());
        assert!(sink.texts.is_empty());
        assert!(sink.tables.is_empty());
    }

    #[test]
    fn bundle_goes_to_named_outputs() {
        let bundle = Pipeline::load(config(sunday_2025()), &sunday_loader())
            .unwrap()
            .run()
            .unwrap();
        let mut sink = MemorySink::default();
        bundle.write_to(&mut sink).unwrap();
        assert_eq!(sink.texts[0].0, TEXT_REPORT_FILE);
        let names: Vec<_> = sink.tables.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec![DAILY_TABLE_FILE, WEEKLY_TABLE_FILE]);
    }

    #[test]
    fn weekly_mode_overrides_the_weekday() {
        let mut cfg = config(black_friday_2025());
        assert!(!cfg.weekly_enabled());
        cfg.weekly = WeeklyMode::Always;
        assert!(cfg.weekly_enabled());
        let mut sunday = config(sunday_2025());
        assert!(sunday.weekly_enabled());
        sunday.weekly = WeeklyMode::Never;
        assert!(!sunday.weekly_enabled());
    }

    #[test]
    fn helpers() {
        assert_eq!(title_case("META PROMO"), "Meta Promo");
        assert!(monday_note(Some("https://sheet")).contains("<https://sheet|here>"));
        let cfg = config(black_friday_2025());
        assert_eq!(cfg.prior_year(), 2024);
        assert_eq!(cfg.all_kpis().len(), 6);
    }
}
