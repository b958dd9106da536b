// Day and week aggregation.
//
// Additive measures are summed per group and every requested KPI is then
// recomputed from the sums. Per-row ratios are never averaged.
use crate::kpi::Kpi;
use crate::types::{AggregateKey, AggregateRow, Measures, NormalizedRow};
use std::collections::BTreeMap;

/// One row per `(date, day_offset)`, ordered by date.
pub fn by_day(rows: &[NormalizedRow], kpis: &[Kpi]) -> Vec<AggregateRow> {
    group(rows, kpis, |r| AggregateKey::Day {
        date: r.date,
        day_offset: r.day_offset,
    })
}

/// One row per week bucket, ordered by bucket.
///
/// Must be run on normalized rows, not on daily aggregates; the date columns
/// are dropped since a week has no single representative date.
pub fn by_week(rows: &[NormalizedRow], kpis: &[Kpi]) -> Vec<AggregateRow> {
    group(rows, kpis, |r| AggregateKey::Week {
        week_bucket: r.week_bucket,
    })
}

fn group<F>(rows: &[NormalizedRow], kpis: &[Kpi], key_of: F) -> Vec<AggregateRow>
where
    F: Fn(&NormalizedRow) -> AggregateKey,
{
    let mut groups: BTreeMap<AggregateKey, Measures> = BTreeMap::new();
    for r in rows {
        groups.entry(key_of(r)).or_default().add(&r.measures);
    }
    groups
        .into_iter()
        .map(|(key, measures)| AggregateRow {
            key,
            measures,
            kpis: kpis.iter().map(|&k| (k, measures.kpi(k))).collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::week_bucket;
    use crate::kpi::Measure::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn row(day_offset: i64, spend: f64, demand: f64, impressions: f64) -> NormalizedRow {
        let date = NaiveDate::from_ymd_opt(2025, 11, 28).unwrap() + chrono::Duration::days(day_offset);
        NormalizedRow {
            date,
            platform: "meta".into(),
            campaign_name: None,
            measures: Measures {
                spend,
                demand,
                orders: 1.0,
                visits: 10.0,
                impressions,
                clicks: 2.0,
            },
            day_offset,
            week_bucket: week_bucket(day_offset),
        }
    }

    #[test]
    fn sums_measures_per_day() {
        let rows = vec![row(0, 100.0, 400.0, 1000.0), row(0, 100.0, 511.0, 1000.0), row(1, 50.0, 50.0, 500.0)];
        let days = by_day(&rows, &[Kpi::Roas]);
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].measures.spend, 200.0);
        assert_eq!(days[0].measures.demand, 911.0);
        assert_eq!(days[0].measures.orders, 2.0);
        assert_relative_eq!(days[0].kpi(Kpi::Roas).unwrap(), 4.555);
        assert_eq!(days[0].key, AggregateKey::Day { date: rows[0].date, day_offset: 0 });
    }

    #[test]
    fn ratios_come_from_sums_not_averages() {
        // Per-row ROAS is 10 and 1; the mean (5.5) would be wrong.
        let rows = vec![row(0, 10.0, 100.0, 1.0), row(0, 90.0, 90.0, 1.0)];
        let days = by_day(&rows, &[Kpi::Roas]);
        assert_relative_eq!(days[0].kpi(Kpi::Roas).unwrap(), 1.9);
    }

    #[test]
    fn only_requested_kpis_are_computed() {
        let days = by_day(&[row(0, 1.0, 1.0, 1.0)], &[Kpi::Cpm]);
        assert!(days[0].kpi(Kpi::Cpm).is_some());
        assert!(days[0].kpi(Kpi::Roas).is_none());
    }

    #[test]
    fn degenerate_ratios_are_kept() {
        let days = by_day(&[row(0, 0.0, 50.0, 0.0)], &[Kpi::Roas, Kpi::Cpm]);
        assert!(days[0].kpi(Kpi::Roas).unwrap().is_infinite());
        assert!(days[0].kpi(Kpi::Cpm).unwrap().is_nan());
    }

    #[test]
    fn weekly_groups_by_bucket() {
        // -5..=1 is bucket 0, 2..=8 bucket 1.
        let rows: Vec<_> = (-5..=8).map(|o| row(o, 10.0, 30.0, 100.0)).collect();
        let weeks = by_week(&rows, &[Kpi::Roas, Kpi::Cpm]);
        assert_eq!(weeks.len(), 2);
        assert_eq!(weeks[0].key, AggregateKey::Week { week_bucket: 0 });
        assert_eq!(weeks[1].key, AggregateKey::Week { week_bucket: 1 });
        assert_eq!(weeks[0].measures.spend, 70.0);
        assert_relative_eq!(weeks[1].kpi(Kpi::Cpm).unwrap(), 100.0);
    }

    #[test]
    fn regrouping_preserves_additive_measures() {
        let rows: Vec<_> = (-12..=15)
            .map(|o| row(o, 3.0 + o as f64 * 0.5 + 10.0, 7.0 * (o + 20) as f64, 250.0))
            .collect();
        let days = by_day(&rows, &[Kpi::Roas]);
        let weeks = by_week(&rows, &[Kpi::Roas]);
        for week in &weeks {
            let AggregateKey::Week { week_bucket: b } = week.key else {
                panic!("expected a week key");
            };
            for measure in [Spend, Demand, Orders, Visits, Impressions, Clicks] {
                let daily: f64 = days
                    .iter()
                    .filter(|d| matches!(d.key, AggregateKey::Day { day_offset, .. } if week_bucket(day_offset) == b))
                    .map(|d| d.measures.get(measure))
                    .sum();
                assert_relative_eq!(daily, week.measures.get(measure), epsilon = 1e-9);
            }
        }
    }
}
