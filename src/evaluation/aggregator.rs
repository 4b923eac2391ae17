use chrono::{DateTime, Utc};

use super::{eligibility::EligibleSamples, trend::estimate_trend};
use crate::{
    constants::{KILOJOULE_TO_KCAL, MILLIS_PER_HOUR},
    models::{
        ChallengeType, ChallengeWindow, Cycle, MetricAggregate, MetricBasis, MetricKind,
        ParticipantSamples, Recovery, Sleep, SubMetric,
    },
};

/// Reduces one participant's samples to the value a challenge type is judged on.
///
/// Daily-average types divide the windowed total by the window length in days; a
/// window of zero or negative length, or one without eligible samples, yields `0`.
/// Composite types average the trend percentage of each of their metrics.
pub fn aggregate(
    samples: &ParticipantSamples,
    window: &ChallengeWindow,
    challenge_type: ChallengeType,
) -> MetricAggregate {
    let eligible = EligibleSamples::collect(samples, window);

    match challenge_type.basis() {
        MetricBasis::DailyAverage(metric) => {
            let value = daily_average(&eligible, window, metric);
            MetricAggregate {
                overall_average: value,
                sub_metrics: vec![SubMetric { metric, value }],
            }
        }
        MetricBasis::TrendMean(metrics) => {
            let sub_metrics: Vec<SubMetric> = metrics
                .iter()
                .map(|&metric| SubMetric {
                    metric,
                    value: metric_trend(&eligible, metric),
                })
                .collect();
            let overall_average = mean(sub_metrics.iter().map(|sub| sub.value));
            MetricAggregate {
                overall_average,
                sub_metrics,
            }
        }
    }
}

fn daily_average(eligible: &EligibleSamples<'_>, window: &ChallengeWindow, metric: MetricKind) -> f64 {
    let days = window.duration_days();
    if days <= 0.0 {
        return 0.0;
    }

    let values = metric_values(eligible, metric);
    if values.is_empty() {
        return 0.0;
    }
    values.iter().map(|(value, _)| value).sum::<f64>() / days
}

fn metric_trend(eligible: &EligibleSamples<'_>, metric: MetricKind) -> f64 {
    estimate_trend(&metric_values(eligible, metric), |point| point.0, |point| point.1)
}

/// Per-sample value and ordering time for a metric. Samples missing the field are
/// left out.
fn metric_values(eligible: &EligibleSamples<'_>, metric: MetricKind) -> Vec<(f64, DateTime<Utc>)> {
    match metric {
        MetricKind::Calories => cycle_points(&eligible.cycles, |c| {
            c.kilojoule.map(|kj| kj * KILOJOULE_TO_KCAL)
        }),
        MetricKind::Strain => cycle_points(&eligible.cycles, |c| c.strain),
        MetricKind::SleepHours => sleep_points(&eligible.sleeps, |s| {
            s.total_in_bed_time_milli
                .map(|ms| ms as f64 / MILLIS_PER_HOUR)
        }),
        MetricKind::SleepPerformance => {
            sleep_points(&eligible.sleeps, |s| s.sleep_performance_percentage)
        }
        MetricKind::SleepConsistency => {
            sleep_points(&eligible.sleeps, |s| s.sleep_consistency_percentage)
        }
        MetricKind::SleepEfficiency => {
            sleep_points(&eligible.sleeps, |s| s.sleep_efficiency_percentage)
        }
        MetricKind::Recovery => recovery_points(&eligible.recoveries, |r| r.recovery_score),
    }
}

fn cycle_points(cycles: &[&Cycle], value: impl Fn(&Cycle) -> Option<f64>) -> Vec<(f64, DateTime<Utc>)> {
    cycles
        .iter()
        .filter_map(|cycle| value(*cycle).map(|v| (v, cycle.effective_time())))
        .collect()
}

fn sleep_points(sleeps: &[&Sleep], value: impl Fn(&Sleep) -> Option<f64>) -> Vec<(f64, DateTime<Utc>)> {
    sleeps
        .iter()
        .filter_map(|sleep| {
            let end = sleep.end_time?;
            value(*sleep).map(|v| (v, end))
        })
        .collect()
}

fn recovery_points(
    recoveries: &[&Recovery],
    value: impl Fn(&Recovery) -> Option<f64>,
) -> Vec<(f64, DateTime<Utc>)> {
    recoveries
        .iter()
        .filter_map(|recovery| value(*recovery).map(|v| (v, recovery.updated_at)))
        .collect()
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn week() -> ChallengeWindow {
        ChallengeWindow::new(start(), start() + Duration::days(7))
    }

    fn day(n: i64) -> DateTime<Utc> {
        start() + Duration::days(n) + Duration::hours(6)
    }

    fn cycle(n: i64, strain: f64, kcal: f64) -> Cycle {
        Cycle {
            id: n,
            whoop_user_id: 1,
            start_time: day(n) - Duration::hours(20),
            end_time: Some(day(n)),
            updated_at: day(n),
            score_state: "SCORED".to_string(),
            strain: Some(strain),
            kilojoule: Some(kcal / KILOJOULE_TO_KCAL),
        }
    }

    fn sleep(n: i64, hours: f64, performance: f64, consistency: f64, efficiency: f64) -> Sleep {
        Sleep {
            id: n,
            whoop_user_id: 1,
            start_time: day(n) - Duration::hours(8),
            end_time: Some(day(n)),
            updated_at: day(n),
            nap: false,
            score_state: "SCORED".to_string(),
            total_in_bed_time_milli: Some((hours * MILLIS_PER_HOUR) as i64),
            sleep_performance_percentage: Some(performance),
            sleep_consistency_percentage: Some(consistency),
            sleep_efficiency_percentage: Some(efficiency),
        }
    }

    fn recovery(n: i64, score: f64) -> Recovery {
        Recovery {
            cycle_id: n,
            sleep_id: Some(n),
            whoop_user_id: 1,
            updated_at: day(n),
            score_state: "SCORED".to_string(),
            user_calibrating: false,
            recovery_score: Some(score),
        }
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    fn sub_metric(result: &MetricAggregate, metric: MetricKind) -> Option<f64> {
        result
            .sub_metrics
            .iter()
            .find(|sub| sub.metric == metric)
            .map(|sub| sub.value)
    }

    #[test]
    fn calories_are_averaged_per_day() {
        let samples = ParticipantSamples {
            cycles: (0..7).map(|n| cycle(n, 10.0, 2100.0)).collect(),
            ..Default::default()
        };
        let result = aggregate(&samples, &week(), ChallengeType::Calories);
        assert!(close(result.overall_average, 2100.0), "got {}", result.overall_average);
        assert_eq!(sub_metric(&result, MetricKind::Calories), Some(result.overall_average));
    }

    #[test]
    fn strain_counts_open_cycles() {
        let mut open = cycle(30, 7.0, 100.0);
        open.end_time = None;
        let samples = ParticipantSamples {
            cycles: vec![cycle(1, 7.0, 100.0), open],
            ..Default::default()
        };
        let result = aggregate(&samples, &week(), ChallengeType::Strain);
        assert!(close(result.overall_average, 14.0 / 7.0));
    }

    #[test]
    fn sleep_hours_drop_out_of_window_and_naps() {
        let mut nap = sleep(2, 1.0, 50.0, 50.0, 50.0);
        nap.nap = true;
        let samples = ParticipantSamples {
            sleeps: vec![sleep(1, 7.0, 0.0, 0.0, 0.0), nap, sleep(20, 9.0, 0.0, 0.0, 0.0)],
            ..Default::default()
        };
        let result = aggregate(&samples, &week(), ChallengeType::SleepHours);
        assert!(close(result.overall_average, 1.0));
    }

    #[test]
    fn recovery_average_ignores_unscored() {
        let mut pending = recovery(2, 100.0);
        pending.score_state = "PENDING_SCORE".to_string();
        let samples = ParticipantSamples {
            recoveries: vec![recovery(1, 70.0), pending],
            ..Default::default()
        };
        let result = aggregate(&samples, &week(), ChallengeType::Recovery);
        assert!(close(result.overall_average, 10.0));
    }

    #[test]
    fn degenerate_windows_yield_zero() {
        let samples = ParticipantSamples {
            cycles: vec![cycle(1, 10.0, 2000.0)],
            ..Default::default()
        };
        let empty = ChallengeWindow::new(start(), start());
        let result = aggregate(&samples, &empty, ChallengeType::Strain);
        assert_eq!(result.overall_average, 0.0);

        let nothing = aggregate(&ParticipantSamples::default(), &week(), ChallengeType::Calories);
        assert_eq!(nothing.overall_average, 0.0);
        assert!(!nothing.overall_average.is_nan());
    }

    #[test]
    fn all_around_avenger_averages_four_trends() {
        // sleep performance +10%, recovery +20%, strain -10%, calories flat
        let samples = ParticipantSamples {
            cycles: vec![cycle(1, 10.0, 2000.0), cycle(2, 9.0, 2000.0)],
            sleeps: vec![sleep(1, 8.0, 80.0, 0.0, 0.0), sleep(2, 8.0, 88.0, 0.0, 0.0)],
            recoveries: vec![recovery(1, 50.0), recovery(2, 60.0)],
        };
        let result = aggregate(&samples, &week(), ChallengeType::AllAroundAvenger);

        assert!(close(sub_metric(&result, MetricKind::SleepPerformance).unwrap(), 10.0));
        assert!(close(sub_metric(&result, MetricKind::Recovery).unwrap(), 20.0));
        assert!(close(sub_metric(&result, MetricKind::Strain).unwrap(), -10.0));
        assert!(close(sub_metric(&result, MetricKind::Calories).unwrap(), 0.0));
        assert!(close(result.overall_average, 5.0), "got {}", result.overall_average);
    }

    #[test]
    fn sleep_sage_uses_the_same_sleeps_for_each_trend() {
        let samples = ParticipantSamples {
            sleeps: vec![
                sleep(1, 8.0, 80.0, 50.0, 90.0),
                sleep(2, 8.0, 100.0, 60.0, 90.0),
            ],
            ..Default::default()
        };
        let result = aggregate(&samples, &week(), ChallengeType::SleepSage);
        assert_eq!(result.sub_metrics.len(), 3);
        // 25 + 20 + 0
        assert!(close(result.overall_average, 15.0));
    }

    #[test]
    fn workout_wizard_with_one_cycle_is_flat() {
        let samples = ParticipantSamples {
            cycles: vec![cycle(1, 14.0, 2500.0)],
            ..Default::default()
        };
        let result = aggregate(&samples, &week(), ChallengeType::WorkoutWizard);
        assert_eq!(result.overall_average, 0.0);
        assert_eq!(result.sub_metrics.len(), 2);
    }

    #[test]
    fn aggregation_is_repeatable() {
        let samples = ParticipantSamples {
            cycles: (0..5).map(|n| cycle(n, 5.0 + n as f64, 1800.0 + n as f64)).collect(),
            sleeps: (0..5).map(|n| sleep(n, 7.5, 70.0 + n as f64, 60.0, 85.0)).collect(),
            recoveries: (0..5).map(|n| recovery(n, 40.0 + n as f64)).collect(),
        };
        for kind in ChallengeType::ALL {
            let first = aggregate(&samples, &week(), kind);
            let second = aggregate(&samples, &week(), kind);
            assert_eq!(first.overall_average.to_bits(), second.overall_average.to_bits());
            assert_eq!(first, second);
        }
    }
}
