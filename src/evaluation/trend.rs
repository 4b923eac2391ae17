use chrono::{DateTime, Utc};

/// Mean period-over-period change of `value_of` across samples ordered by `time_of`,
/// as a percentage.
///
/// Pairs whose earlier value is zero are skipped and do not count towards the mean.
/// With no usable pair (fewer than two samples, or every earlier value zero) the trend
/// is `0`. Samples sharing a timestamp keep their input order.
pub fn estimate_trend<T, V, K>(samples: &[T], value_of: V, time_of: K) -> f64
where
    V: Fn(&T) -> f64,
    K: Fn(&T) -> DateTime<Utc>,
{
    let mut ordered: Vec<&T> = samples.iter().collect();
    ordered.sort_by_key(|sample| time_of(*sample));

    let mut sum = 0.0;
    let mut count = 0usize;
    for pair in ordered.windows(2) {
        let prev = value_of(pair[0]);
        if prev == 0.0 {
            continue;
        }
        let curr = value_of(pair[1]);
        sum += (curr - prev) / prev;
        count += 1;
    }

    if count == 0 {
        0.0
    } else {
        sum / count as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn trend(points: &[(f64, i64)]) -> f64 {
        estimate_trend(points, |p| p.0, |p| at(p.1))
    }

    #[test]
    fn empty_and_single_sample_are_flat() {
        assert_eq!(trend(&[]), 0.0);
        assert_eq!(trend(&[(42.0, 1)]), 0.0);
    }

    #[test]
    fn zero_previous_value_skips_the_pair() {
        let result = trend(&[(0.0, 1), (10.0, 2), (5.0, 3)]);
        assert!((result - -50.0).abs() < 1e-9, "got {result}");
    }

    #[test]
    fn all_zero_previous_values_is_flat() {
        assert_eq!(trend(&[(0.0, 1), (0.0, 2), (3.0, 3)]), 0.0);
    }

    #[test]
    fn constant_ratio_growth_matches_ratio() {
        let ratio: f64 = 0.1;
        let points: Vec<(f64, i64)> = (0..6)
            .map(|i| (100.0 * (1.0 + ratio).powi(i as i32), i))
            .collect();
        let result = trend(&points);
        assert!((result - ratio * 100.0).abs() < 1e-9, "got {result}");
    }

    #[test]
    fn samples_are_ordered_by_time_not_input() {
        let shuffled = trend(&[(5.0, 3), (0.0, 1), (10.0, 2)]);
        assert!((shuffled - -50.0).abs() < 1e-9);
    }

    #[test]
    fn repeated_runs_are_identical() {
        let points = [(3.0, 4), (7.5, 1), (2.0, 2), (9.0, 3)];
        assert_eq!(trend(&points).to_bits(), trend(&points).to_bits());
    }
}
