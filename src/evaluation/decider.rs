/// A self-challenge is won when the value reaches the target; the threshold is inclusive.
pub fn decide_self(value: f64, target: f64) -> bool {
    value >= target
}

/// Closest to the target wins a 1v1. Returns `true` when the challenged side is
/// strictly closer, so an exact tie goes to the challenger.
pub fn decide_two_sided(challenger_value: f64, challenged_value: f64, target: f64) -> bool {
    let challenger_distance = (target - challenger_value).abs();
    let challenged_distance = (target - challenged_value).abs();
    challenged_distance < challenger_distance
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn self_target_is_inclusive() {
        assert!(decide_self(2000.0, 2000.0));
        assert!(decide_self(2100.0, 2000.0));
        assert!(!decide_self(1999.9, 2000.0));
    }

    #[test]
    fn two_sided_tie_goes_to_challenger() {
        assert!(!decide_two_sided(10.0, 10.0, 10.0));
        assert!(!decide_two_sided(8.0, 12.0, 10.0));
    }

    #[test]
    fn two_sided_closest_wins_from_either_side() {
        assert!(decide_two_sided(12.0, 9.0, 10.0));
        assert!(!decide_two_sided(9.5, 11.0, 10.0));
        assert!(decide_two_sided(-5.0, 3.0, 0.0));
    }
}
