use crate::models::{ChallengeWindow, Cycle, ParticipantSamples, Recovery, Sleep};

/// Samples of one participant that may count towards a challenge window.
#[derive(Debug, Clone, Default)]
pub struct EligibleSamples<'a> {
    pub cycles: Vec<&'a Cycle>,
    pub sleeps: Vec<&'a Sleep>,
    pub recoveries: Vec<&'a Recovery>,
}

impl<'a> EligibleSamples<'a> {
    pub fn collect(samples: &'a ParticipantSamples, window: &ChallengeWindow) -> Self {
        Self {
            cycles: samples
                .cycles
                .iter()
                .filter(|cycle| cycle_is_eligible(cycle, window))
                .collect(),
            sleeps: samples
                .sleeps
                .iter()
                .filter(|sleep| sleep_is_eligible(sleep, window))
                .collect(),
            recoveries: samples
                .recoveries
                .iter()
                .filter(|recovery| recovery_is_eligible(recovery, window))
                .collect(),
        }
    }
}

/// A still-open cycle counts regardless of the window.
pub fn cycle_is_eligible(cycle: &Cycle, window: &ChallengeWindow) -> bool {
    if !cycle.score_state().is_scored() {
        return false;
    }
    match cycle.end_time {
        Some(end) => window.contains(end),
        None => true,
    }
}

pub fn sleep_is_eligible(sleep: &Sleep, window: &ChallengeWindow) -> bool {
    if sleep.nap || !sleep.score_state().is_scored() {
        return false;
    }
    sleep.end_time.is_some_and(|end| window.contains(end))
}

pub fn recovery_is_eligible(recovery: &Recovery, window: &ChallengeWindow) -> bool {
    !recovery.user_calibrating
        && recovery.score_state().is_scored()
        && window.contains(recovery.updated_at)
}
