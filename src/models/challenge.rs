use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{constants::MILLIS_PER_DAY, error::AppError};

// ==================== CHALLENGE TYPE ====================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum ChallengeType {
    Calories,
    Strain,
    SleepHours,
    Recovery,
    AllAroundAvenger,
    SleepSage,
    WorkoutWizard,
}

/// Metrics a challenge can be scored on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Calories,
    Strain,
    SleepHours,
    Recovery,
    SleepPerformance,
    SleepConsistency,
    SleepEfficiency,
}

/// How a challenge type turns samples into one number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricBasis {
    /// Windowed sum divided by the challenge length in days.
    DailyAverage(MetricKind),
    /// Unweighted mean of the trend percentage of each metric.
    TrendMean(&'static [MetricKind]),
}

const ALL_AROUND_AVENGER_METRICS: &[MetricKind] = &[
    MetricKind::SleepPerformance,
    MetricKind::Recovery,
    MetricKind::Strain,
    MetricKind::Calories,
];
const SLEEP_SAGE_METRICS: &[MetricKind] = &[
    MetricKind::SleepPerformance,
    MetricKind::SleepConsistency,
    MetricKind::SleepEfficiency,
];
const WORKOUT_WIZARD_METRICS: &[MetricKind] = &[MetricKind::Strain, MetricKind::Calories];

impl ChallengeType {
    pub const ALL: [ChallengeType; 7] = [
        ChallengeType::Calories,
        ChallengeType::Strain,
        ChallengeType::SleepHours,
        ChallengeType::Recovery,
        ChallengeType::AllAroundAvenger,
        ChallengeType::SleepSage,
        ChallengeType::WorkoutWizard,
    ];

    pub fn code(self) -> i64 {
        match self {
            ChallengeType::Calories => 0,
            ChallengeType::Strain => 1,
            ChallengeType::SleepHours => 2,
            ChallengeType::Recovery => 3,
            ChallengeType::AllAroundAvenger => 4,
            ChallengeType::SleepSage => 5,
            ChallengeType::WorkoutWizard => 6,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ChallengeType::Calories => "Calories",
            ChallengeType::Strain => "Strain",
            ChallengeType::SleepHours => "Sleep Hours",
            ChallengeType::Recovery => "Recovery",
            ChallengeType::AllAroundAvenger => "All-Around Avenger",
            ChallengeType::SleepSage => "Sleep Sage",
            ChallengeType::WorkoutWizard => "Workout Wizard",
        }
    }

    pub fn basis(self) -> MetricBasis {
        match self {
            ChallengeType::Calories => MetricBasis::DailyAverage(MetricKind::Calories),
            ChallengeType::Strain => MetricBasis::DailyAverage(MetricKind::Strain),
            ChallengeType::SleepHours => MetricBasis::DailyAverage(MetricKind::SleepHours),
            ChallengeType::Recovery => MetricBasis::DailyAverage(MetricKind::Recovery),
            ChallengeType::AllAroundAvenger => MetricBasis::TrendMean(ALL_AROUND_AVENGER_METRICS),
            ChallengeType::SleepSage => MetricBasis::TrendMean(SLEEP_SAGE_METRICS),
            ChallengeType::WorkoutWizard => MetricBasis::TrendMean(WORKOUT_WIZARD_METRICS),
        }
    }
}

impl TryFrom<i64> for ChallengeType {
    type Error = AppError;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        ChallengeType::ALL
            .into_iter()
            .find(|kind| kind.code() == code)
            .ok_or(AppError::InvalidChallengeType(code))
    }
}

impl From<ChallengeType> for i64 {
    fn from(kind: ChallengeType) -> Self {
        kind.code()
    }
}

impl fmt::Display for ChallengeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ==================== WINDOW ====================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeWindow {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl ChallengeWindow {
    pub fn new(start_time: DateTime<Utc>, end_time: DateTime<Utc>) -> Self {
        Self {
            start_time,
            end_time,
        }
    }

    /// Builds a window from unix seconds as stored on the ledger.
    pub fn from_unix_secs(start: i64, end: i64) -> Option<Self> {
        let start_time = DateTime::<Utc>::from_timestamp(start, 0)?;
        let end_time = DateTime::<Utc>::from_timestamp(end, 0)?;
        Some(Self::new(start_time, end_time))
    }

    pub fn duration_days(&self) -> f64 {
        (self.end_time - self.start_time).num_milliseconds() as f64 / MILLIS_PER_DAY
    }

    /// Inclusive on both ends.
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start_time && at <= self.end_time
    }
}

// ==================== MODE & VERDICT ====================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationMode {
    SelfTarget,
    TwoSidedCompare,
}

impl EvaluationMode {
    pub fn as_str(self) -> &'static str {
        match self {
            EvaluationMode::SelfTarget => "self_target",
            EvaluationMode::TwoSidedCompare => "two_sided_compare",
        }
    }

    pub fn from_two_sided(is_two_sided: bool) -> Self {
        if is_two_sided {
            EvaluationMode::TwoSidedCompare
        } else {
            EvaluationMode::SelfTarget
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Verdict {
    TargetReached { target_reached: bool },
    ChallengedWon { winner_is_challenged: bool },
}

impl Verdict {
    /// The single boolean the challenge contract stores for either mode.
    pub fn ledger_flag(&self) -> bool {
        match *self {
            Verdict::TargetReached { target_reached } => target_reached,
            Verdict::ChallengedWon {
                winner_is_challenged,
            } => winner_is_challenged,
        }
    }
}

// ==================== AGGREGATES ====================
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SubMetric {
    pub metric: MetricKind,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricAggregate {
    pub overall_average: f64,
    pub sub_metrics: Vec<SubMetric>,
}

// ==================== REQUEST / RESULT ====================
/// Everything needed to judge a challenge, before participant data is loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationRequest {
    pub challenge_id: u64,
    pub challenge_type: ChallengeType,
    pub challenge_target: f64,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub is_two_sided: bool,
    pub challenger_address: String,
    pub challenged_address: Option<String>,
}

impl EvaluationRequest {
    pub fn window(&self) -> ChallengeWindow {
        ChallengeWindow::new(self.start_time, self.end_time)
    }

    pub fn mode(&self) -> EvaluationMode {
        EvaluationMode::from_two_sided(self.is_two_sided)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EvaluationResult {
    pub challenge_id: u64,
    pub challenge_type: ChallengeType,
    pub mode: EvaluationMode,
    pub challenge_target: f64,
    pub verdict: Verdict,
    pub challenger: MetricAggregate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub challenged: Option<MetricAggregate>,
}
