// Challenge outcome evaluation. Pure: callers hand in materialized samples and get a
// verdict back; loading samples and writing the verdict happen in services.
pub mod aggregator;
pub mod decider;
pub mod eligibility;
pub mod trend;

pub use aggregator::aggregate;
pub use decider::{decide_self, decide_two_sided};

use crate::{
    error::{AppError, Result},
    models::{EvaluationMode, EvaluationRequest, EvaluationResult, ParticipantSamples, Verdict},
};

/// Sample sets of the people taking part in one challenge.
#[derive(Debug, Clone, Copy)]
pub enum Participants<'a> {
    Solo(&'a ParticipantSamples),
    Pair {
        challenger: &'a ParticipantSamples,
        challenged: &'a ParticipantSamples,
    },
}

/// Judges a challenge. The participant shape has to match the request's mode.
pub fn evaluate(request: &EvaluationRequest, participants: Participants<'_>) -> Result<EvaluationResult> {
    let window = request.window();
    let target = request.challenge_target;
    if !target.is_finite() {
        return Err(AppError::BadRequest("Challenge target must be a finite number".to_string()));
    }

    let (verdict, challenger, challenged) = match (request.mode(), participants) {
        (EvaluationMode::SelfTarget, Participants::Solo(samples)) => {
            let own = aggregate(samples, &window, request.challenge_type);
            let target_reached = decide_self(own.overall_average, target);
            (Verdict::TargetReached { target_reached }, own, None)
        }
        (
            EvaluationMode::TwoSidedCompare,
            Participants::Pair {
                challenger,
                challenged,
            },
        ) => {
            let challenger = aggregate(challenger, &window, request.challenge_type);
            let challenged = aggregate(challenged, &window, request.challenge_type);
            let winner_is_challenged =
                decide_two_sided(challenger.overall_average, challenged.overall_average, target);
            (
                Verdict::ChallengedWon {
                    winner_is_challenged,
                },
                challenger,
                Some(challenged),
            )
        }
        (EvaluationMode::SelfTarget, Participants::Pair { .. }) => {
            return Err(AppError::BadRequest(
                "Self challenge evaluated with two participants".to_string(),
            ))
        }
        (EvaluationMode::TwoSidedCompare, Participants::Solo(_)) => {
            return Err(AppError::BadRequest(
                "Two-sided challenge needs a challenged participant".to_string(),
            ))
        }
    };

    tracing::debug!(
        challenge_id = request.challenge_id,
        challenge_type = %request.challenge_type,
        challenger_value = challenger.overall_average,
        challenged_value = ?challenged.as_ref().map(|c| c.overall_average),
        target,
        outcome = verdict.ledger_flag(),
        "challenge evaluated"
    );

    Ok(EvaluationResult {
        challenge_id: request.challenge_id,
        challenge_type: request.challenge_type,
        mode: request.mode(),
        challenge_target: target,
        verdict,
        challenger,
        challenged,
    })
}
