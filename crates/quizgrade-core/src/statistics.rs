//! Attempt-level score aggregation.
//!
//! Sums the grading results of one attempt (or one batch run) into the
//! totals a gradebook shows. An attempt stays provisional while any of its
//! responses awaits manual review or could not be graded.

use serde::{Deserialize, Serialize};

use crate::results::{GradingResult, GradingStatus};

/// Totals over a set of grading results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptSummary {
    pub points_earned: f64,
    pub points_possible: f64,
    /// `points_earned / points_possible` as a percentage (0 when nothing is possible).
    pub percentage: f64,
    pub correct: usize,
    pub auto_graded: usize,
    pub pending_review: usize,
    pub manually_graded: usize,
    /// Responses that received no result (unsupported or invalid questions).
    pub ungraded: usize,
    /// True while any response is pending review or ungraded.
    pub provisional: bool,
}

/// Summarize an attempt.
///
/// Points of pending responses count toward `points_possible` but earn
/// nothing until a manual grade is applied.
pub fn summarize(results: &[GradingResult], ungraded: usize) -> AttemptSummary {
    let points_earned: f64 = results.iter().map(|r| r.points_earned).sum();
    let points_possible: f64 = results.iter().map(|r| r.points_possible).sum();

    let count = |status: GradingStatus| results.iter().filter(|r| r.status == status).count();
    let pending_review = count(GradingStatus::PendingManualReview);

    let percentage = if points_possible > 0.0 {
        (points_earned / points_possible * 100.0).clamp(0.0, 100.0)
    } else {
        0.0
    };

    AttemptSummary {
        points_earned,
        points_possible,
        percentage,
        correct: results.iter().filter(|r| r.is_correct).count(),
        auto_graded: count(GradingStatus::AutoGraded),
        pending_review,
        manually_graded: count(GradingStatus::Graded),
        ungraded,
        provisional: pending_review > 0 || ungraded > 0,
    }
}
