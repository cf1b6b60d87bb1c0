use crate::proposal::{Proposal, ProposalStatus};
use serde::Serialize;

const SECONDS_PER_DAY: u64 = 86_400;
const SECONDS_PER_HOUR: u64 = 3_600;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VotingStats {
    pub vote_percentage: f64,
    pub quorum_percentage: f64,
    pub time_left_seconds: u64,
    pub days_left: u64,
    pub hours_left: u64,
    pub time_left_display: String,
    pub is_active: bool,
    pub quorum_reached: bool,
}

fn percentage(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    (part as f64 / whole as f64 * 100.0).clamp(0.0, 100.0)
}

fn time_left_display(time_left: u64, days: u64, hours: u64) -> String {
    if time_left == 0 {
        "CLOSED".to_string()
    } else if days > 0 {
        format!("{days} DAYS")
    } else if hours > 0 {
        format!("{hours} HOURS")
    } else {
        "< 1 HOUR".to_string()
    }
}

/// Derives display statistics from a proposal snapshot as of `now` (unix seconds).
pub fn compute_voting_stats(proposal: &Proposal, now: u64) -> VotingStats {
    let time_left_seconds = if proposal.end_time > 0 {
        proposal.end_time.saturating_sub(now)
    } else {
        0
    };
    let days_left = time_left_seconds / SECONDS_PER_DAY;
    let hours_left = (time_left_seconds % SECONDS_PER_DAY) / SECONDS_PER_HOUR;

    VotingStats {
        vote_percentage: percentage(proposal.votes_for, proposal.total_votes),
        quorum_percentage: percentage(proposal.total_votes, proposal.required_votes),
        time_left_seconds,
        days_left,
        hours_left,
        time_left_display: time_left_display(time_left_seconds, days_left, hours_left),
        is_active: proposal.status.code() == ProposalStatus::Active.code(),
        quorum_reached: proposal.total_votes >= proposal.required_votes,
    }
}

pub fn compute_voting_stats_now(proposal: &Proposal) -> VotingStats {
    let now = chrono::Utc::now().timestamp().max(0) as u64;
    compute_voting_stats(proposal, now)
}
