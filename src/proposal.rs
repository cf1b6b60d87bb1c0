use alloy::primitives::{Address, B256, U256};
use contracts::GovernanceDAO;
use contracts::utils::u256_to_u64;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// On-chain proposal status. The contract transmits it as an integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ProposalStatus {
    Active,
    Passed,
    Rejected,
    Unknown(u8),
}

impl ProposalStatus {
    pub fn code(&self) -> u8 {
        match self {
            ProposalStatus::Active => 0,
            ProposalStatus::Passed => 1,
            ProposalStatus::Rejected => 2,
            ProposalStatus::Unknown(code) => *code,
        }
    }
}

impl From<u8> for ProposalStatus {
    fn from(code: u8) -> Self {
        match code {
            0 => ProposalStatus::Active,
            1 => ProposalStatus::Passed,
            2 => ProposalStatus::Rejected,
            other => ProposalStatus::Unknown(other),
        }
    }
}

impl fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProposalStatus::Active => write!(f, "Active"),
            ProposalStatus::Passed => write!(f, "Passed"),
            ProposalStatus::Rejected => write!(f, "Rejected"),
            ProposalStatus::Unknown(code) => write!(f, "Unknown({code})"),
        }
    }
}

/// Snapshot of a governance proposal. `total_votes` is taken as reported by the
/// contract and is not checked against `votes_for + votes_against`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Proposal {
    pub id: u64,
    pub proposer: Address,
    pub title: String,
    pub description: String,
    pub status: ProposalStatus,
    pub votes_for: u64,
    pub votes_against: u64,
    pub total_votes: u64,
    pub required_votes: u64,
    pub end_time: u64,
}

impl From<GovernanceDAO::Proposal> for Proposal {
    fn from(p: GovernanceDAO::Proposal) -> Self {
        Proposal {
            id: u256_to_u64(p.id),
            proposer: p.proposer,
            title: p.title,
            description: p.description,
            status: ProposalStatus::from(p.status),
            votes_for: p.votesFor,
            votes_against: p.votesAgainst,
            total_votes: p.totalVotes,
            required_votes: p.requiredVotes,
            end_time: p.endTime,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MinQuorum {
    pub bps: u64,
    pub percentage: f64,
}

impl MinQuorum {
    pub fn from_bps(bps: u64) -> Self {
        Self {
            bps,
            percentage: bps as f64 / 100.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteReceipt {
    pub proposal_id: u64,
    pub voter: Address,
    pub support: bool,
    pub weight: U256,
    pub timestamp: u64,
    pub transaction_hash: B256,
}

/// Route parameter for a single proposal. `"pending"` stands for a proposal whose
/// creation transaction has not been indexed yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProposalLookup {
    Pending,
    Id(u64),
}

impl FromStr for ProposalLookup {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("pending") {
            return Ok(ProposalLookup::Pending);
        }
        Ok(ProposalLookup::Id(s.parse()?))
    }
}

impl From<u64> for ProposalLookup {
    fn from(id: u64) -> Self {
        ProposalLookup::Id(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_round_trip() {
        assert_eq!(ProposalStatus::from(0), ProposalStatus::Active);
        assert_eq!(ProposalStatus::from(2), ProposalStatus::Rejected);
        assert_eq!(ProposalStatus::from(9), ProposalStatus::Unknown(9));
        assert_eq!(ProposalStatus::Unknown(9).code(), 9);
    }

    #[test]
    fn lookup_parses_sentinel_and_ids() {
        assert_eq!("pending".parse::<ProposalLookup>(), Ok(ProposalLookup::Pending));
        assert_eq!("0".parse::<ProposalLookup>(), Ok(ProposalLookup::Id(0)));
        assert_eq!(" 17 ".parse::<ProposalLookup>(), Ok(ProposalLookup::Id(17)));
        assert!("abc".parse::<ProposalLookup>().is_err());
    }

    #[test]
    fn quorum_percentage_from_bps() {
        let quorum = MinQuorum::from_bps(2000);
        assert_eq!(quorum.percentage, 20.0);
    }

    #[test]
    fn converts_contract_proposal() {
        let raw = GovernanceDAO::Proposal {
            id: U256::from(3u64),
            proposer: Address::ZERO,
            title: "Raise reviewer rewards".to_string(),
            description: String::new(),
            status: 1,
            votesFor: 10,
            votesAgainst: 5,
            totalVotes: 15,
            requiredVotes: 20,
            endTime: 1_700_000_000,
            exists: true,
        };

        let proposal = Proposal::from(raw);
        assert_eq!(proposal.id, 3);
        assert_eq!(proposal.status, ProposalStatus::Passed);
        assert_eq!(proposal.total_votes, 15);
    }
}
