pub mod errors;
pub mod governance;
pub mod judol;
pub mod paper;
pub mod proposal;
pub mod query_cache;
pub mod stats;

pub use crate::errors::{GovernanceError, JudolError};
pub use crate::governance::{GovernancePolicies, GovernanceReader, VOTE_RECEIPT_LOOKBACK_BLOCKS};
pub use crate::judol::{
    Judol, JudolAPIConfiguration, JudolConfiguration, JudolContractsConfiguration,
    JudolUserConfiguration, PaperDraft,
};
pub use crate::paper::{LocalPaperStore, Paper, PaperCatalog, PaperStatus, PaperType};
pub use crate::proposal::{MinQuorum, Proposal, ProposalLookup, ProposalStatus, VoteReceipt};
pub use crate::stats::{VotingStats, compute_voting_stats, compute_voting_stats_now};

pub use api::types::pinning::{FileUpload, PinResponse, PinataMetadata};
pub use contracts::GovernanceSource;
