use crate::ContractsError;
use crate::GovernanceDAO::Proposal;
use alloy::primitives::Address;
use alloy::rpc::types::Log;
use async_trait::async_trait;

/// Read side of the governance contract, as seen by caching layers.
#[async_trait]
pub trait GovernanceSource: Send + Sync {
    /// `false` when no governance contract is deployed on the configured chain.
    fn is_configured(&self) -> bool;

    async fn min_quorum_bps(&self) -> Result<u64, ContractsError>;

    /// Identifiers announced by `ProposalCreated` events, without duplicates.
    async fn created_proposal_ids(&self) -> Result<Vec<u64>, ContractsError>;

    /// `Ok(None)` when the contract reports no proposal under `proposal_id`.
    async fn proposal(&self, proposal_id: u64) -> Result<Option<Proposal>, ContractsError>;

    async fn latest_block(&self) -> Result<u64, ContractsError>;

    /// Raw `VoteCast` logs emitted for `voter` from `from_block` to the chain head.
    async fn vote_logs(&self, voter: Address, from_block: u64) -> Result<Vec<Log>, ContractsError>;

    async fn block_timestamp(&self, block_number: u64) -> Result<Option<u64>, ContractsError>;
}
