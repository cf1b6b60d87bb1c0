use crate::GovernanceDAO::{Proposal, ProposalCreated, VoteCast};
use crate::utils::u256_to_u64;
use crate::{ContractCallConfig, ContractsError, GovernanceDAO, GovernanceSource};
use alloy::eips::BlockNumberOrTag;
use alloy::network::EthereumWallet;
use alloy::primitives::ruint::aliases::U256;
use alloy::primitives::{Address, B256};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::{Filter, Log};
use alloy::signers::local::PrivateKeySigner;
use alloy::sol_types::SolEvent;
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::str::FromStr;
use tracing::{debug, warn};

pub struct GovernanceDaoContract {
    config: ContractCallConfig,
    deployment_block: u64,
}

impl GovernanceDaoContract {
    pub fn new(config: ContractCallConfig) -> Self {
        Self {
            config,
            deployment_block: 0,
        }
    }

    /// Proposal discovery starts scanning `ProposalCreated` logs at this block.
    pub fn with_deployment_block(mut self, block: u64) -> Self {
        self.deployment_block = block;
        self
    }

    fn contract_address(&self) -> Result<Address, ContractsError> {
        if !self.config.is_configured() {
            return Err(ContractsError::MissingContractAddress("GovernanceDAO"));
        }
        Ok(Address::from_str(self.config.contract_address.trim())?)
    }

    pub async fn get_min_quorum_bps(&self) -> Result<U256, ContractsError> {
        let provider = ProviderBuilder::new().connect_http(self.config.rpc_url.parse()?);

        let contract = GovernanceDAO::new(self.contract_address()?, provider);

        let result = contract.MIN_QUORUM_BPS().call().await?;

        Ok(result)
    }

    pub async fn get_proposal(&self, proposal_id: u64) -> Result<Proposal, ContractsError> {
        let provider = ProviderBuilder::new().connect_http(self.config.rpc_url.parse()?);

        let contract = GovernanceDAO::new(self.contract_address()?, provider);

        let result = contract
            .getProposal(U256::from(proposal_id))
            .call()
            .await?;

        Ok(result)
    }

    pub async fn get_proposal_created_logs(&self) -> Result<Vec<Log>, ContractsError> {
        let provider = ProviderBuilder::new().connect_http(self.config.rpc_url.parse()?);

        let filter = Filter::new()
            .address(self.contract_address()?)
            .event_signature(ProposalCreated::SIGNATURE_HASH)
            .from_block(self.deployment_block)
            .to_block(BlockNumberOrTag::Latest);

        let logs = provider.get_logs(&filter).await?;

        Ok(logs)
    }

    /// Sends `vote(proposalId, support)` signed by `signer` and waits for the receipt.
    pub async fn cast_vote(
        &self,
        signer: &PrivateKeySigner,
        proposal_id: u64,
        support: bool,
    ) -> Result<B256, ContractsError> {
        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer.clone()))
            .connect_http(self.config.rpc_url.parse()?);

        let contract = GovernanceDAO::new(self.contract_address()?, provider);

        let pending = contract
            .vote(U256::from(proposal_id), support)
            .send()
            .await
            .map_err(|e| ContractsError::from(e).classify())?;

        let receipt = pending.get_receipt().await?;

        if !receipt.status() {
            return Err(ContractsError::TransactionReverted(receipt.transaction_hash));
        }

        Ok(receipt.transaction_hash)
    }
}

#[async_trait]
impl GovernanceSource for GovernanceDaoContract {
    fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    async fn min_quorum_bps(&self) -> Result<u64, ContractsError> {
        Ok(u256_to_u64(self.get_min_quorum_bps().await?))
    }

    async fn created_proposal_ids(&self) -> Result<Vec<u64>, ContractsError> {
        let logs = self.get_proposal_created_logs().await?;

        let mut ids = BTreeSet::new();
        for log in logs {
            match log.log_decode::<ProposalCreated>() {
                Ok(decoded) => {
                    ids.insert(u256_to_u64(decoded.inner.data.proposalId));
                }
                Err(e) => debug!(error = %e, "skipping undecodable ProposalCreated log"),
            }
        }

        Ok(ids.into_iter().collect())
    }

    async fn proposal(&self, proposal_id: u64) -> Result<Option<Proposal>, ContractsError> {
        let proposal = self.get_proposal(proposal_id).await?;
        if !proposal.exists {
            return Ok(None);
        }
        Ok(Some(proposal))
    }

    async fn latest_block(&self) -> Result<u64, ContractsError> {
        let provider = ProviderBuilder::new().connect_http(self.config.rpc_url.parse()?);

        Ok(provider.get_block_number().await?)
    }

    async fn vote_logs(&self, voter: Address, from_block: u64) -> Result<Vec<Log>, ContractsError> {
        let provider = ProviderBuilder::new().connect_http(self.config.rpc_url.parse()?);

        let filter = Filter::new()
            .address(self.contract_address()?)
            .event_signature(VoteCast::SIGNATURE_HASH)
            .topic2(voter.into_word())
            .from_block(from_block)
            .to_block(BlockNumberOrTag::Latest);

        let logs = provider.get_logs(&filter).await?;

        debug!(%voter, from_block, count = logs.len(), "fetched VoteCast logs");

        Ok(logs)
    }

    async fn block_timestamp(&self, block_number: u64) -> Result<Option<u64>, ContractsError> {
        let provider = ProviderBuilder::new().connect_http(self.config.rpc_url.parse()?);

        let block = provider
            .get_block_by_number(BlockNumberOrTag::Number(block_number))
            .await?;

        if block.is_none() {
            warn!(block_number, "block not found while resolving timestamp");
        }

        Ok(block.map(|b| b.header.timestamp))
    }
}
