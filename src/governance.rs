use crate::errors::GovernanceError;
use crate::proposal::{MinQuorum, Proposal, ProposalLookup, VoteReceipt};
use crate::query_cache::{QueryCache, QueryPolicy, RetryDelay};
use alloy::primitives::Address;
use alloy::rpc::types::Log;
use contracts::GovernanceDAO::VoteCast;
use contracts::GovernanceSource;
use contracts::utils::u256_to_u64;
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// How far back vote receipts are looked up.
pub const VOTE_RECEIPT_LOOKBACK_BLOCKS: u64 = 50_000;

#[derive(Debug, Clone, Copy)]
pub struct GovernancePolicies {
    pub min_quorum: QueryPolicy,
    pub all_proposals: QueryPolicy,
    pub proposal: QueryPolicy,
    pub vote_receipts: QueryPolicy,
}

impl Default for GovernancePolicies {
    fn default() -> Self {
        Self {
            min_quorum: QueryPolicy {
                stale_time: Duration::from_secs(30 * 60),
                retry: 3,
                retry_delay: RetryDelay::default(),
                refetch_interval: None,
            },
            all_proposals: QueryPolicy {
                stale_time: Duration::from_secs(60),
                retry: 1,
                retry_delay: RetryDelay::Fixed(Duration::from_secs(1)),
                refetch_interval: None,
            },
            proposal: QueryPolicy {
                stale_time: Duration::from_secs(30),
                retry: 1,
                retry_delay: RetryDelay::Fixed(Duration::from_secs(1)),
                refetch_interval: None,
            },
            vote_receipts: QueryPolicy {
                stale_time: Duration::from_secs(5 * 60),
                retry: 1,
                retry_delay: RetryDelay::default(),
                refetch_interval: None,
            },
        }
    }
}

/// Cached reads of governance state.
pub struct GovernanceReader<S> {
    source: S,
    min_quorum: QueryCache<(), MinQuorum>,
    proposals: QueryCache<(), Vec<Proposal>>,
    proposal: QueryCache<u64, Proposal>,
    receipts: QueryCache<Address, Vec<VoteReceipt>>,
}

impl<S: GovernanceSource> GovernanceReader<S> {
    pub fn new(source: S) -> Self {
        Self::with_policies(source, GovernancePolicies::default())
    }

    pub fn with_policies(source: S, policies: GovernancePolicies) -> Self {
        Self {
            source,
            min_quorum: QueryCache::new("min_quorum", policies.min_quorum),
            proposals: QueryCache::new("all_proposals", policies.all_proposals),
            proposal: QueryCache::new("proposal", policies.proposal),
            receipts: QueryCache::new("vote_receipts", policies.vote_receipts),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub async fn fetch_min_quorum(&self) -> Result<MinQuorum, GovernanceError> {
        self.min_quorum
            .get_or_fetch((), move || self.load_min_quorum())
            .await
    }

    async fn load_min_quorum(&self) -> Result<MinQuorum, GovernanceError> {
        let bps = self.source.min_quorum_bps().await?;
        Ok(MinQuorum::from_bps(bps))
    }

    /// Every proposal announced by the contract, newest first.
    pub async fn fetch_all_proposals(&self) -> Result<Vec<Proposal>, GovernanceError> {
        self.proposals
            .get_or_fetch((), move || self.load_all_proposals())
            .await
    }

    async fn load_all_proposals(&self) -> Result<Vec<Proposal>, GovernanceError> {
        let ids = self.source.created_proposal_ids().await?;

        let fetched = join_all(ids.iter().map(|&id| async move {
            (id, self.source.proposal(id).await)
        }))
        .await;

        // Presence is decided by the lookup result; id 0 is a valid proposal.
        let mut proposals: Vec<Proposal> = fetched
            .into_iter()
            .filter_map(|(id, result)| match result {
                Ok(Some(raw)) => Some(Proposal {
                    id,
                    ..Proposal::from(raw)
                }),
                Ok(None) => {
                    debug!(id, "proposal announced but not present, skipping");
                    None
                }
                Err(e) => {
                    warn!(id, error = %e, "failed to load proposal, skipping");
                    None
                }
            })
            .collect();

        proposals.sort_by(|a, b| b.id.cmp(&a.id));

        info!(discovered = ids.len(), loaded = proposals.len(), "loaded proposals");

        Ok(proposals)
    }

    /// `Ok(None)` for [`ProposalLookup::Pending`]; the chain is not queried.
    pub async fn fetch_proposal(
        &self,
        lookup: ProposalLookup,
    ) -> Result<Option<Proposal>, GovernanceError> {
        let id = match lookup {
            ProposalLookup::Pending => return Ok(None),
            ProposalLookup::Id(id) => id,
        };

        let proposal = self
            .proposal
            .get_or_fetch_retrying(
                id,
                move || self.load_proposal(id),
                GovernanceError::is_retryable,
            )
            .await?;

        Ok(Some(proposal))
    }

    async fn load_proposal(&self, id: u64) -> Result<Proposal, GovernanceError> {
        match self.source.proposal(id).await? {
            Some(raw) => Ok(Proposal {
                id,
                ..Proposal::from(raw)
            }),
            None => Err(GovernanceError::NotFound(id)),
        }
    }

    /// Votes cast by `voter` within the last [`VOTE_RECEIPT_LOOKBACK_BLOCKS`] blocks,
    /// newest first. RPC failures are logged and yield an empty list.
    pub async fn fetch_vote_receipts(&self, voter: Option<Address>) -> Vec<VoteReceipt> {
        let Some(voter) = voter else {
            return Vec::new();
        };
        if !self.source.is_configured() {
            debug!("governance contract not configured, no vote receipts");
            return Vec::new();
        }

        let result = self
            .receipts
            .get_or_fetch(voter, move || self.load_vote_receipts(voter))
            .await;

        match result {
            Ok(receipts) => receipts,
            Err(e) => {
                warn!(%voter, error = %e, "failed to load vote receipts");
                Vec::new()
            }
        }
    }

    async fn load_vote_receipts(&self, voter: Address) -> Result<Vec<VoteReceipt>, GovernanceError> {
        let latest = self.source.latest_block().await?;
        let from_block = latest.saturating_sub(VOTE_RECEIPT_LOOKBACK_BLOCKS);

        let logs = self.source.vote_logs(voter, from_block).await?;

        let mut timestamps = HashMap::new();
        let mut receipts = Vec::with_capacity(logs.len());
        for log in &logs {
            match self.parse_vote_receipt(log, &mut timestamps).await {
                Some(receipt) => receipts.push(receipt),
                None => debug!(tx = ?log.transaction_hash, "skipping unparseable vote log"),
            }
        }

        receipts.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        Ok(receipts)
    }

    async fn parse_vote_receipt(
        &self,
        log: &Log,
        timestamps: &mut HashMap<u64, Option<u64>>,
    ) -> Option<VoteReceipt> {
        let event = log.log_decode::<VoteCast>().ok()?.inner.data;
        let transaction_hash = log.transaction_hash?;

        let timestamp = match log.block_timestamp {
            Some(timestamp) => timestamp,
            None => {
                let block_number = log.block_number?;
                match timestamps.get(&block_number) {
                    Some(cached) => (*cached)?,
                    None => {
                        let resolved = self
                            .source
                            .block_timestamp(block_number)
                            .await
                            .ok()
                            .flatten();
                        timestamps.insert(block_number, resolved);
                        resolved?
                    }
                }
            }
        };

        Some(VoteReceipt {
            proposal_id: u256_to_u64(event.proposalId),
            voter: event.voter,
            support: event.support,
            weight: event.weight,
            timestamp,
            transaction_hash,
        })
    }

    /// Drops cached proposal data, e.g. after a vote changed the tallies.
    pub async fn invalidate_proposals(&self) {
        self.proposals.invalidate(&()).await;
        self.proposal.clear();
    }

    pub async fn invalidate_vote_receipts(&self, voter: &Address) {
        self.receipts.invalidate(voter).await;
    }
}

impl<S: GovernanceSource + 'static> GovernanceReader<S> {
    /// Refetches the proposal list every `refetch_interval` of the all-proposals policy
    /// and publishes each successful result. `None` when no interval is configured.
    pub fn spawn_proposal_refresh(
        self: &Arc<Self>,
    ) -> Option<(watch::Receiver<Vec<Proposal>>, JoinHandle<()>)> {
        let interval = self
            .proposals
            .policy()
            .refetch_interval
            .filter(|i| !i.is_zero())?;

        let (tx, rx) = watch::channel(Vec::new());
        let reader = Arc::clone(self);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                reader.proposals.invalidate(&()).await;
                match reader.fetch_all_proposals().await {
                    Ok(proposals) => {
                        if tx.send(proposals).is_err() {
                            debug!("proposal refresh has no subscribers, stopping");
                            break;
                        }
                    }
                    Err(e) => warn!(error = %e, "periodic proposal refresh failed"),
                }
            }
        });

        Some((rx, handle))
    }
}
