#[cfg(test)]
mod tests {
    use alloy::primitives::{Address, B256, Bytes, U256, address};
    use alloy::rpc::types::Log;
    use alloy::sol_types::SolEvent;
    use async_trait::async_trait;
    use contracts::GovernanceDAO;
    use contracts::GovernanceDAO::VoteCast;
    use contracts::errors::ContractsError;
    use judol_rust_sdk::query_cache::{QueryPolicy, RetryDelay};
    use judol_rust_sdk::{
        GovernanceError, GovernancePolicies, GovernanceReader, GovernanceSource, ProposalLookup,
        ProposalStatus, VOTE_RECEIPT_LOOKBACK_BLOCKS,
    };
    use std::collections::{HashMap, HashSet};
    use std::sync::Arc;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    const DAO: Address = address!("0x1111111111111111111111111111111111111111");
    const VOTER: Address = address!("0x2222222222222222222222222222222222222222");

    #[derive(Default)]
    struct FakeSource {
        configured: bool,
        quorum_bps: u64,
        announced: Vec<u64>,
        proposals: HashMap<u64, GovernanceDAO::Proposal>,
        failing: HashSet<u64>,
        latest_block: u64,
        logs: Vec<Log>,
        block_timestamps: HashMap<u64, u64>,
        fail_logs: bool,
        discovery_calls: AtomicUsize,
        proposal_calls: AtomicUsize,
        quorum_calls: AtomicUsize,
        log_calls: AtomicUsize,
        timestamp_calls: AtomicUsize,
        last_from_block: Mutex<Option<u64>>,
    }

    fn raw_proposal(id: u64, title: &str, exists: bool) -> GovernanceDAO::Proposal {
        GovernanceDAO::Proposal {
            id: U256::from(id),
            proposer: DAO,
            title: title.to_string(),
            description: format!("{title} description"),
            status: 0,
            votesFor: 10,
            votesAgainst: 2,
            totalVotes: 12,
            requiredVotes: 20,
            endTime: 1_800_000_000,
            exists,
        }
    }

    fn vote_log(
        proposal_id: u64,
        support: bool,
        weight: u64,
        block: u64,
        timestamp: Option<u64>,
        tx: u8,
    ) -> Log {
        let event = VoteCast {
            proposalId: U256::from(proposal_id),
            voter: VOTER,
            support,
            weight: U256::from(weight),
        };
        Log {
            inner: alloy::primitives::Log {
                address: DAO,
                data: event.encode_log_data(),
            },
            block_number: Some(block),
            block_timestamp: timestamp,
            transaction_hash: Some(B256::repeat_byte(tx)),
            ..Default::default()
        }
    }

    fn malformed_log(block: u64) -> Log {
        Log {
            inner: alloy::primitives::Log::new_unchecked(
                DAO,
                vec![VoteCast::SIGNATURE_HASH],
                Bytes::from(vec![1, 2, 3]),
            ),
            block_number: Some(block),
            block_timestamp: Some(1),
            transaction_hash: Some(B256::repeat_byte(0xee)),
            ..Default::default()
        }
    }

    #[async_trait]
    impl GovernanceSource for FakeSource {
        fn is_configured(&self) -> bool {
            self.configured
        }

        async fn min_quorum_bps(&self) -> Result<u64, ContractsError> {
            self.quorum_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.quorum_bps)
        }

        async fn created_proposal_ids(&self) -> Result<Vec<u64>, ContractsError> {
            self.discovery_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.announced.clone())
        }

        async fn proposal(
            &self,
            proposal_id: u64,
        ) -> Result<Option<GovernanceDAO::Proposal>, ContractsError> {
            self.proposal_calls.fetch_add(1, Ordering::SeqCst);
            if self.failing.contains(&proposal_id) {
                return Err(ContractsError::MissingContractAddress("GovernanceDAO"));
            }
            Ok(self
                .proposals
                .get(&proposal_id)
                .filter(|p| p.exists)
                .cloned())
        }

        async fn latest_block(&self) -> Result<u64, ContractsError> {
            Ok(self.latest_block)
        }

        async fn vote_logs(
            &self,
            voter: Address,
            from_block: u64,
        ) -> Result<Vec<Log>, ContractsError> {
            self.log_calls.fetch_add(1, Ordering::SeqCst);
            *self.last_from_block.lock().unwrap() = Some(from_block);
            if self.fail_logs {
                return Err(ContractsError::RpcError(
                    alloy::transports::TransportErrorKind::custom_str("connection refused"),
                ));
            }
            assert_eq!(voter, VOTER);
            Ok(self.logs.clone())
        }

        async fn block_timestamp(&self, block_number: u64) -> Result<Option<u64>, ContractsError> {
            self.timestamp_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.block_timestamps.get(&block_number).copied())
        }
    }

    fn governance_source() -> FakeSource {
        let mut proposals = HashMap::new();
        proposals.insert(0, raw_proposal(0, "Genesis reviewer reward pool", true));
        proposals.insert(1, raw_proposal(1, "Lower AI prescreen threshold", true));
        proposals.insert(2, raw_proposal(2, "Broken proposal", true));
        proposals.insert(5, raw_proposal(5, "Deleted proposal", false));

        FakeSource {
            configured: true,
            quorum_bps: 2500,
            announced: vec![0, 1, 2, 5],
            proposals,
            failing: HashSet::from([2]),
            latest_block: 120_000,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn all_proposals_keep_id_zero_and_sort_newest_first() {
        let reader = GovernanceReader::new(governance_source());

        let proposals = reader.fetch_all_proposals().await.unwrap();

        let ids: Vec<u64> = proposals.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 0]);
        assert_eq!(proposals[1].title, "Genesis reviewer reward pool");
        assert_eq!(proposals[1].status, ProposalStatus::Active);
    }

    #[tokio::test]
    async fn all_proposals_are_cached() {
        let reader = GovernanceReader::new(governance_source());

        reader.fetch_all_proposals().await.unwrap();
        reader.fetch_all_proposals().await.unwrap();
        assert_eq!(reader.source().discovery_calls.load(Ordering::SeqCst), 1);

        reader.invalidate_proposals().await;
        reader.fetch_all_proposals().await.unwrap();
        assert_eq!(reader.source().discovery_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn pending_proposal_is_not_fetched() {
        let reader = GovernanceReader::new(governance_source());

        let result = reader.fetch_proposal(ProposalLookup::Pending).await.unwrap();

        assert!(result.is_none());
        assert_eq!(reader.source().proposal_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn proposal_zero_is_found() {
        let reader = GovernanceReader::new(governance_source());

        let proposal = reader
            .fetch_proposal(ProposalLookup::Id(0))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(proposal.id, 0);
        assert_eq!(proposal.total_votes, 12);
    }

    #[tokio::test]
    async fn missing_proposal_is_not_found_without_retry() {
        let reader = GovernanceReader::new(governance_source());

        let err = reader
            .fetch_proposal(ProposalLookup::Id(5))
            .await
            .unwrap_err();

        assert!(matches!(err, GovernanceError::NotFound(5)));
        assert_eq!(reader.source().proposal_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn failing_proposal_is_retried() {
        let reader = GovernanceReader::new(governance_source());

        let err = reader
            .fetch_proposal(ProposalLookup::Id(2))
            .await
            .unwrap_err();

        assert!(matches!(err, GovernanceError::ContractError(_)));
        assert_eq!(reader.source().proposal_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn min_quorum_reports_bps_and_percentage() {
        let reader = GovernanceReader::new(governance_source());

        let quorum = reader.fetch_min_quorum().await.unwrap();
        reader.fetch_min_quorum().await.unwrap();

        assert_eq!(quorum.bps, 2500);
        assert_eq!(quorum.percentage, 25.0);
        assert_eq!(reader.source().quorum_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn receipts_without_voter_or_contract_are_empty() {
        let reader = GovernanceReader::new(governance_source());
        assert!(reader.fetch_vote_receipts(None).await.is_empty());

        let unconfigured = GovernanceReader::new(FakeSource::default());
        assert!(unconfigured.fetch_vote_receipts(Some(VOTER)).await.is_empty());
        assert_eq!(unconfigured.source().log_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn receipts_with_no_logs_are_empty() {
        let reader = GovernanceReader::new(governance_source());

        let receipts = reader.fetch_vote_receipts(Some(VOTER)).await;

        assert!(receipts.is_empty());
        assert_eq!(
            *reader.source().last_from_block.lock().unwrap(),
            Some(120_000 - VOTE_RECEIPT_LOOKBACK_BLOCKS)
        );
    }

    #[tokio::test]
    async fn receipts_are_parsed_sorted_and_skip_bad_logs() {
        let mut source = governance_source();
        source.logs = vec![
            vote_log(0, true, 100, 90_000, Some(1_700_000_100), 1),
            malformed_log(90_001),
            vote_log(1, false, 40, 95_000, None, 2),
            vote_log(1, true, 5, 96_000, None, 3),
        ];
        source.block_timestamps = HashMap::from([(95_000, 1_700_000_500)]);
        let reader = GovernanceReader::new(source);

        let receipts = reader.fetch_vote_receipts(Some(VOTER)).await;

        assert_eq!(receipts.len(), 2);
        assert_eq!(receipts[0].proposal_id, 1);
        assert!(!receipts[0].support);
        assert_eq!(receipts[0].timestamp, 1_700_000_500);
        assert_eq!(receipts[0].transaction_hash, B256::repeat_byte(2));
        assert_eq!(receipts[1].proposal_id, 0);
        assert_eq!(receipts[1].weight, U256::from(100));
        assert_eq!(receipts[1].voter, VOTER);
        assert_eq!(reader.source().timestamp_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn receipts_lookback_saturates_at_genesis() {
        let mut source = governance_source();
        source.latest_block = 1_000;
        let reader = GovernanceReader::new(source);

        reader.fetch_vote_receipts(Some(VOTER)).await;

        assert_eq!(*reader.source().last_from_block.lock().unwrap(), Some(0));
    }

    #[tokio::test(start_paused = true)]
    async fn receipts_rpc_failure_resolves_to_empty() {
        let mut source = governance_source();
        source.fail_logs = true;
        let reader = GovernanceReader::new(source);

        let receipts = reader.fetch_vote_receipts(Some(VOTER)).await;

        assert!(receipts.is_empty());
        assert_eq!(reader.source().log_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn periodic_refresh_publishes_proposals() {
        let policies = GovernancePolicies {
            all_proposals: QueryPolicy {
                stale_time: Duration::from_secs(60),
                retry: 0,
                retry_delay: RetryDelay::Fixed(Duration::from_secs(1)),
                refetch_interval: Some(Duration::from_secs(15)),
            },
            ..GovernancePolicies::default()
        };
        let reader = Arc::new(GovernanceReader::with_policies(governance_source(), policies));

        let (mut rx, handle) = reader.spawn_proposal_refresh().unwrap();

        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().len(), 2);

        rx.changed().await.unwrap();
        assert_eq!(reader.source().discovery_calls.load(Ordering::SeqCst), 2);

        handle.abort();
    }

    #[tokio::test]
    async fn refresh_is_disabled_without_interval() {
        let reader = Arc::new(GovernanceReader::new(governance_source()));
        assert!(reader.spawn_proposal_refresh().is_none());
    }
}
