use crate::errors::JudolError;
use crate::governance::{GovernancePolicies, GovernanceReader};
use crate::paper::{
    LocalPaperStore, Paper, PaperCatalog, PaperStatus, PaperType, validate_sinta_rank,
};
use crate::proposal::{MinQuorum, Proposal, ProposalLookup, VoteReceipt};
use crate::stats::{VotingStats, compute_voting_stats_now};
use alloy::primitives::{Address, B256};
use alloy::signers::local::PrivateKeySigner;
use api::errors::ApiError;
use api::types::pinning::{FileUpload, PinResponse, PinataMetadata};
use api::{DEFAULT_IPFS_GATEWAY_URL, DEFAULT_PINATA_API_URL, PinataApiProvider};
use contracts::ContractCallConfig;
use contracts::contract::governance_dao::GovernanceDaoContract;
use contracts::contract::research_paper_nft::ResearchPaperNftContract;
use contracts::contract::verifier_registry::VerifierRegistryContract;
use contracts::errors::ContractsError;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::info;

pub const DEFAULT_PAPER_STORE: &str = "judol_papers.json";

#[derive(Debug, Clone)]
pub struct JudolAPIConfiguration {
    pub rpc_url: String,
    pub pinata_api_url: String,
    pub ipfs_gateway_url: String,
    pub pinata_jwt: Option<String>,
    pub proposal_refresh_interval: Option<Duration>,
}

#[derive(Debug, Clone)]
pub struct JudolContractsConfiguration {
    pub governance_dao_address: String,
    pub research_paper_nft_address: String,
    pub verifier_registry_address: String,
    pub governance_deployment_block: u64,
}

#[derive(Debug, Clone)]
pub struct JudolUserConfiguration {
    pub private_key: Option<String>,
    pub paper_store_path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct JudolConfiguration {
    pub api_configuration: JudolAPIConfiguration,
    pub contracts_configuration: JudolContractsConfiguration,
    pub user_configuration: JudolUserConfiguration,
}

impl JudolConfiguration {
    pub fn from_env() -> Result<Self, JudolError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from `lookup`, treating blank values as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, JudolError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let rpc_url = get("JUDOL_RPC_URL").ok_or_else(|| {
            JudolError::Configuration("JUDOL_RPC_URL environment variable not set".to_string())
        })?;

        let governance_deployment_block = match get("JUDOL_GOVERNANCE_DEPLOYMENT_BLOCK") {
            Some(value) => value.parse().map_err(|_| {
                JudolError::Configuration(format!(
                    "JUDOL_GOVERNANCE_DEPLOYMENT_BLOCK is not a block number: {value}"
                ))
            })?,
            None => 0,
        };

        let proposal_refresh_interval = match get("JUDOL_PROPOSAL_REFRESH_SECS") {
            Some(value) => {
                let secs: u64 = value.parse().map_err(|_| {
                    JudolError::Configuration(format!(
                        "JUDOL_PROPOSAL_REFRESH_SECS is not a number of seconds: {value}"
                    ))
                })?;
                Some(Duration::from_secs(secs)).filter(|d| !d.is_zero())
            }
            None => None,
        };

        Ok(Self {
            api_configuration: JudolAPIConfiguration {
                rpc_url,
                pinata_api_url: get("JUDOL_PINATA_API_URL")
                    .unwrap_or_else(|| DEFAULT_PINATA_API_URL.to_string()),
                ipfs_gateway_url: get("JUDOL_IPFS_GATEWAY_URL")
                    .unwrap_or_else(|| DEFAULT_IPFS_GATEWAY_URL.to_string()),
                pinata_jwt: get("JUDOL_PINATA_JWT"),
                proposal_refresh_interval,
            },
            contracts_configuration: JudolContractsConfiguration {
                governance_dao_address: get("JUDOL_GOVERNANCE_DAO_ADDRESS").unwrap_or_default(),
                research_paper_nft_address: get("JUDOL_RESEARCH_PAPER_NFT_ADDRESS")
                    .unwrap_or_default(),
                verifier_registry_address: get("JUDOL_VERIFIER_REGISTRY_ADDRESS")
                    .unwrap_or_default(),
                governance_deployment_block,
            },
            user_configuration: JudolUserConfiguration {
                private_key: get("JUDOL_PRIVATE_KEY"),
                paper_store_path: get("JUDOL_PAPER_STORE")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_PAPER_STORE)),
            },
        })
    }
}

/// Author-supplied fields of a paper submission.
#[derive(Debug, Clone)]
pub struct PaperDraft {
    pub title: String,
    pub author: String,
    pub organization: String,
    pub abstract_text: String,
    pub paper_type: PaperType,
    pub license: String,
    pub sinta_rank: Option<u8>,
    pub price: String,
}

impl PaperDraft {
    /// Checks run before anything is pinned or minted.
    pub fn validate(&self) -> Result<(), JudolError> {
        if self.title.trim().is_empty() {
            return Err(JudolError::InvalidPaper("title must not be empty".to_string()));
        }
        validate_sinta_rank(self.sinta_rank)
    }
}

pub struct Judol {
    config: JudolConfiguration,
    governance: Arc<GovernanceReader<GovernanceDaoContract>>,
    paper_nft: ResearchPaperNftContract,
    verifier_registry: VerifierRegistryContract,
    pinata: PinataApiProvider,
    paper_store: LocalPaperStore,
    signer: Option<PrivateKeySigner>,
}

impl Judol {
    pub fn new(config: JudolConfiguration) -> Result<Self, JudolError> {
        let api_configuration = &config.api_configuration;
        let contracts_configuration = &config.contracts_configuration;

        if api_configuration.rpc_url.trim().is_empty() {
            return Err(JudolError::Configuration(
                "RPC URL must not be empty".to_string(),
            ));
        }

        let signer = match &config.user_configuration.private_key {
            Some(key) => Some(PrivateKeySigner::from_str(key.trim()).map_err(ContractsError::from)?),
            None => None,
        };

        let pinata = PinataApiProvider::new(
            &api_configuration.pinata_api_url,
            api_configuration.pinata_jwt.clone(),
        )?
        .with_gateway(&api_configuration.ipfs_gateway_url)?;

        let call_config = |address: &String| ContractCallConfig {
            rpc_url: api_configuration.rpc_url.clone(),
            contract_address: address.clone(),
        };

        let mut policies = GovernancePolicies::default();
        policies.all_proposals.refetch_interval = api_configuration.proposal_refresh_interval;

        let governance_contract =
            GovernanceDaoContract::new(call_config(&contracts_configuration.governance_dao_address))
                .with_deployment_block(contracts_configuration.governance_deployment_block);

        let governance = Arc::new(GovernanceReader::with_policies(
            governance_contract,
            policies,
        ));
        let paper_nft =
            ResearchPaperNftContract::new(call_config(&contracts_configuration.research_paper_nft_address));
        let verifier_registry =
            VerifierRegistryContract::new(call_config(&contracts_configuration.verifier_registry_address));
        let paper_store = LocalPaperStore::new(config.user_configuration.paper_store_path.clone());

        return Ok(Self {
            config,
            governance,
            paper_nft,
            verifier_registry,
            pinata,
            paper_store,
            signer,
        });
    }

    pub fn config(&self) -> &JudolConfiguration {
        &self.config
    }

    pub fn governance(&self) -> &Arc<GovernanceReader<GovernanceDaoContract>> {
        &self.governance
    }

    /// Starts the periodic proposal refresh configured by `JUDOL_PROPOSAL_REFRESH_SECS`.
    /// `None` when no refresh interval is configured.
    pub fn spawn_proposal_refresh(
        &self,
    ) -> Option<(watch::Receiver<Vec<Proposal>>, JoinHandle<()>)> {
        self.governance.spawn_proposal_refresh()
    }

    pub fn signer_address(&self) -> Option<Address> {
        self.signer.as_ref().map(|s| s.address())
    }

    pub async fn fetch_min_quorum(&self) -> Result<MinQuorum, JudolError> {
        Ok(self.governance.fetch_min_quorum().await?)
    }

    pub async fn fetch_all_proposals(&self) -> Result<Vec<Proposal>, JudolError> {
        Ok(self.governance.fetch_all_proposals().await?)
    }

    pub async fn fetch_proposal(
        &self,
        lookup: ProposalLookup,
    ) -> Result<Option<Proposal>, JudolError> {
        Ok(self.governance.fetch_proposal(lookup).await?)
    }

    pub async fn fetch_vote_receipts(&self, voter: Option<Address>) -> Vec<VoteReceipt> {
        self.governance.fetch_vote_receipts(voter).await
    }

    pub fn voting_stats(&self, proposal: &Proposal) -> VotingStats {
        compute_voting_stats_now(proposal)
    }

    pub async fn is_verifier(&self, account: Address) -> Result<bool, JudolError> {
        Ok(self.verifier_registry.is_verifier(account).await?)
    }

    pub async fn cast_vote(&self, proposal_id: u64, support: bool) -> Result<B256, JudolError> {
        let signer = self.require_signer()?;

        let tx_hash = self
            .governance
            .source()
            .cast_vote(signer, proposal_id, support)
            .await?;

        info!(proposal_id, support, tx = %tx_hash, "vote cast");

        self.governance.invalidate_proposals().await;
        self.governance
            .invalidate_vote_receipts(&signer.address())
            .await;

        Ok(tx_hash)
    }

    pub fn papers(&self) -> PaperCatalog {
        PaperCatalog::load(&self.paper_store)
    }

    pub async fn upload_file_to_ipfs(&self, path: &Path) -> Result<PinResponse, JudolError> {
        if !self.pinata.has_token() {
            return Err(ApiError::MissingToken.into());
        }

        let upload = file_upload_from_path(path).await?;
        let metadata = PinataMetadata::named(upload.file_name.clone());

        Ok(self.pinata.upload_file_to_ipfs(upload, &metadata).await?)
    }

    /// Pins the file and its metadata, mints the paper NFT when a signer and NFT
    /// contract are configured, and records the paper locally.
    pub async fn submit_paper(
        &self,
        draft: PaperDraft,
        upload: FileUpload,
    ) -> Result<Paper, JudolError> {
        draft.validate()?;
        if !self.pinata.has_token() {
            return Err(ApiError::MissingToken.into());
        }

        let file_metadata = PinataMetadata::named(upload.file_name.clone())
            .with_keyvalue("title", draft.title.clone())
            .with_keyvalue("type", format!("{:?}", draft.paper_type));
        let file_pin = self.pinata.upload_file_to_ipfs(upload, &file_metadata).await?;

        let paper_metadata = json!({
            "name": draft.title,
            "description": draft.abstract_text,
            "author": draft.author,
            "organization": draft.organization,
            "license": draft.license,
            "type": draft.paper_type,
            "sintaRank": draft.sinta_rank,
            "file": format!("ipfs://{}", file_pin.ipfs_hash),
        });
        let metadata_pin = self
            .pinata
            .upload_json_to_ipfs(
                &paper_metadata,
                &PinataMetadata::named(format!("{}-metadata.json", draft.title)),
            )
            .await?;

        let token_id = match (&self.signer, self.paper_nft_configured()) {
            (Some(signer), true) => {
                let minted = self
                    .paper_nft
                    .mint_paper(
                        signer,
                        signer.address(),
                        &format!("ipfs://{}", metadata_pin.ipfs_hash),
                        &draft.title,
                        draft.paper_type.code(),
                    )
                    .await?;
                minted.token_id.map(|id| id.to_string())
            }
            _ => None,
        };

        let status = match draft.paper_type {
            PaperType::Research => PaperStatus::Processing,
            PaperType::Dataset => PaperStatus::DataPool,
        };

        let paper = Paper {
            id: format!("local-{}", chrono::Utc::now().timestamp_millis()),
            title: draft.title,
            author: draft.author,
            organization: draft.organization,
            abstract_text: draft.abstract_text,
            paper_type: draft.paper_type,
            license: draft.license,
            sinta_rank: draft.sinta_rank,
            ai_score: 0,
            status,
            price: draft.price,
            ipfs_hash: Some(file_pin.ipfs_hash),
            token_id,
        };

        self.paper_store.append(paper.clone())?;

        info!(id = %paper.id, cid = ?paper.ipfs_hash, token = ?paper.token_id, "paper submitted");

        Ok(paper)
    }

    fn paper_nft_configured(&self) -> bool {
        !self
            .config
            .contracts_configuration
            .research_paper_nft_address
            .trim()
            .is_empty()
    }

    fn require_signer(&self) -> Result<&PrivateKeySigner, JudolError> {
        self.signer.as_ref().ok_or_else(|| {
            JudolError::Configuration("JUDOL_PRIVATE_KEY is required to sign transactions".to_string())
        })
    }
}

fn content_type_for(path: &Path) -> Option<String> {
    let extension = path.extension()?.to_str()?.to_lowercase();
    let content_type = match extension.as_str() {
        "pdf" => "application/pdf",
        "json" => "application/json",
        "csv" => "text/csv",
        "txt" | "md" => "text/plain",
        "zip" => "application/zip",
        _ => return None,
    };
    Some(content_type.to_string())
}

pub async fn file_upload_from_path(path: &Path) -> Result<FileUpload, JudolError> {
    let bytes = tokio::fs::read(path).await?;
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("upload")
        .to_string();

    Ok(FileUpload {
        file_name,
        content_type: content_type_for(path),
        bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn from_lookup_requires_rpc_url() {
        let err = JudolConfiguration::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, JudolError::Configuration(_)));
    }

    #[test]
    fn from_lookup_applies_defaults() {
        let config = JudolConfiguration::from_lookup(lookup(&[
            ("JUDOL_RPC_URL", "http://127.0.0.1:8545"),
            ("JUDOL_PINATA_JWT", "  "),
        ]))
        .unwrap();

        assert_eq!(config.api_configuration.pinata_api_url, DEFAULT_PINATA_API_URL);
        assert_eq!(config.api_configuration.pinata_jwt, None);
        assert_eq!(config.contracts_configuration.governance_dao_address, "");
        assert_eq!(config.contracts_configuration.governance_deployment_block, 0);
        assert_eq!(
            config.user_configuration.paper_store_path,
            PathBuf::from(DEFAULT_PAPER_STORE)
        );
    }

    #[test]
    fn from_lookup_rejects_bad_numbers() {
        let err = JudolConfiguration::from_lookup(lookup(&[
            ("JUDOL_RPC_URL", "http://127.0.0.1:8545"),
            ("JUDOL_GOVERNANCE_DEPLOYMENT_BLOCK", "latest"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("JUDOL_GOVERNANCE_DEPLOYMENT_BLOCK"));
    }

    #[tokio::test]
    async fn proposal_refresh_follows_configuration() {
        let disabled = Judol::new(
            JudolConfiguration::from_lookup(lookup(&[("JUDOL_RPC_URL", "http://127.0.0.1:1")]))
                .unwrap(),
        )
        .unwrap();
        assert!(disabled.spawn_proposal_refresh().is_none());

        let enabled = Judol::new(
            JudolConfiguration::from_lookup(lookup(&[
                ("JUDOL_RPC_URL", "http://127.0.0.1:1"),
                ("JUDOL_PROPOSAL_REFRESH_SECS", "30"),
            ]))
            .unwrap(),
        )
        .unwrap();
        let (_rx, handle) = enabled.spawn_proposal_refresh().unwrap();
        handle.abort();
    }

    #[test]
    fn content_types_by_extension() {
        assert_eq!(
            content_type_for(Path::new("paper.PDF")).as_deref(),
            Some("application/pdf")
        );
        assert_eq!(content_type_for(Path::new("data.parquet")), None);
        assert_eq!(content_type_for(Path::new("README")), None);
    }
}
