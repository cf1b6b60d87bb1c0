use crate::ResearchPaperNFT::PaperMinted;
use crate::{ContractCallConfig, ContractsError, ResearchPaperNFT};
use alloy::network::EthereumWallet;
use alloy::primitives::ruint::aliases::U256;
use alloy::primitives::{Address, B256};
use alloy::providers::ProviderBuilder;
use alloy::signers::local::PrivateKeySigner;
use std::str::FromStr;
use tracing::info;

#[derive(Debug, Clone)]
pub struct MintedPaper {
    pub transaction_hash: B256,
    /// `None` when the receipt carried no `PaperMinted` log.
    pub token_id: Option<U256>,
}

pub struct ResearchPaperNftContract {
    config: ContractCallConfig,
}

impl ResearchPaperNftContract {
    pub fn new(config: ContractCallConfig) -> Self {
        Self { config }
    }

    pub async fn mint_paper(
        &self,
        signer: &PrivateKeySigner,
        to: Address,
        token_uri: &str,
        title: &str,
        paper_type: u8,
    ) -> Result<MintedPaper, ContractsError> {
        if !self.config.is_configured() {
            return Err(ContractsError::MissingContractAddress("ResearchPaperNFT"));
        }

        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer.clone()))
            .connect_http(self.config.rpc_url.parse()?);

        let contract_address = Address::from_str(self.config.contract_address.trim())?;

        let contract = ResearchPaperNFT::new(contract_address, provider);

        let pending = contract
            .mintPaper(to, token_uri.to_string(), title.to_string(), paper_type)
            .send()
            .await
            .map_err(|e| ContractsError::from(e).classify())?;

        let receipt = pending.get_receipt().await?;

        if !receipt.status() {
            return Err(ContractsError::TransactionReverted(receipt.transaction_hash));
        }

        let token_id = receipt
            .inner
            .logs()
            .iter()
            .find_map(|log| log.log_decode::<PaperMinted>().ok())
            .map(|decoded| decoded.inner.data.tokenId);

        info!(tx = %receipt.transaction_hash, ?token_id, "paper minted");

        Ok(MintedPaper {
            transaction_hash: receipt.transaction_hash,
            token_id,
        })
    }
}
