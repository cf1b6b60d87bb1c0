use crate::{ContractCallConfig, ContractsError, VerifierRegistry};
use alloy::primitives::Address;
use alloy::providers::ProviderBuilder;
use std::str::FromStr;

pub struct VerifierRegistryContract {
    config: ContractCallConfig,
}

impl VerifierRegistryContract {
    pub fn new(config: ContractCallConfig) -> Self {
        Self { config }
    }

    pub async fn is_verifier(&self, account: Address) -> Result<bool, ContractsError> {
        if !self.config.is_configured() {
            return Err(ContractsError::MissingContractAddress("VerifierRegistry"));
        }

        let provider = ProviderBuilder::new().connect_http(self.config.rpc_url.parse()?);

        let contract_address = Address::from_str(self.config.contract_address.trim())?;

        let contract = VerifierRegistry::new(contract_address, provider);

        let result = contract.isVerifier(account).call().await?;

        Ok(result)
    }
}
