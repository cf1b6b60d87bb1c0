use alloy::hex::FromHexError;
use alloy::primitives::B256;
use thiserror::Error;

use crate::utils::is_user_rejection;

#[derive(Debug, Error)]
pub enum ContractsError {
    #[error("Failed to parse the RPC URL: {0}")]
    UrlParseError(#[from] url::ParseError),

    #[error("Failed to parse the contract address: {0}")]
    AddressParseError(#[from] FromHexError),

    #[error("Contract call failed: {0}")]
    ContractCallError(#[from] alloy::contract::Error),

    #[error("RPC request failed: {0}")]
    RpcError(#[from] alloy::transports::TransportError),

    #[error("Waiting for transaction failed: {0}")]
    PendingTransactionError(#[from] alloy::providers::PendingTransactionError),

    #[error("Invalid signer key: {0}")]
    SignerError(#[from] alloy::signers::local::LocalSignerError),

    #[error("Contract address for {0} is not configured")]
    MissingContractAddress(&'static str),

    #[error("Transaction {0} reverted")]
    TransactionReverted(B256),

    #[error("Transaction was rejected in your wallet")]
    UserRejected,
}

impl ContractsError {
    /// Folds wallet rejections into [`ContractsError::UserRejected`]; other errors pass through.
    pub fn classify(self) -> Self {
        if is_user_rejection(&self.to_string()) {
            return ContractsError::UserRejected;
        }
        self
    }

    pub fn is_user_rejected(&self) -> bool {
        matches!(self, ContractsError::UserRejected)
    }
}
