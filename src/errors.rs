use api::errors::ApiError;
use contracts::errors::ContractsError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GovernanceError {
    #[error("Proposal {0} not found")]
    NotFound(u64),
    #[error("Contract error: {0}")]
    ContractError(#[from] ContractsError),
}

impl GovernanceError {
    /// `NotFound` is a final answer from the contract; only call failures are retried.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, GovernanceError::NotFound(_))
    }
}

#[derive(Error, Debug)]
pub enum JudolError {
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Governance error: {0}")]
    GovernanceError(#[from] GovernanceError),
    #[error("Contract error: {0}")]
    ContractCallError(#[from] ContractsError),
    #[error("Api call error: {0}")]
    ApiError(#[from] ApiError),
    #[error("Invalid paper: {0}")]
    InvalidPaper(String),
    #[error("Paper store error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl JudolError {
    /// Message suitable for showing to the person operating the wallet.
    pub fn user_message(&self) -> String {
        match self {
            JudolError::ContractCallError(e) if e.is_user_rejected() => e.to_string(),
            JudolError::GovernanceError(GovernanceError::ContractError(e))
                if e.is_user_rejected() =>
            {
                e.to_string()
            }
            JudolError::ApiError(ApiError::MissingToken) => {
                "IPFS uploads are disabled: set JUDOL_PINATA_JWT".to_string()
            }
            other => other.to_string(),
        }
    }
}
