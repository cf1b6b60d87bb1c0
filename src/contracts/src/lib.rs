pub mod contract;
pub mod errors;
pub mod source;
pub mod utils;

pub use crate::errors::ContractsError;
pub use crate::source::GovernanceSource;

use alloy::sol;

sol! {
    #[sol(rpc)]
    #[derive(Debug)]
    contract GovernanceDAO {
        struct Proposal {
            uint256 id;
            address proposer;
            string title;
            string description;
            uint8 status;
            uint64 votesFor;
            uint64 votesAgainst;
            uint64 totalVotes;
            uint64 requiredVotes;
            uint64 endTime;
            bool exists;
        }

        event ProposalCreated(uint256 indexed proposalId, address indexed proposer, string title, uint64 endTime);
        event VoteCast(uint256 indexed proposalId, address indexed voter, bool support, uint256 weight);

        function MIN_QUORUM_BPS() external view returns (uint256);
        function getProposal(uint256 proposalId) external view returns (Proposal memory);
        function vote(uint256 proposalId, bool support) external;
    }
}

sol! {
    #[sol(rpc)]
    #[derive(Debug)]
    contract ResearchPaperNFT {
        event PaperMinted(uint256 indexed tokenId, address indexed author, string tokenURI, uint8 paperType);

        function mintPaper(address to, string tokenURI, string title, uint8 paperType) external returns (uint256);
    }
}

sol! {
    #[sol(rpc)]
    #[derive(Debug)]
    contract VerifierRegistry {
        function isVerifier(address account) external view returns (bool);
    }
}

#[derive(Debug, Clone)]
pub struct ContractCallConfig {
    pub rpc_url: String,
    pub contract_address: String,
}

impl ContractCallConfig {
    /// An empty address means the contract is not deployed on the configured chain.
    pub fn is_configured(&self) -> bool {
        !self.contract_address.trim().is_empty()
    }
}
