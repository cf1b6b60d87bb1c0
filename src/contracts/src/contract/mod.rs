pub mod governance_dao;
pub mod research_paper_nft;
pub mod verifier_registry;
