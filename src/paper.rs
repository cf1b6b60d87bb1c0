use crate::errors::JudolError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaperType {
    Research,
    Dataset,
}

impl PaperType {
    /// Value passed as `paperType` when minting.
    pub fn code(&self) -> u8 {
        match self {
            PaperType::Research => 0,
            PaperType::Dataset => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaperStatus {
    Verified,
    Processing,
    DataPool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paper {
    pub id: String,
    pub title: String,
    pub author: String,
    pub organization: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    #[serde(rename = "type")]
    pub paper_type: PaperType,
    pub license: String,
    #[serde(default)]
    pub sinta_rank: Option<u8>,
    #[serde(default)]
    pub ai_score: u8,
    pub status: PaperStatus,
    pub price: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipfs_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_id: Option<String>,
}

impl Paper {
    pub fn validate(&self) -> Result<(), JudolError> {
        if self.id.trim().is_empty() {
            return Err(JudolError::InvalidPaper("id must not be empty".to_string()));
        }
        if self.title.trim().is_empty() {
            return Err(JudolError::InvalidPaper("title must not be empty".to_string()));
        }
        if self.ai_score > 100 {
            return Err(JudolError::InvalidPaper(format!(
                "ai score {} is outside 0..=100",
                self.ai_score
            )));
        }
        validate_sinta_rank(self.sinta_rank)
    }

    fn matches(&self, needle: &str) -> bool {
        [&self.title, &self.author, &self.organization]
            .iter()
            .any(|field| field.to_lowercase().contains(needle))
    }
}

pub(crate) fn validate_sinta_rank(rank: Option<u8>) -> Result<(), JudolError> {
    match rank {
        Some(rank) if !(1..=6).contains(&rank) => Err(JudolError::InvalidPaper(format!(
            "SINTA rank {rank} is outside 1..=6"
        ))),
        _ => Ok(()),
    }
}

#[allow(clippy::too_many_arguments)]
fn seed(
    id: &str,
    title: &str,
    author: &str,
    organization: &str,
    abstract_text: &str,
    paper_type: PaperType,
    sinta_rank: Option<u8>,
    ai_score: u8,
    status: PaperStatus,
    price: &str,
) -> Paper {
    Paper {
        id: id.to_string(),
        title: title.to_string(),
        author: author.to_string(),
        organization: organization.to_string(),
        abstract_text: abstract_text.to_string(),
        paper_type,
        license: "CC BY 4.0".to_string(),
        sinta_rank,
        ai_score,
        status,
        price: price.to_string(),
        ipfs_hash: None,
        token_id: None,
    }
}

/// Catalog entries shipped with the client.
pub fn seed_papers() -> Vec<Paper> {
    vec![
        seed(
            "1",
            "Deep Learning Approaches for Batik Motif Classification",
            "Dr. Sari Wulandari",
            "Institut Teknologi Bandung",
            "A convolutional architecture for recognising regional batik motifs from smartphone photographs.",
            PaperType::Research,
            Some(1),
            94,
            PaperStatus::Verified,
            "25 USDC",
        ),
        seed(
            "2",
            "Rainfall and Rice Yield Observations in Central Java 2010-2023",
            "Budi Santoso",
            "Universitas Gadjah Mada",
            "Daily rainfall and seasonal harvest records collected from 48 farming cooperatives.",
            PaperType::Dataset,
            None,
            88,
            PaperStatus::DataPool,
            "40 USDC",
        ),
        seed(
            "3",
            "Blockchain-Based Provenance for Academic Peer Review",
            "Rina Kartika",
            "Universitas Indonesia",
            "An on-chain registry of reviewer attestations that keeps reviewer identities private.",
            PaperType::Research,
            Some(2),
            91,
            PaperStatus::Verified,
            "15 USDC",
        ),
        seed(
            "4",
            "Mangrove Carbon Sequestration in the Mahakam Delta",
            "Ahmad Fauzi",
            "Universitas Mulawarman",
            "Field measurements of above- and below-ground biomass across restored mangrove plots.",
            PaperType::Research,
            Some(3),
            76,
            PaperStatus::Processing,
            "10 USDC",
        ),
        seed(
            "5",
            "Indonesian Speech Corpus for Low-Resource ASR",
            "Dewi Lestari",
            "Institut Teknologi Sepuluh Nopember",
            "Transcribed recordings of 320 speakers across twelve regional accents.",
            PaperType::Dataset,
            None,
            82,
            PaperStatus::DataPool,
            "60 USDC",
        ),
    ]
}

/// JSON file holding papers submitted from this machine.
#[derive(Debug, Clone)]
pub struct LocalPaperStore {
    path: PathBuf,
}

impl LocalPaperStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stored papers in submission order. A missing or unreadable file yields no papers.
    pub fn load(&self) -> Vec<Paper> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to read paper store");
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<Paper>>(&content) {
            Ok(papers) => papers,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "ignoring malformed paper store");
                Vec::new()
            }
        }
    }

    pub fn append(&self, paper: Paper) -> Result<(), JudolError> {
        paper.validate()?;

        let mut papers = self.load();
        papers.retain(|p| p.id != paper.id);
        papers.push(paper);

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, serde_json::to_string_pretty(&papers)?)?;

        debug!(path = %self.path.display(), count = papers.len(), "paper store updated");

        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct PaperCatalog {
    papers: Vec<Paper>,
}

impl PaperCatalog {
    /// Stored papers (newest first) followed by seed papers they do not shadow.
    pub fn from_records(stored: Vec<Paper>, seed: Vec<Paper>) -> Self {
        let mut seen = HashSet::new();
        let papers = stored
            .into_iter()
            .rev()
            .chain(seed)
            .filter(|p| seen.insert(p.id.clone()))
            .collect();

        Self { papers }
    }

    pub fn load(store: &LocalPaperStore) -> Self {
        Self::from_records(store.load(), seed_papers())
    }

    pub fn all(&self) -> &[Paper] {
        &self.papers
    }

    pub fn get(&self, id: &str) -> Option<&Paper> {
        self.papers.iter().find(|p| p.id == id)
    }

    pub fn by_status(&self, status: PaperStatus) -> Vec<&Paper> {
        self.papers.iter().filter(|p| p.status == status).collect()
    }

    pub fn by_type(&self, paper_type: PaperType) -> Vec<&Paper> {
        self.papers
            .iter()
            .filter(|p| p.paper_type == paper_type)
            .collect()
    }

    /// Case-insensitive match on title, author or organization.
    pub fn search(&self, query: &str) -> Vec<&Paper> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return self.papers.iter().collect();
        }
        self.papers.iter().filter(|p| p.matches(&needle)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uploaded(id: &str) -> Paper {
        Paper {
            id: id.to_string(),
            title: format!("Uploaded {id}"),
            author: "Tester".to_string(),
            organization: "Lab".to_string(),
            abstract_text: String::new(),
            paper_type: PaperType::Research,
            license: "CC BY 4.0".to_string(),
            sinta_rank: None,
            ai_score: 0,
            status: PaperStatus::Processing,
            price: "0 USDC".to_string(),
            ipfs_hash: Some("bafy".to_string()),
            token_id: None,
        }
    }

    #[test]
    fn seed_papers_are_valid() {
        for paper in seed_papers() {
            paper.validate().unwrap();
        }
    }

    #[test]
    fn json_uses_frontend_field_names() {
        let json = serde_json::to_value(&seed_papers()[1]).unwrap();
        assert_eq!(json["type"], "Dataset");
        assert_eq!(json["status"], "data_pool");
        assert!(json["sintaRank"].is_null());
        assert_eq!(json["aiScore"], 88);
        assert!(json.get("abstract").is_some());
        assert!(json.get("ipfsHash").is_none());
    }

    #[test]
    fn validate_rejects_out_of_range_values() {
        let mut paper = uploaded("x");
        paper.ai_score = 101;
        assert!(paper.validate().is_err());

        let mut paper = uploaded("x");
        paper.sinta_rank = Some(7);
        assert!(paper.validate().is_err());
    }

    #[test]
    fn stored_papers_come_first_and_shadow_seeds() {
        let mut shadow = uploaded("2");
        shadow.title = "Replaced dataset".to_string();

        let catalog = PaperCatalog::from_records(vec![uploaded("a"), shadow], seed_papers());

        let ids: Vec<&str> = catalog.all().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "a", "1", "3", "4", "5"]);
        assert_eq!(catalog.get("2").unwrap().title, "Replaced dataset");
    }

    #[test]
    fn filters_and_search() {
        let catalog = PaperCatalog::from_records(Vec::new(), seed_papers());

        assert_eq!(catalog.by_status(PaperStatus::Verified).len(), 2);
        assert_eq!(catalog.by_type(PaperType::Dataset).len(), 2);
        assert_eq!(catalog.search("gadjah").len(), 1);
        assert_eq!(catalog.search("  ").len(), 5);
        assert!(catalog.search("nonexistent").is_empty());
    }
}
