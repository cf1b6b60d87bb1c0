use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PinataMetadata {
    pub name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub keyvalues: BTreeMap<String, String>,
}

impl PinataMetadata {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            keyvalues: BTreeMap::new(),
        }
    }

    pub fn with_keyvalue(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.keyvalues.insert(key.into(), value.into());
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PinataOptions {
    #[serde(rename = "cidVersion")]
    pub cid_version: u8,
}

impl Default for PinataOptions {
    fn default() -> Self {
        Self { cid_version: 1 }
    }
}

#[derive(Debug, Serialize)]
pub struct PinJsonRequest<'a, T: Serialize> {
    #[serde(rename = "pinataContent")]
    pub pinata_content: &'a T,
    #[serde(rename = "pinataMetadata")]
    pub pinata_metadata: &'a PinataMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PinResponse {
    #[serde(rename = "IpfsHash")]
    pub ipfs_hash: String,
    #[serde(rename = "PinSize", default)]
    pub pin_size: u64,
    #[serde(rename = "Timestamp", default)]
    pub timestamp: String,
    #[serde(rename = "isDuplicate", default)]
    pub is_duplicate: Option<bool>,
}

/// File contents handed to `pinFileToIPFS`.
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}
