use std::collections::{BTreeMap, HashMap};

use serde::Deserialize;

use crate::core::error::{LauncherError, LauncherResult};

pub const RESOURCES_URL: &str = "https://resources.download.minecraft.net";

/// Top-level asset index JSON structure: logical path → object.
#[derive(Debug, Deserialize)]
pub struct AssetIndex {
    pub objects: HashMap<String, AssetObject>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AssetObject {
    pub hash: String,
    pub size: u64,
}

impl AssetObject {
    /// `<base>/<first two hex chars>/<hash>`
    pub fn url(&self, base_url: &str) -> String {
        let prefix = self.hash.get(..2).unwrap_or(&self.hash);
        format!("{}/{}/{}", base_url.trim_end_matches('/'), prefix, self.hash)
    }
}

impl AssetIndex {
    pub fn parse(raw: &str) -> LauncherResult<Self> {
        let index: AssetIndex = serde_json::from_str(raw)?;
        if let Some((name, _)) = index.objects.iter().find(|(_, o)| !is_sha1_hex(&o.hash)) {
            return Err(LauncherError::Other(format!(
                "asset index entry {name} has a malformed hash"
            )));
        }
        Ok(index)
    }

    /// Distinct objects keyed by hash. Several logical paths may share one
    /// object; it is stored and fetched once.
    pub fn unique_objects(&self) -> Vec<AssetObject> {
        let by_hash: BTreeMap<&str, u64> = self
            .objects
            .values()
            .map(|o| (o.hash.as_str(), o.size))
            .collect();
        by_hash
            .into_iter()
            .map(|(hash, size)| AssetObject {
                hash: hash.to_string(),
                size,
            })
            .collect()
    }
}

fn is_sha1_hex(hash: &str) -> bool {
    hash.len() == 40 && hash.bytes().all(|b| b.is_ascii_hexdigit())
}
