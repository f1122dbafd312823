use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum MediaStoreConfig {
    Cloudinary(CloudinaryConfig),
    Memory(MemoryMediaConfig),
}

impl Default for MediaStoreConfig {
    fn default() -> Self {
        MediaStoreConfig::Memory(MemoryMediaConfig::default())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    /// Unsigned preset guests upload through.
    pub upload_preset: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default)]
    pub delivery_base: Option<String>,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MemoryMediaConfig {
    #[serde(default = "default_cloud_name")]
    pub cloud_name: String,
}

impl Default for MemoryMediaConfig {
    fn default() -> Self {
        Self {
            cloud_name: default_cloud_name(),
        }
    }
}

fn default_api_base() -> String {
    "https://api.cloudinary.com".to_string()
}

fn default_max_results() -> usize {
    super::DEFAULT_MAX_RESULTS
}

fn default_cloud_name() -> String {
    "demo".to_string()
}
