//! Configuration loading for the generation and share endpoints.
//!
//! The frontend should never receive secrets; `PublicConfig` is safe to expose.

use serde::{Deserialize, Serialize};

/// Backend configuration for the remote generation/share API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Origin hosting `/api/generateCode` and `/api/shareApp`.
    pub base_url: String,
    /// Public origin used when building share links.
    pub site_domain: String,
    /// Optional bearer token for the API; empty when unauthenticated.
    pub api_key: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: "https://appforge.dev".to_string(),
            site_domain: "https://appforge.dev".to_string(),
            api_key: String::new(),
        }
    }
}

impl AppConfig {
    pub fn generate_endpoint(&self) -> String {
        format!("{}/api/generateCode", self.base_url)
    }

    pub fn share_endpoint(&self) -> String {
        format!("{}/api/shareApp", self.base_url)
    }
}

fn normalize_origin(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Load configuration from `.env`/environment.
///
/// Reads:
/// - `APPFORGE_BASE_URL` (API origin, default: `https://appforge.dev`)
/// - `APPFORGE_SITE_DOMAIN` (share-link origin, default: the base URL)
/// - `APPFORGE_API_KEY` (optional bearer token)
pub fn load_config() -> AppConfig {
    let _ = dotenvy::dotenv();

    let base_url = env_non_empty("APPFORGE_BASE_URL")
        .map(|v| normalize_origin(&v))
        .unwrap_or_else(|| AppConfig::default().base_url);

    let site_domain = env_non_empty("APPFORGE_SITE_DOMAIN")
        .map(|v| normalize_origin(&v))
        .unwrap_or_else(|| base_url.clone());

    AppConfig {
        base_url,
        site_domain,
        api_key: env_non_empty("APPFORGE_API_KEY").unwrap_or_default(),
    }
}

/// Public configuration returned to the frontend (secrets omitted).
#[cfg_attr(feature = "typegen", derive(specta::Type))]
#[cfg_attr(feature = "typegen", specta(rename_all = "camelCase"))]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicConfig {
    pub base_url: String,
    pub site_domain: String,
    pub has_api_key: bool,
}

/// Get backend configuration without exposing secrets.
#[tauri::command]
pub fn get_public_config() -> PublicConfig {
    let config = load_config();
    PublicConfig {
        base_url: config.base_url,
        site_domain: config.site_domain,
        has_api_key: !config.api_key.is_empty(),
    }
}
