//! Application Configuration
//!
//! User settings, service endpoints, and credentials stored in TOML format.
//! Credentials are injected into the service clients at construction time;
//! nothing reads them from ambient global state.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Drawing canvas settings
    pub canvas: CanvasSettings,
    /// OCR service settings
    pub ocr: OcrSettings,
    /// Drug identification service settings
    pub lookup: LookupSettings,
}

/// Drawing canvas settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanvasSettings {
    /// Canvas width in pixels
    pub width: u32,
    /// Canvas height in pixels
    pub height: u32,
    /// Pen stroke width in pixels
    pub stroke_width: f32,
}

impl Default for CanvasSettings {
    fn default() -> Self {
        Self {
            width: 300,
            height: 300,
            stroke_width: 5.0,
        }
    }
}

/// OCR service settings (Google Cloud Vision)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrSettings {
    /// Annotation endpoint URL
    pub endpoint: String,
    /// API key passed as a query parameter
    pub api_key: String,
}

impl Default for OcrSettings {
    fn default() -> Self {
        Self {
            endpoint: "https://vision.googleapis.com/v1/images:annotate".to_string(),
            api_key: String::new(),
        }
    }
}

/// Lookup transport selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupTransport {
    /// Key-based XML over REST
    #[default]
    Rest,
    /// WSDL-described SOAP service
    Soap,
}

/// Drug identification service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupSettings {
    /// Which transport variant to use
    pub transport: LookupTransport,
    /// Endpoint for the REST variant
    pub rest_endpoint: String,
    /// Endpoint for the SOAP variant
    pub soap_endpoint: String,
    /// Caller-supplied service credential
    pub service_key: String,
}

impl Default for LookupSettings {
    fn default() -> Self {
        Self {
            transport: LookupTransport::Rest,
            rest_endpoint:
                "http://apis.data.go.kr/1471000/DURPrdlstInfoService03/getPillList03".to_string(),
            soap_endpoint:
                "http://apis.data.go.kr/1471000/DURPrdlstInfoService03/getPillList03".to_string(),
            service_key: String::new(),
        }
    }
}

/// Get the configuration directory
pub fn config_dir() -> Result<PathBuf> {
    let proj_dirs = directories::ProjectDirs::from("com", "pillfinder", "PillFinder")
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

    let config_dir = proj_dirs.config_dir().to_path_buf();
    std::fs::create_dir_all(&config_dir)?;

    Ok(config_dir)
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: AppConfig = toml::from_str(&content)?;
    Ok(config)
}

/// Save configuration to file
pub fn save_config(config: &AppConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}
