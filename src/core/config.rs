use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use super::error::DocumentError;

/// Paper formats accepted by the item-table renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageFormat {
    Letter,
    A4,
    Legal,
}

impl PageFormat {
    /// Paper size in inches (width, height), as expected by Chrome's print API.
    pub fn inches(&self) -> (f64, f64) {
        match self {
            PageFormat::Letter => (8.5, 11.0),
            PageFormat::A4 => (8.27, 11.69),
            PageFormat::Legal => (8.5, 14.0),
        }
    }
}

impl fmt::Display for PageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageFormat::Letter => write!(f, "Letter"),
            PageFormat::A4 => write!(f, "A4"),
            PageFormat::Legal => write!(f, "Legal"),
        }
    }
}

impl FromStr for PageFormat {
    type Err = DocumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "letter" => Ok(PageFormat::Letter),
            "a4" => Ok(PageFormat::A4),
            "legal" => Ok(PageFormat::Legal),
            other => Err(DocumentError::Validation(format!("unknown page format: {}", other))),
        }
    }
}

/// Print margins in CSS pixels (96 per inch).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Margin {
    pub top: f64,
    pub bottom: f64,
    pub left: f64,
    pub right: f64,
}

impl Default for Margin {
    fn default() -> Self {
        Margin::uniform(20.0)
    }
}

impl Margin {
    pub fn uniform(px: f64) -> Self {
        Margin {
            top: px,
            bottom: px,
            left: px,
            right: px,
        }
    }

    pub fn to_inches(px: f64) -> f64 {
        px / 96.0
    }
}

/// Which carrier collaborator backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CarrierMode {
    /// Talk to the carrier API. Without credentials every call reports "no token".
    Live,
    /// Never leave the process; shipment numbers and upload receipts are fabricated.
    Mock,
}

impl FromStr for CarrierMode {
    type Err = DocumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "live" => Ok(CarrierMode::Live),
            "mock" => Ok(CarrierMode::Mock),
            other => Err(DocumentError::Validation(format!("unknown carrier mode: {}", other))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CarrierConfig {
    pub mode: CarrierMode,
    pub oauth_url: String,
    pub base_url: String,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub docs_version: String,
    pub account_number: String,
    pub account_country: Option<String>,
    pub timeout: Duration,
}

impl CarrierConfig {
    pub fn has_credentials(&self) -> bool {
        self.client_id.is_some() && self.client_secret.is_some()
    }
}

impl Default for CarrierConfig {
    fn default() -> Self {
        CarrierConfig {
            mode: CarrierMode::Live,
            oauth_url: "https://wwwcie.ups.com/security/v1/oauth/token".to_string(),
            base_url: "https://wwwcie.ups.com".to_string(),
            client_id: None,
            client_secret: None,
            docs_version: "v1".to_string(),
            account_number: "0AB297".to_string(),
            account_country: None,
            timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RenderConfig {
    pub rows_per_page: usize,
    pub page_format: PageFormat,
    pub margin: Margin,
    pub timeout: Duration,
    pub chrome_executable: Option<PathBuf>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            rows_per_page: 28,
            page_format: PageFormat::Letter,
            margin: Margin::default(),
            timeout: Duration::from_secs(60),
            chrome_executable: None,
        }
    }
}

/// Process-wide settings, read once at startup and shared read-only.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub max_json_bytes: usize,
    pub blanks_dir: PathBuf,
    pub output_dir: PathBuf,
    pub carrier: CarrierConfig,
    pub render: RenderConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            host: "0.0.0.0".to_string(),
            port: 3000,
            max_json_bytes: 10 * 1024 * 1024,
            blanks_dir: PathBuf::from("CUSTOMS_DOCs_BLANK"),
            output_dir: PathBuf::from("generated_docs"),
            carrier: CarrierConfig::default(),
            render: RenderConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, DocumentError> {
        let defaults = AppConfig::default();
        let carrier_defaults = defaults.carrier.clone();

        let carrier = CarrierConfig {
            mode: env_or("CARRIER_MODE", "live").parse()?,
            oauth_url: env_or("UPS_OAUTH_URL", &carrier_defaults.oauth_url),
            base_url: env_or("UPS_BASE_URL", &carrier_defaults.base_url),
            client_id: env_opt("UPS_CLIENT_ID"),
            client_secret: env_opt("UPS_CLIENT_SECRET"),
            docs_version: env_or("UPS_DOCS_VERSION", &carrier_defaults.docs_version),
            account_number: env_or("UPS_ACCOUNT_NUMBER", &carrier_defaults.account_number),
            account_country: env_opt("UPS_ACCOUNT_COUNTRY"),
            timeout: Duration::from_secs(parse_env("CARRIER_TIMEOUT_SECS", 30)?),
        };

        let render = RenderConfig {
            rows_per_page: parse_env("ITEMS_ROWS_PER_PAGE", 28)?,
            page_format: env_or("ITEMS_PAGE_FORMAT", "Letter").parse()?,
            margin: Margin::default(),
            timeout: Duration::from_secs(parse_env("RENDER_TIMEOUT_SECS", 60)?),
            chrome_executable: env_opt("CHROME_EXECUTABLE").map(PathBuf::from),
        };

        if render.rows_per_page == 0 {
            return Err(DocumentError::Validation(
                "ITEMS_ROWS_PER_PAGE must be at least 1".to_string(),
            ));
        }

        Ok(AppConfig {
            host: env_or("HOST", &defaults.host),
            port: parse_env("PORT", defaults.port)?,
            max_json_bytes: parse_env("MAX_JSON_BYTES", defaults.max_json_bytes)?,
            blanks_dir: PathBuf::from(env_or("BLANKS_DIR", "CUSTOMS_DOCs_BLANK")),
            output_dir: PathBuf::from(env_or("OUTPUT_DIR", "generated_docs")),
            carrier,
            render,
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Unset and blank variables are both treated as absent.
fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T: FromStr>(key: &str, default: T) -> Result<T, DocumentError> {
    match env_opt(key) {
        Some(raw) => raw
            .parse()
            .map_err(|_| DocumentError::Validation(format!("{} is not valid: {}", key, raw))),
        None => Ok(default),
    }
}
