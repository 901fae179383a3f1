use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use url::Url;

/// How listing pages are retrieved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FetchMode {
    /// Plain HTTP requests
    #[default]
    Http,
    /// Pages rendered through a WebDriver server
    WebDriver,
}

/// Configuration for the catalog scraper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScraperConfig {
    /// First listing page of the catalog
    #[serde(default = "default_start_url")]
    pub start_url: String,

    /// Base that relative "next page" links are joined against
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Category assigned to every record from this source
    #[serde(default = "default_category")]
    pub category: String,

    /// Hard ceiling on the number of pages fetched in one walk
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,

    /// Lower bound of the pause between page fetches
    #[serde(default = "default_delay_min_ms")]
    pub delay_min_ms: u64,

    /// Upper bound of the pause between page fetches
    #[serde(default = "default_delay_max_ms")]
    pub delay_max_ms: u64,

    /// Per-request timeout
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// User agent sent with plain HTTP requests
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default)]
    pub fetch_mode: FetchMode,

    /// URL for the WebDriver instance (only used in webdriver mode)
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,
}

/// Configuration for the hosted product table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Project URL of the REST table store; in-memory storage when unset
    #[serde(default)]
    pub url: Option<String>,

    /// Service key sent as `apikey` and bearer token
    #[serde(default)]
    pub service_key: Option<String>,

    #[serde(default = "default_table")]
    pub table: String,
}

/// Configuration for the HTTP listeners
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_catalog_bind")]
    pub catalog_bind: String,

    #[serde(default = "default_ocr_bind")]
    pub ocr_bind: String,
}

/// Configuration for the OCR engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrConfig {
    /// Path or name of the tesseract executable
    #[serde(default = "default_tesseract_cmd")]
    pub command: String,

    /// Language packs passed to the engine
    #[serde(default = "default_languages")]
    pub languages: String,

    /// OCR engine mode
    #[serde(default = "default_oem")]
    pub oem: u8,

    /// Page segmentation mode
    #[serde(default = "default_psm")]
    pub psm: u8,

    /// Largest accepted upload in bytes
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

/// Top-level configuration, loaded once at process start
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub scraper: ScraperConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub ocr: OcrConfig,
}

impl AppConfig {
    /// Load configuration from a file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        Self::from_json(&contents)
    }

    /// Load configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.scraper.validate()?;
        Ok(config)
    }

    /// Override settings with environment variables when present
    pub fn apply_env(mut self) -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());

        if let Some(url) = var("SUPABASE_URL") {
            self.store.url = Some(url);
        }
        if let Some(key) = var("SUPABASE_SERVICE_ROLE_KEY") {
            self.store.service_key = Some(key);
        }
        if let Some(webdriver_url) = var("WEBDRIVER_URL") {
            self.scraper.webdriver_url = webdriver_url;
        }
        if let Some(cmd) = var("TESSERACT_CMD") {
            self.ocr.command = cmd;
        }
        self
    }
}

impl ScraperConfig {
    /// Create a configuration for a catalog rooted at `base_url`
    pub fn new(start_url: &str, base_url: &str) -> Self {
        Self {
            start_url: start_url.to_string(),
            base_url: base_url.to_string(),
            ..Self::default()
        }
    }

    /// Check that both catalog URLs parse
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.start()?;
        self.base()?;
        Ok(())
    }

    pub fn start(&self) -> Result<Url, ConfigError> {
        parse_url(&self.start_url)
    }

    pub fn base(&self) -> Result<Url, ConfigError> {
        parse_url(&self.base_url)
    }
}

fn parse_url(url: &str) -> Result<Url, ConfigError> {
    Url::parse(url).map_err(|source| ConfigError::Url {
        url: url.to_string(),
        source,
    })
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            start_url: default_start_url(),
            base_url: default_base_url(),
            category: default_category(),
            max_pages: default_max_pages(),
            delay_min_ms: default_delay_min_ms(),
            delay_max_ms: default_delay_max_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            user_agent: default_user_agent(),
            fetch_mode: FetchMode::default(),
            webdriver_url: default_webdriver_url(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: None,
            service_key: None,
            table: default_table(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            catalog_bind: default_catalog_bind(),
            ocr_bind: default_ocr_bind(),
        }
    }
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            command: default_tesseract_cmd(),
            languages: default_languages(),
            oem: default_oem(),
            psm: default_psm(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

fn default_start_url() -> String {
    "http://books.toscrape.com/catalogue/page-1.html".to_string()
}

fn default_base_url() -> String {
    "http://books.toscrape.com/catalogue/".to_string()
}

fn default_category() -> String {
    "Books".to_string()
}

/// Guards against endless pagination loops
fn default_max_pages() -> usize {
    50
}

fn default_delay_min_ms() -> u64 {
    1000
}

fn default_delay_max_ms() -> u64 {
    3000
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36".to_string()
}

fn default_webdriver_url() -> String {
    "http://localhost:4444".to_string()
}

fn default_table() -> String {
    "products".to_string()
}

fn default_catalog_bind() -> String {
    "127.0.0.1:8000".to_string()
}

fn default_ocr_bind() -> String {
    "127.0.0.1:8001".to_string()
}

fn default_tesseract_cmd() -> String {
    "tesseract".to_string()
}

fn default_languages() -> String {
    "spa+eng".to_string()
}

fn default_oem() -> u8 {
    3
}

fn default_psm() -> u8 {
    6
}

/// 10 MiB
fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}
