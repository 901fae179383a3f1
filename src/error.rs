use thiserror::Error;

/// Failure to retrieve a listing page
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("timed out after {0} seconds")]
    Timeout(u64),

    #[error("webdriver error: {0}")]
    WebDriver(String),

    #[error("invalid url {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

/// Reasons a single catalog entry could not be turned into a record
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExtractError {
    #[error("entry has no title")]
    MissingTitle,

    #[error("entry has no price")]
    MissingPrice,

    #[error("unparseable price {0:?}")]
    InvalidPrice(String),
}

/// Errors raised by a table backend
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("store returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Errors raised by a text-extraction engine
#[derive(Debug, Error)]
pub enum OcrError {
    #[error("ocr engine unavailable: {0}")]
    Unavailable(String),

    #[error("text extraction failed: {0}")]
    Failed(String),

    #[error("image could not be decoded: {0}")]
    InvalidImage(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid scraper url {url}: {source}")]
    Url {
        url: String,
        #[source]
        source: url::ParseError,
    },
}
