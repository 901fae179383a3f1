use crate::crawlers::{FetchedPage, PageFetcher};
use crate::error::FetchError;
use async_trait::async_trait;
use fantoccini::{Client, ClientBuilder};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::timeout;
use url::Url;

/// Common local WebDriver endpoints tried when the configured one is down
const FALLBACK_URLS: [&str; 4] = [
    "http://localhost:9515", // ChromeDriver default
    "http://localhost:4723", // Appium default
    "http://localhost:9222", // Chrome debug port default
    "http://127.0.0.1:4444",
];

/// Fetches pages by rendering them through a WebDriver server
///
/// The session is opened on the first fetch and kept until [`PageFetcher::close`]
/// or until the server drops it.
pub struct WebDriverFetcher {
    webdriver_url: String,
    timeout_secs: u64,
    client: Mutex<Option<Client>>,
}

impl WebDriverFetcher {
    pub fn new(webdriver_url: &str, timeout_secs: u64) -> Self {
        Self {
            webdriver_url: webdriver_url.to_string(),
            timeout_secs,
            client: Mutex::new(None),
        }
    }

    async fn render(&self, client: &Client, url: &Url) -> Result<String, FetchError> {
        client
            .goto(url.as_str())
            .await
            .map_err(|e| navigation_error(e, "accessing", url))?;

        client
            .source()
            .await
            .map_err(|e| navigation_error(e, "getting source for", url))
    }
}

#[async_trait]
impl PageFetcher for WebDriverFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchError> {
        let mut guard = self.client.lock().await;

        if guard.is_none() {
            *guard = Some(connect_to_webdriver(&self.webdriver_url).await?);
        }
        let Some(client) = guard.as_ref() else {
            return Err(FetchError::WebDriver("no session".to_string()));
        };

        let result = timeout(
            Duration::from_secs(self.timeout_secs),
            self.render(client, url),
        )
        .await;

        match result {
            Ok(Ok(body)) => Ok(FetchedPage::ok(body)),
            Ok(Err(e)) => {
                // Reconnect on the next fetch
                *guard = None;
                Err(e)
            }
            Err(_) => {
                ::log::error!("Timeout rendering: {}", url);
                *guard = None;
                Err(FetchError::Timeout(self.timeout_secs))
            }
        }
    }

    async fn close(&self) {
        if let Some(client) = self.client.lock().await.take() {
            if let Err(e) = client.close().await {
                ::log::warn!("Failed to close WebDriver session: {}", e);
            }
        }
    }
}

/// Connects to the WebDriver instance, trying common local ports on failure
async fn connect_to_webdriver(webdriver_url: &str) -> Result<Client, FetchError> {
    match ClientBuilder::native().connect(webdriver_url).await {
        Ok(client) => {
            ::log::debug!("Connected to WebDriver at {}", webdriver_url);
            return Ok(client);
        }
        Err(e) => {
            ::log::error!(
                "Failed to connect to WebDriver at {}: {}",
                webdriver_url,
                e
            );
        }
    }

    for url in FALLBACK_URLS.iter().filter(|url| **url != webdriver_url) {
        ::log::info!("Trying fallback WebDriver URL: {}", url);
        if let Ok(client) = ClientBuilder::native().connect(url).await {
            ::log::debug!("Connected to fallback WebDriver at {}", url);
            return Ok(client);
        }
    }

    ::log::error!(
        "Make sure a WebDriver server is running or set the WEBDRIVER_URL environment variable"
    );
    Err(FetchError::WebDriver(format!(
        "no WebDriver server reachable at {}",
        webdriver_url
    )))
}

fn navigation_error(error: fantoccini::error::CmdError, context: &str, url: &Url) -> FetchError {
    if error.to_string().contains("Unable to find session") {
        ::log::warn!("Lost WebDriver session while {} {}", context, url);
    } else {
        ::log::error!("Failed {} {}: {}", context, url, error);
    }
    FetchError::WebDriver(error.to_string())
}
