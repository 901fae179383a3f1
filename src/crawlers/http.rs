use crate::config::ScraperConfig;
use crate::crawlers::{FetchedPage, PageFetcher};
use crate::error::FetchError;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// Fetches pages with plain HTTP requests
pub struct HttpFetcher {
    client: Client,
    timeout_secs: u64,
}

impl HttpFetcher {
    pub fn new(config: &ScraperConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            timeout_secs: config.request_timeout_secs,
        })
    }

    /// The client timeout covers the whole exchange, body read included
    fn classify(&self, error: reqwest::Error) -> FetchError {
        if error.is_timeout() {
            FetchError::Timeout(self.timeout_secs)
        } else {
            FetchError::Transport(error)
        }
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| self.classify(e))?;

        Ok(FetchedPage { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serves one response whose body never finishes arriving
    async fn stalled_body_server() -> Url {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 1024];
            let _ = socket.read(&mut request).await;
            socket
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\n\r\n<html>")
                .await
                .unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
        });
        Url::parse(&format!("http://{}/page-1.html", addr)).unwrap()
    }

    #[tokio::test]
    async fn test_body_timeout_is_reported_as_timeout() {
        let url = stalled_body_server().await;
        let config = ScraperConfig {
            request_timeout_secs: 1,
            ..ScraperConfig::default()
        };
        let fetcher = HttpFetcher::new(&config).unwrap();

        let error = fetcher.fetch(&url).await.unwrap_err();

        assert!(matches!(error, FetchError::Timeout(1)), "got {:?}", error);
    }
}
