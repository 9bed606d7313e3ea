// Playlist fetcher: one GET per playlist, no retry.

use std::sync::OnceLock;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, error, warn};

use crate::config::HttpConfig;
use crate::error::FetchError;
use crate::playlist::Manifest;

#[async_trait]
pub trait ManifestFetcher: Send + Sync {
    /// Fetches and parses the playlist at the absolute `url`.
    async fn fetch(&self, url: &str) -> Result<Manifest, FetchError>;
}

pub fn install_rustls_provider() {
    static PROVIDER_INSTALLED: OnceLock<()> = OnceLock::new();
    PROVIDER_INSTALLED.get_or_init(|| {
        if let Err(e) = rustls::crypto::aws_lc_rs::default_provider().install_default() {
            // Another crate installed one first.
            debug!(existing_provider = ?e, "rustls CryptoProvider already installed");
        }
    });
}

/// Create a reqwest Client with the provided configuration
pub fn create_client(config: &HttpConfig) -> Result<Client, reqwest::Error> {
    install_rustls_provider();

    let mut builder = Client::builder()
        .user_agent(&config.user_agent)
        .redirect(if config.follow_redirects {
            reqwest::redirect::Policy::limited(10)
        } else {
            reqwest::redirect::Policy::none()
        });

    if !config.timeout.is_zero() {
        builder = builder.timeout(config.timeout);
    }

    if !config.connect_timeout.is_zero() {
        builder = builder.connect_timeout(config.connect_timeout);
    }

    if !config.use_system_proxy {
        builder = builder.no_proxy();
    }

    builder.build()
}

/// [`ManifestFetcher`] over HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpManifestFetcher {
    client: Client,
}

impl HttpManifestFetcher {
    pub fn new(config: &HttpConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: create_client(config)?,
        })
    }
}

#[async_trait]
impl ManifestFetcher for HttpManifestFetcher {
    async fn fetch(&self, url: &str) -> Result<Manifest, FetchError> {
        debug!(url, "Fetching playlist");

        let response = self.client.get(url).send().await.map_err(|e| {
            warn!(url, error = %e, "Playlist request failed");
            FetchError::network(url, e)
        })?;

        let status = response.status();
        if !status.is_success() {
            error!(
                url,
                status = status.as_u16(),
                reason = status.canonical_reason().unwrap_or_default(),
                "Failed to fetch the HLS manifest"
            );
            return Err(FetchError::http_status(status, url));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::network(url, e))?;

        Manifest::parse(url, &body).map_err(|e| {
            error!(url, error = %e, "Fetched body is not a valid HLS manifest");
            FetchError::from(e)
        })
    }
}
