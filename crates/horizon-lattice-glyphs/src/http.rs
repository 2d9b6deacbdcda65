//! A [`GlyphRangeFetcher`] that downloads glyph protobufs over HTTP.

use std::time::Duration;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;

use crate::error::FetchError;
use crate::fetch::{GlyphRangeFetcher, glyph_range_url};
use crate::pbf::decode_glyph_range;
use crate::types::GlyphRange;

/// Configuration for [`HttpGlyphFetcher`].
#[derive(Debug, Clone)]
pub struct HttpGlyphFetcherConfig {
    /// Total request timeout. Default: 30 seconds.
    pub timeout: Option<Duration>,
    /// Connection timeout. Default: 10 seconds.
    pub connect_timeout: Option<Duration>,
    /// User agent string sent with every request.
    pub user_agent: Option<String>,
}

impl Default for HttpGlyphFetcherConfig {
    fn default() -> Self {
        Self {
            timeout: Some(Duration::from_secs(30)),
            connect_timeout: Some(Duration::from_secs(10)),
            user_agent: Some(format!("horizon-lattice-glyphs/{}", env!("CARGO_PKG_VERSION"))),
        }
    }
}

impl HttpGlyphFetcherConfig {
    /// Set the total request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the user agent string.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }
}

/// Fetches glyph ranges from a glyph service.
///
/// Each range is one GET of the expanded URL template; a non-success status
/// or an undecodable body fails the whole range.
#[derive(Debug, Clone)]
pub struct HttpGlyphFetcher {
    client: reqwest::Client,
}

impl HttpGlyphFetcher {
    /// Create a fetcher with default settings.
    pub fn new() -> Result<Self, FetchError> {
        Self::with_config(HttpGlyphFetcherConfig::default())
    }

    /// Create a fetcher with custom settings.
    pub fn with_config(config: HttpGlyphFetcherConfig) -> Result<Self, FetchError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(connect_timeout) = config.connect_timeout {
            builder = builder.connect_timeout(connect_timeout);
        }
        if let Some(ref user_agent) = config.user_agent {
            builder = builder.user_agent(user_agent);
        }

        let client = builder.build().map_err(request_error)?;
        Ok(Self { client })
    }

    /// Create a fetcher sharing an existing client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl GlyphRangeFetcher for HttpGlyphFetcher {
    fn fetch(
        &self,
        stack: &str,
        range: u32,
        url: &str,
    ) -> BoxFuture<'static, Result<GlyphRange, FetchError>> {
        let client = self.client.clone();
        let url = glyph_range_url(url, stack, range);

        async move {
            tracing::debug!(%url, "requesting glyph range");
            let response = client.get(&url).send().await.map_err(request_error)?;

            let status = response.status();
            if !status.is_success() {
                return Err(FetchError::HttpStatus {
                    status: status.as_u16(),
                });
            }

            let body = response.bytes().await.map_err(request_error)?;
            decode_glyph_range(&body, range)
        }
        .boxed()
    }
}

fn request_error(err: reqwest::Error) -> FetchError {
    FetchError::Request(err.to_string())
}
