use backon::{ExponentialBuilder, Retryable};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::StatusCode;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;
use thiserror::Error as ThisError;
use tracing::{debug, info};
use url::Url;

const DEFAULT_CONTENT_TYPE: &str = "image/jpeg";

/// Result of trying to inline a remote image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageEmbed {
    /// `data:<mime>;base64,<payload>`
    Embedded(String),
    SkippedFetch(String),
}

#[derive(Debug, ThisError)]
enum FetchError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("upstream returned {0}")]
    Status(StatusCode),

    #[error("image larger than {0} bytes")]
    TooLarge(usize),
}

impl FetchError {
    fn is_transient(&self) -> bool {
        match self {
            FetchError::Request(e) => !e.is_builder() && !e.is_decode(),
            FetchError::Status(status) => status.is_server_error(),
            FetchError::TooLarge(_) => false,
        }
    }
}

/// Fetches images over HTTP and turns them into base64 data URIs.
#[derive(Clone)]
pub struct ImageEmbedder {
    client: reqwest::Client,
    timeout: Duration,
    max_bytes: usize,
    retry_policy: ExponentialBuilder,
}

impl ImageEmbedder {
    pub fn new(client: reqwest::Client, timeout: Duration, max_bytes: usize) -> Self {
        let retry_policy = ExponentialBuilder::default()
            .with_min_delay(Duration::from_millis(100))
            .with_max_delay(Duration::from_secs(1))
            .with_max_times(2)
            .with_jitter();
        Self {
            client,
            timeout,
            max_bytes,
            retry_policy,
        }
    }

    /// Never fails: any problem is reported as `SkippedFetch`.
    pub async fn embed(&self, image_url: &str) -> ImageEmbed {
        let url = match Url::parse(image_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => url,
            Ok(url) => {
                return ImageEmbed::SkippedFetch(format!("unsupported scheme `{}`", url.scheme()));
            }
            Err(e) => return ImageEmbed::SkippedFetch(format!("invalid url: {e}")),
        };

        match self.fetch_with_retry(&url).await {
            Ok((content_type, bytes)) => {
                info!(image_url, content_type = %content_type, size = bytes.len(), "image embedded");
                ImageEmbed::Embedded(format!(
                    "data:{content_type};base64,{}",
                    STANDARD.encode(&bytes)
                ))
            }
            Err(e) => ImageEmbed::SkippedFetch(e.to_string()),
        }
    }

    async fn fetch_with_retry(&self, url: &Url) -> Result<(String, Vec<u8>), FetchError> {
        (|| self.fetch(url))
            .retry(self.retry_policy)
            .when(FetchError::is_transient)
            .notify(|err, dur| {
                debug!(url = %url, error = %err, "image fetch failed; retrying in {:?}", dur);
            })
            .await
    }

    async fn fetch(&self, url: &Url) -> Result<(String, Vec<u8>), FetchError> {
        let mut resp = self
            .client
            .get(url.clone())
            .timeout(self.timeout)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }
        if resp
            .content_length()
            .is_some_and(|len| len > self.max_bytes as u64)
        {
            return Err(FetchError::TooLarge(self.max_bytes));
        }

        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_string();

        // chunked bodies carry no length, so the cap is enforced while reading
        let mut body = Vec::new();
        while let Some(chunk) = resp.chunk().await? {
            if body.len() + chunk.len() > self.max_bytes {
                return Err(FetchError::TooLarge(self.max_bytes));
            }
            body.extend_from_slice(&chunk);
        }
        Ok((content_type, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, Bytes};
    use axum::{Router, http::StatusCode as AxumStatus, http::header, routing::get};
    use futures::StreamExt;
    use std::net::SocketAddr;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::net::TcpListener;

    const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

    async fn serve(app: Router) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await });
        addr
    }

    fn embedder(max_bytes: usize) -> ImageEmbedder {
        ImageEmbedder::new(reqwest::Client::new(), Duration::from_secs(5), max_bytes)
    }

    #[tokio::test]
    async fn embeds_image_as_data_uri() {
        let app = Router::new().route(
            "/a.png",
            get(|| async { ([(header::CONTENT_TYPE, "image/png")], PNG) }),
        );
        let addr = serve(app).await;

        let out = embedder(1024).embed(&format!("http://{addr}/a.png")).await;
        assert_eq!(
            out,
            ImageEmbed::Embedded(format!("data:image/png;base64,{}", STANDARD.encode(PNG)))
        );
    }

    #[tokio::test]
    async fn skips_non_success_without_retrying_client_errors() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let app = Router::new().route(
            "/missing.png",
            get(move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    AxumStatus::NOT_FOUND
                }
            }),
        );
        let addr = serve(app).await;

        let out = embedder(1024)
            .embed(&format!("http://{addr}/missing.png"))
            .await;
        assert!(matches!(out, ImageEmbed::SkippedFetch(_)));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_server_errors_then_skips() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let app = Router::new().route(
            "/flaky.png",
            get(move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    AxumStatus::BAD_GATEWAY
                }
            }),
        );
        let addr = serve(app).await;

        let out = embedder(1024).embed(&format!("http://{addr}/flaky.png")).await;
        assert!(matches!(out, ImageEmbed::SkippedFetch(_)));
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn stops_reading_streamed_body_past_the_cap() {
        const CHUNKS: usize = 2048;
        let pulled = Arc::new(AtomicUsize::new(0));
        let counter = pulled.clone();
        let app = Router::new().route(
            "/stream.png",
            get(move || {
                let counter = counter.clone();
                async move {
                    let chunks = futures::stream::iter(0..CHUNKS).map(move |_| {
                        counter.fetch_add(1, Ordering::SeqCst);
                        Ok::<_, std::io::Error>(Bytes::from(vec![0u8; 16 * 1024]))
                    });
                    ([(header::CONTENT_TYPE, "image/png")], Body::from_stream(chunks))
                }
            }),
        );
        let addr = serve(app).await;

        let out = embedder(1024).embed(&format!("http://{addr}/stream.png")).await;
        assert!(matches!(out, ImageEmbed::SkippedFetch(reason) if reason.contains("larger")));
        assert!(pulled.load(Ordering::SeqCst) < CHUNKS);
    }

    #[tokio::test]
    async fn skips_oversized_and_non_http_urls() {
        let app = Router::new().route(
            "/big.png",
            get(|| async { ([(header::CONTENT_TYPE, "image/png")], vec![0u8; 4096]) }),
        );
        let addr = serve(app).await;

        let out = embedder(1024).embed(&format!("http://{addr}/big.png")).await;
        assert!(matches!(out, ImageEmbed::SkippedFetch(reason) if reason.contains("larger")));

        assert!(matches!(
            embedder(1024).embed("ftp://x").await,
            ImageEmbed::SkippedFetch(_)
        ));
        assert!(matches!(
            embedder(1024).embed("not a url").await,
            ImageEmbed::SkippedFetch(_)
        ));
    }
}
