//! Remote file size lookup and human-readable byte formatting.
//!
//! The size probe is the only outbound HTTP call in the crate. It is a
//! boundary call: every failure (bad URL, transport error, non-success status,
//! missing length) collapses into [`FileSize::Unavailable`], which renders as
//! `-1`. Nothing here returns an error to the caller.

use crate::config::RemoteConfig;
use reqwest::blocking::Client;
use reqwest::header::CONTENT_LENGTH;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use url::Url;

const UNITS: &[u8] = b"BKMGTP";

/// Format `bytes` using binary multiples and the unit letter only.
///
/// The unit is picked from the number of decimal digits, not the magnitude in
/// 1024s, so `1000..=1023` bytes read as `0.98K` rather than `1000B`.
///
/// ```
/// use optimized_images::filesize::human_file_size;
/// assert_eq!(human_file_size(1500, 1), "1.5K");
/// assert_eq!(human_file_size(999, 1), "999.0B");
/// ```
pub fn human_file_size(bytes: u64, decimals: usize) -> String {
    let digits = bytes.to_string().len();
    let factor = ((digits - 1) / 3).min(UNITS.len() - 1);
    let value = bytes as f64 / 1024f64.powi(factor as i32);
    format!("{value:.decimals$}{}", UNITS[factor] as char)
}

/// Result of a remote size probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileSize {
    Bytes(u64),
    Human(String),
    /// The length could not be determined.
    Unavailable,
}

impl FileSize {
    /// Size in bytes, `-1` when unavailable or already formatted.
    pub fn as_bytes(&self) -> i64 {
        match self {
            Self::Bytes(n) => i64::try_from(*n).unwrap_or(i64::MAX),
            Self::Human(_) | Self::Unavailable => -1,
        }
    }

    pub fn is_available(&self) -> bool {
        !matches!(self, Self::Unavailable)
    }
}

impl fmt::Display for FileSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bytes(n) => write!(f, "{n}"),
            Self::Human(s) => f.write_str(s),
            Self::Unavailable => f.write_str("-1"),
        }
    }
}

#[derive(Error, Debug)]
pub enum FileSizeError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("Unexpected status {0}")]
    Status(u16),
    #[error("No content length")]
    MissingLength,
}

/// Blocking HTTP client for `Content-Length` probes.
///
/// Redirects are followed and certificate errors are ignored: the probe is
/// informational and commonly points at local or staging hosts.
#[derive(Debug, Clone)]
pub struct RemoteSizeClient {
    client: Client,
    site_url: Option<Url>,
}

impl RemoteSizeClient {
    pub fn new(timeout: Duration) -> Result<Self, FileSizeError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("optimized-images/", env!("CARGO_PKG_VERSION")))
            .redirect(reqwest::redirect::Policy::limited(10))
            .danger_accept_invalid_certs(true)
            .build()?;
        Ok(Self {
            client,
            site_url: None,
        })
    }

    pub fn from_config(config: &RemoteConfig) -> Result<Self, FileSizeError> {
        let mut client = Self::new(Duration::from_secs(config.timeout_secs))?;
        if let Some(site_url) = &config.site_url {
            let url = Url::parse(site_url)
                .map_err(|e| FileSizeError::InvalidUrl(format!("{site_url}: {e}")))?;
            client = client.with_site_url(url);
        }
        Ok(client)
    }

    /// Base that relative URLs are resolved against.
    ///
    /// The path is treated as a directory: `https://example.com/blog` and
    /// `https://example.com/blog/` resolve the same way.
    pub fn with_site_url(mut self, mut site_url: Url) -> Self {
        if !site_url.path().ends_with('/') {
            let path = format!("{}/", site_url.path());
            site_url.set_path(&path);
        }
        self.site_url = Some(site_url);
        self
    }

    /// Absolute form of `url`. Protocol-relative URLs get `https:`.
    pub fn resolve_url(&self, url: &str) -> Result<Url, FileSizeError> {
        if let Ok(absolute) = Url::parse(url) {
            return Ok(absolute);
        }
        if let Some(rest) = url.strip_prefix("//") {
            return Url::parse(&format!("https://{rest}"))
                .map_err(|e| FileSizeError::InvalidUrl(format!("{url}: {e}")));
        }
        let base = self
            .site_url
            .as_ref()
            .ok_or_else(|| FileSizeError::InvalidUrl(format!("{url}: relative URL and no site URL")))?;
        base.join(url.trim_start_matches('/'))
            .map_err(|e| FileSizeError::InvalidUrl(format!("{url}: {e}")))
    }

    /// `Content-Length` of `url`, via HEAD or GET.
    ///
    /// The header is read directly: a HEAD response has no body for reqwest to
    /// measure.
    pub fn content_length(&self, url: &str, use_head: bool) -> Result<u64, FileSizeError> {
        let url = self.resolve_url(url)?;
        let request = if use_head {
            self.client.head(url)
        } else {
            self.client.get(url)
        };
        let response = request.send()?;
        if !response.status().is_success() {
            return Err(FileSizeError::Status(response.status().as_u16()));
        }
        response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|&n| n > 0)
            .ok_or(FileSizeError::MissingLength)
    }

    /// Size of the resource at `url`, formatted with [`human_file_size`] when
    /// `formatted` is set.
    pub fn remote_file_size(&self, url: &str, formatted: bool, use_head: bool) -> FileSize {
        match self.content_length(url, use_head) {
            Ok(bytes) if formatted => FileSize::Human(human_file_size(bytes, 1)),
            Ok(bytes) => FileSize::Bytes(bytes),
            Err(e) => {
                log::debug!("Remote size of {url} unavailable: {e}");
                FileSize::Unavailable
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    fn client() -> RemoteSizeClient {
        RemoteSizeClient::new(Duration::from_secs(5)).unwrap()
    }

    // =========================================================================
    // human_file_size tests
    // =========================================================================

    #[test]
    fn human_file_size_units() {
        assert_eq!(human_file_size(0, 1), "0.0B");
        assert_eq!(human_file_size(999, 1), "999.0B");
        assert_eq!(human_file_size(1500, 1), "1.5K");
        assert_eq!(human_file_size(2048, 0), "2K");
        assert_eq!(human_file_size(1_572_864, 1), "1.5M");
    }

    #[test]
    fn human_file_size_four_digit_bytes_use_kilobytes() {
        assert_eq!(human_file_size(1000, 2), "0.98K");
    }

    #[test]
    fn human_file_size_caps_at_petabytes() {
        assert!(human_file_size(u64::MAX, 1).ends_with('P'));
    }

    // =========================================================================
    // FileSize tests
    // =========================================================================

    #[test]
    fn unavailable_renders_minus_one() {
        assert_eq!(FileSize::Unavailable.to_string(), "-1");
        assert_eq!(FileSize::Unavailable.as_bytes(), -1);
        assert!(!FileSize::Unavailable.is_available());
    }

    #[test]
    fn bytes_render_plain() {
        assert_eq!(FileSize::Bytes(2048).to_string(), "2048");
        assert_eq!(FileSize::Bytes(2048).as_bytes(), 2048);
    }

    // =========================================================================
    // URL resolution tests
    // =========================================================================

    #[test]
    fn resolve_absolute_url_unchanged() {
        let url = client().resolve_url("https://cdn.example.com/a.jpg").unwrap();
        assert_eq!(url.as_str(), "https://cdn.example.com/a.jpg");
    }

    #[test]
    fn resolve_protocol_relative_url() {
        let url = client().resolve_url("//cdn.example.com/a.jpg").unwrap();
        assert_eq!(url.as_str(), "https://cdn.example.com/a.jpg");
    }

    #[test]
    fn resolve_relative_url_against_site() {
        let site = Url::parse("https://www.example.com/blog/").unwrap();
        let url = client()
            .with_site_url(site)
            .resolve_url("/images/a.jpg")
            .unwrap();
        assert_eq!(url.as_str(), "https://www.example.com/blog/images/a.jpg");
    }

    #[test]
    fn resolve_relative_url_against_site_without_trailing_slash() {
        let site = Url::parse("https://www.example.com/blog").unwrap();
        let url = client()
            .with_site_url(site)
            .resolve_url("images/a.jpg")
            .unwrap();
        assert_eq!(url.as_str(), "https://www.example.com/blog/images/a.jpg");
    }

    #[test]
    fn site_url_from_config_without_trailing_slash() {
        let config = RemoteConfig {
            site_url: Some("https://www.example.com/blog".into()),
            ..RemoteConfig::default()
        };
        let url = RemoteSizeClient::from_config(&config)
            .unwrap()
            .resolve_url("/images/a.jpg")
            .unwrap();
        assert_eq!(url.as_str(), "https://www.example.com/blog/images/a.jpg");
    }

    #[test]
    fn resolve_relative_url_without_site_errors() {
        assert!(client().resolve_url("images/a.jpg").is_err());
    }

    // =========================================================================
    // Remote probe tests
    // =========================================================================

    #[test]
    fn get_reads_content_length() {
        let mut server = Server::new();
        let body = vec![0u8; 1500];
        let mock = server
            .mock("GET", "/a.jpg")
            .with_status(200)
            .with_header("content-type", "image/jpeg")
            .with_body(&body)
            .create();

        let url = format!("{}/a.jpg", server.url());
        let size = client().remote_file_size(&url, false, false);

        mock.assert();
        assert_eq!(size, FileSize::Bytes(1500));
    }

    #[test]
    fn head_reads_content_length_header() {
        let mut server = Server::new();
        let mock = server
            .mock("HEAD", "/a.jpg")
            .with_status(200)
            .with_header("content-length", "1500")
            .expect(2)
            .create();

        let url = format!("{}/a.jpg", server.url());
        assert_eq!(client().remote_file_size(&url, false, true), FileSize::Bytes(1500));
        assert_eq!(
            client().remote_file_size(&url, true, true),
            FileSize::Human("1.5K".to_string())
        );
        mock.assert();
    }

    #[test]
    fn get_formats_when_requested() {
        let mut server = Server::new();
        let _mock = server
            .mock("GET", "/a.jpg")
            .with_status(200)
            .with_body(vec![0u8; 1500])
            .create();

        let url = format!("{}/a.jpg", server.url());
        let size = client().remote_file_size(&url, true, false);
        assert_eq!(size, FileSize::Human("1.5K".to_string()));
    }

    #[test]
    fn relative_url_uses_site_url() {
        let mut server = Server::new();
        let mock = server
            .mock("GET", "/media/a.jpg")
            .with_status(200)
            .with_body("12345")
            .create();

        let site = Url::parse(&format!("{}/", server.url())).unwrap();
        let size = client()
            .with_site_url(site)
            .remote_file_size("/media/a.jpg", false, false);

        mock.assert();
        assert_eq!(size, FileSize::Bytes(5));
    }

    #[test]
    fn redirects_are_followed() {
        let mut server = Server::new();
        let location = format!("{}/new.jpg", server.url());
        let _old = server
            .mock("GET", "/old.jpg")
            .with_status(301)
            .with_header("location", &location)
            .create();
        let new = server
            .mock("GET", "/new.jpg")
            .with_status(200)
            .with_body("1234567890")
            .create();

        let url = format!("{}/old.jpg", server.url());
        let size = client().remote_file_size(&url, false, false);

        new.assert();
        assert_eq!(size, FileSize::Bytes(10));
    }

    #[test]
    fn not_found_is_unavailable() {
        let mut server = Server::new();
        let _mock = server.mock("HEAD", "/missing.jpg").with_status(404).create();

        let url = format!("{}/missing.jpg", server.url());
        assert_eq!(client().remote_file_size(&url, true, true), FileSize::Unavailable);
    }

    #[test]
    fn empty_body_is_unavailable() {
        let mut server = Server::new();
        let _mock = server
            .mock("GET", "/empty.jpg")
            .with_status(200)
            .with_body("")
            .create();

        let url = format!("{}/empty.jpg", server.url());
        assert_eq!(client().remote_file_size(&url, false, false), FileSize::Unavailable);
    }

    #[test]
    fn connection_refused_is_unavailable() {
        let client = RemoteSizeClient::new(Duration::from_millis(500)).unwrap();
        assert_eq!(
            client.remote_file_size("http://127.0.0.1:1/a.jpg", true, true),
            FileSize::Unavailable
        );
    }

    #[test]
    fn from_config_rejects_bad_site_url() {
        let config = RemoteConfig {
            timeout_secs: 1,
            site_url: Some("not a url".to_string()),
        };
        assert!(RemoteSizeClient::from_config(&config).is_err());
    }
}
