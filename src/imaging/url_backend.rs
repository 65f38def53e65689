//! Transform backend that encodes requests as query parameters on a URL.
//!
//! This targets the common "image CDN" shape (imgix, Thumbor-style proxies,
//! a self-hosted resizer): the service reads the instructions from the query
//! string and does the pixel work on first request.
//!
//! | Request field | Query parameter |
//! |---|---|
//! | width | `w` |
//! | height | `h` |
//! | quality | `q` |
//! | format | `fm` (omitted when keeping the source format) |
//! | interlace | `interlace=1` |
//!
//! WebP URLs are the same URL with `fm=webp`.
//!
//! A relative location is appended to the base path segment by segment, each
//! one percent-encoded, so `photo#1.jpg` stays a file name and a base without
//! a trailing slash keeps its last segment. Only `http(s)` locations bypass
//! the base.

use super::backend::TransformBackend;
use crate::types::SourceImage;
use crate::variants::TransformRequest;
use url::Url;

/// Builds transform URLs relative to a base URL.
#[derive(Debug, Clone)]
pub struct UrlTransformBackend {
    base: Url,
    extra_params: Vec<(String, String)>,
}

impl UrlTransformBackend {
    pub fn new(base: Url) -> Self {
        Self {
            base,
            extra_params: Vec::new(),
        }
    }

    /// Parse `base` and build a backend, or `None` if it is not a valid
    /// absolute URL with a path.
    pub fn parse(base: &str) -> Option<Self> {
        Url::parse(base)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .map(Self::new)
    }

    /// Append a fixed query parameter to every transform URL.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_params.push((key.into(), value.into()));
        self
    }

    fn image_url(&self, location: &str) -> Option<Url> {
        match Url::parse(location) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => return Some(url),
            _ => {}
        }
        let mut url = self.base.clone();
        url.set_query(None);
        url.set_fragment(None);
        url.path_segments_mut()
            .ok()?
            .pop_if_empty()
            .extend(location.split('/').filter(|s| !matches!(*s, "" | "." | "..")));
        Some(url)
    }
}

impl TransformBackend for UrlTransformBackend {
    fn transform_url(&self, source: &SourceImage, request: &TransformRequest) -> Option<String> {
        if source.location.is_empty() || request.width == 0 {
            return None;
        }
        let mut url = self.image_url(&source.location)?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("w", &request.width.to_string());
            query.append_pair("h", &request.height.to_string());
            query.append_pair("q", &request.quality.value().to_string());
            if let Some(format) = &request.format {
                query.append_pair("fm", format);
            }
            if request.interlace {
                query.append_pair("interlace", "1");
            }
            for (key, value) in &self.extra_params {
                query.append_pair(key, value);
            }
        }
        Some(url.to_string())
    }

    fn webp_url(&self, url: &str) -> Option<String> {
        let mut parsed = Url::parse(url).ok()?;
        let pairs: Vec<(String, String)> = parsed
            .query_pairs()
            .filter(|(key, _)| key != "fm")
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();
        {
            let mut query = parsed.query_pairs_mut();
            query.clear();
            for (key, value) in &pairs {
                query.append_pair(key, value);
            }
            query.append_pair("fm", "webp");
        }
        Some(parsed.to_string())
    }
}
