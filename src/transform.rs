//! Resolves transform requests to URLs through a [`TransformBackend`].

use crate::imaging::TransformBackend;
use crate::types::SourceImage;
use crate::variants::TransformRequest;

/// Primary and WebP URL for one transform request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedUrls {
    pub url: String,
    /// Empty when the backend has no WebP form of `url`.
    pub webp_url: String,
}

/// Ask `backend` for the URLs of `request`.
///
/// Returns `None` when the backend gives no URL (or an empty one); the caller
/// skips the request. The WebP URL is only asked for once a primary URL
/// exists.
pub fn resolve<T: TransformBackend + ?Sized>(
    backend: &T,
    source: &SourceImage,
    request: &TransformRequest,
) -> Option<ResolvedUrls> {
    let url = backend
        .transform_url(source, request)
        .filter(|url| !url.is_empty())?;

    let webp_url = match backend.webp_url(&url).filter(|url| !url.is_empty()) {
        Some(webp) => webp,
        None => {
            log::debug!("No WebP URL for {url}");
            String::new()
        }
    };

    Some(ResolvedUrls { url, webp_url })
}
