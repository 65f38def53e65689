//! The built result for one source image, and its query surface.
//!
//! [`OptimizedImage`] is what an [`Optimizer`](crate::optimizer::Optimizer)
//! produces and what gets persisted. It round-trips through a flat JSON
//! object:
//!
//! ```json
//! {
//!   "optimizedImageUrls": {"400": "https://…?w=400", "800": "https://…?w=800"},
//!   "optimizedWebPImageUrls": {"400": "https://…&fm=webp", "800": "…"},
//!   "variantSourceWidths": [400, 400],
//!   "focalPoint": null,
//!   "originalImageWidth": 1600,
//!   "originalImageHeight": 900,
//!   "placeholder": "/9j/4AAQ…",
//!   "placeholderSvg": "",
//!   "colorPalette": ["#3a4b5c"],
//!   "placeholderWidth": 400,
//!   "placeholderHeight": 225
//! }
//! ```
//!
//! ## Width maps and source widths
//!
//! The URL maps are keyed by the *retina-scaled* pixel width, in insertion
//! order. `variantSourceWidths` is parallel to that insertion order and holds
//! the *pre-retina* width of the variant each entry came from. The filtered
//! srcset selectors match on the source width and return the URL at the same
//! position, so asking for the 400px slot returns its 1x and 2x URLs.
//!
//! When two requests scale to the same width the later URL replaces the
//! earlier one in place, but `variantSourceWidths` still grows by one. The
//! positional lookup then skips indexes past the end of the map.

use crate::data_uri::{encode_svg, jpeg_data_uri, svg_data_uri};
use crate::filesize::{FileSize, RemoteSizeClient, human_file_size};
use crate::types::FocalPoint;
use serde::de::{self, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Fill used by [`OptimizedImage::placeholder_box`] when there is no palette.
pub const DEFAULT_BOX_COLOR: &str = "#CCC";

/// Insertion-ordered map from pixel width to URL.
///
/// Re-inserting an existing width replaces its URL without moving it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WidthMap {
    entries: Vec<(u32, String)>,
}

impl WidthMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the URL for `width`.
    pub fn insert(&mut self, width: u32, url: impl Into<String>) {
        let url = url.into();
        match self.entries.iter_mut().find(|(w, _)| *w == width) {
            Some(entry) => entry.1 = url,
            None => self.entries.push((width, url)),
        }
    }

    /// Insert only if `width` is not present yet.
    fn insert_if_absent(&mut self, width: u32, url: &str) {
        if !self.contains(width) {
            self.entries.push((width, url.to_string()));
        }
    }

    pub fn get(&self, width: u32) -> Option<&str> {
        self.entries
            .iter()
            .find(|(w, _)| *w == width)
            .map(|(_, url)| url.as_str())
    }

    pub fn contains(&self, width: u32) -> bool {
        self.entries.iter().any(|(w, _)| *w == width)
    }

    /// Entry at insertion position `index`.
    pub fn get_index(&self, index: usize) -> Option<(u32, &str)> {
        self.entries.get(index).map(|(w, url)| (*w, url.as_str()))
    }

    pub fn first(&self) -> Option<(u32, &str)> {
        self.get_index(0)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &str)> {
        self.entries.iter().map(|(w, url)| (*w, url.as_str()))
    }

    pub fn widths(&self) -> impl Iterator<Item = u32> + '_ {
        self.entries.iter().map(|(w, _)| *w)
    }
}

impl<S: Into<String>> FromIterator<(u32, S)> for WidthMap {
    fn from_iter<I: IntoIterator<Item = (u32, S)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (width, url) in iter {
            map.insert(width, url);
        }
        map
    }
}

impl Serialize for WidthMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (width, url) in &self.entries {
            map.serialize_entry(&width.to_string(), url)?;
        }
        map.end()
    }
}

struct WidthMapVisitor;

impl<'de> Visitor<'de> for WidthMapVisitor {
    type Value = WidthMap;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an object keyed by pixel width, or an empty array")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<WidthMap, A::Error> {
        let mut map = WidthMap::new();
        while let Some((key, url)) = access.next_entry::<String, String>()? {
            let width = key
                .trim()
                .parse::<u32>()
                .map_err(|_| de::Error::custom(format!("invalid width key {key:?}")))?;
            map.insert(width, url);
        }
        Ok(map)
    }

    // Empty maps are stored as `[]` by some writers
    fn visit_seq<A: SeqAccess<'de>>(self, mut access: A) -> Result<WidthMap, A::Error> {
        if access.next_element::<IgnoredAny>()?.is_some() {
            return Err(de::Error::custom("expected an empty array"));
        }
        Ok(WidthMap::new())
    }

    fn visit_unit<E: de::Error>(self) -> Result<WidthMap, E> {
        Ok(WidthMap::new())
    }
}

impl<'de> Deserialize<'de> for WidthMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(WidthMapVisitor)
    }
}

/// How a srcset filter compares recorded source widths to the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidthMatch {
    /// `source == target`
    Exact,
    /// `source >= target`
    Min,
    /// `source <= target`
    Max,
}

impl WidthMatch {
    pub fn matches(self, source_width: u32, target: u32) -> bool {
        match self {
            Self::Exact => source_width == target,
            Self::Min => source_width >= target,
            Self::Max => source_width <= target,
        }
    }
}

/// Render `urls` as a `srcset` attribute value, in insertion order.
pub fn render_srcset(urls: &WidthMap) -> String {
    urls.iter()
        .map(|(width, url)| format!("{url} {width}w"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Transformed URLs and placeholders derived from one source image.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OptimizedImage {
    pub optimized_image_urls: WidthMap,
    #[serde(rename = "optimizedWebPImageUrls")]
    pub optimized_webp_image_urls: WidthMap,
    pub variant_source_widths: Vec<u32>,
    pub focal_point: Option<FocalPoint>,
    pub original_image_width: Option<u32>,
    pub original_image_height: Option<u32>,
    /// Base64 JPEG, possibly empty.
    pub placeholder: String,
    /// Silhouette markup, already data-URI encoded. Possibly empty.
    pub placeholder_svg: String,
    /// Dominant colour first.
    pub color_palette: Vec<String>,
    pub placeholder_width: Option<u32>,
    pub placeholder_height: Option<u32>,
}

impl OptimizedImage {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Drop everything derived from a previous build.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// URL of the first registered variant, or `""`.
    pub fn src(&self) -> &str {
        self.optimized_image_urls
            .first()
            .map(|(_, url)| url)
            .unwrap_or("")
    }

    pub fn srcset(&self) -> String {
        render_srcset(&self.optimized_image_urls)
    }

    pub fn srcset_width(&self, width: u32) -> String {
        self.srcset_filtered(&self.optimized_image_urls, width, WidthMatch::Exact)
    }

    pub fn srcset_min_width(&self, width: u32) -> String {
        self.srcset_filtered(&self.optimized_image_urls, width, WidthMatch::Min)
    }

    pub fn srcset_max_width(&self, width: u32) -> String {
        self.srcset_filtered(&self.optimized_image_urls, width, WidthMatch::Max)
    }

    pub fn srcset_webp(&self) -> String {
        render_srcset(&self.optimized_webp_image_urls)
    }

    pub fn srcset_width_webp(&self, width: u32) -> String {
        self.srcset_filtered(&self.optimized_webp_image_urls, width, WidthMatch::Exact)
    }

    pub fn srcset_min_width_webp(&self, width: u32) -> String {
        self.srcset_filtered(&self.optimized_webp_image_urls, width, WidthMatch::Min)
    }

    pub fn srcset_max_width_webp(&self, width: u32) -> String {
        self.srcset_filtered(&self.optimized_webp_image_urls, width, WidthMatch::Max)
    }

    /// Render the entries of `urls` whose recorded source width matches
    /// `target` under `mode`.
    pub fn srcset_filtered(&self, urls: &WidthMap, target: u32, mode: WidthMatch) -> String {
        render_srcset(&self.subset(urls, target, mode))
    }

    fn subset(&self, urls: &WidthMap, target: u32, mode: WidthMatch) -> WidthMap {
        let mut subset = WidthMap::new();
        for (index, &source_width) in self.variant_source_widths.iter().enumerate() {
            if !mode.matches(source_width, target) {
                continue;
            }
            if let Some((width, url)) = urls.get_index(index) {
                subset.insert_if_absent(width, url);
            }
        }
        subset
    }

    /// The base64 placeholder as a JPEG data URI.
    pub fn placeholder_image(&self) -> String {
        jpeg_data_uri(&self.placeholder)
    }

    pub fn placeholder_image_size(&self) -> String {
        human_file_size(self.placeholder_image().len() as u64, 1)
    }

    /// A solid SVG box sized to the placeholder, as a data URI.
    ///
    /// `color` defaults to the dominant palette colour, then
    /// [`DEFAULT_BOX_COLOR`].
    pub fn placeholder_box(&self, color: Option<&str>) -> String {
        let width = self.placeholder_width.unwrap_or(1);
        let height = self.placeholder_height.unwrap_or(1);
        let color = color
            .or_else(|| self.color_palette.first().map(String::as_str))
            .unwrap_or(DEFAULT_BOX_COLOR);
        let markup = format!(
            "<svg xmlns='http://www.w3.org/2000/svg' width='{width}' height='{height}' style='background:{color}' />"
        );
        svg_data_uri(&encode_svg(&markup))
    }

    pub fn placeholder_box_size(&self) -> String {
        human_file_size(self.placeholder_box(None).len() as u64, 1)
    }

    /// The traced silhouette as a data URI.
    pub fn placeholder_silhouette(&self) -> String {
        svg_data_uri(&self.placeholder_svg)
    }

    pub fn placeholder_silhouette_size(&self) -> String {
        human_file_size(self.placeholder_silhouette().len() as u64, 1)
    }

    /// Size of a remote resource, typically one of this image's URLs.
    pub fn remote_file_size(
        &self,
        client: &RemoteSizeClient,
        url: &str,
        formatted: bool,
        use_head: bool,
    ) -> FileSize {
        client.remote_file_size(url, formatted, use_head)
    }
}
