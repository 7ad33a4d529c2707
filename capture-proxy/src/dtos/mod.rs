//! Request payloads accepted from the capture UI.

use serde::{Deserialize, Serialize};
use std::fmt;

/// MIME type assumed when the client sends bare base64.
pub const DEFAULT_IMAGE_MIME_TYPE: &str = "image/jpeg";

/// Body of `POST /api/analyze`.
#[derive(Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    pub prompt: String,
    /// Base64 image, bare or as a `data:<mime>;base64,` URL.
    pub image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

/// Image ready to embed as inline data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InlineImage<'a> {
    pub mime_type: &'a str,
    pub data: &'a str,
}

impl AnalysisRequest {
    /// Split a data URL into MIME type and payload. An explicit `mimeType`
    /// wins over the one embedded in the URL.
    pub fn inline_image(&self) -> InlineImage<'_> {
        let (embedded_mime, data) = match split_data_url(&self.image) {
            Some((mime, data)) => (mime, data),
            None => (None, self.image.as_str()),
        };

        let mime_type = self
            .mime_type
            .as_deref()
            .filter(|m| !m.is_empty())
            .or(embedded_mime)
            .unwrap_or(DEFAULT_IMAGE_MIME_TYPE);

        InlineImage { mime_type, data }
    }
}

/// `data:<mime>[;param=value]*;base64,<payload>`. Parameters are dropped and
/// an empty MIME type yields `None` for the type.
fn split_data_url(image: &str) -> Option<(Option<&str>, &str)> {
    let rest = image.strip_prefix("data:")?;
    let (meta, data) = rest.split_once(',')?;
    let mut segments = meta.split(';');
    let mime = segments.next().map(str::trim).filter(|m| !m.is_empty());
    if !segments.any(|p| p.trim().eq_ignore_ascii_case("base64")) {
        return None;
    }
    Some((mime, data))
}

// Images run to megabytes; keep them out of logs.
impl fmt::Debug for AnalysisRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalysisRequest")
            .field("prompt_len", &self.prompt.len())
            .field("image_len", &self.image.len())
            .field("mime_type", &self.mime_type)
            .finish()
    }
}
