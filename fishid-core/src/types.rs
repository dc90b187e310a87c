use serde::{Deserialize, Serialize};

pub const UNKNOWN: &str = "Unknown";
pub const NOT_AVAILABLE: &str = "N/A";

pub const DEFAULT_JPEG_QUALITY: f32 = 0.95;

/// Which camera the capture device should prefer. A hint, never a guarantee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacingMode {
    User,
    #[default]
    Environment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageEncoding {
    Jpeg,
}

impl ImageEncoding {
    pub fn mime_type(self) -> &'static str {
        match self {
            ImageEncoding::Jpeg => "image/jpeg",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ImageEncoding::Jpeg => "jpg",
        }
    }
}

/// A single encoded frame taken from a live stream at one instant.
#[derive(Clone, PartialEq)]
pub struct StillImage {
    bytes: Vec<u8>,
    encoding: ImageEncoding,
    quality: f32,
    width: u32,
    height: u32,
}

impl StillImage {
    pub fn jpeg(bytes: Vec<u8>, width: u32, height: u32, quality: f32) -> Self {
        Self {
            bytes,
            encoding: ImageEncoding::Jpeg,
            quality: quality.clamp(0.0, 1.0),
            width,
            height,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn encoding(&self) -> ImageEncoding {
        self.encoding
    }

    pub fn quality(&self) -> f32 {
        self.quality
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl std::fmt::Debug for StillImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StillImage")
            .field("encoding", &self.encoding)
            .field("quality", &self.quality)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes_len", &self.bytes.len())
            .finish()
    }
}

/// The fully-defaulted classification record consumed by the UI.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub fish_type: String,
    pub description: String,
    pub habitat: String,
    pub edibility: String,
}

impl ClassificationResult {
    /// Applies the field-default policy. Blank values count as absent.
    pub fn from_parts(
        fish_type: Option<String>,
        description: Option<String>,
        habitat: Option<String>,
        edibility: Option<String>,
    ) -> Self {
        Self {
            fish_type: or_default(fish_type, UNKNOWN),
            description: or_default(description, NOT_AVAILABLE),
            habitat: or_default(habitat, UNKNOWN),
            edibility: or_default(edibility, UNKNOWN),
        }
    }

    pub fn unknown() -> Self {
        Self::from_parts(None, None, None, None)
    }
}

fn or_default(value: Option<String>, default: &str) -> String {
    value
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}
