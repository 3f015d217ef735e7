use crate::error::{ImagenError, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const MAX_PROMPT_CHARS: usize = 1000;
pub const MAX_NEGATIVE_PROMPT_CHARS: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AspectRatio {
    #[default]
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "9:16")]
    Portrait9x16,
    #[serde(rename = "16:9")]
    Landscape16x9,
    #[serde(rename = "4:3")]
    Landscape4x3,
    #[serde(rename = "3:4")]
    Portrait3x4,
}

impl AspectRatio {
    pub const ALL: [AspectRatio; 5] = [
        AspectRatio::Square,
        AspectRatio::Portrait9x16,
        AspectRatio::Landscape16x9,
        AspectRatio::Landscape4x3,
        AspectRatio::Portrait3x4,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Square => "1:1",
            AspectRatio::Portrait9x16 => "9:16",
            AspectRatio::Landscape16x9 => "16:9",
            AspectRatio::Landscape4x3 => "4:3",
            AspectRatio::Portrait3x4 => "3:4",
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AspectRatio {
    type Err = ImagenError;

    fn from_str(s: &str) -> Result<Self> {
        AspectRatio::ALL
            .into_iter()
            .find(|ratio| ratio.as_str() == s.trim())
            .ok_or_else(|| {
                ImagenError::Validation(format!(
                    "Unsupported aspect ratio: '{}'. Supported options are: 1:1, 9:16, 16:9, 4:3, 3:4",
                    s
                ))
            })
    }
}

/// Whether people may appear in the generated image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PersonPolicy {
    #[default]
    #[serde(rename = "dont_allow")]
    None,
    #[serde(rename = "allow_adult")]
    AdultsOnly,
    #[serde(rename = "allow_minor")]
    AllAges,
}

impl PersonPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            PersonPolicy::None => "dont_allow",
            PersonPolicy::AdultsOnly => "allow_adult",
            PersonPolicy::AllAges => "allow_minor",
        }
    }
}

impl fmt::Display for PersonPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PersonPolicy {
    type Err = ImagenError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "dont_allow" | "none" => Ok(PersonPolicy::None),
            "allow_adult" | "adults" => Ok(PersonPolicy::AdultsOnly),
            "allow_minor" | "all" => Ok(PersonPolicy::AllAges),
            other => Err(ImagenError::Validation(format!(
                "Unsupported person policy: '{}'",
                other
            ))),
        }
    }
}

/// The user-edited generation form.
///
/// Length limits are checked here, when text is entered. Emptiness of the
/// prompt is checked later, at submit time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationRequest {
    prompt: String,
    negative_prompt: Option<String>,
    aspect_ratio: AspectRatio,
    person_policy: PersonPolicy,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Result<Self> {
        let mut request = Self::default();
        request.set_prompt(prompt)?;
        Ok(request)
    }

    pub fn with_negative_prompt(mut self, negative_prompt: impl Into<String>) -> Result<Self> {
        self.set_negative_prompt(Some(negative_prompt.into()))?;
        Ok(self)
    }

    pub fn with_aspect_ratio(mut self, aspect_ratio: AspectRatio) -> Self {
        self.aspect_ratio = aspect_ratio;
        self
    }

    pub fn with_person_policy(mut self, person_policy: PersonPolicy) -> Self {
        self.person_policy = person_policy;
        self
    }

    pub fn set_prompt(&mut self, prompt: impl Into<String>) -> Result<()> {
        let prompt = prompt.into();
        check_length("Prompt", &prompt, MAX_PROMPT_CHARS)?;
        self.prompt = prompt;
        Ok(())
    }

    pub fn set_negative_prompt(&mut self, negative_prompt: Option<String>) -> Result<()> {
        if let Some(text) = &negative_prompt {
            check_length("Negative prompt", text, MAX_NEGATIVE_PROMPT_CHARS)?;
        }
        self.negative_prompt = negative_prompt;
        Ok(())
    }

    pub fn set_aspect_ratio(&mut self, aspect_ratio: AspectRatio) {
        self.aspect_ratio = aspect_ratio;
    }

    pub fn set_person_policy(&mut self, person_policy: PersonPolicy) {
        self.person_policy = person_policy;
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn negative_prompt(&self) -> Option<&str> {
        self.negative_prompt.as_deref()
    }

    pub fn aspect_ratio(&self) -> AspectRatio {
        self.aspect_ratio
    }

    pub fn person_policy(&self) -> PersonPolicy {
        self.person_policy
    }

    pub fn has_prompt(&self) -> bool {
        !self.prompt.trim().is_empty()
    }

    /// Normalized body for `POST /generate-image`.
    pub fn to_payload(&self) -> GenerateImagePayload {
        let negative_prompt = self
            .negative_prompt
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(String::from);

        GenerateImagePayload {
            prompt: self.prompt.trim().to_string(),
            negative_prompt,
            aspect_ratio: self.aspect_ratio,
            person_generation: self.person_policy,
        }
    }
}

fn check_length(field: &str, text: &str, max: usize) -> Result<()> {
    let len = text.chars().count();
    if len > max {
        return Err(ImagenError::Validation(format!(
            "{} too long ({} characters, max {})",
            field, len, max
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateImagePayload {
    pub prompt: String,
    pub negative_prompt: Option<String>,
    pub aspect_ratio: AspectRatio,
    pub person_generation: PersonPolicy,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerateImageResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_data: Option<String>, // Base64 encoded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation_time: Option<f64>,
}

impl GenerateImageResponse {
    pub fn success(image_data: impl Into<String>, generation_time: Option<f64>) -> Self {
        Self {
            success: true,
            image_data: Some(image_data.into()),
            error: None,
            generation_time,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            image_data: None,
            error: Some(error.into()),
            generation_time: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Webp,
    Unknown,
}

impl ImageFormat {
    pub fn sniff(bytes: &[u8]) -> Self {
        if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
            ImageFormat::Png
        } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            ImageFormat::Jpeg
        } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
            ImageFormat::Webp
        } else {
            ImageFormat::Unknown
        }
    }

    /// File extension for downloads; unknown payloads are saved as PNG.
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png | ImageFormat::Unknown => "png",
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Webp => "webp",
        }
    }
}

/// A successfully retrieved image, decoded to raw bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedImage {
    pub bytes: Vec<u8>,
    pub elapsed_seconds: Option<f64>,
    pub format: ImageFormat,
}

impl GeneratedImage {
    pub fn from_base64(image_data: &str, elapsed_seconds: Option<f64>) -> Result<Self> {
        let bytes = STANDARD
            .decode(image_data.trim())
            .map_err(|e| ImagenError::Decode(format!("Invalid image data: {}", e)))?;
        let format = ImageFormat::sniff(&bytes);
        Ok(Self {
            bytes,
            elapsed_seconds,
            format,
        })
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GenerationResult {
    Success(GeneratedImage),
    Failure { message: String },
}

impl GenerationResult {
    pub fn image(&self) -> Option<&GeneratedImage> {
        match self {
            GenerationResult::Success(image) => Some(image),
            GenerationResult::Failure { .. } => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            GenerationResult::Success(_) => None,
            GenerationResult::Failure { message } => Some(message),
        }
    }
}
