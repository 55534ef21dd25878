use thiserror::Error;

#[derive(Debug, Error)]
pub enum FormError {
    #[error("Document decode error: {0}")]
    DecodeError(String),

    #[error("Document encode error: {0}")]
    EncodeError(String),

    #[error("Input parse error: {0}")]
    InputParseError(String),

    #[error("Invalid rule kind for field '{field}'. Expected {expected}, got {actual}")]
    RuleKindMismatch {
        field: String,
        expected: String,
        actual: String,
    },

    #[error("Signature field not found: '{0}'")]
    SignatureFieldNotFound(String),

    #[error("Page not found: {0}")]
    PageNotFound(usize),

    #[error("Invalid regex: {0}")]
    InvalidRegex(String),

    #[error("Image decode error: {0}")]
    ImageDecodeError(String),

    #[error("Base64 decode error: {0}")]
    Base64Error(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Generates factory methods for [`FormError`] variants that wrap a `String`.
macro_rules! error_constructors {
    ($(
        $(#[doc = $doc:expr])*
        $method:ident => $variant:ident
    ),* $(,)?) => {
        impl FormError {
            $(
                $(#[doc = $doc])*
                pub fn $method(msg: impl Into<String>) -> Self {
                    Self::$variant(msg.into())
                }
            )*
        }
    };
}

error_constructors! {
    /// Create a document decode error.
    decode => DecodeError,
    /// Create a document encode error.
    encode => EncodeError,
    /// Create an input parse error.
    input_parse => InputParseError,
    /// Create a signature-field-not-found error.
    signature_field_not_found => SignatureFieldNotFound,
    /// Create an invalid regex error.
    invalid_regex => InvalidRegex,
    /// Create an image decode error.
    image_decode => ImageDecodeError,
    /// Create a base64 decode error.
    base64 => Base64Error,
    /// Create a configuration error.
    config => ConfigError,
}

impl FormError {
    /// Create a rule kind mismatch error.
    pub fn rule_kind_mismatch(
        field: impl Into<String>,
        expected: impl ToString,
        actual: impl ToString,
    ) -> Self {
        Self::RuleKindMismatch {
            field: field.into(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }
}

impl From<lopdf::Error> for FormError {
    fn from(e: lopdf::Error) -> Self {
        Self::DecodeError(e.to_string())
    }
}

impl From<serde_json::Error> for FormError {
    fn from(e: serde_json::Error) -> Self {
        Self::InputParseError(e.to_string())
    }
}

impl From<serde_yml::Error> for FormError {
    fn from(e: serde_yml::Error) -> Self {
        Self::ConfigError(e.to_string())
    }
}

impl From<image::ImageError> for FormError {
    fn from(e: image::ImageError) -> Self {
        Self::ImageDecodeError(e.to_string())
    }
}

impl From<base64::DecodeError> for FormError {
    fn from(e: base64::DecodeError) -> Self {
        Self::Base64Error(e.to_string())
    }
}

impl From<regex::Error> for FormError {
    fn from(e: regex::Error) -> Self {
        Self::InvalidRegex(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, FormError>;
