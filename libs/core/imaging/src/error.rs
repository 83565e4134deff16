use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ImageError {
    #[error("File is empty")]
    Empty,

    #[error("File size exceeds {limit_mb} MB limit")]
    TooLarge { limit_mb: usize },

    #[error("Unsupported file type")]
    UnsupportedType,

    #[error("Invalid Base64 content for image: {0}")]
    InvalidBase64(String),

    #[error("Invalid image file: {0}")]
    Decode(String),

    #[error("Failed to encode image: {0}")]
    Encode(String),

    #[error("Image processing produced no data")]
    EmptyOutput,

    #[error("Image processing task failed: {0}")]
    Task(String),
}

impl ImageError {
    /// Problems with the uploaded file itself rather than with the server.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ImageError::Empty
                | ImageError::TooLarge { .. }
                | ImageError::UnsupportedType
                | ImageError::InvalidBase64(_)
                | ImageError::Decode(_)
        )
    }
}

pub type ImageResult<T> = Result<T, ImageError>;
