use crate::{ImageConfig, ImageError, ImageResult};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::{DynamicImage, ImageFormat, imageops::FilterType};
use std::io::Cursor;

/// MIME types accepted for upload.
///
/// `image/vnd.wap.wbmp` passes the type check but has no decoder, so such
/// uploads fail as undecodable.
pub const ALLOWED_CONTENT_TYPES: [&str; 7] = [
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/bmp",
    "image/tiff",
    "image/vnd.wap.wbmp",
    "image/webp",
];

/// Raw upload as received from a multipart part or a base64 JSON field.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedFile {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(
        file_name: Option<String>,
        content_type: Option<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            file_name,
            content_type,
            bytes: bytes.into(),
        }
    }

    pub fn from_base64(file_name: &str, content_type: &str, encoded: &str) -> ImageResult<Self> {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|_| ImageError::InvalidBase64(file_name.to_string()))?;
        Ok(Self::new(
            Some(file_name.to_string()),
            Some(content_type.to_string()),
            bytes,
        ))
    }
}

/// Resized upload ready to store.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedImage {
    pub file_name: String,
    pub content_type: String,
    pub file_extension: String,
    pub content: Vec<u8>,
    pub thumbnail: Option<Vec<u8>>,
    pub width: u32,
    pub height: u32,
}

impl ProcessedImage {
    pub fn file_size(&self) -> usize {
        self.content.len()
    }
}

/// Largest size with the same aspect ratio that fits in `max_w` x `max_h`.
///
/// Images already inside the box are returned unchanged; neither side drops
/// below 1.
pub fn fit_dimensions(width: u32, height: u32, max_w: u32, max_h: u32) -> (u32, u32) {
    if width == 0 || height == 0 || (width <= max_w && height <= max_h) {
        return (width, height);
    }

    let scale = f64::min(max_w as f64 / width as f64, max_h as f64 / height as f64);
    let w = ((width as f64 * scale).round() as u32).clamp(1, max_w);
    let h = ((height as f64 * scale).round() as u32).clamp(1, max_h);
    (w, h)
}

/// Re-encode in the format the bytes actually decoded as. The client's file
/// name can claim anything.
fn output_format(detected: ImageFormat) -> (ImageFormat, &'static str) {
    match detected {
        ImageFormat::Png => (ImageFormat::Png, "png"),
        ImageFormat::Gif => (ImageFormat::Gif, "gif"),
        ImageFormat::Bmp => (ImageFormat::Bmp, "bmp"),
        ImageFormat::Tiff => (ImageFormat::Tiff, "tiff"),
        ImageFormat::WebP => (ImageFormat::WebP, "webp"),
        _ => (ImageFormat::Jpeg, "jpg"),
    }
}

fn content_type_of(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Png => "image/png",
        ImageFormat::Gif => "image/gif",
        ImageFormat::Bmp => "image/bmp",
        ImageFormat::Tiff => "image/tiff",
        ImageFormat::WebP => "image/webp",
        _ => "image/jpeg",
    }
}

fn encode(image: &DynamicImage, format: ImageFormat) -> ImageResult<Vec<u8>> {
    let mut out = Cursor::new(Vec::new());
    // JPEG has no alpha channel.
    let result = if format == ImageFormat::Jpeg {
        DynamicImage::ImageRgb8(image.to_rgb8()).write_to(&mut out, format)
    } else {
        image.write_to(&mut out, format)
    };
    result.map_err(|e| ImageError::Encode(e.to_string()))?;

    let bytes = out.into_inner();
    if bytes.is_empty() {
        return Err(ImageError::EmptyOutput);
    }
    Ok(bytes)
}

fn shrink(image: &DynamicImage, max_w: u32, max_h: u32) -> DynamicImage {
    let (w, h) = fit_dimensions(image.width(), image.height(), max_w, max_h);
    if (w, h) == (image.width(), image.height()) {
        image.clone()
    } else {
        image.resize_exact(w, h, FilterType::Lanczos3)
    }
}

#[derive(Clone, Debug)]
pub struct ImageProcessor {
    config: ImageConfig,
}

impl ImageProcessor {
    pub fn new(config: ImageConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ImageConfig {
        &self.config
    }

    fn limit_mb(&self) -> usize {
        self.config.max_file_size / (1024 * 1024)
    }

    /// Cheap checks that need no decoding.
    pub fn validate(&self, file: &UploadedFile) -> ImageResult<()> {
        if file.bytes.is_empty() {
            return Err(ImageError::Empty);
        }
        if file.bytes.len() > self.config.max_file_size {
            return Err(ImageError::TooLarge {
                limit_mb: self.limit_mb(),
            });
        }
        let content_type = file.content_type.as_deref().unwrap_or_default();
        if !ALLOWED_CONTENT_TYPES.contains(&content_type) {
            return Err(ImageError::UnsupportedType);
        }
        Ok(())
    }

    /// Validates, fits into the configured bounds and renders a thumbnail.
    pub async fn process(&self, file: UploadedFile) -> ImageResult<ProcessedImage> {
        self.run(file, true).await
    }

    /// Like [`Self::process`] without a thumbnail; used for logos and
    /// category pictures.
    pub async fn process_without_thumbnail(&self, file: UploadedFile) -> ImageResult<ProcessedImage> {
        self.run(file, false).await
    }

    async fn run(&self, file: UploadedFile, thumbnail: bool) -> ImageResult<ProcessedImage> {
        self.validate(&file)?;
        let config = self.config.clone();
        let limit_mb = self.limit_mb();

        let processed = tokio::task::spawn_blocking(move || {
            Self::render(&config, limit_mb, file, thumbnail)
        })
        .await
        .map_err(|e| ImageError::Task(e.to_string()))??;

        tracing::debug!(
            file_name = %processed.file_name,
            width = processed.width,
            height = processed.height,
            size = processed.file_size(),
            "Image processed"
        );
        Ok(processed)
    }

    fn render(
        config: &ImageConfig,
        limit_mb: usize,
        file: UploadedFile,
        with_thumbnail: bool,
    ) -> ImageResult<ProcessedImage> {
        let detected =
            image::guess_format(&file.bytes).map_err(|e| ImageError::Decode(e.to_string()))?;
        let decoded = image::load_from_memory_with_format(&file.bytes, detected)
            .map_err(|e| ImageError::Decode(e.to_string()))?;

        let (format, file_extension) = output_format(detected);

        let resized = shrink(&decoded, config.max_width, config.max_height);
        let content = encode(&resized, format)?;

        let thumbnail = if with_thumbnail {
            let thumb = shrink(&decoded, config.thumbnail_size, config.thumbnail_size);
            Some(encode(&thumb, format)?)
        } else {
            None
        };

        let too_large = content.len() > config.max_file_size
            || thumbnail
                .as_ref()
                .is_some_and(|t| t.len() > config.max_file_size);
        if too_large {
            return Err(ImageError::TooLarge { limit_mb });
        }

        let file_name = file
            .file_name
            .unwrap_or_else(|| format!("image.{}", file_extension));

        Ok(ProcessedImage {
            file_name,
            content_type: content_type_of(format).to_string(),
            file_extension: file_extension.to_string(),
            content,
            thumbnail,
            width: resized.width(),
            height: resized.height(),
        })
    }
}
