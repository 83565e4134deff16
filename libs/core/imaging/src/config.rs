use core_config::{ConfigError, FromEnv, env_parse};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageConfig {
    /// Upper bound in bytes for an upload and for the resized output
    pub max_file_size: usize,
    pub max_per_product: usize,
    pub max_width: u32,
    pub max_height: u32,
    /// Bounding square for thumbnails
    pub thumbnail_size: u32,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            max_file_size: 5 * 1024 * 1024,
            max_per_product: 10,
            max_width: 1600,
            max_height: 1600,
            thumbnail_size: 150,
        }
    }
}

impl FromEnv for ImageConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            max_file_size: env_parse("IMAGE_MAX_FILE_SIZE", "5242880")?,
            max_per_product: env_parse("IMAGE_MAX_PER_PRODUCT", "10")?,
            max_width: env_parse("IMAGE_MAX_WIDTH", "1600")?,
            max_height: env_parse("IMAGE_MAX_HEIGHT", "1600")?,
            thumbnail_size: env_parse("IMAGE_THUMBNAIL_SIZE", "150")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_env_defaults() {
        temp_env::with_vars_unset(
            [
                "IMAGE_MAX_FILE_SIZE",
                "IMAGE_MAX_PER_PRODUCT",
                "IMAGE_MAX_WIDTH",
                "IMAGE_MAX_HEIGHT",
                "IMAGE_THUMBNAIL_SIZE",
            ],
            || {
                assert_eq!(ImageConfig::from_env().unwrap(), ImageConfig::default());
            },
        );
    }

    #[test]
    fn test_from_env_overrides() {
        temp_env::with_vars(
            [
                ("IMAGE_MAX_PER_PRODUCT", Some("4")),
                ("IMAGE_THUMBNAIL_SIZE", Some("64")),
            ],
            || {
                let config = ImageConfig::from_env().unwrap();
                assert_eq!(config.max_per_product, 4);
                assert_eq!(config.thumbnail_size, 64);
            },
        );
    }

    #[test]
    fn test_from_env_rejects_garbage() {
        temp_env::with_var("IMAGE_MAX_WIDTH", Some("wide"), || {
            assert!(ImageConfig::from_env().is_err());
        });
    }
}
