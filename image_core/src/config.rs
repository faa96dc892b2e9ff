use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use validator::Validate;

use crate::constraint::MAX_IMAGE_SIZE;

const CONFIG_FILE: &str = "image_check.toml";

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ImageConfig {
    #[validate(range(min = 1, message = "Max image size must be greater than 0"))]
    pub max_image_size: u64,

    #[validate(length(min = 1, message = "At least one content type must be allowed"))]
    pub allowed_content_types: Vec<String>,

    pub check_magic_bytes: bool,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            max_image_size: MAX_IMAGE_SIZE,
            allowed_content_types: vec![
                "image/jpeg".to_string(),
                "image/png".to_string(),
                "image/gif".to_string(),
                "image/webp".to_string(),
            ],
            check_magic_bytes: true,
        }
    }
}

impl ImageConfig {
    /// Defaults, then `image_check.toml` if present, then `IMAGE_*` variables.
    pub fn load() -> Result<Self, ConfigError> {
        let file = Path::new(CONFIG_FILE);
        Self::build(file.exists().then_some(file))
    }

    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::build(Some(path.as_ref()))
    }

    fn build(file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .add_source(Config::try_from(&ImageConfig::default())?);

        if let Some(path) = file {
            builder = builder.add_source(File::from(path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix("IMAGE")
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("allowed_content_types")
                .try_parsing(true),
        );

        let config = builder.build()?;
        let image_config: ImageConfig = config.try_deserialize()?;

        image_config.validate()?;

        Ok(image_config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        Validate::validate(self).map_err(|e| ConfigError::Message(e.to_string()))?;

        if let Some(invalid) = self
            .allowed_content_types
            .iter()
            .find(|content_type| !is_image_type(content_type))
        {
            return Err(ConfigError::Message(format!(
                "Allowed content type '{}' is not an image type",
                invalid
            )));
        }

        if self.max_image_size > MAX_IMAGE_SIZE {
            tracing::warn!(
                max_image_size = self.max_image_size,
                "Configured limit exceeds {} bytes; the fixed size check still applies",
                MAX_IMAGE_SIZE
            );
        }

        Ok(())
    }

    pub fn allows(&self, content_type: &str) -> bool {
        self.allowed_content_types
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(content_type))
    }
}

fn is_image_type(content_type: &str) -> bool {
    content_type
        .parse::<mime::Mime>()
        .map(|m| m.type_() == mime::IMAGE)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::{Mutex, MutexGuard};

    // Loading reads IMAGE_* variables, so tests that load must not overlap
    // with tests that set them.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn env_lock() -> MutexGuard<'static, ()> {
        ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner())
    }

    #[test]
    fn test_default_config() {
        let config = ImageConfig::default();
        assert_eq!(config.max_image_size, 1_048_576);
        assert!(config.check_magic_bytes);
        assert!(config.allows("image/png"));
        assert!(config.allows("IMAGE/JPEG"));
        assert!(!config.allows("image/svg+xml"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = ImageConfig::default();
        config.max_image_size = 0;
        assert!(config.validate().is_err());

        config = ImageConfig::default();
        config.allowed_content_types.clear();
        assert!(config.validate().is_err());

        config = ImageConfig::default();
        config.allowed_content_types.push("application/pdf".to_string());
        assert!(config.validate().is_err());

        config = ImageConfig::default();
        config.allowed_content_types.push("not a mime".to_string());
        assert!(config.validate().is_err());

        config = ImageConfig::default();
        config.max_image_size = 10 * MAX_IMAGE_SIZE;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_loading() {
        let _guard = env_lock();
        let config = ImageConfig::load().expect("Should load default configuration");

        assert!(config.max_image_size > 0);
        assert!(!config.allowed_content_types.is_empty());
    }

    #[test]
    fn test_load_from_file() {
        let _guard = env_lock();
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        writeln!(
            file,
            "max_image_size = 4096\nallowed_content_types = [\"image/png\"]\ncheck_magic_bytes = false"
        )
        .unwrap();

        let config = ImageConfig::load_from(file.path()).unwrap();
        assert_eq!(config.max_image_size, 4096);
        assert_eq!(config.allowed_content_types, vec!["image/png".to_string()]);
        assert!(!config.check_magic_bytes);
    }

    #[test]
    fn test_load_from_file_rejects_invalid_settings() {
        let _guard = env_lock();
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        writeln!(file, "allowed_content_types = [\"text/plain\"]").unwrap();

        assert!(ImageConfig::load_from(file.path()).is_err());
    }

    #[test]
    fn test_load_from_missing_file() {
        let _guard = env_lock();
        assert!(ImageConfig::load_from("/nonexistent/image_check.toml").is_err());
    }

    #[test]
    fn test_environment_overrides() {
        let _guard = env_lock();

        std::env::set_var("IMAGE_MAX_IMAGE_SIZE", "4096");
        std::env::set_var("IMAGE_ALLOWED_CONTENT_TYPES", "image/png,image/gif");
        std::env::set_var("IMAGE_CHECK_MAGIC_BYTES", "false");

        let loaded = ImageConfig::load();

        std::env::remove_var("IMAGE_MAX_IMAGE_SIZE");
        std::env::remove_var("IMAGE_ALLOWED_CONTENT_TYPES");
        std::env::remove_var("IMAGE_CHECK_MAGIC_BYTES");

        let config = loaded.expect("Should load configuration from the environment");
        assert_eq!(config.max_image_size, 4096);
        assert_eq!(
            config.allowed_content_types,
            vec!["image/png".to_string(), "image/gif".to_string()]
        );
        assert!(!config.check_magic_bytes);
    }

    #[test]
    fn test_environment_overrides_are_validated() {
        let _guard = env_lock();

        std::env::set_var("IMAGE_ALLOWED_CONTENT_TYPES", "image/png,text/plain");
        let loaded = ImageConfig::load();
        std::env::remove_var("IMAGE_ALLOWED_CONTENT_TYPES");

        assert!(loaded.is_err());
    }
}
