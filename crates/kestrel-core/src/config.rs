//! Settings file loading shared by the runtime and its drivers

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use tracing::debug;

/// Errors that can occur while loading a settings file
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read settings file '{0}': {1}")]
    Read(PathBuf, #[source] std::io::Error),

    #[error("failed to parse settings file '{0}': {1}")]
    Parse(PathBuf, #[source] toml::de::Error),
}

/// Read and deserialize a TOML file.
pub fn load_toml<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let content =
        fs::read_to_string(path).map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;
    let value = toml::from_str(&content).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
    debug!("Parsed settings from {:?}", path);
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::TimeConfig;

    #[test]
    fn missing_file_is_read_error() {
        let path = Path::new("/definitely/not/here/settings.toml");
        let err = load_toml::<TimeConfig>(path).unwrap_err();
        assert!(matches!(err, ConfigError::Read(..)));
    }

    #[test]
    fn invalid_toml_is_parse_error() {
        let path = std::env::temp_dir().join("kestrel-core-invalid-settings.toml");
        fs::write(&path, "time_scale = [not valid").unwrap();
        let err = load_toml::<TimeConfig>(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(..)));
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn partial_file_uses_defaults() {
        let path = std::env::temp_dir().join("kestrel-core-partial-settings.toml");
        fs::write(&path, "time_scale = 0.5\n").unwrap();
        let config: TimeConfig = load_toml(&path).unwrap();
        assert_eq!(config.time_scale, 0.5);
        assert_eq!(config.max_delta_time, TimeConfig::default().max_delta_time);
        let _ = fs::remove_file(&path);
    }
}
