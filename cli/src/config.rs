use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::Deserialize;
use std::path::{Path, PathBuf};

const ENV_PREFIX: &str = "PRECEPT";
const MIN_API_KEY_LEN: usize = 16;

/// Keys that are too short or not plain ASCII are replaced with a fresh one.
fn is_usable_key(key: &str) -> bool {
    key.len() >= MIN_API_KEY_LEN && key.chars().all(|c| c.is_ascii_graphic())
}

pub struct Config {
    pub db_path: PathBuf,
    pub data_dir: PathBuf,
    pub port: Option<u16>,
    pub bind: Option<String>,
}

/// Optional overrides read from `config.toml` and `PRECEPT_*` variables.
#[derive(Debug, Default, Deserialize)]
struct Overrides {
    db_path: Option<PathBuf>,
    port: Option<u16>,
    bind: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let proj_dirs =
            ProjectDirs::from("", "", "precept").context("Could not determine home directory")?;

        let data_dir = proj_dirs.data_dir().to_path_buf();
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;

        Self::resolve(data_dir, &proj_dirs.config_dir().join("config.toml"))
    }

    /// Layer the config file and environment over the defaults for `data_dir`.
    fn resolve(data_dir: PathBuf, config_file: &Path) -> Result<Self> {
        let overrides: Overrides = config::Config::builder()
            .add_source(config::File::from(config_file).required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX))
            .build()
            .with_context(|| format!("Failed to read config file: {}", config_file.display()))?
            .try_deserialize()
            .context("Invalid configuration")?;

        let db_path = overrides
            .db_path
            .unwrap_or_else(|| data_dir.join("precept.db"));

        Ok(Config {
            db_path,
            data_dir,
            port: overrides.port,
            bind: overrides.bind,
        })
    }

    /// Load the API key from disk, or generate a new one.
    ///
    /// Returns `(key, newly_created)` where `newly_created` is true when a
    /// fresh key was just generated (first run).
    pub fn load_or_create_api_key(&self) -> Result<(String, bool)> {
        use rand::Rng;
        use std::fmt::Write;

        let path = self.data_dir.join("api_key");

        if path.exists() {
            let key = std::fs::read_to_string(&path).context("Failed to read API key file")?;
            let key = key.trim().to_string();
            if is_usable_key(&key) {
                return Ok((key, false));
            }
        }

        let bytes: [u8; 32] = rand::rng().random();
        let key = bytes
            .iter()
            .fold(String::with_capacity(64), |mut acc: String, b| {
                let _ = write!(acc, "{b:02x}");
                acc
            });
        std::fs::write(&path, &key).context("Failed to write API key file")?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600))
                .context("Failed to set API key file permissions")?;
        }
        Ok((key, true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_in(dir: &Path) -> Config {
        Config {
            db_path: dir.join("precept.db"),
            data_dir: dir.to_path_buf(),
            port: None,
            bind: None,
        }
    }

    #[test]
    fn test_resolve_without_config_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::resolve(dir.path().to_path_buf(), &dir.path().join("none.toml")).unwrap();
        assert_eq!(config.db_path, dir.path().join("precept.db"));
        assert!(config.port.is_none());
    }

    #[test]
    fn test_resolve_reads_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("config.toml");
        std::fs::write(&file, "db_path = \"/tmp/elsewhere.db\"\nport = 9090\n").unwrap();

        let config = Config::resolve(dir.path().to_path_buf(), &file).unwrap();
        assert_eq!(config.db_path, PathBuf::from("/tmp/elsewhere.db"));
        assert_eq!(config.port, Some(9090));
        assert!(config.bind.is_none());
    }

    #[test]
    fn test_resolve_rejects_malformed_config() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("config.toml");
        std::fs::write(&file, "port = \"not a number\"\n").unwrap();
        assert!(Config::resolve(dir.path().to_path_buf(), &file).is_err());
    }

    #[test]
    fn test_api_key_created_once() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());

        let (key, created) = config.load_or_create_api_key().unwrap();
        assert!(created);
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));

        let (again, created) = config.load_or_create_api_key().unwrap();
        assert!(!created);
        assert_eq!(again, key);
    }

    #[test]
    fn test_short_or_non_ascii_api_key_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());

        for bad in ["abc", "ключ-ключ-ключ-ключ"] {
            std::fs::write(dir.path().join("api_key"), bad).unwrap();
            let (key, created) = config.load_or_create_api_key().unwrap();
            assert!(created);
            assert_eq!(key.len(), 64);
            assert_ne!(key, bad);
        }

        std::fs::write(dir.path().join("api_key"), "my-own-long-enough-key\n").unwrap();
        let (key, created) = config.load_or_create_api_key().unwrap();
        assert!(!created);
        assert_eq!(key, "my-own-long-enough-key");
    }
}
