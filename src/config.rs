use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Keyword of the text chunk holding the metadata blob.
pub const DEFAULT_KEYWORD: &str = "Stamp_Metadata";

/// Bytes read from the start of a file on the first header scan.
///
/// The metadata chunk sits right after `IHDR`, so this usually covers it.
/// 2048 is too small for typical blobs.
pub const DEFAULT_BUFFER_SIZE: usize = 6144;

/// Reader/writer configuration.
///
/// # Loading
///
/// ```rust,no_run
/// use png_stamp::config::Config;
///
/// // From a JSON file
/// let config = Config::load(Some("png-stamp.json".as_ref())).unwrap();
///
/// // Or use defaults and customize
/// let mut config = Config::default();
/// config.keyword = "Render_Metadata".into();
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// PNG text chunk keyword the blob is stored under (1–79 Latin-1 bytes).
    pub keyword: String,
    /// Initial header scan size in bytes. Doubled once on a truncated header.
    pub buffer_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            keyword: DEFAULT_KEYWORD.to_string(),
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }
}

impl Config {
    /// `png-stamp.json` in the directory of the running executable.
    pub fn config_path() -> Result<PathBuf> {
        let exe = std::env::current_exe().map_err(|e| Error::io("<current exe>", e))?;
        match exe.parent() {
            Some(dir) => Ok(dir.join("png-stamp.json")),
            None => Err(Error::NoParent(exe)),
        }
    }

    fn resolve(path: Option<&Path>) -> Result<PathBuf> {
        path.map_or_else(Self::config_path, |p| Ok(p.to_path_buf()))
    }

    /// Load from `path` (or [`config_path`](Self::config_path)). A missing
    /// file gives the defaults; a file naming an unusable keyword is rejected.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = Self::resolve(path)?;
        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::warn!("No config at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(e) => return Err(Error::io(path, e)),
        };

        let config: Self = serde_json::from_str(&contents)
            .map_err(|source| Error::Config { path, source })?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: Option<&Path>) -> Result<()> {
        let path = Self::resolve(path)?;
        let contents = serde_json::to_string_pretty(self).map_err(|source| Error::Config {
            path: path.clone(),
            source,
        })?;
        std::fs::write(&path, contents).map_err(|e| Error::io(&path, e))?;
        log::info!("Config saved to {}", path.display());
        Ok(())
    }

    /// Reject a keyword no PNG text chunk can carry.
    pub fn validate(&self) -> Result<()> {
        if crate::metadata::is_valid_keyword(&self.keyword) {
            Ok(())
        } else {
            Err(Error::InvalidKeyword(self.keyword.clone()))
        }
    }
}
