use image::DynamicImage;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{PoisonError, RwLock};
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::key::MetadataKey;
use crate::metadata::{self, MetadataKeyValue, MetadataReader, MetadataWriter, RawMetadata};

/// Typed, in-memory metadata for one PNG file.
///
/// Holds at most one value per key. Nothing is written until
/// [`save_new`](Self::save_new) or [`update`](Self::update) is called. The map
/// can be shared between threads; coordinating several containers that target
/// the same file is up to the caller.
///
/// # Example
///
/// ```rust,no_run
/// use png_stamp::MetadataContainer;
/// use std::path::Path;
///
/// #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// #[derive(strum::VariantArray, strum::IntoStaticStr, strum::EnumString)]
/// pub enum RenderKey { JobId, Scene }
///
/// # fn main() -> png_stamp::Result<()> {
/// let path = Path::new("render.png");
/// let container = MetadataContainer::<RenderKey>::load(path)?;
/// container.add(RenderKey::JobId, "job-1234");
/// container.update(path)?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct MetadataContainer<K: MetadataKey> {
    entries: RwLock<HashMap<K, Value>>,
    config: Config,
}

impl<K: MetadataKey> Default for MetadataContainer<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: MetadataKey> MetadataContainer<K> {
    /// An empty container using the default chunk keyword.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Wrap already extracted pairs. Pairs whose key is not a `K` are dropped.
    pub fn from_raw(raw: impl IntoIterator<Item = RawMetadata>) -> Self {
        let container = Self::new();
        container.absorb(raw);
        container
    }

    /// Load the metadata stored in `path`.
    ///
    /// A missing file gives an empty container.
    pub fn load(path: &Path) -> Result<Self> {
        Self::load_with(path, Config::default())
    }

    pub fn load_with(path: &Path, config: Config) -> Result<Self> {
        let container = Self::with_config(config);
        if path.is_file() {
            let raw = MetadataReader::new(&container.config).read(path)?;
            container.absorb(raw);
        } else {
            log::debug!("{} does not exist, starting empty", path.display());
        }
        Ok(container)
    }

    /// Async [`load`](Self::load).
    ///
    /// Cancellation yields [`Error::Cancelled`], even when `path` does not exist.
    pub async fn load_async(path: &Path, token: &CancellationToken) -> Result<Self> {
        Self::load_async_with(path, Config::default(), token).await
    }

    pub async fn load_async_with(
        path: &Path,
        config: Config,
        token: &CancellationToken,
    ) -> Result<Self> {
        let container = Self::with_config(config);
        let exists = !token.is_cancelled()
            && tokio::fs::metadata(path)
                .await
                .map(|m| m.is_file())
                .unwrap_or(false);
        if token.is_cancelled() {
            return Err(Error::Cancelled);
        }
        if exists {
            let raw = MetadataReader::new(&container.config)
                .read_async(path, token)
                .await?;
            container.absorb(raw);
        } else {
            log::debug!("{} does not exist, starting empty", path.display());
        }
        Ok(container)
    }

    /// Set `key`, replacing any previous value. A `null` value (or `None`) is ignored.
    pub fn add(&self, key: K, value: impl Into<Value>) {
        let value = value.into();
        if value.is_null() {
            return;
        }
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, value);
    }

    pub fn try_get(&self, key: K) -> Option<Value> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .cloned()
    }

    /// The value of `key` as text (strings verbatim, other values as JSON).
    pub fn try_get_string(&self, key: K) -> Option<String> {
        self.try_get(key).map(|v| metadata::render(&v))
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of all entries, in no particular order.
    pub fn entries(&self) -> Vec<(K, Value)> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(k, v)| (*k, v.clone()))
            .collect()
    }

    /// Entries in their stored form.
    pub fn snapshot(&self) -> Vec<MetadataKeyValue> {
        self.entries()
            .into_iter()
            .map(|(k, v)| MetadataKeyValue::new(k.name(), v))
            .collect()
    }

    /// Write `image` to a new file at `path` with this container's entries.
    ///
    /// `path` must not exist yet ([`Error::AlreadyExists`](crate::Error::AlreadyExists)).
    pub fn save_new(&self, path: &Path, image: &DynamicImage) -> Result<()> {
        MetadataWriter::new(&self.config).create_new(path, image, &self.snapshot())
    }

    /// Store this container's entries in the existing file at `path`.
    ///
    /// An empty container leaves the file untouched.
    pub fn update(&self, path: &Path) -> Result<()> {
        MetadataWriter::new(&self.config).update_existing(path, &self.snapshot())
    }

    fn absorb(&self, raw: impl IntoIterator<Item = RawMetadata>) {
        for item in raw {
            match K::from_name(&item.key) {
                Some(key) => self.add(key, item.value),
                None => log::debug!("Ignoring unknown metadata key {:?}", item.key),
            }
        }
    }
}

impl<K: MetadataKey, V: Into<Value>> FromIterator<(K, V)> for MetadataContainer<K> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut container = Self::new();
        container.extend(iter);
        container
    }
}

impl<K: MetadataKey, V: Into<Value>> Extend<(K, V)> for MetadataContainer<K> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.add(key, value);
        }
    }
}
