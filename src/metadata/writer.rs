use image::DynamicImage;
use img_parts::Bytes;
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::Path;

use super::MetadataKeyValue;
use super::blob;
use super::chunk;
use crate::config::Config;
use crate::error::{Error, Result};

/// Embeds metadata pairs into PNG files.
///
/// Neither operation can leave a half-written target behind: a new file is
/// fully encoded in memory before it is created, and updates go through a
/// temporary sibling that is renamed over the original.
#[derive(Debug, Clone)]
pub struct MetadataWriter {
    keyword: String,
}

impl Default for MetadataWriter {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

impl MetadataWriter {
    pub fn new(config: &Config) -> Self {
        Self {
            keyword: config.keyword.clone(),
        }
    }

    /// Write `image` to a new PNG at `target` with `pairs` embedded.
    ///
    /// The parent directory is created if missing. Fails with
    /// [`Error::AlreadyExists`] if `target` is occupied; the existing file is
    /// left alone. Empty `pairs` still produce a valid PNG, without a
    /// metadata chunk.
    pub fn create_new(
        &self,
        target: &Path,
        image: &DynamicImage,
        pairs: &[MetadataKeyValue],
    ) -> Result<()> {
        self.check_keyword()?;
        let parent = parent_dir(target)?;
        if !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
            log::debug!("Created directory {}", parent.display());
        }

        if target.exists() {
            return Err(Error::AlreadyExists(target.to_path_buf()));
        }

        let encoded = chunk::encode_image(image).map_err(|source| Error::Image {
            path: target.to_path_buf(),
            source,
        })?;
        let output = self.embed(target, Bytes::from(encoded), pairs)?;

        let mut file = match OpenOptions::new().write(true).create_new(true).open(target) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(Error::AlreadyExists(target.to_path_buf()));
            }
            Err(e) => return Err(Error::io(target, e)),
        };

        if let Err(e) = file.write_all(&output).and_then(|()| file.sync_all()) {
            drop(file);
            // we created it, so removing it cannot clobber anyone else's data
            if let Err(rm) = std::fs::remove_file(target) {
                log::warn!("Failed to remove partial file {}: {rm}", target.display());
            }
            return Err(Error::io(target, e));
        }

        log::info!(
            "Wrote {} with {} metadata entries",
            target.display(),
            pairs.len()
        );
        Ok(())
    }

    /// Replace the metadata stored in an existing PNG with `pairs`.
    ///
    /// Empty `pairs` is a no-op: the file is not touched. Otherwise the new
    /// file is written to a randomly named sibling and atomically renamed over
    /// `target`. Image data chunks are carried over unchanged.
    pub fn update_existing(&self, target: &Path, pairs: &[MetadataKeyValue]) -> Result<()> {
        if pairs.is_empty() {
            log::debug!("Nothing to write, leaving {} untouched", target.display());
            return Ok(());
        }
        self.check_keyword()?;

        let dir = parent_dir(target)?;
        let original = std::fs::read(target).map_err(|e| Error::io(target, e))?;
        let permissions = std::fs::metadata(target)
            .map_err(|e| Error::io(target, e))?
            .permissions();
        let output = self.embed(target, Bytes::from(original), pairs)?;

        // removed on drop unless persisted
        let mut temp = tempfile::Builder::new()
            .prefix(".png-stamp-")
            .suffix(".tmp")
            .tempfile_in(dir)
            .map_err(|e| Error::io(dir, e))?;
        temp.write_all(&output)
            .and_then(|()| temp.as_file().sync_all())
            .map_err(|e| Error::io(temp.path(), e))?;
        std::fs::set_permissions(temp.path(), permissions)
            .map_err(|e| Error::io(temp.path(), e))?;

        temp.persist(target).map_err(|e| Error::io(target, e.error))?;

        log::info!(
            "Updated {} with {} metadata entries",
            target.display(),
            pairs.len()
        );
        Ok(())
    }

    fn check_keyword(&self) -> Result<()> {
        if chunk::is_valid_keyword(&self.keyword) {
            Ok(())
        } else {
            Err(Error::InvalidKeyword(self.keyword.clone()))
        }
    }

    fn embed(&self, target: &Path, encoded: Bytes, pairs: &[MetadataKeyValue]) -> Result<Bytes> {
        let text = if pairs.is_empty() {
            None
        } else {
            Some(blob::encode(pairs).map_err(|source| Error::Blob {
                path: target.to_path_buf(),
                source,
            })?)
        };

        chunk::embed(encoded, &self.keyword, text.as_deref()).map_err(|source| Error::Container {
            path: target.to_path_buf(),
            source,
        })
    }
}

/// Directory holding `target`. A bare file name lives in the current directory.
fn parent_dir(target: &Path) -> Result<&Path> {
    match target.parent() {
        Some(parent) if parent.as_os_str().is_empty() => Ok(Path::new(".")),
        Some(parent) => Ok(parent),
        None => Err(Error::NoParent(target.to_path_buf())),
    }
}
