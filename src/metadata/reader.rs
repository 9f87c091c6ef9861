use std::io::Read;
use std::path::Path;
use tokio::io::AsyncReadExt;
use tokio_util::sync::CancellationToken;

use super::RawMetadata;
use super::blob;
use super::chunk::{self, TextChunk};
use crate::config::Config;
use crate::error::{Error, Result};

/// Header scans per read: the configured size, then twice that.
const MAX_ATTEMPTS: usize = 2;

/// Extracts the metadata blob from a PNG without decoding its pixels.
///
/// Only the first `buffer_size` bytes of the file are read. If the header
/// turns out to be truncated at that size, the file is re-read once with a
/// buffer twice as large; a second failure is reported as
/// [`Error::MalformedHeader`].
#[derive(Debug, Clone)]
pub struct MetadataReader {
    keyword: String,
    buffer_size: usize,
}

impl Default for MetadataReader {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

impl MetadataReader {
    pub fn new(config: &Config) -> Self {
        Self {
            keyword: config.keyword.clone(),
            buffer_size: config.buffer_size.max(1),
        }
    }

    /// Read the stored pairs. A PNG without the metadata chunk yields an empty list.
    pub fn read(&self, path: &Path) -> Result<Vec<RawMetadata>> {
        let chunks = self.scan(path)?;
        self.decode_blob(path, chunks)
    }

    /// Async [`read`](Self::read), cancellable around the file read.
    ///
    /// Cancellation is reported as [`Error::Cancelled`] whatever attempt it hits.
    pub async fn read_async(
        &self,
        path: &Path,
        token: &CancellationToken,
    ) -> Result<Vec<RawMetadata>> {
        let mut size = self.buffer_size;
        let mut attempt = 1;
        let chunks = loop {
            let header = read_prefix_async(path, size, token).await?;
            match chunk::read_text_chunks(&header) {
                Ok(chunks) => break chunks,
                Err(e) if attempt < MAX_ATTEMPTS => {
                    log::debug!(
                        "Header of {} not decodable in {size} bytes ({e}), retrying",
                        path.display()
                    );
                    size *= 2;
                    attempt += 1;
                }
                Err(source) => {
                    return Err(Error::MalformedHeader {
                        path: path.to_path_buf(),
                        source,
                    });
                }
            }
        };
        self.decode_blob(path, chunks)
    }

    /// Every header text chunk whose keyword contains one of `filters`, as raw
    /// string pairs. An empty filter list matches all chunks.
    pub fn read_text_chunks(&self, path: &Path, filters: &[&str]) -> Result<Vec<RawMetadata>> {
        let chunks = self.scan(path)?;
        Ok(chunks
            .into_iter()
            .filter(|c| filters.is_empty() || filters.iter().any(|f| c.keyword.contains(f)))
            .map(|c| RawMetadata::new(c.keyword, c.text))
            .collect())
    }

    /// Bounded two-attempt header scan.
    fn scan(&self, path: &Path) -> Result<Vec<TextChunk>> {
        let mut size = self.buffer_size;
        let mut attempt = 1;
        loop {
            let header = read_prefix(path, size)?;
            match chunk::read_text_chunks(&header) {
                Ok(chunks) => return Ok(chunks),
                Err(e) if attempt < MAX_ATTEMPTS => {
                    log::debug!(
                        "Header of {} not decodable in {size} bytes ({e}), retrying",
                        path.display()
                    );
                    size *= 2;
                    attempt += 1;
                }
                Err(source) => {
                    return Err(Error::MalformedHeader {
                        path: path.to_path_buf(),
                        source,
                    });
                }
            }
        }
    }

    fn decode_blob(&self, path: &Path, chunks: Vec<TextChunk>) -> Result<Vec<RawMetadata>> {
        let Some(found) = chunks.into_iter().find(|c| c.keyword == self.keyword) else {
            log::debug!("No {} chunk in {}", self.keyword, path.display());
            return Ok(Vec::new());
        };

        let pairs = blob::decode(&found.text).map_err(|source| Error::Blob {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("Read {} metadata entries from {}", pairs.len(), path.display());
        Ok(pairs.into_iter().map(RawMetadata::from).collect())
    }
}

/// Read at most `size` bytes from the start of `path`.
fn read_prefix(path: &Path, size: usize) -> Result<Vec<u8>> {
    let file = std::fs::File::open(path).map_err(|e| Error::io(path, e))?;
    let mut header = Vec::with_capacity(size);
    file.take(size as u64)
        .read_to_end(&mut header)
        .map_err(|e| Error::io(path, e))?;
    Ok(header)
}

async fn read_prefix_async(
    path: &Path,
    size: usize,
    token: &CancellationToken,
) -> Result<Vec<u8>> {
    if token.is_cancelled() {
        return Err(Error::Cancelled);
    }

    let read = async {
        let file = tokio::fs::File::open(path).await?;
        let mut header = Vec::with_capacity(size);
        file.take(size as u64).read_to_end(&mut header).await?;
        Ok::<_, std::io::Error>(header)
    };

    let header = tokio::select! {
        biased;
        _ = token.cancelled() => return Err(Error::Cancelled),
        res = read => res.map_err(|e| Error::io(path, e))?,
    };

    if token.is_cancelled() {
        return Err(Error::Cancelled);
    }
    Ok(header)
}
