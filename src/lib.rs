//! # png-stamp
//!
//! Typed key/value metadata stored inside PNG files — stamp provenance or
//! configuration data ("which job produced this render") onto generated images
//! and read it back later, without touching the pixels.
//!
//! ## Quick Start
//!
//! Declare the keys your application stores as a `strum`-derived enum (see
//! [`MetadataKey`]), then load, modify, and save a [`MetadataContainer`]:
//!
//! ```rust,no_run
//! use png_stamp::MetadataContainer;
//! use std::path::Path;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
//! #[derive(strum::VariantArray, strum::IntoStaticStr, strum::EnumString)]
//! pub enum RenderKey {
//!     JobId,
//!     Settings,
//! }
//!
//! fn main() -> png_stamp::Result<()> {
//!     let image = image::DynamicImage::new_rgb8(64, 64);
//!
//!     let container = MetadataContainer::new();
//!     container.add(RenderKey::JobId, "job-1234");
//!     container.add(RenderKey::Settings, serde_json::json!({"samples": 128}));
//!     container.save_new(Path::new("out/render.png"), &image)?;
//!
//!     let loaded = MetadataContainer::<RenderKey>::load(Path::new("out/render.png"))?;
//!     println!("Job: {:?}", loaded.try_get_string(RenderKey::JobId));
//!     Ok(())
//! }
//! ```
//!
//! ## Async Loading
//!
//! ```rust,no_run
//! # use png_stamp::MetadataContainer;
//! # #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
//! # #[derive(strum::VariantArray, strum::IntoStaticStr, strum::EnumString)]
//! # pub enum RenderKey { JobId }
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> png_stamp::Result<()> {
//! let token = CancellationToken::new();
//! let loaded = MetadataContainer::<RenderKey>::load_async("render.png".as_ref(), &token).await?;
//! println!("{} entries", loaded.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## File Format
//!
//! All entries are serialized as one JSON array of `{"Key": .., "Value": ..}`
//! objects and stored in a single uncompressed `iTXt` chunk directly after
//! `IHDR`, under the keyword `Stamp_Metadata` (see [`config::Config`]). Reads
//! only scan the first few kilobytes of the file.
//!
//! ## Modules
//!
//! - [`config`] — Chunk keyword and read buffer settings, loading/saving
//! - [`metadata`] — Low-level string-keyed reader and writer
//! - [`MetadataContainer`] — Typed, enum-keyed container

pub mod config;
mod container;
mod error;
mod key;
pub mod metadata;

pub use container::MetadataContainer;
pub use error::{Error, Result};
pub use key::MetadataKey;
