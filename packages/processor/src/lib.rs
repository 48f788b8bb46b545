//! Thumbnail processor for the Lumina gallery.
//!
//! Given a stored image, records its pixel dimensions on the image record and
//! stores a bounded thumbnail next to it under `thumbnails/`.

pub mod config;
pub mod error;
pub mod handlers;
pub mod processor;
pub mod thumbnail;

pub use error::ProcessorError;
pub use processor::ThumbnailProcessor;
