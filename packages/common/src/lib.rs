//! Shared building blocks of the Lumina gallery: the image record model, list
//! filters, and the blob and metadata store abstractions with their backends.

pub mod config;
pub mod filter;
pub mod metadata;
pub mod processing;
pub mod record;
pub mod storage;

pub use filter::{FilterError, ImageFilter};
pub use record::{ImageRecord, ProcessingResult};
