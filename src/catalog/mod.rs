mod content_catalog;

pub use content_catalog::{ContentCatalog, VideoEntry};
