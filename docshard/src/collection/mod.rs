//! Document storage: schemaless JSON documents, a file-backed collection and
//! the query cursor over it.

mod cursor;
mod document;
mod document_collection;
mod update_options;

pub use cursor::Cursor;
pub use document::{normalize, Document};
pub use document_collection::Collection;
pub use update_options::UpdateOptions;
