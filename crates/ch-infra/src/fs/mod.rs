mod document_store;

pub use document_store::{default_data_dir, FileDocumentStore};
