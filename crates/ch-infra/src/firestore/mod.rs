//! Document storage against the Firestore REST API.

mod document_store;
mod value;

pub use document_store::FirestoreDocumentStore;
pub use value::{decode_fields, encode_fields};
