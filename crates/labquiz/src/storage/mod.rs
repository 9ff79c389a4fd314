//! Persistent storage: SQLite records and document files

mod database;
mod document_store;

pub use database::Database;
pub use document_store::{DocumentStore, LocalDocumentStore};
