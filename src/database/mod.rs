pub mod document;
pub mod manager;
pub mod memory;
pub mod postgres;
pub mod query;
pub mod store;

pub use document::Document;
pub use manager::DatabaseManager;
pub use memory::MemoryDocumentStore;
pub use postgres::PgDocumentStore;
pub use query::{Collection, FindQuery};
pub use store::{DocumentStore, StoreError};
