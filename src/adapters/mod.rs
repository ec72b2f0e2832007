// Adapters layer: concrete document stores and blob storages.

pub mod dump;
pub mod http_store;
pub mod memory;
pub mod storage;

pub use dump::{load_dump, load_dump_dir, load_dump_zip};
pub use http_store::HttpDocumentStore;
pub use memory::MemoryStore;
pub use storage::{HttpBlobStorage, LocalStorage};
