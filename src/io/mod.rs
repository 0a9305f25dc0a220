pub mod config_io;
pub mod document_io;
pub mod task_store;

pub use config_io::{ConfigError, load_config};
pub use document_io::{Document, DocumentError, read_document, write_document};
pub use task_store::TaskStore;
