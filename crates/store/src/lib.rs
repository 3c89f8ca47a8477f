//! Storage backends for AeroBrain: the document vector index, the fault
//! history database, and ingestion of documents into the index.

pub mod faults;
pub mod in_memory;
pub mod ingest;
pub mod sqlite_vector;
pub mod vector;

#[cfg(test)]
mod test_support;

pub use faults::SqliteFaultStore;
pub use in_memory::InMemoryVectorStore;
pub use ingest::{IngestError, IngestOptions, IngestReport, ingest_markdown_dir, ingest_pdf_dir};
pub use sqlite_vector::SqliteVectorStore;
