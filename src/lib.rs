//! Personal knowledge vault: per-profile vector store with semantic search.
//!
//! ```no_run
//! use knowledge_vault::store::{KnowledgeStore, Profile};
//!
//! let mut store = KnowledgeStore::with_default_embedder("/tmp/vault");
//! let profile = Profile::default();
//! store.add("Cats", "Cats are mammals. They purr.", "manual", &profile)?;
//! for hit in store.search("mammals", 5, &profile)? {
//!     println!("{:.2} {}", hit.score, hit.record.topic);
//! }
//! # Ok::<(), knowledge_vault::VaultError>(())
//! ```

pub mod config;
pub mod embeddings;
pub mod error;
pub mod retrieval;
pub mod store;

// Re-export commonly used types
pub use config::Config;
pub use embeddings::{EmbeddingProvider, HashEmbedder};
pub use error::{Result, VaultError};
pub use retrieval::RetrievalFacade;
pub use store::{KnowledgeStore, Profile, Record, ScoredRecord};
