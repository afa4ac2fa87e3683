//! Scriptly store gateway.
//!
//! Implements the [`pipeline::BlogStore`] port twice:
//!
//! - [`MemoryStore`]: all collections in process, used by tests and by
//!   `store.backend = "memory"`.
//! - [`FirestoreStore`]: Google Cloud Firestore through its REST v1 API
//!   (production, or the local emulator).

pub mod firestore;
pub mod memory;

pub use firestore::{FirestoreConfig, FirestoreStore};
pub use memory::MemoryStore;
