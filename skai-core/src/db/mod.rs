//! Durable key-value storage for skai
//!
//! A single SQLite file holds named slots. The signed-in session is the only
//! record persisted today; pipeline, assets and chat history live in memory.

pub mod repo;
pub mod schema;

pub use repo::Database;
