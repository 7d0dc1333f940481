//! Client registry
//!
//! Tracks which identifier registered from which endpoint. Registration is
//! accepted in every voting phase; the endpoint list feeds the broadcast
//! fan-out.

pub mod entry;
pub mod store;

pub use entry::ClientRecord;
pub use store::ClientRegistry;
