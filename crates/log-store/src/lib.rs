//! In-memory storage for captured records.
//!
//! Two independent append-only sequences, one for console records and one
//! for network records. The store is an explicitly constructed handle that
//! is cloned into every interceptor; there is no process-wide global.

mod buffer;
mod store;

pub use buffer::AppendLog;
pub use store::LogStore;
