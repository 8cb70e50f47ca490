//! Snapshot sources.
//!
//! The exposure pipeline treats the chain as an opaque data source: anything
//! implementing [`SnapshotSource`] can feed it.
//!
//! - `FileSnapshotSource`: a JSON snapshot on disk
//! - `HttpSnapshotSource`: a snapshot service over HTTP
//! - `MemorySnapshotSource`: in-memory, for tests and dry runs

mod file;
mod http;
mod memory;
mod traits;

pub use file::FileSnapshotSource;
pub use http::HttpSnapshotSource;
pub use memory::MemorySnapshotSource;
pub use traits::SnapshotSource;
#[cfg(test)]
pub use traits::MockSnapshotSource;
