//! In-memory virtual file system for generated website code.
//!
//! A [`Session`] wraps one [`FileStore`]; edit batches go through
//! [`apply_diff`], which applies every [`DiffOp`] or none of them.

pub mod diff;
pub mod error;
pub mod hash;
pub mod path;
pub mod protocol;
pub mod search;
pub mod server;
pub mod session;
pub mod store;
pub mod transport;
pub mod types;

pub use diff::{apply_diff, parse_batch, try_apply_diff, ApplyOutcome, DiffOp};
pub use error::VfsError;
pub use hash::content_hash;
pub use path::{normalize_path, VfsLimits};
pub use search::SearchQuery;
pub use session::Session;
pub use store::FileStore;
pub use types::{FileInput, FileKind, FileSummary, SearchHit, StoreMetrics, VfsFile};
