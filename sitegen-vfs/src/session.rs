use crate::diff::{apply_diff, parse_batch, ApplyOutcome, DiffOp};
use crate::error::VfsError;
use crate::path::VfsLimits;
use crate::search::SearchQuery;
use crate::store::FileStore;
use crate::types::{FileInput, FileSummary, SearchHit, StoreMetrics, VfsFile};

/// One editing session over a caller-supplied file collection.
///
/// Owns a single [`FileStore`] and forwards to it; drop it when the request
/// that created it is finished.
#[derive(Debug, Clone)]
pub struct Session {
	store: FileStore,
}

impl Session {
	pub fn new<I>(files: I, limits: VfsLimits) -> Result<Self, VfsError>
	where
		I: IntoIterator<Item = FileInput>,
	{
		let store = FileStore::from_files(files, limits)?;
		Ok(Self { store })
	}

	pub fn store(&self) -> &FileStore {
		&self.store
	}

	pub fn read(&self, path: &str) -> Result<Option<VfsFile>, VfsError> {
		self.store.read(path)
	}

	pub fn write(&mut self, file: VfsFile) -> Result<(), VfsError> {
		self.store.write(file)
	}

	pub fn delete(&mut self, path: &str) -> Result<bool, VfsError> {
		self.store.delete(path)
	}

	pub fn rename(&mut self, from: &str, to: &str) -> Result<(), VfsError> {
		self.store.rename(from, to)
	}

	pub fn list(&self) -> Vec<FileSummary> {
		self.store.list()
	}

	pub fn search(&self, query: &SearchQuery) -> Result<Vec<SearchHit>, VfsError> {
		self.store.search(query)
	}

	pub fn metrics(&self) -> StoreMetrics {
		self.store.metrics()
	}

	pub fn apply_diff(&mut self, ops: &[DiffOp]) -> ApplyOutcome {
		apply_diff(&mut self.store, ops)
	}

	/// Decode and apply a JSON batch. A batch that fails to decode is a
	/// failed outcome and touches nothing.
	pub fn apply_diff_json(&mut self, batch: serde_json::Value) -> ApplyOutcome {
		match parse_batch(batch) {
			Ok(ops) => self.apply_diff(&ops),
			Err(e) => {
				tracing::warn!(error = %e, "diff batch rejected");
				ApplyOutcome::Failed {
					error: e.to_string(),
				}
			}
		}
	}

	/// Current state as a plain collection, sorted by path.
	pub fn export(&self) -> Vec<VfsFile> {
		self.store.snapshot()
	}

	pub fn into_files(self) -> Vec<VfsFile> {
		self.store.snapshot()
	}
}
