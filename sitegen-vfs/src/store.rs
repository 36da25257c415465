// ---------------------------------------------------------------------------
// File store: normalized path → file record
// ---------------------------------------------------------------------------

use im::OrdMap;

use crate::error::VfsError;
use crate::hash::content_hash;
use crate::path::{normalize_path, validate_path, VfsLimits};
use crate::search::SearchQuery;
use crate::types::{FileInput, FileSummary, SearchHit, StoreMetrics, VfsFile};

/// Saved store state. Cloning an `OrdMap` shares structure, so taking one is
/// O(1) and later writes to the store never reach it.
#[derive(Debug, Clone)]
pub(crate) struct Checkpoint {
	files: OrdMap<String, VfsFile>,
	total_size: u64,
}

// ---------------------------------------------------------------------------
// FileStore
// ---------------------------------------------------------------------------

/// Owns every file of one editing session. Accessors hand out clones.
#[derive(Debug, Clone)]
pub struct FileStore {
	files: OrdMap<String, VfsFile>,
	limits: VfsLimits,
	total_size: u64,
}

impl Default for FileStore {
	fn default() -> Self {
		Self::new(VfsLimits::default())
	}
}

impl FileStore {
	// -- Constructors -----------------------------------------------------

	pub fn new(limits: VfsLimits) -> Self {
		Self {
			files: OrdMap::new(),
			limits,
			total_size: 0,
		}
	}

	/// Build a store from caller-supplied descriptors. Later duplicates of a
	/// normalized path replace earlier ones.
	pub fn from_files<I>(files: I, limits: VfsLimits) -> Result<Self, VfsError>
	where
		I: IntoIterator<Item = FileInput>,
	{
		let mut store = Self::new(limits);
		for input in files {
			let key = store.assert_valid_path(&input.path)?;
			store.write(input.into_file(key))?;
		}
		tracing::debug!(files = store.files.len(), "store constructed");
		Ok(store)
	}

	pub fn limits(&self) -> &VfsLimits {
		&self.limits
	}

	// -- Helpers (private) ------------------------------------------------

	fn assert_valid_path(&self, path: &str) -> Result<String, VfsError> {
		let normalized = normalize_path(path)?;
		if let Some(err) = validate_path(&normalized, &self.limits) {
			return Err(VfsError::InvalidPath(format!("{}: {}", err, normalized)));
		}
		Ok(normalized)
	}

	fn assert_file_size(&self, size: u64, path: &str) -> Result<(), VfsError> {
		if size > self.limits.max_file_size {
			return Err(VfsError::LimitExceeded(format!(
				"File size {} exceeds limit ({}): {}",
				size, self.limits.max_file_size, path
			)));
		}
		Ok(())
	}

	fn assert_total_size(&self, old_size: u64, new_size: u64) -> Result<(), VfsError> {
		let projected = self.total_size - old_size + new_size;
		if projected > self.limits.max_total_size {
			return Err(VfsError::LimitExceeded(format!(
				"Total storage size would exceed limit ({})",
				self.limits.max_total_size
			)));
		}
		Ok(())
	}

	fn assert_file_count(&self) -> Result<(), VfsError> {
		if self.files.len() >= self.limits.max_file_count {
			return Err(VfsError::LimitExceeded(format!(
				"Maximum file count exceeded ({})",
				self.limits.max_file_count
			)));
		}
		Ok(())
	}

	// -- Queries ----------------------------------------------------------

	/// Every file, sorted by path.
	pub fn snapshot(&self) -> Vec<VfsFile> {
		self.files.values().cloned().collect()
	}

	pub fn list(&self) -> Vec<FileSummary> {
		self.files
			.values()
			.map(|f| FileSummary {
				path: f.path.clone(),
				kind: f.kind,
				size: f.size(),
				hash: content_hash(&f.content),
			})
			.collect()
	}

	/// Look a file up. A missing file is `Ok(None)`; only a malformed path errors.
	pub fn read(&self, path: &str) -> Result<Option<VfsFile>, VfsError> {
		let normalized = self.assert_valid_path(path)?;
		Ok(self.files.get(&normalized).cloned())
	}

	pub fn contains(&self, path: &str) -> Result<bool, VfsError> {
		let normalized = self.assert_valid_path(path)?;
		Ok(self.files.contains_key(&normalized))
	}

	pub fn search(&self, query: &SearchQuery) -> Result<Vec<SearchHit>, VfsError> {
		let matcher = query.compile()?;
		let hits = self
			.files
			.values()
			.filter_map(|f| {
				let indices = matcher.find_offsets(&f.content);
				if indices.is_empty() {
					None
				} else {
					Some(SearchHit {
						path: f.path.clone(),
						indices,
					})
				}
			})
			.collect();
		Ok(hits)
	}

	pub fn len(&self) -> usize {
		self.files.len()
	}

	pub fn is_empty(&self) -> bool {
		self.files.is_empty()
	}

	pub fn metrics(&self) -> StoreMetrics {
		StoreMetrics {
			file_count: self.files.len(),
			total_size: self.total_size,
		}
	}

	// -- Mutations --------------------------------------------------------

	/// Insert or wholesale replace the record at `file.path`.
	pub fn write(&mut self, mut file: VfsFile) -> Result<(), VfsError> {
		let normalized = self.assert_valid_path(&file.path)?;
		let new_size = file.size();
		self.assert_file_size(new_size, &normalized)?;

		let old_size = match self.files.get(&normalized) {
			Some(existing) => existing.size(),
			None => {
				self.assert_file_count()?;
				0
			}
		};
		self.assert_total_size(old_size, new_size)?;

		file.path = normalized.clone();
		let replaced = self.files.insert(normalized.clone(), file);
		self.total_size = self.total_size - old_size + new_size;

		tracing::debug!(path = %normalized, size = new_size, is_new = replaced.is_none(), "write");
		Ok(())
	}

	/// Remove a file. Returns whether anything was removed.
	pub fn delete(&mut self, path: &str) -> Result<bool, VfsError> {
		let normalized = self.assert_valid_path(path)?;
		match self.files.remove(&normalized) {
			Some(removed) => {
				self.total_size -= removed.size();
				tracing::debug!(path = %normalized, "delete");
				Ok(true)
			}
			None => Ok(false),
		}
	}

	/// Move a record to a new key. The destination must not exist.
	pub fn rename(&mut self, from: &str, to: &str) -> Result<(), VfsError> {
		let normalized_from = self.assert_valid_path(from)?;
		let normalized_to = self.assert_valid_path(to)?;

		if !self.files.contains_key(&normalized_from) {
			return Err(VfsError::NotFound(format!("No such file: {}", normalized_from)));
		}
		if self.files.contains_key(&normalized_to) {
			return Err(VfsError::AlreadyExists(format!(
				"Destination already exists: {}",
				normalized_to
			)));
		}

		if let Some(mut file) = self.files.remove(&normalized_from) {
			file.path = normalized_to.clone();
			self.files.insert(normalized_to.clone(), file);
		}

		tracing::debug!(from = %normalized_from, to = %normalized_to, "rename");
		Ok(())
	}

	// -- Checkpoints ------------------------------------------------------

	pub(crate) fn checkpoint(&self) -> Checkpoint {
		Checkpoint {
			files: self.files.clone(),
			total_size: self.total_size,
		}
	}

	pub(crate) fn rollback(&mut self, checkpoint: Checkpoint) {
		self.files = checkpoint.files;
		self.total_size = checkpoint.total_size;
	}
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
	use super::*;
	use crate::types::FileKind;

	fn input(path: &str, content: &str) -> FileInput {
		FileInput {
			path: path.to_string(),
			content: content.to_string(),
			kind: None,
			description: None,
		}
	}

	fn site() -> FileStore {
		FileStore::from_files(
			vec![input("index.html", "<h1>Hi</h1>"), input("app.css", "h1{color:red}")],
			VfsLimits::default(),
		)
		.unwrap()
	}

	fn content(store: &FileStore, path: &str) -> Option<String> {
		store.read(path).unwrap().map(|f| f.content)
	}

	// -- construction --

	#[test]
	fn construction_round_trips() {
		let store = site();
		let snap = store.snapshot();
		assert_eq!(snap.len(), 2);
		assert_eq!(snap[0].path, "app.css");
		assert_eq!(snap[0].kind, FileKind::Style);
		assert_eq!(snap[1].path, "index.html");
		assert_eq!(snap[1].content, "<h1>Hi</h1>");
	}

	#[test]
	fn construction_normalizes_and_last_write_wins() {
		let store = FileStore::from_files(
			vec![input("/a.txt", "first"), input("\\a.txt", "second")],
			VfsLimits::default(),
		)
		.unwrap();
		assert_eq!(store.len(), 1);
		assert_eq!(content(&store, "a.txt").as_deref(), Some("second"));
	}

	#[test]
	fn construction_rejects_empty_path() {
		let err = FileStore::from_files(vec![input("  ", "x")], VfsLimits::default()).unwrap_err();
		assert!(matches!(err, VfsError::InvalidPath(_)));
	}

	#[test]
	fn construction_keeps_explicit_kind_and_description() {
		let store = FileStore::from_files(
			vec![FileInput {
				path: "nav.js".into(),
				content: "export {}".into(),
				kind: Some(FileKind::Component),
				description: Some("site navigation".into()),
			}],
			VfsLimits::default(),
		)
		.unwrap();
		let f = store.read("nav.js").unwrap().unwrap();
		assert_eq!(f.kind, FileKind::Component);
		assert_eq!(f.description.as_deref(), Some("site navigation"));
	}

	// -- read / write --

	#[test]
	fn write_then_read_through_equivalent_path() {
		let mut store = FileStore::default();
		store.write(VfsFile::new("/src\\main.ts", "let x = 1;")).unwrap();
		assert_eq!(content(&store, "src/main.ts").as_deref(), Some("let x = 1;"));
		assert_eq!(content(&store, " //src/main.ts").as_deref(), Some("let x = 1;"));
	}

	#[test]
	fn read_missing_is_none() {
		assert_eq!(site().read("nope.js").unwrap(), None);
	}

	#[test]
	fn read_invalid_path_errors() {
		assert!(matches!(site().read(""), Err(VfsError::InvalidPath(_))));
	}

	#[test]
	fn write_overwrites_wholesale() {
		let mut store = site();
		store
			.write(VfsFile::new("index.html", "<p>new</p>").with_description("landing"))
			.unwrap();
		let f = store.read("index.html").unwrap().unwrap();
		assert_eq!(f.content, "<p>new</p>");
		assert_eq!(f.description.as_deref(), Some("landing"));
		assert_eq!(store.len(), 2);
	}

	#[test]
	fn returned_records_are_copies() {
		let store = site();
		let mut f = store.read("index.html").unwrap().unwrap();
		f.content.push_str("mutated");
		let mut snap = store.snapshot();
		snap[0].content.clear();
		assert_eq!(content(&store, "index.html").as_deref(), Some("<h1>Hi</h1>"));
		assert_eq!(content(&store, "app.css").as_deref(), Some("h1{color:red}"));
	}

	// -- delete --

	#[test]
	fn delete_existing() {
		let mut store = site();
		assert!(store.delete("/app.css").unwrap());
		assert_eq!(store.read("app.css").unwrap(), None);
		assert_eq!(store.len(), 1);
	}

	#[test]
	fn delete_missing_returns_false() {
		let mut store = site();
		assert!(!store.delete("missing.css").unwrap());
		assert_eq!(store.len(), 2);
	}

	// -- rename --

	#[test]
	fn rename_moves_record() {
		let mut store = site();
		store.rename("app.css", "styles/app.css").unwrap();
		assert_eq!(store.read("app.css").unwrap(), None);
		let moved = store.read("styles/app.css").unwrap().unwrap();
		assert_eq!(moved.content, "h1{color:red}");
		assert_eq!(moved.path, "styles/app.css");
	}

	#[test]
	fn rename_missing_source_fails() {
		let mut store = FileStore::default();
		let err = store.rename("missing", "dest").unwrap_err();
		assert!(matches!(err, VfsError::NotFound(_)));
		assert!(store.is_empty());
	}

	#[test]
	fn rename_onto_existing_fails_without_change() {
		let mut store = site();
		let err = store.rename("app.css", "index.html").unwrap_err();
		assert!(matches!(err, VfsError::AlreadyExists(_)));
		assert_eq!(content(&store, "app.css").as_deref(), Some("h1{color:red}"));
		assert_eq!(content(&store, "index.html").as_deref(), Some("<h1>Hi</h1>"));
	}

	#[test]
	fn rename_onto_itself_fails() {
		let mut store = site();
		let err = store.rename("app.css", "/app.css").unwrap_err();
		assert!(matches!(err, VfsError::AlreadyExists(_)));
		assert!(store.contains("app.css").unwrap());
	}

	// -- list / search --

	#[test]
	fn list_summarizes_files() {
		let list = site().list();
		assert_eq!(list.len(), 2);
		assert_eq!(list[1].path, "index.html");
		assert_eq!(list[1].kind, FileKind::Page);
		assert_eq!(list[1].size, 11);
		assert_eq!(list[1].hash, content_hash("<h1>Hi</h1>"));
	}

	#[test]
	fn search_literal() {
		let store =
			FileStore::from_files(vec![input("a.txt", "one two one")], VfsLimits::default()).unwrap();
		let hits = store.search(&SearchQuery::Literal("one".into())).unwrap();
		assert_eq!(
			hits,
			vec![SearchHit {
				path: "a.txt".into(),
				indices: vec![0, 8]
			}]
		);
	}

	#[test]
	fn search_omits_files_without_matches() {
		let hits = site().search(&SearchQuery::Pattern(r"color:\w+".into())).unwrap();
		assert_eq!(hits.len(), 1);
		assert_eq!(hits[0].path, "app.css");
		assert_eq!(hits[0].indices, vec![3]);
	}

	#[test]
	fn search_invalid_pattern_errors() {
		let err = site().search(&SearchQuery::Pattern("[".into())).unwrap_err();
		assert!(matches!(err, VfsError::InvalidPattern(_)));
	}

	// -- limits --

	#[test]
	fn file_size_limit_enforced() {
		let limits = VfsLimits {
			max_file_size: 4,
			..VfsLimits::default()
		};
		let mut store = FileStore::new(limits);
		let err = store.write(VfsFile::new("big.txt", "12345")).unwrap_err();
		assert!(matches!(err, VfsError::LimitExceeded(_)));
		assert!(store.is_empty());
	}

	#[test]
	fn total_size_limit_counts_replacement() {
		let limits = VfsLimits {
			max_total_size: 10,
			..VfsLimits::default()
		};
		let mut store = FileStore::new(limits);
		store.write(VfsFile::new("a.txt", "123456")).unwrap();
		// Replacing a.txt frees its old bytes first.
		store.write(VfsFile::new("a.txt", "1234567890")).unwrap();
		let err = store.write(VfsFile::new("b.txt", "1")).unwrap_err();
		assert!(matches!(err, VfsError::LimitExceeded(_)));
		assert_eq!(store.metrics().total_size, 10);
	}

	#[test]
	fn file_count_limit_enforced() {
		let limits = VfsLimits {
			max_file_count: 1,
			..VfsLimits::default()
		};
		let mut store = FileStore::new(limits);
		store.write(VfsFile::new("a.txt", "a")).unwrap();
		store.write(VfsFile::new("a.txt", "b")).unwrap();
		let err = store.write(VfsFile::new("b.txt", "b")).unwrap_err();
		assert!(matches!(err, VfsError::LimitExceeded(_)));
	}

	#[test]
	fn metrics_track_sizes() {
		let mut store = site();
		assert_eq!(store.metrics().total_size, 11 + 13);
		store.delete("index.html").unwrap();
		store.rename("app.css", "main.css").unwrap();
		let m = store.metrics();
		assert_eq!(m.file_count, 1);
		assert_eq!(m.total_size, 13);
	}

	// -- checkpoints --

	#[test]
	fn rollback_restores_checkpoint() {
		let mut store = site();
		let cp = store.checkpoint();
		store.write(VfsFile::new("new.js", "x")).unwrap();
		store.delete("index.html").unwrap();
		store.rollback(cp);
		assert_eq!(store.snapshot(), site().snapshot());
		assert_eq!(store.metrics(), site().metrics());
	}
}
