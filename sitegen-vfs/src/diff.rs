// ---------------------------------------------------------------------------
// Diff engine: atomic application of edit batches to a FileStore
// ---------------------------------------------------------------------------

use std::collections::HashSet;

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::VfsError;
use crate::path::normalize_path;
use crate::store::FileStore;
use crate::types::{FileInput, FileKind, VfsFile};

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// One structural edit. Batches are applied in the order given.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DiffOp {
	/// Add a file that must not exist yet.
	Create { file: FileInput },
	/// Remove a file that must exist.
	Delete { path: String },
	/// Upsert. Omitted `kind`/`description` carry over from an existing file.
	Write {
		path: String,
		content: String,
		#[serde(default)]
		kind: Option<FileKind>,
		#[serde(default)]
		description: Option<String>,
	},
	/// Swap the single occurrence of `old_string_with_context` for `new_string`.
	Replace {
		path: String,
		#[serde(rename = "oldStringWithContext")]
		old_string_with_context: String,
		#[serde(rename = "newString")]
		new_string: String,
	},
	/// Re-key a file. The destination must not exist.
	Rename { from: String, to: String },
}

impl DiffOp {
	pub fn name(&self) -> &'static str {
		match self {
			Self::Create { .. } => "create",
			Self::Delete { .. } => "delete",
			Self::Write { .. } => "write",
			Self::Replace { .. } => "replace",
			Self::Rename { .. } => "rename",
		}
	}
}

/// Decode a JSON batch. Any entry that is not one of the known operation
/// shapes rejects the whole batch.
pub fn parse_batch(value: serde_json::Value) -> Result<Vec<DiffOp>, VfsError> {
	let entries = match value {
		serde_json::Value::Array(entries) => entries,
		other => {
			return Err(VfsError::UnknownOperation(format!(
				"Diff batch must be an array, got {}",
				json_type_name(&other)
			)));
		}
	};

	entries
		.into_iter()
		.enumerate()
		.map(|(i, entry)| {
			serde_json::from_value(entry)
				.map_err(|e| VfsError::UnknownOperation(format!("op {}: {}", i, e)))
		})
		.collect()
}

fn json_type_name(v: &serde_json::Value) -> &'static str {
	match v {
		serde_json::Value::Null => "null",
		serde_json::Value::Bool(_) => "boolean",
		serde_json::Value::Number(_) => "number",
		serde_json::Value::String(_) => "string",
		serde_json::Value::Array(_) => "array",
		serde_json::Value::Object(_) => "object",
	}
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Result of a batch: every op applied, or none.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
	Applied { changed_files: Vec<String> },
	Failed { error: String },
}

impl ApplyOutcome {
	pub fn is_ok(&self) -> bool {
		matches!(self, Self::Applied { .. })
	}
}

impl From<Result<Vec<String>, VfsError>> for ApplyOutcome {
	fn from(result: Result<Vec<String>, VfsError>) -> Self {
		match result {
			Ok(changed_files) => Self::Applied { changed_files },
			Err(e) => Self::Failed {
				error: e.to_string(),
			},
		}
	}
}

// Wire shape: `{ok: true, changedFiles}` or `{ok: false, error}`.
impl Serialize for ApplyOutcome {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		let mut s = serializer.serialize_struct("ApplyOutcome", 2)?;
		match self {
			Self::Applied { changed_files } => {
				s.serialize_field("ok", &true)?;
				s.serialize_field("changedFiles", changed_files)?;
			}
			Self::Failed { error } => {
				s.serialize_field("ok", &false)?;
				s.serialize_field("error", error)?;
			}
		}
		s.end()
	}
}

// ---------------------------------------------------------------------------
// Application
// ---------------------------------------------------------------------------

/// Paths touched by a batch, first-touch order, no duplicates.
#[derive(Debug, Default)]
struct ChangedSet {
	seen: HashSet<String>,
	order: Vec<String>,
}

impl ChangedSet {
	fn push(&mut self, path: String) {
		if self.seen.insert(path.clone()) {
			self.order.push(path);
		}
	}

	fn into_vec(self) -> Vec<String> {
		self.order
	}
}

/// Apply `ops` atomically and report the outcome as data.
pub fn apply_diff(store: &mut FileStore, ops: &[DiffOp]) -> ApplyOutcome {
	try_apply_diff(store, ops).into()
}

/// Apply `ops` atomically. On the first failure the store is restored to its
/// state before the call and that failure is returned.
pub fn try_apply_diff(store: &mut FileStore, ops: &[DiffOp]) -> Result<Vec<String>, VfsError> {
	let checkpoint = store.checkpoint();
	let mut changed = ChangedSet::default();

	for (index, op) in ops.iter().enumerate() {
		if let Err(e) = apply_op(store, op, &mut changed) {
			store.rollback(checkpoint);
			tracing::warn!(index, op = op.name(), error = %e, "diff batch rolled back");
			return Err(e);
		}
	}

	let changed = changed.into_vec();
	tracing::debug!(ops = ops.len(), changed = changed.len(), "diff batch applied");
	Ok(changed)
}

fn apply_op(store: &mut FileStore, op: &DiffOp, changed: &mut ChangedSet) -> Result<(), VfsError> {
	match op {
		DiffOp::Create { file } => {
			let key = normalize_path(&file.path)?;
			if store.contains(&key)? {
				return Err(VfsError::AlreadyExists(format!("File already exists: {}", key)));
			}
			store.write(file.clone().into_file(key.clone()))?;
			changed.push(key);
		}
		DiffOp::Delete { path } => {
			let key = normalize_path(path)?;
			if !store.delete(&key)? {
				return Err(VfsError::NotFound(format!("No such file: {}", key)));
			}
			changed.push(key);
		}
		DiffOp::Write {
			path,
			content,
			kind,
			description,
		} => {
			let key = normalize_path(path)?;
			let existing = store.read(&key)?;
			let kind = kind
				.or_else(|| existing.as_ref().map(|f| f.kind))
				.unwrap_or_else(|| FileKind::infer(&key));
			let description = description
				.clone()
				.or_else(|| existing.and_then(|f| f.description));
			store.write(VfsFile {
				path: key.clone(),
				content: content.clone(),
				kind,
				description,
			})?;
			changed.push(key);
		}
		DiffOp::Replace {
			path,
			old_string_with_context,
			new_string,
		} => {
			let key = normalize_path(path)?;
			let file = store
				.read(&key)?
				.ok_or_else(|| VfsError::NotFound(format!("No such file: {}", key)))?;
			let content = replace_unique(&file.content, old_string_with_context, new_string)
				.ok_or_else(|| {
					VfsError::AmbiguousOrMissingMatch(format!(
						"context must occur exactly once in {}",
						key
					))
				})?;
			store.write(VfsFile { content, ..file })?;
			changed.push(key);
		}
		DiffOp::Rename { from, to } => {
			let from_key = normalize_path(from)?;
			let to_key = normalize_path(to)?;
			store.rename(&from_key, &to_key)?;
			changed.push(from_key);
			changed.push(to_key);
		}
	}
	Ok(())
}

/// Replace `needle` in `haystack` if it occurs exactly once, counting
/// overlapping occurrences. An empty needle never qualifies.
fn replace_unique(haystack: &str, needle: &str, replacement: &str) -> Option<String> {
	let first_char = needle.chars().next()?;
	let start = haystack.find(needle)?;
	let resume = start + first_char.len_utf8();
	if haystack[resume..].contains(needle) {
		return None;
	}

	let mut out = String::with_capacity(haystack.len() - needle.len() + replacement.len());
	out.push_str(&haystack[..start]);
	out.push_str(replacement);
	out.push_str(&haystack[start + needle.len()..]);
	Some(out)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
