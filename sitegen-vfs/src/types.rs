use serde::{Deserialize, Serialize};

use crate::path::{base_name, extension};

/// What role a file plays in the generated site. Informational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
	Component,
	Style,
	Script,
	Page,
	Config,
}

impl FileKind {
	pub fn as_str(&self) -> &str {
		match self {
			Self::Component => "component",
			Self::Style => "style",
			Self::Script => "script",
			Self::Page => "page",
			Self::Config => "config",
		}
	}

	/// Guess a kind from a normalized path's extension. Falls back to `Script`.
	pub fn infer(path: &str) -> Self {
		match extension(path).as_deref() {
			Some("jsx" | "tsx" | "vue" | "svelte") => Self::Component,
			Some("css" | "scss" | "sass" | "less") => Self::Style,
			Some("html" | "htm" | "md" | "mdx") => Self::Page,
			Some("json" | "toml" | "yaml" | "yml" | "env") => Self::Config,
			_ if base_name(path).starts_with('.') => Self::Config,
			_ => Self::Script,
		}
	}
}

/// One file held by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VfsFile {
	pub path: String,
	pub content: String,
	pub kind: FileKind,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
}

impl VfsFile {
	/// Build a file whose kind is inferred from `path`.
	pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
		let path = path.into();
		let kind = FileKind::infer(&path);
		Self {
			path,
			content: content.into(),
			kind,
			description: None,
		}
	}

	pub fn with_kind(mut self, kind: FileKind) -> Self {
		self.kind = kind;
		self
	}

	pub fn with_description(mut self, description: impl Into<String>) -> Self {
		self.description = Some(description.into());
		self
	}

	pub fn size(&self) -> u64 {
		self.content.len() as u64
	}
}

/// File descriptor as supplied by callers: `kind` may be omitted.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInput {
	pub path: String,
	#[serde(default)]
	pub content: String,
	pub kind: Option<FileKind>,
	pub description: Option<String>,
}

impl FileInput {
	/// Resolve into a file record. `key` is the normalized path the record
	/// will be stored under and drives kind inference.
	pub fn into_file(self, key: String) -> VfsFile {
		let kind = self.kind.unwrap_or_else(|| FileKind::infer(&key));
		VfsFile {
			path: key,
			content: self.content,
			kind,
			description: self.description,
		}
	}
}

impl From<VfsFile> for FileInput {
	fn from(file: VfsFile) -> Self {
		Self {
			path: file.path,
			content: file.content,
			kind: Some(file.kind),
			description: file.description,
		}
	}
}

/// Listing entry for file trees and change summaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileSummary {
	pub path: String,
	pub kind: FileKind,
	pub size: u64,
	pub hash: String,
}

/// All match offsets within one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
	pub path: String,
	/// Zero-based character offsets of each match.
	pub indices: Vec<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreMetrics {
	pub file_count: usize,
	pub total_size: u64,
}
