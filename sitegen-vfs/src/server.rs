// ---------------------------------------------------------------------------
// VfsServer: JSON-RPC dispatcher
// ---------------------------------------------------------------------------
//
// Routes JSON-RPC 2.0 requests (NDJSON, one per line) to a Session. A session
// is created by `session/open` and replaced by the next `session/open`.
// ---------------------------------------------------------------------------

use std::io::{BufRead, Write};

use serde_json::json;

use crate::diff::ApplyOutcome;
use crate::error::VfsError;
use crate::path::normalize_path;
use crate::protocol::*;
use crate::search::SearchQuery;
use crate::session::Session;
use crate::transport::NdjsonTransport;
use crate::types::{FileKind, VfsFile};

/// JSON-RPC server exposing one [`Session`] at a time.
pub struct VfsServer<W: Write = std::io::Stdout> {
	transport: NdjsonTransport<W>,
	session: Option<Session>,
}

impl<W: Write> VfsServer<W> {
	pub fn new(transport: NdjsonTransport<W>) -> Self {
		Self {
			transport,
			session: None,
		}
	}

	pub fn into_transport(self) -> NdjsonTransport<W> {
		self.transport
	}

	/// Main loop: read one request per line until EOF.
	///
	/// Lines that are not UTF-8 or not a JSON-RPC request are answered with a
	/// parse error and the loop keeps going.
	pub fn run<R: BufRead>(&mut self, mut reader: R) -> Result<(), VfsError> {
		let mut buf = Vec::new();
		loop {
			buf.clear();
			if reader.read_until(b'\n', &mut buf)? == 0 {
				break;
			}

			let line = match std::str::from_utf8(&buf) {
				Ok(line) => line,
				Err(e) => {
					tracing::warn!("Parse error: {}", e);
					self.write_parse_error();
					continue;
				}
			};
			let trimmed = line.trim();
			if trimmed.is_empty() {
				continue;
			}

			match serde_json::from_str::<JsonRpcRequest>(trimmed) {
				Ok(req) => self.dispatch(req),
				Err(e) => {
					tracing::warn!("Parse error: {}", e);
					self.write_parse_error();
				}
			}
		}

		Ok(())
	}

	fn write_parse_error(&mut self) {
		self.transport
			.write_error(json!(0), INTERNAL_ERROR, "Parse error: invalid JSON", None);
	}

	// ── Dispatch ──────────────────────────────────────────────────────────

	fn dispatch(&mut self, req: JsonRpcRequest) {
		let id = req.id;
		tracing::debug!(%id, method = %req.method, "request");

		let result = match req.method.as_str() {
			// -- Lifecycle -----------------------------------------------
			"session/open" => self.handle_open(req.params),
			"session/close" => self.handle_close(),

			// -- Queries -------------------------------------------------
			"vfs/snapshot" => self.with_session(|s| Ok(json!({ "files": s.export() }))),
			"vfs/list" => self.with_session(|s| Ok(json!({ "files": s.list() }))),
			"vfs/read" => self.with_session(|s| handle_read(s, req.params)),
			"vfs/search" => self.with_session(|s| handle_search(s, req.params)),
			"vfs/metrics" => self.with_session(|s| Ok(serde_json::to_value(s.metrics())?)),

			// -- Mutations -----------------------------------------------
			"vfs/write" => self.with_session_mut(|s| handle_write(s, req.params)),
			"vfs/delete" => self.with_session_mut(|s| handle_delete(s, req.params)),
			"vfs/rename" => self.with_session_mut(|s| handle_rename(s, req.params)),
			"vfs/applyDiff" => self.handle_apply_diff(req.params),

			// -- Unknown -------------------------------------------------
			_ => {
				self.transport.write_error(
					id,
					METHOD_NOT_FOUND,
					format!("Method not found: {}", req.method),
					None,
				);
				return;
			}
		};

		match result {
			Ok(value) => self.transport.write_response(id, value),
			Err(e) => {
				let code = match e {
					VfsError::InvalidParams(_) => INVALID_PARAMS,
					_ => VFS_ERROR,
				};
				self.transport
					.write_error(id, code, e.to_string(), Some(e.to_json_rpc_error()));
			}
		}
	}

	// ── Session accessors ─────────────────────────────────────────────────

	fn with_session<F>(&self, f: F) -> Result<serde_json::Value, VfsError>
	where
		F: FnOnce(&Session) -> Result<serde_json::Value, VfsError>,
	{
		match &self.session {
			Some(s) => f(s),
			None => Err(VfsError::NotInitialized),
		}
	}

	fn with_session_mut<F>(&mut self, f: F) -> Result<serde_json::Value, VfsError>
	where
		F: FnOnce(&mut Session) -> Result<serde_json::Value, VfsError>,
	{
		match &mut self.session {
			Some(s) => f(s),
			None => Err(VfsError::NotInitialized),
		}
	}

	// ── Lifecycle ─────────────────────────────────────────────────────────

	fn handle_open(&mut self, params: serde_json::Value) -> Result<serde_json::Value, VfsError> {
		let p: OpenParams = if params.is_null() {
			OpenParams::default()
		} else {
			parse_params(params)?
		};
		let limits = p.limits.unwrap_or_default().into_limits();
		let session = Session::new(p.files, limits)?;
		let file_count = session.store().len();
		self.session = Some(session);

		tracing::info!(file_count, "session opened");
		Ok(json!({ "fileCount": file_count }))
	}

	fn handle_close(&mut self) -> Result<serde_json::Value, VfsError> {
		let session = self.session.take().ok_or(VfsError::NotInitialized)?;
		let files = session.into_files();
		tracing::info!(file_count = files.len(), "session closed");
		Ok(json!({ "files": files }))
	}

	// ── Diff ──────────────────────────────────────────────────────────────

	fn handle_apply_diff(&mut self, params: serde_json::Value) -> Result<serde_json::Value, VfsError> {
		let p: ApplyDiffParams = parse_params(params)?;
		let session = self.session.as_mut().ok_or(VfsError::NotInitialized)?;
		let outcome = session.apply_diff_json(p.ops);

		if let ApplyOutcome::Applied { changed_files } = &outcome {
			if !changed_files.is_empty() {
				self.transport
					.write_notification("vfs/changed", json!({ "paths": changed_files }));
			}
		}
		Ok(serde_json::to_value(&outcome)?)
	}
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

fn parse_params<T: serde::de::DeserializeOwned>(
	params: serde_json::Value,
) -> Result<T, VfsError> {
	serde_json::from_value(params).map_err(|e| VfsError::InvalidParams(e.to_string()))
}

fn handle_read(s: &Session, params: serde_json::Value) -> Result<serde_json::Value, VfsError> {
	let p: PathParams = parse_params(params)?;
	let file = s.read(&p.path)?;
	Ok(json!({ "file": file }))
}

fn handle_search(s: &Session, params: serde_json::Value) -> Result<serde_json::Value, VfsError> {
	let p: SearchParams = parse_params(params)?;
	let query = match p.mode {
		SearchModeParam::Literal => SearchQuery::Literal(p.query),
		SearchModeParam::Pattern => SearchQuery::Pattern(p.query),
	};
	let results = s.search(&query)?;
	Ok(json!({ "results": results }))
}

fn handle_write(s: &mut Session, params: serde_json::Value) -> Result<serde_json::Value, VfsError> {
	let p: WriteParams = parse_params(params)?;
	let kind = match p.kind {
		Some(kind) => kind,
		None => FileKind::infer(&normalize_path(&p.path)?),
	};
	s.write(VfsFile {
		path: p.path,
		content: p.content,
		kind,
		description: p.description,
	})?;
	Ok(json!({}))
}

fn handle_delete(s: &mut Session, params: serde_json::Value) -> Result<serde_json::Value, VfsError> {
	let p: PathParams = parse_params(params)?;
	let deleted = s.delete(&p.path)?;
	Ok(json!({ "deleted": deleted }))
}

fn handle_rename(s: &mut Session, params: serde_json::Value) -> Result<serde_json::Value, VfsError> {
	let p: RenameParams = parse_params(params)?;
	s.rename(&p.from, &p.to)?;
	Ok(json!({}))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
