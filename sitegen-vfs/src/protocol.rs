use serde::Deserialize;

use crate::path::VfsLimits;
use crate::types::{FileInput, FileKind};

// ── JSON-RPC 2.0 error codes ────────────────────────────────────────────────

pub const INTERNAL_ERROR: i32 = -32603;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;
pub const VFS_ERROR: i32 = -32000;

// ── Incoming request ────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    /// Echoed back verbatim; JSON-RPC allows numbers and strings.
    pub id: serde_json::Value,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

// ── Params ──────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenParams {
    #[serde(default)]
    pub files: Vec<FileInput>,
    pub limits: Option<LimitsParams>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LimitsParams {
    pub max_file_size: Option<u64>,
    pub max_total_size: Option<u64>,
    pub max_file_count: Option<usize>,
    pub max_path_length: Option<usize>,
}

impl LimitsParams {
    /// Overlay the supplied fields on the defaults.
    pub fn into_limits(self) -> VfsLimits {
        let defaults = VfsLimits::default();
        VfsLimits {
            max_file_size: self.max_file_size.unwrap_or(defaults.max_file_size),
            max_total_size: self.max_total_size.unwrap_or(defaults.max_total_size),
            max_file_count: self.max_file_count.unwrap_or(defaults.max_file_count),
            max_path_length: self.max_path_length.unwrap_or(defaults.max_path_length),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathParams {
    pub path: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteParams {
    pub path: String,
    pub content: String,
    pub kind: Option<FileKind>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameParams {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SearchModeParam {
    #[default]
    Literal,
    Pattern,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    pub query: String,
    #[serde(default)]
    pub mode: SearchModeParam,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyDiffParams {
    /// Left undecoded so a bad entry becomes a failed outcome, not a params error.
    pub ops: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn limits_overlay_defaults() {
        let p: LimitsParams = serde_json::from_value(json!({"maxFileCount": 3})).unwrap();
        let limits = p.into_limits();
        assert_eq!(limits.max_file_count, 3);
        assert_eq!(limits.max_file_size, VfsLimits::default().max_file_size);
    }

    #[test]
    fn open_params_default_to_empty() {
        let p: OpenParams = serde_json::from_value(json!({})).unwrap();
        assert!(p.files.is_empty());
        assert!(p.limits.is_none());
    }

    #[test]
    fn request_ids_may_be_numbers_or_strings() {
        let req: JsonRpcRequest =
            serde_json::from_value(json!({"id": 4, "method": "vfs/list"})).unwrap();
        assert_eq!(req.id, json!(4));
        assert!(req.params.is_null());
        let req: JsonRpcRequest =
            serde_json::from_value(json!({"id": "req-1", "method": "vfs/list"})).unwrap();
        assert_eq!(req.id, json!("req-1"));
    }

    #[test]
    fn search_mode_defaults_to_literal() {
        let p: SearchParams = serde_json::from_value(json!({"query": "x"})).unwrap();
        assert_eq!(p.mode, SearchModeParam::Literal);
        let p: SearchParams =
            serde_json::from_value(json!({"query": "x", "mode": "pattern"})).unwrap();
        assert_eq!(p.mode, SearchModeParam::Pattern);
    }
}
