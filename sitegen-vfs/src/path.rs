use crate::error::VfsError;

// ── Limits ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VfsLimits {
    pub max_file_size: u64,
    pub max_total_size: u64,
    pub max_file_count: usize,
    pub max_path_length: usize,
}

impl Default for VfsLimits {
    fn default() -> Self {
        Self {
            max_file_size: 10 * 1024 * 1024,  // 10 MB
            max_total_size: 100 * 1024 * 1024, // 100 MB
            max_file_count: 10_000,
            max_path_length: 1024,
        }
    }
}

// ── Path functions ──────────────────────────────────────────────────────────

/// Canonicalize a user-supplied path into the key used by the store.
///
/// Trims surrounding whitespace, converts backslashes to forward slashes and
/// strips every leading slash. Inputs that are empty after trimming, or that
/// consist only of separators, are rejected.
pub fn normalize_path(input: &str) -> Result<String, VfsError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(VfsError::InvalidPath("Path cannot be empty".to_string()));
    }

    let replaced = trimmed.replace('\\', "/");
    let stripped = replaced.trim_start_matches('/');
    if stripped.is_empty() {
        return Err(VfsError::InvalidPath(format!(
            "Path has no name after normalization: {}",
            input
        )));
    }

    Ok(stripped.to_string())
}

/// Return the extension of the final segment, lowercased, without the dot.
/// Dotfiles such as `.env` report their name as the extension.
pub fn extension(normalized_path: &str) -> Option<String> {
    let name = base_name(normalized_path);
    let dot = name.rfind('.')?;
    let ext = &name[dot + 1..];
    if ext.is_empty() {
        None
    } else {
        Some(ext.to_ascii_lowercase())
    }
}

/// Return the final segment of a normalized path.
pub fn base_name(normalized_path: &str) -> &str {
    match normalized_path.rfind('/') {
        Some(pos) => &normalized_path[pos + 1..],
        None => normalized_path,
    }
}

/// Check if a path contains control characters.
fn has_forbidden_chars(path: &str) -> bool {
    path.bytes().any(|b| b <= 0x1f || b == 0x7f)
}

/// Validate a normalized path against limits. Returns `Some(error_message)` if invalid.
pub fn validate_path(normalized_path: &str, limits: &VfsLimits) -> Option<String> {
    if normalized_path.len() > limits.max_path_length {
        return Some(format!(
            "Path exceeds max length ({})",
            limits.max_path_length
        ));
    }
    if has_forbidden_chars(normalized_path) {
        return Some("Path contains forbidden characters".to_string());
    }
    None
}

// ── Tests ───────────────────────────────────────────────────────────────────
