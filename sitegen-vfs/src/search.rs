use regex::Regex;

use crate::error::VfsError;

/// What to look for in file contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchQuery {
	/// Exact substring.
	Literal(String),
	/// Regular expression, `regex` crate syntax.
	Pattern(String),
}

impl SearchQuery {
	/// Validate the query once so it can be run against many files.
	pub fn compile(&self) -> Result<Matcher<'_>, VfsError> {
		match self {
			Self::Literal(q) => Ok(Matcher::Literal(q)),
			Self::Pattern(p) => Regex::new(p)
				.map(Matcher::Pattern)
				.map_err(|e| VfsError::InvalidPattern(e.to_string())),
		}
	}
}

/// A compiled [`SearchQuery`].
#[derive(Debug)]
pub enum Matcher<'a> {
	Literal(&'a str),
	Pattern(Regex),
}

impl Matcher<'_> {
	/// Zero-based character offsets of every non-overlapping match in `text`,
	/// scanning left to right.
	///
	/// Zero-length matches are never reported: an empty literal finds nothing,
	/// and a pattern that can match the empty string only reports the places
	/// where it consumes at least one character.
	pub fn find_offsets(&self, text: &str) -> Vec<usize> {
		let byte_offsets: Vec<usize> = match self {
			Self::Literal(q) => literal_byte_offsets(text, q),
			Self::Pattern(re) => re
				.find_iter(text)
				.filter(|m| !m.is_empty())
				.map(|m| m.start())
				.collect(),
		};
		to_char_offsets(text, &byte_offsets)
	}
}

fn literal_byte_offsets(text: &str, query: &str) -> Vec<usize> {
	let mut offsets = Vec::new();
	if query.is_empty() {
		return offsets;
	}
	let mut pos = 0;
	while let Some(found) = text[pos..].find(query) {
		let start = pos + found;
		offsets.push(start);
		pos = start + query.len();
	}
	offsets
}

/// Convert ascending byte offsets (all on char boundaries) to char offsets.
fn to_char_offsets(text: &str, byte_offsets: &[usize]) -> Vec<usize> {
	let mut result = Vec::with_capacity(byte_offsets.len());
	let mut last_byte = 0;
	let mut chars = 0;
	for &b in byte_offsets {
		chars += text[last_byte..b].chars().count();
		last_byte = b;
		result.push(chars);
	}
	result
}

#[cfg(test)]
mod tests {
	use super::*;

	fn literal(q: &str, text: &str) -> Vec<usize> {
		SearchQuery::Literal(q.to_string())
			.compile()
			.unwrap()
			.find_offsets(text)
	}

	fn pattern(p: &str, text: &str) -> Vec<usize> {
		SearchQuery::Pattern(p.to_string())
			.compile()
			.unwrap()
			.find_offsets(text)
	}

	#[test]
	fn literal_finds_all_occurrences() {
		assert_eq!(literal("one", "one two one"), vec![0, 8]);
	}

	#[test]
	fn literal_is_non_overlapping() {
		assert_eq!(literal("aa", "aaaa"), vec![0, 2]);
		assert_eq!(literal("aa", "aaa"), vec![0]);
	}

	#[test]
	fn literal_no_match() {
		assert!(literal("zzz", "one two").is_empty());
	}

	#[test]
	fn empty_literal_matches_nothing() {
		assert!(literal("", "abc").is_empty());
	}

	#[test]
	fn offsets_count_characters_not_bytes() {
		// "é" is two bytes in UTF-8.
		assert_eq!(literal("b", "éb éb"), vec![1, 4]);
		assert_eq!(pattern("b", "éb éb"), vec![1, 4]);
	}

	#[test]
	fn pattern_finds_matches() {
		assert_eq!(pattern(r"h\d", "h1 x h22 h"), vec![0, 5]);
	}

	#[test]
	fn pattern_is_non_overlapping() {
		assert_eq!(pattern("aa", "aaaa"), vec![0, 2]);
	}

	#[test]
	fn zero_length_pattern_matches_are_skipped() {
		assert!(pattern("", "abc").is_empty());
		assert!(pattern("^", "abc").is_empty());
		assert_eq!(pattern("a*", "baab a"), vec![1, 5]);
	}

	#[test]
	fn invalid_pattern_is_rejected() {
		let err = SearchQuery::Pattern("(".to_string()).compile().unwrap_err();
		assert!(matches!(err, VfsError::InvalidPattern(_)));
	}
}
