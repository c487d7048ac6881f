use crate::error::ParseError;

pub const SEPARATORS: &str = " \t\n";

/// Splits `line` into the non-empty words delimited by runs of `separators`.
///
/// Words borrow from `line`. With `limit` set, a line holding more words than
/// the limit is rejected as a whole.
pub fn split<'a>(line: &'a str, separators: &str, limit: Option<usize>) -> Result<Vec<&'a str>, ParseError> {
	let mut words = vec![];
	for word in line.split(|c: char| separators.contains(c)).filter(|w| !w.is_empty()) {
		if let Some(limit) = limit {
			if words.len() == limit {
				return Err(ParseError::TooManyWords { limit: limit });
			}
		}
		words.push(word);
	}
	Ok(words)
}
