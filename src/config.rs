use std::env;
use std::path::PathBuf;

use argh::FromArgs;

use crate::token;

pub const DEFAULT_PROMPT: &str = "? ";
pub const DEFAULT_MAX_WORDS: usize = 1012;

const PWD_KEY: &str = "PWD";

#[derive(FromArgs, Debug)]
/// A small line-oriented command interpreter.
pub struct Args {
	/// prompt printed before every line
	#[argh(option, default = "String::from(DEFAULT_PROMPT)")]
	pub prompt: String,

	/// largest number of words accepted on one line; 0 means unlimited
	#[argh(option, default = "DEFAULT_MAX_WORDS")]
	pub max_words: usize,

	/// directory holding the man2 pages (defaults to the starting directory)
	#[argh(option)]
	pub doc_dir: Option<PathBuf>,

	/// run one command line and exit with its status
	#[argh(option, short = 'c')]
	pub command: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
	pub prompt: String,
	pub separators: String,
	pub max_words: Option<usize>,
	pub doc_dir: PathBuf,
	pub command: Option<String>,
}

impl Default for Config {
	fn default() -> Config {
		Config {
			prompt: DEFAULT_PROMPT.to_string(),
			separators: token::SEPARATORS.to_string(),
			max_words: Some(DEFAULT_MAX_WORDS),
			doc_dir: start_dir(),
			command: None,
		}
	}
}

impl From<Args> for Config {
	fn from(args: Args) -> Config {
		Config {
			prompt: args.prompt,
			separators: token::SEPARATORS.to_string(),
			max_words: if args.max_words == 0 { None } else { Some(args.max_words) },
			doc_dir: args.doc_dir.unwrap_or_else(start_dir),
			command: args.command,
		}
	}
}

fn start_dir() -> PathBuf {
	env::var_os(PWD_KEY)
		.map(PathBuf::from)
		.or_else(|| env::current_dir().ok())
		.unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn args_resolve_into_config() {
		let args = Args::from_args(&["lsh"], &["--max-words", "0", "--doc-dir", "/srv/doc", "-c", "ls"]).unwrap();
		let config = Config::from(args);
		assert_eq!(config.max_words, None);
		assert_eq!(config.doc_dir, PathBuf::from("/srv/doc"));
		assert_eq!(config.command.as_deref(), Some("ls"));
		assert_eq!(config.prompt, DEFAULT_PROMPT);
	}

	#[test]
	fn defaults() {
		let args = Args::from_args(&["lsh"], &[]).unwrap();
		assert_eq!(Config::from(args).max_words, Some(DEFAULT_MAX_WORDS));
	}
}
