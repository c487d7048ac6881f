use nix;

use crate::builtin::{self,Builtins};
use crate::config::Config;
use crate::job;
use crate::redirect::SavedStdio;
use crate::search;

/// Everything that outlives a single line.
pub struct State {
	pub search_path: search::SearchPath,
	pub saved_stdio: SavedStdio,
	pub job_set: job::JobSet,
	pub builtins: Box<dyn Builtins>,
	pub separators: String,
	pub max_words: Option<usize>,
}

impl State {
	pub fn new(config: &Config, search_path: search::SearchPath, builtins: Box<dyn Builtins>) -> nix::Result<State> {
		Ok(State {
			search_path: search_path,
			saved_stdio: SavedStdio::capture()?,
			job_set: job::JobSet::new(),
			builtins: builtins,
			separators: config.separators.clone(),
			max_words: config.max_words,
		})
	}

	/// The interactive setup: `PATH` from the environment and the standard
	/// built-ins.
	pub fn from_config(config: &Config) -> nix::Result<State> {
		let builtins = builtin::Standard { doc_dir: config.doc_dir.clone() };
		State::new(config, search::SearchPath::from_env(), Box::new(builtins))
	}
}
