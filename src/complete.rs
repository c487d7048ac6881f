use rustyline::{Context,Helper};
use rustyline::completion::{Completer,FilenameCompleter,Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;

/// Line editor helper: TAB completes file names, nothing else is customised.
pub struct LshHelper {
	filenames: FilenameCompleter,
}

impl LshHelper {
	pub fn new() -> LshHelper {
		LshHelper { filenames: FilenameCompleter::new() }
	}
}

impl Default for LshHelper {
	fn default() -> LshHelper {
		LshHelper::new()
	}
}

impl Completer for LshHelper {
	type Candidate = Pair;

	fn complete(&self, line: &str, pos: usize, ctx: &Context<'_>) -> rustyline::Result<(usize, Vec<Pair>)> {
		self.filenames.complete(line, pos, ctx)
	}
}

impl Hinter for LshHelper {
	type Hint = String;
}

impl Highlighter for LshHelper {}

impl Validator for LshHelper {}

impl Helper for LshHelper {}
