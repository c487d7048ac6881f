use std::io;
use std::io::Write;
use std::process;

use rustyline::Editor;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use tracing::{debug,error};
use tracing_subscriber::EnvFilter;

use lsh::complete::LshHelper;
use lsh::config::{Args,Config};
use lsh::eval::{self,EvalResult};
use lsh::global;

const LOG_ENV: &str = "LSH_LOG";

fn init_logging() {
	let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(io::stderr)
		.init();
}

/// Runs one line; `Some(status)` means the interpreter should stop.
fn run_line(state: &mut global::State, line: &str) -> Option<i32> {
	for (number, job) in state.job_set.reap() {
		debug!(job = number, code = ?job.code(), "reaped");
	}
	match eval::eval_line(state, line) {
		Ok(EvalResult::Exit(status)) => Some(status),
		Ok(r) => {
			debug!(result = ?r, "line done");
			None
		},
		Err(e) => {
			let _ = writeln!(&mut io::stderr(), "lsh: {}", e);
			None
		},
	}
}

fn repl(state: &mut global::State, prompt: &str) -> i32 {
	let mut rl: Editor<LshHelper, DefaultHistory> = match Editor::new() {
		Ok(rl) => rl,
		Err(e) => {
			error!(error = %e, "cannot set up the line editor");
			return 1;
		},
	};
	rl.set_helper(Some(LshHelper::new()));
	loop {
		match rl.readline(prompt) {
			Ok(line) => {
				if !line.trim().is_empty() {
					let _ = rl.add_history_entry(line.as_str());
				}
				if let Some(status) = run_line(state, &line) {
					return status;
				}
			},
			Err(ReadlineError::Interrupted) => continue,
			Err(ReadlineError::Eof) => {
				println!("Bye");
				return 0;
			},
			Err(e) => {
				error!(error = %e, "reading a line failed");
				return 1;
			},
		}
	}
}

fn main() {
	init_logging();
	let args: Args = argh::from_env();
	let config = Config::from(args);

	let mut state = match global::State::from_config(&config) {
		Ok(state) => state,
		Err(e) => {
			let _ = writeln!(&mut io::stderr(), "lsh: saving standard streams: {}", e);
			process::exit(1);
		},
	};
	debug!(dirs = ?state.search_path.dirs(), "search path");

	let status = match config.command {
		Some(ref line) => match eval::eval_line(&mut state, line) {
			Ok(EvalResult::Done(job)) => job.code().unwrap_or(1),
			Ok(EvalResult::Exit(status)) => status,
			Ok(_) => 0,
			Err(e) => {
				let _ = writeln!(&mut io::stderr(), "lsh: {}", e);
				2
			},
		},
		None => repl(&mut state, &config.prompt),
	};
	process::exit(status)
}
