use std::ffi::CString;
use std::io;
use std::io::Write;
use std::os::unix::io::{AsRawFd,OwnedFd,RawFd};

use nix::errno::Errno;
use nix::fcntl::OFlag;
use nix::unistd::{self,ForkResult,Pid};
use tracing::{debug,info,warn};

use crate::builtin::Dispatch;
use crate::error::{Error,ExecError,LaunchError};
use crate::global;
use crate::job::{Job,JobBuilder};
use crate::parser::{self,Analysis};
use crate::redirect::{self,SavedStdio};
use crate::search::{self,SearchPath};
use crate::token;
use crate::types::*;

/// A stage with everything the child needs already allocated.
struct Prepared<'a> {
	name: &'a str,
	argv: Vec<CString>,
	candidates: Vec<CString>,
	redirects: &'a [Redirect],
}

impl<'a> Prepared<'a> {
	fn new(search_path: &SearchPath, index: usize, stage: &'a Stage) -> Result<Prepared<'a>, LaunchError> {
		if stage.argv.is_empty() {
			return Err(LaunchError::EmptyCommand(index));
		}
		let argv: Result<Vec<CString>, _> = stage.argv.iter().map(|s| CString::new(s.as_str())).collect();
		Ok(Prepared {
			name: stage.name(),
			argv: argv?,
			candidates: search_path.candidates(stage.name())?,
			redirects: &stage.redirects,
		})
	}
}

mod child {
	use libc;

	/// Writes straight to fd 2; nothing buffered or locked survives a fork.
	pub fn report(msg: &str) {
		let line = format!("lsh: {}\n", msg);
		unsafe {
			libc::write(libc::STDERR_FILENO, line.as_ptr() as *const libc::c_void, line.len());
		}
	}

	pub fn exit(status: i32) -> ! {
		unsafe { libc::_exit(status) }
	}
}

fn exec_stage(stage: &Prepared) -> ! {
	for redirect in stage.redirects {
		if let Err(e) = redirect::apply(redirect) {
			child::report(&e.to_string());
			if redirect.is_input() {
				child::exit(1);
			}
		}
	}
	let (err, status) = match search::exec(&stage.candidates, &stage.argv) {
		Errno::ENOENT | Errno::ENOTDIR => (ExecError::NotFound(stage.name.to_string()), 127),
		e => (ExecError::Nix { name: stage.name.to_string(), source: e }, 126),
	};
	child::report(&err.to_string());
	child::exit(status)
}

fn wire(fd: RawFd, stream: Stream) {
	if let Err(e) = unistd::dup2(fd, stream.fd()) {
		child::report(&format!("dup2 onto {}: {}", stream, e));
		child::exit(1);
	}
}

fn finish(mut job: Job, saved: &SavedStdio, is_background: bool) -> Result<Job, LaunchError> {
	if !is_background {
		let r = job.wait().map_err(LaunchError::Wait);
		saved.restore().map_err(LaunchError::Restore)?;
		r?;
	}
	Ok(job)
}

/// Runs a pipe-free command. In the foreground the interpreter's standard
/// streams are restored once the child is gone.
pub fn launch_single(search_path: &SearchPath, stage: &Stage, saved: &SavedStdio, is_background: bool) -> Result<Job, LaunchError> {
	let prepared = Prepared::new(search_path, 0, stage)?;
	let mut job_builder = JobBuilder::new(1);
	match job_builder.push_fork().map_err(|e| LaunchError::Fork { stage: 0, source: e })? {
		ForkResult::Child => exec_stage(&prepared),
		ForkResult::Parent { child } => {
			debug!(pid = child.as_raw(), name = prepared.name, background = is_background, "launched");
		},
	}
	finish(job_builder.build(), saved, is_background)
}

/// Runs `stages` connected by pipes.
///
/// Every pipe exists before the first fork. A stage that cannot be resolved
/// only fails itself; a fork failure stops the remaining stages from being
/// started and fails the line once the started ones are collected.
pub fn launch_pipeline(search_path: &SearchPath, stages: &[Stage], saved: &SavedStdio, is_background: bool) -> Result<Job, LaunchError> {
	if stages.is_empty() {
		return Err(LaunchError::NoStages);
	}
	let prepared: Vec<Prepared> = stages.iter().enumerate()
		.map(|(k, s)| Prepared::new(search_path, k, s))
		.collect::<Result<_, _>>()?;
	let last = prepared.len() - 1;

	let mut pipes: Vec<(OwnedFd, OwnedFd)> = Vec::with_capacity(last);
	for _ in 0 .. last {
		pipes.push(unistd::pipe2(OFlag::O_CLOEXEC).map_err(LaunchError::Pipe)?);
	}

	let mut job_builder = JobBuilder::new(prepared.len());
	let mut fork_error = None;
	for (k, stage) in prepared.iter().enumerate() {
		match job_builder.push_fork() {
			Ok(ForkResult::Child) => {
				if k != 0 {
					wire(pipes[k - 1].0.as_raw_fd(), Stream::Stdin);
				}
				if k != last {
					wire(pipes[k].1.as_raw_fd(), Stream::Stdout);
				}
				for &(ref read, ref write) in &pipes {
					let _ = unistd::close(read.as_raw_fd());
					let _ = unistd::close(write.as_raw_fd());
				}
				exec_stage(stage);
			},
			Ok(ForkResult::Parent { child }) => {
				debug!(pid = child.as_raw(), name = stage.name, stage = k, "launched");
			},
			Err(e) => {
				fork_error = Some(LaunchError::Fork { stage: k, source: e });
				break;
			},
		}
	}
	drop(pipes);

	match fork_error {
		Some(e) => {
			// the started stages are collected so none is left as a zombie
			if let Err(collect) = finish(job_builder.build(), saved, false) {
				warn!(error = %collect, "collecting started stages failed");
			}
			Err(e)
		},
		None => finish(job_builder.build(), saved, is_background),
	}
}

#[derive(Debug)]
pub enum EvalResult {
	/// The line held no words.
	Empty,
	/// A built-in took care of the line.
	Handled,
	Exit(i32),
	/// A foreground pipeline ran to completion.
	Done(Job),
	/// A background pipeline was started as job `number`.
	Running { number: usize, pids: Vec<Pid> },
}

/// Launches an analysed line.
pub fn eval(state: &mut global::State, analysis: Analysis) -> Result<EvalResult, LaunchError> {
	for e in &analysis.redirect_errors {
		warn!(error = %e, "redirection dropped");
		let _ = writeln!(&mut io::stderr(), "lsh: {}", e);
	}

	let pipeline = &analysis.pipeline;
	let job = match analysis.mode {
		Mode::Single => {
			let stage = pipeline.stages.first().ok_or(LaunchError::NoStages)?;
			launch_single(&state.search_path, stage, &state.saved_stdio, pipeline.is_background)?
		},
		Mode::Piped => launch_pipeline(&state.search_path, &pipeline.stages, &state.saved_stdio, pipeline.is_background)?,
	};

	if pipeline.is_background {
		let pids = job.pids();
		let number = state.job_set.push(job);
		info!(job = number, pids = ?pids, "running in background");
		Ok(EvalResult::Running { number: number, pids: pids })
	} else {
		debug!(code = ?job.code(), "pipeline finished");
		Ok(EvalResult::Done(job))
	}
}

/// Tokenizes, intercepts built-ins, analyses and launches one line.
pub fn eval_line(state: &mut global::State, line: &str) -> Result<EvalResult, Error> {
	let words = token::split(line, &state.separators, state.max_words)?;
	if words.is_empty() {
		return Ok(EvalResult::Empty);
	}
	let analysis = match state.builtins.dispatch(&words) {
		Dispatch::Handled => return Ok(EvalResult::Handled),
		Dispatch::Exit(status) => return Ok(EvalResult::Exit(status)),
		Dispatch::Rewrite(words) => parser::analyze(&words)?,
		Dispatch::External => parser::analyze(&words)?,
	};
	Ok(eval(state, analysis)?)
}
