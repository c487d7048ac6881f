use std::fmt;
use std::os::unix::io::RawFd;
use std::path::PathBuf;

use libc;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Stream { Stdin, Stdout, Stderr }

impl Stream {
	pub fn fd(self) -> RawFd {
		match self {
			Stream::Stdin => libc::STDIN_FILENO,
			Stream::Stdout => libc::STDOUT_FILENO,
			Stream::Stderr => libc::STDERR_FILENO,
		}
	}
}

impl fmt::Display for Stream {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match *self {
			Stream::Stdin => write!(f, "standard input"),
			Stream::Stdout => write!(f, "standard output"),
			Stream::Stderr => write!(f, "standard error"),
		}
	}
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum RedirectType { Input, Output, Append }

/// One step of a stage's redirection plan.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Redirect {
	/// Open `target` and install it as `stream`.
	File { stream: Stream, target: PathBuf, typ: RedirectType },
	/// Make `stream` a copy of whatever `of` currently refers to.
	Duplicate { stream: Stream, of: Stream },
}

impl Redirect {
	pub fn stream(&self) -> Stream {
		match *self {
			Redirect::File { stream, .. } => stream,
			Redirect::Duplicate { stream, .. } => stream,
		}
	}

	pub fn is_input(&self) -> bool {
		match *self {
			Redirect::File { typ: RedirectType::Input, .. } => true,
			_ => false,
		}
	}
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Stage {
	pub argv: Vec<String>,
	pub redirects: Vec<Redirect>,
}

impl Stage {
	/// The command word, or `""` for a stage without one.
	pub fn name(&self) -> &str {
		self.argv.first().map_or("", |s| s.as_str())
	}
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Pipeline {
	pub stages: Vec<Stage>,
	pub is_background: bool,
}

impl Pipeline {
	pub fn pipe_count(&self) -> usize {
		self.stages.len().saturating_sub(1)
	}
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Mode { Single, Piped }
