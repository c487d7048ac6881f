use std::{ffi,io};
use std::path::PathBuf;

use nix;
use thiserror::Error;

use crate::types::Stream;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
	#[error("too many words (limit is {limit})")]
	TooManyWords { limit: usize },
	#[error("missing target after '{0}'")]
	MissingTarget(String),
	#[error("empty command in stage {0}")]
	EmptyStage(usize),
}

#[derive(Debug, Error)]
pub enum RedirectError {
	#[error("{}: {source}", .path.display())]
	Open { path: PathBuf, #[source] source: io::Error },
	#[error("'{op}': no previous redirection of {of}")]
	NoPreviousTarget { op: &'static str, of: Stream },
	#[error("dup2 onto {stream}: {source}")]
	Dup { stream: Stream, #[source] source: nix::Error },
}

#[derive(Debug, Error)]
pub enum ExecError {
	#[error("{0}: not found")]
	NotFound(String),
	#[error("{name}: {source}")]
	Nix { name: String, #[source] source: nix::Error },
}

#[derive(Debug, Error)]
pub enum LaunchError {
	#[error("pipe: {0}")]
	Pipe(#[source] nix::Error),
	#[error("fork of stage {stage}: {source}")]
	Fork { stage: usize, #[source] source: nix::Error },
	#[error("wait: {0}")]
	Wait(#[source] nix::Error),
	#[error("restoring standard streams: {0}")]
	Restore(#[source] nix::Error),
	#[error("nul char in argument: {0}")]
	Nul(#[from] ffi::NulError),
	#[error("nothing to launch")]
	NoStages,
	#[error("stage {0} has no command")]
	EmptyCommand(usize),
}

/// Anything that abandons a line before or while it is launched.
#[derive(Debug, Error)]
pub enum Error {
	#[error(transparent)]
	Parse(#[from] ParseError),
	#[error(transparent)]
	Launch(#[from] LaunchError),
}
