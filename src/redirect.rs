use std::fs;
use std::os::unix::io::{AsRawFd,FromRawFd,IntoRawFd,OwnedFd,RawFd};

use libc;
use nix;
use nix::fcntl::{self,FcntlArg};
use nix::unistd;

use crate::error::RedirectError;
use crate::types::{Redirect,RedirectType,Stream};

const SAVED_FD_MIN: RawFd = 10;

/// Installs one step of a redirection plan on the current process.
///
/// Meant for a freshly forked child; the interpreter's own descriptors are
/// only ever touched by [`SavedStdio::restore`].
pub fn apply(redirect: &Redirect) -> Result<(), RedirectError> {
	match *redirect {
		Redirect::File { stream, ref target, typ } => {
			let mut oopt = fs::OpenOptions::new();
			let _ = match typ {
				RedirectType::Input => oopt.read(true),
				RedirectType::Output => oopt.write(true).create(true).truncate(true),
				RedirectType::Append => oopt.append(true).create(true),
			};
			let file = oopt.open(target).map_err(|e| RedirectError::Open { path: target.clone(), source: e })?;
			let fd = file.into_raw_fd();
			// the stream was closed and open() handed its number back
			if fd == stream.fd() {
				return Ok(());
			}
			let r = unistd::dup2(fd, stream.fd());
			let _ = unistd::close(fd);
			r.map_err(|e| RedirectError::Dup { stream: stream, source: e })?;
		},
		Redirect::Duplicate { stream, of } => {
			unistd::dup2(of.fd(), stream.fd()).map_err(|e| RedirectError::Dup { stream: stream, source: e })?;
		},
	}
	Ok(())
}

/// Close-on-exec copies of the interpreter's standard streams, taken once at
/// startup.
#[derive(Debug)]
pub struct SavedStdio {
	saved: [OwnedFd; 3],
}

impl SavedStdio {
	pub fn capture() -> nix::Result<SavedStdio> {
		let dup = |fd: RawFd| -> nix::Result<OwnedFd> {
			let copy = fcntl::fcntl(fd, FcntlArg::F_DUPFD_CLOEXEC(SAVED_FD_MIN))?;
			Ok(unsafe { OwnedFd::from_raw_fd(copy) })
		};
		Ok(SavedStdio {
			saved: [dup(libc::STDIN_FILENO)?, dup(libc::STDOUT_FILENO)?, dup(libc::STDERR_FILENO)?],
		})
	}

	pub fn restore(&self) -> nix::Result<()> {
		for (stream, saved) in [Stream::Stdin, Stream::Stdout, Stream::Stderr].iter().zip(self.saved.iter()) {
			unistd::dup2(saved.as_raw_fd(), stream.fd())?;
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::path::PathBuf;
	use nix::sys::wait::{self,WaitStatus};
	use tempfile::TempDir;

	#[test]
	fn redirect_onto_closed_stream_stays_open() {
		let dir = TempDir::new().unwrap();
		let input: PathBuf = dir.path().join("in.txt");
		fs::write(&input, "x").unwrap();
		let redirect = Redirect::File { stream: Stream::Stdin, target: input, typ: RedirectType::Input };

		match unsafe { unistd::fork() }.unwrap() {
			unistd::ForkResult::Child => {
				let _ = unistd::close(libc::STDIN_FILENO);
				let applied = apply(&redirect).is_ok();
				let mut buf = [0u8; 4];
				let code = match unistd::read(libc::STDIN_FILENO, &mut buf) {
					Ok(1) if applied && buf[0] == b'x' => 0,
					_ => 1,
				};
				unsafe { libc::_exit(code) }
			},
			unistd::ForkResult::Parent { child } => {
				assert_eq!(wait::waitpid(child, None).unwrap(), WaitStatus::Exited(child, 0));
			},
		}
	}
}
