use std::convert::Infallible;
use std::env;
use std::ffi::{CString,NulError,OsStr};
use std::path::PathBuf;

use nix;
use nix::unistd;

const PATH_KEY: &str = "PATH";

/// Directories probed in order when a program name has no slash.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchPath {
	dirs: Vec<PathBuf>,
}

impl SearchPath {
	pub fn new<I, P>(dirs: I) -> SearchPath where I: IntoIterator<Item = P>, P: Into<PathBuf> {
		SearchPath { dirs: dirs.into_iter().map(Into::into).collect() }
	}

	/// Reads `PATH` once; empty entries are skipped.
	pub fn from_env() -> SearchPath {
		match env::var_os(PATH_KEY) {
			Some(path) => SearchPath::parse(&path),
			None => SearchPath::default(),
		}
	}

	pub fn parse(path: &OsStr) -> SearchPath {
		SearchPath::new(env::split_paths(path).filter(|p| !p.as_os_str().is_empty()))
	}

	pub fn dirs(&self) -> &[PathBuf] {
		&self.dirs
	}

	/// Every path worth handing to `execv` for `name`, in probing order.
	pub fn candidates(&self, name: &str) -> Result<Vec<CString>, NulError> {
		use std::os::unix::ffi::OsStringExt;

		if name.contains('/') {
			return Ok(vec![CString::new(name)?]);
		}
		self.dirs.iter()
			.map(|dir| CString::new(dir.join(name).into_os_string().into_vec()))
			.collect()
	}
}

/// Replaces the current process with the first candidate that `execv`
/// accepts. Only returns when all of them failed, with the first failure
/// other than `ENOENT`, or `ENOENT` itself.
pub fn exec(candidates: &[CString], argv: &[CString]) -> nix::Error {
	let mut last = nix::Error::ENOENT;
	for path in candidates {
		let r: nix::Result<Infallible> = unistd::execv(path, argv);
		match r {
			Err(e) if last == nix::Error::ENOENT => last = e,
			_ => {},
		}
	}
	last
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::ffi::OsString;

	#[test]
	fn parse_skips_empty_entries() {
		let sp = SearchPath::parse(&OsString::from("/usr/local/bin::/usr/bin:"));
		assert_eq!(sp.dirs(), &[PathBuf::from("/usr/local/bin"), PathBuf::from("/usr/bin")]);
	}

	#[test]
	fn candidates_follow_directory_order() {
		let sp = SearchPath::new(vec!["/opt/bin", "/bin"]);
		let c = sp.candidates("ls").unwrap();
		assert_eq!(c, vec![CString::new("/opt/bin/ls").unwrap(), CString::new("/bin/ls").unwrap()]);
	}

	#[test]
	fn names_with_slash_are_used_verbatim() {
		let sp = SearchPath::new(vec!["/bin"]);
		assert_eq!(sp.candidates("./run.sh").unwrap(), vec![CString::new("./run.sh").unwrap()]);
	}

	#[test]
	fn nothing_to_try() {
		let sp = SearchPath::default();
		assert!(sp.candidates("ls").unwrap().is_empty());
		let argv = vec![CString::new("ls").unwrap()];
		assert_eq!(exec(&[], &argv), nix::Error::ENOENT);
	}
}
