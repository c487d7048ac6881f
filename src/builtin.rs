use std::{env,io};
use std::io::Write;
use std::path::PathBuf;

/// What the interpreter should do with a line after built-in interception.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Dispatch {
	/// Not a built-in; analyse and launch the line.
	External,
	/// Fully handled; nothing is launched.
	Handled,
	/// Launch these words instead of the line.
	Rewrite(Vec<String>),
	/// Leave the interpreter with this status.
	Exit(i32),
}

pub trait Builtins {
	fn dispatch(&mut self, words: &[&str]) -> Dispatch;
}

/// Treats every line as external.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoBuiltins;

impl Builtins for NoBuiltins {
	fn dispatch(&mut self, _: &[&str]) -> Dispatch {
		Dispatch::External
	}
}

pub const BUILTIN_NAMES: [&str; 4] = ["exit", "cd", "moncd", "man2"];

const HOME_KEY: &str = "HOME";
const HOME_FALLBACK: &str = "/tmp";

/// `exit`, `cd` (also answering to `moncd`) and `man2`.
#[derive(Debug, Clone)]
pub struct Standard {
	/// Where `man2` finds `<builtin>.gz` pages.
	pub doc_dir: PathBuf,
}

fn complain(msg: std::fmt::Arguments) {
	let _ = writeln!(&mut io::stderr(), "lsh: {}", msg);
}

fn builtin_exit(_: &Standard, args: &[&str]) -> Dispatch {
	match args {
		[] => Dispatch::Exit(0),
		[code] => match code.parse() {
			Ok(code) => Dispatch::Exit(code),
			Err(_) => {
				complain(format_args!("exit: {}: numeric argument required", code));
				Dispatch::Handled
			},
		},
		_ => {
			complain(format_args!("usage: exit [code]"));
			Dispatch::Handled
		},
	}
}

fn builtin_cd(_: &Standard, args: &[&str]) -> Dispatch {
	let dir = match args {
		[] => env::var_os(HOME_KEY).map_or_else(|| PathBuf::from(HOME_FALLBACK), PathBuf::from),
		[dir] => PathBuf::from(*dir),
		_ => {
			complain(format_args!("usage: cd [dir]"));
			return Dispatch::Handled;
		},
	};
	if let Err(e) = env::set_current_dir(&dir) {
		complain(format_args!("cd: {}: {}", dir.display(), e));
	}
	Dispatch::Handled
}

fn builtin_man2(this: &Standard, args: &[&str]) -> Dispatch {
	match args {
		[name] if BUILTIN_NAMES.contains(name) => {
			let page = this.doc_dir.join(format!("{}.gz", name));
			Dispatch::Rewrite(vec!["man".to_string(), page.to_string_lossy().into_owned()])
		},
		[name] => {
			complain(format_args!("man2: no page for {}", name));
			Dispatch::Handled
		},
		_ => {
			complain(format_args!("usage: man2 <builtin>"));
			Dispatch::Handled
		},
	}
}

pub fn match_builtin(name: &str) -> Option<fn(&Standard, &[&str]) -> Dispatch> {
	match name {
		"exit" => Some(builtin_exit),
		"cd" | "moncd" => Some(builtin_cd),
		"man2" => Some(builtin_man2),
		_ => None,
	}
}

impl Builtins for Standard {
	fn dispatch(&mut self, words: &[&str]) -> Dispatch {
		match words.split_first() {
			Some((name, args)) => match match_builtin(name) {
				Some(builtin) => builtin(self, args),
				None => Dispatch::External,
			},
			None => Dispatch::External,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn standard() -> Standard {
		Standard { doc_dir: PathBuf::from("/usr/share/lsh") }
	}

	#[test]
	fn external_commands_pass_through() {
		assert_eq!(standard().dispatch(&["ls", "-l"]), Dispatch::External);
		assert_eq!(NoBuiltins.dispatch(&["exit"]), Dispatch::External);
	}

	#[test]
	fn exit_status() {
		assert_eq!(standard().dispatch(&["exit"]), Dispatch::Exit(0));
		assert_eq!(standard().dispatch(&["exit", "3"]), Dispatch::Exit(3));
		assert_eq!(standard().dispatch(&["exit", "x"]), Dispatch::Handled);
	}

	#[test]
	fn cd_rejects_extra_arguments() {
		let cwd = env::current_dir().unwrap();
		assert_eq!(standard().dispatch(&["cd", "/", "/tmp"]), Dispatch::Handled);
		assert_eq!(standard().dispatch(&["moncd", "/", "/tmp"]), Dispatch::Handled);
		assert_eq!(env::current_dir().unwrap(), cwd);
	}

	#[test]
	fn man2_points_at_doc_page() {
		assert_eq!(standard().dispatch(&["man2", "cd"]),
		           Dispatch::Rewrite(vec!["man".to_string(), "/usr/share/lsh/cd.gz".to_string()]));
		assert_eq!(standard().dispatch(&["man2", "moncd"]),
		           Dispatch::Rewrite(vec!["man".to_string(), "/usr/share/lsh/moncd.gz".to_string()]));
		assert_eq!(standard().dispatch(&["man2", "ls"]), Dispatch::Handled);
		assert_eq!(standard().dispatch(&["man2"]), Dispatch::Handled);
	}
}
