use std::iter::Peekable;
use std::path::PathBuf;

use crate::error::{ParseError, RedirectError};
use crate::types::*;

type ParseResult<T> = Result<T, ParseError>;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
enum Operator {
	File(Stream, RedirectType),
	Duplicate { stream: Stream, of: Stream },
	Pipe,
	Background,
}

fn match_operator(word: &str) -> Option<Operator> {
	match word {
		">" => Some(Operator::File(Stream::Stdout, RedirectType::Output)),
		">>" => Some(Operator::File(Stream::Stdout, RedirectType::Append)),
		"2>" => Some(Operator::File(Stream::Stderr, RedirectType::Output)),
		"2>>" => Some(Operator::File(Stream::Stderr, RedirectType::Append)),
		"<" => Some(Operator::File(Stream::Stdin, RedirectType::Input)),
		"2>&1" => Some(Operator::Duplicate { stream: Stream::Stderr, of: Stream::Stdout }),
		"1>&2" => Some(Operator::Duplicate { stream: Stream::Stdout, of: Stream::Stderr }),
		"|" => Some(Operator::Pipe),
		"&" => Some(Operator::Background),
		_ => None,
	}
}

fn duplicate_operator(stream: Stream) -> &'static str {
	match stream {
		Stream::Stderr => "2>&1",
		_ => "1>&2",
	}
}

/// Result of analysing one line.
#[derive(Debug)]
pub struct Analysis {
	pub pipeline: Pipeline,
	pub mode: Mode,
	/// Redirections that were dropped; the line still runs without them.
	pub redirect_errors: Vec<RedirectError>,
}

#[derive(Default)]
struct StageBuilder {
	argv: Vec<String>,
	redirects: Vec<Redirect>,
	stdout_to_file: bool,
	stderr_to_file: bool,
}

impl StageBuilder {
	fn push_file(&mut self, stream: Stream, typ: RedirectType, target: &str) {
		match stream {
			Stream::Stdout => self.stdout_to_file = true,
			Stream::Stderr => self.stderr_to_file = true,
			Stream::Stdin => {},
		}
		self.redirects.push(Redirect::File { stream: stream, target: PathBuf::from(target), typ: typ });
	}

	fn push_duplicate(&mut self, stream: Stream, of: Stream) -> Result<(), RedirectError> {
		let seen = match of {
			Stream::Stdout => self.stdout_to_file,
			Stream::Stderr => self.stderr_to_file,
			Stream::Stdin => false,
		};
		if !seen {
			return Err(RedirectError::NoPreviousTarget { op: duplicate_operator(stream), of: of });
		}
		self.redirects.push(Redirect::Duplicate { stream: stream, of: of });
		Ok(())
	}

	fn build(self, index: usize) -> ParseResult<Stage> {
		if self.argv.is_empty() {
			return Err(ParseError::EmptyStage(index));
		}
		Ok(Stage { argv: self.argv, redirects: self.redirects })
	}
}

struct Parser<I: Iterator> {
	words: Peekable<I>,
	stages: Vec<Stage>,
	current: StageBuilder,
	is_background: bool,
	redirect_errors: Vec<RedirectError>,
}

impl<'a, I: Iterator<Item = &'a str>> Parser<I> {
	fn read_target(&mut self, op: &str) -> ParseResult<&'a str> {
		match self.words.peek() {
			Some(&target) if match_operator(target).is_none() => {
				self.words.next();
				Ok(target)
			},
			_ => Err(ParseError::MissingTarget(op.to_string())),
		}
	}

	fn close_stage(&mut self) -> ParseResult<()> {
		let builder = std::mem::take(&mut self.current);
		let stage = builder.build(self.stages.len())?;
		self.stages.push(stage);
		Ok(())
	}

	fn parse_pipeline(mut self) -> ParseResult<Analysis> {
		while let Some(word) = self.words.next() {
			match match_operator(word) {
				Some(Operator::File(stream, typ)) => {
					let target = self.read_target(word)?;
					self.current.push_file(stream, typ, target);
				},
				Some(Operator::Duplicate { stream, of }) => {
					if let Err(e) = self.current.push_duplicate(stream, of) {
						self.redirect_errors.push(e);
					}
				},
				Some(Operator::Pipe) => self.close_stage()?,
				Some(Operator::Background) => self.is_background = true,
				None => self.current.argv.push(word.to_string()),
			}
		}
		self.close_stage()?;

		let mode = if self.stages.len() > 1 { Mode::Piped } else { Mode::Single };
		Ok(Analysis {
			pipeline: Pipeline { stages: self.stages, is_background: self.is_background },
			mode: mode,
			redirect_errors: self.redirect_errors,
		})
	}
}

/// Classifies `words` into pipeline stages and their redirection plans.
///
/// Nothing is opened here; each redirection is recorded on its stage and
/// applied when that stage's process is created.
pub fn analyze<S: AsRef<str>>(words: &[S]) -> ParseResult<Analysis> {
	let parser = Parser {
		words: words.iter().map(|w| w.as_ref()).peekable(),
		stages: vec![],
		current: StageBuilder::default(),
		is_background: false,
		redirect_errors: vec![],
	};
	parser.parse_pipeline()
}

#[cfg(test)]
mod tests {
	use super::*;

	fn words(line: &str) -> Vec<&str> {
		line.split_whitespace().collect()
	}

	fn file(stream: Stream, target: &str, typ: RedirectType) -> Redirect {
		Redirect::File { stream: stream, target: PathBuf::from(target), typ: typ }
	}

	#[test]
	fn plain_command_is_one_stage() {
		let a = analyze(&words("ls -l /tmp")).unwrap();
		assert_eq!(a.mode, Mode::Single);
		assert_eq!(a.pipeline.stages.len(), 1);
		assert_eq!(a.pipeline.stages[0].argv, vec!["ls", "-l", "/tmp"]);
		assert!(a.pipeline.stages[0].redirects.is_empty());
		assert!(!a.pipeline.is_background);
	}

	#[test]
	fn three_stage_pipeline() {
		let a = analyze(&words("cmd1 | cmd2 -x | cmd3")).unwrap();
		assert_eq!(a.mode, Mode::Piped);
		assert_eq!(a.pipeline.pipe_count(), 2);
		assert!(!a.pipeline.is_background);
		let names: Vec<&str> = a.pipeline.stages.iter().map(|s| s.name()).collect();
		assert_eq!(names, vec!["cmd1", "cmd2", "cmd3"]);
		assert_eq!(a.pipeline.stages[1].argv, vec!["cmd2", "-x"]);
	}

	#[test]
	fn redirections_are_not_arguments() {
		let a = analyze(&words("sort < in.txt > out.txt 2>> err.log -r")).unwrap();
		let stage = &a.pipeline.stages[0];
		assert_eq!(stage.argv, vec!["sort", "-r"]);
		assert_eq!(stage.redirects, vec![
			file(Stream::Stdin, "in.txt", RedirectType::Input),
			file(Stream::Stdout, "out.txt", RedirectType::Output),
			file(Stream::Stderr, "err.log", RedirectType::Append),
		]);
	}

	#[test]
	fn later_redirection_of_same_stream_stays_last() {
		let a = analyze(&words("echo hi > a > b")).unwrap();
		assert_eq!(a.pipeline.stages[0].redirects, vec![
			file(Stream::Stdout, "a", RedirectType::Output),
			file(Stream::Stdout, "b", RedirectType::Output),
		]);
	}

	#[test]
	fn duplicate_follows_previous_target() {
		let a = analyze(&words("make >> build.log 2>&1")).unwrap();
		assert!(a.redirect_errors.is_empty());
		assert_eq!(a.pipeline.stages[0].redirects[1], Redirect::Duplicate { stream: Stream::Stderr, of: Stream::Stdout });

		let a = analyze(&words("make 2> err 1>&2")).unwrap();
		assert!(a.redirect_errors.is_empty());
		assert_eq!(a.pipeline.stages[0].redirects[1], Redirect::Duplicate { stream: Stream::Stdout, of: Stream::Stderr });
	}

	#[test]
	fn duplicate_without_target_is_reported_and_dropped() {
		let a = analyze(&words("make 2>&1")).unwrap();
		assert!(a.pipeline.stages[0].redirects.is_empty());
		assert_eq!(a.redirect_errors.len(), 1);
		match a.redirect_errors[0] {
			RedirectError::NoPreviousTarget { op, of } => {
				assert_eq!(op, "2>&1");
				assert_eq!(of, Stream::Stdout);
			},
			ref e => panic!("unexpected error {:?}", e),
		}
	}

	#[test]
	fn duplicate_target_does_not_cross_pipe() {
		let a = analyze(&words("a > f | b 2>&1")).unwrap();
		assert_eq!(a.redirect_errors.len(), 1);
		assert!(a.pipeline.stages[1].redirects.is_empty());
	}

	#[test]
	fn missing_target() {
		assert_eq!(analyze(&words("cat <")).unwrap_err(), ParseError::MissingTarget("<".to_string()));
		assert_eq!(analyze(&words("ls > | wc")).unwrap_err(), ParseError::MissingTarget(">".to_string()));
	}

	#[test]
	fn empty_stages() {
		assert_eq!(analyze(&words("| wc")).unwrap_err(), ParseError::EmptyStage(0));
		assert_eq!(analyze(&words("ls |")).unwrap_err(), ParseError::EmptyStage(1));
		assert_eq!(analyze(&words("ls | | wc")).unwrap_err(), ParseError::EmptyStage(1));
		assert_eq!(analyze(&words("> out")).unwrap_err(), ParseError::EmptyStage(0));
		assert_eq!(analyze(&words("&")).unwrap_err(), ParseError::EmptyStage(0));
	}

	#[test]
	fn background_marker_applies_to_pipeline() {
		let a = analyze(&words("yes | head -n 1 &")).unwrap();
		assert!(a.pipeline.is_background);
		assert_eq!(a.pipeline.stages[1].argv, vec!["head", "-n", "1"]);

		let a = analyze(&words("sleep & 1")).unwrap();
		assert!(a.pipeline.is_background);
		assert_eq!(a.pipeline.stages[0].argv, vec!["sleep", "1"]);
	}
}
