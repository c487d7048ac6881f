use nix;
use nix::errno::Errno;
use nix::sys::wait::{self,WaitPidFlag,WaitStatus};
use nix::unistd::{self,Pid};
use tracing::{debug,info};

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy)]
pub enum State { Active, Terminated }

pub trait WaitStatusExt {
	fn state(self) -> State;
	fn code(self) -> Option<i32>;
}

impl WaitStatusExt for WaitStatus {
	fn state(self) -> State {
		match self {
			WaitStatus::Exited(..) | WaitStatus::Signaled(..) => State::Terminated,
			_ => State::Active,
		}
	}

	/// Exit code in the usual shell encoding (128 + signal for a kill).
	fn code(self) -> Option<i32> {
		match self {
			WaitStatus::Exited(_, code) => Some(code),
			WaitStatus::Signaled(_, sig, _) => Some(128 + sig as i32),
			_ => None,
		}
	}
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Process {
	pub pid: Pid,
	pub status: WaitStatus,
	/// Set when the process was reaped elsewhere; its status is unknown.
	pub lost: bool,
}

impl Process {
	pub fn state(&self) -> State {
		if self.lost { State::Terminated } else { self.status.state() }
	}

	pub fn code(&self) -> Option<i32> {
		if self.lost { None } else { self.status.code() }
	}

	fn wait(&mut self, flags: Option<WaitPidFlag>) -> nix::Result<()> {
		loop {
			match wait::waitpid(self.pid, flags) {
				Ok(status) => {
					// WNOHANG reports StillAlive; keep the previous status then
					if status != WaitStatus::StillAlive {
						self.status = status;
					}
					return Ok(());
				},
				Err(Errno::EINTR) => continue,
				// somebody else reaped it; nothing more will ever be reported
				Err(Errno::ECHILD) => {
					self.lost = true;
					return Ok(());
				},
				Err(e) => return Err(e),
			}
		}
	}
}

/// The processes forked for one pipeline, in stage order.
#[derive(Debug)]
pub struct Job {
	pub processes: Vec<Process>,
}

impl Job {
	pub fn state(&self) -> State {
		self.processes.iter().map(|pr| pr.state()).min().unwrap_or(State::Terminated)
	}

	pub fn pids(&self) -> Vec<Pid> {
		self.processes.iter().map(|pr| pr.pid).collect()
	}

	/// Status of the last stage, which is what the pipeline reports.
	pub fn code(&self) -> Option<i32> {
		self.processes.last().and_then(|pr| pr.code())
	}

	/// Blocks until every process of the job has terminated.
	pub fn wait(&mut self) -> nix::Result<()> {
		for pr in self.processes.iter_mut().filter(|pr| pr.state() == State::Active) {
			pr.wait(None)?;
			debug!(pid = pr.pid.as_raw(), status = ?pr.status, "process finished");
		}
		Ok(())
	}

	fn poll(&mut self) -> nix::Result<State> {
		for pr in self.processes.iter_mut().filter(|pr| pr.state() == State::Active) {
			pr.wait(Some(WaitPidFlag::WNOHANG))?;
		}
		Ok(self.state())
	}
}

#[derive(Debug)]
pub struct JobBuilder {
	imp: Job,
}

impl JobBuilder {
	pub fn new(size_hint: usize) -> JobBuilder {
		JobBuilder {
			imp: Job { processes: Vec::with_capacity(size_hint) }
		}
	}

	/// Forks and records the child in the job.
	///
	/// The child side must end in `exec` or `_exit`; it shares every
	/// descriptor and the address space snapshot of the interpreter.
	pub fn push_fork(&mut self) -> nix::Result<unistd::ForkResult> {
		let r = unsafe { unistd::fork() }?;
		if let unistd::ForkResult::Parent { child } = r {
			self.imp.processes.push(Process { pid: child, status: WaitStatus::StillAlive, lost: false });
		}
		Ok(r)
	}

	pub fn is_empty(&self) -> bool {
		self.imp.processes.is_empty()
	}

	pub fn build(self) -> Job {
		self.imp
	}
}

/// Background jobs that have not been seen to finish yet.
#[derive(Debug, Default)]
pub struct JobSet {
	jobs: Vec<Option<Job>>,
}

impl JobSet {
	pub fn new() -> JobSet {
		JobSet::default()
	}

	/// Stores `job` in the first free slot and returns its number (from 1).
	pub fn push(&mut self, job: Job) -> usize {
		let jobs = &mut self.jobs;
		if let Some((i, space)) = jobs.iter_mut().enumerate().find(|&(_, ref o)| o.is_none()) {
			*space = Some(job);
			i + 1
		} else {
			jobs.push(Some(job));
			jobs.len()
		}
	}

	pub fn len(&self) -> usize {
		self.jobs.iter().filter(|o| o.is_some()).count()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Collects finished jobs without blocking.
	pub fn reap(&mut self) -> Vec<(usize, Job)> {
		let mut done = vec![];
		for (i, slot) in self.jobs.iter_mut().enumerate() {
			let finished = match *slot {
				Some(ref mut job) => match job.poll() {
					Ok(state) => state == State::Terminated,
					Err(e) => {
						debug!(job = i + 1, error = %e, "polling background job failed");
						false
					},
				},
				None => false,
			};
			if finished {
				if let Some(job) = slot.take() {
					info!(job = i + 1, code = ?job.code(), "background job done");
					done.push((i + 1, job));
				}
			}
		}
		let len = self.jobs.iter().rposition(|o| o.is_some()).map_or(0, |i| i + 1);
		self.jobs.truncate(len);
		done
	}
}
