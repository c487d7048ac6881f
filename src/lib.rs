//! Core of `lsh`, a line-oriented command interpreter.
//!
//! A line goes through [`token::split`], the built-in hook of [`builtin`],
//! [`parser::analyze`] and finally one of the launchers in [`eval`], which
//! fork, wire pipes, apply each stage's redirection plan in the child and
//! wait for the job.

pub mod builtin;
pub mod complete;
pub mod config;
pub mod error;
pub mod eval;
pub mod global;
pub mod job;
pub mod parser;
pub mod redirect;
pub mod search;
pub mod token;
pub mod types;
