//! Candidate validation: build tooling and the compile-then-test gate.

pub mod build;
pub mod validator;

pub use build::{BuildTool, CommandBuildTool, CompileReport, TestRun};
pub use validator::CandidateValidator;
