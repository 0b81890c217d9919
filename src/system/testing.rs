// src/system/testing.rs
//
// Test double for `ProcessRunner`.

use super::executor::{ExecutionError, Invocation, ProcessRunner, RunFuture};
use std::collections::HashMap;
use std::sync::Mutex;

/// Records every invocation instead of spawning it.
///
/// Captures are answered from a table keyed by program name, and programs listed in
/// `failing` report a non-zero exit.
#[derive(Debug, Default)]
pub(crate) struct RecordingRunner {
    invocations: Mutex<Vec<Invocation>>,
    background: Mutex<Vec<Invocation>>,
    captures: HashMap<String, String>,
    failing: Vec<String>,
}

impl RecordingRunner {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Answers `capture` calls for `program` with `output`.
    pub(crate) fn with_capture(mut self, program: &str, output: &str) -> Self {
        self.captures.insert(program.to_string(), output.to_string());
        self
    }

    /// Makes every invocation of `program` fail.
    pub(crate) fn failing(mut self, program: &str) -> Self {
        self.failing.push(program.to_string());
        self
    }

    pub(crate) fn invocations(&self) -> Vec<Invocation> {
        self.invocations.lock().unwrap().clone()
    }

    pub(crate) fn background(&self) -> Vec<Invocation> {
        self.background.lock().unwrap().clone()
    }

    /// Invocations rendered as command lines, in call order.
    pub(crate) fn command_lines(&self) -> Vec<String> {
        self.invocations()
            .iter()
            .map(Invocation::command_line)
            .collect()
    }

    fn record(&self, invocation: &Invocation) -> Result<(), ExecutionError> {
        self.invocations.lock().unwrap().push(invocation.clone());
        if self.failing.contains(&invocation.program) {
            return Err(ExecutionError::NonZeroExitStatus {
                command: invocation.command_line(),
                status: "code 1".to_string(),
            });
        }
        Ok(())
    }
}

impl ProcessRunner for RecordingRunner {
    fn run<'a>(&'a self, invocation: &'a Invocation) -> RunFuture<'a, ()> {
        Box::pin(async move { self.record(invocation) })
    }

    fn capture<'a>(&'a self, invocation: &'a Invocation) -> RunFuture<'a, String> {
        Box::pin(async move {
            self.record(invocation)?;
            Ok(self
                .captures
                .get(&invocation.program)
                .cloned()
                .unwrap_or_default())
        })
    }

    fn spawn_background(&self, invocation: &Invocation) -> Result<(), ExecutionError> {
        self.background.lock().unwrap().push(invocation.clone());
        Ok(())
    }

    fn shutdown(&self) -> RunFuture<'_, ()> {
        Box::pin(async move {
            self.background.lock().unwrap().clear();
            Ok(())
        })
    }
}
