use super::{CommandOutput, CommandRunner, CommandSpec};
use crate::error::InstallError;
use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;

/// Records commands instead of running them
pub struct MockCommandRunner {
    calls: Mutex<Vec<CommandSpec>>,
    failure: Option<(String, i32, String)>,
}

impl MockCommandRunner {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            failure: None,
        }
    }

    /// Every command whose program equals `program` exits with `code`
    pub fn failing_on(program: &str, code: i32, stderr: &str) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            failure: Some((program.to_string(), code, stderr.to_string())),
        }
    }

    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().unwrap().clone()
    }
}

impl Default for MockCommandRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommandRunner for MockCommandRunner {
    async fn run(
        &self,
        command: &CommandSpec,
        _timeout: Duration,
    ) -> Result<CommandOutput, InstallError> {
        self.calls.lock().unwrap().push(command.clone());

        match &self.failure {
            Some((program, code, stderr)) if *program == command.program => Ok(CommandOutput {
                status: Some(*code),
                stdout: String::new(),
                stderr: stderr.clone(),
            }),
            _ => Ok(CommandOutput {
                status: Some(0),
                stdout: String::new(),
                stderr: String::new(),
            }),
        }
    }
}
