use std::collections::HashMap;
use std::process::{Command, Output, Stdio};

use crate::errors::MvnGetError;

/// Builder for constructing and executing external processes.
///
/// Used to drive helper programs such as `gpg`.
pub struct CommandBuilder {
    program: String,
    args: Vec<String>,
    env: HashMap<String, String>,
}

impl CommandBuilder {
    /// Create a new builder for the given program.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: HashMap::new(),
        }
    }

    /// Append a single argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append multiple arguments.
    pub fn args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set an environment variable for the child process.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Execute the command with stdin closed and return its output.
    pub fn exec(&self) -> Result<Output, MvnGetError> {
        tracing::trace!("exec {} {}", self.program, self.args.join(" "));
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).stdin(Stdio::null());
        for (k, v) in &self.env {
            cmd.env(k, v);
        }
        cmd.output().map_err(MvnGetError::from)
    }

    /// Execute the command and return its stdout, whatever the exit status.
    ///
    /// Tools like `gpg --status-fd 1` report their verdict on stdout and use
    /// the exit status only as a coarse summary.
    pub fn exec_stdout(&self) -> Result<String, MvnGetError> {
        let output = self.exec()?;
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

/// Whether `program` can be started at all (probed with `--version`).
pub fn is_available(program: &str) -> bool {
    CommandBuilder::new(program)
        .arg("--version")
        .exec()
        .map(|o| o.status.success())
        .unwrap_or(false)
}
