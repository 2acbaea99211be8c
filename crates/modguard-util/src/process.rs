use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::errors::ModguardError;

/// Captured result of a finished child process.
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub success: bool,
    pub code: Option<i32>,
    /// Stdout followed by stderr, lossily decoded.
    pub combined: String,
}

/// Builder for constructing and executing external processes.
///
/// Used by the build oracle to drive a language toolchain inside scratch
/// directories.
#[derive(Debug, Clone)]
pub struct CommandBuilder {
    program: String,
    args: Vec<String>,
    env: BTreeMap<String, String>,
    cwd: Option<PathBuf>,
}

impl CommandBuilder {
    /// Create a new builder for the given program.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: BTreeMap::new(),
            cwd: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set environment variables for the child process, on top of the
    /// inherited environment.
    pub fn envs<'a>(mut self, vars: impl IntoIterator<Item = (&'a String, &'a String)>) -> Self {
        for (k, v) in vars {
            self.env.insert(k.clone(), v.clone());
        }
        self
    }

    pub fn cwd(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Human-readable rendering of the command line, for logs and errors.
    pub fn display(&self) -> String {
        let mut parts = vec![self.program.clone()];
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }

    /// Run the command to completion and capture its combined output.
    ///
    /// A non-zero exit is not an error here; only failing to spawn is.
    pub fn exec(&self) -> Result<ProcessOutput, ModguardError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        for (k, v) in &self.env {
            cmd.env(k, v);
        }
        if let Some(ref dir) = self.cwd {
            cmd.current_dir(dir);
        }
        tracing::debug!("Running `{}`", self.display());
        let output = cmd.output().map_err(|e| ModguardError::Oracle {
            message: format!("Failed to spawn `{}`: {e}", self.display()),
        })?;
        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));
        Ok(ProcessOutput {
            success: output.status.success(),
            code: output.status.code(),
            combined,
        })
    }

    /// Like [`CommandBuilder::exec`] but turns a non-zero exit into an error
    /// carrying the command's output.
    pub fn exec_checked(&self) -> Result<ProcessOutput, ModguardError> {
        let output = self.exec()?;
        if output.success {
            Ok(output)
        } else {
            Err(ModguardError::Oracle {
                message: format!(
                    "`{}` exited with {}\n{}",
                    self.display(),
                    output
                        .code
                        .map(|c| c.to_string())
                        .unwrap_or_else(|| "signal".to_string()),
                    output.combined.trim_end()
                ),
            })
        }
    }
}
