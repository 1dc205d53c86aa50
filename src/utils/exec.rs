//! External command execution utilities.
//!
//! Provides a Builder-based API for running external programs with proper
//! output handling and stdin piping.
//!
//! # Examples
//!
//! ```ignore
//! use crate::utils::exec::Cmd;
//!
//! // Simple command
//! Cmd::new("convert").arg(input).args(["-negate"]).arg(output).run()?;
//!
//! // With stdin piping
//! let output = Cmd::new("convert")
//!     .args(["-", "png:-"])
//!     .stdin(jpeg_bytes)
//!     .run()?;
//! ```

use crate::debug;
use anyhow::{Context, Result};
use std::{
    ffi::{OsStr, OsString},
    io::Write,
    process::{Command, Output, Stdio},
};

// ============================================================================
// Builder API
// ============================================================================

/// Command builder for external process execution.
#[derive(Default)]
pub struct Cmd {
    program: OsString,
    args: Vec<OsString>,
    stdin_data: Option<Vec<u8>>,
}

impl Cmd {
    /// Create a new command builder.
    pub fn new<S: AsRef<OsStr>>(program: S) -> Self {
        Self {
            program: program.as_ref().to_owned(),
            ..Default::default()
        }
    }

    /// Add a single argument.
    pub fn arg<S: AsRef<OsStr>>(mut self, arg: S) -> Self {
        let arg = arg.as_ref();
        if !arg.is_empty() {
            self.args.push(arg.to_owned());
        }
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        for arg in args {
            let arg = arg.as_ref();
            if !arg.is_empty() {
                self.args.push(arg.to_owned());
            }
        }
        self
    }

    /// Set stdin data to pipe to the process.
    pub fn stdin<D: AsRef<[u8]>>(mut self, data: D) -> Self {
        self.stdin_data = Some(data.as_ref().to_vec());
        self
    }

    /// Execute the command and return output.
    ///
    /// A non-zero exit status is an error carrying the program's stderr.
    pub fn run(self) -> Result<Output> {
        match self.stdin_data {
            Some(_) => self.run_with_stdin(),
            None => self.run_simple(),
        }
    }

    /// Get the program name for error messages.
    fn program_name(&self) -> String {
        self.program.to_string_lossy().to_string()
    }

    /// Render the full command line for debug logging.
    fn command_line(&self) -> String {
        std::iter::once(&self.program)
            .chain(&self.args)
            .map(|s| s.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Simple execution without stdin.
    fn run_simple(self) -> Result<Output> {
        let name = self.program_name();
        debug!("exec"; "{}", self.command_line());

        let output = Command::new(&self.program)
            .args(&self.args)
            .output()
            .with_context(|| format!("Failed to execute `{name}`"))?;

        check_status(&name, &output)?;
        Ok(output)
    }

    /// Execution with stdin piping.
    fn run_with_stdin(self) -> Result<Output> {
        let name = self.program_name();
        debug!("exec"; "{}", self.command_line());
        let stdin_data = self.stdin_data.unwrap_or_default();

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("Failed to spawn `{name}`"))?;

        // Closing stdin before waiting lets a child that stopped reading exit.
        let write_result = child
            .stdin
            .take()
            .map_or(Ok(()), |mut stdin| stdin.write_all(&stdin_data));

        let output = child
            .wait_with_output()
            .with_context(|| format!("Failed to wait for `{name}`"))?;

        if let Err(err) = write_result {
            check_status(&name, &output)?;
            return Err(err).with_context(|| format!("Failed to write stdin to `{name}`"));
        }

        check_status(&name, &output)?;
        Ok(output)
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Return an error for a failed command, logging stderr noise otherwise.
fn check_status(name: &str, output: &Output) -> Result<()> {
    if !output.status.success() {
        anyhow::bail!(format_error(name, output));
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    let stderr = stderr.trim();
    if !stderr.is_empty() {
        debug!(name; "{stderr}");
    }
    Ok(())
}

/// Format error message for failed command.
fn format_error(name: &str, output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let mut msg = format!("Command `{name}` failed with {}", output.status);

    let stderr = stderr.trim();
    if !stderr.is_empty() {
        msg.push('\n');
        msg.push_str(stderr);
    }
    msg
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cmd_builder() {
        let cmd = Cmd::new("convert").arg("in.png").args(["-negate", "out.png"]);

        assert_eq!(cmd.program, OsString::from("convert"));
        assert_eq!(cmd.args.len(), 3);
        assert_eq!(cmd.command_line(), "convert in.png -negate out.png");
    }

    #[cfg(unix)]
    #[test]
    fn test_unread_stdin_is_reaped() {
        // `true` exits without reading, so the write hits a closed pipe
        let err = Cmd::new("true")
            .stdin(vec![0u8; 4 * 1024 * 1024])
            .run()
            .unwrap_err();
        assert!(err.to_string().contains("Failed to write stdin to `true`"));
    }

    #[cfg(unix)]
    #[test]
    fn test_early_exit_reports_status() {
        let err = Cmd::new("sh")
            .args(["-c", "exit 3"])
            .stdin(vec![0u8; 4 * 1024 * 1024])
            .run()
            .unwrap_err();
        assert!(err.to_string().contains("Command `sh` failed"));
    }

    #[test]
    fn test_empty_args_filtered() {
        let cmd = Cmd::new("echo").arg("").args(["a", "", "b"]);
        assert_eq!(cmd.args.len(), 2);
    }

    #[cfg(unix)]
    #[test]
    fn test_simple_command() {
        let output = Cmd::new("echo").arg("hello").run().unwrap();
        assert!(output.status.success());
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("hello"));
    }

    #[cfg(unix)]
    #[test]
    fn test_stdin_pipe() {
        let output = Cmd::new("cat").stdin(b"test data").run().unwrap();
        assert_eq!(output.stdout, b"test data");
    }

    #[cfg(unix)]
    #[test]
    fn test_failed_command_is_error() {
        let err = Cmd::new("sh").args(["-c", "echo boom >&2; exit 3"]).run().unwrap_err();
        let msg = format!("{err}");
        assert!(msg.contains("`sh` failed"));
        assert!(msg.contains("boom"));
    }

    #[test]
    fn test_missing_program_is_error() {
        let err = Cmd::new("assetwarp-no-such-program").run().unwrap_err();
        assert!(format!("{err}").contains("Failed to execute"));
    }
}
