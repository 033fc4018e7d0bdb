//! External disassembler process.
//!
//! The request is written to the command's stdin and the whole of stdout is
//! the response. The command runs through `sh -c`, so it may carry flags.

use std::env;
use std::io::{ErrorKind, Write};
use std::process::{Command, Stdio};
use std::thread;

use pipeview_core::{Disassembler, TraceError};
use tracing::debug;

/// Disassembler used when `--dasm` is not given and `$RISCV` is unset.
pub const FALLBACK_COMMAND: &str = "spike-dasm --isa=rv64gcv";

/// Default disassembler command: `$RISCV/bin/spike-dasm --isa=rv64gcv`, or
/// [`FALLBACK_COMMAND`] from `PATH` when `RISCV` is unset.
#[must_use]
pub fn default_command() -> String {
    env::var("RISCV").map_or_else(
        |_| FALLBACK_COMMAND.to_string(),
        |root| format!("{}/bin/{FALLBACK_COMMAND}", root.trim_end_matches('/')),
    )
}

/// Runs a shell command once per batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpikeDasm {
    command: String,
}

impl SpikeDasm {
    /// Wraps a shell command line.
    #[must_use]
    pub const fn new(command: String) -> Self {
        Self { command }
    }

    /// Command line that will be run.
    #[must_use]
    pub fn command(&self) -> &str {
        &self.command
    }
}

fn failure(command: &str, what: impl std::fmt::Display) -> TraceError {
    TraceError::Disassembler(format!("`{command}`: {what}"))
}

impl Disassembler for SpikeDasm {
    fn disassemble(&mut self, request: &str) -> Result<String, TraceError> {
        debug!(command = %self.command, bytes = request.len(), "running disassembler");

        let mut child = Command::new("sh")
            .arg("-c")
            .arg(&self.command)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| failure(&self.command, e))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| failure(&self.command, "stdin unavailable"))?;
        let payload = request.as_bytes().to_vec();
        // Fed from a separate thread while stdout drains.
        let writer = thread::spawn(move || stdin.write_all(&payload));

        let output = child
            .wait_with_output()
            .map_err(|e| failure(&self.command, e))?;
        let written = writer
            .join()
            .map_err(|_| failure(&self.command, "stdin writer panicked"))?;

        if !output.status.success() {
            return Err(failure(&self.command, output.status));
        }
        // A command may answer without consuming its whole request.
        if let Err(e) = written {
            if e.kind() != ErrorKind::BrokenPipe {
                return Err(failure(&self.command, e));
            }
        }

        String::from_utf8(output.stdout).map_err(|e| failure(&self.command, e))
    }
}
