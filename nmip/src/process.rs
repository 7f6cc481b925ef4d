use std::os::unix::process::ExitStatusExt;
use std::process::{Command, ExitStatus, Stdio};

use tracing::debug;

use crate::error::{NmipError, Result};

/// Captured outcome of a finished command.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// Exit code, or the negated signal number when the process was killed.
    pub fn code(&self) -> i32 {
        match self.status.code() {
            Some(code) => code,
            None => -self.status.signal().unwrap_or(0),
        }
    }
}

/// Run `args[0]` with the remaining arguments, blocking until it exits.
///
/// stdout and stderr are captured whatever the exit status; interpreting the
/// result is up to the caller. Only a failure to spawn is an error.
pub fn run_capture<S: AsRef<str>>(args: &[S]) -> Result<CommandOutput> {
    let args: Vec<&str> = args.iter().map(|s| s.as_ref()).collect();
    let Some((program, rest)) = args.split_first() else {
        return Err(NmipError::Spawn {
            program: String::new(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty command"),
        });
    };

    let mut cmd = build_cmd(program, rest);
    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());

    debug!(target: "nmip", "exec: {:?}", &args);
    let output = cmd.output().map_err(|source| NmipError::Spawn {
        program: program.to_string(),
        source,
    })?;

    let out = CommandOutput {
        status: output.status,
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    };
    debug!(target: "nmip", "exec: {:?} exited with {}", &args, out.code());
    Ok(out)
}

fn build_cmd(program: &str, args: &[&str]) -> Command {
    let mut cmd = Command::new(program);
    // nmcli localizes its diagnostics; callers match on the English text.
    cmd.env_remove("LANG");
    cmd.env_remove("LANGUAGE");
    cmd.env_remove("LC_CTYPE");
    cmd.env_remove("LC_NUMERIC");
    cmd.env_remove("LC_TIME");
    cmd.env_remove("LC_COLLATE");
    cmd.env_remove("LC_MONETARY");
    cmd.env_remove("LC_MESSAGES");
    cmd.env_remove("LC_ALL");
    cmd.args(args);
    cmd
}
