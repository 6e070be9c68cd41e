//! Platform shell policy
//!
//! Translates an [`ExecutionRequest`] into the concrete argument vector to
//! spawn. Pure and stateless, so concurrent calls need no coordination.

use crate::request::ExecutionRequest;

/// Fallback POSIX shell when $SHELL is unset
const DEFAULT_SHELL: &str = "/bin/bash";

/// Build the spawn vector for a request.
///
/// On the Windows family the command line is handed to powershell whether
/// or not a PTY was requested. On POSIX hosts a PTY request goes through
/// `script`, which allocates a terminal for the command; otherwise the
/// login shell runs the line.
pub fn build_command(request: &ExecutionRequest) -> Vec<String> {
    let line = command_line(request);

    if cfg!(windows) {
        vec![
            "powershell.exe".to_string(),
            "-NoProfile".to_string(),
            "-Command".to_string(),
            line,
        ]
    } else if request.pty {
        vec![
            "script".to_string(),
            "-qec".to_string(),
            line,
            "/dev/null".to_string(),
        ]
    } else {
        vec![login_shell(), "-c".to_string(), line]
    }
}

/// Join command and arguments into one shell line. The command itself may
/// carry shell syntax and is left untouched; only the arguments are quoted.
pub(crate) fn command_line(request: &ExecutionRequest) -> String {
    if request.args.is_empty() {
        return request.command.clone();
    }

    let joined = if cfg!(windows) {
        request.args.join(" ")
    } else {
        shlex::try_join(request.args.iter().map(String::as_str))
            .unwrap_or_else(|_| request.args.join(" "))
    };

    format!("{} {}", request.command, joined)
}

fn login_shell() -> String {
    std::env::var("SHELL").unwrap_or_else(|_| DEFAULT_SHELL.to_string())
}
