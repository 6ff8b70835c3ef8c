//! Copy text to the system clipboard through the platform's clipboard tool

use std::io::Write;
use std::process::{Command, Stdio};

use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("clipboard is not supported on {0}")]
    UnsupportedPlatform(&'static str),

    #[error("no clipboard tool available (tried: {0})")]
    NoToolAvailable(String),

    #[error("clipboard tool '{tool}' failed: {reason}")]
    ToolFailed { tool: &'static str, reason: String },
}

/// A clipboard command that reads the text from stdin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tool {
    pub program: &'static str,
    pub args: &'static [&'static str],
}

const PBCOPY: Tool = Tool { program: "pbcopy", args: &[] };
const CLIP: Tool = Tool { program: "clip", args: &[] };
const WL_COPY: Tool = Tool { program: "wl-copy", args: &[] };
const XCLIP: Tool = Tool { program: "xclip", args: &["-selection", "clipboard"] };
const XSEL: Tool = Tool { program: "xsel", args: &["--clipboard", "--input"] };

/// Candidate tools for `os`, in preference order
pub fn tools_for(os: &'static str) -> Result<&'static [Tool], ClipboardError> {
    match os {
        "macos" => Ok(&[PBCOPY]),
        "windows" => Ok(&[CLIP]),
        "linux" | "freebsd" | "openbsd" | "netbsd" => Ok(&[WL_COPY, XCLIP, XSEL]),
        other => Err(ClipboardError::UnsupportedPlatform(other)),
    }
}

/// Copy `text` using the first tool that is installed
pub fn copy(text: &str) -> Result<(), ClipboardError> {
    let tools = tools_for(std::env::consts::OS)?;
    copy_with(tools, text)
}

fn copy_with(tools: &[Tool], text: &str) -> Result<(), ClipboardError> {
    for tool in tools {
        match run_tool(tool, text) {
            Ok(()) => {
                debug!(tool = tool.program, "Copied to clipboard");
                return Ok(());
            }
            // Not installed: try the next one
            Err(None) => continue,
            Err(Some(reason)) => {
                return Err(ClipboardError::ToolFailed {
                    tool: tool.program,
                    reason,
                });
            }
        }
    }

    let tried: Vec<&str> = tools.iter().map(|t| t.program).collect();
    Err(ClipboardError::NoToolAvailable(tried.join(", ")))
}

/// `Err(None)` when the program does not exist.
///
/// Only the tool's exit status is awaited. Tools like `xclip` fork a child
/// that keeps owning the selection, so its output pipes would never close.
fn run_tool(tool: &Tool, text: &str) -> Result<(), Option<String>> {
    let mut child = match Command::new(tool.program)
        .args(tool.args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
    {
        Ok(child) => child,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(None),
        Err(e) => return Err(Some(e.to_string())),
    };

    // Dropping stdin closes it so the tool sees EOF
    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(text.as_bytes())
            .map_err(|e| Some(e.to_string()))?;
    }

    let status = child.wait().map_err(|e| Some(e.to_string()))?;
    if status.success() {
        Ok(())
    } else {
        Err(Some(status.to_string()))
    }
}
