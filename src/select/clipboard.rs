//! Platform clipboard through whichever copy tool is installed

use std::io::Write;
use std::process::{Command, Stdio};

/// Copy tools in order of preference, with the arguments that make them read stdin.
const COPY_TOOLS: &[(&str, &[&str])] = &[
    ("pbcopy", &[]),
    ("wl-copy", &[]),
    ("xclip", &["-selection", "clipboard"]),
    ("xsel", &["--clipboard", "--input"]),
];

/// Copy `text`. Failures are logged and otherwise ignored.
pub fn copy(text: &str) {
    let Some((program, args)) = COPY_TOOLS
        .iter()
        .find_map(|(name, args)| which::which(name).ok().map(|path| (path, *args)))
    else {
        log::debug!("no clipboard tool found");
        return;
    };

    let child = Command::new(&program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn();
    let mut child = match child {
        Ok(child) => child,
        Err(e) => {
            log::debug!("cannot run {}: {}", program.display(), e);
            return;
        }
    };
    if let Some(mut stdin) = child.stdin.take()
        && let Err(e) = stdin.write_all(text.as_bytes())
    {
        log::debug!("clipboard write failed: {}", e);
    }
    if let Err(e) = child.wait() {
        log::debug!("clipboard tool failed: {}", e);
    }
}
