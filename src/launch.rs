use std::io::Write;
use std::process::{Command, Stdio};

/// Clipboard helpers tried in order.
const CLIPBOARD_PROGRAMS: [(&str, &[&str]); 2] = [
    ("xclip", &["-selection", "clipboard"]),
    ("wl-copy", &[]),
];

/// Copy `text` through the first clipboard helper that starts.
/// Returns false when none is installed.
pub fn copy_to_clipboard(text: &str) -> bool {
    for (program, args) in CLIPBOARD_PROGRAMS {
        if let Ok(mut child) = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
        {
            if let Some(mut stdin) = child.stdin.take() {
                let _ = stdin.write_all(text.as_bytes());
            }
            let _ = child.wait();
            return true;
        }
    }
    false
}

fn opener() -> &'static str {
    if cfg!(target_os = "macos") {
        "open"
    } else if cfg!(target_os = "windows") {
        "explorer"
    } else {
        "xdg-open"
    }
}

/// Hand `target` to the desktop opener, detached from the terminal. The
/// child is left to the tokio runtime, which reaps it once it exits.
pub fn open_external(target: &str) -> std::io::Result<()> {
    tokio::process::Command::new(opener())
        .arg(target)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map(|_child| ())
}
