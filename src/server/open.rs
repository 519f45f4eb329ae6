// src/server/open.rs

use std::process::Stdio;

use tokio::process::Command;
use tracing::debug;

use crate::errors::Result;

fn opener() -> Command {
    if cfg!(target_os = "macos") {
        Command::new("open")
    } else if cfg!(target_os = "windows") {
        let mut cmd = Command::new("cmd");
        cmd.args(["/C", "start", ""]);
        cmd
    } else {
        Command::new("xdg-open")
    }
}

/// Launch the platform browser on `url` without waiting for it.
pub fn open_browser(url: &str) -> Result<()> {
    let mut cmd = opener();
    cmd.arg(url)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    let child = cmd.spawn()?;
    debug!(url, pid = ?child.id(), "browser opener launched");
    Ok(())
}
