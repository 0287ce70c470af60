//! Hands map and article links to the desktop's URL opener.

use std::io;
use std::process::{Command, ExitStatus, Stdio};
use std::thread;
use tracing::{info, warn};

fn opener_command(url: &str) -> Command {
    let mut cmd = if cfg!(target_os = "macos") {
        Command::new("open")
    } else if cfg!(target_os = "windows") {
        let mut c = Command::new("cmd");
        c.args(["/C", "start", ""]);
        c
    } else {
        Command::new("xdg-open")
    };
    cmd.arg(url);
    cmd
}

/// Launches the opener and returns without waiting for it.
///
/// Its output is discarded so it cannot scribble over the TUI.
pub fn open_in_browser(url: &str) -> io::Result<thread::JoinHandle<Option<ExitStatus>>> {
    info!("Opening {}", url);
    let mut cmd = opener_command(url);
    cmd.stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    spawn_detached(cmd)
}

/// Spawns `cmd` and waits on it from a detached thread so the finished
/// child is reaped instead of lingering as a zombie.
fn spawn_detached(mut cmd: Command) -> io::Result<thread::JoinHandle<Option<ExitStatus>>> {
    let mut child = cmd.spawn()?;
    Ok(thread::spawn(move || match child.wait() {
        Ok(status) => {
            if !status.success() {
                warn!("URL opener exited with {}", status);
            }
            Some(status)
        }
        Err(e) => {
            warn!("Could not wait on URL opener: {}", e);
            None
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_is_last_argument() {
        let url = "https://en.wikipedia.org/?curid=1";
        let cmd = opener_command(url);
        let last = cmd.get_args().last().and_then(|a| a.to_str());
        assert_eq!(last, Some(url));
    }

    #[cfg(unix)]
    #[test]
    fn detached_child_is_waited_on() {
        let handle = spawn_detached(Command::new("true")).unwrap();
        let status = handle.join().unwrap();
        assert!(status.map(|s| s.success()).unwrap_or(false));
    }

    #[cfg(unix)]
    #[test]
    fn failing_opener_still_reaped() {
        let handle = spawn_detached(Command::new("false")).unwrap();
        let status = handle.join().unwrap();
        assert_eq!(status.map(|s| s.success()), Some(false));
    }
}
