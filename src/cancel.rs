//! Quit sources for the non-terminal output modes

use std::io::BufRead;
use std::thread;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use hostscope_tui::matches_token;

/// Read lines until one matches the quit token, then cancel
///
/// Returns true when the token was seen. Lines that are not valid UTF-8 are
/// decoded lossily and ignored. End of input does not cancel so the
/// dashboard keeps refreshing with stdin closed or redirected.
pub fn watch_lines<R: BufRead>(mut reader: R, quit_token: &str, cancel: &CancellationToken) -> bool {
    let mut buf = Vec::with_capacity(64);

    loop {
        if cancel.is_cancelled() {
            return false;
        }

        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                if matches_token(&line, quit_token) {
                    cancel.cancel();
                    return true;
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(e) => {
                warn!(error = %e, "Stopped reading stdin");
                return false;
            }
        }
    }

    debug!("stdin closed, quit token listener finished");
    false
}

/// Watch stdin on a dedicated thread
///
/// The thread blocks on reads, so it is detached rather than joined; it
/// ends with the process.
pub fn spawn_stdin_listener(cancel: CancellationToken, quit_token: String) {
    let spawned = thread::Builder::new()
        .name("hostscope-stdin".to_string())
        .spawn(move || {
            let stdin = std::io::stdin();
            watch_lines(stdin.lock(), &quit_token, &cancel);
        });

    if let Err(e) = spawned {
        warn!(error = %e, "Could not start stdin listener; use Ctrl+C to quit");
    }
}

/// Cancel on SIGINT
pub fn spawn_ctrl_c_listener(cancel: CancellationToken) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            _ = cancel.cancelled() => {}
            result = tokio::signal::ctrl_c() => match result {
                Ok(()) => {
                    debug!("Interrupt received");
                    cancel.cancel();
                }
                Err(e) => warn!(error = %e, "Could not listen for Ctrl+C"),
            },
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_quit_token_cancels() {
        let cancel = CancellationToken::new();
        let input = Cursor::new("hello\n  QUIT  \nafter\n");

        assert!(watch_lines(input, "quit", &cancel));
        assert!(cancel.is_cancelled());
    }

    #[test]
    fn test_other_lines_do_not_cancel() {
        let cancel = CancellationToken::new();
        let input = Cursor::new("q1\nquitter\n\n");

        assert!(!watch_lines(input, "q", &cancel));
        assert!(!cancel.is_cancelled());
    }

    #[test]
    fn test_invalid_utf8_line_does_not_stop_listener() {
        let cancel = CancellationToken::new();
        let input = Cursor::new(b"\xff\xfe\nq\n".to_vec());

        assert!(watch_lines(input, "q", &cancel));
        assert!(cancel.is_cancelled());
    }

    #[test]
    fn test_final_line_without_newline_matches() {
        let cancel = CancellationToken::new();

        assert!(watch_lines(Cursor::new("noise\nQuit"), "quit", &cancel));
    }

    #[test]
    fn test_already_cancelled_stops_reading() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        assert!(!watch_lines(Cursor::new("q\n"), "q", &cancel));
    }
}
