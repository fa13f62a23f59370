use crossterm::event::{Event as CrosstermEvent, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use futures::StreamExt;
use tokio_util::sync::CancellationToken;

/// Line editor that recognizes the quit token typed in raw mode
///
/// Characters accumulate until Enter, then the line is compared with the
/// quit token ignoring case. Esc and Ctrl+C quit at once, and a one
/// character token also quits on the key press alone.
#[derive(Clone, Debug)]
pub struct QuitInput {
    token: String,
    line: String,
}

impl QuitInput {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into().trim().to_string(),
            line: String::new(),
        }
    }

    /// Feed one key press; returns true when the user asked to quit
    pub fn on_key(&mut self, key: &KeyEvent) -> bool {
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => true,
            KeyCode::Esc => true,
            KeyCode::Enter => {
                let line = std::mem::take(&mut self.line);
                matches_token(&line, &self.token)
            }
            KeyCode::Backspace => {
                self.line.pop();
                false
            }
            KeyCode::Char(c) => {
                if self.token.chars().count() == 1 && self.line.is_empty() {
                    let mut buf = [0u8; 4];
                    if matches_token(c.encode_utf8(&mut buf), &self.token) {
                        return true;
                    }
                }
                self.line.push(c);
                false
            }
            _ => false,
        }
    }
}

/// Case-insensitive comparison of an input line with the quit token
pub fn matches_token(line: &str, token: &str) -> bool {
    let line = line.trim();
    !line.is_empty() && line.to_lowercase() == token.to_lowercase()
}

/// Watches terminal key presses and cancels the token on quit
pub struct KeyQuitListener;

impl KeyQuitListener {
    /// Spawn the listener; it ends on quit, on cancellation, or when the
    /// terminal event stream closes
    pub fn spawn(cancel: CancellationToken, quit_token: String) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut reader = EventStream::new();
            let mut input = QuitInput::new(quit_token);

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,

                    maybe_event = reader.next() => {
                        match maybe_event {
                            Some(Ok(CrosstermEvent::Key(key))) => {
                                // Filter out release events (important for Windows)
                                if key.kind == KeyEventKind::Press && input.on_key(&key) {
                                    cancel.cancel();
                                    break;
                                }
                            }
                            Some(Ok(_)) => {}
                            Some(Err(e)) => {
                                tracing::warn!(error = %e, "Terminal input error");
                            }
                            None => break,
                        }
                    }
                }
            }
        })
    }
}
