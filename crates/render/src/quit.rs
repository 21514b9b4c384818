//! Quit key listener
//!
//! Stands in for a window's key polling: a background thread reads lines and
//! raises the signal on `q`.

use std::io::{self, BufRead};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{debug, info};

/// Shared "user asked to quit" signal
#[derive(Debug, Clone, Default)]
pub struct QuitSignal(Arc<AtomicBool>);

impl QuitSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Spawn a thread that raises `signal` when a line equal to `q`/`Q` is read
///
/// The thread exits on quit, EOF or read error. It may stay blocked on the
/// reader after the pipeline stops, so callers should not join it.
pub fn spawn_quit_listener<R>(reader: R, signal: QuitSignal) -> io::Result<JoinHandle<()>>
where
    R: BufRead + Send + 'static,
{
    thread::Builder::new()
        .name("quit-listener".into())
        .spawn(move || {
            for line in reader.lines() {
                let Ok(line) = line else {
                    break;
                };
                if line.trim().eq_ignore_ascii_case("q") {
                    info!("quit key pressed");
                    signal.raise();
                    return;
                }
            }
            debug!("quit listener input closed");
        })
}
