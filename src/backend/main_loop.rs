//! Backend main event loop.

use crossbeam_channel::{Receiver, Sender, TryRecvError};
use std::time::Duration;
use tokio::runtime::Runtime;
use tokio::time::timeout;
use tracing::{info, warn};

use super::handlers::{self, Session};
use crate::protocol::{BackendAction, UiEvent};

/// How long a network read may block before pending actions are checked.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Run the backend event loop on a tokio runtime.
///
/// Returns once the action channel is closed.
pub fn run_backend(action_rx: Receiver<BackendAction>, event_tx: Sender<UiEvent>, debug: bool) {
    let rt = match Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            let _ = event_tx.send(UiEvent::Error(format!(
                "Failed to create Tokio runtime: {}",
                e
            )));
            return;
        }
    };

    rt.block_on(async move {
        let mut session = Session::new(debug);

        loop {
            // Drain actions from the front end (non-blocking)
            loop {
                match action_rx.try_recv() {
                    Ok(action) => {
                        handlers::handle_backend_action(action, &mut session, &event_tx).await;
                    }
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        info!("Front end went away, stopping backend");
                        return;
                    }
                }
            }

            let Some(ref mut t) = session.transport else {
                tokio::time::sleep(POLL_INTERVAL).await;
                continue;
            };

            match timeout(POLL_INTERVAL, t.read_message()).await {
                Ok(Ok(Some(message))) => {
                    handlers::handle_server_message(message, &mut session, &event_tx).await;
                }
                Ok(Ok(None)) => {
                    session.transport = None;
                    info!("Connection closed by server");
                    let _ = event_tx.send(UiEvent::Disconnected("Connection closed by server".into()));
                }
                Ok(Err(e)) => {
                    session.transport = None;
                    warn!(error = %e, "Read error");
                    let _ = event_tx.send(UiEvent::Disconnected(format!("Read error: {}", e)));
                }
                Err(_) => {
                    // Timeout, loop back to check actions
                }
            }
        }
    });
}
