use crate::router::ViewId;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

/// Commands the operator can issue from the keyboard. The key loop only
/// translates input; all state transitions happen in the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KioskCommand {
    Navigate(ViewId),
    StartCamera,
    StopCamera,
    CapturePhoto,
    Register,
    Verify,
    CheckIn,
    ResolveAlert,
    SeedSampleData,
    Refresh,
    Quit,
}

fn command_for(code: KeyCode) -> Option<KioskCommand> {
    match code {
        KeyCode::Char('d') => Some(KioskCommand::Navigate(ViewId::Dashboard)),
        KeyCode::Char('r') => Some(KioskCommand::Navigate(ViewId::Registration)),
        KeyCode::Char('v') => Some(KioskCommand::Navigate(ViewId::Verification)),
        KeyCode::Char('e') => Some(KioskCommand::Navigate(ViewId::Employees)),
        KeyCode::Char('f') => Some(KioskCommand::Navigate(ViewId::Fraud)),
        KeyCode::Char('c') => Some(KioskCommand::StartCamera),
        KeyCode::Char('o') => Some(KioskCommand::StopCamera),
        KeyCode::Char('p') => Some(KioskCommand::CapturePhoto),
        KeyCode::Char('g') => Some(KioskCommand::Register),
        KeyCode::Char('i') => Some(KioskCommand::Verify),
        KeyCode::Char('k') => Some(KioskCommand::CheckIn),
        KeyCode::Char('x') => Some(KioskCommand::ResolveAlert),
        KeyCode::Char('s') => Some(KioskCommand::SeedSampleData),
        KeyCode::Char('u') => Some(KioskCommand::Refresh),
        KeyCode::Char('q') | KeyCode::Esc => Some(KioskCommand::Quit),
        _ => None,
    }
}

/// Keyboard input adapter for the terminal console.
pub struct KeyInputHandler {
    commands: mpsc::UnboundedSender<KioskCommand>,
    cancellation_token: CancellationToken,
    paused: Arc<AtomicBool>,
}

impl KeyInputHandler {
    pub fn new(commands: mpsc::UnboundedSender<KioskCommand>) -> Self {
        Self {
            commands,
            cancellation_token: CancellationToken::new(),
            paused: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Start listening for keyboard input.
    pub fn start(&self) {
        let commands = self.commands.clone();
        let cancellation_token = self.cancellation_token.clone();
        let paused = Arc::clone(&self.paused);

        // Spawn a blocking task to handle keyboard input
        task::spawn_blocking(move || {
            if let Err(e) = enable_raw_mode() {
                error!("Failed to enable raw mode for keyboard input: {}", e);
                return;
            }

            debug!("Raw mode enabled - keyboard handler active");

            loop {
                if cancellation_token.is_cancelled() {
                    debug!("Keyboard input handler stopping");
                    break;
                }

                // While a line prompt owns the terminal, stay out of the way
                if paused.load(Ordering::Acquire) {
                    std::thread::sleep(Duration::from_millis(50));
                    continue;
                }

                match event::poll(Duration::from_millis(100)) {
                    Ok(true) => {
                        if let Ok(Event::Key(key_event)) = event::read() {
                            if key_event.kind != KeyEventKind::Press {
                                continue;
                            }
                            if let Some(command) = command_for(key_event.code) {
                                let quit = command == KioskCommand::Quit;
                                if commands.send(command).is_err() {
                                    break;
                                }
                                if quit {
                                    break;
                                }
                            } else {
                                debug!("Key pressed: {:?}", key_event.code);
                            }
                        }
                    }
                    Ok(false) => {
                        // No event available, continue polling
                    }
                    Err(e) => {
                        warn!("Error polling for keyboard events: {}", e);
                    }
                }
            }

            if let Err(e) = disable_raw_mode() {
                error!("Failed to disable raw mode: {}", e);
            } else {
                debug!("Raw mode disabled");
            }
        });
    }

    /// Hand the terminal over to a line prompt.
    pub fn pause(&self) {
        self.paused.store(true, Ordering::Release);
        let _ = disable_raw_mode();
    }

    /// Take the terminal back after a line prompt.
    pub fn resume(&self) {
        let _ = enable_raw_mode();
        self.paused.store(false, Ordering::Release);
    }

    /// Stop the keyboard input handler.
    pub async fn stop(&self) {
        self.cancellation_token.cancel();

        // Give the task a moment to clean up and disable raw mode
        tokio::time::sleep(Duration::from_millis(200)).await;
        let _ = disable_raw_mode();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_mapping_covers_views_and_actions() {
        assert_eq!(
            command_for(KeyCode::Char('d')),
            Some(KioskCommand::Navigate(ViewId::Dashboard))
        );
        assert_eq!(
            command_for(KeyCode::Char('v')),
            Some(KioskCommand::Navigate(ViewId::Verification))
        );
        assert_eq!(command_for(KeyCode::Esc), Some(KioskCommand::Quit));
        assert_eq!(command_for(KeyCode::Char('z')), None);
    }

    #[tokio::test]
    async fn test_handler_stop_cancels() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let handler = KeyInputHandler::new(tx);

        handler.stop().await;
        assert!(handler.cancellation_token.is_cancelled());
    }
}
