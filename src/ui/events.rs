use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::time::Duration;

use super::app::App;

/// Handle pending keyboard events without holding up the frame
/// Waits at most `timeout` for the first event, then drains the rest
pub fn handle_events(app: &mut App, timeout: Duration) -> anyhow::Result<()> {
    let mut wait = timeout;
    while event::poll(wait)? {
        if let Event::Key(key) = event::read()? {
            handle_key_event(app, key);
        }
        wait = Duration::ZERO;
    }
    Ok(())
}

/// Process individual key press
fn handle_key_event(app: &mut App, key: KeyEvent) {
    if key.kind != KeyEventKind::Press {
        return;
    }

    // Check for Ctrl+C
    if key.modifiers.contains(KeyModifiers::CONTROL) && matches!(key.code, KeyCode::Char('c')) {
        app.quit();
        return;
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.quit(),
        _ => {}
    }
}
