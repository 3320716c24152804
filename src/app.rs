use crate::ui::conversation::{ConversationAction, ConversationManager};
use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::io;
use std::time::Duration;

/// Runs the terminal UI until the user quits. The terminal is restored even
/// when the loop fails.
pub async fn run(manager: ConversationManager, tick_rate: Duration) -> Result<()> {
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("Failed to enter alternate screen")?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout)).context("Failed to create terminal")?;

    let result = run_loop(&mut terminal, manager, tick_rate).await;

    // Every step runs even if an earlier one failed.
    let restored = [
        disable_raw_mode().context("Failed to disable raw mode"),
        execute!(terminal.backend_mut(), LeaveAlternateScreen).context("Failed to leave alternate screen"),
        terminal.show_cursor().context("Failed to show cursor"),
    ];

    first_failure(result, restored)
}

/// The loop's error wins; otherwise the first failed teardown step.
fn first_failure(result: Result<()>, teardown: impl IntoIterator<Item = Result<()>>) -> Result<()> {
    let mut outcome = result;
    for step in teardown {
        if let Err(e) = step {
            if outcome.is_ok() {
                outcome = Err(e);
            } else {
                log::error!("Terminal restore failed: {:#}", e);
            }
        }
    }
    outcome
}

async fn run_loop<B: Backend>(
    terminal: &mut Terminal<B>,
    mut manager: ConversationManager,
    tick_rate: Duration,
) -> Result<()> {
    loop {
        manager.set_viewport(terminal.size()?);
        terminal.draw(|frame| frame.render_widget(&manager, frame.size()))?;

        if event::poll(tick_rate)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press
                    && key.modifiers.contains(KeyModifiers::CONTROL)
                    && key.code == KeyCode::Char('c')
                {
                    log::info!("Exit requested (Ctrl+C)");
                    return Ok(());
                }

                if manager.handle_key(key) == ConversationAction::Exit {
                    log::info!("Exit requested");
                    return Ok(());
                }
            }
        }

        manager.tick();
        // Let the answer task make progress between polls.
        tokio::task::yield_now().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn clean_run_and_teardown_is_ok() {
        assert!(first_failure(Ok(()), [Ok(()), Ok(()), Ok(())]).is_ok());
    }

    #[test]
    fn first_teardown_failure_is_reported() {
        let err = first_failure(
            Ok(()),
            [Err(anyhow!("raw mode")), Ok(()), Err(anyhow!("cursor"))],
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "raw mode");
    }

    #[test]
    fn loop_error_takes_precedence_over_teardown() {
        let err = first_failure(Err(anyhow!("loop")), [Err(anyhow!("raw mode")), Ok(()), Ok(())]).unwrap_err();
        assert_eq!(err.to_string(), "loop");
    }
}
