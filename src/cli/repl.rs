use anyhow::Result;
use log::error;

use crate::cli::dispatcher::{Dispatcher, Flow};

/// Reads and dispatches lines until the user leaves.
///
/// The transcript is saved before every prompt and again on the way out. A
/// failed command is reported and the loop carries on.
pub async fn run(dispatcher: &mut Dispatcher) -> Result<()> {
    let (user, assistant) = {
        let persona = &dispatcher.settings().persona;
        (persona.user_label.clone(), persona.assistant_label.clone())
    };

    loop {
        dispatcher.drain_drop_zone().await;
        save(dispatcher);

        let input = match dispatcher.read_input() {
            Ok(Some(line)) => line,
            Ok(None) => {
                save(dispatcher);
                let farewell = format!("\n{assistant}'s resonance interrupted. Farewell, {user}.");
                let farewell = dispatcher.formatter().format_prompt(&farewell);
                dispatcher.print(&farewell);
                return Ok(());
            }
            Err(e) => {
                save(dispatcher);
                return Err(e.into());
            }
        };

        match dispatcher.dispatch(&input).await {
            Ok(Flow::Continue) => {}
            Ok(Flow::Exit) => {
                save(dispatcher);
                let farewell =
                    format!("\n{assistant}'s resonance fades. Until next time, {user}.");
                let farewell = dispatcher.formatter().format_prompt(&farewell);
                dispatcher.print(&farewell);
                return Ok(());
            }
            Err(e) => {
                error!("Command failed: {e:#}");
                let message = dispatcher.formatter().format_error(&format!("Error: {e:#}"));
                dispatcher.print(&message);
                let hint = dispatcher
                    .formatter()
                    .format_warning("💡 The conversation continues...");
                dispatcher.print(&hint);
            }
        }
    }
}

fn save(dispatcher: &mut Dispatcher) {
    if let Err(e) = dispatcher.save() {
        error!("Failed to save chat: {e}");
        let message = dispatcher.formatter().format_error(&e.to_string());
        dispatcher.print(&message);
    }
}
