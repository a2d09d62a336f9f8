use std::io::{self, BufRead};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use anyhow::Context;
use healthboard_core::{update, AppState, Msg};
use healthboard_engine::EngineHandle;
use healthboard_logging::{board_info, board_warn};

use super::config::AppConfig;
use super::effects::EffectRunner;
use super::ui::commands::{self, Command};
use super::ui::render;

/// How long the loop waits for a typed line before draining engine events.
const INPUT_POLL: Duration = Duration::from_millis(50);

pub fn run_app(config: AppConfig) -> anyhow::Result<()> {
    let api_settings = config.api_settings();
    let engine = EngineHandle::new(&api_settings).context("could not start the engine")?;
    let mut session = Session {
        state: AppState::with_settings(config.session_settings()),
        effects: EffectRunner::new(engine),
    };
    let input = spawn_input_reader();
    let mut out = io::stdout();
    let mut notice: Option<String> = None;

    board_info!("healthboard started against {}", api_settings.endpoint);
    session.dispatch(Msg::Started);

    loop {
        let mut redraw = false;
        match input.recv_timeout(INPUT_POLL) {
            Ok(line) => match commands::parse(&line, &session.state) {
                Ok(Command::Quit) => break,
                Ok(Command::Help) => {
                    notice = Some(commands::HELP.to_string());
                    redraw = true;
                }
                Ok(Command::Redraw) => redraw = true,
                Ok(Command::Dispatch(msgs)) => {
                    notice = None;
                    redraw = true;
                    for msg in msgs {
                        session.dispatch(msg);
                    }
                }
                Err(err) => {
                    notice = Some(err.to_string());
                    redraw = true;
                }
            },
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }

        while let Some(msg) = session.effects.try_recv() {
            session.dispatch(msg);
        }

        let dirty = session.state.consume_dirty();
        if dirty || redraw {
            render::draw(&mut out, &session.state.view(), notice.as_deref())
                .context("could not draw to the terminal")?;
        }
    }

    board_info!("healthboard stopped");
    Ok(())
}

struct Session {
    state: AppState,
    effects: EffectRunner,
}

impl Session {
    fn dispatch(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (state, effects) = update(state, msg);
        self.state = state;
        self.effects.run(effects);
    }
}

/// Forwards stdin lines; the channel closes at end of input.
fn spawn_input_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(err) => {
                    board_warn!("Stopped reading input: {err}");
                    break;
                }
            }
        }
    });
    rx
}
