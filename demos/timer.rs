//! Timer Demo: a stopwatch driven by a recurring command.
//!
//! Shows keyboard and pointer input, a recurring timer, a background
//! command and styled output in the terminal backend.
//!
//! Space pauses, `r` resets, `q`, Escape or Ctrl+C quits.
//! Set `BUBBLEGUM_DEBUG=1 BUBBLEGUM_LOG_FILE=timer.log` to capture logs.

use std::time::{Duration, Instant};

use bubblegum::{
    Cmd, KeyKind, Model, ModelError, MouseKind, Msg, Program, ProgramConfig, TerminalBackend,
};

const TICK: Duration = Duration::from_millis(100);

enum Event {
    Tick(Instant),
    Hostname(String),
}

struct Stopwatch {
    elapsed: Duration,
    last_tick: Option<Instant>,
    running: bool,
    pointer: Option<(usize, usize)>,
    clicks: usize,
    size: (usize, usize),
    host: Option<String>,
}

impl Stopwatch {
    fn new() -> Self {
        Self {
            elapsed: Duration::ZERO,
            last_tick: None,
            running: true,
            pointer: None,
            clicks: 0,
            size: (0, 0),
            host: None,
        }
    }
}

impl Model for Stopwatch {
    type Custom = Event;

    fn init(&mut self) -> Result<Option<Cmd<Event>>, ModelError> {
        Ok(Cmd::batch([
            Cmd::every(TICK, |now| Msg::User(Event::Tick(now))),
            Cmd::perform(|| {
                let host = std::env::var("HOSTNAME").unwrap_or_else(|_| "localhost".into());
                Some(Msg::User(Event::Hostname(host)))
            }),
        ]))
    }

    fn update(&mut self, msg: Msg<Event>) -> Result<Option<Cmd<Event>>, ModelError> {
        match msg {
            Msg::User(Event::Tick(now)) => {
                if self.running {
                    if let Some(last) = self.last_tick {
                        self.elapsed += now.saturating_duration_since(last);
                    }
                }
                self.last_tick = Some(now);
            }
            Msg::User(Event::Hostname(host)) => self.host = Some(host),
            Msg::Key(key) => match key.kind {
                KeyKind::CtrlC | KeyKind::Esc => return Ok(Some(Cmd::quit())),
                KeyKind::Runes => match key.runes.as_slice() {
                    ['q'] => return Ok(Some(Cmd::quit())),
                    [' '] => self.running = !self.running,
                    ['r'] => self.elapsed = Duration::ZERO,
                    _ => {}
                },
                _ => {}
            },
            Msg::Mouse(mouse) => {
                self.pointer = Some((mouse.x, mouse.y));
                if mouse.kind == MouseKind::Press {
                    self.clicks += 1;
                }
            }
            Msg::Resize(size) => self.size = (size.width, size.height),
            _ => {}
        }
        Ok(None)
    }

    fn view(&self) -> Result<String, ModelError> {
        let secs = self.elapsed.as_secs();
        let tenths = self.elapsed.subsec_millis() / 100;
        let state = if self.running {
            "\x1b[32mrunning\x1b[39m"
        } else {
            "\x1b[33mpaused\x1b[39m"
        };
        let pointer = self
            .pointer
            .map_or_else(|| "-".to_string(), |(x, y)| format!("{x},{y}"));

        Ok(format!(
            "\x1b[1;38;2;255;105;180mBubbleGum stopwatch\x1b[0m on {host}\n\
             \n\
             \x1b[1m{min:02}:{sec:02}.{tenths}\x1b[0m  {state}\n\
             \n\
             pointer {pointer}  clicks {clicks}  screen {w}x{h}\n\
             \n\
             \x1b[2m\x1b[38;5;244mspace pause  r reset  q quit\x1b[0m",
            host = self.host.as_deref().unwrap_or("..."),
            min = secs / 60,
            sec = secs % 60,
            clicks = self.clicks,
            w = self.size.0,
            h = self.size.1,
        ))
    }
}

fn main() -> Result<(), bubblegum::ProgramError> {
    let config = ProgramConfig::default()
        .with_title("BubbleGum Timer")
        .with_fps(30);
    let model = Program::with_config(Stopwatch::new(), TerminalBackend::new(), config).run()?;
    println!("stopped at {:.1}s", model.elapsed.as_secs_f64());
    Ok(())
}
