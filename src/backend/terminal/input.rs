//! Input actor: a dedicated thread polling crossterm for terminal events.
//!
//! Events are translated into program input and pushed through a
//! [`ProgramHandle`]. Pointer motion goes through the handle's coalescing
//! slot instead of the message channel, and resizes update the viewport.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton as CtMouseButton,
    MouseEvent, MouseEventKind,
};
use tracing::{debug, warn};

use crate::runtime::{KeyKind, KeyMsg, MouseButton, MouseKind, MouseMsg, Msg, ProgramHandle};

/// A terminal event after translation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// A key press.
    Key(KeyMsg),
    /// A button or wheel event.
    Mouse(MouseMsg),
    /// The pointer is over a cell (with or without a button held).
    Motion {
        /// Column.
        x: usize,
        /// Row.
        y: usize,
    },
    /// The terminal changed size.
    Resize {
        /// Columns.
        columns: usize,
        /// Rows.
        rows: usize,
    },
}

/// Translate a crossterm event. Events the program has no message for
/// yield `None`.
pub fn translate(event: Event) -> Option<Input> {
    match event {
        Event::Key(key) => translate_key(key).map(Input::Key),
        Event::Mouse(mouse) => Some(translate_mouse(mouse)),
        Event::Resize(columns, rows) => Some(Input::Resize {
            columns: usize::from(columns),
            rows: usize::from(rows),
        }),
        Event::Paste(text) => {
            let runes: Vec<char> = text.chars().collect();
            (!runes.is_empty()).then(|| {
                Input::Key(KeyMsg {
                    kind: KeyKind::Runes,
                    runes,
                    alt: false,
                })
            })
        }
        Event::FocusGained | Event::FocusLost => None,
    }
}

/// Translate a key event. Only presses produce messages.
pub fn translate_key(key: KeyEvent) -> Option<KeyMsg> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    let alt = key.modifiers.contains(KeyModifiers::ALT);

    if key.modifiers.contains(KeyModifiers::CONTROL) {
        if let KeyCode::Char(c) = key.code {
            let kind = match c.to_ascii_lowercase() {
                'c' => KeyKind::CtrlC,
                'd' => KeyKind::CtrlD,
                'l' => KeyKind::CtrlL,
                'z' => KeyKind::CtrlZ,
                _ => return None,
            };
            return Some(KeyMsg::new(kind).with_alt(alt));
        }
    }

    let kind = match key.code {
        KeyCode::Char(c) => return Some(KeyMsg::rune(c).with_alt(alt)),
        KeyCode::Enter => KeyKind::Enter,
        KeyCode::Backspace => KeyKind::Backspace,
        KeyCode::Tab | KeyCode::BackTab => KeyKind::Tab,
        KeyCode::Esc => KeyKind::Esc,
        KeyCode::Up => KeyKind::Up,
        KeyCode::Down => KeyKind::Down,
        KeyCode::Left => KeyKind::Left,
        KeyCode::Right => KeyKind::Right,
        KeyCode::Home => KeyKind::Home,
        KeyCode::End => KeyKind::End,
        KeyCode::PageUp => KeyKind::PageUp,
        KeyCode::PageDown => KeyKind::PageDown,
        KeyCode::Delete => KeyKind::Delete,
        KeyCode::Insert => KeyKind::Insert,
        KeyCode::F(n) => KeyKind::F(n),
        _ => return None,
    };
    Some(KeyMsg::new(kind).with_alt(alt))
}

/// Translate a mouse event.
pub fn translate_mouse(mouse: MouseEvent) -> Input {
    let (x, y) = (usize::from(mouse.column), usize::from(mouse.row));
    let (kind, button) = match mouse.kind {
        MouseEventKind::Moved | MouseEventKind::Drag(_) => return Input::Motion { x, y },
        MouseEventKind::Down(button) => (MouseKind::Press, convert_button(button)),
        MouseEventKind::Up(button) => (MouseKind::Release, convert_button(button)),
        MouseEventKind::ScrollUp => (MouseKind::Wheel, MouseButton::WheelUp),
        MouseEventKind::ScrollDown => (MouseKind::Wheel, MouseButton::WheelDown),
        MouseEventKind::ScrollLeft => (MouseKind::Wheel, MouseButton::WheelLeft),
        MouseEventKind::ScrollRight => (MouseKind::Wheel, MouseButton::WheelRight),
    };
    Input::Mouse(MouseMsg::new(x, y, kind, button))
}

const fn convert_button(button: CtMouseButton) -> MouseButton {
    match button {
        CtMouseButton::Left => MouseButton::Left,
        CtMouseButton::Right => MouseButton::Right,
        CtMouseButton::Middle => MouseButton::Middle,
    }
}

/// Input actor handle.
pub struct InputActor {
    handle: Option<JoinHandle<()>>,
    shutdown: Arc<AtomicBool>,
}

impl InputActor {
    /// Spawn the input thread.
    ///
    /// `poll_timeout` bounds how long the thread waits for an event before
    /// checking for shutdown.
    pub fn spawn<C: Send + 'static>(
        program: ProgramHandle<C>,
        poll_timeout: Duration,
    ) -> io::Result<Self> {
        let shutdown = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&shutdown);

        let handle = thread::Builder::new()
            .name("bubblegum-input".to_string())
            .spawn(move || {
                let logger = program.logger().clone();
                logger.in_scope(|| Self::run_loop(&program, &flag, poll_timeout));
            })?;

        Ok(Self {
            handle: Some(handle),
            shutdown,
        })
    }

    /// Signal the input thread to stop.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }

    /// Stop the thread and wait for it.
    pub fn join(mut self) {
        self.shutdown();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    fn run_loop<C: Send + 'static>(
        program: &ProgramHandle<C>,
        shutdown: &AtomicBool,
        poll_timeout: Duration,
    ) {
        debug!("input thread started");
        while !shutdown.load(Ordering::Relaxed) && !program.is_cancelled() {
            match event::poll(poll_timeout) {
                Ok(true) => match event::read() {
                    Ok(event) => {
                        if let Some(input) = translate(event) {
                            dispatch(program, input);
                        }
                    }
                    Err(err) => warn!(error = %err, "failed to read terminal event"),
                },
                Ok(false) => {}
                Err(err) => {
                    warn!(error = %err, "terminal event poll failed, input stopped");
                    break;
                }
            }
        }
        debug!("input thread stopped");
    }
}

impl std::fmt::Debug for InputActor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputActor")
            .field("running", &self.handle.is_some())
            .finish_non_exhaustive()
    }
}

impl Drop for InputActor {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Feed one translated event to the program.
pub fn dispatch<C: Send + 'static>(program: &ProgramHandle<C>, input: Input) {
    match input {
        Input::Key(key) => {
            program.send(Msg::Key(key));
        }
        Input::Mouse(mouse) => {
            program.send(Msg::Mouse(mouse));
        }
        Input::Motion { x, y } => program.pointer_motion(x, y),
        Input::Resize { columns, rows } => program.resize(columns, rows),
    }
}
