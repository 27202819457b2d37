//! Program Runtime: owns the model and runs the event loop.
//!
//! The run loop executes on the thread that calls [`Program::run`] and is
//! the only code that ever touches the model, so `update` calls are
//! serialized by ownership rather than by a lock. Everything else talks to
//! the loop through a [`ProgramHandle`]: a bounded message channel, a
//! one-slot redraw channel, and a coalesced pointer-motion slot.
//!
//! Each loop iteration is a tick:
//!
//! 1. apply pending pointer motion (at most once)
//! 2. drain the messages queued right now; a quit ends the program before
//!    any of them are applied
//! 3. apply `update` to each, handing returned commands to the executor
//! 4. honor the frame-rate cap
//! 5. call `view`; skip the frame if the text is unchanged and nothing was
//!    processed
//! 6. parse, diff against the previous grid, present

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, select, Receiver, Sender, TrySendError};
use tracing::{debug, error, info, trace, warn};

use crate::ansi;
use crate::backend::{Backend, Viewport};
use crate::error::{ModelError, ProgramError};
use crate::grid::{Grid, Region};
use crate::logging::Logger;

use super::cancel::CancelToken;
use super::command::Cmd;
use super::config::ProgramConfig;
use super::executor::Executor;
use super::fault::isolate;
use super::messages::{MouseButton, MouseKind, MouseMsg, Msg, WindowSize};

/// Application state driven by a [`Program`].
pub trait Model {
    /// Application-defined message payload, delivered as [`Msg::User`].
    type Custom: Send + 'static;

    /// Called once before the first update.
    fn init(&mut self) -> Result<Option<Cmd<Self::Custom>>, ModelError> {
        Ok(None)
    }

    /// Apply one message.
    fn update(&mut self, msg: Msg<Self::Custom>)
        -> Result<Option<Cmd<Self::Custom>>, ModelError>;

    /// Render the current state as styled text.
    fn view(&self) -> Result<String, ModelError>;
}

/// Program lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Phase {
    /// Validating configuration and acquiring the backend.
    Starting = 0,
    /// Event loop running.
    Running = 1,
    /// Cancelled; waiting for the executor and releasing the backend.
    Terminating = 2,
    /// Done.
    Terminated = 3,
}

impl Phase {
    const fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Starting,
            1 => Self::Running,
            2 => Self::Terminating,
            _ => Self::Terminated,
        }
    }
}

#[derive(Default)]
struct MotionState {
    pending: Option<MouseMsg>,
    last_cell: Option<(usize, usize)>,
}

struct Shared<C> {
    msg_tx: Sender<Msg<C>>,
    redraw_tx: Sender<()>,
    cancel: CancelToken,
    phase: AtomicU8,
    motion: Mutex<MotionState>,
    viewport: Mutex<Viewport>,
    logger: Logger,
}

impl<C> Shared<C> {
    fn set_phase(&self, phase: Phase) {
        self.phase.store(phase as u8, Ordering::Release);
    }

    fn viewport(&self) -> Viewport {
        *self.viewport.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_viewport(&self, viewport: Viewport) {
        *self.viewport.lock().unwrap_or_else(PoisonError::into_inner) = viewport;
    }

    fn motion(&self) -> std::sync::MutexGuard<'_, MotionState> {
        self.motion.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A cloneable, thread-safe handle for feeding a running program.
pub struct ProgramHandle<C> {
    shared: Arc<Shared<C>>,
}

impl<C> Clone for ProgramHandle<C> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<C: Send + 'static> ProgramHandle<C> {
    /// Enqueue a message, waiting for room unless the program is shutting
    /// down. Returns `false` if the message was not enqueued.
    pub fn send(&self, msg: Msg<C>) -> bool {
        if self.shared.cancel.is_cancelled() {
            return false;
        }
        select! {
            send(self.shared.msg_tx, msg) -> res => res.is_ok(),
            recv(self.shared.cancel.done()) -> _ => false,
        }
    }

    /// Enqueue a message without waiting; drops it when the channel is full.
    pub fn try_send(&self, msg: Msg<C>) -> bool {
        if self.shared.cancel.is_cancelled() {
            return false;
        }
        match self.shared.msg_tx.try_send(msg) {
            Ok(()) => true,
            Err(TrySendError::Full(msg)) => {
                self.shared
                    .logger
                    .in_scope(|| warn!(kind = msg.kind(), "message channel full, message dropped"));
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }

    /// Ask the program to stop. Idempotent.
    pub fn quit(&self) {
        self.shared.cancel.cancel();
    }

    /// Report the pointer's cell position.
    ///
    /// Motion is not queued: only the latest position is kept and applied
    /// once on the next tick. Moves within the same cell are ignored.
    pub fn pointer_motion(&self, x: usize, y: usize) {
        let schedule = {
            let mut motion = self.shared.motion();
            if motion.last_cell == Some((x, y)) {
                return;
            }
            motion.last_cell = Some((x, y));
            let was_pending = motion.pending.is_some();
            motion.pending = Some(MouseMsg::new(x, y, MouseKind::Motion, MouseButton::None));
            !was_pending
        };
        if schedule {
            self.schedule_redraw();
        }
    }

    /// Report a new viewport size in cells and notify the model.
    pub fn resize(&self, columns: usize, rows: usize) {
        self.shared.set_viewport(Viewport::new(columns, rows));
        self.shared
            .logger
            .in_scope(|| debug!(columns, rows, "viewport resized"));
        self.try_send(Msg::Resize(WindowSize {
            width: columns,
            height: rows,
        }));
        self.schedule_redraw();
    }

    /// Request a tick even if no message is queued.
    pub fn schedule_redraw(&self) {
        // One pending request is enough.
        let _ = self.shared.redraw_tx.try_send(());
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> Phase {
        Phase::from_u8(self.shared.phase.load(Ordering::Acquire))
    }

    /// Current viewport.
    pub fn viewport(&self) -> Viewport {
        self.shared.viewport()
    }

    /// Whether the program has been asked to stop.
    pub fn is_cancelled(&self) -> bool {
        self.shared.cancel.is_cancelled()
    }

    pub(crate) fn logger(&self) -> &Logger {
        &self.shared.logger
    }

    fn take_motion(&self) -> Option<MouseMsg> {
        self.shared.motion().pending.take()
    }

    fn motion_pending(&self) -> bool {
        self.shared.motion().pending.is_some()
    }
}

impl<C> std::fmt::Debug for ProgramHandle<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgramHandle")
            .field("phase", &Phase::from_u8(self.shared.phase.load(Ordering::Relaxed)))
            .finish_non_exhaustive()
    }
}

#[derive(Default)]
struct FrameState {
    last_view: Option<String>,
    previous: Option<Grid>,
    last_render: Option<Instant>,
    /// A render was deferred by the frame-rate cap.
    pending: bool,
}

enum Flow {
    Continue,
    Quit,
}

/// A model bound to a backend.
pub struct Program<M: Model, B: Backend> {
    model: M,
    backend: B,
    config: ProgramConfig,
    handle: ProgramHandle<M::Custom>,
    msg_rx: Receiver<Msg<M::Custom>>,
    redraw_rx: Receiver<()>,
}

impl<M: Model, B: Backend> Program<M, B> {
    /// A program with default configuration, logging from the environment.
    pub fn new(model: M, backend: B) -> Self {
        Self::with_config(model, backend, ProgramConfig::default())
    }

    /// A program with explicit configuration, logging from the environment.
    pub fn with_config(model: M, backend: B, config: ProgramConfig) -> Self {
        Self::with_options(model, backend, config, Logger::from_env())
    }

    /// A program with explicit configuration and logger.
    pub fn with_options(model: M, backend: B, config: ProgramConfig, logger: Logger) -> Self {
        let (msg_tx, msg_rx) = bounded(config.channel_capacity);
        let (redraw_tx, redraw_rx) = bounded(1);
        let shared = Shared {
            msg_tx,
            redraw_tx,
            cancel: CancelToken::new(),
            phase: AtomicU8::new(Phase::Starting as u8),
            motion: Mutex::new(MotionState::default()),
            viewport: Mutex::new(Viewport::default()),
            logger,
        };
        Self {
            model,
            backend,
            config,
            handle: ProgramHandle {
                shared: Arc::new(shared),
            },
            msg_rx,
            redraw_rx,
        }
    }

    /// A handle for sending messages from other threads.
    pub fn handle(&self) -> ProgramHandle<M::Custom> {
        self.handle.clone()
    }

    /// The configuration this program will start with.
    pub const fn config(&self) -> &ProgramConfig {
        &self.config
    }

    /// The model.
    pub const fn model(&self) -> &M {
        &self.model
    }

    /// Run until quit. Returns the final model.
    ///
    /// Fails only if the configuration is invalid or the backend cannot be
    /// opened; nothing is acquired in the first case. Faults inside the
    /// model end the program normally.
    pub fn run(mut self) -> Result<M, ProgramError> {
        let shared = Arc::clone(&self.handle.shared);
        let _log = shared.logger.enter();
        info!(title = %self.config.title, "starting program");
        debug!(config = ?self.config, "program configuration");

        if let Err(err) = self.config.validate() {
            error!(error = %err, "invalid configuration");
            shared.set_phase(Phase::Terminated);
            return Err(err.into());
        }

        let viewport = match self.backend.open(&self.config, self.handle()) {
            Ok(viewport) => viewport,
            Err(err) => {
                error!(error = %err, "failed to open backend");
                shared.cancel.cancel();
                shared.set_phase(Phase::Terminated);
                return Err(err.into());
            }
        };
        shared.set_viewport(viewport);
        debug!(columns = viewport.columns, rows = viewport.rows, "backend opened");

        let executor = Executor::new(shared.msg_tx.clone(), &shared.cancel, shared.logger.clone());
        shared.set_phase(Phase::Running);

        self.handle.try_send(Msg::Resize(WindowSize {
            width: viewport.columns,
            height: viewport.rows,
        }));

        let started = match isolate(|| self.model.init()) {
            Ok(cmd) => {
                executor.execute(cmd);
                true
            }
            Err(fault) => {
                error!(error = %fault, "init fault, quitting");
                false
            }
        };

        if started {
            info!("event loop started");
            self.event_loop(&executor);
        }

        shared.set_phase(Phase::Terminating);
        debug!("terminating");
        shared.cancel.cancel();
        executor.shutdown();
        self.backend.close();
        shared.set_phase(Phase::Terminated);
        info!("program exited");

        Ok(self.model)
    }

    fn event_loop(&mut self, executor: &Executor<M::Custom>) {
        let mut frame = FrameState::default();
        let frame_interval = self.config.frame_interval();
        let mut wait = Duration::ZERO;

        loop {
            let first = select! {
                recv(self.msg_rx) -> msg => msg.ok(),
                recv(self.redraw_rx) -> _ => None,
                recv(self.handle.shared.cancel.done()) -> _ => {
                    debug!("quit requested");
                    return;
                }
                default(wait) => None,
            };
            if self.handle.is_cancelled() {
                return;
            }
            if let Flow::Quit = self.tick(first, executor, &mut frame, frame_interval) {
                return;
            }
            wait = self.next_wait(&frame, frame_interval);
        }
    }

    fn next_wait(&self, frame: &FrameState, frame_interval: Option<Duration>) -> Duration {
        match (frame_interval, frame.pending) {
            (Some(interval), true) => frame
                .last_render
                .map_or(Duration::ZERO, |at| interval.saturating_sub(at.elapsed())),
            (Some(interval), false) => interval,
            (None, true) => Duration::ZERO,
            (None, false) => self.config.idle_wait,
        }
    }

    fn tick(
        &mut self,
        first: Option<Msg<M::Custom>>,
        executor: &Executor<M::Custom>,
        frame: &mut FrameState,
        frame_interval: Option<Duration>,
    ) -> Flow {
        let motion = self.handle.take_motion();
        let processed_motion = motion.is_some();
        if let Some(motion) = motion {
            if let Flow::Quit = self.apply(Msg::Mouse(motion), executor) {
                return Flow::Quit;
            }
        }

        // Take what is queued now, not what arrives while we work.
        let available = self.msg_rx.len();
        let mut batch = Vec::with_capacity(available + 1);
        for msg in first.into_iter().chain(self.msg_rx.try_iter().take(available)) {
            if msg.is_quit() {
                info!("quit message received");
                return Flow::Quit;
            }
            batch.push(msg);
        }

        let had_messages = !batch.is_empty();
        if had_messages {
            trace!(count = batch.len(), "applying messages");
        }
        for msg in batch {
            if let Flow::Quit = self.apply(msg, executor) {
                return Flow::Quit;
            }
        }

        if let (Some(interval), Some(last)) = (frame_interval, frame.last_render) {
            if last.elapsed() < interval {
                frame.pending |= had_messages || processed_motion;
                return Flow::Continue;
            }
        }

        let (view, flow) = match isolate(|| self.model.view()) {
            Ok(view) => (view, Flow::Continue),
            Err(fault) => {
                error!(error = %fault, "view fault, quitting");
                (String::new(), Flow::Quit)
            }
        };

        // Skips an unchanged empty view as well.
        if !had_messages && frame.last_view.as_deref() == Some(view.as_str()) {
            frame.pending = false;
            return flow;
        }

        self.render(view, frame);

        if processed_motion && self.handle.motion_pending() {
            self.handle.schedule_redraw();
        }
        flow
    }

    fn apply(&mut self, msg: Msg<M::Custom>, executor: &Executor<M::Custom>) -> Flow {
        let kind = msg.kind();
        match isolate(|| self.model.update(msg)) {
            Ok(cmd) => {
                executor.execute(cmd);
                Flow::Continue
            }
            Err(fault) => {
                error!(msg = kind, error = %fault, "update fault, quitting");
                Flow::Quit
            }
        }
    }

    fn render(&mut self, view: String, frame: &mut FrameState) {
        let viewport = self.handle.viewport();
        if viewport.is_empty() {
            debug!("empty viewport, frame skipped");
            return;
        }

        let grid = ansi::parse(&view, viewport.columns, viewport.rows);
        let regions = frame
            .previous
            .as_ref()
            .map_or_else(|| vec![Region::covering(&grid)], |previous| previous.diff(&grid));

        if let Err(err) = self.backend.present(&grid, &regions) {
            warn!(error = %err, "render failed, frame skipped");
            return;
        }
        trace!(regions = regions.len(), "frame presented");

        frame.last_view = Some(view);
        frame.previous = Some(grid);
        frame.last_render = Some(Instant::now());
        frame.pending = false;
    }
}

impl<M: Model, B: Backend> std::fmt::Debug for Program<M, B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Program")
            .field("config", &self.config)
            .field("handle", &self.handle)
            .finish_non_exhaustive()
    }
}
