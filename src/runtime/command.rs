//! Commands: deferred work returned by `init` and `update`.
//!
//! Control-flow commands (quit, batch, timers) are variants of [`Cmd`]
//! rather than special messages, so the executor dispatches on them with an
//! exhaustive match before anything reaches the message channel.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::{CommandError, Fault};

use super::messages::Msg;

/// What a command body returns: at most one message, or an error.
pub type CommandResult<C> = Result<Option<Msg<C>>, CommandError>;

/// A unit of work producing at most one message.
///
/// Closures `FnOnce() -> CommandResult<C>` implement this automatically.
/// Implement it by hand when the captured state deserves a name.
pub trait Command<C>: Send {
    /// Run the command. Called at most once, on an executor thread.
    fn run(self: Box<Self>) -> CommandResult<C>;
}

impl<C, F> Command<C> for F
where
    F: FnOnce() -> CommandResult<C> + Send,
{
    fn run(self: Box<Self>) -> CommandResult<C> {
        (*self)()
    }
}

/// Produces a message from the time a timer fired.
pub type OnceFn<C> = Box<dyn FnOnce(Instant) -> Msg<C> + Send>;
/// Produces a message on every tick of a recurring timer.
pub type EveryFn<C> = Arc<dyn Fn(Instant) -> Msg<C> + Send + Sync>;

/// A command for the [`Executor`](super::Executor).
pub enum Cmd<C> {
    /// Deliver [`Msg::Quit`].
    Quit,
    /// Run every sub-command concurrently, in no particular order.
    Batch(Vec<Cmd<C>>),
    /// Deliver one message after a delay.
    After {
        /// Delay before firing.
        delay: Duration,
        /// Message factory.
        f: OnceFn<C>,
    },
    /// Deliver a message every `interval` until cancelled.
    Every {
        /// Time between ticks.
        interval: Duration,
        /// Message factory.
        f: EveryFn<C>,
    },
    /// Deliver a ready message.
    Message(Msg<C>),
    /// Run arbitrary work.
    Run(Box<dyn Command<C>>),
}

impl<C: Send + 'static> Cmd<C> {
    /// Wrap a [`Command`] implementation.
    pub fn new(command: impl Command<C> + 'static) -> Self {
        Self::Run(Box::new(command))
    }

    /// Stop the program.
    pub const fn quit() -> Self {
        Self::Quit
    }

    /// Combine commands to run concurrently.
    ///
    /// Absent entries are dropped; returns `None` when nothing is left.
    ///
    /// ```
    /// use bubblegum::{Cmd, Msg};
    /// let cmd: Option<Cmd<()>> = Cmd::batch([Some(Cmd::quit()), None]);
    /// assert!(cmd.is_some());
    /// let empty: Option<Cmd<()>> = Cmd::batch([None::<Cmd<()>>, None]);
    /// assert!(empty.is_none());
    /// ```
    pub fn batch<I, T>(commands: I) -> Option<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<Option<Self>>,
    {
        let commands: Vec<Self> = commands.into_iter().filter_map(Into::into).collect();
        if commands.is_empty() {
            None
        } else {
            Some(Self::Batch(commands))
        }
    }

    /// Fire once after `delay`, building the message from the fire time.
    pub fn tick(delay: Duration, f: impl FnOnce(Instant) -> Msg<C> + Send + 'static) -> Self {
        Self::After {
            delay,
            f: Box::new(f),
        }
    }

    /// Fire every `interval` until the program shuts down.
    pub fn every(
        interval: Duration,
        f: impl Fn(Instant) -> Msg<C> + Send + Sync + 'static,
    ) -> Self {
        Self::Every {
            interval,
            f: Arc::new(f),
        }
    }

    /// Run an infallible closure on an executor thread.
    pub fn perform(f: impl FnOnce() -> Option<Msg<C>> + Send + 'static) -> Self {
        Self::new(move || -> CommandResult<C> { Ok(f()) })
    }

    /// Run a fallible closure; an error is delivered as [`Msg::Error`].
    pub fn try_perform(f: impl FnOnce() -> CommandResult<C> + Send + 'static) -> Self {
        Self::new(f)
    }

    /// Deliver `msg` as soon as possible.
    pub const fn message(msg: Msg<C>) -> Self {
        Self::Message(msg)
    }
}

impl<C> Cmd<C> {
    /// A short name for log fields.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Quit => "quit",
            Self::Batch(_) => "batch",
            Self::After { .. } => "after",
            Self::Every { .. } => "every",
            Self::Message(_) => "message",
            Self::Run(_) => "run",
        }
    }
}

impl<C> fmt::Debug for Cmd<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Batch(cmds) => f.debug_tuple("Batch").field(cmds).finish(),
            Self::After { delay, .. } => f.debug_struct("After").field("delay", delay).finish_non_exhaustive(),
            Self::Every { interval, .. } => {
                f.debug_struct("Every").field("interval", interval).finish_non_exhaustive()
            }
            other => f.write_str(other.kind()),
        }
    }
}

/// Run a command body and convert its outcome into an optional message.
///
/// A returned error or a panic becomes [`Msg::Error`].
pub(crate) fn run_isolated<C>(command: Box<dyn Command<C>>) -> Result<Option<Msg<C>>, Fault> {
    super::fault::isolate(move || command.run())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_filters_absent_entries() {
        let cmd: Option<Cmd<u8>> = Cmd::batch([None, Some(Cmd::quit()), None]);
        match cmd {
            Some(Cmd::Batch(cmds)) => assert_eq!(cmds.len(), 1),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn batch_of_nothing_is_none() {
        let cmd: Option<Cmd<u8>> = Cmd::batch(Vec::<Cmd<u8>>::new());
        assert!(cmd.is_none());
    }

    #[test]
    fn closure_commands_run_once() {
        let cmd: Cmd<u8> = Cmd::perform(|| Some(Msg::User(9)));
        let Cmd::Run(body) = cmd else {
            panic!("expected Run");
        };
        match run_isolated(body) {
            Ok(Some(Msg::User(9))) => {}
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn command_errors_are_faults() {
        let cmd: Cmd<u8> = Cmd::try_perform(|| Err(CommandError::Failed("bad input".into())));
        let Cmd::Run(body) = cmd else {
            panic!("expected Run");
        };
        let fault = run_isolated(body).unwrap_err();
        assert_eq!(fault.to_string(), "command failed: bad input");
    }

    struct Fetch {
        id: u8,
    }

    impl Command<u8> for Fetch {
        fn run(self: Box<Self>) -> CommandResult<u8> {
            Ok(Some(Msg::User(self.id * 2)))
        }
    }

    #[test]
    fn named_command_types() {
        let Cmd::Run(body) = Cmd::new(Fetch { id: 4 }) else {
            panic!("expected Run");
        };
        assert!(matches!(run_isolated(body), Ok(Some(Msg::User(8)))));
    }

    #[test]
    fn debug_names() {
        let cmd: Cmd<u8> = Cmd::tick(Duration::from_millis(5), Msg::Tick);
        assert!(format!("{cmd:?}").starts_with("After"));
        assert_eq!(format!("{:?}", Cmd::<u8>::quit()), "quit");
    }
}
