//! Command Executor: runs commands concurrently and feeds their messages
//! back into the program's channel.
//!
//! Each [`Cmd::Run`] gets its own thread. Timers ([`Cmd::After`],
//! [`Cmd::Every`]) get a thread each plus an entry in the timer registry
//! holding their cancellation token. Every thread is counted by a task
//! tracker so [`Executor::shutdown`] can join them all without holding
//! `JoinHandle`s.
//!
//! Delivery never blocks: when the channel is full or the executor has been
//! cancelled, the message is dropped and counted.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Sender, TrySendError};
use tracing::{debug, error, trace, warn};

use crate::error::Fault;
use crate::logging::Logger;

use super::cancel::CancelToken;
use super::command::{run_isolated, Cmd, EveryFn, OnceFn};
use super::fault::isolate;
use super::messages::{ErrorMsg, Msg};

/// Shortest interval a recurring timer will tick at.
pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

type TimerId = u64;

/// Counts live task threads and wakes waiters when it reaches zero.
#[derive(Default)]
struct TaskTracker {
    count: Mutex<usize>,
    idle: Condvar,
}

impl TaskTracker {
    fn enter(self: &Arc<Self>) -> TaskGuard {
        *self.count.lock().unwrap_or_else(PoisonError::into_inner) += 1;
        TaskGuard(Arc::clone(self))
    }

    fn active(&self) -> usize {
        *self.count.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Wait for zero live tasks. Returns `false` if `deadline` passed first.
    fn wait_idle(&self, deadline: Option<Instant>) -> bool {
        let mut count = self.count.lock().unwrap_or_else(PoisonError::into_inner);
        while *count > 0 {
            match deadline {
                None => {
                    count = self.idle.wait(count).unwrap_or_else(PoisonError::into_inner);
                }
                Some(deadline) => {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    if remaining.is_zero() {
                        return false;
                    }
                    count = self
                        .idle
                        .wait_timeout(count, remaining)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0;
                }
            }
        }
        true
    }
}

/// Held by a task thread for its whole life.
struct TaskGuard(Arc<TaskTracker>);

impl Drop for TaskGuard {
    fn drop(&mut self) {
        let mut count = self.0.count.lock().unwrap_or_else(PoisonError::into_inner);
        *count = count.saturating_sub(1);
        if *count == 0 {
            self.0.idle.notify_all();
        }
    }
}

struct TimerRegistration {
    cancel: CancelToken,
    /// `None` for one-shot timers.
    interval: Option<Duration>,
}

#[derive(Default)]
struct TimerRegistry {
    /// Set by shutdown; no new timers are accepted afterwards.
    draining: bool,
    entries: HashMap<TimerId, TimerRegistration>,
}

/// Delivery counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecutorStats {
    /// Task threads started.
    pub spawned: u64,
    /// Messages placed on the channel.
    pub delivered: u64,
    /// Messages dropped (channel full, cancelled or closed).
    pub dropped: u64,
}

#[derive(Default)]
struct Counters {
    spawned: AtomicU64,
    delivered: AtomicU64,
    dropped: AtomicU64,
}

struct Inner<C> {
    sender: Sender<Msg<C>>,
    cancel: CancelToken,
    tasks: Arc<TaskTracker>,
    timers: Mutex<TimerRegistry>,
    next_timer_id: AtomicU64,
    closed: AtomicBool,
    logger: Logger,
    counters: Counters,
}

/// Runs commands and delivers their messages.
///
/// Cloning yields another handle to the same executor.
pub struct Executor<C> {
    inner: Arc<Inner<C>>,
}

impl<C> Clone for Executor<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: Send + 'static> Executor<C> {
    /// Create an executor delivering to `sender`.
    ///
    /// The executor's token is a child of `parent`: cancelling the parent
    /// stops every timer and drops every later delivery.
    pub fn new(sender: Sender<Msg<C>>, parent: &CancelToken, logger: Logger) -> Self {
        Self {
            inner: Arc::new(Inner {
                sender,
                cancel: parent.child(),
                tasks: Arc::new(TaskTracker::default()),
                timers: Mutex::new(TimerRegistry::default()),
                next_timer_id: AtomicU64::new(0),
                closed: AtomicBool::new(false),
                logger,
                counters: Counters::default(),
            }),
        }
    }

    /// Run a command. `None` is a no-op.
    ///
    /// Never blocks on the command itself. Safe to call from any thread,
    /// including from inside other commands.
    pub fn execute(&self, cmd: Option<Cmd<C>>) {
        let Some(cmd) = cmd else {
            return;
        };
        if self.is_closed() {
            let _log = self.inner.logger.enter();
            debug!(kind = cmd.kind(), "executor closed, command ignored");
            return;
        }

        match cmd {
            Cmd::Quit => {
                self.deliver(Msg::Quit);
            }
            Cmd::Message(msg) => {
                self.deliver(msg);
            }
            Cmd::Batch(cmds) => {
                for sub in cmds {
                    self.execute(Some(sub));
                }
            }
            Cmd::Run(body) => self.spawn("bubblegum-cmd", move |exec| {
                match run_isolated(body) {
                    Ok(Some(msg)) => {
                        exec.deliver(msg);
                    }
                    Ok(None) => {}
                    Err(fault) => exec.deliver_fault("command", fault),
                }
            }),
            Cmd::After { delay, f } => {
                self.spawn("bubblegum-timer", move |exec| exec.run_once(delay, f));
            }
            Cmd::Every { interval, f } => {
                self.spawn("bubblegum-timer", move |exec| exec.run_every(interval, &f));
            }
        }
    }

    /// Place a message on the channel without blocking.
    ///
    /// Returns `false` if the message was dropped.
    pub fn deliver(&self, msg: Msg<C>) -> bool {
        let counters = &self.inner.counters;
        if self.inner.cancel.is_cancelled() || self.is_closed() {
            trace!(kind = msg.kind(), "executor cancelled, message dropped");
            counters.dropped.fetch_add(1, Ordering::Relaxed);
            return false;
        }

        match self.inner.sender.try_send(msg) {
            Ok(()) => {
                counters.delivered.fetch_add(1, Ordering::Relaxed);
                true
            }
            Err(TrySendError::Full(msg)) => {
                warn!(kind = msg.kind(), "message channel full, message dropped");
                counters.dropped.fetch_add(1, Ordering::Relaxed);
                false
            }
            Err(TrySendError::Disconnected(msg)) => {
                debug!(kind = msg.kind(), "message channel closed, message dropped");
                counters.dropped.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }

    /// Cancel every timer, then wait for every task to finish.
    ///
    /// After this returns nothing more is delivered.
    pub fn shutdown(&self) {
        self.shutdown_inner(None);
    }

    /// Like [`shutdown`](Self::shutdown) but gives up waiting after `timeout`.
    ///
    /// Returns `true` if every task finished in time. Either way the
    /// executor is closed and stragglers' messages are dropped.
    pub fn shutdown_timeout(&self, timeout: Duration) -> bool {
        self.shutdown_inner(Some(Instant::now() + timeout))
    }

    fn shutdown_inner(&self, deadline: Option<Instant>) -> bool {
        let _log = self.inner.logger.enter();
        let cancelled = {
            let mut timers = self.timers();
            timers.draining = true;
            for timer in timers.entries.values() {
                timer.cancel.cancel();
            }
            timers.entries.len()
        };
        debug!(timers = cancelled, tasks = self.active_tasks(), "executor shutting down");

        let idle = self.inner.tasks.wait_idle(deadline);
        self.inner.closed.store(true, Ordering::Release);
        if idle {
            debug!("executor shut down");
        } else {
            warn!(tasks = self.active_tasks(), "executor shutdown timed out");
        }
        idle
    }

    /// Whether [`shutdown`](Self::shutdown) has completed.
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Number of live task and timer threads.
    pub fn active_tasks(&self) -> usize {
        self.inner.tasks.active()
    }

    /// Number of registered timers (one-shot and recurring).
    pub fn active_timers(&self) -> usize {
        self.timers().entries.len()
    }

    /// Number of registered recurring timers.
    pub fn active_recurring_timers(&self) -> usize {
        self.timers()
            .entries
            .values()
            .filter(|t| t.interval.is_some())
            .count()
    }

    /// Snapshot of the delivery counters.
    pub fn stats(&self) -> ExecutorStats {
        let c = &self.inner.counters;
        ExecutorStats {
            spawned: c.spawned.load(Ordering::Relaxed),
            delivered: c.delivered.load(Ordering::Relaxed),
            dropped: c.dropped.load(Ordering::Relaxed),
        }
    }

    /// The executor's cancellation token.
    pub fn cancel_token(&self) -> &CancelToken {
        &self.inner.cancel
    }

    /// Start a tracked thread. The guard is taken before spawning so a
    /// concurrent shutdown cannot miss it.
    fn spawn(&self, name: &str, task: impl FnOnce(&Self) + Send + 'static) {
        let guard = self.inner.tasks.enter();
        let exec = self.clone();
        let spawned = thread::Builder::new().name(name.to_string()).spawn(move || {
            let _guard = guard;
            let _log = exec.inner.logger.enter();
            task(&exec);
        });

        match spawned {
            Ok(_) => {
                self.inner.counters.spawned.fetch_add(1, Ordering::Relaxed);
            }
            Err(err) => {
                let _log = self.inner.logger.enter();
                error!(error = %err, "failed to spawn command thread, command dropped");
            }
        }
    }

    fn deliver_fault(&self, context: &str, fault: Fault) {
        warn!(context, error = %fault, "command fault");
        self.deliver(Msg::Error(ErrorMsg::new(fault)));
    }

    fn timers(&self) -> std::sync::MutexGuard<'_, TimerRegistry> {
        self.inner.timers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a timer. Returns `None` once shutdown has begun.
    fn register_timer(&self, interval: Option<Duration>) -> Option<(TimerId, CancelToken)> {
        let mut timers = self.timers();
        if timers.draining {
            return None;
        }
        let id = self.inner.next_timer_id.fetch_add(1, Ordering::Relaxed);
        let cancel = self.inner.cancel.child();
        timers.entries.insert(
            id,
            TimerRegistration {
                cancel: cancel.clone(),
                interval,
            },
        );
        Some((id, cancel))
    }

    fn unregister_timer(&self, id: TimerId) {
        self.timers().entries.remove(&id);
    }

    fn run_once(&self, delay: Duration, f: OnceFn<C>) {
        let Some((id, token)) = self.register_timer(None) else {
            debug!("executor draining, timer not started");
            return;
        };
        let fired = token.sleep(delay);
        self.unregister_timer(id);
        if !fired {
            trace!("one-shot timer cancelled");
            return;
        }
        match isolate(|| Ok::<_, Fault>(f(Instant::now()))) {
            Ok(msg) => {
                self.deliver(msg);
            }
            Err(fault) => self.deliver_fault("timer", fault),
        }
    }

    fn run_every(&self, interval: Duration, f: &EveryFn<C>) {
        let Some((id, token)) = self.register_timer(Some(interval)) else {
            debug!("executor draining, timer not started");
            return;
        };
        let interval = interval.max(MIN_INTERVAL);
        debug!(?interval, timer = id, "recurring timer started");

        let mut next_tick = Instant::now() + interval;
        let mut ticks = 0_u64;
        while token.sleep_until(next_tick) {
            let now = Instant::now();
            match isolate(|| Ok::<_, Fault>(f(now))) {
                Ok(msg) => {
                    self.deliver(msg);
                }
                Err(fault) => {
                    self.deliver_fault("timer", fault);
                    break;
                }
            }
            ticks += 1;

            next_tick += interval;
            // Behind schedule: skip missed ticks instead of bursting.
            if next_tick < now {
                next_tick = now + interval;
            }
        }

        self.unregister_timer(id);
        debug!(timer = id, ticks, "recurring timer stopped");
    }
}

impl<C> std::fmt::Debug for Executor<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor")
            .field("closed", &self.inner.closed.load(Ordering::Relaxed))
            .field("cancelled", &self.inner.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CommandError;
    use crossbeam_channel::{bounded, Receiver};

    fn executor(capacity: usize) -> (Executor<u32>, Receiver<Msg<u32>>, CancelToken) {
        let (tx, rx) = bounded(capacity);
        let root = CancelToken::new();
        let exec = Executor::new(tx, &root, Logger::disabled());
        (exec, rx, root)
    }

    fn users(rx: &Receiver<Msg<u32>>) -> Vec<u32> {
        let mut out: Vec<u32> = rx
            .try_iter()
            .filter_map(|m| match m {
                Msg::User(v) => Some(v),
                _ => None,
            })
            .collect();
        out.sort_unstable();
        out
    }

    #[test]
    fn test_none_is_noop() {
        let (exec, rx, _root) = executor(4);
        exec.execute(None);
        exec.shutdown();
        assert!(rx.try_recv().is_err());
        assert_eq!(exec.stats(), ExecutorStats::default());
    }

    #[test]
    fn test_run_delivers_result() {
        let (exec, rx, _root) = executor(4);
        exec.execute(Some(Cmd::perform(|| Some(Msg::User(1)))));
        exec.shutdown();
        assert_eq!(users(&rx), vec![1]);
        assert_eq!(exec.stats().delivered, 1);
    }

    #[test]
    fn test_nested_batch_delivers_everything_once() {
        let (exec, rx, _root) = executor(16);
        let inner = Cmd::batch([
            Cmd::perform(|| Some(Msg::User(3))),
            Cmd::perform(|| Some(Msg::User(4))),
        ]);
        let outer = Cmd::batch([
            Some(Cmd::perform(|| Some(Msg::User(1)))),
            Some(Cmd::perform(|| Some(Msg::User(2)))),
            inner,
            None,
        ]);
        exec.execute(outer);
        exec.shutdown();
        assert_eq!(users(&rx), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_quit_and_message_commands() {
        let (exec, rx, _root) = executor(4);
        exec.execute(Some(Cmd::quit()));
        exec.execute(Some(Cmd::message(Msg::User(5))));
        exec.shutdown();
        let msgs: Vec<_> = rx.try_iter().collect();
        assert!(msgs.iter().any(Msg::is_quit));
        assert!(msgs.iter().any(|m| matches!(m, Msg::User(5))));
    }

    #[test]
    fn test_command_error_becomes_error_msg() {
        let (exec, rx, _root) = executor(4);
        exec.execute(Some(Cmd::try_perform(|| {
            Err(CommandError::Failed("nope".into()))
        })));
        exec.shutdown();
        match rx.try_recv() {
            Ok(Msg::Error(err)) => assert_eq!(err.to_string(), "command failed: nope"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_command_panic_is_isolated() {
        let (exec, rx, _root) = executor(4);
        exec.execute(Some(Cmd::perform(|| panic!("bad command"))));
        exec.execute(Some(Cmd::perform(|| Some(Msg::User(7)))));
        exec.shutdown();
        let msgs: Vec<_> = rx.try_iter().collect();
        assert!(msgs
            .iter()
            .any(|m| matches!(m, Msg::Error(e) if e.fault().is_panic())));
        assert!(msgs.iter().any(|m| matches!(m, Msg::User(7))));
    }

    #[test]
    fn test_full_channel_drops() {
        let (exec, rx, _root) = executor(1);
        assert!(exec.deliver(Msg::User(1)));
        assert!(!exec.deliver(Msg::User(2)));
        assert_eq!(exec.stats().dropped, 1);
        assert_eq!(users(&rx), vec![1]);
    }

    #[test]
    fn test_cancelled_drops() {
        let (exec, rx, root) = executor(4);
        root.cancel();
        assert!(!exec.deliver(Msg::User(1)));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_tick_fires_once() {
        let (exec, rx, _root) = executor(4);
        exec.execute(Some(Cmd::tick(Duration::from_millis(10), Msg::Tick)));
        let msg = rx.recv_timeout(Duration::from_secs(2));
        assert!(matches!(msg, Ok(Msg::Tick(_))));
        exec.shutdown();
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_shutdown_wakes_pending_tick() {
        let (exec, rx, _root) = executor(4);
        exec.execute(Some(Cmd::tick(Duration::from_secs(30), Msg::Tick)));
        thread::sleep(Duration::from_millis(20));
        let start = Instant::now();
        exec.shutdown();
        assert!(start.elapsed() < Duration::from_secs(5));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_every_ticks_until_shutdown() {
        let (exec, rx, _root) = executor(64);
        exec.execute(Some(Cmd::every(Duration::from_millis(10), Msg::Tick)));
        thread::sleep(Duration::from_millis(100));
        assert_eq!(exec.active_recurring_timers(), 1);
        exec.shutdown();

        let seen = rx.try_iter().count();
        assert!(seen >= 5, "only {seen} ticks");
        assert_eq!(exec.active_timers(), 0);
        assert_eq!(exec.active_tasks(), 0);

        thread::sleep(Duration::from_millis(50));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_closed_executor_ignores_commands() {
        let (exec, rx, _root) = executor(4);
        exec.shutdown();
        assert!(exec.is_closed());
        exec.execute(Some(Cmd::perform(|| Some(Msg::User(1)))));
        exec.execute(Some(Cmd::every(Duration::from_millis(1), Msg::Tick)));
        thread::sleep(Duration::from_millis(20));
        assert!(rx.try_recv().is_err());
        assert_eq!(exec.active_tasks(), 0);
    }

    #[test]
    fn test_shutdown_timeout_gives_up() {
        let (exec, rx, _root) = executor(4);
        exec.execute(Some(Cmd::perform(|| {
            thread::sleep(Duration::from_millis(300));
            Some(Msg::User(1))
        })));
        assert!(!exec.shutdown_timeout(Duration::from_millis(20)));
        thread::sleep(Duration::from_millis(400));
        assert!(rx.try_recv().is_err());
        assert_eq!(exec.active_tasks(), 0);
    }
}
