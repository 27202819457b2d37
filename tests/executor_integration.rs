//! Executor behavior seen from outside a program.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use bubblegum::runtime::CommandResult;
use bubblegum::{CancelToken, Cmd, Command, Executor, Logger, Msg};
use crossbeam_channel::{bounded, Receiver};

fn executor(capacity: usize) -> (Executor<u32>, Receiver<Msg<u32>>, CancelToken) {
    let (tx, rx) = bounded(capacity);
    let parent = CancelToken::new();
    let exec = Executor::new(tx, &parent, Logger::disabled());
    (exec, rx, parent)
}

fn user(msg: Msg<u32>) -> Option<u32> {
    match msg {
        Msg::User(n) => Some(n),
        _ => None,
    }
}

/// A command that sums a range on a worker thread.
struct Sum {
    upto: u32,
}

impl Command<u32> for Sum {
    fn run(self: Box<Self>) -> CommandResult<u32> {
        Ok(Some(Msg::User((1..=self.upto).sum())))
    }
}

#[test]
fn custom_command_types_run() {
    let (exec, rx, _parent) = executor(4);
    exec.execute(Some(Cmd::new(Sum { upto: 10 })));
    let got = rx.recv_timeout(Duration::from_secs(5)).ok().and_then(user);
    assert_eq!(got, Some(55));
    exec.shutdown();
}

#[test]
fn commands_can_schedule_more_commands() {
    let (exec, rx, _parent) = executor(16);
    let inner = exec.clone();
    exec.execute(Some(Cmd::perform(move || {
        inner.execute(Cmd::batch((0..3).map(|n| Cmd::message(Msg::User(n)))));
        Some(Msg::User(100))
    })));

    let mut seen: Vec<u32> = (0..4)
        .filter_map(|_| rx.recv_timeout(Duration::from_secs(5)).ok().and_then(user))
        .collect();
    seen.sort_unstable();
    assert_eq!(seen, vec![0, 1, 2, 100]);
    exec.shutdown();
}

#[test]
fn shutdown_waits_for_running_commands() {
    let (exec, rx, _parent) = executor(4);
    let finished = Arc::new(AtomicUsize::new(0));
    let flag = Arc::clone(&finished);
    exec.execute(Some(Cmd::perform(move || {
        thread::sleep(Duration::from_millis(50));
        flag.fetch_add(1, Ordering::SeqCst);
        Some(Msg::User(1))
    })));

    exec.shutdown();
    assert_eq!(finished.load(Ordering::SeqCst), 1);
    assert_eq!(exec.active_tasks(), 0);
    assert_eq!(rx.try_recv().ok().and_then(user), Some(1));
}

#[test]
fn parent_cancel_stops_timers_and_deliveries() {
    let (exec, rx, parent) = executor(64);
    exec.execute(Some(Cmd::every(Duration::from_millis(2), |_| Msg::User(7))));
    assert!(rx.recv_timeout(Duration::from_secs(5)).is_ok());

    parent.cancel();
    let started = Instant::now();
    exec.shutdown();
    assert!(started.elapsed() < Duration::from_secs(1));
    assert!(exec.cancel_token().is_cancelled());
    assert_eq!(exec.active_recurring_timers(), 0);

    while rx.try_recv().is_ok() {}
    assert!(!exec.deliver(Msg::User(8)));
    assert!(rx.try_recv().is_err());
}

#[test]
fn stragglers_after_timeout_are_dropped() {
    let (exec, rx, _parent) = executor(4);
    exec.execute(Some(Cmd::perform(|| {
        thread::sleep(Duration::from_millis(200));
        Some(Msg::User(9))
    })));

    assert!(!exec.shutdown_timeout(Duration::from_millis(10)));
    assert!(exec.is_closed());
    thread::sleep(Duration::from_millis(300));
    assert!(rx.try_recv().is_err());
    assert!(exec.stats().dropped >= 1);
}

#[test]
fn cancel_during_a_slow_command_drops_its_message() {
    let (exec, rx, parent) = executor(4);
    exec.execute(Some(Cmd::perform(|| {
        thread::sleep(Duration::from_millis(100));
        Some(Msg::User(3))
    })));

    thread::sleep(Duration::from_millis(10));
    parent.cancel();
    exec.shutdown();

    assert_eq!(exec.active_tasks(), 0);
    assert!(rx.try_recv().is_err());
    assert_eq!(exec.stats().delivered, 0);
    assert_eq!(exec.stats().dropped, 1);
}
