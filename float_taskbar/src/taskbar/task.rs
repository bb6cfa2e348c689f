//! Cooperative building blocks for the single-threaded engine: one-shot
//! completions for scroll and animation requests, a cancel-and-replace
//! debounce, and generation tokens for staleness checks on resume.

use crossbeam_channel::{bounded, Receiver, Sender, TryRecvError};
use std::time::{Duration, Instant};

pub struct Completer {
    tx: Sender<bool>,
}

impl Completer {
    pub fn complete(self, finished: bool) {
        let _ = self.tx.send(finished);
    }
}

/// Awaitable outcome of a request issued to a collaborator. `true` means the
/// request ran to the end; `false` means it was superseded.
#[derive(Debug)]
pub struct Completion {
    rx: Receiver<bool>,
}

pub fn completion() -> (Completer, Completion) {
    let (tx, rx) = bounded(1);
    (Completer { tx }, Completion { rx })
}

impl Completion {
    pub fn ready(finished: bool) -> Self {
        let (completer, completion) = completion();
        completer.complete(finished);
        completion
    }

    pub fn poll(&self) -> Option<bool> {
        match self.rx.try_recv() {
            Ok(finished) => Some(finished),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(false),
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Debounce {
    deadline: Option<Instant>,
}

impl Debounce {
    pub fn schedule(&mut self, now: Instant, delay: Duration) {
        self.deadline = Some(now + delay);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_scheduled(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn take_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Generation(u64);

impl Generation {
    pub fn bump(&mut self) -> u64 {
        self.0 += 1;
        self.0
    }

    pub fn is_current(&self, token: u64) -> bool {
        self.0 == token
    }
}
