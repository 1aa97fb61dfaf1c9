// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Hand-off of notifications to another execution context.

use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};

/// Unit of work posted to a dispatcher.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Runs posted tasks on some execution context other than the caller's.
pub trait Dispatcher: Send + Sync {
    fn post(&self, task: Task);
}

/// Tasks run on the runtime's blocking pool, so listeners may block.
impl Dispatcher for tokio::runtime::Handle {
    fn post(&self, task: Task) {
        drop(self.spawn_blocking(task));
    }
}

/// Creates a task queue whose tasks run on whichever thread drives the
/// returned runner, typically an application's main or UI thread.
pub fn task_queue() -> (TaskQueue, TaskQueueRunner) {
    let (sender, receiver) = crossbeam_channel::unbounded();
    (TaskQueue { sender }, TaskQueueRunner { receiver })
}

/// Posting side of a task queue.
#[derive(Clone)]
pub struct TaskQueue {
    sender: Sender<Task>,
}

impl Dispatcher for TaskQueue {
    fn post(&self, task: Task) {
        if self.sender.send(task).is_err() {
            tracing::warn!("Task queue runner is gone, dropping posted task");
        }
    }
}

/// Draining side of a task queue.
pub struct TaskQueueRunner {
    receiver: Receiver<Task>,
}

impl TaskQueueRunner {
    /// Runs every task already queued and returns how many ran.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        for task in self.receiver.try_iter() {
            task();
            ran += 1;
        }
        ran
    }

    /// Waits up to `timeout` for one task and runs it.
    ///
    /// Returns `false` on timeout or once every [`TaskQueue`] is dropped.
    pub fn run_one(&self, timeout: Duration) -> bool {
        match self.receiver.recv_timeout(timeout) {
            Ok(task) => {
                task();
                true
            }
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => false,
        }
    }

    /// Runs tasks until every [`TaskQueue`] handle has been dropped.
    pub fn run_until_disconnected(&self) {
        for task in self.receiver.iter() {
            task();
        }
    }

    pub fn pending(&self) -> usize {
        self.receiver.len()
    }
}
