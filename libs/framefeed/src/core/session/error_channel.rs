// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Single reporting path for data-plane failures.
//!
//! A processing error may surface when a packet is submitted, when an output
//! is delivered, or only at drain time. All of them end up here: delivered to
//! the registered listener (directly or through a dispatcher), or logged when
//! nobody listens.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::core::FrameFeedError;
use crate::core::dispatch::Dispatcher;

/// Receives failures reported by a session.
pub trait ErrorListener: Send + Sync {
    fn on_error(&self, error: FrameFeedError);
}

impl<T> ErrorListener for T
where
    T: Fn(FrameFeedError) + Send + Sync,
{
    fn on_error(&self, error: FrameFeedError) {
        self(error)
    }
}

#[derive(Clone)]
struct Route {
    listener: Arc<dyn ErrorListener>,
    dispatcher: Option<Arc<dyn Dispatcher>>,
}

pub struct ErrorChannel {
    route: RwLock<Option<Route>>,
}

impl ErrorChannel {
    pub fn new() -> Self {
        Self {
            route: RwLock::new(None),
        }
    }

    /// Installs or clears the listener. With a dispatcher, notifications are
    /// posted to it instead of running on the detecting thread.
    pub fn set_listener(
        &self,
        listener: Option<Arc<dyn ErrorListener>>,
        dispatcher: Option<Arc<dyn Dispatcher>>,
    ) {
        *self.route.write() = listener.map(|listener| Route {
            listener,
            dispatcher,
        });
    }

    pub fn has_listener(&self) -> bool {
        self.route.read().is_some()
    }

    /// Delivers `error` to the listener, or logs it if none is registered.
    ///
    /// Returns whether a listener took the error.
    pub fn report(&self, error: FrameFeedError) -> bool {
        // Clone the route out so the listener never runs under our lock.
        let route = self.route.read().clone();
        match route {
            None => {
                tracing::error!("Graph error: {}", error);
                false
            }
            Some(Route {
                listener,
                dispatcher: None,
            }) => {
                listener.on_error(error);
                true
            }
            Some(Route {
                listener,
                dispatcher: Some(dispatcher),
            }) => {
                dispatcher.post(Box::new(move || listener.on_error(error)));
                true
            }
        }
    }
}

impl Default for ErrorChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::dispatch::task_queue;
    use parking_lot::Mutex;

    fn recording_listener() -> (Arc<dyn ErrorListener>, Arc<Mutex<Vec<String>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let listener: Arc<dyn ErrorListener> =
            Arc::new(move |error: FrameFeedError| sink.lock().push(error.to_string()));
        (listener, seen)
    }

    #[test]
    fn test_report_without_listener_is_logged() {
        let channel = ErrorChannel::new();
        assert!(!channel.has_listener());
        assert!(!channel.report(FrameFeedError::Graph("dropped".into())));
    }

    #[test]
    fn test_report_direct_runs_inline() {
        let channel = ErrorChannel::new();
        let (listener, seen) = recording_listener();
        channel.set_listener(Some(listener), None);

        assert!(channel.report(FrameFeedError::Graph("inline".into())));
        assert_eq!(*seen.lock(), vec!["Graph error: inline".to_string()]);
    }

    #[test]
    fn test_report_with_dispatcher_defers_until_run() {
        let channel = ErrorChannel::new();
        let (listener, seen) = recording_listener();
        let (queue, runner) = task_queue();
        channel.set_listener(Some(listener), Some(Arc::new(queue)));

        assert!(channel.report(FrameFeedError::Graph("posted".into())));
        assert!(seen.lock().is_empty());

        assert_eq!(runner.run_pending(), 1);
        assert_eq!(seen.lock().len(), 1);
    }

    #[test]
    fn test_clearing_listener_restores_logging() {
        let channel = ErrorChannel::new();
        let (listener, seen) = recording_listener();
        channel.set_listener(Some(listener), None);
        channel.set_listener(None, None);

        assert!(!channel.report(FrameFeedError::Graph("logged".into())));
        assert!(seen.lock().is_empty());
    }

    #[test]
    fn test_listener_may_replace_itself() {
        let channel = Arc::new(ErrorChannel::new());
        let inner = Arc::clone(&channel);
        let listener: Arc<dyn ErrorListener> = Arc::new(move |_error: FrameFeedError| {
            inner.set_listener(None, None);
        });
        channel.set_listener(Some(listener), None);

        assert!(channel.report(FrameFeedError::Graph("once".into())));
        assert!(!channel.has_listener());
    }
}
