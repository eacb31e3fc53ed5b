//! Blocking wait coordination.
//!
//! The dispatch thread owns a [`WaitCoordinator`]; any thread may hold a
//! [`WaitHandle`] to break a wait in progress or queue work for the dispatch
//! thread.

use crate::host::{EventMask, HostWaker, HostWindowing, ModalSession, NativeEvent, NativeEventKind};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

type Callback = Box<dyn FnOnce() + Send>;

struct WaitShared {
    callbacks: Mutex<Vec<Callback>>,
    in_blocking_wait: AtomicBool,
    wake_posted: AtomicBool,
    waker: Arc<dyn HostWaker>,
}

impl WaitShared {
    fn callbacks(&self) -> MutexGuard<'_, Vec<Callback>> {
        self.callbacks.lock().unwrap_or_else(|poisoned: PoisonError<_>| {
            tracing::error!("callback queue lock poisoned; recovering");
            poisoned.into_inner()
        })
    }
}

/// Cloneable, thread-safe handle to the wait loop.
#[derive(Clone)]
pub struct WaitHandle {
    shared: Arc<WaitShared>,
}

impl WaitHandle {
    /// Wake the current or next wait. Posts at most one wake event until the
    /// next wait begins.
    pub fn break_wait(&self) {
        if !self.shared.wake_posted.swap(true, Ordering::AcqRel) {
            tracing::trace!("posting wake event");
            self.shared.waker.post_wake_event();
        }
    }

    /// Queue `callback` to run on the dispatch thread before it looks at the
    /// next native event.
    pub fn schedule_callback<F>(&self, callback: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.shared.callbacks().push(Box::new(callback));
        self.break_wait();
    }

    pub fn is_in_blocking_wait(&self) -> bool {
        self.shared.in_blocking_wait.load(Ordering::Acquire)
    }

    pub fn pending_callbacks(&self) -> usize {
        self.shared.callbacks().len()
    }
}

pub struct WaitCoordinator {
    shared: Arc<WaitShared>,
    observer_installed: bool,
    last_mouse_event: Option<NativeEvent>,
}

impl WaitCoordinator {
    pub fn new(waker: Arc<dyn HostWaker>) -> Self {
        Self {
            shared: Arc::new(WaitShared {
                callbacks: Mutex::new(Vec::new()),
                in_blocking_wait: AtomicBool::new(false),
                wake_posted: AtomicBool::new(false),
                waker,
            }),
            observer_installed: false,
            last_mouse_event: None,
        }
    }

    pub fn handle(&self) -> WaitHandle {
        WaitHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Run every queued callback in order. The queue lock is not held while
    /// they run, so callbacks may schedule more work for the next cycle.
    ///
    /// The wake flag is cleared together with the drain: anything queued after
    /// this point posts a fresh wake event.
    pub fn run_pending_callbacks(&self) -> usize {
        let pending = {
            let mut queue = self.shared.callbacks();
            self.shared.wake_posted.store(false, Ordering::Release);
            std::mem::take(&mut *queue)
        };
        let count = pending.len();
        for callback in pending {
            callback();
        }
        count
    }

    /// Wait up to `duration` for the next event. With `blocking` set only
    /// application-defined events are dequeued; anything else arriving breaks
    /// the wait through the host observer.
    pub fn wait(
        &mut self,
        host: &mut dyn HostWindowing,
        session: Option<ModalSession>,
        duration: Duration,
        blocking: bool,
    ) -> Option<NativeEvent> {
        let ran = self.run_pending_callbacks();
        if ran > 0 {
            tracing::trace!(ran, "ran scheduled callbacks");
        }

        if !self.observer_installed {
            let handle = self.handle();
            host.set_wait_observer(Box::new(move || {
                if handle.is_in_blocking_wait() {
                    handle.break_wait();
                }
            }));
            self.observer_installed = true;
        }

        self.shared.in_blocking_wait.store(true, Ordering::Release);
        let mask = if blocking {
            EventMask::ApplicationDefined
        } else {
            EventMask::Any
        };
        let event = host.next_event(duration, mask);
        if let Some(session) = session {
            host.run_modal_session(session);
        }
        self.shared.in_blocking_wait.store(false, Ordering::Release);

        if let Some(event) = &event {
            match event.kind {
                NativeEventKind::MouseDown { .. } | NativeEventKind::MouseDragged { .. } => {
                    self.last_mouse_event = Some(event.clone());
                }
                NativeEventKind::MouseUp { .. } => self.last_mouse_event = None,
                _ => {}
            }
        }
        event
    }

    /// The press or drag event of the gesture in progress, if any.
    pub fn last_mouse_event(&self) -> Option<&NativeEvent> {
        self.last_mouse_event.as_ref()
    }

    pub fn is_in_blocking_wait(&self) -> bool {
        self.shared.in_blocking_wait.load(Ordering::Acquire)
    }

    pub fn pending_callbacks(&self) -> usize {
        self.shared.callbacks().len()
    }
}
