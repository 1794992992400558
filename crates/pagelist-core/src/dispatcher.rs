//! Single-threaded task queue bound to the UI context.
//!
//! Background fetch tasks never touch adapter state directly. They hand
//! their results back through this queue, which the owning thread drains
//! with [`UiDispatcher::run_pending`]. Delivery is FIFO across plain tasks
//! and continuation invocations, and each continuation fires at most once.
//!
//! Continuations exist so that background threads can trigger UI-side work
//! without the closure itself being `Send`: the non-`Send` closure is
//! registered up front on the UI thread and keyed by a [`ContinuationId`];
//! the background thread only ships the id plus a `Send` payload.

use std::any::Any;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::sync::{Arc, Mutex};
use std::thread::{self, ThreadId};

use crate::collections::map::HashMap;

/// Identifies a one-shot continuation registered on a [`UiDispatcher`].
pub type ContinuationId = u64;

type UiTask = Box<dyn FnOnce() + Send>;
type Payload = Box<dyn Any + Send>;
type Continuation = Box<dyn FnOnce(Payload)>;

/// Host hook woken whenever work is posted to the queue.
///
/// An embedding event loop implements this to schedule a `run_pending` pass
/// (e.g. by requesting a frame). Must be safe to call from any thread.
pub trait WakeScheduler: Send + Sync {
    fn wake(&self);
}

enum QueueEntry {
    Task(UiTask),
    Invoke {
        id: ContinuationId,
        payload: Payload,
    },
}

struct SharedQueue {
    entries: Mutex<VecDeque<QueueEntry>>,
    scheduler: Mutex<Option<Arc<dyn WakeScheduler>>>,
}

impl SharedQueue {
    fn push(&self, entry: QueueEntry) {
        self.entries
            .lock()
            .expect("dispatcher queue poisoned")
            .push_back(entry);
        let scheduler = self
            .scheduler
            .lock()
            .expect("dispatcher scheduler poisoned")
            .clone();
        if let Some(scheduler) = scheduler {
            scheduler.wake();
        }
    }
}

#[derive(Default)]
struct ContinuationRegistry {
    slots: HashMap<ContinuationId, Continuation>,
    next_id: ContinuationId,
}

/// The UI-thread side of the queue.
///
/// Created on the owning thread; `run_pending` must only be called there.
/// Cloning is cheap and yields another UI-side view of the same queue.
#[derive(Clone)]
pub struct UiDispatcher {
    shared: Arc<SharedQueue>,
    registry: Rc<RefCell<ContinuationRegistry>>,
    owner: ThreadId,
}

/// The cross-thread side of the queue. `Clone + Send`, safe to move into
/// background tasks.
#[derive(Clone)]
pub struct DispatcherHandle {
    shared: Arc<SharedQueue>,
}

impl UiDispatcher {
    /// Creates a queue bound to the calling thread.
    pub fn new() -> Self {
        Self {
            shared: Arc::new(SharedQueue {
                entries: Mutex::new(VecDeque::new()),
                scheduler: Mutex::new(None),
            }),
            registry: Rc::new(RefCell::new(ContinuationRegistry::default())),
            owner: thread::current().id(),
        }
    }

    /// Returns a `Send` handle for posting from background threads.
    pub fn handle(&self) -> DispatcherHandle {
        DispatcherHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Installs the host wake hook. Replaces any previous hook.
    pub fn set_scheduler(&self, scheduler: Arc<dyn WakeScheduler>) {
        *self
            .shared
            .scheduler
            .lock()
            .expect("dispatcher scheduler poisoned") = Some(scheduler);
    }

    /// Registers a one-shot continuation and returns its id.
    ///
    /// The closure runs on the owning thread when a matching
    /// [`DispatcherHandle::post_invoke`] is drained, so it may freely capture
    /// `Rc`/`RefCell` state. It fires at most once.
    pub fn register_continuation<T, F>(&self, continuation: F) -> ContinuationId
    where
        T: Send + 'static,
        F: FnOnce(T) + 'static,
    {
        let mut registry = self.registry.borrow_mut();
        registry.next_id += 1;
        let id = registry.next_id;
        registry.slots.insert(
            id,
            Box::new(move |payload: Payload| match payload.downcast::<T>() {
                Ok(value) => continuation(*value),
                Err(_) => {
                    log::error!("continuation {} received a payload of the wrong type", id)
                }
            }),
        );
        id
    }

    /// Drops a registered continuation. A later `post_invoke` for the id is
    /// discarded silently.
    pub fn cancel_continuation(&self, id: ContinuationId) {
        self.registry.borrow_mut().slots.remove(&id);
    }

    /// Drains the queue in FIFO order on the owning thread.
    ///
    /// Returns the number of entries executed. Entries posted while draining
    /// are picked up in the same pass.
    pub fn run_pending(&self) -> usize {
        assert_eq!(
            thread::current().id(),
            self.owner,
            "UiDispatcher::run_pending called off the owning thread"
        );
        let mut executed = 0;
        loop {
            let entry = {
                let mut entries = self.shared.entries.lock().expect("dispatcher queue poisoned");
                entries.pop_front()
            };
            let Some(entry) = entry else { break };
            executed += 1;
            match entry {
                QueueEntry::Task(task) => task(),
                QueueEntry::Invoke { id, payload } => {
                    let slot = self.registry.borrow_mut().slots.remove(&id);
                    match slot {
                        Some(continuation) => continuation(payload),
                        None => log::debug!("continuation {} was cancelled before delivery", id),
                    }
                }
            }
        }
        executed
    }

    /// Number of queued entries not yet drained.
    pub fn pending(&self) -> usize {
        self.shared
            .entries
            .lock()
            .expect("dispatcher queue poisoned")
            .len()
    }
}

impl Default for UiDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl DispatcherHandle {
    /// Posts a task to run on the owning thread.
    pub fn post(&self, task: impl FnOnce() + Send + 'static) {
        self.shared.push(QueueEntry::Task(Box::new(task)));
    }

    /// Delivers `value` to the continuation registered under `id`.
    ///
    /// The continuation runs on the owning thread during the next drain,
    /// exactly once; if it was cancelled the payload is dropped.
    pub fn post_invoke<T: Send + 'static>(&self, id: ContinuationId, value: T) {
        self.shared.push(QueueEntry::Invoke {
            id,
            payload: Box::new(value),
        });
    }
}
