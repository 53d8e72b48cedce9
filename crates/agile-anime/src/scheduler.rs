//! Frame scheduling contract.
//!
//! Steps never own a clock. They ask the host for a callback on the next
//! display frame and receive the frame timestamp (milliseconds) when it fires.

use std::cell::{Cell, RefCell};
use std::fmt;

use tracing::trace;

/// Callback run once on a future frame with the frame timestamp.
pub type FrameCallback = Box<dyn FnOnce(f64)>;

/// Identifies a pending frame request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub u64);

/// Host frame source (`requestAnimationFrame`-like).
pub trait FrameScheduler {
    /// Run `callback` on the next frame.
    fn request_frame(&self, callback: FrameCallback) -> FrameHandle;

    /// Drop a pending request. Unknown or already-run handles are ignored.
    fn cancel_frame(&self, handle: FrameHandle);

    /// Current host time in milliseconds.
    fn now(&self) -> f64;
}

/// Deterministic scheduler driven explicitly by the host or a test.
///
/// Callbacks requested while a tick is running are deferred to the next tick.
#[derive(Default)]
pub struct ManualScheduler {
    pending: RefCell<Vec<(FrameHandle, FrameCallback)>>,
    now: Cell<f64>,
    next_id: Cell<u64>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the clock to `timestamp` and run every callback pending before
    /// this call. Returns how many callbacks ran.
    pub fn tick(&self, timestamp: f64) -> usize {
        self.now.set(timestamp);
        let due = std::mem::take(&mut *self.pending.borrow_mut());
        let count = due.len();
        trace!(timestamp, count, "frame tick");
        for (_, callback) in due {
            callback(timestamp);
        }
        count
    }

    /// Move the clock forward by `delta` and tick.
    pub fn advance(&self, delta: f64) -> usize {
        self.tick(self.now.get() + delta)
    }

    /// Number of outstanding frame requests.
    pub fn pending(&self) -> usize {
        self.pending.borrow().len()
    }
}

impl FrameScheduler for ManualScheduler {
    fn request_frame(&self, callback: FrameCallback) -> FrameHandle {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        let handle = FrameHandle(id);
        self.pending.borrow_mut().push((handle, callback));
        handle
    }

    fn cancel_frame(&self, handle: FrameHandle) {
        self.pending.borrow_mut().retain(|(h, _)| *h != handle);
    }

    fn now(&self) -> f64 {
        self.now.get()
    }
}

impl fmt::Debug for ManualScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManualScheduler")
            .field("pending", &self.pending())
            .field("now", &self.now.get())
            .finish()
    }
}
