use std::cell::{Cell, RefCell};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

#[derive(Default)]
struct Inner {
    edges: Cell<u64>,
    waiters: RefCell<Vec<Waker>>,
}

/// Shared rising-edge notifier. Cloning hands out another handle to the
/// same clock.
#[derive(Clone, Default)]
pub struct Clock(Rc<Inner>);

impl Clock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rising edges so far.
    pub fn edges(&self) -> u64 {
        self.0.edges.get()
    }

    /// Resolves on the next rising edge after the call.
    pub fn rising_edge(&self) -> RisingEdge {
        RisingEdge {
            clock: self.clone(),
            target: self.edges() + 1,
        }
    }

    pub async fn cycles(&self, n: u64) {
        for _ in 0..n {
            self.rising_edge().await;
        }
    }

    /// Advance one edge and wake everyone parked on it. Kernel only.
    pub(super) fn tick(&self) {
        self.0.edges.set(self.0.edges.get() + 1);
        for w in self.0.waiters.take() {
            w.wake();
        }
    }
}

pub struct RisingEdge {
    clock: Clock,
    target: u64,
}

impl Future for RisingEdge {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.clock.edges() >= self.target {
            Poll::Ready(())
        } else {
            self.clock.0.waiters.borrow_mut().push(cx.waker().clone());
            Poll::Pending
        }
    }
}
