// Intrusive MPSC queue with a single atomic tail swap per enqueue.
//
// Simpler than the chunked queue and unbounded too, but it allocates a node
// per item and a producer preempted between its swap and its link hides every
// later item from the consumer until it resumes.

use std::cell::UnsafeCell;
use std::ptr;
use std::sync::atomic::AtomicPtr;
use std::sync::Arc;
use std::sync::atomic::Ordering::{AcqRel, Acquire, Relaxed, Release};

use crossbeam_utils::CachePadded;
use tracing::debug;


struct Node<T> {
    next: AtomicPtr<Node<T>>,
    /// `None` only in the stub the consumer currently stands on.
    payload: Option<T>,
}

impl<T> Node<T> {
    fn boxed(payload: Option<T>) -> *mut Self {
        Box::into_raw(Box::new(Self {
            next: AtomicPtr::new(ptr::null_mut()),
            payload,
        }))
    }
}

struct TailSwap<T> {
    tail: CachePadded<AtomicPtr<Node<T>>>,
    /// Consumer only. Always a node whose payload was already taken.
    head: UnsafeCell<*mut Node<T>>,
}

unsafe impl<T: Send> Send for TailSwap<T> {}
unsafe impl<T: Send> Sync for TailSwap<T> {}

impl<T> TailSwap<T> {
    fn new() -> Self {
        let stub = Node::boxed(None);
        Self {
            tail: CachePadded::new(AtomicPtr::new(stub)),
            head: UnsafeCell::new(stub),
        }
    }

    fn enqueue(&self, item: T) {
        let node = Node::boxed(Some(item));
        let prev = self.tail.swap(node, AcqRel);
        // Safety: `prev` stays alive until the consumer moves past it, which
        // needs the link we are about to store.
        unsafe { (*prev).next.store(node, Release) };
    }

    /// # Safety
    /// Only one thread at a time may call this.
    unsafe fn dequeue(&self) -> Option<T> {
        let head = *self.head.get();
        let next = (*head).next.load(Acquire);
        if next.is_null() {
            return None;
        }
        drop(Box::from_raw(head));
        *self.head.get() = next;
        (*next).payload.take()
    }
}

impl<T> Drop for TailSwap<T> {
    fn drop(&mut self) {
        let mut undelivered = 0usize;
        let mut link = *self.head.get_mut();
        while !link.is_null() {
            // Safety: no handles remain, every node is owned by the list.
            let node = unsafe { Box::from_raw(link) };
            link = node.next.load(Relaxed);
            undelivered += usize::from(node.payload.is_some());
        }
        debug!(undelivered, "tail swap queue dropped");
    }
}

/// Sending half of a tail swap queue. Cloneable.
pub struct TailSwapProducer<T> {
    inner: Arc<TailSwap<T>>,
}

impl<T> TailSwapProducer<T> {
    pub fn enqueue(&self, item: T) {
        self.inner.enqueue(item);
    }
}

impl<T> Clone for TailSwapProducer<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Receiving half of a tail swap queue.
pub struct TailSwapConsumer<T> {
    inner: Arc<TailSwap<T>>,
}

impl<T> TailSwapConsumer<T> {
    /// `None` when empty, or when the next producer has swapped the tail but
    /// not linked its node yet.
    pub fn dequeue(&mut self) -> Option<T> {
        // Safety: `&mut self` on the only consumer handle.
        unsafe { self.inner.dequeue() }
    }
}

/// Create an intrusive tail swap queue.
pub fn tail_swap<T>() -> (TailSwapProducer<T>, TailSwapConsumer<T>) {
    let inner = Arc::new(TailSwap::new());
    (
        TailSwapProducer {
            inner: Arc::clone(&inner),
        },
        TailSwapConsumer { inner },
    )
}
