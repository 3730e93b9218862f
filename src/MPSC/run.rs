// Consumer side of the unbounded queue: the dequeue run and chunk reclamation.

use std::mem;
use std::sync::atomic::Ordering::Acquire;

use super::queue::Shared;
use super::skipped::{SkipFifo, SkippedSlot};
use super::Chunk::ChunkRef;
use crate::Core::alloc::BlockSource;
use crate::Core::fatal::fatal;

/// Everything only the consumer touches.
pub(crate) struct RunState<T> {
    /// Id of the next slot the forward scan looks at.
    pub(crate) head_counter: u64,
    /// End of the current run.
    pub(crate) last_known_tail: u64,
    /// Chunk holding `head_counter`, or the one right before it.
    pub(crate) head: ChunkRef<T>,
    /// Oldest chunk that may still have predecessors to give back.
    pub(crate) release_head: ChunkRef<T>,
    /// Slots skipped during the current run, in id order.
    pub(crate) skipped: SkipFifo<T>,
    /// Slots skipped in an earlier run, checked before scanning forward.
    /// Every id in here is above every id in `skipped`.
    pub(crate) retry: SkipFifo<T>,
}

impl<T> RunState<T> {
    pub(crate) fn new(first: ChunkRef<T>, skipped: SkipFifo<T>, retry: SkipFifo<T>) -> Self {
        Self {
            head_counter: 0,
            last_known_tail: 0,
            head: first,
            release_head: first,
            skipped,
            retry,
        }
    }

    /// Lowest slot id the consumer may still read.
    fn least_busy_slot(&self) -> u64 {
        match self.retry.front() {
            Some(pending) => pending.id.min(self.head_counter),
            None => self.head_counter,
        }
    }

    /// Take the lowest skipped slot that has been written since.
    ///
    /// Called after a later slot was seen written. If that slot's producer
    /// also owns a skipped one, the acquire load made the earlier write
    /// visible, so the earlier item comes out first.
    ///
    /// # Safety
    /// Consumer only.
    unsafe fn take_earliest_skipped<S: BlockSource>(&mut self, source: &S) -> Option<Box<T>> {
        let pending = self
            .skipped
            .take_first(source, |pending| pending.chunk.is_written(pending.index))?;
        pending.chunk.take(pending.index)
    }
}

impl<T, S: BlockSource> Shared<T, S> {
    /// Take the next available item, `None` if nothing is ready right now.
    ///
    /// Slots whose producer has not finished writing are remembered and
    /// retried on later calls, so one slow producer never blocks the others.
    /// A call swaps in the skipped set for retry at most once, which bounds
    /// it even while a producer sits between reserving and writing its slot.
    ///
    /// # Safety
    /// Only one thread at a time may call this.
    pub(crate) unsafe fn dequeue(&self) -> Option<Box<T>> {
        let run = &mut *self.run.get();
        let mut swapped = false;

        loop {
            while let Some(SkippedSlot { chunk, index, .. }) = run.retry.front() {
                if !chunk.is_written(index) {
                    if let Some(pending) = run.retry.pop_front(&self.source) {
                        run.skipped.push_back(&self.source, pending);
                    }
                    continue;
                }
                let item = match run.take_earliest_skipped(&self.source) {
                    Some(item) => item,
                    None => {
                        run.retry.pop_front(&self.source);
                        Self::take_written(chunk, index)
                    }
                };
                self.after_take(run);
                return Some(item);
            }

            loop {
                if run.head_counter == run.last_known_tail {
                    // End of the run.
                    run.last_known_tail = self.tail_counter.load(Acquire);
                    if !run.skipped.is_empty() {
                        break;
                    }
                    if run.head_counter == run.last_known_tail {
                        return None;
                    }
                }

                let mut index = (run.head_counter - run.head.start_slot()) as usize;
                if index == self.slots_per_chunk {
                    match run.head.next() {
                        Some(next) => {
                            run.head = next;
                            index = 0;
                        }
                        // Reserved, but its chunk is not linked yet.
                        None if run.skipped.is_empty() => return None,
                        None => break,
                    }
                }

                let id = run.head_counter;
                if run.head.is_written(index) {
                    let item = match run.take_earliest_skipped(&self.source) {
                        // The head slot stays for the next call.
                        Some(item) => item,
                        None => {
                            run.head_counter += 1;
                            Self::take_written(run.head, index)
                        }
                    };
                    self.after_take(run);
                    return Some(item);
                }

                run.head_counter += 1;
                run.skipped.push_back(
                    &self.source,
                    SkippedSlot {
                        chunk: run.head,
                        index,
                        id,
                    },
                );
            }

            if swapped {
                return None;
            }
            swapped = true;
            mem::swap(&mut run.skipped, &mut run.retry);
        }
    }

    unsafe fn take_written(chunk: ChunkRef<T>, index: usize) -> Box<T> {
        match chunk.take(index) {
            Some(item) => item,
            None => fatal(format_args!("written slot {index} emptied under the consumer")),
        }
    }

    fn after_take(&self, run: &mut RunState<T>) {
        // Skipped slots are not covered by the least busy slot.
        if run.skipped.is_empty() {
            self.reclaim(run);
        }
    }

    /// Give back at most one chunk that no producer or consumer can reach.
    ///
    /// A chunk's predecessors are unreachable once every slot still in flight
    /// was reserved after the chunk became the tail, which is what its release
    /// counter records. A counter of zero is not stamped yet.
    fn reclaim(&self, run: &mut RunState<T>) {
        let least = run.least_busy_slot();

        loop {
            let release_head = run.release_head;

            if let Some(prev) = release_head.prev() {
                let release_counter = release_head.release_counter().load(Acquire);
                if release_counter == 0 || least < release_counter {
                    return;
                }
                release_head.set_prev(prev.prev());
                // Safety: by the release counter check, nobody holds `prev`.
                unsafe { self.free_chunk(prev) };
                return;
            }

            if release_head == run.head {
                return;
            }
            match release_head.next() {
                Some(next) => run.release_head = next,
                None => return,
            }
        }
    }
}
