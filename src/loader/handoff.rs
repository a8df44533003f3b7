//! Single-slot hand-off between the file reader and the loader.
//!
//! A zero-capacity channel: [`Producer::offer`] blocks until the consumer has
//! taken the item, so at most one record is in flight. There are no timeouts.
//! A producer that never offers or finishes keeps the consumer waiting;
//! cancellation only takes effect at the producer's next offer.

use std::ops::ControlFlow;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crossbeam_channel::{Receiver, Sender};

/// Cooperative cancellation flag shared by both ends and their owner.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Create both ends of a hand-off governed by `token`.
pub fn rendezvous<T>(token: CancellationToken) -> (Producer<T>, Consumer<T>) {
    let (tx, rx) = crossbeam_channel::bounded(0);
    (
        Producer {
            tx,
            token: token.clone(),
        },
        Consumer { rx, token },
    )
}

/// Sending end. Dropping it tells the consumer there is no more data.
#[derive(Debug)]
pub struct Producer<T> {
    tx: Sender<T>,
    token: CancellationToken,
}

impl<T> Producer<T> {
    /// Hand `item` to the consumer, blocking until it is taken.
    ///
    /// Breaks once the load is cancelled or the consumer is gone; the item is
    /// dropped in that case.
    pub fn offer(&self, item: T) -> ControlFlow<()> {
        if self.token.is_cancelled() {
            return ControlFlow::Break(());
        }
        match self.tx.send(item) {
            Ok(()) => ControlFlow::Continue(()),
            Err(_) => ControlFlow::Break(()),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Receiving end, consumed as an iterator.
#[derive(Debug)]
pub struct Consumer<T> {
    rx: Receiver<T>,
    token: CancellationToken,
}

impl<T> Consumer<T> {
    /// Ask the producer to stop. Later calls to `next` return `None`.
    pub fn cancel(&self) {
        self.token.cancel();
    }
}

impl<T> Iterator for Consumer<T> {
    type Item = T;

    /// Block until the producer offers an item. `None` means no more data:
    /// the producer finished, or the load was cancelled.
    fn next(&mut self) -> Option<T> {
        if self.token.is_cancelled() {
            return None;
        }
        self.rx.recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_items_arrive_in_order() {
        let (producer, consumer) = rendezvous(CancellationToken::new());
        let handle = thread::spawn(move || {
            for i in 0..5 {
                assert!(producer.offer(i).is_continue());
            }
        });
        assert_eq!(consumer.collect::<Vec<_>>(), [0, 1, 2, 3, 4]);
        handle.join().unwrap();
    }

    #[test]
    fn test_cancel_ends_the_stream() {
        let token = CancellationToken::new();
        let (producer, mut consumer) = rendezvous(token.clone());
        let handle = thread::spawn(move || {
            let mut sent = 0;
            while producer.offer(sent).is_continue() {
                sent += 1;
            }
            sent
        });

        assert_eq!(consumer.next(), Some(0));
        assert_eq!(consumer.next(), Some(1));
        consumer.cancel();
        assert!(token.is_cancelled());
        assert_eq!(consumer.next(), None);

        // A producer blocked in `offer` is released when the consumer goes away.
        drop(consumer);
        assert!(handle.join().unwrap() >= 2);
    }

    #[test]
    fn test_cancellation_unblocks_waiting_consumer() {
        let token = CancellationToken::new();
        let (producer, mut consumer) = rendezvous::<u32>(token.clone());

        // Simulates a reader between callbacks: it checks the flag and stops.
        let reader = thread::spawn(move || {
            while !producer.is_cancelled() {
                thread::sleep(Duration::from_millis(1));
            }
        });
        let canceller = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            token.cancel();
        });

        assert_eq!(consumer.next(), None);
        canceller.join().unwrap();
        reader.join().unwrap();
    }

    #[test]
    fn test_offer_after_consumer_dropped_breaks() {
        let (producer, consumer) = rendezvous(CancellationToken::new());
        drop(consumer);
        assert!(producer.offer(1).is_break());
    }
}
