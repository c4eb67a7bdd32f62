//! Lock-free publish-once/read-many snapshot slot, used for the latest
//! trajectory (planner writes, controller+safety read) and anywhere else
//! the concurrency model calls for an atomic handle swap rather than a
//! lock held across a task body (§5: "never a partially written [value];
//! publish is atomic handle-swap").

use std::sync::Arc;

use arc_swap::ArcSwap;

pub struct Snapshot<T> {
    slot: ArcSwap<T>,
}

impl<T> Snapshot<T> {
    pub fn new(initial: T) -> Self {
        Self { slot: ArcSwap::from_pointee(initial) }
    }

    /// Atomically publish a new value. Readers observe either the
    /// previous value or this one in full, never a partial write.
    pub fn publish(&self, value: T) {
        self.slot.store(Arc::new(value));
    }

    /// Load the current value without blocking the writer.
    pub fn load(&self) -> Arc<T> {
        self.slot.load_full()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_then_load_returns_latest() {
        let s = Snapshot::new(1);
        assert_eq!(*s.load(), 1);
        s.publish(2);
        assert_eq!(*s.load(), 2);
    }

    #[test]
    fn concurrent_readers_see_a_consistent_value() {
        let s = Arc::new(Snapshot::new(vec![0u8; 4]));
        let s2 = s.clone();
        let handle = std::thread::spawn(move || {
            for _ in 0..100 {
                let v = s2.load();
                assert!(v.len() == 4 || v.len() == 8);
            }
        });
        for i in 0..100 {
            s.publish(vec![i as u8; if i % 2 == 0 { 4 } else { 8 }]);
        }
        handle.join().unwrap();
    }
}
