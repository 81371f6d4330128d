use std::cell::Cell;
use std::time::{Duration, Instant};

/// How often the clock is read, in memo computations. The first
/// computation always reads it.
const CLOCK_INTERVAL: u32 = 256;

/// Cooperative time and memory limits shared by every search of one parse.
#[derive(Debug)]
pub struct Budget {
    deadline: Option<Instant>,
    max_bytes: Option<usize>,
    used_bytes: Cell<usize>,
    ticks: Cell<u32>,
    timer_expired: Cell<bool>,
    memory_exhausted: Cell<bool>,
}

impl Budget {
    pub fn new(max_time: Option<Duration>, max_bytes: Option<usize>) -> Self {
        Self {
            deadline: max_time.map(|t| Instant::now() + t),
            max_bytes,
            used_bytes: Cell::new(0),
            ticks: Cell::new(0),
            timer_expired: Cell::new(false),
            memory_exhausted: Cell::new(false),
        }
    }

    pub fn unlimited() -> Self {
        Self::new(None, None)
    }

    /// Called before each new computation; false once either limit is hit.
    pub fn tick(&self) -> bool {
        if self.exhausted() {
            return false;
        }
        let ticks = self.ticks.get().wrapping_add(1);
        self.ticks.set(ticks);
        if ticks % CLOCK_INTERVAL == 1 {
            if let Some(deadline) = self.deadline {
                if Instant::now() >= deadline {
                    self.timer_expired.set(true);
                    return false;
                }
            }
        }
        true
    }

    /// Records `bytes` of new table storage; false if that crosses the memory limit.
    pub fn charge(&self, bytes: usize) -> bool {
        let used = self.used_bytes.get().saturating_add(bytes);
        self.used_bytes.set(used);
        match self.max_bytes {
            Some(max) if used > max => {
                self.memory_exhausted.set(true);
                false
            }
            _ => true,
        }
    }

    pub fn exhausted(&self) -> bool {
        self.timer_expired.get() || self.memory_exhausted.get()
    }

    pub fn timer_expired(&self) -> bool {
        self.timer_expired.get()
    }

    pub fn memory_exhausted(&self) -> bool {
        self.memory_exhausted.get()
    }

    pub fn used_bytes(&self) -> usize {
        self.used_bytes.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_limit() {
        let budget = Budget::new(None, Some(100));
        assert!(budget.charge(60));
        assert!(!budget.charge(60));
        assert!(budget.memory_exhausted());
        assert!(!budget.tick());
    }

    #[test]
    fn test_zero_time_expires() {
        let budget = Budget::new(Some(Duration::ZERO), None);
        let mut ran = 0;
        while budget.tick() {
            ran += 1;
        }
        assert!(budget.timer_expired());
        assert_eq!(ran, 0);
    }

    #[test]
    fn test_unlimited_never_expires() {
        let budget = Budget::unlimited();
        for _ in 0..(CLOCK_INTERVAL * 4) {
            assert!(budget.tick());
        }
        assert!(budget.charge(usize::MAX));
    }
}
