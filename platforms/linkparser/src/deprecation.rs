use std::collections::HashMap;
use std::panic::Location;
use std::sync::Mutex;

use log::warn;

/// Counts calls to deprecated methods per call site and warns on the first one.
#[derive(Debug, Default)]
pub struct DeprecationTracker {
    seen: Mutex<HashMap<String, usize>>,
}

impl DeprecationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a call to `method` from `caller`; returns how often that site has called it.
    pub fn record(&self, method: &str, caller: &Location<'_>) -> usize {
        let site = format!("{}:{}", caller.file(), caller.line());
        let mut seen = match self.seen.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let count = seen.entry(format!("{} {}", method, site)).or_insert(0);
        *count += 1;
        if *count == 1 {
            warn!(method = method, site = site.as_str(); "Use of deprecated method");
        }
        *count
    }

    /// Total calls recorded for `method` across all sites.
    pub fn count(&self, method: &str) -> usize {
        let seen = match self.seen.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let prefix = format!("{} ", method);
        seen.iter().filter(|(k, _)| k.starts_with(&prefix)).map(|(_, v)| v).sum()
    }
}
