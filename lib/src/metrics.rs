//! Process-wide counters for uploads, accounts and engagement.
//!
//! Handlers receive a [`Metrics`] implementation through request extensions
//! instead of reaching for a global. The default [`Collector`] keeps all
//! counters behind a single mutex; [`NoopMetrics`] discards everything and is
//! handy in tests and tools that don't care about counting.

use std::collections::BTreeMap;
use std::sync::Mutex;

use strum::IntoEnumIterator;

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Counter {
    UserRegistered,
    LoginSuccess,
    LoginFailed,
    ProfileUpdated,
    AvatarUpload,
    PostCreated,
    PostUpdated,
    PostDeleted,
    PostImageUpload,
    CoverImageUpload,
    PostView,
    PostLike,
    PostUnlike,
    CommentCreated,
    CommentDeleted,
}

/// Sink for counter increments.
pub trait Metrics: Send + Sync {
    fn incr(&self, counter: Counter);

    /// Current value of a single counter.
    fn get(&self, counter: Counter) -> u64;

    /// Values of all the counters, including the ones still at zero.
    fn snapshot(&self) -> BTreeMap<Counter, u64> {
        Counter::iter().map(|c| (c, self.get(c))).collect()
    }
}

/// Mutex-guarded counter map.
#[derive(Debug, Default)]
pub struct Collector {
    counts: Mutex<BTreeMap<Counter, u64>>,
}

impl Collector {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Metrics for Collector {
    fn incr(&self, counter: Counter) {
        // Counts stay valid even if a previous holder panicked.
        let mut counts = match self.counts.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *counts.entry(counter).or_insert(0) += 1;
    }

    fn get(&self, counter: Counter) -> u64 {
        let counts = match self.counts.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        counts.get(&counter).copied().unwrap_or(0)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetrics;

impl Metrics for NoopMetrics {
    fn incr(&self, _counter: Counter) {}

    fn get(&self, _counter: Counter) -> u64 {
        0
    }
}
