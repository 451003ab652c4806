//! Simulated read-side indexer.
//!
//! Every commit that touches an object bumps its version and records a
//! snapshot of the object as committed. Readers get the newest snapshot only
//! after `lag` polls have passed since the commit; until then they get the
//! previously indexed one, or nothing for an object that was just created.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;
use serde_json::Value;

/// Handle to an on-ledger object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ObjectRef {
    Profile(u64),
    Bond(u64),
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Profile(id) => write!(f, "profile#{id}"),
            Self::Bond(id) => write!(f, "bond#{id}"),
        }
    }
}

/// What a reader sees for an object at one poll.
#[derive(Debug, Clone, PartialEq)]
pub struct Indexed {
    pub version: u64,
    /// `None` while the first committed version is still being indexed.
    pub snapshot: Option<Value>,
}

#[derive(Debug)]
struct Entry {
    committed: u64,
    latest: Value,
    visible: Indexed,
    polls_left: u32,
}

#[derive(Debug, Default)]
pub struct Indexer {
    lag: u32,
    entries: HashMap<ObjectRef, Entry>,
}

impl Indexer {
    #[must_use]
    pub fn new(lag: u32) -> Self {
        Self {
            lag,
            entries: HashMap::new(),
        }
    }

    #[must_use]
    pub fn lag(&self) -> u32 {
        self.lag
    }

    /// Version the next commit of `object` will get.
    #[must_use]
    pub fn next_version(&self, object: ObjectRef) -> u64 {
        self.committed_version(object).unwrap_or(0) + 1
    }

    /// Record a commit of `object` with its new `snapshot`; returns the new version.
    pub fn commit(&mut self, object: ObjectRef, snapshot: Value) -> u64 {
        let lag = self.lag;
        let entry = self.entries.entry(object).or_insert_with(|| Entry {
            committed: 0,
            latest: Value::Null,
            visible: Indexed {
                version: 0,
                snapshot: None,
            },
            polls_left: 0,
        });
        entry.committed += 1;
        entry.latest = snapshot;
        entry.polls_left = lag;
        if lag == 0 {
            entry.visible = Indexed {
                version: entry.committed,
                snapshot: Some(entry.latest.clone()),
            };
        }
        entry.committed
    }

    /// One read attempt. Advances indexing by a poll and returns what a
    /// reader sees now, or `None` if the object was never committed.
    pub fn poll(&mut self, object: ObjectRef) -> Option<Indexed> {
        let entry = self.entries.get_mut(&object)?;
        if entry.visible.version < entry.committed {
            entry.polls_left = entry.polls_left.saturating_sub(1);
            if entry.polls_left == 0 {
                entry.visible = Indexed {
                    version: entry.committed,
                    snapshot: Some(entry.latest.clone()),
                };
            }
        }
        Some(entry.visible.clone())
    }

    #[must_use]
    pub fn committed_version(&self, object: ObjectRef) -> Option<u64> {
        self.entries.get(&object).map(|e| e.committed)
    }
}
