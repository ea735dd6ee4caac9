//! Notices: free-form text addressed to a motion's tracker thread.

use civitas_types::MotionId;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub text: String,
}

impl Notice {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Notices(Vec<Notice>);

impl Notices {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn one(text: impl Into<String>) -> Self {
        Self(vec![Notice::new(text)])
    }

    pub fn push(&mut self, notice: Notice) {
        self.0.push(notice);
    }

    pub fn extend(&mut self, other: Notices) {
        self.0.extend(other.0);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notice> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Receiver of notices, e.g. an issue-tracker sync.
///
/// Notices are delivered only after the transaction that produced them has
/// been pushed.
pub trait NoticeSink: Send + Sync {
    fn deliver(&self, motion: &MotionId, notices: &Notices);
}

/// Writes notices to the log.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl NoticeSink for TracingSink {
    fn deliver(&self, motion: &MotionId, notices: &Notices) {
        for notice in notices.iter() {
            tracing::info!(motion = %motion, text = %notice.text, "notice");
        }
    }
}

/// Keeps every delivered notice in memory.
#[derive(Debug, Default)]
pub struct CollectingSink {
    delivered: Mutex<Vec<(MotionId, Notice)>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delivered(&self) -> Vec<(MotionId, Notice)> {
        self.delivered
            .lock()
            .map(|d| d.clone())
            .unwrap_or_default()
    }
}

impl NoticeSink for CollectingSink {
    fn deliver(&self, motion: &MotionId, notices: &Notices) {
        if let Ok(mut delivered) = self.delivered.lock() {
            delivered.extend(notices.iter().map(|n| (motion.clone(), n.clone())));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collecting_sink_keeps_order() {
        let sink = CollectingSink::new();
        let mut notices = Notices::one("first");
        notices.push(Notice::new("second"));
        sink.deliver(&MotionId::new("1"), &notices);
        let got: Vec<String> = sink.delivered().into_iter().map(|(_, n)| n.text).collect();
        assert_eq!(got, vec!["first", "second"]);
    }
}
