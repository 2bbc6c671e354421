//! Network synchronizer: outbound topic changes.

use std::sync::Mutex;

use serde::Serialize;
use tokio::runtime::RuntimeFlavor;
use tokio::sync::mpsc;

use chanserv_api::{TopicChange, UpstreamLink};

use crate::config::{OverflowPolicy, UplinkConfig};

/// Build the outbound event for a committed change and hand it to the link.
///
/// `previous_ts` must be the timestamp that was in effect when the commit
/// happened; peers use it to order this change against their own.
pub fn publish(
    link: &dyn UpstreamLink,
    channel: &str,
    setter: &str,
    now: i64,
    previous_ts: i64,
    text: &str,
) -> TopicChange {
    let change = TopicChange {
        channel: channel.to_string(),
        setter: setter.to_string(),
        ts: now,
        prev_ts: previous_ts,
        text: text.to_string(),
    };
    link.emit_topic_change(&change);
    change
}

#[derive(Serialize)]
struct Frame<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    origin: &'a str,
    #[serde(flatten)]
    change: &'a TopicChange,
}

/// Encode a change as one JSON line (without the trailing newline).
pub fn encode_line(origin: &str, change: &TopicChange) -> Result<String, serde_json::Error> {
    serde_json::to_string(&Frame {
        kind: "topic",
        origin,
        change,
    })
}

/// Uplink that queues encoded lines for a writer task.
pub struct WireUplink {
    origin: String,
    tx: mpsc::Sender<String>,
    overflow: OverflowPolicy,
}

impl WireUplink {
    /// Returns the link and the receiving end the writer task drains.
    pub fn new(origin: impl Into<String>, config: UplinkConfig) -> (Self, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(config.buffer.max(1));
        let link = Self {
            origin: origin.into(),
            tx,
            overflow: config.overflow,
        };
        (link, rx)
    }
}

impl UpstreamLink for WireUplink {
    fn emit_topic_change(&self, change: &TopicChange) {
        let line = match encode_line(&self.origin, change) {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!(channel = %change.channel, error = %e, "failed to encode topic change");
                return;
            }
        };

        match self.overflow {
            OverflowPolicy::Drop => match self.tx.try_send(line) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    tracing::warn!(channel = %change.channel, "uplink queue full, dropping topic change");
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    tracing::warn!(channel = %change.channel, "uplink closed, topic change not sent");
                }
            },
            OverflowPolicy::BackPressure => {
                let sent = match tokio::runtime::Handle::try_current() {
                    Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                        tokio::task::block_in_place(|| self.tx.blocking_send(line))
                    }
                    // A single-threaded runtime cannot wait here without stalling the reader.
                    Ok(_) => match self.tx.try_send(line) {
                        Ok(()) => Ok(()),
                        Err(mpsc::error::TrySendError::Full(_)) => {
                            tracing::warn!(
                                channel = %change.channel,
                                "uplink queue full on current-thread runtime, dropping topic change"
                            );
                            Ok(())
                        }
                        Err(mpsc::error::TrySendError::Closed(line)) => {
                            Err(mpsc::error::SendError(line))
                        }
                    },
                    Err(_) => self.tx.blocking_send(line),
                };
                if sent.is_err() {
                    tracing::warn!(channel = %change.channel, "uplink closed, topic change not sent");
                }
            }
        }
    }
}

/// Uplink that keeps every change in memory.
#[derive(Debug, Default)]
pub struct RecordingUplink {
    changes: Mutex<Vec<TopicChange>>,
}

impl RecordingUplink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn changes(&self) -> Vec<TopicChange> {
        match self.changes.lock() {
            Ok(g) => g.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl UpstreamLink for RecordingUplink {
    fn emit_topic_change(&self, change: &TopicChange) {
        match self.changes.lock() {
            Ok(mut g) => g.push(change.clone()),
            Err(poisoned) => poisoned.into_inner().push(change.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn change(ts: i64) -> TopicChange {
        TopicChange {
            channel: "#help".into(),
            setter: "alice".into(),
            ts,
            prev_ts: ts - 10,
            text: "hello".into(),
        }
    }

    #[test]
    fn publish_carries_previous_timestamp() {
        let link = RecordingUplink::new();
        let sent = publish(&link, "#help", "alice", 200, 100, "hi");
        assert_eq!(sent.prev_ts, 100);
        assert_eq!(sent.ts, 200);
        assert_eq!(link.changes(), vec![sent]);
    }

    #[test]
    fn line_contains_both_timestamps() {
        let line = encode_line("services.int", &change(100)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["type"], "topic");
        assert_eq!(value["origin"], "services.int");
        assert_eq!(value["ts"], 100);
        assert_eq!(value["prev_ts"], 90);
        assert_eq!(value["text"], "hello");
        assert!(!line.contains('\n'));
    }

    #[test]
    fn drop_policy_discards_when_full() {
        let config = UplinkConfig {
            buffer: 1,
            overflow: OverflowPolicy::Drop,
        };
        let (link, mut rx) = WireUplink::new("services.int", config);
        link.emit_topic_change(&change(1));
        link.emit_topic_change(&change(2));
        let first = rx.try_recv().unwrap();
        assert!(first.contains("\"ts\":1"));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn closed_receiver_is_tolerated() {
        let (link, rx) = WireUplink::new("services.int", UplinkConfig::default());
        drop(rx);
        link.emit_topic_change(&change(1));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn backpressure_waits_for_room() {
        let config = UplinkConfig {
            buffer: 1,
            overflow: OverflowPolicy::BackPressure,
        };
        let (link, mut rx) = WireUplink::new("services.int", config);
        let reader = tokio::spawn(async move {
            let mut lines = Vec::new();
            while let Some(line) = rx.recv().await {
                lines.push(line);
            }
            lines
        });
        for ts in 1..=3 {
            link.emit_topic_change(&change(ts));
        }
        drop(link);
        let lines = reader.await.unwrap();
        assert_eq!(lines.len(), 3);
        assert!(lines[2].contains("\"ts\":3"));
    }

    #[tokio::test]
    async fn backpressure_on_current_thread_runtime_drops_instead_of_blocking() {
        let config = UplinkConfig {
            buffer: 1,
            overflow: OverflowPolicy::BackPressure,
        };
        let (link, mut rx) = WireUplink::new("services.int", config);
        link.emit_topic_change(&change(1));
        link.emit_topic_change(&change(2));
        assert!(rx.recv().await.unwrap().contains("\"ts\":1"));
        assert!(rx.try_recv().is_err());

        drop(rx);
        link.emit_topic_change(&change(3));
    }
}
