use crate::channel::ChannelRecord;

/// Timestamps produced by a commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Commit {
    /// Timestamp now in effect.
    pub topic_ts: i64,
    /// Timestamp in effect immediately before the commit.
    pub previous_ts: i64,
}

/// Install a new topic on the record. Never fails.
///
/// The committed timestamp is `now`, bumped past the previous one when the
/// clock has not moved since the last change, so local changes on a channel
/// are strictly ordered.
pub fn commit(record: &mut ChannelRecord, text: String, setter: &str, now: i64) -> Commit {
    let previous_ts = record.topic_ts;
    let topic_ts = now.max(previous_ts.saturating_add(1));

    record.topic = text;
    record.topic_setter = setter.to_string();
    record.topic_ts = topic_ts;

    Commit {
        topic_ts,
        previous_ts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sets_all_three_fields_and_returns_previous_ts() {
        let mut record = ChannelRecord::new("#help");
        record.topic_ts = 100;
        let c = commit(&mut record, "hello".into(), "alice", 200);
        assert_eq!(c, Commit { topic_ts: 200, previous_ts: 100 });
        assert_eq!(record.topic, "hello");
        assert_eq!(record.topic_setter, "alice");
        assert_eq!(record.topic_ts, 200);
    }

    #[test]
    fn same_second_changes_are_strictly_ordered() {
        let mut record = ChannelRecord::new("#help");
        let first = commit(&mut record, "x".into(), "alice", 500);
        let second = commit(&mut record, "x".into(), "alice", 500);
        assert_eq!(first.topic_ts, 500);
        assert_eq!(second.previous_ts, 500);
        assert_eq!(second.topic_ts, 501);
    }

    #[test]
    fn stays_ahead_of_a_future_network_timestamp() {
        let mut record = ChannelRecord::new("#help");
        record.topic_ts = 1_000;
        let c = commit(&mut record, "x".into(), "alice", 900);
        assert_eq!(c.topic_ts, 1_001);
    }
}
