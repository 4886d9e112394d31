use serde::{Deserialize, Serialize};

use crate::value_objects::{ParticipantName, Timestamp};

/// 聊天室在线参与者。
///
/// 状态机：`ALIVE --(超过超时时间未收到心跳)--> EXPIRED --> 被清理`。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub name: ParticipantName,
    pub last_heartbeat: Timestamp,
}

impl Participant {
    pub fn register(name: ParticipantName, now: Timestamp) -> Self {
        Self {
            name,
            last_heartbeat: now,
        }
    }

    pub fn touch(&mut self, now: Timestamp) {
        self.last_heartbeat = now;
    }

    /// 最近一次心跳不晚于 `cutoff`，即心跳年龄已达到超时时间（含等于）。
    pub fn is_stale(&self, cutoff: Timestamp) -> bool {
        self.last_heartbeat <= cutoff
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use time::macros::datetime;

    fn alice(at: Timestamp) -> Participant {
        Participant::register(ParticipantName::parse("alice").unwrap(), at)
    }

    #[test]
    fn expiry_boundary_is_inclusive() {
        let start = datetime!(2024-01-01 10:00:00 UTC);
        let participant = alice(start);
        let cutoff = start + Duration::from_secs(1);

        assert!(participant.is_stale(start));
        assert!(participant.is_stale(cutoff));
        assert!(!participant.is_stale(start - Duration::from_millis(1)));
    }

    #[test]
    fn touch_resets_heartbeat() {
        let start = datetime!(2024-01-01 10:00:00 UTC);
        let mut participant = alice(start);
        let later = start + Duration::from_secs(30);

        participant.touch(later);

        assert_eq!(participant.last_heartbeat, later);
        assert!(!participant.is_stale(later - Duration::from_secs(5)));
    }
}
