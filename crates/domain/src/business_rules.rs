//! 业务规则
//!
//! 消息可见性与修改权限的纯函数规则，不涉及任何 I/O。

use crate::message::{Message, MessageKind};
use crate::value_objects::{MessageLimit, ParticipantName};

/// 消息可见性规则
pub struct VisibilityRules;

impl VisibilityRules {
    /// 判断单条消息对 `viewer` 是否可见。
    ///
    /// 广播与状态消息全员可见；私聊消息仅对发送者与接收者可见。
    /// `viewer` 为 `None`（匿名）或已离开的参与者时只能看到广播与状态消息。
    pub fn is_visible(viewer: Option<&ParticipantName>, message: &Message) -> bool {
        match message.kind {
            MessageKind::Broadcast | MessageKind::Status => true,
            MessageKind::Private => {
                viewer.is_some_and(|viewer| message.to == *viewer || message.from == *viewer)
            }
        }
    }

    /// 按插入顺序过滤出可见消息，可选地只保留末尾 `limit` 条。
    pub fn visible(
        viewer: Option<&ParticipantName>,
        messages: impl IntoIterator<Item = Message>,
        limit: Option<MessageLimit>,
    ) -> Vec<Message> {
        let mut visible: Vec<Message> = messages
            .into_iter()
            .filter(|message| Self::is_visible(viewer, message))
            .collect();

        if let Some(limit) = limit {
            let skip = visible.len().saturating_sub(limit.get());
            visible.drain(..skip);
        }

        visible
    }
}

/// 消息修改（编辑 / 删除）权限规则
pub struct MutationRules;

impl MutationRules {
    /// 只有消息作者可以编辑或删除消息，没有任何其他特权路径。
    pub fn can_mutate(viewer: &ParticipantName, message: &Message) -> bool {
        message.from == *viewer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::NewMessage;
    use crate::value_objects::{MessageId, MessageText, Timestamp};
    use time::macros::datetime;

    const AT: Timestamp = datetime!(2024-01-01 10:00:00 UTC);

    fn name(value: &str) -> ParticipantName {
        ParticipantName::parse(value).unwrap()
    }

    fn message(from: &str, to: &str, text: &str, kind: MessageKind) -> Message {
        Message::from_new(
            MessageId::generate(),
            NewMessage {
                from: name(from),
                to: name(to),
                text: MessageText::new(text).unwrap(),
                kind,
                created_at: AT,
            },
        )
    }

    fn status(from: &str) -> Message {
        Message::from_new(MessageId::generate(), NewMessage::joined(name(from), AT))
    }

    fn texts(messages: &[Message]) -> Vec<&str> {
        messages.iter().map(|m| m.text.as_str()).collect()
    }

    #[test]
    fn broadcast_and_status_are_visible_to_everyone() {
        let messages = [
            message("alice", "all", "hi", MessageKind::Broadcast),
            status("bob"),
        ];

        for viewer in [Some(name("alice")), Some(name("carol")), Some(name("ghost")), None] {
            for m in &messages {
                assert!(VisibilityRules::is_visible(viewer.as_ref(), m));
            }
        }
    }

    #[test]
    fn private_messages_are_visible_only_to_the_two_parties() {
        let secret = message("bob", "alice", "secret", MessageKind::Private);

        assert!(VisibilityRules::is_visible(Some(&name("alice")), &secret));
        assert!(VisibilityRules::is_visible(Some(&name("bob")), &secret));
        assert!(!VisibilityRules::is_visible(Some(&name("carol")), &secret));
        assert!(!VisibilityRules::is_visible(None, &secret));
    }

    #[test]
    fn room_scenario_hides_private_message_from_third_party() {
        let log = vec![
            status("alice"),
            status("bob"),
            message("alice", "all", "hi", MessageKind::Broadcast),
            message("bob", "alice", "secret", MessageKind::Private),
        ];

        let carol = VisibilityRules::visible(Some(&name("carol")), log.clone(), None);
        assert_eq!(texts(&carol), ["joined", "joined", "hi"]);

        let alice = VisibilityRules::visible(Some(&name("alice")), log, None);
        assert_eq!(texts(&alice), ["joined", "joined", "hi", "secret"]);
    }

    #[test]
    fn limit_keeps_the_chronological_tail() {
        let log: Vec<Message> = (1..=5)
            .map(|i| message("alice", "all", &format!("m{i}"), MessageKind::Broadcast))
            .chain([message("bob", "carol", "hidden", MessageKind::Private)])
            .collect();
        let viewer = name("dave");
        let full = VisibilityRules::visible(Some(&viewer), log.clone(), None);
        assert_eq!(full.len(), 5);

        for k in 1..=full.len() {
            let tail = VisibilityRules::visible(
                Some(&viewer),
                log.clone(),
                Some(MessageLimit::new(k).unwrap()),
            );
            assert_eq!(tail, full[full.len() - k..].to_vec());
        }

        let oversized =
            VisibilityRules::visible(Some(&viewer), log, Some(MessageLimit::new(50).unwrap()));
        assert_eq!(oversized, full);
    }

    #[test]
    fn only_the_author_can_mutate() {
        let hi = message("alice", "all", "hi", MessageKind::Broadcast);

        assert!(MutationRules::can_mutate(&name("alice"), &hi));
        assert!(!MutationRules::can_mutate(&name("bob"), &hi));
        assert!(!MutationRules::can_mutate(&name("Alice"), &hi));
        assert!(!MutationRules::can_mutate(&name("all"), &hi));
    }

    #[test]
    fn recipient_of_private_message_cannot_mutate_it() {
        let secret = message("bob", "alice", "secret", MessageKind::Private);
        assert!(!MutationRules::can_mutate(&name("alice"), &secret));
        assert!(MutationRules::can_mutate(&name("bob"), &secret));
    }
}
