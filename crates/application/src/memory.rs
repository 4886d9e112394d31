//! 内存实现的仓储（用于测试与 `storage.backend = memory`）
//!
//! 每个操作都在一把 `RwLock` 内完成，因此"不存在才插入"与
//! "按截止时间批量删除"在进程内是原子的。

use std::collections::BTreeMap;

use async_trait::async_trait;
use domain::{
    Message, MessageEdit, MessageId, MessageRepository, NewMessage, Participant, ParticipantName,
    ParticipantRepository, RepositoryError, RepositoryResult, Timestamp,
};
use tokio::sync::RwLock;

#[derive(Debug, Default)]
pub struct MemoryParticipantRepository {
    participants: RwLock<BTreeMap<ParticipantName, Participant>>,
}

impl MemoryParticipantRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ParticipantRepository for MemoryParticipantRepository {
    async fn insert_if_absent(&self, participant: Participant) -> RepositoryResult<Participant> {
        let mut participants = self.participants.write().await;
        if participants.contains_key(&participant.name) {
            return Err(RepositoryError::Conflict);
        }
        participants.insert(participant.name.clone(), participant.clone());
        Ok(participant)
    }

    async fn list(&self) -> RepositoryResult<Vec<Participant>> {
        let participants = self.participants.read().await;
        Ok(participants.values().cloned().collect())
    }

    async fn find(&self, name: &ParticipantName) -> RepositoryResult<Option<Participant>> {
        let participants = self.participants.read().await;
        Ok(participants.get(name).cloned())
    }

    async fn touch(&self, name: &ParticipantName, at: Timestamp) -> RepositoryResult<()> {
        let mut participants = self.participants.write().await;
        let participant = participants.get_mut(name).ok_or(RepositoryError::NotFound)?;
        participant.touch(at);
        Ok(())
    }

    async fn remove_stale(&self, cutoff: Timestamp) -> RepositoryResult<Vec<ParticipantName>> {
        let mut participants = self.participants.write().await;
        let mut removed = Vec::new();
        participants.retain(|name, participant| {
            let stale = participant.is_stale(cutoff);
            if stale {
                removed.push(name.clone());
            }
            !stale
        });
        Ok(removed)
    }
}

#[derive(Debug, Default)]
pub struct MemoryMessageRepository {
    messages: RwLock<Vec<Message>>,
}

impl MemoryMessageRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessageRepository for MemoryMessageRepository {
    async fn append(&self, message: NewMessage) -> RepositoryResult<Message> {
        let message = Message::from_new(MessageId::generate(), message);
        self.messages.write().await.push(message.clone());
        Ok(message)
    }

    async fn list_all(&self) -> RepositoryResult<Vec<Message>> {
        Ok(self.messages.read().await.clone())
    }

    async fn find_by_id(&self, id: MessageId) -> RepositoryResult<Option<Message>> {
        let messages = self.messages.read().await;
        Ok(messages.iter().find(|message| message.id == id).cloned())
    }

    async fn replace(&self, id: MessageId, edit: MessageEdit) -> RepositoryResult<Message> {
        let mut messages = self.messages.write().await;
        let message = messages
            .iter_mut()
            .find(|message| message.id == id)
            .ok_or(RepositoryError::NotFound)?;
        message.apply_edit(edit);
        Ok(message.clone())
    }

    async fn remove(&self, id: MessageId) -> RepositoryResult<()> {
        let mut messages = self.messages.write().await;
        let index = messages
            .iter()
            .position(|message| message.id == id)
            .ok_or(RepositoryError::NotFound)?;
        messages.remove(index);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{MessageKind, MessageText};
    use std::time::Duration;
    use time::macros::datetime;

    const T0: Timestamp = datetime!(2024-01-01 10:00:00 UTC);

    fn name(value: &str) -> ParticipantName {
        ParticipantName::parse(value).unwrap()
    }

    #[tokio::test]
    async fn insert_if_absent_rejects_duplicates() {
        let repo = MemoryParticipantRepository::new();
        repo.insert_if_absent(Participant::register(name("alice"), T0))
            .await
            .unwrap();

        let second = repo
            .insert_if_absent(Participant::register(name("alice"), T0))
            .await;

        assert_eq!(second, Err(RepositoryError::Conflict));
        assert_eq!(repo.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn remove_stale_uses_inclusive_cutoff() {
        let repo = MemoryParticipantRepository::new();
        repo.insert_if_absent(Participant::register(name("old"), T0))
            .await
            .unwrap();
        repo.insert_if_absent(Participant::register(name("edge"), T0 + Duration::from_secs(5)))
            .await
            .unwrap();
        repo.insert_if_absent(Participant::register(name("fresh"), T0 + Duration::from_secs(6)))
            .await
            .unwrap();

        let removed = repo
            .remove_stale(T0 + Duration::from_secs(5))
            .await
            .unwrap();

        assert_eq!(removed, vec![name("edge"), name("old")]);
        let remaining: Vec<_> = repo.list().await.unwrap().into_iter().map(|p| p.name).collect();
        assert_eq!(remaining, vec![name("fresh")]);
        assert!(repo.remove_stale(T0 + Duration::from_secs(5)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn touch_unknown_participant_is_not_found() {
        let repo = MemoryParticipantRepository::new();
        assert_eq!(
            repo.touch(&name("ghost"), T0).await,
            Err(RepositoryError::NotFound)
        );
    }

    #[tokio::test]
    async fn messages_keep_insertion_order_across_removal() {
        let repo = MemoryMessageRepository::new();
        let mut ids = Vec::new();
        for text in ["one", "two", "three"] {
            let message = repo
                .append(NewMessage {
                    from: name("alice"),
                    to: ParticipantName::broadcast(),
                    text: MessageText::new(text).unwrap(),
                    kind: MessageKind::Broadcast,
                    created_at: T0,
                })
                .await
                .unwrap();
            ids.push(message.id);
        }

        repo.remove(ids[1]).await.unwrap();

        let texts: Vec<_> = repo
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.text.as_str().to_owned())
            .collect();
        assert_eq!(texts, ["one", "three"]);
        assert_eq!(repo.remove(ids[1]).await, Err(RepositoryError::NotFound));
        assert!(repo.find_by_id(ids[1]).await.unwrap().is_none());
    }
}
