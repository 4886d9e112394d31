//! Repository接口定义
//!
//! 内层定义接口，外层（数据库、内存实现）实现接口。
//! 每个方法都可能是一次 I/O 挂起点。

use async_trait::async_trait;

use crate::errors::RepositoryError;
use crate::message::{Message, MessageEdit, NewMessage};
use crate::participant::Participant;
use crate::value_objects::{MessageId, ParticipantName, Timestamp};

pub type RepositoryResult<T> = Result<T, RepositoryError>;

#[cfg_attr(feature = "testing", mockall::automock)]
#[async_trait]
pub trait ParticipantRepository: Send + Sync {
    /// 原子的"不存在才插入"；名称已存在时返回 `RepositoryError::Conflict`。
    async fn insert_if_absent(&self, participant: Participant) -> RepositoryResult<Participant>;

    async fn list(&self) -> RepositoryResult<Vec<Participant>>;

    async fn find(&self, name: &ParticipantName) -> RepositoryResult<Option<Participant>>;

    /// 刷新心跳；参与者不存在时返回 `RepositoryError::NotFound`。
    async fn touch(&self, name: &ParticipantName, at: Timestamp) -> RepositoryResult<()>;

    /// 删除所有 `last_heartbeat <= cutoff` 的参与者并返回其名称。
    async fn remove_stale(&self, cutoff: Timestamp) -> RepositoryResult<Vec<ParticipantName>>;
}

#[cfg_attr(feature = "testing", mockall::automock)]
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// 分配 ID 并追加到日志末尾。
    async fn append(&self, message: NewMessage) -> RepositoryResult<Message>;

    /// 按插入顺序返回完整日志快照。
    async fn list_all(&self) -> RepositoryResult<Vec<Message>>;

    async fn find_by_id(&self, id: MessageId) -> RepositoryResult<Option<Message>>;

    /// 原地替换 `to`、`text`、`kind`；消息不存在时返回 `RepositoryError::NotFound`。
    async fn replace(&self, id: MessageId, edit: MessageEdit) -> RepositoryResult<Message>;

    /// 消息不存在时返回 `RepositoryError::NotFound`。
    async fn remove(&self, id: MessageId) -> RepositoryResult<()>;
}
