//! 聊天室系统核心领域模型
//!
//! 包含参与者、消息两个核心实体，消息可见性与修改权限规则，
//! 以及数据访问层需要实现的仓储接口。

pub mod business_rules;
pub mod errors;
pub mod message;
pub mod participant;
pub mod repository;
pub mod value_objects;

// 重新导出常用类型
pub use business_rules::{MutationRules, VisibilityRules};
pub use errors::{DomainError, DomainResult, RepositoryError};
pub use message::{Message, MessageEdit, MessageKind, NewMessage, JOINED_TEXT, LEFT_TEXT};
pub use participant::Participant;
pub use repository::{MessageRepository, ParticipantRepository, RepositoryResult};
pub use value_objects::{
    MessageId, MessageLimit, MessageText, ParticipantName, Timestamp, BROADCAST_RECIPIENT,
};

#[cfg(feature = "testing")]
pub use repository::{MockMessageRepository, MockParticipantRepository};
