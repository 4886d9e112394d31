//! 应用层实现。
//!
//! 这里提供围绕领域模型的用例服务：参与者注册与心跳、消息收发，
//! 以及独立运行的在线状态清理任务。

pub mod clock;
pub mod dto;
pub mod error;
pub mod memory;
pub mod presence;
pub mod services;

pub use clock::{Clock, ManualClock, SystemClock};
pub use dto::{MessageDto, ParticipantDto};
pub use error::ApplicationError;
pub use memory::{MemoryMessageRepository, MemoryParticipantRepository};
pub use presence::{PresenceReaper, ReapReport, ReaperConfig, ReaperHandle};
pub use services::{
    EditMessageRequest, MessageService, MessageServiceDependencies, ParticipantService,
    ParticipantServiceDependencies, PostMessageRequest, RegisterParticipantRequest,
};
