mod message_service;
mod participant_service;

pub use message_service::{
    EditMessageRequest, MessageService, MessageServiceDependencies, PostMessageRequest,
};
pub use participant_service::{
    ParticipantService, ParticipantServiceDependencies, RegisterParticipantRequest,
};

use domain::{DomainError, ParticipantName};

use crate::error::ApplicationError;

/// 调用方声明的身份（`User` 请求头）。缺失或为空时统一视为"不存在"，
/// 不区分是哪一步检查失败。
pub(crate) fn claimed_identity(viewer: Option<String>) -> Result<ParticipantName, ApplicationError> {
    viewer
        .and_then(|value| ParticipantName::parse(value).ok())
        .ok_or(ApplicationError::Domain(DomainError::ParticipantNotFound))
}

#[cfg(test)]
pub(crate) mod test_support;
