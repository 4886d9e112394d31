use std::sync::Arc;
use std::time::Duration;

use domain::{
    DomainError, MessageRepository, NewMessage, Participant, ParticipantName,
    ParticipantRepository, RepositoryError,
};

use super::claimed_identity;
use crate::{clock::Clock, error::ApplicationError};

#[derive(Debug, Clone)]
pub struct RegisterParticipantRequest {
    pub name: String,
}

pub struct ParticipantServiceDependencies {
    pub participant_repository: Arc<dyn ParticipantRepository>,
    pub message_repository: Arc<dyn MessageRepository>,
    pub clock: Arc<dyn Clock>,
}

/// 参与者注册表：注册、列表、心跳与过期清理。
pub struct ParticipantService {
    deps: ParticipantServiceDependencies,
}

impl ParticipantService {
    pub fn new(deps: ParticipantServiceDependencies) -> Self {
        Self { deps }
    }

    pub async fn register(
        &self,
        request: RegisterParticipantRequest,
    ) -> Result<Participant, ApplicationError> {
        let name = ParticipantName::parse(request.name)?;
        let now = self.deps.clock.now();

        // 条件插入，并发注册同名时只有一个能成功
        let participant = self
            .deps
            .participant_repository
            .insert_if_absent(Participant::register(name, now))
            .await
            .map_err(|err| match err {
                RepositoryError::Conflict => DomainError::ParticipantAlreadyExists.into(),
                other => ApplicationError::from(other),
            })?;

        self.deps
            .message_repository
            .append(NewMessage::joined(participant.name.clone(), now))
            .await?;

        tracing::info!(participant = %participant.name, "参与者加入聊天室");
        Ok(participant)
    }

    pub async fn list(&self) -> Result<Vec<Participant>, ApplicationError> {
        Ok(self.deps.participant_repository.list().await?)
    }

    /// 刷新心跳。身份缺失、为空或不是在线参与者时都返回 `ParticipantNotFound`。
    pub async fn heartbeat(&self, viewer: Option<String>) -> Result<(), ApplicationError> {
        let name = claimed_identity(viewer)?;
        let now = self.deps.clock.now();

        self.deps
            .participant_repository
            .touch(&name, now)
            .await
            .map_err(|err| match err {
                RepositoryError::NotFound => DomainError::ParticipantNotFound.into(),
                other => ApplicationError::from(other),
            })?;

        tracing::debug!(participant = %name, "心跳已刷新");
        Ok(())
    }

    pub async fn is_live(&self, name: &ParticipantName) -> Result<bool, ApplicationError> {
        Ok(self.deps.participant_repository.find(name).await?.is_some())
    }

    /// 删除心跳年龄 `>= threshold` 的所有参与者，返回被删除的名称。
    pub async fn expire_older_than(
        &self,
        threshold: Duration,
    ) -> Result<Vec<ParticipantName>, ApplicationError> {
        let cutoff = time::Duration::try_from(threshold)
            .ok()
            .and_then(|threshold| self.deps.clock.now().checked_sub(threshold))
            .ok_or_else(|| DomainError::invalid_argument("threshold", "out of range"))?;
        Ok(self
            .deps
            .participant_repository
            .remove_stale(cutoff)
            .await?)
    }
}
