use std::sync::Arc;

use domain::{
    DomainError, Message, MessageEdit, MessageId, MessageKind, MessageLimit, MessageRepository,
    MessageText, MutationRules, NewMessage, ParticipantName, ParticipantRepository,
    RepositoryError, VisibilityRules,
};

use super::claimed_identity;
use crate::{clock::Clock, error::ApplicationError};

/// 发送消息请求，`from` 来自调用方声明的身份。
#[derive(Debug, Clone)]
pub struct PostMessageRequest {
    pub from: String,
    pub to: String,
    pub text: String,
    pub kind: MessageKind,
}

/// 编辑消息请求。只能替换 `to`、`text`、`kind`。
#[derive(Debug, Clone)]
pub struct EditMessageRequest {
    pub from: String,
    pub id: MessageId,
    pub to: String,
    pub text: String,
    pub kind: MessageKind,
}

pub struct MessageServiceDependencies {
    pub participant_repository: Arc<dyn ParticipantRepository>,
    pub message_repository: Arc<dyn MessageRepository>,
    pub clock: Arc<dyn Clock>,
}

pub struct MessageService {
    deps: MessageServiceDependencies,
}

/// 字段校验后的消息内容
struct ValidatedContent {
    from: ParticipantName,
    to: ParticipantName,
    text: MessageText,
    kind: MessageKind,
}

fn validate_content(
    from: String,
    to: String,
    text: String,
    kind: MessageKind,
) -> Result<ValidatedContent, DomainError> {
    let from = ParticipantName::parse_field("from", from)?;
    let to = ParticipantName::parse_field("to", to)?;
    let text = MessageText::new(text)?;
    if !kind.is_client_postable() {
        return Err(DomainError::invalid_argument(
            "type",
            "must be one of: message, private_message",
        ));
    }
    Ok(ValidatedContent {
        from,
        to,
        text,
        kind,
    })
}

impl MessageService {
    pub fn new(deps: MessageServiceDependencies) -> Self {
        Self { deps }
    }

    pub async fn post_message(
        &self,
        request: PostMessageRequest,
    ) -> Result<Message, ApplicationError> {
        let content = validate_content(request.from, request.to, request.text, request.kind)?;
        self.require_participant(&content.from).await?;

        let message = self
            .deps
            .message_repository
            .append(NewMessage {
                from: content.from,
                to: content.to,
                text: content.text,
                kind: content.kind,
                created_at: self.deps.clock.now(),
            })
            .await?;

        tracing::info!(
            message_id = %message.id,
            from = %message.from,
            kind = %message.kind,
            "消息已发送"
        );
        Ok(message)
    }

    /// 返回 `viewer` 可见的消息，按插入顺序，可选只保留末尾 `limit` 条。
    ///
    /// `limit` 在过滤之前校验；`viewer` 缺失时按匿名处理。
    pub async fn list_messages(
        &self,
        viewer: Option<String>,
        limit: Option<String>,
    ) -> Result<Vec<Message>, ApplicationError> {
        let limit = limit.as_deref().map(MessageLimit::parse).transpose()?;
        let viewer = viewer.and_then(|value| ParticipantName::parse(value).ok());

        let messages = self.deps.message_repository.list_all().await?;
        Ok(VisibilityRules::visible(viewer.as_ref(), messages, limit))
    }

    pub async fn get_message(&self, id: MessageId) -> Result<Message, ApplicationError> {
        self.deps
            .message_repository
            .find_by_id(id)
            .await?
            .ok_or(ApplicationError::Domain(DomainError::MessageNotFound))
    }

    pub async fn delete_message(
        &self,
        viewer: Option<String>,
        id: MessageId,
    ) -> Result<(), ApplicationError> {
        let viewer = claimed_identity(viewer)?;
        self.require_participant(&viewer).await?;
        self.authorize(&viewer, id).await?;

        self.deps
            .message_repository
            .remove(id)
            .await
            .map_err(map_missing_message)?;

        tracing::info!(message_id = %id, by = %viewer, "消息已删除");
        Ok(())
    }

    pub async fn edit_message(
        &self,
        request: EditMessageRequest,
    ) -> Result<Message, ApplicationError> {
        let content = validate_content(request.from, request.to, request.text, request.kind)?;
        self.require_participant(&content.from).await?;
        self.authorize(&content.from, request.id).await?;

        let message = self
            .deps
            .message_repository
            .replace(
                request.id,
                MessageEdit {
                    to: content.to,
                    text: content.text,
                    kind: content.kind,
                },
            )
            .await
            .map_err(map_missing_message)?;

        tracing::info!(message_id = %message.id, by = %content.from, "消息已编辑");
        Ok(message)
    }

    async fn require_participant(&self, name: &ParticipantName) -> Result<(), ApplicationError> {
        match self.deps.participant_repository.find(name).await? {
            Some(_) => Ok(()),
            None => Err(DomainError::ParticipantNotFound.into()),
        }
    }

    async fn authorize(&self, viewer: &ParticipantName, id: MessageId) -> Result<(), ApplicationError> {
        let message = self.get_message(id).await?;
        if !MutationRules::can_mutate(viewer, &message) {
            tracing::warn!(message_id = %id, by = %viewer, "拒绝修改他人消息");
            return Err(DomainError::OperationNotAllowed.into());
        }
        Ok(())
    }
}

// 授权检查与实际修改之间消息可能已被删除
fn map_missing_message(err: RepositoryError) -> ApplicationError {
    match err {
        RepositoryError::NotFound => DomainError::MessageNotFound.into(),
        other => other.into(),
    }
}
