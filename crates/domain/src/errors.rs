//! 领域模型错误定义
//!
//! 定义了领域层与仓储层可能出现的错误类型。

use thiserror::Error;

/// 领域模型错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// 字段校验失败
    #[error("invalid argument {field}: {reason}")]
    InvalidArgument { field: String, reason: String },

    /// 参与者名称已被占用
    #[error("participant already exists")]
    ParticipantAlreadyExists,

    /// 参与者不存在（或未提供身份）
    #[error("participant not found")]
    ParticipantNotFound,

    /// 消息不存在
    #[error("message not found")]
    MessageNotFound,

    /// 只有消息作者可以修改或删除消息
    #[error("operation not allowed")]
    OperationNotAllowed,
}

impl DomainError {
    /// 创建字段校验错误
    pub fn invalid_argument(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// 领域模型结果类型
pub type DomainResult<T> = Result<T, DomainError>;

/// 仓储层错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("record not found")]
    NotFound,
    #[error("record already exists")]
    Conflict,
    #[error("storage error: {message}")]
    Storage { message: String },
}

impl RepositoryError {
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_argument_names_the_field() {
        let err = DomainError::invalid_argument("limit", "must be a positive integer");
        assert_eq!(
            err.to_string(),
            "invalid argument limit: must be a positive integer"
        );
    }

    #[test]
    fn not_found_errors_do_not_leak_details() {
        assert_eq!(DomainError::ParticipantNotFound.to_string(), "participant not found");
        assert_eq!(RepositoryError::NotFound.to_string(), "record not found");
    }
}
