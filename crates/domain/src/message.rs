use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use time::{format_description::BorrowedFormatItem, macros::format_description};

use crate::errors::DomainError;
use crate::value_objects::{MessageId, MessageText, ParticipantName, Timestamp};

/// 加入聊天室时系统生成的状态文本。
pub const JOINED_TEXT: &str = "joined";
/// 离开（被清理）时系统生成的状态文本。
pub const LEFT_TEXT: &str = "left";

const DISPLAY_TIME: &[BorrowedFormatItem<'static>] =
    format_description!("[hour repr:12]:[minute]:[second]");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageKind {
    /// 全员可见
    #[serde(rename = "message")]
    Broadcast,
    /// 仅发送者与接收者可见
    #[serde(rename = "private_message")]
    Private,
    /// 加入/离开的系统事件，全员可见
    #[serde(rename = "status")]
    Status,
}

impl MessageKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MessageKind::Broadcast => "message",
            MessageKind::Private => "private_message",
            MessageKind::Status => "status",
        }
    }

    /// 客户端只能提交普通消息和私聊消息，状态消息由系统生成。
    pub fn is_client_postable(self) -> bool {
        !matches!(self, MessageKind::Status)
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageKind {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "message" => Ok(MessageKind::Broadcast),
            "private_message" => Ok(MessageKind::Private),
            "status" => Ok(MessageKind::Status),
            other => Err(DomainError::invalid_argument(
                "type",
                format!("unknown message type '{other}'"),
            )),
        }
    }
}

/// 尚未分配 ID 的消息，由仓储在追加时分配 ID。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub from: ParticipantName,
    pub to: ParticipantName,
    pub text: MessageText,
    pub kind: MessageKind,
    pub created_at: Timestamp,
}

impl NewMessage {
    pub fn joined(name: ParticipantName, at: Timestamp) -> Self {
        Self::status(name, JOINED_TEXT, at)
    }

    pub fn left(name: ParticipantName, at: Timestamp) -> Self {
        Self::status(name, LEFT_TEXT, at)
    }

    fn status(name: ParticipantName, text: &'static str, at: Timestamp) -> Self {
        Self {
            from: name,
            to: ParticipantName::broadcast(),
            text: MessageText::from_static(text),
            kind: MessageKind::Status,
            created_at: at,
        }
    }
}

/// 编辑操作允许替换的字段；`id`、`from`、`created_at` 创建后不可变。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageEdit {
    pub to: ParticipantName,
    pub text: MessageText,
    pub kind: MessageKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub from: ParticipantName,
    pub to: ParticipantName,
    pub text: MessageText,
    pub kind: MessageKind,
    pub created_at: Timestamp,
}

impl Message {
    pub fn from_new(id: MessageId, new: NewMessage) -> Self {
        Self {
            id,
            from: new.from,
            to: new.to,
            text: new.text,
            kind: new.kind,
            created_at: new.created_at,
        }
    }

    pub fn apply_edit(&mut self, edit: MessageEdit) {
        self.to = edit.to;
        self.text = edit.text;
        self.kind = edit.kind;
    }

    /// 以 `hh:mm:ss`（12 小时制）渲染创建时间。
    pub fn display_time(&self) -> String {
        self.created_at.format(DISPLAY_TIME).unwrap_or_default()
    }
}
