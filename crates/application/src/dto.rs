use domain::{Message, MessageKind, Participant};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantDto {
    pub name: String,
    /// 最近一次心跳，Unix 毫秒
    pub last_heartbeat: i64,
}

impl From<&Participant> for ParticipantDto {
    fn from(participant: &Participant) -> Self {
        let millis = participant.last_heartbeat.unix_timestamp_nanos() / 1_000_000;
        Self {
            name: participant.name.as_str().to_owned(),
            last_heartbeat: i64::try_from(millis).unwrap_or(i64::MAX),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageDto {
    pub id: Uuid,
    pub from: String,
    pub to: String,
    pub text: String,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    pub time: String,
}

impl From<&Message> for MessageDto {
    fn from(message: &Message) -> Self {
        Self {
            id: Uuid::from(message.id),
            from: message.from.as_str().to_owned(),
            to: message.to.as_str().to_owned(),
            text: message.text.as_str().to_owned(),
            kind: message.kind,
            time: message.display_time(),
        }
    }
}
