use std::sync::Arc;

use domain::{Participant, Timestamp};
use time::macros::datetime;

use super::{
    MessageService, MessageServiceDependencies, ParticipantService,
    ParticipantServiceDependencies, RegisterParticipantRequest,
};
use crate::clock::ManualClock;
use crate::memory::{MemoryMessageRepository, MemoryParticipantRepository};

pub(crate) const START: Timestamp = datetime!(2024-01-01 15:04:05 UTC);

/// 基于内存仓储与手动时钟的服务组合
pub(crate) struct Fixture {
    pub clock: Arc<ManualClock>,
    pub messages: Arc<MemoryMessageRepository>,
    pub participants: Arc<ParticipantService>,
    pub message_service: MessageService,
}

impl Fixture {
    pub fn new() -> Self {
        let clock = Arc::new(ManualClock::new(START));
        let participant_repository = Arc::new(MemoryParticipantRepository::new());
        let messages = Arc::new(MemoryMessageRepository::new());

        let participants = Arc::new(ParticipantService::new(ParticipantServiceDependencies {
            participant_repository: participant_repository.clone(),
            message_repository: messages.clone(),
            clock: clock.clone(),
        }));
        let message_service = MessageService::new(MessageServiceDependencies {
            participant_repository: participant_repository.clone(),
            message_repository: messages.clone(),
            clock: clock.clone(),
        });

        Self {
            clock,
            messages,
            participants,
            message_service,
        }
    }

    pub async fn register(&self, name: &str) -> Participant {
        self.participants
            .register(RegisterParticipantRequest { name: name.into() })
            .await
            .unwrap()
    }
}
