use std::sync::Arc;

use application::{
    Clock, MessageService, MessageServiceDependencies, ParticipantService,
    ParticipantServiceDependencies,
};
use domain::{MessageRepository, ParticipantRepository};

#[derive(Clone)]
pub struct AppState {
    pub participant_service: Arc<ParticipantService>,
    pub message_service: Arc<MessageService>,
}

impl AppState {
    pub fn new(
        participant_service: Arc<ParticipantService>,
        message_service: Arc<MessageService>,
    ) -> Self {
        Self {
            participant_service,
            message_service,
        }
    }

    /// 用同一组仓储与时钟装配两个服务
    pub fn from_repositories(
        participant_repository: Arc<dyn ParticipantRepository>,
        message_repository: Arc<dyn MessageRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let participant_service = ParticipantService::new(ParticipantServiceDependencies {
            participant_repository: participant_repository.clone(),
            message_repository: message_repository.clone(),
            clock: clock.clone(),
        });
        let message_service = MessageService::new(MessageServiceDependencies {
            participant_repository,
            message_repository,
            clock,
        });

        Self::new(Arc::new(participant_service), Arc::new(message_service))
    }
}
