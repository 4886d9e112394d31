use std::sync::Arc;

use application::{MemoryMessageRepository, MemoryParticipantRepository};
use config::{AppConfig, DatabaseConfig, StorageBackend};
use domain::{MessageRepository, ParticipantRepository};
use sqlx::PgPool;
use thiserror::Error;

use crate::{
    migrations::MIGRATOR,
    repository::{create_pg_pool, PgStorage},
};

#[derive(Debug, Clone)]
pub struct InfrastructureConfig {
    pub database_url: String,
    pub max_connections: u32,
}

impl From<&DatabaseConfig> for InfrastructureConfig {
    fn from(database: &DatabaseConfig) -> Self {
        Self {
            database_url: database.url.clone(),
            max_connections: database.max_connections,
        }
    }
}

#[derive(Debug, Error)]
pub enum InfrastructureError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// 已打开的存储：两个仓储加上（PostgreSQL 后端时）连接池。
#[derive(Clone)]
pub struct Infrastructure {
    pub participant_repository: Arc<dyn ParticipantRepository>,
    pub message_repository: Arc<dyn MessageRepository>,
    pool: Option<PgPool>,
}

impl Infrastructure {
    /// 按 `storage.backend` 打开存储。
    pub async fn open(config: &AppConfig) -> Result<Self, InfrastructureError> {
        match config.storage.backend {
            StorageBackend::Postgres => Self::connect((&config.database).into()).await,
            StorageBackend::Memory => Ok(Self::in_memory()),
        }
    }

    /// 连接 PostgreSQL 并执行迁移。
    pub async fn connect(config: InfrastructureConfig) -> Result<Self, InfrastructureError> {
        let pool = create_pg_pool(&config.database_url, config.max_connections).await?;
        MIGRATOR.run(&pool).await?;
        tracing::info!(max_connections = config.max_connections, "数据库连接池已就绪");

        let storage = PgStorage::new(pool);
        Ok(Self {
            participant_repository: storage.participant_repository,
            message_repository: storage.message_repository,
            pool: Some(storage.pool),
        })
    }

    pub fn in_memory() -> Self {
        tracing::warn!("使用内存存储，重启后数据会丢失");
        Self {
            participant_repository: Arc::new(MemoryParticipantRepository::new()),
            message_repository: Arc::new(MemoryMessageRepository::new()),
            pool: None,
        }
    }

    pub fn pool(&self) -> Option<&PgPool> {
        self.pool.as_ref()
    }

    /// 关闭连接池；内存后端无需操作。
    pub async fn close(&self) {
        if let Some(pool) = &self.pool {
            pool.close().await;
            tracing::info!("数据库连接池已关闭");
        }
    }
}
