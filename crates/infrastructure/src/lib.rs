//! 基础设施层实现。
//!
//! 提供 PostgreSQL 仓储、连接池与迁移，并按配置选择存储后端。

pub mod builder;
pub mod migrations;
pub mod repository;

pub use builder::{Infrastructure, InfrastructureConfig, InfrastructureError};
pub use migrations::MIGRATOR;
pub use repository::{create_pg_pool, PgMessageRepository, PgParticipantRepository, PgStorage};
