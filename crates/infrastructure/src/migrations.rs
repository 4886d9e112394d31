use sqlx::migrate::Migrator;

/// 嵌入的数据库迁移（`migrations/` 目录）
pub static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");
