//! 在线状态清理任务
//!
//! 按固定周期删除心跳超时的参与者，并为每个被删除的参与者追加一条
//! "left" 状态消息。公告失败的参与者保存在待重试列表中，下一轮继续公告。

use std::sync::Arc;
use std::time::Duration;

use domain::{MessageRepository, NewMessage, ParticipantName};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::clock::Clock;
use crate::error::ApplicationError;
use crate::services::ParticipantService;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaperConfig {
    /// 心跳年龄达到该值即视为离线
    pub heartbeat_timeout: Duration,
    /// 两轮清理之间的间隔
    pub reap_interval: Duration,
}

impl Default for ReaperConfig {
    fn default() -> Self {
        Self::from(&config::PresenceConfig::default())
    }
}

impl From<&config::PresenceConfig> for ReaperConfig {
    fn from(presence: &config::PresenceConfig) -> Self {
        Self {
            heartbeat_timeout: presence.heartbeat_timeout(),
            reap_interval: presence.reap_interval(),
        }
    }
}

/// 单轮清理的结果
#[derive(Debug, Default)]
pub struct ReapReport {
    /// 本轮从注册表删除的参与者
    pub evicted: Vec<ParticipantName>,
    /// 成功追加了离开消息的参与者（包括上一轮遗留的）
    pub announced: Vec<ParticipantName>,
    /// 公告失败的参与者，将在下一轮重试
    pub failed: Vec<(ParticipantName, ApplicationError)>,
    /// 重试前已重新注册的参与者，其离开消息被丢弃
    pub superseded: Vec<ParticipantName>,
}

impl ReapReport {
    pub fn is_empty(&self) -> bool {
        self.evicted.is_empty()
            && self.announced.is_empty()
            && self.failed.is_empty()
            && self.superseded.is_empty()
    }
}

pub struct PresenceReaper {
    participant_service: Arc<ParticipantService>,
    message_repository: Arc<dyn MessageRepository>,
    clock: Arc<dyn Clock>,
    config: ReaperConfig,
    pending: Mutex<Vec<ParticipantName>>,
}

impl PresenceReaper {
    pub fn new(
        participant_service: Arc<ParticipantService>,
        message_repository: Arc<dyn MessageRepository>,
        clock: Arc<dyn Clock>,
        config: ReaperConfig,
    ) -> Self {
        Self {
            participant_service,
            message_repository,
            clock,
            config,
            pending: Mutex::new(Vec::new()),
        }
    }

    /// 执行一轮清理。
    ///
    /// 删除失败时直接返回错误，待重试列表保持不变；单个参与者的公告失败
    /// 不会中断本轮其余参与者。上一轮遗留的参与者如果已经重新注册，
    /// 其离开消息不再写入，否则会排在新的 "joined" 之后。
    pub async fn reap_once(&self) -> Result<ReapReport, ApplicationError> {
        let evicted = self
            .participant_service
            .expire_older_than(self.config.heartbeat_timeout)
            .await?;

        let mut pending = self.pending.lock().await;
        let retries: Vec<ParticipantName> = pending.drain(..).collect();

        let mut report = ReapReport {
            evicted,
            ..ReapReport::default()
        };

        let mut queue = Vec::with_capacity(retries.len() + report.evicted.len());
        for name in retries {
            // 本轮再次被删除时，新的离开消息已覆盖这一条
            if report.evicted.contains(&name) {
                report.superseded.push(name);
                continue;
            }
            match self.participant_service.is_live(&name).await {
                Ok(false) => queue.push(name),
                Ok(true) => {
                    tracing::error!(participant = %name, "参与者已重新加入，丢弃未写入的离开消息");
                    report.superseded.push(name);
                }
                Err(err) => {
                    tracing::error!(participant = %name, error = %err, "无法确认参与者状态，下一轮重试");
                    pending.push(name.clone());
                    report.failed.push((name, err));
                }
            }
        }
        queue.extend(report.evicted.iter().cloned());

        for name in queue {
            let departure = NewMessage::left(name.clone(), self.clock.now());
            match self.message_repository.append(departure).await {
                Ok(message) => {
                    tracing::info!(participant = %name, message_id = %message.id, "参与者已离开");
                    report.announced.push(name);
                }
                Err(err) => {
                    tracing::error!(participant = %name, error = %err, "离开消息写入失败，下一轮重试");
                    pending.push(name.clone());
                    report.failed.push((name, err.into()));
                }
            }
        }

        tracing::debug!(
            evicted = report.evicted.len(),
            announced = report.announced.len(),
            failed = report.failed.len(),
            superseded = report.superseded.len(),
            "清理周期完成"
        );
        Ok(report)
    }

    /// 待重试公告的参与者快照
    pub async fn pending(&self) -> Vec<ParticipantName> {
        self.pending.lock().await.clone()
    }

    /// 在后台按 `reap_interval` 周期运行，第一轮在一个周期之后执行。
    pub fn spawn(self: Arc<Self>) -> ReaperHandle {
        let token = CancellationToken::new();
        let cancelled = token.clone();
        let period = self.config.reap_interval;

        tracing::info!(
            interval_secs = period.as_secs(),
            timeout_secs = self.config.heartbeat_timeout.as_secs(),
            "在线状态清理任务已启动"
        );

        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = cancelled.cancelled() => break,
                    _ = interval.tick() => {
                        if let Err(err) = self.reap_once().await {
                            tracing::error!(error = %err, "清理周期失败");
                        }
                    }
                }
            }

            tracing::info!("在线状态清理任务已停止");
        });

        ReaperHandle { token, task }
    }
}

/// 后台清理任务的句柄
pub struct ReaperHandle {
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl ReaperHandle {
    /// 取消任务并等待其退出；正在执行的一轮会先完成。
    pub async fn shutdown(self) {
        self.token.cancel();
        if let Err(err) = self.task.await {
            tracing::error!(error = %err, "清理任务异常退出");
        }
    }
}
