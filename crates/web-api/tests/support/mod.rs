#![allow(dead_code)]

use std::{net::SocketAddr, sync::Arc};

use application::{
    ManualClock, MemoryMessageRepository, MemoryParticipantRepository, PresenceReaper,
    ReaperConfig,
};
use reqwest::{Client, RequestBuilder, Response};
use serde_json::Value;
use time::macros::datetime;
use tokio::{net::TcpListener, sync::oneshot};
use web_api::{router, AppState, USER_HEADER};

/// 运行在随机端口上的完整服务，使用内存存储与手动时钟
pub struct TestApp {
    pub address: SocketAddr,
    pub client: Client,
    pub clock: Arc<ManualClock>,
    pub reaper: PresenceReaper,
    shutdown: Option<oneshot::Sender<()>>,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let clock = Arc::new(ManualClock::new(datetime!(2024-01-01 15:04:05 UTC)));
        let participants = Arc::new(MemoryParticipantRepository::new());
        let messages = Arc::new(MemoryMessageRepository::new());

        let state = AppState::from_repositories(participants, messages.clone(), clock.clone());
        let reaper = PresenceReaper::new(
            state.participant_service.clone(),
            messages,
            clock.clone(),
            ReaperConfig::default(),
        );

        let app = router(state, &["*".to_string()]);
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let address = listener.local_addr().expect("addr");
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .ok();
        });

        Self {
            address,
            client: Client::new(),
            clock,
            reaper,
            shutdown: Some(shutdown_tx),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.address, path)
    }

    pub fn as_user(&self, builder: RequestBuilder, user: &str) -> RequestBuilder {
        builder.header(USER_HEADER, user)
    }

    pub async fn register(&self, name: &str) -> Response {
        self.client
            .post(self.url("/participants"))
            .json(&serde_json::json!({ "name": name }))
            .send()
            .await
            .expect("register request")
    }

    pub async fn post_message(&self, user: &str, to: &str, text: &str, kind: &str) -> Response {
        self.as_user(self.client.post(self.url("/messages")), user)
            .json(&serde_json::json!({ "to": to, "text": text, "type": kind }))
            .send()
            .await
            .expect("post message request")
    }

    pub async fn messages(&self, user: Option<&str>, query: &str) -> Vec<Value> {
        let mut request = self.client.get(self.url(&format!("/messages{query}")));
        if let Some(user) = user {
            request = request.header(USER_HEADER, user);
        }
        let response = request.send().await.expect("list messages request");
        assert_eq!(response.status(), 200);
        response.json().await.expect("messages json")
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}

pub fn texts(messages: &[Value]) -> Vec<&str> {
    messages
        .iter()
        .map(|message| message["text"].as_str().expect("text"))
        .collect()
}

/// 错误响应中出错的字段名
pub async fn error_fields(response: Response) -> Vec<String> {
    let body: Value = response.json().await.expect("error json");
    body["details"]
        .as_array()
        .map(|details| {
            details
                .iter()
                .filter_map(|detail| detail["field"].as_str().map(str::to_owned))
                .collect()
        })
        .unwrap_or_default()
}
