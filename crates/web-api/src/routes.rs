use axum::{
    extract::{FromRequest, Path, Query, State},
    http::{HeaderValue, Method, StatusCode},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use application::{
    EditMessageRequest, MessageDto, ParticipantDto, PostMessageRequest, RegisterParticipantRequest,
};
use domain::{MessageId, MessageKind};

use crate::{
    error::ApiError,
    extract::Viewer,
    state::AppState,
};

/// JSON 请求体，解析失败统一转成 422
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
struct ApiJson<T>(T);

#[derive(Debug, Deserialize, Validate)]
struct RegisterPayload {
    #[validate(required, length(min = 1))]
    name: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
struct MessagePayload {
    /// 由 `User` 请求头填入
    #[serde(skip)]
    #[validate(required, length(min = 1))]
    from: Option<String>,
    #[validate(required, length(min = 1))]
    to: Option<String>,
    #[validate(required, length(min = 1))]
    text: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
}

struct MessageContent {
    from: String,
    to: String,
    text: String,
    kind: MessageKind,
}

impl MessagePayload {
    /// 一次性报告所有不合法的字段；`type` 单独校验，错误键与 JSON 字段名一致
    fn into_content(mut self, viewer: Viewer) -> Result<MessageContent, ApiError> {
        self.from = viewer.0;
        let mut errors = self.validate().err().unwrap_or_default();
        match self.kind.as_deref() {
            None => errors.add("type", ValidationError::new("required")),
            Some(kind) => {
                if let Err(err) = validate_client_kind(kind) {
                    errors.add("type", err);
                }
            }
        }
        if !errors.is_empty() {
            return Err(errors.into());
        }

        match (self.from, self.to, self.text, self.kind) {
            (Some(from), Some(to), Some(text), Some(kind)) => Ok(MessageContent {
                from,
                to,
                text,
                kind: kind.parse()?,
            }),
            _ => Err(ApiError::validation(Vec::new())),
        }
    }
}

fn validate_client_kind(value: &str) -> Result<(), ValidationError> {
    match value.parse::<MessageKind>() {
        Ok(kind) if kind.is_client_postable() => Ok(()),
        _ => Err(ValidationError::new("type")
            .with_message("must be one of: message, private_message".into())),
    }
}

#[derive(Debug, Deserialize)]
struct ListMessagesQuery {
    limit: Option<String>,
}

/// 无法解析的 ID 按"不存在"处理
fn parse_message_id(raw: &str) -> Result<MessageId, ApiError> {
    Uuid::parse_str(raw)
        .map(MessageId::from)
        .map_err(|_| ApiError::not_found())
}

pub fn router(state: AppState, cors_origins: &[String]) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/participants",
            post(register_participant).get(list_participants),
        )
        .route("/messages", post(post_message).get(list_messages))
        .route("/messages/{id}", put(edit_message).delete(delete_message))
        .route("/status", post(heartbeat))
        .layer(cors_layer(cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.is_empty() || origins.iter().any(|origin| origin == "*") {
        AllowOrigin::any()
    } else {
        let parsed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(err) => {
                    tracing::warn!(origin = %origin, error = %err, "忽略无效的 CORS 来源");
                    None
                }
            })
            .collect();
        AllowOrigin::list(parsed)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any)
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn register_participant(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterPayload>,
) -> Result<(StatusCode, Json<ParticipantDto>), ApiError> {
    payload.validate()?;
    let name = payload.name.unwrap_or_default();

    let participant = state
        .participant_service
        .register(RegisterParticipantRequest { name })
        .await?;

    Ok((StatusCode::CREATED, Json(ParticipantDto::from(&participant))))
}

async fn list_participants(
    State(state): State<AppState>,
) -> Result<Json<Vec<ParticipantDto>>, ApiError> {
    let participants = state.participant_service.list().await?;
    Ok(Json(participants.iter().map(ParticipantDto::from).collect()))
}

async fn post_message(
    State(state): State<AppState>,
    viewer: Viewer,
    ApiJson(payload): ApiJson<MessagePayload>,
) -> Result<(StatusCode, Json<MessageDto>), ApiError> {
    let content = payload.into_content(viewer)?;

    let message = state
        .message_service
        .post_message(PostMessageRequest {
            from: content.from,
            to: content.to,
            text: content.text,
            kind: content.kind,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(MessageDto::from(&message))))
}

async fn list_messages(
    State(state): State<AppState>,
    Viewer(viewer): Viewer,
    Query(query): Query<ListMessagesQuery>,
) -> Result<Json<Vec<MessageDto>>, ApiError> {
    let messages = state
        .message_service
        .list_messages(viewer, query.limit)
        .await?;

    Ok(Json(messages.iter().map(MessageDto::from).collect()))
}

async fn heartbeat(
    State(state): State<AppState>,
    Viewer(viewer): Viewer,
) -> Result<StatusCode, ApiError> {
    state.participant_service.heartbeat(viewer).await?;
    Ok(StatusCode::OK)
}

async fn delete_message(
    State(state): State<AppState>,
    Viewer(viewer): Viewer,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_message_id(&id)?;
    state.message_service.delete_message(viewer, id).await?;
    Ok(StatusCode::OK)
}

async fn edit_message(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<MessagePayload>,
) -> Result<Json<MessageDto>, ApiError> {
    let content = payload.into_content(viewer)?;
    let id = parse_message_id(&id)?;

    let message = state
        .message_service
        .edit_message(EditMessageRequest {
            from: content.from,
            id,
            to: content.to,
            text: content.text,
            kind: content.kind,
        })
        .await?;

    Ok(Json(MessageDto::from(&message)))
}
