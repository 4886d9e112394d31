use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};

/// 调用方身份请求头
pub const USER_HEADER: &str = "user";

/// `User` 请求头中声明的身份；缺失或不是合法 UTF-8 时为 `None`。
#[derive(Debug, Clone, Default)]
pub struct Viewer(pub Option<String>);

impl<S> FromRequestParts<S> for Viewer
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let viewer = parts
            .headers
            .get(USER_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        Ok(Viewer(viewer))
    }
}
