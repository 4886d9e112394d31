//! Web API 层。
//!
//! 提供 Axum 路由，将 HTTP 请求委托给应用层的用例服务。
//! 调用方身份通过 `User` 请求头声明。

mod error;
mod extract;
mod routes;
mod state;

pub use error::{ApiError, ErrorBody, FieldError};
pub use extract::{Viewer, USER_HEADER};
pub use routes::router;
pub use state::AppState;
