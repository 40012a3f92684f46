//! # Clinic Web
//!
//! 诊所系统的 HTTP 接口：实体增删改查与统计查询。

pub mod error;
pub mod extract;
pub mod handlers;
pub mod server;

pub use error::{ApiError, ApiResult};
pub use extract::ApiJson;
pub use server::{AppState, WebServer};
