//! # Clinic Core
//!
//! 诊所系统的核心模块，提供领域模型、状态历史、错误定义、记录存储接口与通用工具。

#[macro_use]
mod labels;

pub mod error;
pub mod history;
pub mod models;
pub mod store;
pub mod utils;
pub mod validation;

pub use error::{ClinicError, Result};
pub use history::{StatusChange, StatusHistory};
pub use models::*;
pub use store::{MemoryStore, RecordStore};
pub use validation::Validate;
