//! 错误定义模块

use thiserror::Error;

/// 诊所系统统一错误类型
#[derive(Error, Debug)]
pub enum ClinicError {
    #[error("配置错误: {0}")]
    Config(String),

    #[error("数据库错误: {0}")]
    Database(String),

    #[error("验证错误: {0}")]
    Validation(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("冲突: {0}")]
    Conflict(String),

    #[error("序列化错误: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("系统内部错误: {0}")]
    Internal(String),
}

impl ClinicError {
    /// 是否属于服务端故障（需要返回通用错误信息）
    pub fn is_server_fault(&self) -> bool {
        matches!(
            self,
            ClinicError::Config(_)
                | ClinicError::Database(_)
                | ClinicError::Serialization(_)
                | ClinicError::Io(_)
                | ClinicError::Internal(_)
        )
    }
}

#[cfg(feature = "database")]
impl From<sqlx::Error> for ClinicError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ClinicError::NotFound(err.to_string()),
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                ClinicError::Conflict(db_err.message().to_string())
            }
            other => ClinicError::Database(other.to_string()),
        }
    }
}

/// 诊所系统统一结果类型
pub type Result<T> = std::result::Result<T, ClinicError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_fault_classification() {
        assert!(ClinicError::Database("timeout".into()).is_server_fault());
        assert!(ClinicError::Internal("boom".into()).is_server_fault());
        assert!(!ClinicError::NotFound("patient".into()).is_server_fault());
        assert!(!ClinicError::Validation("age".into()).is_server_fault());
        assert!(!ClinicError::Conflict("slot".into()).is_server_fault());
    }
}
