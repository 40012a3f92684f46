//! # 诊所数据库模块
//!
//! 基于 PostgreSQL 的记录存储，提供连接池、建表与 [`clinic_core::RecordStore`] 实现。

pub mod connection;
pub mod models;
pub mod queries;

// 重新导出主要类型
pub use connection::{DatabasePool, PoolSettings};
pub use queries::PgRecordStore;
