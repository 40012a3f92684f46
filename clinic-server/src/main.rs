//! 诊所服务器主程序

mod config;
mod seed;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use clinic_core::{MemoryStore, RecordStore};
use clinic_database::{DatabasePool, PgRecordStore};
use clinic_web::{AppState, WebServer};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::config::{ClinicConfig, LogFormat, LoggingConfig, StorageBackend};

/// 诊所服务器命令行参数
#[derive(Parser, Debug)]
#[command(name = "clinic-server")]
#[command(about = "诊所管理后端服务器（患者、医生、预约、诊疗记录与统计）")]
struct Args {
    /// 监听主机
    #[arg(long)]
    host: Option<String>,

    /// 服务器端口
    #[arg(short, long)]
    port: Option<u16>,

    /// 配置文件路径
    #[arg(short, long)]
    config: Option<String>,

    /// 日志级别
    #[arg(short, long)]
    log_level: Option<String>,

    /// 存储后端
    #[arg(short, long, value_enum)]
    storage: Option<StorageBackend>,
}

impl Args {
    /// 命令行参数覆盖配置文件与环境变量
    fn apply(&self, config: &mut ClinicConfig) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
        if let Some(backend) = self.storage {
            config.storage.backend = backend;
        }
    }
}

/// 初始化日志；`RUST_LOG` 优先于配置
fn init_logging(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match logging.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

async fn open_store(config: &ClinicConfig) -> Result<Arc<dyn RecordStore>> {
    let store: Arc<dyn RecordStore> = match config.storage.backend {
        StorageBackend::Memory => {
            info!("Using in-memory store");
            Arc::new(MemoryStore::new())
        }
        StorageBackend::Postgres => {
            let pool = DatabasePool::connect(&config.database.pool_settings())
                .await
                .context("Failed to connect to database")?;
            let store = PgRecordStore::new(pool);
            store.create_tables().await?;
            Arc::new(store)
        }
    };
    Ok(store)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = ClinicConfig::load(args.config.as_deref())?;
    args.apply(&mut config);
    init_logging(&config.logging);
    config.validate()?;

    info!("启动诊所服务器...");
    info!("  监听地址: {}:{}", config.server.host, config.server.port);
    info!("  存储后端: {:?}", config.storage.backend);

    let store = open_store(&config).await?;
    if config.storage.seed_if_empty {
        seed::seed_if_empty(store.as_ref(), Utc::now()).await?;
    }

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid listen address")?;
    let server = WebServer::new(addr, AppState::new(store, config.dashboard.clone()));

    if let Err(e) = server.run().await {
        error!("服务器启动失败: {}", e);
        return Err(e.into());
    }

    Ok(())
}
