//! 日志系统

pub mod formatter;

use crate::display::Palette;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

pub use formatter::{StatusFormatter, SUCCESS_TARGET};

/// 日志配置
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// 日志级别
    pub level: String,
    /// JSON 日志文件路径
    pub file_path: Option<PathBuf>,
    /// 是否启用彩色输出
    pub colored: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file_path: None,
            colored: true,
        }
    }
}

/// 持有文件日志的后台写线程，drop 时刷新
#[must_use]
pub struct LoggingGuard {
    _file: Option<WorkerGuard>,
}

/// 解析日志级别，未知值回退到 info
pub fn parse_level(level: &str) -> tracing::Level {
    match level.to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    }
}

fn env_filter(level: tracing::Level) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("xmrig_manager={}", level.as_str().to_lowercase()))
    })
}

/// 初始化日志系统
pub fn init_logging(config: LogConfig) -> anyhow::Result<LoggingGuard> {
    let level = parse_level(&config.level);
    let palette = Palette::new(config.colored);

    let console_layer = fmt::layer()
        .with_ansi(config.colored)
        .event_format(StatusFormatter::new(palette))
        .with_filter(env_filter(level));

    let registry = tracing_subscriber::registry().with(console_layer);

    if let Some(file_path) = config.file_path {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&file_path)
            .map_err(|e| anyhow::anyhow!("Failed to open log file {}: {}", file_path.display(), e))?;

        let (writer, guard) = tracing_appender::non_blocking(file);

        let file_layer = fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
            .with_target(true)
            .json()
            .with_filter(env_filter(level));

        registry.with(file_layer).try_init()?;

        Ok(LoggingGuard { _file: Some(guard) })
    } else {
        registry.try_init()?;

        Ok(LoggingGuard { _file: None })
    }
}

/// 成功状态 `[✓]`
#[macro_export]
macro_rules! status_success {
    ($($arg:tt)*) => {
        tracing::info!(target: "xmrig_manager::success", $($arg)*)
    };
}
