//! 结构化日志初始化

use crate::config::LoggingConfig;
use tracing::Subscriber;
use tracing_subscriber::{
    fmt::format::FmtSpan, layer::SubscriberExt, registry::LookupSpan, util::SubscriberInitExt,
    EnvFilter, Layer,
};

/// 安装全局 subscriber；`RUST_LOG` 优先于配置中的级别
pub fn init_telemetry(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer(&config.format))
        .try_init();

    if installed.is_err() {
        tracing::debug!("Global subscriber already set, keeping it");
        return;
    }

    tracing::info!(level = %config.level, format = %config.format, "Telemetry initialized");
}

fn fmt_layer<S>(format: &str) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    let base = tracing_subscriber::fmt::layer().with_target(false);

    match format.to_ascii_lowercase().as_str() {
        // 生产环境，span 关闭时输出耗时
        "json" => base.json().with_span_events(FmtSpan::CLOSE).boxed(),
        "pretty" => base.pretty().boxed(),
        _ => base.compact().boxed(),
    }
}
