// 日志初始化

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// 默认日志过滤，ort库只记录 warn（减少运行时噪音）
const DEFAULT_FILTER: &str = "info,ort=warn";

/// 初始化日志系统
///
/// 日志写到 stderr，stdout 留给检测结果输出。级别可通过 `RUST_LOG` 覆盖。
pub fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .init();
}
