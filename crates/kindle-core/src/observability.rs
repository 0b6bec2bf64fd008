//! `tracing` 订阅器的安装入口。
//!
//! 写引擎与重试引擎只通过 `tracing` 宏输出结构化事件（`channel_id`、`attempt`、`items`、`bytes` 等字段），
//! 是否以及如何收集由宿主决定。此处提供一个开箱即用的 `fmt + EnvFilter` 组合，供命令行工具与测试使用。

use tracing::dispatcher;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// 安装全局 fmt 订阅器。
///
/// # 教案式说明
/// - **逻辑（How）**：优先读取 `RUST_LOG`，缺省退回 `default_filter`（如 `"info"`、`"kindle_core=debug"`）；
///   `default_filter` 本身无法解析时退回 `info`；
/// - **契约（What）**：幂等；进程内已有全局订阅器（包括外部提前安装的）时不做任何事并返回 `false`，
///   成功安装返回 `true`。
pub fn init_tracing(default_filter: &str) -> bool {
    if dispatcher::has_been_set() {
        return false;
    }
    tracing_subscriber::registry()
        .with(build_env_filter(default_filter))
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok()
}

fn build_env_filter(default_filter: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}
