#![deny(unsafe_code)]
#![doc = "kindle-core: 连接级有序异步写引擎与通用重试/退避引擎。"]
#![doc = ""]
#![doc = "== 模块地图 =="]
#![doc = "- [`aio`]：`ChannelContext`、编码/监听/写入三类契约，以及按提交顺序串行化物理写入的 [`aio::WriteWorker`]；"]
#![doc = "- [`retry`]：不可变的 [`retry::Attempt`] 记录、[`retry::RetryPolicy`] 策略集、同步 [`retry::Retryer`] 与异步 [`retry::AsyncRetryer`]；"]
#![doc = "- [`runtime`]：延迟调度基座 [`runtime::DelayScheduler`] 与 Tokio 实现；"]
#![doc = "- [`time`]：可注入时钟，生产用 [`time::SystemClock`]，测试用 [`time::MockClock`]；"]
#![doc = "- [`config`]：TOML 驱动的重试参数；[`observability`]：`tracing` 订阅器的安装入口。"]
#![doc = ""]
#![doc = "== 运行时约束 =="]
#![doc = "写引擎与异步重试器均依赖 Tokio 运行时派生后台任务；同步 [`retry::Retryer`] 不依赖运行时。"]

pub mod aio;
pub mod config;
pub mod error;
pub mod observability;
pub mod retry;
pub mod runtime;
pub mod time;

pub use aio::{
    AioChannel, AioHandler, AioListener, ChannelContext, ChannelId, EncodedBuffer, GroupContext,
    Submission, WriteCompletion, WriteWorker,
};
pub use config::RetrySettings;
pub use error::{ConfigError, EncodeError, RetryError, WriteError};
pub use retry::{AsyncRetryer, Attempt, RetryHandle, RetryPolicy, RetryPolicyBuilder, Retryer};
pub use runtime::{DelayScheduler, TokioScheduler};
pub use time::{Clock, MockClock, SystemClock};

/// 统一返回别名，默认错误类型需由调用方显式声明。
pub type Result<T, E> = core::result::Result<T, E>;
