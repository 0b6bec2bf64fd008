//! 通用重试/退避引擎。
//!
//! # 模块定位（Why）
//! - 连接建立、远程调用、资源获取等可失败操作共享同一套策略语义：重试谓词、停止谓词、
//!   单次时限、等待间隔，以及按序触发的 retry/success/fail 监听器；
//! - 同步 [`Retryer`] 与异步 [`AsyncRetryer`] 复用 [`RetryPolicy`] 的同一套裁决流程，
//!   保证两种引擎的监听器触发顺序一致。
//!
//! # 裁决顺序（What）
//! 1. 无条件触发 `on_retry`；
//! 2. 重试谓词为 `false`：按结果触发 `on_success`/`on_fail` 并返回；
//! 3. 停止谓词为 `true`：触发 `on_fail` 并返回最后一次失败；
//! 4. 否则等待 `wait` 后以递增序号再次尝试。

pub mod async_retryer;
pub mod attempt;
pub mod policy;
pub mod predicates;
pub mod retryer;

pub use async_retryer::{AsyncRetryer, RetryHandle, RetryState};
pub use attempt::Attempt;
pub use policy::{AttemptListener, AttemptPredicate, RetryPolicy, RetryPolicyBuilder};
pub use retryer::Retryer;
