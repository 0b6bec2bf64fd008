//! 时间抽象模块，为重试引擎提供可注入的时钟。
//!
//! # 模块定位（Why）
//! - 重试引擎的 `elapsed` 字段必须从首次尝试开始计时，停止谓词据此实现整体截止；
//!   若直接读取系统时钟，基于耗时的策略将无法在测试中复现；
//! - 异步调度器的延迟同样通过 [`Clock::sleep`] 表达，测试可以替换为虚拟时钟。
//!
//! # 结构概览（What）
//! - [`Clock`]：`now` 与 `sleep` 两个原语；
//! - [`SystemClock`]：基于 Tokio 时间驱动的生产实现；
//! - [`MockClock`]：手动推进的虚拟时钟。

pub mod clock;

pub use clock::{Clock, MockClock, Sleep, SystemClock};
