//! 连接级有序异步写引擎。
//!
//! # 模块结构
//! - [`AioChannel`]：物理写入原语，“发起”与“完成”分两阶段；
//! - [`AioHandler`]：出站消息编码器；
//! - [`AioListener`]：逐条消息的写完成回调；
//! - [`GroupContext`] / [`ChannelContext`]：组级共享配置与连接级状态包；
//! - [`WriteWorker`]：单消费者队列驱动的写引擎，保证同一连接上的物理写入按提交顺序串行发起。
//!
//! # 使用方式
//! 传输层为每条连接构造一个 [`ChannelContext`] 与一个 [`WriteWorker`]，之后任意任务都可以并发调用
//! [`WriteWorker::submit`]；字节在连接上的出现顺序与各次 `submit` 的先后一致。

mod channel;
mod context;
mod handler;
mod listener;
mod worker;

pub use channel::{AioChannel, WriteCompletion};
pub use context::{ChannelContext, ChannelId, GroupContext};
pub use handler::{AioHandler, EncodedBuffer};
pub use listener::AioListener;
pub use worker::{Submission, WriteWorker};
