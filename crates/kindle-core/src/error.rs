//! # error 模块说明
//!
//! ## 角色定位（Why）
//! - 集中定义写引擎、重试引擎与配置层的错误语义，所有枚举均派生 `thiserror::Error`；
//! - 写引擎错误在同一批次的多条消息之间共享，以引用借给每一次监听器回调，不要求 `Clone`。
//!
//! ## 分类（What）
//! - [`EncodeError`]：编码器抛出，同步返回给 `submit` 的调用方；
//! - [`WriteError`]：物理写入的发起或完成失败、连接已关闭、写入被取消，异步交付给监听器；
//! - [`RetryError`]：重试引擎终止时向调用方暴露的最后一次失败；
//! - [`ConfigError`]：TOML 配置解析或校验失败。

use std::borrow::Cow;
use std::io;
use std::time::Duration;

use thiserror::Error;

/// 编码器无法把出站消息转换为字节缓冲时返回的错误。
///
/// 编码在入队之前同步完成，因此该错误直接返回给 `WriteWorker::submit` 的调用方，
/// 同一批次内的其余消息也不会入队。
#[derive(Debug, Error)]
pub enum EncodeError {
    /// 消息内容不满足编码约束。
    #[error("failed to encode message: {reason}")]
    Message { reason: Cow<'static, str> },

    /// 编码过程中写缓冲失败。
    #[error("failed to encode message: {0}")]
    Io(#[from] io::Error),
}

impl EncodeError {
    /// 以可读原因构造编码错误。
    pub fn new(reason: impl Into<Cow<'static, str>>) -> Self {
        Self::Message {
            reason: reason.into(),
        }
    }
}

/// 物理写入的结果错误，逐条交付给 [`AioListener`](crate::aio::AioListener)。
#[derive(Debug, Error)]
pub enum WriteError {
    /// 发起写入或写入完成时的 IO 失败。
    #[error("channel write failed: {0}")]
    Io(#[from] io::Error),

    /// 写入前发现连接已经关闭，批次未被写出。
    #[error("connection closed before the batch was written")]
    ConnectionClosed,

    /// 写引擎已停止，批次被取消。
    #[error("write cancelled by worker shutdown")]
    Cancelled,
}

impl WriteError {
    /// 是否为关闭/取消类终止，而非底层 IO 故障。
    pub fn is_shutdown(&self) -> bool {
        matches!(self, Self::ConnectionClosed | Self::Cancelled)
    }
}

/// 重试引擎的终止错误。
///
/// # 教案式说明
/// - **意图 (Why)**：调用方只应看到“最后一次失败”或明确的终止原因，不应看到引擎内部的中间态；
/// - **契约 (What)**：
///   - `Operation(E)`：最后一次尝试捕获的业务错误，原样返回；
///   - `TimedOut`：最后一次尝试超出单次时限；
///   - `Rejected`：最后一次尝试成功，但结果被重试谓词拒绝且停止谓词要求放弃；
///   - `Cancelled`：调用方主动取消了异步重试；
///   - `Aborted`：调度器在完成前丢弃了重试任务（例如运行时关闭）。
#[derive(Debug, Error)]
pub enum RetryError<E> {
    /// 操作本身返回的错误。
    #[error("{0}")]
    Operation(E),

    /// 单次尝试超出时限。
    #[error("attempt exceeded time limit of {limit:?}")]
    TimedOut { limit: Duration },

    /// 结果被重试谓词拒绝，且停止谓词要求放弃。
    #[error("result rejected by retry predicate after {attempts} attempts")]
    Rejected { attempts: u32 },

    /// 调用方取消了重试。
    #[error("retry cancelled")]
    Cancelled,

    /// 重试任务在完成前被调度器丢弃。
    #[error("retry aborted before completion")]
    Aborted,
}

impl<E> RetryError<E> {
    /// 若为业务错误则返回其引用。
    pub fn operation(&self) -> Option<&E> {
        match self {
            Self::Operation(err) => Some(err),
            _ => None,
        }
    }

    /// 取出业务错误。
    pub fn into_operation(self) -> Option<E> {
        match self {
            Self::Operation(err) => Some(err),
            _ => None,
        }
    }

    /// 是否由单次时限触发。
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::TimedOut { .. })
    }
}

/// 配置解析或校验失败。
#[derive(Debug, Error)]
pub enum ConfigError {
    /// TOML 语法或类型不匹配。
    #[error("malformed configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// 字段取值非法。
    #[error("invalid value for `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: Cow<'static, str>,
    },
}
