use std::io;

use kindle_core::{ConfigError, RetryError};
use thiserror::Error;
use tokio::runtime::TryCurrentError;

/// 描述一次底层操作对应的稳定错误码与默认文案。
#[derive(Clone, Copy, Debug)]
pub(crate) struct OperationKind {
    pub code: &'static str,
    pub message: &'static str,
}

pub(crate) const BIND: OperationKind = OperationKind {
    code: "kindle.transport.tcp.bind_failed",
    message: "tcp bind",
};
pub(crate) const ACCEPT: OperationKind = OperationKind {
    code: "kindle.transport.tcp.accept_failed",
    message: "tcp accept",
};
pub(crate) const CONNECT: OperationKind = OperationKind {
    code: "kindle.transport.tcp.connect_failed",
    message: "tcp connect",
};
pub(crate) const CONFIGURE: OperationKind = OperationKind {
    code: "kindle.transport.tcp.configure_failed",
    message: "tcp configure",
};
pub(crate) const SHUTDOWN: OperationKind = OperationKind {
    code: "kindle.transport.tcp.shutdown_failed",
    message: "tcp shutdown",
};

const RETRY_EXHAUSTED_CODE: &str = "kindle.transport.tcp.connect_exhausted";
const CONFIG_CODE: &str = "kindle.transport.tcp.invalid_config";
const RUNTIME_CODE: &str = "kindle.transport.tcp.no_runtime";

/// TCP 传输层错误。
///
/// # 教案式说明
/// - **意图 (Why)**：绑定、接受、建连、套接字配置与关闭各自携带稳定错误码，便于日志检索与告警聚合；
/// - **契约 (What)**：
///   - `Io`：单次底层操作失败，`code` 与 `operation` 来自内部的操作描述表；
///   - `ConnectExhausted`：带重试的建连在策略终止时仍未成功，`source` 为最后一次尝试的失败；
///   - `Config`：传输配置非法；
///   - `NoRuntime`：在 Tokio 运行时之外发起需要调度器的操作。
#[derive(Debug, Error)]
pub enum TransportError {
    /// 底层 IO 失败。
    #[error("{operation}: {source}")]
    Io {
        code: &'static str,
        operation: &'static str,
        #[source]
        source: io::Error,
    },

    /// 重试策略终止后仍未建立连接。
    #[error("tcp connect gave up: {source}")]
    ConnectExhausted {
        #[source]
        source: RetryError<io::Error>,
    },

    /// 传输配置非法。
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// 当前线程不在 Tokio 运行时内。
    #[error("tcp transport requires a tokio runtime: {0}")]
    NoRuntime(#[from] TryCurrentError),
}

impl TransportError {
    /// 稳定错误码。
    pub fn code(&self) -> &'static str {
        match self {
            Self::Io { code, .. } => *code,
            Self::ConnectExhausted { .. } => RETRY_EXHAUSTED_CODE,
            Self::Config(_) => CONFIG_CODE,
            Self::NoRuntime(_) => RUNTIME_CODE,
        }
    }

    /// 底层 IO 错误（若有）。
    pub fn io_error(&self) -> Option<&io::Error> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::ConnectExhausted { source } => source.operation(),
            _ => None,
        }
    }
}

/// 将 IO 错误映射为带稳定错误码的传输错误。
pub(crate) fn map_io_error(kind: OperationKind, error: io::Error) -> TransportError {
    TransportError::Io {
        code: kind.code,
        operation: kind.message,
        source: error,
    }
}

/// 建连失败是否值得重试：对端暂不可达、被拒绝或连接中途被重置。
pub(crate) fn is_transient(error: &io::Error) -> bool {
    use io::ErrorKind;
    matches!(
        error.kind(),
        ErrorKind::ConnectionRefused
            | ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::NotConnected
            | ErrorKind::AddrNotAvailable
            | ErrorKind::TimedOut
            | ErrorKind::Interrupted
            | ErrorKind::WouldBlock
    )
}
