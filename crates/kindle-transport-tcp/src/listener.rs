use std::net::SocketAddr;
use std::sync::Arc;

use kindle_core::GroupContext;
use tokio::net::TcpListener as TokioTcpListener;
use tracing::debug;

use crate::config::TcpSettings;
use crate::connection::TcpConnection;
use crate::error::{self, TransportError, map_io_error};

/// 对 Tokio `TcpListener` 的语义封装。
///
/// # 教案式注释
///
/// ## 意图 (Why)
/// - 服务端的每条入站连接共用同一个 [`GroupContext`]（编码器与监听器）和同一份 [`TcpSettings`]，
///   在监听器上绑定一次，`accept` 时直接装配出 [`TcpConnection`]。
///
/// ## 逻辑 (How)
/// - `bind`：调用 Tokio 绑定并记录实际绑定地址（端口 0 时由内核分配）；
/// - `accept`：等待入站连接，应用套接字选项后拆分读写半部并启动写引擎。
///
/// ## 契约 (What)
/// - **前置条件**：调用方必须在 Tokio 运行时中使用该监听器；
/// - **错误语义**：绑定/接受/配置失败时返回带稳定错误码的 [`TransportError`]，
///   单次 `accept` 失败不影响监听器继续工作。
pub struct TcpListener<M> {
    inner: TokioTcpListener,
    local_addr: SocketAddr,
    group: Arc<GroupContext<M>>,
    settings: TcpSettings,
}

impl<M> TcpListener<M>
where
    M: Send + 'static,
{
    /// 绑定到指定地址。
    pub async fn bind(
        addr: SocketAddr,
        group: Arc<GroupContext<M>>,
        settings: TcpSettings,
    ) -> Result<Self, TransportError> {
        settings.validate()?;
        let inner = TokioTcpListener::bind(addr)
            .await
            .map_err(|err| map_io_error(error::BIND, err))?;
        let local_addr = inner
            .local_addr()
            .map_err(|err| map_io_error(error::BIND, err))?;
        debug!(%local_addr, group = group.name(), "tcp listener bound");
        Ok(Self {
            inner,
            local_addr,
            group,
            settings,
        })
    }

    /// 实际绑定的地址。
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// 新连接继承的设置。
    pub fn settings(&self) -> &TcpSettings {
        &self.settings
    }

    /// 接受一个入站连接。
    pub async fn accept(&self) -> Result<TcpConnection<M>, TransportError> {
        let (stream, remote) = self
            .inner
            .accept()
            .await
            .map_err(|err| map_io_error(error::ACCEPT, err))?;
        debug!(local_addr = %self.local_addr, %remote, "tcp connection accepted");
        TcpConnection::establish(stream, Arc::clone(&self.group), &self.settings)
    }
}

impl<M> std::fmt::Debug for TcpListener<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TcpListener")
            .field("local_addr", &self.local_addr)
            .field("group", &self.group.name())
            .finish()
    }
}
