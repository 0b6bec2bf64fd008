use std::net::SocketAddr;

use bytes::Bytes;
use futures::FutureExt;
use kindle_core::{AioChannel, WriteCompletion, WriteError};
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::sync::Mutex as AsyncMutex;
use tracing::trace;

/// TCP 连接写半部上的物理写入原语。
///
/// # 教案式注释
///
/// ## 意图 (Why)
/// - 写引擎只需要“发起一次写入并等待它写满”，读半部交还给调用方自行处理，
///   因此这里只持有 `OwnedWriteHalf`，读写天然全双工。
///
/// ## 逻辑 (How)
/// - `write` 返回的完成信号内部以 `write_all` 循环处理部分写入，直到缓冲完全写出或出错；
/// - 写半部由 `tokio::sync::Mutex` 包裹，仅用于与 [`TcpChannel::shutdown`] 互斥；
///   写引擎保证同一时刻至多一个完成信号在等待，正常写路径上不存在竞争。
///
/// ## 契约 (What)
/// - 完成信号被丢弃时，尚未写出的残余字节不再写出；
/// - `shutdown` 发送 FIN，之后的写入以 IO 错误完成。
#[derive(Debug)]
pub struct TcpChannel {
    writer: AsyncMutex<OwnedWriteHalf>,
    local_addr: SocketAddr,
    peer_addr: SocketAddr,
}

impl TcpChannel {
    pub(crate) fn new(
        writer: OwnedWriteHalf,
        local_addr: SocketAddr,
        peer_addr: SocketAddr,
    ) -> Self {
        Self {
            writer: AsyncMutex::new(writer),
            local_addr,
            peer_addr,
        }
    }

    /// 本地地址。
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// 对端地址。
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    /// 关闭写方向（发送 FIN）。
    pub async fn shutdown(&self) -> std::io::Result<()> {
        let mut writer = self.writer.lock().await;
        writer.shutdown().await
    }
}

impl AioChannel for TcpChannel {
    fn write(&self, buffer: Bytes) -> Result<WriteCompletion<'_>, WriteError> {
        Ok(async move {
            let mut writer = self.writer.lock().await;
            writer.write_all(&buffer).await.map_err(WriteError::Io)?;
            trace!(peer = %self.peer_addr, bytes = buffer.len(), "tcp write completed");
            Ok::<(), WriteError>(())
        }
        .boxed())
    }
}
