use std::net::SocketAddr;
use std::sync::Arc;

use kindle_core::{ChannelContext, ChannelId, EncodeError, GroupContext, Submission, WriteWorker};
use tokio::net::TcpStream;
use tokio::net::tcp::OwnedReadHalf;
use tracing::{debug, warn};

use crate::channel::TcpChannel;
use crate::config::TcpSettings;
use crate::error::{self, TransportError, map_io_error};

/// 一条已建立的 TCP 连接：上下文、写引擎与待交还的读半部。
///
/// # 教案式注释
///
/// ## 意图 (Why)
/// - 接受或建连成功后立即完成装配：套接字选项落地、拆分读写半部、为写半部创建
///   [`ChannelContext`] 与 [`WriteWorker`]，调用方拿到的就是一个“可提交消息”的连接；
/// - 读侧解码不属于本层职责，读半部原样交还调用方。
///
/// ## 契约 (What)
/// - [`TcpConnection::submit`] 与 [`WriteWorker::submit`] 语义一致，可被多个任务并发调用；
/// - [`TcpConnection::finish`]：先写完已提交的批次，再关闭上下文并发送 FIN；
/// - [`TcpConnection::close`]：立即关闭上下文并停止写引擎，未写出的批次以取消通知监听器，随后发送 FIN；
/// - 直接丢弃连接时，写引擎仍会在后台写完已入队批次，写半部随最后一次写入结束而释放。
pub struct TcpConnection<M> {
    ctx: Arc<ChannelContext<M>>,
    worker: WriteWorker<M>,
    channel: Arc<TcpChannel>,
    reader: Option<OwnedReadHalf>,
}

impl<M> TcpConnection<M>
where
    M: Send + 'static,
{
    pub(crate) fn establish(
        stream: TcpStream,
        group: Arc<GroupContext<M>>,
        settings: &TcpSettings,
    ) -> Result<Self, TransportError> {
        settings
            .apply(&stream)
            .map_err(|err| map_io_error(error::CONFIGURE, err))?;
        let local_addr = stream
            .local_addr()
            .map_err(|err| map_io_error(error::CONFIGURE, err))?;
        let peer_addr = stream
            .peer_addr()
            .map_err(|err| map_io_error(error::CONFIGURE, err))?;

        let (reader, writer) = stream.into_split();
        let channel = Arc::new(TcpChannel::new(writer, local_addr, peer_addr));
        let ctx = ChannelContext::new(group, channel.clone());
        let worker = WriteWorker::spawn(Arc::clone(&ctx));
        debug!(channel_id = %ctx.id(), %local_addr, %peer_addr, "tcp connection established");

        Ok(Self {
            ctx,
            worker,
            channel,
            reader: Some(reader),
        })
    }

    /// 编码并提交一批消息。
    pub fn submit(&self, items: Vec<M>) -> Result<Submission, EncodeError> {
        self.worker.submit(items)
    }

    /// 连接编号。
    pub fn id(&self) -> ChannelId {
        self.ctx.id()
    }

    /// 连接上下文。
    pub fn context(&self) -> &Arc<ChannelContext<M>> {
        &self.ctx
    }

    /// 本地地址。
    pub fn local_addr(&self) -> SocketAddr {
        self.channel.local_addr()
    }

    /// 对端地址。
    pub fn peer_addr(&self) -> SocketAddr {
        self.channel.peer_addr()
    }

    /// 取走读半部；只能取走一次。
    pub fn take_reader(&mut self) -> Option<OwnedReadHalf> {
        self.reader.take()
    }

    /// 写完已提交的批次后关闭连接的写方向。
    pub async fn finish(self) -> Result<(), TransportError> {
        let Self {
            ctx,
            worker,
            channel,
            ..
        } = self;
        worker.finish().await;
        ctx.close();
        shutdown(&ctx, &channel).await
    }

    /// 立即关闭：停止写引擎、取消未写出的批次并关闭写方向。
    pub async fn close(self) -> Result<(), TransportError> {
        let Self {
            ctx,
            worker,
            channel,
            ..
        } = self;
        ctx.close();
        worker.stop();
        worker.finish().await;
        shutdown(&ctx, &channel).await
    }
}

async fn shutdown<M>(ctx: &ChannelContext<M>, channel: &TcpChannel) -> Result<(), TransportError> {
    match channel.shutdown().await {
        Ok(()) => {
            debug!(channel_id = %ctx.id(), "tcp connection closed");
            Ok(())
        }
        Err(err) => {
            warn!(channel_id = %ctx.id(), error = %err, "tcp shutdown failed");
            Err(map_io_error(error::SHUTDOWN, err))
        }
    }
}

impl<M> std::fmt::Debug for TcpConnection<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TcpConnection")
            .field("id", &self.ctx.id())
            .field("local_addr", &self.channel.local_addr())
            .field("peer_addr", &self.channel.peer_addr())
            .field("closed", &self.ctx.is_closed())
            .finish()
    }
}
