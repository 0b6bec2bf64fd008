use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use kindle_core::retry::predicates::retry_if_error;
use kindle_core::{AsyncRetryer, Attempt, GroupContext, TokioScheduler};
use tokio::net::TcpStream;
use tracing::debug;

use crate::config::TcpSettings;
use crate::connection::TcpConnection;
use crate::error::{self, TransportError, is_transient, map_io_error};

/// 单次建连。
pub async fn connect<M>(
    addr: SocketAddr,
    group: Arc<GroupContext<M>>,
    settings: &TcpSettings,
) -> Result<TcpConnection<M>, TransportError>
where
    M: Send + 'static,
{
    let stream = TcpStream::connect(addr)
        .await
        .map_err(|err| map_io_error(error::CONNECT, err))?;
    TcpConnection::establish(stream, group, settings)
}

/// 按 `settings.connect` 的节律重试建连。
///
/// # 教案式说明
/// - **意图 (Why)**：服务端重启、端口尚未就绪等瞬时故障在客户端表现为“连接被拒绝/重置”，
///   应在有限次数内自动重试，而不是立刻把错误抛给业务；
/// - **逻辑 (How)**：以 [`RetrySettings`](kindle_core::RetrySettings) 构造策略，只对瞬时 IO 错误重试，
///   单次超时同样视为可重试；尝试由 [`AsyncRetryer`] 调度在当前 Tokio 运行时上，等待期间不占用线程；
/// - **契约 (What)**：成功时返回已装配好的 [`TcpConnection`]；策略终止时返回
///   [`TransportError::ConnectExhausted`]，其 `source` 为最后一次尝试的失败；非瞬时错误不重试。
pub async fn connect_with_retry<M>(
    addr: SocketAddr,
    group: Arc<GroupContext<M>>,
    settings: &TcpSettings,
) -> Result<TcpConnection<M>, TransportError>
where
    M: Send + 'static,
{
    settings.validate()?;
    let policy = settings
        .connect
        .builder::<TcpStream, io::Error>()?
        .retry_if(retry_if_error(is_transient))
        .on_retry(move |attempt: &Attempt<TcpStream, io::Error>| {
            if let Some(err) = attempt.error() {
                debug!(
                    %addr,
                    attempt = attempt.number(),
                    error = %err,
                    "tcp connect attempt failed"
                );
            }
        })
        .build();
    let scheduler = TokioScheduler::try_current()?;
    let retryer = AsyncRetryer::new(policy, Arc::new(scheduler));

    let stream = retryer
        .call_async(move || TcpStream::connect(addr))
        .await
        .map_err(|source| TransportError::ConnectExhausted { source })?;
    TcpConnection::establish(stream, group, settings)
}
