use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use bytes::Bytes;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, trace, warn};

use super::context::ChannelContext;
use super::handler::{composite, prepare_for_read};
use crate::error::{EncodeError, WriteError};

/// `submit` 的受理结果。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[must_use]
pub enum Submission {
    /// 批次已入队，每条消息稍后恰好通知一次监听器。
    Queued,
    /// 批次未被受理（写引擎已停止、连接已关闭或批次为空），不会产生写入与通知。
    Discarded,
}

/// 一次物理写入对应的批次。
struct WriteBatch<M> {
    buffer: Bytes,
    items: Vec<M>,
}

/// 连接级有序写引擎。
///
/// # 教案式注释
///
/// ## 意图 (Why)
/// - 底层写入原语异步完成且可能需要多次部分写入，若多个调用方直接并发写同一通道，
///   字节会交错或乱序；
/// - 写引擎把每次 `submit` 收敛为一个批次，通过单消费者队列串行化物理写入，
///   使“按提交顺序写出”成为结构性保证。
///
/// ## 逻辑 (How)
/// - `submit` 在调用方线程上同步编码每条消息、拼接为一段 `Bytes` 后入队，立即返回；
/// - 后台排水任务逐个出队：发起写入、等待完成信号、逐条通知监听器，然后才处理下一个批次；
/// - 发起失败会记录错误并作为该批次的失败结果，排水继续推进；
/// - `stop` 通过 `watch` 信号打断在途写入并拒绝剩余批次，二者均以 [`WriteError::Cancelled`]
///   通知监听器。
///
/// ## 契约 (What)
/// - 同一连接上的物理写入严格按 `submit` 顺序发起，任意时刻至多一个在途；
/// - 每条被受理的消息恰好触发一次监听器回调（成功、失败、关闭或取消）；
/// - 写入前发现连接已关闭时，批次不会被写出，监听器收到 [`WriteError::ConnectionClosed`]；
/// - `stop` 幂等，之后的 `submit` 返回 [`Submission::Discarded`]。
///
/// ## 注意事项 (Trade-offs)
/// - 队列无界：`submit` 永不阻塞调用方，背压需由上层根据监听器回调自行实施；
/// - 丢弃 `WriteWorker` 等同于 [`WriteWorker::finish`] 的后台版本：已入队批次仍会写完。
pub struct WriteWorker<M> {
    ctx: Arc<ChannelContext<M>>,
    queue: mpsc::UnboundedSender<WriteBatch<M>>,
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl<M> WriteWorker<M>
where
    M: Send + 'static,
{
    /// 在当前 Tokio 运行时上启动写引擎。
    ///
    /// # Panics
    /// 不在 Tokio 运行时内调用时 panic；无法保证调用点时使用 [`WriteWorker::spawn_on`]。
    pub fn spawn(ctx: Arc<ChannelContext<M>>) -> Self {
        Self::spawn_on(ctx, &Handle::current())
    }

    /// 在指定运行时上启动写引擎。
    pub fn spawn_on(ctx: Arc<ChannelContext<M>>, handle: &Handle) -> Self {
        let (queue, rx) = mpsc::unbounded_channel();
        let (stop, stop_rx) = watch::channel(false);
        let task = handle.spawn(drain(Arc::clone(&ctx), rx, stop_rx));
        debug!(channel_id = %ctx.id(), group = ctx.group().name(), "write worker started");
        Self {
            ctx,
            queue,
            stop,
            task,
        }
    }

    /// 编码并提交一个批次。
    ///
    /// 编码错误直接返回，批次内的任何消息都不会入队；空批次不产生写入。
    pub fn submit(&self, items: Vec<M>) -> Result<Submission, EncodeError> {
        if self.is_stopped() {
            trace!(channel_id = %self.ctx.id(), "submit after stop ignored");
            return Ok(Submission::Discarded);
        }
        if items.is_empty() {
            return Ok(Submission::Discarded);
        }

        let handler = self.ctx.group().handler();
        let mut buffers = Vec::with_capacity(items.len());
        for item in &items {
            let mut buffer = handler.encode(item, &self.ctx)?;
            prepare_for_read(&mut buffer);
            buffers.push(buffer);
        }

        if self.ctx.is_closed() {
            debug!(
                channel_id = %self.ctx.id(),
                items = items.len(),
                "connection closed after encoding; batch discarded"
            );
            return Ok(Submission::Discarded);
        }

        let batch = WriteBatch {
            buffer: composite(buffers),
            items,
        };
        match self.queue.send(batch) {
            Ok(()) => Ok(Submission::Queued),
            Err(_) => {
                trace!(channel_id = %self.ctx.id(), "write queue closed; batch discarded");
                Ok(Submission::Discarded)
            }
        }
    }

    /// 停止写引擎：取消在途写入并拒绝所有未写出的批次。
    pub fn stop(&self) {
        if !self.stop.send_replace(true) {
            debug!(channel_id = %self.ctx.id(), "write worker stopping");
        }
    }

    /// 是否已停止。
    pub fn is_stopped(&self) -> bool {
        *self.stop.borrow()
    }

    /// 所属连接的上下文。
    pub fn context(&self) -> &Arc<ChannelContext<M>> {
        &self.ctx
    }

    /// 关闭提交入口，等待所有已入队批次写完（或被 `stop` 取消）后返回。
    pub async fn finish(self) {
        let Self {
            ctx,
            queue,
            stop,
            task,
        } = self;
        drop(queue);
        if let Err(err) = task.await {
            warn!(channel_id = %ctx.id(), error = %err, "write worker task terminated abnormally");
        }
        drop(stop);
    }
}

impl<M> std::fmt::Debug for WriteWorker<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WriteWorker")
            .field("channel", &self.ctx.id())
            .field("stopped", &*self.stop.borrow())
            .finish()
    }
}

/// 排水循环：逐个写出批次，停止后拒绝剩余批次。
async fn drain<M: 'static>(
    ctx: Arc<ChannelContext<M>>,
    mut rx: mpsc::UnboundedReceiver<WriteBatch<M>>,
    mut stop_rx: watch::Receiver<bool>,
) {
    loop {
        let batch = tokio::select! {
            biased;
            _ = stop_requested(&mut stop_rx) => break,
            batch = rx.recv() => match batch {
                Some(batch) => batch,
                None => break,
            },
        };
        if !write_batch(&ctx, batch, &mut stop_rx).await {
            break;
        }
    }

    rx.close();
    let mut rejected = 0usize;
    while let Ok(batch) = rx.try_recv() {
        rejected += batch.items.len();
        notify(&ctx, &batch.items, Err(&WriteError::Cancelled));
    }
    debug!(channel_id = %ctx.id(), rejected, "write worker drained");
}

/// 写出一个批次并通知监听器；返回 `false` 表示期间观察到停止信号。
async fn write_batch<M: 'static>(
    ctx: &ChannelContext<M>,
    batch: WriteBatch<M>,
    stop_rx: &mut watch::Receiver<bool>,
) -> bool {
    let WriteBatch { buffer, items } = batch;

    if ctx.is_closed() {
        debug!(
            channel_id = %ctx.id(),
            items = items.len(),
            "connection closed before write; batch rejected"
        );
        notify(ctx, &items, Err(&WriteError::ConnectionClosed));
        return true;
    }

    let bytes = buffer.len();
    let completion = match ctx.channel().write(buffer) {
        Ok(completion) => completion,
        Err(err) => {
            error!(channel_id = %ctx.id(), error = %err, "write error");
            notify(ctx, &items, Err(&err));
            return true;
        }
    };

    let outcome = tokio::select! {
        biased;
        _ = stop_requested(stop_rx) => {
            notify(ctx, &items, Err(&WriteError::Cancelled));
            return false;
        }
        outcome = completion => outcome,
    };

    match &outcome {
        Ok(()) => trace!(channel_id = %ctx.id(), bytes, items = items.len(), "batch written"),
        Err(err) => warn!(channel_id = %ctx.id(), bytes, error = %err, "batch write failed"),
    }
    notify(ctx, &items, outcome.as_ref().map(|_| ()));
    true
}

/// 在停止信号置位时完成；发送端被丢弃则永不完成。
async fn stop_requested(stop_rx: &mut watch::Receiver<bool>) {
    if stop_rx.wait_for(|stopped| *stopped).await.is_err() {
        std::future::pending::<()>().await;
    }
}

fn notify<M: 'static>(ctx: &ChannelContext<M>, items: &[M], outcome: Result<(), &WriteError>) {
    let Some(listener) = ctx.group().listener() else {
        return;
    };
    for item in items {
        let delivered = panic::catch_unwind(AssertUnwindSafe(|| {
            listener.on_write_handled(ctx, item, outcome)
        }));
        if delivered.is_err() {
            warn!(channel_id = %ctx.id(), "write listener panicked");
        }
    }
}
