use super::context::ChannelContext;
use crate::error::WriteError;

/// 写完成监听器。
///
/// 每条被写引擎接受的消息恰好触发一次回调，`outcome` 为 `Ok(())` 或本批次共享的写入错误。
/// 回调顺序与批次完成顺序一致；实现应快速返回，回调中的 panic 会被捕获并记录，不影响其余消息的通知。
pub trait AioListener<M>: Send + Sync + 'static {
    /// 一条消息的写入已有结果。
    fn on_write_handled(
        &self,
        ctx: &ChannelContext<M>,
        message: &M,
        outcome: Result<(), &WriteError>,
    );
}

impl<M, F> AioListener<M> for F
where
    F: Fn(&ChannelContext<M>, &M, Result<(), &WriteError>) + Send + Sync + 'static,
{
    fn on_write_handled(
        &self,
        ctx: &ChannelContext<M>,
        message: &M,
        outcome: Result<(), &WriteError>,
    ) {
        self(ctx, message, outcome)
    }
}
