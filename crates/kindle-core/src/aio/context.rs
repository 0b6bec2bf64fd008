use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use super::channel::AioChannel;
use super::handler::AioHandler;
use super::listener::AioListener;

/// 进程内唯一的连接编号，用于日志与追踪字段。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelId(u64);

impl ChannelId {
    /// 以给定数值构造。
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// 分配下一个编号。
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// 原始数值。
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ch-{}", self.0)
    }
}

/// 连接组共享的只读配置：编码器与写完成监听器。
///
/// # 教案式说明
/// - **意图 (Why)**：同一服务端/客户端下的所有连接共用一套编码与监听逻辑，启动时装配一次，
///   之后以 `Arc` 只读共享，写路径无需加锁；
/// - **契约 (What)**：编码器在构造时绑定到具体消息类型 `M`，不做运行时类型探测；
///   监听器可选，缺省时写结果只记录日志。
pub struct GroupContext<M> {
    name: Cow<'static, str>,
    handler: Arc<dyn AioHandler<M>>,
    listener: Option<Arc<dyn AioListener<M>>>,
}

impl<M: 'static> GroupContext<M> {
    /// 以组名与编码器构造。
    pub fn new(name: impl Into<Cow<'static, str>>, handler: impl AioHandler<M>) -> Self {
        Self {
            name: name.into(),
            handler: Arc::new(handler),
            listener: None,
        }
    }

    /// 挂载写完成监听器。
    pub fn with_listener(mut self, listener: impl AioListener<M>) -> Self {
        self.listener = Some(Arc::new(listener));
        self
    }

    /// 挂载已共享的监听器。
    pub fn with_shared_listener(mut self, listener: Arc<dyn AioListener<M>>) -> Self {
        self.listener = Some(listener);
        self
    }
}

impl<M> GroupContext<M> {
    /// 组名。
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 编码器。
    pub fn handler(&self) -> &Arc<dyn AioHandler<M>> {
        &self.handler
    }

    /// 写完成监听器。
    pub fn listener(&self) -> Option<&Arc<dyn AioListener<M>>> {
        self.listener.as_ref()
    }
}

impl<M> fmt::Debug for GroupContext<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroupContext")
            .field("name", &self.name)
            .field("listener", &self.listener.is_some())
            .finish_non_exhaustive()
    }
}

/// 单个连接的状态包。
///
/// # 教案式说明
/// - **意图 (Why)**：把通道句柄、组配置与关闭标志聚合在一起，作为编码器与监听器的上下文参数；
/// - **契约 (What)**：
///   - 通道句柄由该连接独占；
///   - 关闭标志只能由 [`ChannelContext::close`] 单向置位，置位后写引擎不再发起新的物理写入，
///     已在途的写入仍会完成并通知监听器；
/// - **生命周期 (Lifecycle)**：连接建立时创建，写引擎的后台任务持有一份 `Arc`，
///   最后一次在途写入完成后随之释放。
pub struct ChannelContext<M> {
    id: ChannelId,
    channel: Arc<dyn AioChannel>,
    group: Arc<GroupContext<M>>,
    closed: AtomicBool,
}

impl<M> ChannelContext<M> {
    /// 为新连接分配编号并构造上下文。
    pub fn new(group: Arc<GroupContext<M>>, channel: Arc<dyn AioChannel>) -> Arc<Self> {
        Self::with_id(ChannelId::next(), group, channel)
    }

    /// 以指定编号构造上下文。
    pub fn with_id(
        id: ChannelId,
        group: Arc<GroupContext<M>>,
        channel: Arc<dyn AioChannel>,
    ) -> Arc<Self> {
        Arc::new(Self {
            id,
            channel,
            group,
            closed: AtomicBool::new(false),
        })
    }

    /// 连接编号。
    pub fn id(&self) -> ChannelId {
        self.id
    }

    /// 物理通道。
    pub fn channel(&self) -> &Arc<dyn AioChannel> {
        &self.channel
    }

    /// 组配置。
    pub fn group(&self) -> &Arc<GroupContext<M>> {
        &self.group
    }

    /// 是否已关闭。
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// 标记关闭；返回 `true` 表示本次调用完成了关闭。
    pub fn close(&self) -> bool {
        !self.closed.swap(true, Ordering::AcqRel)
    }
}

impl<M> fmt::Debug for ChannelContext<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelContext")
            .field("id", &self.id)
            .field("group", &self.group.name())
            .field("closed", &self.is_closed())
            .finish()
    }
}
