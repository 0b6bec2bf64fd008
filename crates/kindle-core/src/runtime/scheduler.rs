use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use tokio::runtime::{Handle, TryCurrentError};

use crate::time::{Clock, SystemClock};

/// 支持延迟提交的任务调度契约。
///
/// # 设计背景（Why）
/// - 异步重试的每次后续尝试都以“等待 `wait` 后执行”的形式提交，而非在调用线程上循环睡眠；
/// - 以 trait 抽象调度器，测试可注入虚拟时钟驱动的实现，生产环境使用 [`TokioScheduler`]。
///
/// # 契约说明（What）
/// - `schedule` 必须立即返回，不得阻塞调用方；
/// - 任务至少在 `delay` 之后才开始执行，`delay == 0` 表示尽快执行；
/// - 实现可以在运行时关闭时丢弃任务，调用方需通过任务内部持有的资源感知该情况。
pub trait DelayScheduler: Send + Sync + 'static {
    /// 在 `delay` 之后执行 `task`。
    fn schedule(&self, delay: Duration, task: BoxFuture<'static, ()>);
}

impl<S> DelayScheduler for Arc<S>
where
    S: DelayScheduler + ?Sized,
{
    fn schedule(&self, delay: Duration, task: BoxFuture<'static, ()>) {
        (**self).schedule(delay, task)
    }
}

/// 基于 Tokio 运行时句柄的调度器。
///
/// - 每次 `schedule` 派生一个轻量任务：先在注入的 [`Clock`] 上睡眠，再执行目标 Future；
/// - 多个逻辑操作在同一运行时的有界线程池上交错执行，等待期间不持有线程。
#[derive(Clone)]
pub struct TokioScheduler {
    handle: Handle,
    clock: Arc<dyn Clock>,
}

impl TokioScheduler {
    /// 以指定运行时句柄构造，使用 [`SystemClock`] 等待。
    pub fn new(handle: Handle) -> Self {
        Self {
            handle,
            clock: Arc::new(SystemClock),
        }
    }

    /// 绑定当前所在的 Tokio 运行时；运行时之外调用返回错误。
    pub fn try_current() -> Result<Self, TryCurrentError> {
        Handle::try_current().map(Self::new)
    }

    /// 替换等待所用的时钟。
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// 调度器使用的时钟。
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }
}

impl std::fmt::Debug for TokioScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokioScheduler")
            .field("clock", &"<clock>")
            .finish()
    }
}

impl DelayScheduler for TokioScheduler {
    fn schedule(&self, delay: Duration, task: BoxFuture<'static, ()>) {
        if delay.is_zero() {
            self.handle.spawn(task);
            return;
        }
        let sleep = self.clock.sleep(delay);
        self.handle.spawn(async move {
            sleep.await;
            task.await;
        });
    }
}
