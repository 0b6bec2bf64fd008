use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::{Context, Poll, Waker};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// 时钟接口返回的统一延迟 Future 类型。
pub type Sleep = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// 可注入的时钟，统一“获取当前时间”与“等待指定时间”两种能力。
///
/// # 设计背景（Why）
/// - 重试引擎以首次尝试为基准计算 `elapsed`，基于耗时的停止谓词依赖可靠的单调时间；
/// - 通过 trait 注入时钟，生产环境使用真实时间，测试中使用可控的虚拟时间。
///
/// # 接口约束（What）
/// - `now`：返回单调递增的时间点；
/// - `sleep`：返回在给定持续时间后完成的 Future，完成前至少等待该时长；
/// - `block_for`：在调用线程上等待，供同步重试循环使用。
pub trait Clock: Send + Sync + 'static {
    /// 返回当前的单调时间点。
    fn now(&self) -> Instant;

    /// 返回一个在指定持续时间后完成的睡眠 Future。
    fn sleep(&self, duration: Duration) -> Sleep;

    /// 阻塞调用线程指定时长，默认委托给 `std::thread::sleep`。
    fn block_for(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// 基于 Tokio 时间驱动的系统时钟。
///
/// - `now` 读取 `tokio::time::Instant`，在运行时暂停时间（`start_paused`）时与计时器保持一致，
///   运行时之外退化为标准库单调时钟；
/// - `sleep` 必须在 Tokio 运行时内轮询。
#[derive(Clone, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        tokio::time::Instant::now().into_std()
    }

    fn sleep(&self, duration: Duration) -> Sleep {
        Box::pin(tokio::time::sleep(duration))
    }
}

/// 虚拟时钟：通过手动推进时间在测试中复现确定性的唤醒序列。
///
/// # 行为概览（How）
/// - 内部维护自构造起累积的 `elapsed` 偏移与待触发的睡眠列表；
/// - `advance` 增加偏移并唤醒所有到期的睡眠 Future，唤醒顺序与登记顺序一致；
/// - 零时长的 `sleep` 立即完成；被提前 Drop 的睡眠会从队列中移除。
#[derive(Clone, Debug)]
pub struct MockClock {
    inner: Arc<MockClockInner>,
}

impl MockClock {
    /// 以当前时刻为基准创建虚拟时钟。
    pub fn new() -> Self {
        Self::with_start(Instant::now())
    }

    /// 以指定基准时刻构造虚拟时钟。
    pub fn with_start(origin: Instant) -> Self {
        Self {
            inner: Arc::new(MockClockInner {
                state: Mutex::new(ClockState {
                    origin,
                    elapsed: Duration::ZERO,
                    sleepers: Vec::new(),
                    next_id: 0,
                }),
            }),
        }
    }

    /// 推进虚拟时间并唤醒到期的睡眠。
    pub fn advance(&self, delta: Duration) {
        if delta.is_zero() {
            return;
        }

        let mut to_wake = Vec::new();
        {
            let mut guard = self.inner.state.lock();
            guard.elapsed = guard.elapsed.saturating_add(delta);
            let elapsed = guard.elapsed;
            guard.sleepers.retain(|entry| {
                if entry.cancelled.load(Ordering::SeqCst) {
                    return false;
                }
                if elapsed >= entry.deadline {
                    entry.completed.store(true, Ordering::SeqCst);
                    if let Some(waker) = entry.waker.lock().take() {
                        to_wake.push(waker);
                    }
                    false
                } else {
                    true
                }
            });
        }

        for waker in to_wake {
            waker.wake();
        }
    }

    /// 自基准时刻以来累积的虚拟时间。
    pub fn elapsed(&self) -> Duration {
        self.inner.state.lock().elapsed
    }

    /// 尚未到期的睡眠数量。
    pub fn pending_sleepers(&self) -> usize {
        self.inner.state.lock().sleepers.len()
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MockClock {
    fn now(&self) -> Instant {
        let guard = self.inner.state.lock();
        guard.origin + guard.elapsed
    }

    fn sleep(&self, duration: Duration) -> Sleep {
        let state = {
            let mut guard = self.inner.state.lock();
            let deadline = guard.elapsed.saturating_add(duration);
            let id = guard.next_id;
            guard.next_id += 1;
            let state = Arc::new(SleepState {
                id,
                deadline,
                waker: Mutex::new(None),
                completed: AtomicBool::new(duration.is_zero()),
                cancelled: AtomicBool::new(false),
            });
            if !duration.is_zero() {
                guard.sleepers.push(Arc::clone(&state));
            }
            state
        };

        Box::pin(MockSleep {
            inner: Arc::clone(&self.inner),
            state,
        })
    }

    /// 虚拟时间下的阻塞等待即推进时钟，不占用真实时间。
    fn block_for(&self, duration: Duration) {
        self.advance(duration);
    }
}

#[derive(Debug)]
struct MockClockInner {
    state: Mutex<ClockState>,
}

#[derive(Debug)]
struct ClockState {
    origin: Instant,
    elapsed: Duration,
    sleepers: Vec<Arc<SleepState>>,
    next_id: usize,
}

#[derive(Debug)]
struct SleepState {
    id: usize,
    deadline: Duration,
    waker: Mutex<Option<Waker>>,
    completed: AtomicBool,
    cancelled: AtomicBool,
}

struct MockSleep {
    inner: Arc<MockClockInner>,
    state: Arc<SleepState>,
}

impl Future for MockSleep {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.state.completed.load(Ordering::SeqCst) {
            return Poll::Ready(());
        }

        // 登记 waker 与读取偏移需在同一把锁下完成，避免与 `advance` 交错丢失唤醒。
        let guard = self.inner.state.lock();
        if guard.elapsed >= self.state.deadline {
            self.state.completed.store(true, Ordering::SeqCst);
            return Poll::Ready(());
        }
        let mut slot = self.state.waker.lock();
        if !slot.as_ref().is_some_and(|w| w.will_wake(cx.waker())) {
            *slot = Some(cx.waker().clone());
        }
        Poll::Pending
    }
}

impl Drop for MockSleep {
    fn drop(&mut self) {
        if !self.state.completed.load(Ordering::SeqCst) {
            self.state.cancelled.store(true, Ordering::SeqCst);
            self.state.waker.lock().take();
            let id = self.state.id;
            self.inner.state.lock().sleepers.retain(|entry| entry.id != id);
        }
    }
}
