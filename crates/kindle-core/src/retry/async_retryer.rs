use std::cell::Cell;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

use parking_lot::{Mutex, ReentrantMutex};
use tokio::sync::{oneshot, watch};
use tracing::{debug, warn};

use super::attempt::Attempt;
use super::policy::{RetryPolicy, Verdict};
use super::retryer::{give_up, millis};
use crate::error::RetryError;
use crate::runtime::DelayScheduler;
use crate::time::{Clock, SystemClock};

/// 单个异步重试操作的状态。
///
/// `Running` 是唯一的非终态；一旦离开 `Running`，句柄结果即被固定，调度链不再推进。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RetryState {
    /// 第 `attempt` 次尝试已调度或正在执行。
    Running { attempt: u32 },
    /// 第 `attempt` 次尝试以成功终止。
    Succeeded { attempt: u32 },
    /// 第 `attempt` 次尝试以失败终止。
    Failed { attempt: u32 },
    /// 调用方取消。
    Cancelled,
}

impl RetryState {
    /// 是否仍在运行。
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running { .. })
    }
}

/// 非阻塞重试循环。
///
/// # 教案式说明
/// - **意图 (Why)**：连接建立、远程调用等异步操作需要重试，但调用方不能被阻塞，
///   等待间隔也不应占用线程；
/// - **执行逻辑 (How)**：
///   1. `call_async` 立即返回 [`RetryHandle`]，并通过 [`DelayScheduler`] 提交第 1 次尝试；
///   2. 每次尝试在单次时限内执行操作，生成 [`Attempt`] 后交由策略裁决；
///   3. 裁决结果驱动状态迁移：`Running(n) → Running(n+1)`（延迟 `wait` 后再次提交）、
///      `Running(n) → Succeeded(n)` 或 `Running(n) → Failed(n)`；
///   4. 终态写入一次性槽位，句柄只会被完成一次；
/// - **取消 (What)**：正在执行的尝试与取消信号竞争，取消即丢弃尝试 Future；
///   裁决在状态锁内进行，取消后不再执行操作也不再触发监听器；
/// - **权衡 (Trade-offs)**：单次时限通过丢弃尝试 Future 实现，操作需能容忍在任意 `.await` 点被放弃。
pub struct AsyncRetryer<T, E> {
    policy: Arc<RetryPolicy<T, E>>,
    scheduler: Arc<dyn DelayScheduler>,
    clock: Arc<dyn Clock>,
}

impl<T, E> AsyncRetryer<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    /// 以策略与调度器构造，耗时与单次时限使用 [`SystemClock`]。
    pub fn new(policy: RetryPolicy<T, E>, scheduler: Arc<dyn DelayScheduler>) -> Self {
        Self {
            policy: Arc::new(policy),
            scheduler,
            clock: Arc::new(SystemClock),
        }
    }

    /// 替换计时所用的时钟。
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// 使用的策略。
    pub fn policy(&self) -> &Arc<RetryPolicy<T, E>> {
        &self.policy
    }

    /// 启动重试并立即返回句柄。
    pub fn call_async<F, Fut>(&self, operation: F) -> RetryHandle<T, E>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let (cancel, cancelled) = watch::channel(false);
        let state = Arc::new(StateCell::new(Cell::new(RetryState::Running { attempt: 1 })));
        let op = Arc::new(RetryOperation {
            policy: Arc::clone(&self.policy),
            scheduler: Arc::clone(&self.scheduler),
            clock: Arc::clone(&self.clock),
            operation,
            started: self.clock.now(),
            state: Arc::clone(&state),
            cancelled,
            completion: Mutex::new(Some(tx)),
        });
        op.schedule(1, Duration::ZERO);
        RetryHandle {
            receiver: rx,
            state,
            cancel,
        }
    }
}

impl<T, E> Clone for AsyncRetryer<T, E> {
    fn clone(&self) -> Self {
        Self {
            policy: Arc::clone(&self.policy),
            scheduler: Arc::clone(&self.scheduler),
            clock: Arc::clone(&self.clock),
        }
    }
}

type Completion<T, E> = oneshot::Sender<Result<T, RetryError<E>>>;

/// 句柄与调度链共享的状态。
///
/// 可重入锁允许监听器在裁决期间于同一线程调用 [`RetryHandle::cancel`]。
type StateCell = ReentrantMutex<Cell<RetryState>>;

/// 调度链上共享的单个操作。
///
/// 只有已调度的任务持有它；任务全部被丢弃后，完成端随之释放，句柄据此解析为 `Aborted`。
struct RetryOperation<T, E, F> {
    policy: Arc<RetryPolicy<T, E>>,
    scheduler: Arc<dyn DelayScheduler>,
    clock: Arc<dyn Clock>,
    operation: F,
    started: Instant,
    state: Arc<StateCell>,
    cancelled: watch::Receiver<bool>,
    completion: Mutex<Option<Completion<T, E>>>,
}

/// 一次裁决后的状态迁移。
enum Transition<T, E> {
    Retry { next: u32, wait: Duration },
    Complete {
        terminal: RetryState,
        result: Result<T, RetryError<E>>,
    },
}

impl<T, E, F, Fut> RetryOperation<T, E, F>
where
    T: Send + 'static,
    E: Send + 'static,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
{
    fn schedule(self: &Arc<Self>, number: u32, delay: Duration) {
        let this = Arc::clone(self);
        self.scheduler
            .schedule(delay, Box::pin(async move { this.step(number).await }));
    }

    fn is_running(&self) -> bool {
        self.state.lock().get().is_running()
    }

    async fn step(self: Arc<Self>, number: u32) {
        if !self.is_running() {
            debug!(attempt = number, "retry no longer running; attempt skipped");
            return;
        }

        let Some(attempt) = self.attempt(number).await else {
            debug!(attempt = number, "retry cancelled; in-flight attempt dropped");
            return;
        };

        // 裁决与状态迁移在同一把锁内完成，其他线程的取消要么先于裁决生效，要么落在迁移之后。
        let state = self.state.lock();
        if !state.get().is_running() {
            return;
        }
        let transition = self.transition(attempt);
        // 监听器可能在裁决期间于本线程取消。
        if !state.get().is_running() {
            return;
        }
        match transition {
            Transition::Retry { next, wait } => {
                state.set(RetryState::Running { attempt: next });
                drop(state);
                self.schedule(next, wait);
            }
            Transition::Complete { terminal, result } => {
                state.set(terminal);
                drop(state);
                if let Some(tx) = self.completion.lock().take() {
                    // 句柄已被丢弃时结果无人接收，直接忽略。
                    let _ = tx.send(result);
                }
            }
        }
    }

    /// 执行一次尝试；取消信号先于尝试完成时丢弃尝试 Future 并返回 `None`。
    async fn attempt(&self, number: u32) -> Option<Attempt<T, E>> {
        let mut cancelled = self.cancelled.clone();
        let fut = (self.operation)();
        let limited = async {
            match self.policy.attempt_time_limit() {
                Some(limit) => {
                    tokio::select! {
                        biased;
                        result = fut => result.map_err(RetryError::Operation),
                        _ = self.clock.sleep(limit) => Err(RetryError::TimedOut { limit }),
                    }
                }
                None => fut.await.map_err(RetryError::Operation),
            }
        };
        let outcome = tokio::select! {
            biased;
            _ = cancel_requested(&mut cancelled) => return None,
            outcome = limited => outcome,
        };
        let elapsed = self.clock.now().saturating_duration_since(self.started);
        Some(Attempt::new(number, outcome, elapsed))
    }

    fn transition(&self, attempt: Attempt<T, E>) -> Transition<T, E> {
        let number = attempt.number();
        match self.policy.evaluate(&attempt) {
            Verdict::Finish => {
                let terminal = if attempt.has_error() {
                    RetryState::Failed { attempt: number }
                } else {
                    RetryState::Succeeded { attempt: number }
                };
                debug!(attempt = number, ?terminal, "retry finished");
                Transition::Complete {
                    terminal,
                    result: attempt.into_result(),
                }
            }
            Verdict::GiveUp => {
                warn!(
                    attempt = number,
                    elapsed_ms = attempt.elapsed_millis(),
                    "retry stopped by stop predicate"
                );
                Transition::Complete {
                    terminal: RetryState::Failed { attempt: number },
                    result: Err(give_up(attempt)),
                }
            }
            Verdict::RetryAfter(wait) => {
                debug!(attempt = number, wait_ms = millis(wait), "retrying");
                Transition::Retry {
                    next: number.saturating_add(1),
                    wait,
                }
            }
        }
    }
}

/// 取消信号置位或句柄被丢弃时完成。
async fn cancel_requested(cancelled: &mut watch::Receiver<bool>) {
    let _ = cancelled.wait_for(|cancelled| *cancelled).await;
}

/// 异步重试的结果句柄。
///
/// - 作为 `Future` 解析为最终结果，只会被完成一次；
/// - [`RetryHandle::cancel`] 幂等：正在执行的尝试被丢弃，不再执行新的尝试，
///   句柄解析为 [`RetryError::Cancelled`]；
/// - 句柄被丢弃等同于取消。
pub struct RetryHandle<T, E> {
    receiver: oneshot::Receiver<Result<T, RetryError<E>>>,
    state: Arc<StateCell>,
    cancel: watch::Sender<bool>,
}

impl<T, E> RetryHandle<T, E> {
    /// 取消当前与后续尝试；已终止时无效果。
    pub fn cancel(&self) {
        {
            let state = self.state.lock();
            if !state.get().is_running() {
                return;
            }
            state.set(RetryState::Cancelled);
        }
        self.cancel.send_replace(true);
    }

    /// 当前状态快照。
    pub fn state(&self) -> RetryState {
        self.state.lock().get()
    }

    /// 是否已离开运行态。
    pub fn is_finished(&self) -> bool {
        !self.state().is_running()
    }
}

impl<T, E> Future for RetryHandle<T, E> {
    type Output = Result<T, RetryError<E>>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.receiver).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(_)) => match self.state() {
                RetryState::Cancelled => Poll::Ready(Err(RetryError::Cancelled)),
                _ => Poll::Ready(Err(RetryError::Aborted)),
            },
            Poll::Pending if self.state() == RetryState::Cancelled => {
                Poll::Ready(Err(RetryError::Cancelled))
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<T, E> Drop for RetryHandle<T, E> {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl<T, E> std::fmt::Debug for RetryHandle<T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryHandle")
            .field("state", &self.state())
            .finish()
    }
}
