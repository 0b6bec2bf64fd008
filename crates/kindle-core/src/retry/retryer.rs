use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use super::attempt::Attempt;
use super::policy::{RetryPolicy, Verdict};
use crate::error::RetryError;
use crate::time::{Clock, SystemClock};

/// 同步有界重试循环。
///
/// # 教案式说明
/// - **意图 (Why)**：为无法异步化的调用点（阻塞 IO、同步资源获取）提供与 [`AsyncRetryer`](super::AsyncRetryer)
///   一致的策略语义；
/// - **执行逻辑 (How)**：
///   1. 执行操作并记录 [`Attempt`]，业务错误被包装进尝试记录而非直接传播；
///   2. 交由 [`RetryPolicy`] 依次触发 `on_retry`、评估重试谓词与停止谓词；
///   3. 需要继续时经 [`Clock::block_for`] 在调用线程上等待 `wait`，再以递增序号再次尝试；
/// - **单次时限**：同步闭包无法被抢占，本引擎不额外派生线程，而是在调用返回后检查本次耗时，
///   超限的尝试记为 [`RetryError::TimedOut`]，其结果被丢弃；
/// - **时间基准**：耗时由注入的 [`Clock`] 自首次尝试开始计算。
pub struct Retryer<T, E> {
    policy: Arc<RetryPolicy<T, E>>,
    clock: Arc<dyn Clock>,
}

impl<T, E> Retryer<T, E> {
    /// 以策略构造，耗时使用 [`SystemClock`] 计算。
    pub fn new(policy: RetryPolicy<T, E>) -> Self {
        Self::with_shared(Arc::new(policy), Arc::new(SystemClock))
    }

    /// 共享已有策略与时钟。
    pub fn with_shared(policy: Arc<RetryPolicy<T, E>>, clock: Arc<dyn Clock>) -> Self {
        Self { policy, clock }
    }

    /// 替换时钟。
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// 使用的策略。
    pub fn policy(&self) -> &Arc<RetryPolicy<T, E>> {
        &self.policy
    }

    /// 运行操作直到成功、被重试谓词判为终态或被停止谓词放弃。
    pub fn call<F>(&self, mut operation: F) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Result<T, E>,
    {
        let started = self.clock.now();
        let mut number = 1u32;
        loop {
            let attempt = self.attempt(&mut operation, number, started);
            match self.policy.evaluate(&attempt) {
                Verdict::Finish => {
                    debug!(attempt = number, failed = attempt.has_error(), "retry finished");
                    return attempt.into_result();
                }
                Verdict::GiveUp => {
                    warn!(
                        attempt = number,
                        elapsed_ms = attempt.elapsed_millis(),
                        "retry stopped by stop predicate"
                    );
                    return Err(give_up(attempt));
                }
                Verdict::RetryAfter(wait) => {
                    debug!(attempt = number, wait_ms = millis(wait), "retrying");
                    if !wait.is_zero() {
                        self.clock.block_for(wait);
                    }
                    number = number.saturating_add(1);
                }
            }
        }
    }

    fn attempt<F>(&self, operation: &mut F, number: u32, started: Instant) -> Attempt<T, E>
    where
        F: FnMut() -> Result<T, E>,
    {
        let attempt_started = self.clock.now();
        let outcome = operation().map_err(RetryError::Operation);
        let now = self.clock.now();
        let outcome = match self.policy.attempt_time_limit() {
            Some(limit) if now.saturating_duration_since(attempt_started) > limit => {
                Err(RetryError::TimedOut { limit })
            }
            _ => outcome,
        };
        Attempt::new(number, outcome, now.saturating_duration_since(started))
    }
}

impl<T, E> Clone for Retryer<T, E> {
    fn clone(&self) -> Self {
        Self {
            policy: Arc::clone(&self.policy),
            clock: Arc::clone(&self.clock),
        }
    }
}

/// 日志字段用的毫秒数，超出 `u64` 时饱和。
pub(crate) fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// 停止谓词放弃时的终止错误：失败尝试原样返回，被拒绝的成功值转为 `Rejected`。
pub(crate) fn give_up<T, E>(attempt: Attempt<T, E>) -> RetryError<E> {
    let attempts = attempt.number();
    match attempt.into_result() {
        Err(err) => err,
        Ok(_) => RetryError::Rejected { attempts },
    }
}
