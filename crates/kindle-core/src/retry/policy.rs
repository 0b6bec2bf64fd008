use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use super::attempt::Attempt;
use super::predicates;

/// 基于尝试记录的布尔谓词。
pub type AttemptPredicate<T, E> = Arc<dyn Fn(&Attempt<T, E>) -> bool + Send + Sync>;

/// 观察尝试记录的监听器。
pub type AttemptListener<T, E> = Arc<dyn Fn(&Attempt<T, E>) + Send + Sync>;

/// 单个逻辑重试操作的不可变策略集。
///
/// # 教案式说明
/// - **意图 (Why)**：把重试谓词、停止谓词、单次时限、等待间隔与三组监听器收敛为一个值，
///   在操作开始前构造一次，再以 `Arc` 在各次尝试之间共享，避免全局可变注册表；
/// - **契约 (What)**：
///   - `retry_predicate` 返回 `false` 表示本次尝试即为终态，按结果触发成功或失败监听器；
///   - `stop_predicate` 仅在重试谓词要求继续时被咨询，返回 `true` 触发失败监听器并放弃；
///   - `on_retry` 对每次尝试无条件触发，且先于任何谓词；
///   - 监听器按注册顺序依次调用；
/// - **默认值 (How)**：失败即重试、3 次后停止、无等待、无单次时限、无监听器。
pub struct RetryPolicy<T, E> {
    retry_predicate: AttemptPredicate<T, E>,
    stop_predicate: AttemptPredicate<T, E>,
    attempt_time_limit: Option<Duration>,
    wait: Duration,
    on_retry: Vec<AttemptListener<T, E>>,
    on_success: Vec<AttemptListener<T, E>>,
    on_fail: Vec<AttemptListener<T, E>>,
}

/// 策略对一次尝试的裁决。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Verdict {
    /// 重试谓词判定本次为终态，按结果返回。
    Finish,
    /// 停止谓词要求放弃。
    GiveUp,
    /// 等待后进行下一次尝试。
    RetryAfter(Duration),
}

impl<T, E> RetryPolicy<T, E>
where
    T: 'static,
    E: 'static,
{
    /// 以默认值开始构造策略。
    pub fn builder() -> RetryPolicyBuilder<T, E> {
        RetryPolicyBuilder::new()
    }
}

impl<T, E> RetryPolicy<T, E> {
    /// 单次尝试的时限。
    pub fn attempt_time_limit(&self) -> Option<Duration> {
        self.attempt_time_limit
    }

    /// 两次尝试之间的等待。
    pub fn wait(&self) -> Duration {
        self.wait
    }

    /// 依序触发监听器并给出裁决。
    pub(crate) fn evaluate(&self, attempt: &Attempt<T, E>) -> Verdict {
        notify(&self.on_retry, attempt);

        if !(self.retry_predicate)(attempt) {
            if attempt.has_error() {
                notify(&self.on_fail, attempt);
            } else {
                notify(&self.on_success, attempt);
            }
            return Verdict::Finish;
        }

        if (self.stop_predicate)(attempt) {
            notify(&self.on_fail, attempt);
            return Verdict::GiveUp;
        }

        Verdict::RetryAfter(self.wait)
    }
}

fn notify<T, E>(listeners: &[AttemptListener<T, E>], attempt: &Attempt<T, E>) {
    for listener in listeners {
        listener(attempt);
    }
}

impl<T, E> fmt::Debug for RetryPolicy<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("attempt_time_limit", &self.attempt_time_limit)
            .field("wait", &self.wait)
            .field("on_retry", &self.on_retry.len())
            .field("on_success", &self.on_success.len())
            .field("on_fail", &self.on_fail.len())
            .finish_non_exhaustive()
    }
}

/// [`RetryPolicy`] 的构造器。
pub struct RetryPolicyBuilder<T, E> {
    policy: RetryPolicy<T, E>,
}

impl<T, E> RetryPolicyBuilder<T, E>
where
    T: 'static,
    E: 'static,
{
    fn new() -> Self {
        Self {
            policy: RetryPolicy {
                retry_predicate: Arc::new(predicates::retry_on_error()),
                stop_predicate: Arc::new(predicates::stop_after_attempts(3)),
                attempt_time_limit: None,
                wait: Duration::ZERO,
                on_retry: Vec::new(),
                on_success: Vec::new(),
                on_fail: Vec::new(),
            },
        }
    }

    /// 替换重试谓词：返回 `true` 表示应再尝试一次。
    pub fn retry_if<P>(mut self, predicate: P) -> Self
    where
        P: Fn(&Attempt<T, E>) -> bool + Send + Sync + 'static,
    {
        self.policy.retry_predicate = Arc::new(predicate);
        self
    }

    /// 替换停止谓词：返回 `true` 表示整个操作放弃。
    pub fn stop_if<P>(mut self, predicate: P) -> Self
    where
        P: Fn(&Attempt<T, E>) -> bool + Send + Sync + 'static,
    {
        self.policy.stop_predicate = Arc::new(predicate);
        self
    }

    /// 两次尝试之间的等待。
    pub fn wait(mut self, wait: Duration) -> Self {
        self.policy.wait = wait;
        self
    }

    /// 单次尝试的时限。
    pub fn attempt_time_limit(mut self, limit: Duration) -> Self {
        self.policy.attempt_time_limit = Some(limit);
        self
    }

    /// 追加每次尝试后都会触发的监听器。
    pub fn on_retry<L>(mut self, listener: L) -> Self
    where
        L: Fn(&Attempt<T, E>) + Send + Sync + 'static,
    {
        self.policy.on_retry.push(Arc::new(listener));
        self
    }

    /// 追加终态成功时触发的监听器。
    pub fn on_success<L>(mut self, listener: L) -> Self
    where
        L: Fn(&Attempt<T, E>) + Send + Sync + 'static,
    {
        self.policy.on_success.push(Arc::new(listener));
        self
    }

    /// 追加终态失败时触发的监听器。
    pub fn on_fail<L>(mut self, listener: L) -> Self
    where
        L: Fn(&Attempt<T, E>) + Send + Sync + 'static,
    {
        self.policy.on_fail.push(Arc::new(listener));
        self
    }

    /// 冻结策略。
    pub fn build(self) -> RetryPolicy<T, E> {
        self.policy
    }
}
