use std::time::Duration;

use crate::error::RetryError;

/// 一次执行尝试的不可变记录。
///
/// # 教案式说明
/// - **意图 (Why)**：策略谓词与监听器只需要观察“第几次、结果如何、累计耗时多少”，
///   把三者固化为值类型后即可在多个监听器之间安全共享引用；
/// - **契约 (What)**：
///   - `number` 从 1 开始，在同一逻辑操作内单调递增；
///   - `outcome` 为成功值或捕获的失败，构造后不可修改；
///   - `elapsed` 自该操作的首次尝试开始计算，而非本次尝试开始，便于实现整体截止；
/// - **后置条件**：只有终止尝试的结果会通过 [`Attempt::into_result`] 离开引擎。
#[derive(Debug)]
pub struct Attempt<T, E> {
    number: u32,
    outcome: Result<T, RetryError<E>>,
    elapsed: Duration,
}

impl<T, E> Attempt<T, E> {
    pub(crate) fn new(number: u32, outcome: Result<T, RetryError<E>>, elapsed: Duration) -> Self {
        Self {
            number,
            outcome,
            elapsed,
        }
    }

    /// 尝试序号，从 1 开始。
    pub fn number(&self) -> u32 {
        self.number
    }

    /// 自首次尝试以来的耗时。
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// 自首次尝试以来的耗时（毫秒）。
    pub fn elapsed_millis(&self) -> u64 {
        u64::try_from(self.elapsed.as_millis()).unwrap_or(u64::MAX)
    }

    /// 本次尝试是否失败。
    pub fn has_error(&self) -> bool {
        self.outcome.is_err()
    }

    /// 成功值。
    pub fn value(&self) -> Option<&T> {
        self.outcome.as_ref().ok()
    }

    /// 捕获的失败。
    pub fn error(&self) -> Option<&RetryError<E>> {
        self.outcome.as_ref().err()
    }

    /// 借用完整结果。
    pub fn outcome(&self) -> Result<&T, &RetryError<E>> {
        self.outcome.as_ref()
    }

    /// 消费记录并取出结果。
    pub fn into_result(self) -> Result<T, RetryError<E>> {
        self.outcome
    }
}
