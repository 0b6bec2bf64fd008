//! 常用的重试/停止谓词。
//!
//! 每个函数返回可直接交给 [`RetryPolicyBuilder`](super::RetryPolicyBuilder) 的闭包；
//! 需要组合时在调用方闭包里直接调用即可。

use std::time::Duration;

use super::attempt::Attempt;
use crate::error::RetryError;

/// 任何失败（含单次超时）都重试。
pub fn retry_on_error<T: 'static, E: 'static>()
-> impl Fn(&Attempt<T, E>) -> bool + Send + Sync + 'static {
    |attempt: &Attempt<T, E>| attempt.has_error()
}

/// 仅对满足条件的业务错误重试；单次超时始终重试。
pub fn retry_if_error<T, E, F>(
    matches: F,
) -> impl Fn(&Attempt<T, E>) -> bool + Send + Sync + 'static
where
    T: 'static,
    E: 'static,
    F: Fn(&E) -> bool + Send + Sync + 'static,
{
    move |attempt: &Attempt<T, E>| match attempt.error() {
        Some(RetryError::Operation(err)) => matches(err),
        Some(RetryError::TimedOut { .. }) => true,
        Some(_) => false,
        None => false,
    }
}

/// 失败重试，且成功值满足条件时同样重试（例如“尚未就绪”的响应）。
pub fn retry_if_result<T, E, F>(
    matches: F,
) -> impl Fn(&Attempt<T, E>) -> bool + Send + Sync + 'static
where
    T: 'static,
    E: 'static,
    F: Fn(&T) -> bool + Send + Sync + 'static,
{
    move |attempt: &Attempt<T, E>| match attempt.value() {
        Some(value) => matches(value),
        None => true,
    }
}

/// 第 `max_attempts` 次尝试后停止。
pub fn stop_after_attempts<T: 'static, E: 'static>(
    max_attempts: u32,
) -> impl Fn(&Attempt<T, E>) -> bool + Send + Sync + 'static {
    move |attempt: &Attempt<T, E>| attempt.number() >= max_attempts
}

/// 自首次尝试起累计耗时达到 `limit` 后停止。
pub fn stop_after_elapsed<T: 'static, E: 'static>(
    limit: Duration,
) -> impl Fn(&Attempt<T, E>) -> bool + Send + Sync + 'static {
    move |attempt: &Attempt<T, E>| attempt.elapsed() >= limit
}

/// 从不停止，完全交由重试谓词决定。
pub fn never_stop<T: 'static, E: 'static>()
-> impl Fn(&Attempt<T, E>) -> bool + Send + Sync + 'static {
    |_: &Attempt<T, E>| false
}
