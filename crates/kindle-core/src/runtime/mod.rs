//! 运行时调度基座。
//!
//! 异步重试器不直接依赖具体执行器，而是通过 [`DelayScheduler`] 提交“延迟后执行”的任务；
//! 生产实现 [`TokioScheduler`] 把任务派生到 Tokio 运行时，并借助 [`Clock`](crate::time::Clock)
//! 完成等待，等待期间不占用任何线程。

pub mod scheduler;

pub use scheduler::{DelayScheduler, TokioScheduler};
