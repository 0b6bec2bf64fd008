//! 重试引擎集成测试入口。
//!
//! # 结构概览（What）
//! - `tests::retry::sync_retry`：同步 `Retryer` 的谓词顺序、监听器次数与基于耗时的停止；
//! - `tests::retry::async_retry`：`AsyncRetryer` 的终态固定、取消与在途尝试的丢弃、放弃时的监听器次数、单次时限与调度丢失。
//!
//! # 维护提示（How）
//! 异步用例统一使用 `start_paused` 的 Tokio 运行时，等待间隔由虚拟时间自动推进，不依赖真实耗时。

pub mod tests {
    //! 集成测试命名空间，过滤路径为 `tests::retry::*`。
    pub mod retry {
        //! 共享的测试辅助类型。

        /// 测试操作的失败类型，携带失败时的尝试序号。
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum ProbeError {
            IoFailure(u32),
        }

        include!("sync_retry.rs");
        include!("async_retry.rs");
    }
}
