use bytes::Bytes;
use futures::future::BoxFuture;

use crate::error::WriteError;

/// 一次物理写入的完成信号。
pub type WriteCompletion<'a> = BoxFuture<'a, Result<(), WriteError>>;

/// 物理写入原语。
///
/// # 教案级注释
///
/// ## 意图（Why）
/// - 写引擎只关心“发起一次写入、等待其完成”，不关心底层是 TCP、内存管道还是测试替身；
/// - 把发起与完成拆成两个阶段，使“发起即失败”（套接字已失效、参数非法）与“完成时失败”
///   （对端重置、写半部关闭）可以被分别记录。
///
/// ## 契约（What）
/// - `write` 同步返回 `Err` 表示写入未能发起；
/// - 返回的 [`WriteCompletion`] 在缓冲被完全写出或写入失败时恰好完成一次，
///   实现需自行处理部分写入并循环直至写满；
/// - 写引擎保证同一通道上任意时刻至多只有一个完成信号在等待，实现无需自行排序；
/// - 完成信号被丢弃视为取消，实现不得在此之后继续写出残余字节。
pub trait AioChannel: Send + Sync + 'static {
    /// 发起一次写入。
    fn write(&self, buffer: Bytes) -> Result<WriteCompletion<'_>, WriteError>;
}
