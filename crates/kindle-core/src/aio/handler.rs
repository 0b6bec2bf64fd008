use std::io;

use bytes::{Buf, BufMut, Bytes, BytesMut};

use super::context::ChannelContext;
use crate::error::EncodeError;

/// 编码器产出的缓冲：带读写位置的字节向量。
///
/// 编码器通常以 `std::io::Write` 写入后直接返回，此时位置停在末尾；写引擎发现没有剩余可读字节时
/// 会把位置复位到 0 再读取，而不是把它当作空缓冲丢弃。
pub type EncodedBuffer = io::Cursor<Vec<u8>>;

/// 出站消息的编码能力，按消息类型实现并在 [`GroupContext`](super::GroupContext) 构造时绑定。
///
/// # 契约说明（What）
/// - 每条消息独立编码，返回的缓冲应定位在可读起点；若位置停在末尾，写引擎会复位一次；
/// - 编码在入队之前同步执行，错误直接返回给 `submit` 的调用方；
/// - 实现必须无副作用地支持并发调用。
pub trait AioHandler<M>: Send + Sync + 'static {
    /// 将消息编码为待写字节。
    fn encode(&self, message: &M, ctx: &ChannelContext<M>) -> Result<EncodedBuffer, EncodeError>;
}

impl<M, F> AioHandler<M> for F
where
    F: Fn(&M, &ChannelContext<M>) -> Result<EncodedBuffer, EncodeError> + Send + Sync + 'static,
{
    fn encode(&self, message: &M, ctx: &ChannelContext<M>) -> Result<EncodedBuffer, EncodeError> {
        self(message, ctx)
    }
}

/// 编码后若无剩余可读字节，复位读位置。
pub(crate) fn prepare_for_read(buffer: &mut EncodedBuffer) {
    if !buffer.has_remaining() {
        buffer.set_position(0);
    }
}

/// 把一批缓冲按顺序拼接为一次物理写入的字节。
pub(crate) fn composite(buffers: Vec<EncodedBuffer>) -> Bytes {
    let total = buffers.iter().map(Buf::remaining).sum();
    let mut out = BytesMut::with_capacity(total);
    for buffer in buffers {
        out.put(buffer);
    }
    out.freeze()
}
