//! 写引擎集成测试入口。
//!
//! # 结构概览（What）
//! - `tests::aio::ordering`：延迟完成下的提交顺序、丢弃句柄后的排水与有序性性质测试；
//! - `tests::aio::lifecycle`：失败、连接关闭、停止与监听器 panic 下“每条消息恰好通知一次”。
//!
//! # 测试替身（How）
//! [`tests::aio::ScriptedChannel`] 按批次字节决定写入行为（延迟完成、完成时失败、发起即失败、永不完成），
//! 并记录发起/完成事件序列，供断言串行化语义。

pub mod tests {
    //! 集成测试命名空间，过滤路径为 `tests::aio::*`。
    pub mod aio {
        //! 共享的测试替身。

        use std::io;
        use std::sync::Arc;
        use std::time::Duration;

        use bytes::Bytes;
        use kindle_core::{
            AioChannel, AioListener, ChannelContext, EncodeError, EncodedBuffer, GroupContext,
            WriteCompletion, WriteError, WriteWorker,
        };
        use parking_lot::Mutex;

        /// 出站消息：原样写出的字节。
        #[derive(Clone, Debug, PartialEq, Eq)]
        pub struct Msg(pub Vec<u8>);

        impl From<&str> for Msg {
            fn from(value: &str) -> Self {
                Self(value.as_bytes().to_vec())
            }
        }

        pub fn encode(
            message: &Msg,
            _ctx: &ChannelContext<Msg>,
        ) -> Result<EncodedBuffer, EncodeError> {
            if message.0.is_empty() {
                return Err(EncodeError::new("empty message"));
            }
            Ok(EncodedBuffer::new(message.0.clone()))
        }

        /// 一次写入的脚本化行为。
        #[derive(Clone, Copy, Debug)]
        pub enum Behavior {
            Complete(Duration),
            FailOnComplete,
            FailToStart,
            Hang,
        }

        type Script = Box<dyn Fn(&[u8]) -> Behavior + Send + Sync>;

        pub struct ScriptedChannel {
            script: Script,
            events: Mutex<Vec<String>>,
            written: Mutex<Vec<u8>>,
        }

        impl ScriptedChannel {
            pub fn new(script: impl Fn(&[u8]) -> Behavior + Send + Sync + 'static) -> Arc<Self> {
                Arc::new(Self {
                    script: Box::new(script),
                    events: Mutex::new(Vec::new()),
                    written: Mutex::new(Vec::new()),
                })
            }

            pub fn instant() -> Arc<Self> {
                Self::new(|_| Behavior::Complete(Duration::ZERO))
            }

            pub fn events(&self) -> Vec<String> {
                self.events.lock().clone()
            }

            pub fn written(&self) -> Vec<u8> {
                self.written.lock().clone()
            }
        }

        impl AioChannel for ScriptedChannel {
            fn write(&self, buffer: Bytes) -> Result<WriteCompletion<'_>, WriteError> {
                let label = String::from_utf8_lossy(&buffer).into_owned();
                let behavior = (self.script)(&buffer);
                if let Behavior::FailToStart = behavior {
                    return Err(WriteError::Io(io::Error::new(
                        io::ErrorKind::NotConnected,
                        "socket gone",
                    )));
                }
                self.events.lock().push(format!("start {label}"));
                Ok(Box::pin(async move {
                    match behavior {
                        Behavior::Complete(delay) => {
                            if !delay.is_zero() {
                                tokio::time::sleep(delay).await;
                            }
                            self.written.lock().extend_from_slice(&buffer);
                            self.events.lock().push(format!("done {label}"));
                            Ok(())
                        }
                        Behavior::Hang => std::future::pending().await,
                        Behavior::FailOnComplete | Behavior::FailToStart => Err(WriteError::Io(
                            io::Error::new(io::ErrorKind::ConnectionReset, "peer reset"),
                        )),
                    }
                }))
            }
        }

        /// 监听器观察到的结果类别。
        #[derive(Clone, Copy, Debug, PartialEq, Eq)]
        pub enum Seen {
            Ok,
            Io,
            Closed,
            Cancelled,
        }

        #[derive(Default)]
        pub struct Recorder {
            seen: Mutex<Vec<(Msg, Seen)>>,
        }

        impl Recorder {
            pub fn seen(&self) -> Vec<(Msg, Seen)> {
                self.seen.lock().clone()
            }
        }

        impl AioListener<Msg> for Recorder {
            fn on_write_handled(
                &self,
                _ctx: &ChannelContext<Msg>,
                message: &Msg,
                outcome: Result<(), &WriteError>,
            ) {
                let seen = match outcome {
                    Ok(()) => Seen::Ok,
                    Err(WriteError::Io(_)) => Seen::Io,
                    Err(WriteError::ConnectionClosed) => Seen::Closed,
                    Err(WriteError::Cancelled) => Seen::Cancelled,
                };
                self.seen.lock().push((message.clone(), seen));
            }
        }

        /// 组装一条连接：上下文、写引擎与监听记录。
        pub fn connection(
            channel: Arc<ScriptedChannel>,
        ) -> (Arc<ChannelContext<Msg>>, WriteWorker<Msg>, Arc<Recorder>) {
            let recorder = Arc::new(Recorder::default());
            let group = GroupContext::new("test", encode).with_shared_listener(recorder.clone());
            let ctx = ChannelContext::new(Arc::new(group), channel);
            let worker = WriteWorker::spawn(Arc::clone(&ctx));
            (ctx, worker, recorder)
        }

        pub fn batch(items: &[&str]) -> Vec<Msg> {
            items.iter().copied().map(Msg::from).collect()
        }

        include!("ordering.rs");
        include!("lifecycle.rs");
    }
}
