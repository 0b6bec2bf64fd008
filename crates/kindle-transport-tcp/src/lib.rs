#![deny(unsafe_code)]
#![doc = r#"
# kindle-transport-tcp

## 设计动机（Why）
- **定位**：该 crate 把 `kindle-core` 的有序写引擎落到 Tokio TCP 之上，
  负责监听、建连、套接字选项与连接装配。
- **架构角色**：`TcpChannel` 实现物理写入原语 [`AioChannel`](kindle_core::AioChannel)；
  `TcpListener`/`connect`/`connect_with_retry` 为每条连接创建
  [`ChannelContext`](kindle_core::ChannelContext) 与 [`WriteWorker`](kindle_core::WriteWorker)，
  应用层拿到的 [`TcpConnection`] 可直接并发提交消息。
- **设计理念**：写路径与读路径彻底分离。写半部交给写引擎串行化，读半部原样交还调用方，
  帧解析与协议语义不属于本层。

## 核心契约（What）
- **输入条件**：所有异步入口必须在 Tokio 运行时中调用；
- **输出保障**：同一连接上的字节按 `submit` 顺序出现在线路上；绑定、接受、建连与关闭失败
  返回带稳定错误码的 [`TransportError`]；
- **建连重试**：`connect_with_retry` 复用 [`AsyncRetryer`](kindle_core::AsyncRetryer)，
  只对瞬时错误（拒绝、重置、超时等）重试，节律由 [`TcpSettings::connect`] 决定。

## 实现策略（How）
- **执行框架**：完全依赖 Tokio 的 `TcpListener` 与 `TcpStream`，连接建立后立即 `into_split`；
- **套接字选项**：`TCP_NODELAY` 经 Tokio 设置，`SO_KEEPALIVE`/`SO_LINGER` 经 `socket2::SockRef` 设置；
- **关闭**：`finish` 先排空写队列再发送 FIN；`close` 取消未写出的批次后发送 FIN。

## 风险与考量（Trade-offs）
- **队列无界**：写引擎不对 `submit` 施加背压，慢对端会让待写批次在内存中累积，
  上层需结合写完成监听器自行限流；
- **linger 精度**：`SO_LINGER` 在部分平台按秒取整。
"#]

mod channel;
mod config;
mod connect;
mod connection;
mod error;
mod listener;

pub use channel::TcpChannel;
pub use config::TcpSettings;
pub use connect::{connect, connect_with_retry};
pub use connection::TcpConnection;
pub use error::TransportError;
pub use listener::TcpListener;
