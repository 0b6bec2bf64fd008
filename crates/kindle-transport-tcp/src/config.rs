use std::io;
use std::time::Duration;

use kindle_core::{ConfigError, RetrySettings};
use serde::Deserialize;
use socket2::{SockRef, TcpKeepalive};
use tokio::net::TcpStream;

/// TCP 连接的套接字与建连参数。
///
/// # 教案级注释
///
/// ## 意图（Why）
/// - 把 `TCP_NODELAY`、`SO_KEEPALIVE`、`SO_LINGER` 这类内核选项配置化，调用方无需直接操作 `socket2`；
/// - 建连重试的节律复用 [`RetrySettings`]，与其它重试点共享同一套旋钮。
///
/// ## 契约（What）
/// - 缺省值：开启 `nodelay`，不设置 keepalive 与 linger，建连最多尝试 3 次、无等待；
/// - `keepalive_ms`/`linger_ms` 以毫秒为单位，`keepalive_ms = 0` 视为非法；
/// - **后置条件**：[`TcpSettings::apply`] 成功返回后，选项已写入套接字。
///
/// ## 注意事项（Trade-offs）
/// - `SO_LINGER` 在部分平台上按秒取整；设置过小会让发送缓冲中的残余数据被 RST 丢弃。
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TcpSettings {
    /// 是否关闭 Nagle 算法。
    pub nodelay: bool,
    /// 空闲多久后开始发送 keepalive 探测。
    pub keepalive_ms: Option<u64>,
    /// 关闭时等待发送缓冲排空的上限。
    pub linger_ms: Option<u64>,
    /// 建连重试参数。
    pub connect: RetrySettings,
}

impl Default for TcpSettings {
    fn default() -> Self {
        Self {
            nodelay: true,
            keepalive_ms: None,
            linger_ms: None,
            connect: RetrySettings::default(),
        }
    }
}

impl TcpSettings {
    /// 从 TOML 文本解析并校验；建连参数位于 `[connect]` 表。
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let settings: Self = toml::from_str(input)?;
        settings.validate()?;
        Ok(settings)
    }

    /// 校验字段取值。
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.keepalive_ms == Some(0) {
            return Err(ConfigError::Invalid {
                field: "keepalive_ms",
                reason: "must be positive when set".into(),
            });
        }
        self.connect.validate()
    }

    /// keepalive 空闲时长。
    pub fn keepalive(&self) -> Option<Duration> {
        self.keepalive_ms.map(Duration::from_millis)
    }

    /// linger 时长。
    pub fn linger(&self) -> Option<Duration> {
        self.linger_ms.map(Duration::from_millis)
    }

    /// 把套接字选项写入已建立的连接。
    pub(crate) fn apply(&self, stream: &TcpStream) -> io::Result<()> {
        stream.set_nodelay(self.nodelay)?;
        let sock = SockRef::from(stream);
        if let Some(idle) = self.keepalive() {
            sock.set_tcp_keepalive(&TcpKeepalive::new().with_time(idle))?;
        }
        if self.linger_ms.is_some() {
            sock.set_linger(self.linger())?;
        }
        Ok(())
    }
}
