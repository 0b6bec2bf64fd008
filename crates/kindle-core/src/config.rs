//! TOML 驱动的重试参数。
//!
//! # 教案式说明
//! - **意图 (Why)**：部署方通常只需要调整“最多几次、间隔多久、单次多长、总共多长”四个旋钮，
//!   谓词与监听器仍由代码装配；
//! - **契约 (What)**：缺省字段取 [`RetrySettings::default`]，即与 [`RetryPolicy::builder`]
//!   的默认值一致；`max_attempts` 必须不小于 1；
//! - **用法 (How)**：`RetrySettings::from_toml_str(..)?.builder()?` 得到已填好停止条件、
//!   等待与单次时限的构造器，调用方再追加监听器。

use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::retry::{Attempt, RetryPolicy, RetryPolicyBuilder};

/// 重试参数，毫秒为单位。
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetrySettings {
    /// 最多尝试次数（含首次）。
    pub max_attempts: u32,
    /// 两次尝试之间的等待。
    pub wait_ms: u64,
    /// 单次尝试时限；缺省不限。
    pub attempt_timeout_ms: Option<u64>,
    /// 自首次尝试起的累计时限；缺省不限。
    pub max_elapsed_ms: Option<u64>,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            wait_ms: 0,
            attempt_timeout_ms: None,
            max_elapsed_ms: None,
        }
    }
}

impl RetrySettings {
    /// 从 TOML 文本解析并校验。
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let settings: Self = toml::from_str(input)?;
        settings.validate()?;
        Ok(settings)
    }

    /// 校验字段取值。
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts == 0 {
            return Err(ConfigError::Invalid {
                field: "max_attempts",
                reason: "must be at least 1".into(),
            });
        }
        if self.attempt_timeout_ms == Some(0) {
            return Err(ConfigError::Invalid {
                field: "attempt_timeout_ms",
                reason: "must be positive when set".into(),
            });
        }
        Ok(())
    }

    /// 两次尝试之间的等待。
    pub fn wait(&self) -> Duration {
        Duration::from_millis(self.wait_ms)
    }

    /// 单次尝试时限。
    pub fn attempt_timeout(&self) -> Option<Duration> {
        self.attempt_timeout_ms.map(Duration::from_millis)
    }

    /// 累计时限。
    pub fn max_elapsed(&self) -> Option<Duration> {
        self.max_elapsed_ms.map(Duration::from_millis)
    }

    /// 生成已应用本配置的策略构造器。
    ///
    /// 停止条件为“次数用尽或累计时限到达”二者之一；重试谓词保持默认（失败即重试）。
    pub fn builder<T, E>(&self) -> Result<RetryPolicyBuilder<T, E>, ConfigError>
    where
        T: 'static,
        E: 'static,
    {
        self.validate()?;
        let max_attempts = self.max_attempts;
        let max_elapsed = self.max_elapsed();
        let mut builder = RetryPolicy::builder()
            .wait(self.wait())
            .stop_if(move |attempt: &Attempt<T, E>| {
                attempt.number() >= max_attempts
                    || max_elapsed.is_some_and(|limit| attempt.elapsed() >= limit)
            });
        if let Some(limit) = self.attempt_timeout() {
            builder = builder.attempt_time_limit(limit);
        }
        Ok(builder)
    }
}
