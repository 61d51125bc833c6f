// crates/af_config/src/error.rs

//! 配置错误类型

use thiserror::Error;

/// 配置错误
#[derive(Error, Debug)]
pub enum ConfigError {
    /// IO 错误
    #[error("配置IO错误: {0}")]
    Io(#[from] std::io::Error),

    /// 解析错误
    #[error("配置解析错误: {0}")]
    Parse(String),

    /// 配置值无效
    #[error("配置值无效: {key}={value}, 原因: {reason}")]
    InvalidValue {
        /// 配置键名
        key: String,
        /// 配置值
        value: String,
        /// 无效原因说明
        reason: String,
    },
}

impl ConfigError {
    /// 配置值无效
    pub fn invalid(
        key: impl Into<String>,
        value: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            key: key.into(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_value_display() {
        let err = ConfigError::invalid("time.cfl_start", -1.0, "必须为正");
        let msg = err.to_string();
        assert!(msg.contains("time.cfl_start"));
        assert!(msg.contains("-1"));
    }
}
