// crates/af_foundation/src/error.rs

//! 错误处理模块，定义统一错误类型
//!
//! 提供 `AfError` 枚举和 `AfResult` 类型别名，用于整个项目的错误处理。
//!
//! # 设计原则
//!
//! 1. **层次化**: 基础层只定义核心错误，物理相关错误在 af_physics 中扩展
//! 2. **致命 vs 诊断**: 此处的错误全部是致命错误（配置不一致、结构不匹配）。
//!    数值类问题（线性求解器未收敛、非物理点）以计数器形式记录，不走错误通道
//! 3. **易用性**: 提供便捷的构造方法

use std::path::PathBuf;
use thiserror::Error;

/// 统一结果类型
pub type AfResult<T> = Result<T, AfError>;

/// AeroFlux 错误类型
///
/// 核心错误类型，全部表示不可恢复的配置/结构错误。
#[derive(Error, Debug)]
pub enum AfError {
    /// IO 错误
    #[error("IO错误: {message}")]
    Io {
        /// 描述性错误信息
        message: String,
        #[source]
        /// 可选的底层 IO 错误
        source: Option<std::io::Error>,
    },

    /// 配置错误
    #[error("配置错误: {message}")]
    Config {
        /// 具体错误信息
        message: String,
    },

    /// 未知的边界条件类型
    #[error("未知的边界条件类型: 标记 '{marker}' 的类型 '{kind}' 无法识别")]
    UnknownBoundaryKind {
        /// 边界标记名
        marker: String,
        /// 输入的类型字符串
        kind: String,
    },

    /// 未知的共轭传热耦合模式
    #[error("未知的共轭传热耦合模式: {mode}")]
    UnknownChtCoupling {
        /// 输入的模式字符串
        mode: String,
    },

    /// 无效网格拓扑
    #[error("无效的网格拓扑: {message}")]
    InvalidMesh {
        /// 具体错误信息
        message: String,
    },

    /// 数组大小不匹配
    #[error("数组大小不匹配: {name} 期望{expected}, 实际{actual}")]
    SizeMismatch {
        /// 数据名称
        name: &'static str,
        /// 期望大小
        expected: usize,
        /// 实际大小
        actual: usize,
    },

    /// 索引越界
    #[error("索引越界: {index_type} 索引 {index} 超出范围 0..{len}")]
    IndexOutOfBounds {
        /// 索引类别描述
        index_type: &'static str,
        /// 访问的索引
        index: usize,
        /// 上界（长度）
        len: usize,
    },

    /// 重启文件结构不匹配
    #[error("重启文件结构不匹配: {path} 记录 {found_points}点×{found_vars}变量, 期望 {expected_points}点×{expected_vars}变量")]
    RestartMismatch {
        /// 重启文件路径
        path: PathBuf,
        /// 文件中的点数
        found_points: usize,
        /// 文件中的变量数
        found_vars: usize,
        /// 期望点数
        expected_points: usize,
        /// 期望变量数
        expected_vars: usize,
    },

    /// 序列化错误
    #[error("序列化错误: {message}")]
    Serialization {
        /// 序列化失败原因
        message: String,
    },

    /// 验证失败
    #[error("验证失败: {0}")]
    Validation(String),

    /// 内部错误
    #[error("内部错误: {message}")]
    Internal {
        /// 内部错误描述
        message: String,
    },
}

// ========================================================================
// 便捷构造方法
// ========================================================================

impl AfError {
    /// 从IO错误创建
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
            source: None,
        }
    }

    /// 配置错误
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// 未知边界条件类型
    pub fn unknown_boundary(marker: impl Into<String>, kind: impl Into<String>) -> Self {
        Self::UnknownBoundaryKind {
            marker: marker.into(),
            kind: kind.into(),
        }
    }

    /// 未知共轭传热耦合模式
    pub fn unknown_cht_coupling(mode: impl Into<String>) -> Self {
        Self::UnknownChtCoupling { mode: mode.into() }
    }

    /// 无效网格
    pub fn invalid_mesh(message: impl Into<String>) -> Self {
        Self::InvalidMesh {
            message: message.into(),
        }
    }

    /// 数组大小不匹配
    pub fn size_mismatch(name: &'static str, expected: usize, actual: usize) -> Self {
        Self::SizeMismatch {
            name,
            expected,
            actual,
        }
    }

    /// 索引越界
    pub fn index_out_of_bounds(index_type: &'static str, index: usize, len: usize) -> Self {
        Self::IndexOutOfBounds {
            index_type,
            index,
            len,
        }
    }

    /// 序列化错误
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// 验证失败
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// 内部错误
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

// ========================================================================
// 验证辅助方法
// ========================================================================

impl AfError {
    /// 检查数组大小是否匹配
    #[inline]
    pub fn check_size(name: &'static str, expected: usize, actual: usize) -> AfResult<()> {
        if expected != actual {
            Err(Self::size_mismatch(name, expected, actual))
        } else {
            Ok(())
        }
    }

    /// 检查索引是否在范围内
    #[inline]
    pub fn check_index(index_type: &'static str, index: usize, len: usize) -> AfResult<()> {
        if index >= len {
            Err(Self::index_out_of_bounds(index_type, index, len))
        } else {
            Ok(())
        }
    }
}

impl From<std::io::Error> for AfError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

// ========================================================================
// 测试
// ========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AfError::config("测试配置错误");
        assert!(err.to_string().contains("配置错误"));
    }

    #[test]
    fn test_unknown_boundary() {
        let err = AfError::unknown_boundary("wall_1", "slip_wall");
        assert!(err.to_string().contains("wall_1"));
        assert!(err.to_string().contains("slip_wall"));
    }

    #[test]
    fn test_restart_mismatch_display() {
        let err = AfError::RestartMismatch {
            path: PathBuf::from("restart.afs"),
            found_points: 100,
            found_vars: 5,
            expected_points: 200,
            expected_vars: 4,
        };
        let msg = err.to_string();
        assert!(msg.contains("100"));
        assert!(msg.contains("200"));
    }

    #[test]
    fn test_check_size() {
        assert!(AfError::check_size("test", 10, 10).is_ok());
        assert!(AfError::check_size("test", 10, 5).is_err());
    }

    #[test]
    fn test_check_index() {
        assert!(AfError::check_index("Point", 5, 10).is_ok());
        assert!(AfError::check_index("Point", 10, 10).is_err());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "test");
        let af_err: AfError = io_err.into();
        assert!(matches!(af_err, AfError::Io { .. }));
    }
}
