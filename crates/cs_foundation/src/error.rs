// crates/cs_foundation/src/error.rs

//! 错误处理模块，定义统一错误类型
//!
//! 提供 `CsError` 枚举和 `CsResult` 类型别名。方程参数设置、源项分派、
//! 线性求解器配置等模块的所有非法输入都以 `Err` 返回，不再中止进程。
//!
//! # 示例
//!
//! ```
//! use cs_foundation::error::{CsError, CsResult};
//!
//! fn set_scheme(eq: &str, value: &str) -> CsResult<()> {
//!     Err(CsError::invalid_key_value(eq, "set_param", "space_scheme", value))
//! }
//!
//! let err = set_scheme("Temperature", "cdo_xx").unwrap_err();
//! assert!(err.to_string().contains("cdo_xx"));
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// 统一结果类型
pub type CsResult<T> = Result<T, CsError>;

/// CDO 设置错误类型
#[derive(Error, Debug)]
pub enum CsError {
    // ========================================================================
    // 方程参数错误
    // ========================================================================
    /// 关键字取值无效
    #[error("{func}: 方程 \"{eq}\" 的关键字 \"{key}\" 取值无效: \"{value}\"")]
    InvalidKeyValue {
        /// 方程名
        eq: String,
        /// 出错的操作
        func: String,
        /// 关键字名
        key: String,
        /// 非法取值
        value: String,
    },

    /// 未知关键字
    #[error("未知的方程关键字: \"{key}\"")]
    UnknownKey {
        /// 关键字名
        key: String,
    },

    /// 方程已锁定
    #[error("{func}: 方程 \"{eq}\" 已锁定，不能再修改参数")]
    Locked {
        /// 方程名
        eq: String,
        /// 出错的操作
        func: String,
    },

    /// 内部自由度的两种强制方式同时被请求
    #[error("{func}: 方程 \"{eq}\" 同时请求了两种内部自由度强制方式")]
    EnforcementConflict {
        /// 方程名
        eq: String,
        /// 出错的操作
        func: String,
    },

    /// 缺少必需的值
    #[error("{func}: 方程 \"{eq}\" 缺少必需的值: {what}")]
    MissingValue {
        /// 方程名
        eq: String,
        /// 出错的操作
        func: String,
        /// 缺少的内容
        what: String,
    },

    /// 离散格式与操作不兼容
    #[error("{func}: 方程 \"{eq}\" 的离散格式不兼容: {scheme}")]
    InvalidScheme {
        /// 方程名
        eq: String,
        /// 出错的操作
        func: String,
        /// 格式名
        scheme: String,
    },

    /// 定义不合法（维度、位置、类型等）
    #[error("{func}: 无效的定义: {message}")]
    InvalidDefinition {
        /// 出错的操作
        func: String,
        /// 描述
        message: String,
    },

    /// 源项数量超出掩码容量
    #[error("源项数量 {count} 超过上限 {max}")]
    TooManySourceTerms {
        /// 实际数量
        count: usize,
        /// 上限
        max: usize,
    },

    /// 未知区域
    #[error("未知的{kind}区域: \"{name}\"")]
    UnknownZone {
        /// 区域类别（体/边界）
        kind: &'static str,
        /// 区域名
        name: String,
    },

    /// 功能不可用（外部库未链接等）
    #[error("不支持的功能: {feature}")]
    Unsupported {
        /// 功能描述
        feature: String,
    },

    /// 求解器未收敛
    #[error("求解器 {solver} 在 {iterations} 次迭代后未收敛 (残差 {residual:.3e})")]
    NotConverged {
        /// 求解器名
        solver: String,
        /// 迭代次数
        iterations: usize,
        /// 最终残差
        residual: f64,
    },

    // ========================================================================
    // 数据与网格错误
    // ========================================================================
    /// 数组大小不匹配
    #[error("数组大小不匹配: {name} 期望 {expected}, 实际 {actual}")]
    SizeMismatch {
        /// 数组名称
        name: &'static str,
        /// 期望长度
        expected: usize,
        /// 实际长度
        actual: usize,
    },

    /// 索引越界
    #[error("{index_type} 索引越界: {index} >= {len}")]
    IndexOutOfBounds {
        /// 索引类型
        index_type: &'static str,
        /// 索引值
        index: usize,
        /// 容器长度
        len: usize,
    },

    /// 无效网格
    #[error("无效的网格: {message}")]
    InvalidMesh {
        /// 描述
        message: String,
    },

    // ========================================================================
    // 配置与 IO 错误
    // ========================================================================
    /// 配置错误
    #[error("配置错误: {message}")]
    Config {
        /// 描述
        message: String,
    },

    /// 文件不存在
    #[error("文件不存在: {path}")]
    FileNotFound {
        /// 路径
        path: PathBuf,
    },

    /// IO 错误
    #[error("IO错误: {message}")]
    Io {
        /// 描述
        message: String,
        /// 底层错误
        #[source]
        source: Option<std::io::Error>,
    },

    /// 序列化错误
    #[error("序列化错误: {message}")]
    Serialization {
        /// 描述
        message: String,
    },
}

// ========================================================================
// 便捷构造方法
// ========================================================================

impl CsError {
    /// 关键字取值无效
    pub fn invalid_key_value(
        eq: impl Into<String>,
        func: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self::InvalidKeyValue {
            eq: eq.into(),
            func: func.into(),
            key: key.into(),
            value: value.into(),
        }
    }

    /// 未知关键字
    pub fn unknown_key(key: impl Into<String>) -> Self {
        Self::UnknownKey { key: key.into() }
    }

    /// 方程已锁定
    pub fn locked(eq: impl Into<String>, func: impl Into<String>) -> Self {
        Self::Locked {
            eq: eq.into(),
            func: func.into(),
        }
    }

    /// 强制方式冲突
    pub fn enforcement_conflict(eq: impl Into<String>, func: impl Into<String>) -> Self {
        Self::EnforcementConflict {
            eq: eq.into(),
            func: func.into(),
        }
    }

    /// 缺少必需的值
    pub fn missing_value(
        eq: impl Into<String>,
        func: impl Into<String>,
        what: impl Into<String>,
    ) -> Self {
        Self::MissingValue {
            eq: eq.into(),
            func: func.into(),
            what: what.into(),
        }
    }

    /// 离散格式不兼容
    pub fn invalid_scheme(
        eq: impl Into<String>,
        func: impl Into<String>,
        scheme: impl std::fmt::Display,
    ) -> Self {
        Self::InvalidScheme {
            eq: eq.into(),
            func: func.into(),
            scheme: scheme.to_string(),
        }
    }

    /// 定义不合法
    pub fn invalid_definition(func: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidDefinition {
            func: func.into(),
            message: message.into(),
        }
    }

    /// 源项过多
    pub fn too_many_source_terms(count: usize, max: usize) -> Self {
        Self::TooManySourceTerms { count, max }
    }

    /// 未知区域
    pub fn unknown_zone(kind: &'static str, name: impl Into<String>) -> Self {
        Self::UnknownZone {
            kind,
            name: name.into(),
        }
    }

    /// 功能不可用
    pub fn unsupported(feature: impl Into<String>) -> Self {
        Self::Unsupported {
            feature: feature.into(),
        }
    }

    /// 未收敛
    pub fn not_converged(solver: impl Into<String>, iterations: usize, residual: f64) -> Self {
        Self::NotConverged {
            solver: solver.into(),
            iterations,
            residual,
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

    /// 无效网格
    pub fn invalid_mesh(message: impl Into<String>) -> Self {
        Self::InvalidMesh {
            message: message.into(),
        }
    }

    /// 配置错误
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// 文件不存在
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// 序列化错误
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }
}

// ========================================================================
// 验证辅助方法
// ========================================================================

impl CsError {
    /// 检查数组大小是否匹配
    #[inline]
    pub fn check_size(name: &'static str, expected: usize, actual: usize) -> CsResult<()> {
        if expected != actual {
            Err(Self::size_mismatch(name, expected, actual))
        } else {
            Ok(())
        }
    }

    /// 检查索引是否在范围内
    #[inline]
    pub fn check_index(index_type: &'static str, index: usize, len: usize) -> CsResult<()> {
        if index >= len {
            Err(Self::index_out_of_bounds(index_type, index, len))
        } else {
            Ok(())
        }
    }
}

/// 条件不满足时提前返回错误
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $err:expr $(,)?) => {
        if !($cond) {
            return Err($err.into());
        }
    };
}

/// 从 `Option` 取值，为 `None` 时提前返回错误
#[macro_export]
macro_rules! require {
    ($opt:expr, $err:expr $(,)?) => {
        match $opt {
            Some(v) => v,
            None => return Err($err.into()),
        }
    };
}

// ========================================================================
// 标准库错误转换
// ========================================================================

impl From<std::io::Error> for CsError {
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
    fn test_invalid_key_value_display() {
        let err = CsError::invalid_key_value("Temperature", "set_param", "adv_scheme", "foo");
        let msg = err.to_string();
        assert!(msg.contains("Temperature"));
        assert!(msg.contains("adv_scheme"));
        assert!(msg.contains("foo"));
        assert!(msg.contains("set_param"));
    }

    #[test]
    fn test_locked_display() {
        let err = CsError::locked("U", "add_time");
        assert!(err.to_string().contains("已锁定"));
    }

    #[test]
    fn test_check_size() {
        assert!(CsError::check_size("values", 3, 3).is_ok());
        assert!(CsError::check_size("values", 3, 1).is_err());
    }

    #[test]
    fn test_check_index() {
        assert!(CsError::check_index("Cell", 2, 3).is_ok());
        assert!(CsError::check_index("Cell", 3, 3).is_err());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "test");
        let err: CsError = io_err.into();
        assert!(matches!(err, CsError::Io { .. }));
    }

    #[test]
    fn test_ensure_macro() {
        fn check(value: i32) -> CsResult<()> {
            ensure!(value > 0, CsError::config("value must be positive"));
            Ok(())
        }

        assert!(check(1).is_ok());
        assert!(check(-1).is_err());
    }

    #[test]
    fn test_require_macro() {
        fn get(opt: Option<i32>) -> CsResult<i32> {
            let v = require!(opt, CsError::config("missing"));
            Ok(v)
        }

        assert_eq!(get(Some(7)).unwrap(), 7);
        assert!(get(None).is_err());
    }
}
