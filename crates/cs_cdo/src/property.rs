// crates/cs_cdo/src/property.rs

//! 物性与对流场句柄
//!
//! 方程参数只引用物性，不拥有其定义。句柄以 `Arc` 共享，复制方程参数时
//! 只复制引用。

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// 物性张量类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PropertyKind {
    /// 各向同性
    #[default]
    Iso,
    /// 正交各向异性
    Ortho,
    /// 完全各向异性
    Aniso,
}

/// 物性
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    name: String,
    kind: PropertyKind,
}

impl Property {
    /// 创建共享物性句柄
    pub fn new(name: impl Into<String>, kind: PropertyKind) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            kind,
        })
    }

    /// 名称
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 类型
    pub fn kind(&self) -> PropertyKind {
        self.kind
    }

    /// 是否各向同性
    pub fn is_iso(&self) -> bool {
        self.kind == PropertyKind::Iso
    }
}

/// 对流速度场
#[derive(Debug, Clone, PartialEq)]
pub struct AdvectionField {
    name: String,
}

impl AdvectionField {
    /// 创建共享对流场句柄
    pub fn new(name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self { name: name.into() })
    }

    /// 名称
    pub fn name(&self) -> &str {
        &self.name
    }
}
