// crates/cs_foundation/src/flag.rs

//! 位标志
//!
//! `Flag` 是对 `u32` 的轻量封装，用于描述量的位置（主/对偶网格上的点、边、
//! 面、单元）、定义的元信息以及状态（均匀、逐单元、密度等）。
//! 位置位与状态位属于不同的命名空间，不要混用。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};

/// 32 位标志集合
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Flag(pub u32);

impl Flag {
    /// 空标志
    pub const EMPTY: Flag = Flag(0);

    /// 由原始位构造
    #[inline]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// 原始位
    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// 是否包含 `other` 的全部位
    #[inline]
    pub const fn contains(self, other: Flag) -> bool {
        self.0 & other.0 == other.0
    }

    /// 是否与 `other` 有公共位
    #[inline]
    pub const fn intersects(self, other: Flag) -> bool {
        self.0 & other.0 != 0
    }

    /// 是否为空
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// 置位
    #[inline]
    pub fn insert(&mut self, other: Flag) {
        self.0 |= other.0;
    }

    /// 清位
    #[inline]
    pub fn remove(&mut self, other: Flag) {
        self.0 &= !other.0;
    }

    /// 合并（常量上下文可用）
    #[inline]
    pub const fn union(self, other: Flag) -> Flag {
        Flag(self.0 | other.0)
    }
}

impl BitOr for Flag {
    type Output = Flag;
    #[inline]
    fn bitor(self, rhs: Flag) -> Flag {
        Flag(self.0 | rhs.0)
    }
}

impl BitOrAssign for Flag {
    #[inline]
    fn bitor_assign(&mut self, rhs: Flag) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for Flag {
    type Output = Flag;
    #[inline]
    fn bitand(self, rhs: Flag) -> Flag {
        Flag(self.0 & rhs.0)
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

// ============================================================================
// 位置与元信息位
// ============================================================================

/// 标量
pub const SCALAR: Flag = Flag(1 << 0);
/// 矢量
pub const VECTOR: Flag = Flag(1 << 1);
/// 张量
pub const TENSOR: Flag = Flag(1 << 2);
/// 顶点
pub const VERTEX: Flag = Flag(1 << 3);
/// 边
pub const EDGE: Flag = Flag(1 << 4);
/// 面
pub const FACE: Flag = Flag(1 << 5);
/// 单元
pub const CELL: Flag = Flag(1 << 6);
/// 主网格
pub const PRIMAL: Flag = Flag(1 << 7);
/// 对偶网格
pub const DUAL: Flag = Flag(1 << 8);
/// 边界
pub const BORDER: Flag = Flag(1 << 9);
/// 按单元局部处理
pub const BY_CELL: Flag = Flag(1 << 10);
/// 定义覆盖整个计算域
pub const FULL_LOC: Flag = Flag(1 << 11);

/// 主网格顶点
pub const PRIMAL_VTX: Flag = PRIMAL.union(VERTEX);
/// 主网格边
pub const PRIMAL_EDGE: Flag = PRIMAL.union(EDGE);
/// 主网格面
pub const PRIMAL_FACE: Flag = PRIMAL.union(FACE);
/// 主网格单元
pub const PRIMAL_CELL: Flag = PRIMAL.union(CELL);
/// 对偶单元（与主网格顶点一一对应）
pub const DUAL_CELL: Flag = DUAL.union(CELL);

// ============================================================================
// 状态位
// ============================================================================

/// 状态标志命名空间
pub mod state {
    use super::Flag;

    /// 在支撑集上均匀
    pub const UNIFORM: Flag = Flag(1 << 0);
    /// 逐单元给定
    pub const CELLWISE: Flag = Flag(1 << 1);
    /// 逐面给定
    pub const FACEWISE: Flag = Flag(1 << 2);
    /// 不随时间变化
    pub const STEADY: Flag = Flag(1 << 3);
    /// 按密度（单位体积）给定
    pub const DENSITY: Flag = Flag(1 << 4);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_and_intersects() {
        let f = PRIMAL_CELL | FULL_LOC;
        assert!(f.contains(PRIMAL_CELL));
        assert!(f.contains(FULL_LOC));
        assert!(!f.contains(DUAL_CELL));
        assert!(f.intersects(DUAL_CELL));
    }

    #[test]
    fn test_insert_remove() {
        let mut f = Flag::EMPTY;
        f.insert(DUAL_CELL);
        assert!(f.contains(DUAL_CELL));
        f.remove(DUAL);
        assert!(f.contains(CELL));
        assert!(!f.contains(DUAL));
    }

    #[test]
    fn test_named_locations_distinct() {
        let all = [PRIMAL_VTX, PRIMAL_EDGE, PRIMAL_FACE, PRIMAL_CELL, DUAL_CELL];
        for (i, a) in all.iter().enumerate() {
            for (j, b) in all.iter().enumerate() {
                assert_eq!(i == j, a == b);
            }
        }
    }
}
