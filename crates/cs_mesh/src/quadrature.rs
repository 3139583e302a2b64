// crates/cs_mesh/src/quadrature.rs

//! 求积类型与四面体求积公式

use glam::DVec3;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 求积类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuadratureType {
    /// 未设置
    None,
    /// 重心一点公式
    #[default]
    Bary,
    /// 子四面体重心公式
    BarySubdiv,
    /// 二阶精度（10 点公式）
    Higher,
    /// 三阶精度（5 点 Gauss 公式）
    Highest,
}

impl QuadratureType {
    /// 从关键字解析（已转小写）
    pub fn from_keyword(s: &str) -> Option<Self> {
        match s {
            "bary" => Some(Self::Bary),
            "bary_subdiv" => Some(Self::BarySubdiv),
            "higher" => Some(Self::Higher),
            "highest" => Some(Self::Highest),
            _ => None,
        }
    }

    /// 显示名
    pub fn name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Bary => "barycentric",
            Self::BarySubdiv => "barycentric on a tetrahedral subdivision",
            Self::Higher => "10-point rule (exact up to degree 2)",
            Self::Highest => "5-point Gauss rule (exact up to degree 3)",
        }
    }

    /// 全部可用关键字
    pub const KEYWORDS: &'static [&'static str] = &["bary", "bary_subdiv", "higher", "highest"];
}

impl fmt::Display for QuadratureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 10 点公式顶点权重
pub const Q10_VERTEX_WEIGHT: f64 = -0.05;
/// 10 点公式棱中点权重
pub const Q10_EDGE_WEIGHT: f64 = 0.2;

/// 四面体体积
#[inline]
pub fn tet_volume(a: DVec3, b: DVec3, c: DVec3, d: DVec3) -> f64 {
    (b - a).dot((c - a).cross(d - a)).abs() / 6.0
}

/// 四面体 5 点 Gauss 公式（对三次多项式精确）
///
/// 返回积分点与已乘体积的权重。
pub fn tet_5pts(a: DVec3, b: DVec3, c: DVec3, d: DVec3, vol: f64) -> ([DVec3; 5], [f64; 5]) {
    const ONE_SIXTH: f64 = 1.0 / 6.0;
    let sum = a + b + c + d;
    let pts = [
        0.25 * sum,
        0.5 * a + ONE_SIXTH * (b + c + d),
        0.5 * b + ONE_SIXTH * (a + c + d),
        0.5 * c + ONE_SIXTH * (a + b + d),
        0.5 * d + ONE_SIXTH * (a + b + c),
    ];
    let w = 0.45 * vol;
    (pts, [-0.8 * vol, w, w, w, w])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ref_tet() -> [DVec3; 4] {
        [DVec3::ZERO, DVec3::X, DVec3::Y, DVec3::Z]
    }

    #[test]
    fn test_tet_volume() {
        let [a, b, c, d] = ref_tet();
        assert!((tet_volume(a, b, c, d) - 1.0 / 6.0).abs() < 1e-15);
    }

    #[test]
    fn test_5pts_exact_for_cubic() {
        let [a, b, c, d] = ref_tet();
        let (pts, w) = tet_5pts(a, b, c, d, 1.0 / 6.0);
        // ∫ x^3 = 3!/6! = 1/120, ∫ xyz = 1/720
        let i3: f64 = pts.iter().zip(w).map(|(p, w)| w * p.x.powi(3)).sum();
        let ixyz: f64 = pts.iter().zip(w).map(|(p, w)| w * p.x * p.y * p.z).sum();
        assert!((i3 - 1.0 / 120.0).abs() < 1e-14);
        assert!((ixyz - 1.0 / 720.0).abs() < 1e-14);
    }

    #[test]
    fn test_keywords() {
        for kw in QuadratureType::KEYWORDS {
            assert!(QuadratureType::from_keyword(kw).is_some());
        }
        assert_eq!(QuadratureType::from_keyword("gauss"), None);
    }
}
