// crates/cs_cdo/src/param.rs

//! 离散参数枚举
//!
//! 每个枚举都带有关键字解析（`from_keyword`，输入应已转为小写）、显示名和
//! serde 支持。关键字拼写与设置文件中使用的完全一致，例如 `"cdo_vb"`、
//! `"upwind"`、`"crank_nicolson"`。
//!
//! # 使用示例
//!
//! ```
//! use cs_cdo::param::{AdvectionScheme, SpaceScheme};
//!
//! assert_eq!(SpaceScheme::from_keyword("cdo_fb"), Some(SpaceScheme::CdoFb));
//! assert_eq!(AdvectionScheme::from_keyword("sg"), Some(AdvectionScheme::Sg));
//! assert!(SpaceScheme::from_keyword("cdo_xx").is_none());
//! ```

use cs_foundation::Flag;
use serde::{Deserialize, Serialize};

/// 生成带关键字解析的参数枚举
macro_rules! keyword_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $(
                $(#[$vmeta:meta])*
                $variant:ident => [$($kw:literal),*], $label:literal
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $(
                $(#[$vmeta])*
                $variant,
            )+
        }

        impl $name {
            /// 全部可接受的关键字
            pub const KEYWORDS: &'static [&'static str] = &[$($($kw,)*)+];

            /// 从关键字解析
            pub fn from_keyword(s: &str) -> Option<Self> {
                $(
                    let kws: &[&str] = &[$($kw),*];
                    if kws.contains(&s) {
                        return Some(Self::$variant);
                    }
                )+
                None
            }

            /// 显示名
            pub fn name(&self) -> &'static str {
                match self {
                    $(Self::$variant => $label,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.name())
            }
        }
    };
}

pub(crate) use keyword_enum;

// ============================================================================
// 空间与时间离散
// ============================================================================

keyword_enum! {
    /// 空间离散格式
    pub enum SpaceScheme {
        /// 顶点型 CDO
        CdoVb => ["cdo_vb"], "CDO vertex-based",
        /// 顶点+单元型 CDO
        CdoVcb => ["cdo_vcb"], "CDO vertex+cell-based",
        /// 面型 CDO
        CdoFb => ["cdo_fb"], "CDO face-based",
        /// 边型 CDO
        CdoEb => ["cdo_eb"], "CDO edge-based",
        /// HHO 零阶
        HhoP0 => ["hho_p0"], "HHO (k=0)",
        /// HHO 一阶
        HhoP1 => ["hho_p1"], "HHO (k=1)",
        /// HHO 二阶
        HhoP2 => ["hho_p2"], "HHO (k=2)",
    }
}

impl Default for SpaceScheme {
    fn default() -> Self {
        Self::CdoVb
    }
}

impl SpaceScheme {
    /// 自由度位于顶点（Vb 或 VCb）
    #[inline]
    pub fn is_vertex_based(&self) -> bool {
        matches!(self, Self::CdoVb | Self::CdoVcb)
    }

    /// HHO 类格式
    #[inline]
    pub fn is_hho(&self) -> bool {
        matches!(self, Self::HhoP0 | Self::HhoP1 | Self::HhoP2)
    }
}

keyword_enum! {
    /// 时间离散格式
    pub enum TimeScheme {
        /// 定常
        Steady => ["no", "steady"], "Steady-state",
        /// 隐式 Euler
        EulerImplicit => ["euler_implicit"], "Implicit Euler",
        /// 显式 Euler
        EulerExplicit => ["euler_explicit"], "Explicit Euler",
        /// Crank-Nicolson
        CrankNicolson => ["crank_nicolson"], "Crank-Nicolson",
        /// 一般 theta 格式
        Theta => ["theta_scheme"], "Theta scheme",
    }
}

impl Default for TimeScheme {
    fn default() -> Self {
        Self::EulerImplicit
    }
}

impl TimeScheme {
    /// 由格式决定的 theta 值；定常与一般 theta 格式不改变 theta
    pub fn implied_theta(&self) -> Option<f64> {
        match self {
            Self::EulerImplicit => Some(1.0),
            Self::EulerExplicit => Some(0.0),
            Self::CrankNicolson => Some(0.5),
            Self::Steady | Self::Theta => None,
        }
    }
}

keyword_enum! {
    /// 自由度约化方式
    pub enum DofReduction {
        /// De Rham 映射（点值、边积分……）
        DeRham => ["derham"], "De Rham",
        /// 平均值
        Average => ["average"], "Average",
    }
}

impl Default for DofReduction {
    fn default() -> Self {
        Self::DeRham
    }
}

// ============================================================================
// 离散 Hodge 算子
// ============================================================================

keyword_enum! {
    /// Hodge 算子构造算法
    pub enum HodgeAlgo {
        /// Voronoi（对角）
        Voronoi => ["voronoi"], "Voronoi",
        /// 全迁移基函数
        Wbs => ["wbs"], "WBS",
        /// 一致性 + 稳定化
        Cost => ["cost", "ocs"], "COST",
        /// 正交一致性 + 子稳定化
        Ocs2 => ["ocs2"], "OCS2",
        /// 气泡稳定化
        Bubble => ["bubble"], "Bubble",
        /// 自动选择
        Auto => ["auto"], "Automatic",
    }
}

keyword_enum! {
    /// Hodge 算子连接的两类自由度
    pub enum HodgeType {
        /// 主顶点 → 对偶单元
        Vpcd => [], "VpCd",
        /// 主边 → 对偶面
        Epfd => [], "EpFd",
        /// 主面 → 对偶边
        Fped => [], "FpEd",
        /// 对偶边 → 主面
        Edfp => [], "EdFp",
        /// 主单元 → 对偶顶点
        Cpvd => [], "CpVd",
        /// 顶点+单元
        Vc => [], "VC",
    }
}

/// 离散 Hodge 算子参数
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HodgeParam {
    /// 物性恒为 1
    pub is_unity: bool,
    /// 物性各向同性
    pub is_iso: bool,
    /// 使用物性的倒数
    pub inv_pty: bool,
    /// 构造算法
    pub algo: HodgeAlgo,
    /// 类型
    pub kind: HodgeType,
    /// 稳定化系数
    pub coef: f64,
}

impl HodgeParam {
    /// 创建 Hodge 参数，`is_iso` 默认为真
    pub fn new(is_unity: bool, algo: HodgeAlgo, kind: HodgeType, coef: f64) -> Self {
        Self {
            is_unity,
            is_iso: true,
            inv_pty: false,
            algo,
            kind,
            coef,
        }
    }
}

/// 解析 `hodge_diff_coef` 的取值：具名系数或数值
pub fn parse_hodge_coef(s: &str) -> Option<f64> {
    match s {
        "dga" => Some(1.0 / 3.0),
        "sushi" => Some(1.0 / 3f64.sqrt()),
        "gcr" => Some(1.0),
        "frac23" | "2/3" => Some(2.0 / 3.0),
        _ => s.parse::<f64>().ok(),
    }
}

// ============================================================================
// 对流
// ============================================================================

keyword_enum! {
    /// 对流项形式
    pub enum AdvectionFormulation {
        /// 守恒形式
        Conservative => ["conservative"], "Conservative",
        /// 非守恒形式
        NonConservative => ["non_conservative"], "Non-conservative",
        /// 斜对称形式
        SkewSymmetric => ["skew_symmetric"], "Skew-symmetric",
    }
}

keyword_enum! {
    /// 对流离散格式
    pub enum AdvectionScheme {
        /// 迎风
        Upwind => ["upwind"], "Upwind",
        /// Samarskii 加权
        Samarskii => ["samarskii"], "Upwind weighted with Samarskii function",
        /// Scharfetter-Gummel 加权
        Sg => ["sg"], "Upwind weighted with Scharfetter-Gummel function",
        /// 中心
        Centered => ["centered"], "Centered",
        /// 中心与迎风混合
        MixCenteredUpwind => ["mix_centered_upwind"], "Mixed centered-upwind",
        /// 连续内罚
        Cip => ["cip"], "Continuous Interior Penalty",
        /// 逐单元连续内罚
        CipCw => ["cip_cw"], "Continuous Interior Penalty (cellwise)",
    }
}

impl AdvectionScheme {
    /// 该格式只支持非守恒形式
    #[inline]
    pub fn forces_non_conservative(&self) -> bool {
        matches!(self, Self::Cip | Self::CipCw)
    }
}

// ============================================================================
// 边界条件
// ============================================================================

keyword_enum! {
    /// 边界条件类型
    pub enum BcType {
        /// 齐次 Dirichlet
        HmgDirichlet => ["hmg_dirichlet", "homogeneous_dirichlet"], "Homogeneous Dirichlet",
        /// Dirichlet
        Dirichlet => ["dirichlet"], "Dirichlet",
        /// 齐次 Neumann
        HmgNeumann => ["hmg_neumann", "homogeneous_neumann"], "Homogeneous Neumann",
        /// Neumann
        Neumann => ["neumann"], "Neumann",
        /// Robin
        Robin => ["robin"], "Robin",
        /// 滑移
        Sliding => ["sliding"], "Sliding",
        /// 环量
        Circulation => ["circulation"], "Circulation",
    }
}

/// 边界条件元信息位
pub mod bc_flag {
    use cs_foundation::Flag;

    /// 齐次 Dirichlet
    pub const HMG_DIRICHLET: Flag = Flag(1 << 0);
    /// Dirichlet
    pub const DIRICHLET: Flag = Flag(1 << 1);
    /// 齐次 Neumann
    pub const HMG_NEUMANN: Flag = Flag(1 << 2);
    /// Neumann
    pub const NEUMANN: Flag = Flag(1 << 3);
    /// Robin
    pub const ROBIN: Flag = Flag(1 << 4);
    /// 滑移
    pub const SLIDING: Flag = Flag(1 << 5);
    /// 环量
    pub const CIRCULATION: Flag = Flag(1 << 6);
}

impl BcType {
    /// 对应的边界条件标志
    pub fn flag(&self) -> Flag {
        match self {
            Self::HmgDirichlet => bc_flag::HMG_DIRICHLET,
            Self::Dirichlet => bc_flag::DIRICHLET,
            Self::HmgNeumann => bc_flag::HMG_NEUMANN,
            Self::Neumann => bc_flag::NEUMANN,
            Self::Robin => bc_flag::ROBIN,
            Self::Sliding => bc_flag::SLIDING,
            Self::Circulation => bc_flag::CIRCULATION,
        }
    }
}

keyword_enum! {
    /// 边界条件施加方式
    pub enum BcEnforcement {
        /// 代数施加
        Algebraic => ["algebraic"], "Algebraic",
        /// 罚函数
        Penalized => ["penalization"], "Penalization",
        /// 对称 Nitsche
        WeakSym => ["weak_sym"], "Weak (symmetrized Nitsche)",
        /// Nitsche
        WeakNitsche => ["weak"], "Weak (Nitsche)",
    }
}

impl Default for BcEnforcement {
    fn default() -> Self {
        Self::Algebraic
    }
}

// ============================================================================
// 方程类别与装配
// ============================================================================

keyword_enum! {
    /// 方程类别
    pub enum EquationType {
        /// 地下水
        Groundwater => ["groundwater"], "Groundwater",
        /// 电磁
        Maxwell => ["maxwell"], "Maxwell",
        /// 传热
        Thermal => ["thermal"], "Thermal",
        /// Navier-Stokes
        Navsto => ["navsto"], "Navier-Stokes",
        /// 预定义
        Predefined => ["predefined"], "Predefined",
        /// 用户方程
        User => ["user"], "User",
    }
}

keyword_enum! {
    /// 并行装配冲突处理策略
    pub enum AssemblyStrategy {
        /// 临界区
        Critical => ["critical"], "critical",
        /// 原子操作
        Atomic => ["atomic"], "atomic",
    }
}

impl Default for AssemblyStrategy {
    fn default() -> Self {
        Self::Critical
    }
}

// ============================================================================
// 方程标志
// ============================================================================

/// 方程项与状态标志
pub mod eq_flag {
    use cs_foundation::Flag;

    /// 非定常项
    pub const UNSTEADY: Flag = Flag(1 << 0);
    /// 对流项
    pub const CONVECTION: Flag = Flag(1 << 1);
    /// 扩散项
    pub const DIFFUSION: Flag = Flag(1 << 2);
    /// 旋度-旋度项
    pub const CURLCURL: Flag = Flag(1 << 3);
    /// 梯度-散度项
    pub const GRADDIV: Flag = Flag(1 << 4);
    /// 反应项
    pub const REACTION: Flag = Flag(1 << 5);
    /// 强制内部自由度取值
    pub const FORCE_VALUES: Flag = Flag(1 << 6);
    /// 已锁定
    pub const LOCKED: Flag = Flag(1 << 7);
}

/// 后处理附加操作标志
pub mod post_flag {
    use cs_foundation::Flag;

    /// 守恒平衡
    pub const BALANCE: Flag = Flag(1 << 0);
    /// Peclet 数
    pub const PECLET: Flag = Flag(1 << 1);
    /// 迎风系数
    pub const UPWIND_COEF: Flag = Flag(1 << 2);
    /// 法向通量
    pub const NORMAL_FLUX: Flag = Flag(1 << 3);

    /// 关键字到标志
    pub fn from_keyword(s: &str) -> Option<Flag> {
        match s {
            "balance" => Some(BALANCE),
            "peclet" => Some(PECLET),
            "upwind_coef" => Some(UPWIND_COEF),
            "normal_flux" => Some(NORMAL_FLUX),
            _ => None,
        }
    }

    /// 全部可接受的关键字
    pub const KEYWORDS: &[&str] = &["balance", "peclet", "upwind_coef", "normal_flux"];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_keyword_parses() {
        for kw in SpaceScheme::KEYWORDS {
            assert!(SpaceScheme::from_keyword(kw).is_some(), "{}", kw);
        }
        for kw in AdvectionScheme::KEYWORDS {
            assert!(AdvectionScheme::from_keyword(kw).is_some(), "{}", kw);
        }
        for kw in TimeScheme::KEYWORDS {
            assert!(TimeScheme::from_keyword(kw).is_some(), "{}", kw);
        }
    }

    #[test]
    fn test_aliases() {
        assert_eq!(TimeScheme::from_keyword("no"), Some(TimeScheme::Steady));
        assert_eq!(HodgeAlgo::from_keyword("ocs"), Some(HodgeAlgo::Cost));
        assert_eq!(BcType::from_keyword("homogeneous_neumann"), Some(BcType::HmgNeumann));
        assert!(HodgeType::KEYWORDS.is_empty());
        assert!(HodgeType::from_keyword("vpcd").is_none());
    }

    #[test]
    fn test_hodge_coef() {
        assert!((parse_hodge_coef("dga").unwrap() - 1.0 / 3.0).abs() < 1e-15);
        assert!((parse_hodge_coef("sushi").unwrap() - 0.577_350_269_189_625_8).abs() < 1e-15);
        assert_eq!(parse_hodge_coef("gcr"), Some(1.0));
        assert_eq!(parse_hodge_coef("2/3"), parse_hodge_coef("frac23"));
        assert_eq!(parse_hodge_coef("0.25"), Some(0.25));
        assert_eq!(parse_hodge_coef("abc"), None);
    }

    #[test]
    fn test_implied_theta() {
        assert_eq!(TimeScheme::CrankNicolson.implied_theta(), Some(0.5));
        assert_eq!(TimeScheme::Theta.implied_theta(), None);
    }

    #[test]
    fn test_serde_names() {
        let s = serde_json::to_string(&SpaceScheme::HhoP1).unwrap();
        assert_eq!(s, "\"hho_p1\"");
        let t: AdvectionScheme = serde_json::from_str("\"mix_centered_upwind\"").unwrap();
        assert_eq!(t, AdvectionScheme::MixCenteredUpwind);
    }
}
