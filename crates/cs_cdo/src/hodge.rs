// crates/cs_cdo/src/hodge.rs

//! 局部离散 Hodge 算子与单元构建器
//!
//! 以势（primal）形式给出的源项需要先乘以局部 Hodge 矩阵，才能得到
//! 对偶单元上的积分。这里只提供源项需要的对角（Voronoi）构造：
//!
//! - 顶点型：`H_vv = wvc·|c|`
//! - 顶点+单元型：顶点 `0.75·wvc·|c|`，单元 `0.25·|c|`
//!
//! 两者都满足 `Σ H_ii = |c|`，即常数势精确积分。

use crate::param::SpaceScheme;
use cs_foundation::{CsError, CsResult};
use cs_mesh::{CellMesh, CellMeshFlag};
use glam::DVec3;

/// 小型稠密矩阵（行主序）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocalMatrix {
    n: usize,
    values: Vec<f64>,
}

impl LocalMatrix {
    /// 创建 n×n 零矩阵
    pub fn zeros(n: usize) -> Self {
        Self {
            n,
            values: vec![0.0; n * n],
        }
    }

    /// 重置为 n×n 零矩阵，复用内存
    pub fn reset(&mut self, n: usize) {
        self.n = n;
        self.values.clear();
        self.values.resize(n * n, 0.0);
    }

    /// 阶数
    #[inline]
    pub fn n(&self) -> usize {
        self.n
    }

    /// 读取元素
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i * self.n + j]
    }

    /// 写入元素
    #[inline]
    pub fn set(&mut self, i: usize, j: usize, v: f64) {
        self.values[i * self.n + j] = v;
    }

    /// y = A x
    pub fn matvec(&self, x: &[f64], y: &mut [f64]) {
        debug_assert!(x.len() >= self.n && y.len() >= self.n);
        for (i, yi) in y.iter_mut().take(self.n).enumerate() {
            let row = &self.values[i * self.n..(i + 1) * self.n];
            *yi = row.iter().zip(x).map(|(a, b)| a * b).sum();
        }
    }

    /// 全部元素之和
    pub fn sum(&self) -> f64 {
        self.values.iter().sum()
    }
}

/// 顶点型对角 Hodge：`wvc·|c|`
pub fn voronoi_vpcd(cm: &CellMesh, hdg: &mut LocalMatrix) {
    debug_assert!(cm.has(CellMeshFlag::DEQ));
    let n_vc = cm.n_vc();
    hdg.reset(n_vc);
    for v in 0..n_vc {
        hdg.set(v, v, cm.wvc[v] * cm.vol_c);
    }
}

/// 顶点+单元型对角 Hodge，单元自由度排在顶点之后
pub fn voronoi_vcb(cm: &CellMesh, hdg: &mut LocalMatrix) {
    debug_assert!(cm.has(CellMeshFlag::DEQ));
    let n_vc = cm.n_vc();
    hdg.reset(n_vc + 1);
    for v in 0..n_vc {
        hdg.set(v, v, 0.75 * cm.wvc[v] * cm.vol_c);
    }
    hdg.set(n_vc, n_vc, 0.25 * cm.vol_c);
}

/// 源项使用的局部 Hodge 构造方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceHodge {
    /// 顶点型
    VertexVoronoi,
    /// 顶点+单元型
    VertexCellVoronoi,
}

impl SourceHodge {
    /// 按空间格式选择
    pub fn for_scheme(scheme: SpaceScheme) -> CsResult<Self> {
        match scheme {
            SpaceScheme::CdoVb => Ok(Self::VertexVoronoi),
            SpaceScheme::CdoVcb => Ok(Self::VertexCellVoronoi),
            other => Err(CsError::unsupported(format!("{} 的局部源项 Hodge 算子", other))),
        }
    }

    /// 所需的局部网格量
    pub fn cell_mesh_flag(&self) -> CellMeshFlag {
        CellMeshFlag::PV | CellMeshFlag::DEQ
    }

    /// 在单元上构建
    pub fn build(&self, cm: &CellMesh, hdg: &mut LocalMatrix) {
        match self {
            Self::VertexVoronoi => voronoi_vpcd(cm, hdg),
            Self::VertexCellVoronoi => voronoi_vcb(cm, hdg),
        }
    }
}

/// 单元构建器：逐单元核函数的临时缓冲区
///
/// 每个并行工作线程持有一份，缓冲区在单元之间复用。
#[derive(Debug, Clone, Default)]
pub struct CellBuilder {
    /// 标量缓冲区
    pub values: Vec<f64>,
    /// 坐标缓冲区
    pub vectors: Vec<DVec3>,
    /// 局部编号缓冲区
    pub ids: Vec<usize>,
    /// 局部 Hodge 矩阵（若已构建）
    pub hdg: Option<LocalMatrix>,
}

impl CellBuilder {
    /// 创建空构建器
    pub fn new() -> Self {
        Self::default()
    }

    /// 为当前单元构建局部 Hodge 矩阵
    pub fn build_hodge(&mut self, kind: SourceHodge, cm: &CellMesh) {
        let hdg = self.hdg.get_or_insert_with(LocalMatrix::default);
        kind.build(cm, hdg);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cs_mesh::BoxMeshGenerator;

    fn cell() -> CellMesh {
        let mesh = BoxMeshGenerator::new(1, 1, 1, 2.0, 1.0, 0.5).build();
        let quant = mesh.compute_quantities();
        let mut cm = CellMesh::default();
        cm.build(&mesh, &quant, 0, CellMeshFlag::PV | CellMeshFlag::DEQ);
        cm
    }

    #[test]
    fn test_vpcd_integrates_constant() {
        let cm = cell();
        let mut hdg = LocalMatrix::default();
        voronoi_vpcd(&cm, &mut hdg);
        assert_eq!(hdg.n(), 8);
        assert!((hdg.sum() - 1.0).abs() < 1e-12);
        assert!((hdg.get(0, 0) - 0.125).abs() < 1e-12);
        assert_eq!(hdg.get(0, 1), 0.0);
    }

    #[test]
    fn test_vcb_split() {
        let cm = cell();
        let mut hdg = LocalMatrix::default();
        voronoi_vcb(&cm, &mut hdg);
        assert_eq!(hdg.n(), 9);
        assert!((hdg.sum() - 1.0).abs() < 1e-12);
        assert!((hdg.get(8, 8) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_matvec() {
        let mut m = LocalMatrix::zeros(2);
        m.set(0, 0, 2.0);
        m.set(0, 1, 1.0);
        m.set(1, 1, 3.0);
        let mut y = [0.0; 2];
        m.matvec(&[1.0, 2.0], &mut y);
        assert_eq!(y, [4.0, 6.0]);
    }

    #[test]
    fn test_source_hodge_scheme() {
        assert_eq!(SourceHodge::for_scheme(SpaceScheme::CdoVb).unwrap(), SourceHodge::VertexVoronoi);
        assert!(SourceHodge::for_scheme(SpaceScheme::CdoFb).is_err());
    }
}
