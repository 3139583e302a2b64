// crates/cs_mesh/src/cell_mesh.rs

//! 单元局部视图
//!
//! `CellMesh` 收集一个单元上逐单元核函数所需的局部量：局部顶点、边、面的
//! 坐标，对偶体积分数 `wvc`，面到单元形心的距离 `hfc`，以及三角形
//! (v1, v2, xf) 的面积 `tef`。需要哪些量由 [`CellMeshFlag`] 指定，
//! 依赖的量会自动补齐。
//!
//! # 使用示例
//!
//! ```
//! use cs_mesh::{BoxMeshGenerator, CellMesh, CellMeshFlag};
//!
//! let mesh = BoxMeshGenerator::cube(1, 2.0).build();
//! let quant = mesh.compute_quantities();
//! let mut cm = CellMesh::default();
//! cm.build(&mesh, &quant, 0, CellMeshFlag::DEQ);
//! let sum: f64 = cm.wvc.iter().sum();
//! assert!((sum - 1.0).abs() < 1e-12);
//! ```

use crate::polyhedral::{triangle_area, MeshQuantities, PolyMesh};
use glam::DVec3;
use std::ops::BitOr;

/// 局部量请求标志
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct CellMeshFlag(pub u32);

impl CellMeshFlag {
    /// 局部顶点编号
    pub const PV: Self = Self(1 << 0);
    /// 局部顶点坐标
    pub const PVQ: Self = Self(1 << 1);
    /// 局部边中点
    pub const PEQ: Self = Self(1 << 2);
    /// 局部面形心与面积
    pub const PFQ: Self = Self(1 << 3);
    /// 对偶体积分数 wvc
    pub const DEQ: Self = Self(1 << 4);
    /// 边到顶点连接
    pub const EV: Self = Self(1 << 5);
    /// 面到边连接
    pub const FE: Self = Self(1 << 6);
    /// 三角形 (e, xf) 面积 tef
    pub const FEQ: Self = Self(1 << 7);
    /// 面到单元形心距离 hfc
    pub const HFQ: Self = Self(1 << 8);

    /// 空请求
    pub const EMPTY: Self = Self(0);

    /// 是否包含全部位
    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// 补齐依赖
    pub fn closure(self) -> Self {
        let mut f = self;
        if f.contains(Self::DEQ) {
            f = f | Self::FEQ | Self::HFQ;
        }
        if f.contains(Self::FEQ) {
            f = f | Self::FE | Self::PFQ | Self::PVQ;
        }
        if f.contains(Self::HFQ) {
            f = f | Self::PFQ;
        }
        if f.contains(Self::FE) {
            f = f | Self::EV;
        }
        if f.contains(Self::PEQ) {
            f = f | Self::EV;
        }
        if f.contains(Self::EV) || f.contains(Self::PVQ) {
            f = f | Self::PV;
        }
        f
    }
}

impl BitOr for CellMeshFlag {
    type Output = Self;
    #[inline]
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// 单元局部视图
#[derive(Debug, Clone, Default)]
pub struct CellMesh {
    /// 已构建的量
    pub flag: CellMeshFlag,
    /// 单元编号
    pub c_id: usize,
    /// 单元形心
    pub xc: DVec3,
    /// 单元体积
    pub vol_c: f64,

    /// 局部顶点的全局编号
    pub v_ids: Vec<usize>,
    /// 局部顶点坐标
    pub xv: Vec<DVec3>,
    /// 对偶单元与本单元交集体积占 |c| 的分数
    pub wvc: Vec<f64>,

    /// 局部边的全局编号
    pub e_ids: Vec<usize>,
    /// 局部边中点
    pub xe: Vec<DVec3>,
    /// 局部边的两个局部顶点
    pub e2v: Vec<[usize; 2]>,

    /// 局部面的全局编号
    pub f_ids: Vec<usize>,
    /// 局部面形心
    pub xf: Vec<DVec3>,
    /// 局部面面积
    pub face_area: Vec<f64>,
    /// 面到单元形心的距离
    pub hfc: Vec<f64>,

    /// 面到边的索引（长度 n_fc + 1）
    pub f2e_idx: Vec<usize>,
    /// 面到边的局部边编号
    pub f2e_ids: Vec<usize>,
    /// 三角形 (v1, v2, xf) 面积，与 `f2e_ids` 对齐
    pub tef: Vec<f64>,
}

impl CellMesh {
    /// 局部顶点数
    #[inline]
    pub fn n_vc(&self) -> usize {
        self.v_ids.len()
    }

    /// 局部边数
    #[inline]
    pub fn n_ec(&self) -> usize {
        self.e_ids.len()
    }

    /// 局部面数
    #[inline]
    pub fn n_fc(&self) -> usize {
        self.f_ids.len()
    }

    /// 是否已构建所需的量
    #[inline]
    pub fn has(&self, flag: CellMeshFlag) -> bool {
        self.flag.contains(flag)
    }

    /// 面 `f` 的局部边范围（用于 `f2e_ids` 与 `tef`）
    #[inline]
    pub fn face_edge_range(&self, f: usize) -> std::ops::Range<usize> {
        self.f2e_idx[f]..self.f2e_idx[f + 1]
    }

    fn clear(&mut self) {
        self.v_ids.clear();
        self.xv.clear();
        self.wvc.clear();
        self.e_ids.clear();
        self.xe.clear();
        self.e2v.clear();
        self.f_ids.clear();
        self.xf.clear();
        self.face_area.clear();
        self.hfc.clear();
        self.f2e_idx.clear();
        self.f2e_ids.clear();
        self.tef.clear();
    }

    /// 为单元 `c_id` 构建局部视图，复用已有缓冲区
    pub fn build(&mut self, mesh: &PolyMesh, quant: &MeshQuantities, c_id: usize, flag: CellMeshFlag) {
        let flag = flag.closure();
        self.clear();
        self.flag = flag;
        self.c_id = c_id;
        self.xc = quant.cell_centers[c_id];
        self.vol_c = quant.cell_volumes[c_id];

        let faces = mesh.cell_faces(c_id);
        let xv_all = mesh.vertices();

        if flag.contains(CellMeshFlag::PV) {
            for &f in faces {
                for &v in mesh.face_vertices(f) {
                    if !self.v_ids.contains(&v) {
                        self.v_ids.push(v);
                    }
                }
            }
        }
        if flag.contains(CellMeshFlag::PVQ) {
            self.xv.extend(self.v_ids.iter().map(|&v| xv_all[v]));
        }

        if flag.contains(CellMeshFlag::EV) {
            for &f in faces {
                for &e in &quant.face_edges[f] {
                    if !self.e_ids.contains(&e) {
                        self.e_ids.push(e);
                        let [a, b] = quant.edges[e];
                        let pair = [self.local_vertex(a), self.local_vertex(b)];
                        self.e2v.push(pair);
                    }
                }
            }
        }
        if flag.contains(CellMeshFlag::PEQ) {
            self.xe.extend(self.e_ids.iter().map(|&e| quant.edge_centers[e]));
        }

        if flag.contains(CellMeshFlag::PFQ) {
            for &f in faces {
                self.f_ids.push(f);
                self.xf.push(quant.face_centers[f]);
                self.face_area.push(quant.face_areas[f]);
            }
        }
        if flag.contains(CellMeshFlag::HFQ) {
            for &f in faces {
                let h = (quant.face_centers[f] - self.xc).dot(quant.face_normals[f]).abs();
                self.hfc.push(h);
            }
        }

        if flag.contains(CellMeshFlag::FE) {
            self.f2e_idx.push(0);
            for (lf, &f) in faces.iter().enumerate() {
                for &e in &quant.face_edges[f] {
                    let le = self.local_edge(e);
                    self.f2e_ids.push(le);
                    if flag.contains(CellMeshFlag::FEQ) {
                        let [v1, v2] = self.e2v[le];
                        self.tef.push(triangle_area(self.xv[v1], self.xv[v2], self.xf[lf]));
                    }
                }
                self.f2e_idx.push(self.f2e_ids.len());
            }
        }

        if flag.contains(CellMeshFlag::DEQ) {
            self.wvc.resize(self.n_vc(), 0.0);
            for f in 0..self.n_fc() {
                let hf_coef = self.hfc[f] / 6.0;
                for i in self.face_edge_range(f) {
                    let [v1, v2] = self.e2v[self.f2e_ids[i]];
                    let half_pef = self.tef[i] * hf_coef;
                    self.wvc[v1] += half_pef;
                    self.wvc[v2] += half_pef;
                }
            }
            let inv_vol = 1.0 / self.vol_c;
            for w in self.wvc.iter_mut() {
                *w *= inv_vol;
            }
        }
    }

    /// 全局顶点编号转局部编号
    fn local_vertex(&self, v: usize) -> usize {
        self.v_ids.iter().position(|&x| x == v).unwrap_or(usize::MAX)
    }

    /// 全局边编号转局部编号
    fn local_edge(&self, e: usize) -> usize {
        self.e_ids.iter().position(|&x| x == e).unwrap_or(usize::MAX)
    }
}
