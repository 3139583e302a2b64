// crates/cs_mesh/src/generation.rs

//! 网格生成模块
//!
//! 提供长方体域上的结构化六面体网格，用于测试和命令行演示：
//!
//! - [`BoxMeshGenerator`]: nx × ny × nz 六面体网格生成器
//!
//! # 使用示例
//!
//! ```rust
//! use cs_mesh::generation::BoxMeshGenerator;
//!
//! let generator = BoxMeshGenerator::new(4, 2, 1, 4.0, 1.0, 0.5);
//! let mesh = generator.build();
//!
//! assert_eq!(mesh.n_cells(), 8);
//! assert_eq!(mesh.n_vertices(), 5 * 3 * 2);
//! ```

use crate::polyhedral::PolyMesh;
use crate::zone::ZoneRegistry;
use cs_foundation::CsResult;
use glam::DVec3;

/// 长方体六面体网格生成器
///
/// 顶点编号 `i + (nx+1)*(j + (ny+1)*k)`，单元编号 `i + nx*(j + ny*k)`。
/// 面按 x 法向、y 法向、z 法向三组依次编号。
#[derive(Debug, Clone)]
pub struct BoxMeshGenerator {
    nx: usize,
    ny: usize,
    nz: usize,
    lengths: DVec3,
    origin: DVec3,
}

impl BoxMeshGenerator {
    /// 创建生成器
    ///
    /// # 参数
    ///
    /// - `nx`, `ny`, `nz`: 各方向单元数
    /// - `lx`, `ly`, `lz`: 各方向域长度
    pub fn new(nx: usize, ny: usize, nz: usize, lx: f64, ly: f64, lz: f64) -> Self {
        Self {
            nx: nx.max(1),
            ny: ny.max(1),
            nz: nz.max(1),
            lengths: DVec3::new(lx, ly, lz),
            origin: DVec3::ZERO,
        }
    }

    /// 立方体网格
    pub fn cube(n: usize, length: f64) -> Self {
        Self::new(n, n, n, length, length, length)
    }

    /// 设置原点偏移
    pub fn with_origin(mut self, origin: DVec3) -> Self {
        self.origin = origin;
        self
    }

    /// 网格间距
    pub fn spacing(&self) -> DVec3 {
        self.lengths / DVec3::new(self.nx as f64, self.ny as f64, self.nz as f64)
    }

    /// 顶点总数
    pub fn n_vertices(&self) -> usize {
        (self.nx + 1) * (self.ny + 1) * (self.nz + 1)
    }

    /// 单元总数
    pub fn n_cells(&self) -> usize {
        self.nx * self.ny * self.nz
    }

    #[inline]
    fn vid(&self, i: usize, j: usize, k: usize) -> usize {
        i + (self.nx + 1) * (j + (self.ny + 1) * k)
    }

    #[inline]
    fn n_xfaces(&self) -> usize {
        (self.nx + 1) * self.ny * self.nz
    }

    #[inline]
    fn n_yfaces(&self) -> usize {
        self.nx * (self.ny + 1) * self.nz
    }

    #[inline]
    fn xface(&self, i: usize, j: usize, k: usize) -> usize {
        i + (self.nx + 1) * (j + self.ny * k)
    }

    #[inline]
    fn yface(&self, i: usize, j: usize, k: usize) -> usize {
        self.n_xfaces() + i + self.nx * (j + (self.ny + 1) * k)
    }

    #[inline]
    fn zface(&self, i: usize, j: usize, k: usize) -> usize {
        self.n_xfaces() + self.n_yfaces() + i + self.nx * (j + self.ny * k)
    }

    /// 构建网格
    pub fn build(&self) -> PolyMesh {
        let (nx, ny, nz) = (self.nx, self.ny, self.nz);
        let h = self.spacing();

        let mut vertices = Vec::with_capacity(self.n_vertices());
        for k in 0..=nz {
            for j in 0..=ny {
                for i in 0..=nx {
                    vertices.push(self.origin + DVec3::new(i as f64, j as f64, k as f64) * h);
                }
            }
        }

        let mut faces = Vec::new();
        // x 法向面
        for k in 0..nz {
            for j in 0..ny {
                for i in 0..=nx {
                    faces.push(vec![
                        self.vid(i, j, k),
                        self.vid(i, j + 1, k),
                        self.vid(i, j + 1, k + 1),
                        self.vid(i, j, k + 1),
                    ]);
                }
            }
        }
        // y 法向面
        for k in 0..nz {
            for j in 0..=ny {
                for i in 0..nx {
                    faces.push(vec![
                        self.vid(i, j, k),
                        self.vid(i, j, k + 1),
                        self.vid(i + 1, j, k + 1),
                        self.vid(i + 1, j, k),
                    ]);
                }
            }
        }
        // z 法向面
        for k in 0..=nz {
            for j in 0..ny {
                for i in 0..nx {
                    faces.push(vec![
                        self.vid(i, j, k),
                        self.vid(i + 1, j, k),
                        self.vid(i + 1, j + 1, k),
                        self.vid(i, j + 1, k),
                    ]);
                }
            }
        }

        let mut cells = Vec::with_capacity(self.n_cells());
        for k in 0..nz {
            for j in 0..ny {
                for i in 0..nx {
                    cells.push(vec![
                        self.xface(i, j, k),
                        self.xface(i + 1, j, k),
                        self.yface(i, j, k),
                        self.yface(i, j + 1, k),
                        self.zface(i, j, k),
                        self.zface(i, j, k + 1),
                    ]);
                }
            }
        }

        log::debug!(
            "生成长方体网格 {}x{}x{}: {} 单元",
            nx,
            ny,
            nz,
            cells.len()
        );
        PolyMesh::from_parts(vertices, faces, cells)
    }

    /// 六个外表面的面编号：`xmin`, `xmax`, `ymin`, `ymax`, `zmin`, `zmax`
    pub fn boundary_sides(&self) -> Vec<(&'static str, Vec<usize>)> {
        let (nx, ny, nz) = (self.nx, self.ny, self.nz);
        let mut xmin = Vec::new();
        let mut xmax = Vec::new();
        for k in 0..nz {
            for j in 0..ny {
                xmin.push(self.xface(0, j, k));
                xmax.push(self.xface(nx, j, k));
            }
        }
        let mut ymin = Vec::new();
        let mut ymax = Vec::new();
        for k in 0..nz {
            for i in 0..nx {
                ymin.push(self.yface(i, 0, k));
                ymax.push(self.yface(i, ny, k));
            }
        }
        let mut zmin = Vec::new();
        let mut zmax = Vec::new();
        for j in 0..ny {
            for i in 0..nx {
                zmin.push(self.zface(i, j, 0));
                zmax.push(self.zface(i, j, nz));
            }
        }
        vec![
            ("xmin", xmin),
            ("xmax", xmax),
            ("ymin", ymin),
            ("ymax", ymax),
            ("zmin", zmin),
            ("zmax", zmax),
        ]
    }

    /// 将六个外表面注册为边界区域
    pub fn register_boundary_zones(&self, zones: &mut ZoneRegistry) -> CsResult<()> {
        for (name, faces) in self.boundary_sides() {
            zones.add_boundary_zone(name, faces)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts() {
        let gen = BoxMeshGenerator::new(3, 2, 4, 1.0, 1.0, 1.0);
        let mesh = gen.build();
        assert_eq!(mesh.n_vertices(), 4 * 3 * 5);
        assert_eq!(mesh.n_cells(), 24);
        assert_eq!(mesh.n_faces(), 4 * 2 * 4 + 3 * 3 * 4 + 3 * 2 * 5);
    }

    #[test]
    fn test_cell_volumes_and_centers() {
        let gen = BoxMeshGenerator::new(2, 2, 2, 2.0, 4.0, 1.0).with_origin(DVec3::new(-1.0, 0.0, 0.0));
        let q = gen.build().compute_quantities();
        for &v in &q.cell_volumes {
            assert!((v - 1.0).abs() < 1e-12);
        }
        assert!((q.cell_centers[0] - DVec3::new(-0.5, 1.0, 0.25)).length() < 1e-12);
    }

    #[test]
    fn test_boundary_sides_match_boundary_faces() {
        let gen = BoxMeshGenerator::cube(3, 1.0);
        let q = gen.build().compute_quantities();
        let n_sides: usize = gen.boundary_sides().iter().map(|(_, f)| f.len()).sum();
        assert_eq!(n_sides, q.boundary_faces().len());
        for (_, faces) in gen.boundary_sides() {
            assert!(faces.iter().all(|&f| q.is_boundary_face[f]));
        }
    }
}
