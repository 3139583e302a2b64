// crates/cs_mesh/src/polyhedral.rs

//! 多面体网格
//!
//! 顶点坐标 + 面（有序顶点环）+ 单元（面列表）。几何量由
//! [`PolyMesh::compute_quantities`] 一次性计算，假设面为平面且单元关于
//! 其形心星形。

use cs_foundation::{CsError, CsResult};
use glam::DVec3;
use rayon::prelude::*;
use std::collections::HashMap;

/// 多面体网格
#[derive(Debug, Clone)]
pub struct PolyMesh {
    vertices: Vec<DVec3>,
    faces: Vec<Vec<usize>>,
    cells: Vec<Vec<usize>>,
}

impl PolyMesh {
    /// 创建网格并检查索引
    pub fn new(vertices: Vec<DVec3>, faces: Vec<Vec<usize>>, cells: Vec<Vec<usize>>) -> CsResult<Self> {
        let n_vertices = vertices.len();
        for (f, face) in faces.iter().enumerate() {
            if face.len() < 3 {
                return Err(CsError::invalid_mesh(format!("面 {} 的顶点数少于 3", f)));
            }
            for &v in face {
                CsError::check_index("Vertex", v, n_vertices)?;
            }
        }
        let n_faces = faces.len();
        for (c, cell) in cells.iter().enumerate() {
            if cell.len() < 4 {
                return Err(CsError::invalid_mesh(format!("单元 {} 的面数少于 4", c)));
            }
            for &f in cell {
                CsError::check_index("Face", f, n_faces)?;
            }
        }
        Ok(Self::from_parts(vertices, faces, cells))
    }

    /// 不做检查的构造（生成器内部使用）
    pub(crate) fn from_parts(
        vertices: Vec<DVec3>,
        faces: Vec<Vec<usize>>,
        cells: Vec<Vec<usize>>,
    ) -> Self {
        Self {
            vertices,
            faces,
            cells,
        }
    }

    /// 顶点数
    #[inline]
    pub fn n_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// 面数
    #[inline]
    pub fn n_faces(&self) -> usize {
        self.faces.len()
    }

    /// 单元数
    #[inline]
    pub fn n_cells(&self) -> usize {
        self.cells.len()
    }

    /// 全部顶点坐标
    #[inline]
    pub fn vertices(&self) -> &[DVec3] {
        &self.vertices
    }

    /// 面的顶点环
    #[inline]
    pub fn face_vertices(&self, f: usize) -> &[usize] {
        &self.faces[f]
    }

    /// 单元的面列表
    #[inline]
    pub fn cell_faces(&self, c: usize) -> &[usize] {
        &self.cells[c]
    }

    /// 计算几何量
    pub fn compute_quantities(&self) -> MeshQuantities {
        MeshQuantities::compute(self)
    }
}

/// 网格几何量
#[derive(Debug, Clone, Default)]
pub struct MeshQuantities {
    /// 面形心
    pub face_centers: Vec<DVec3>,
    /// 面单位法向（不保证朝外）
    pub face_normals: Vec<DVec3>,
    /// 面面积
    pub face_areas: Vec<f64>,
    /// 单元形心
    pub cell_centers: Vec<DVec3>,
    /// 单元体积
    pub cell_volumes: Vec<f64>,
    /// 对偶单元体积（每个顶点一个）
    pub dual_volumes: Vec<f64>,
    /// 边的两个端点（升序）
    pub edges: Vec<[usize; 2]>,
    /// 边中点
    pub edge_centers: Vec<DVec3>,
    /// 面的边列表，第 i 条边连接环上第 i 与 i+1 个顶点
    pub face_edges: Vec<Vec<usize>>,
    /// 边界面标记
    pub is_boundary_face: Vec<bool>,
}

impl MeshQuantities {
    fn compute(mesh: &PolyMesh) -> Self {
        let xv = mesh.vertices();
        let n_faces = mesh.n_faces();

        // 面几何（逐面独立，并行计算）
        let face_geom: Vec<(DVec3, DVec3, f64)> = (0..n_faces)
            .into_par_iter()
            .map(|f| face_geometry(xv, mesh.face_vertices(f)))
            .collect();
        let mut face_centers = Vec::with_capacity(n_faces);
        let mut face_normals = Vec::with_capacity(n_faces);
        let mut face_areas = Vec::with_capacity(n_faces);
        for (xf, nf, area) in face_geom {
            face_centers.push(xf);
            face_normals.push(nf);
            face_areas.push(area);
        }

        // 边编号
        let mut edge_map: HashMap<(usize, usize), usize> = HashMap::new();
        let mut edges = Vec::new();
        let mut face_edges = Vec::with_capacity(n_faces);
        for f in 0..n_faces {
            let loop_ids = mesh.face_vertices(f);
            let n = loop_ids.len();
            let mut f_edges = Vec::with_capacity(n);
            for i in 0..n {
                let a = loop_ids[i];
                let b = loop_ids[(i + 1) % n];
                let key = (a.min(b), a.max(b));
                let id = *edge_map.entry(key).or_insert_with(|| {
                    edges.push([key.0, key.1]);
                    edges.len() - 1
                });
                f_edges.push(id);
            }
            face_edges.push(f_edges);
        }
        let edge_centers = edges.iter().map(|e| 0.5 * (xv[e[0]] + xv[e[1]])).collect();

        // 边界面：只属于一个单元
        let mut face_count = vec![0u8; n_faces];
        for c in 0..mesh.n_cells() {
            for &f in mesh.cell_faces(c) {
                face_count[f] = face_count[f].saturating_add(1);
            }
        }
        let is_boundary_face = face_count.iter().map(|&n| n == 1).collect();

        // 单元几何：以顶点平均点为锥顶的棱锥分解
        let n_cells = mesh.n_cells();
        let (cell_centers, cell_volumes): (Vec<DVec3>, Vec<f64>) = (0..n_cells)
            .into_par_iter()
            .map(|c| {
                let faces = mesh.cell_faces(c);
                let mut apex = DVec3::ZERO;
                let mut n_pts = 0usize;
                for &f in faces {
                    for &v in mesh.face_vertices(f) {
                        apex += xv[v];
                        n_pts += 1;
                    }
                }
                apex /= n_pts as f64;

                let mut vol = 0.0;
                let mut center = DVec3::ZERO;
                for &f in faces {
                    let h = (face_centers[f] - apex).dot(face_normals[f]).abs();
                    let pvol = face_areas[f] * h / 3.0;
                    vol += pvol;
                    center += pvol * (apex + 0.75 * (face_centers[f] - apex));
                }
                (if vol > 0.0 { center / vol } else { apex }, vol)
            })
            .unzip();

        // 对偶单元体积：子四面体 (v1, e, f, c) 的体积归属顶点 v1
        let mut dual_volumes = vec![0.0; mesh.n_vertices()];
        for c in 0..n_cells {
            let xc = cell_centers[c];
            for &f in mesh.cell_faces(c) {
                let xf = face_centers[f];
                let hfc = (xf - xc).dot(face_normals[f]).abs();
                let loop_ids = mesh.face_vertices(f);
                let n = loop_ids.len();
                for i in 0..n {
                    let v1 = loop_ids[i];
                    let v2 = loop_ids[(i + 1) % n];
                    let tef = triangle_area(xv[v1], xv[v2], xf);
                    let half_pef = tef * hfc / 6.0;
                    dual_volumes[v1] += half_pef;
                    dual_volumes[v2] += half_pef;
                }
            }
        }

        log::debug!(
            "网格几何量: {} 顶点, {} 边, {} 面, {} 单元",
            mesh.n_vertices(),
            edges.len(),
            n_faces,
            n_cells
        );

        Self {
            face_centers,
            face_normals,
            face_areas,
            cell_centers,
            cell_volumes,
            dual_volumes,
            edges,
            edge_centers,
            face_edges,
            is_boundary_face,
        }
    }

    /// 边数
    #[inline]
    pub fn n_edges(&self) -> usize {
        self.edges.len()
    }

    /// 边界面列表
    pub fn boundary_faces(&self) -> Vec<usize> {
        self.is_boundary_face
            .iter()
            .enumerate()
            .filter_map(|(f, &b)| b.then_some(f))
            .collect()
    }
}

/// 三角形面积
#[inline]
pub fn triangle_area(a: DVec3, b: DVec3, c: DVec3) -> f64 {
    0.5 * (b - a).cross(c - a).length()
}

/// 面的形心、单位法向和面积（以顶点平均点做三角剖分）
fn face_geometry(xv: &[DVec3], loop_ids: &[usize]) -> (DVec3, DVec3, f64) {
    let n = loop_ids.len();
    let xavg = loop_ids.iter().map(|&v| xv[v]).sum::<DVec3>() / n as f64;

    let mut area = 0.0;
    let mut vec_area = DVec3::ZERO;
    let mut center = DVec3::ZERO;
    for i in 0..n {
        let a = xv[loop_ids[i]];
        let b = xv[loop_ids[(i + 1) % n]];
        let cross = (a - xavg).cross(b - xavg);
        let tri = 0.5 * cross.length();
        vec_area += 0.5 * cross;
        area += tri;
        center += tri * (a + b + xavg) / 3.0;
    }

    let normal = vec_area.normalize_or_zero();
    let center = if area > 0.0 { center / area } else { xavg };
    (center, normal, area)
}
