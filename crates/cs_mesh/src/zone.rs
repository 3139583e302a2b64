// crates/cs_mesh/src/zone.rs

//! 区域注册表
//!
//! 体区域（单元集合）与边界区域（边界面集合）按名字注册，编号从 0 开始。
//! 0 号体区域 `"cells"` 覆盖全部单元，0 号边界区域 `"boundary"` 覆盖全部
//! 边界面。空名字等价于 0 号区域。

use crate::polyhedral::{MeshQuantities, PolyMesh};
use cs_foundation::{CsError, CsResult};
use glam::DVec3;

/// 区域
#[derive(Debug, Clone)]
pub struct Zone {
    /// 区域编号
    pub id: usize,
    /// 区域名
    pub name: String,
    /// 元素编号（单元或面）
    pub elt_ids: Vec<usize>,
}

/// 区域注册表
#[derive(Debug, Clone)]
pub struct ZoneRegistry {
    n_cells: usize,
    n_faces: usize,
    volume: Vec<Zone>,
    boundary: Vec<Zone>,
}

impl ZoneRegistry {
    /// 默认体区域名
    pub const ALL_CELLS: &'static str = "cells";
    /// 默认边界区域名
    pub const ALL_BOUNDARY: &'static str = "boundary";

    /// 以网格创建注册表，包含两个默认区域
    pub fn new(mesh: &PolyMesh, quant: &MeshQuantities) -> Self {
        Self {
            n_cells: mesh.n_cells(),
            n_faces: mesh.n_faces(),
            volume: vec![Zone {
                id: 0,
                name: Self::ALL_CELLS.to_string(),
                elt_ids: (0..mesh.n_cells()).collect(),
            }],
            boundary: vec![Zone {
                id: 0,
                name: Self::ALL_BOUNDARY.to_string(),
                elt_ids: quant.boundary_faces(),
            }],
        }
    }

    /// 网格单元数
    #[inline]
    pub fn n_cells(&self) -> usize {
        self.n_cells
    }

    /// 注册体区域
    pub fn add_volume_zone(&mut self, name: &str, cell_ids: Vec<usize>) -> CsResult<usize> {
        Self::check_new_name(&self.volume, "体", name)?;
        for &c in &cell_ids {
            CsError::check_index("Cell", c, self.n_cells)?;
        }
        let id = self.volume.len();
        self.volume.push(Zone {
            id,
            name: name.to_string(),
            elt_ids: cell_ids,
        });
        Ok(id)
    }

    /// 以包围盒选取单元形心注册体区域
    pub fn add_volume_zone_by_box(
        &mut self,
        name: &str,
        min: DVec3,
        max: DVec3,
        quant: &MeshQuantities,
    ) -> CsResult<usize> {
        let cells = quant
            .cell_centers
            .iter()
            .enumerate()
            .filter(|(_, x)| x.cmpge(min).all() && x.cmple(max).all())
            .map(|(c, _)| c)
            .collect::<Vec<_>>();
        if cells.is_empty() {
            log::warn!("体区域 \"{}\" 没有选中任何单元", name);
        }
        self.add_volume_zone(name, cells)
    }

    /// 注册边界区域
    pub fn add_boundary_zone(&mut self, name: &str, face_ids: Vec<usize>) -> CsResult<usize> {
        Self::check_new_name(&self.boundary, "边界", name)?;
        for &f in &face_ids {
            CsError::check_index("Face", f, self.n_faces)?;
        }
        let id = self.boundary.len();
        self.boundary.push(Zone {
            id,
            name: name.to_string(),
            elt_ids: face_ids,
        });
        Ok(id)
    }

    fn check_new_name(zones: &[Zone], kind: &'static str, name: &str) -> CsResult<()> {
        if name.is_empty() || zones.iter().any(|z| z.name == name) {
            return Err(CsError::config(format!("{}区域名 \"{}\" 为空或已存在", kind, name)));
        }
        Ok(())
    }

    /// 按名字查找体区域编号，空名字返回 0
    pub fn volume_zone_id(&self, name: &str) -> CsResult<usize> {
        Self::find(&self.volume, "体", name)
    }

    /// 按名字查找边界区域编号，空名字返回 0
    pub fn boundary_zone_id(&self, name: &str) -> CsResult<usize> {
        Self::find(&self.boundary, "边界", name)
    }

    fn find(zones: &[Zone], kind: &'static str, name: &str) -> CsResult<usize> {
        if name.is_empty() {
            return Ok(0);
        }
        zones
            .iter()
            .find(|z| z.name == name)
            .map(|z| z.id)
            .ok_or_else(|| CsError::unknown_zone(kind, name))
    }

    /// 体区域
    pub fn volume_zone(&self, id: usize) -> Option<&Zone> {
        self.volume.get(id)
    }

    /// 边界区域
    pub fn boundary_zone(&self, id: usize) -> Option<&Zone> {
        self.boundary.get(id)
    }

    /// 全部体区域
    pub fn volume_zones(&self) -> &[Zone] {
        &self.volume
    }

    /// 全部边界区域
    pub fn boundary_zones(&self) -> &[Zone] {
        &self.boundary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::BoxMeshGenerator;

    fn setup() -> (ZoneRegistry, MeshQuantities, BoxMeshGenerator) {
        let gen = BoxMeshGenerator::cube(2, 1.0);
        let mesh = gen.build();
        let quant = mesh.compute_quantities();
        (ZoneRegistry::new(&mesh, &quant), quant, gen)
    }

    #[test]
    fn test_default_zones() {
        let (zones, _, _) = setup();
        assert_eq!(zones.volume_zone_id("").unwrap(), 0);
        assert_eq!(zones.volume_zone_id("cells").unwrap(), 0);
        assert_eq!(zones.volume_zone(0).unwrap().elt_ids.len(), 8);
        assert_eq!(zones.boundary_zone(0).unwrap().elt_ids.len(), 24);
    }

    #[test]
    fn test_box_zone() {
        let (mut zones, quant, _) = setup();
        let id = zones
            .add_volume_zone_by_box("left", DVec3::splat(-1.0), DVec3::new(0.5, 2.0, 2.0), &quant)
            .unwrap();
        assert_eq!(id, 1);
        assert_eq!(zones.volume_zone(id).unwrap().elt_ids.len(), 4);
        assert_eq!(zones.volume_zone_id("left").unwrap(), 1);
    }

    #[test]
    fn test_unknown_and_duplicate() {
        let (mut zones, _, gen) = setup();
        assert!(zones.volume_zone_id("nowhere").is_err());
        gen.register_boundary_zones(&mut zones).unwrap();
        assert_eq!(zones.boundary_zone_id("zmax").unwrap(), 6);
        assert!(zones.add_boundary_zone("xmin", vec![0]).is_err());
    }
}
