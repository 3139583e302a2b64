// crates/cs_cdo/src/source_term/evaluate.rs

//! 全局求值
//!
//! 把常值或解析定义在整个网格（或定义所在区域）上求值：
//!
//! - 密度：在对偶单元或主网格单元上积分，复用对偶单元核函数，
//!   主网格单元的积分即局部贡献之和；
//! - 势：在顶点或单元形心处直接求值。

use super::SourceKernel;
use crate::hodge::CellBuilder;
use crate::xdef::{XDef, XDefKind};
use cs_foundation::flag;
use cs_foundation::{CsError, CsResult, Flag};
use cs_mesh::{CellMesh, CellMeshFlag, MeshQuantities, PolyMesh, QuadratureType, ZoneRegistry};
use rayon::prelude::*;

/// 结果的空间位置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Vertices,
    Cells,
}

fn target(func: &str, loc: Flag) -> CsResult<Target> {
    if loc.contains(flag::DUAL_CELL) || loc.contains(flag::PRIMAL_VTX) {
        Ok(Target::Vertices)
    } else if loc.contains(flag::PRIMAL_CELL) {
        Ok(Target::Cells)
    } else {
        Err(CsError::invalid_definition(func, format!("不支持的求值位置 {}", loc)))
    }
}

fn zone_cells<'a>(def: &XDef, zones: &'a ZoneRegistry) -> CsResult<&'a [usize]> {
    zones
        .volume_zone(def.z_id)
        .map(|z| z.elt_ids.as_slice())
        .ok_or_else(|| CsError::unknown_zone("volume", def.z_id.to_string()))
}

/// 密度积分
///
/// `loc` 为对偶单元或主网格顶点时返回 `n_vertices` 个值，为主网格单元时
/// 返回 `n_cells` 个值。区域外的元素为 0。
pub fn compute_from_density(
    loc: Flag,
    def: &XDef,
    mesh: &PolyMesh,
    quant: &MeshQuantities,
    zones: &ZoneRegistry,
    time: f64,
) -> CsResult<Vec<f64>> {
    const FUNC: &str = "compute_from_density";
    let target = target(FUNC, loc)?;
    if def.dim != 1 {
        return Err(CsError::unsupported(format!("dim = {} 的密度求值", def.dim)));
    }

    let kernel = match (def.kind(), def.qtype) {
        (XDefKind::Value, _) => SourceKernel::DcsdByValue,
        (XDefKind::Analytic, QuadratureType::Bary) => SourceKernel::DcsdBaryByAnalytic,
        (XDefKind::Analytic, QuadratureType::BarySubdiv) => SourceKernel::DcsdQ1o1ByAnalytic,
        (XDefKind::Analytic, QuadratureType::Higher) => SourceKernel::DcsdQ10o2ByAnalytic,
        (XDefKind::Analytic, QuadratureType::Highest) => SourceKernel::DcsdQ5o3ByAnalytic,
        (kind, qtype) => {
            return Err(CsError::invalid_definition(
                FUNC,
                format!("不支持 {} 定义 (求积: {})", kind, qtype),
            ))
        }
    };

    let cells = zone_cells(def, zones)?;
    let cm_flag = kernel.cell_mesh_flag() | CellMeshFlag::PV;
    let local: Vec<(usize, Vec<usize>, Vec<f64>)> = cells
        .par_iter()
        .map_init(
            || (CellMesh::default(), CellBuilder::new()),
            |(cm, cb), &c_id| {
                cm.build(mesh, quant, c_id, cm_flag);
                let mut out = vec![0.0; cm.n_vc()];
                kernel.compute(def, cm, time, cb, &mut out);
                (c_id, cm.v_ids.clone(), out)
            },
        )
        .collect();

    let values = match target {
        Target::Vertices => {
            let mut values = vec![0.0; mesh.n_vertices()];
            for (_, v_ids, out) in &local {
                for (&v_id, x) in v_ids.iter().zip(out) {
                    values[v_id] += x;
                }
            }
            values
        }
        Target::Cells => {
            let mut values = vec![0.0; mesh.n_cells()];
            for (c_id, _, out) in &local {
                values[*c_id] = out.iter().sum();
            }
            values
        }
    };
    Ok(values)
}

/// 势求值
///
/// 顶点位置在顶点坐标处求值，单元位置在单元形心处求值；每个元素 `dim`
/// 个分量。区域外的元素为 0。
pub fn compute_from_potential(
    loc: Flag,
    def: &XDef,
    mesh: &PolyMesh,
    quant: &MeshQuantities,
    zones: &ZoneRegistry,
    time: f64,
) -> CsResult<Vec<f64>> {
    const FUNC: &str = "compute_from_potential";
    let target = target(FUNC, loc)?;
    let dim = def.dim;
    let cells = zone_cells(def, zones)?;

    let (coords, ids): (&[_], Vec<usize>) = match target {
        Target::Cells => (quant.cell_centers.as_slice(), cells.to_vec()),
        Target::Vertices => {
            let mut marked = vec![false; mesh.n_vertices()];
            for &c_id in cells {
                for &f in mesh.cell_faces(c_id) {
                    for &v in mesh.face_vertices(f) {
                        marked[v] = true;
                    }
                }
            }
            let ids = marked.iter().enumerate().filter(|&(_, &m)| m).map(|(v, _)| v).collect();
            (mesh.vertices(), ids)
        }
    };

    let mut values = vec![0.0; coords.len() * dim];
    match def.kind() {
        XDefKind::Value => {
            let val = def.values().unwrap_or_default();
            XDef::check_value(FUNC, dim, val)?;
            for &id in &ids {
                values[id * dim..(id + 1) * dim].copy_from_slice(val);
            }
        }
        XDefKind::Analytic => {
            if let Some(func) = def.analytic() {
                func.call(time, Some(ids.as_slice()), coords, false, &mut values);
            }
        }
        kind => {
            return Err(CsError::invalid_definition(FUNC, format!("不支持 {} 定义", kind)));
        }
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xdef::{AnalyticFunc, XDefInput};
    use cs_foundation::flag::state;
    use cs_mesh::BoxMeshGenerator;

    fn setup() -> (PolyMesh, MeshQuantities, ZoneRegistry) {
        let mesh = BoxMeshGenerator::cube(2, 1.0).build();
        let quant = mesh.compute_quantities();
        let zones = ZoneRegistry::new(&mesh, &quant);
        (mesh, quant, zones)
    }

    #[test]
    fn test_density_by_value() {
        let (mesh, quant, zones) = setup();
        let def = XDef::volume(1, 0, state::DENSITY, flag::FULL_LOC, XDefInput::Value(vec![2.0]));

        let dual = compute_from_density(flag::DUAL_CELL, &def, &mesh, &quant, &zones, 0.0).unwrap();
        assert_eq!(dual.len(), 27);
        for (d, vol) in dual.iter().zip(&quant.dual_volumes) {
            assert!((d - 2.0 * vol).abs() < 1e-12);
        }

        let cells = compute_from_density(flag::PRIMAL_CELL, &def, &mesh, &quant, &zones, 0.0).unwrap();
        assert_eq!(cells.len(), 8);
        assert!(cells.iter().all(|c| (c - 0.25).abs() < 1e-12));
    }

    #[test]
    fn test_density_quadratic_higher() {
        let (mesh, quant, zones) = setup();
        let mut def = XDef::volume(
            1,
            0,
            state::DENSITY,
            flag::FULL_LOC,
            XDefInput::Analytic(AnalyticFunc::scalar(|_, x| x.x * x.x)),
        );
        def.set_quadrature(QuadratureType::Higher);
        let cells = compute_from_density(flag::PRIMAL_CELL, &def, &mesh, &quant, &zones, 0.0).unwrap();
        let total: f64 = cells.iter().sum();
        assert!((total - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_potential_in_zone() {
        let (mesh, quant, mut zones) = setup();
        let z = zones.add_volume_zone("first", vec![0]).unwrap();
        let def = XDef::volume(
            1,
            z,
            state::DENSITY,
            Flag::EMPTY,
            XDefInput::Analytic(AnalyticFunc::scalar(|t, x| t + x.x + x.y + x.z)),
        );
        let vtx = compute_from_potential(flag::PRIMAL_VTX, &def, &mesh, &quant, &zones, 1.0).unwrap();
        // 单元 0 的 8 个顶点
        let touched: Vec<usize> = (0..27).filter(|&v| vtx[v] != 0.0).collect();
        assert_eq!(touched.len(), 8);
        for &v in &touched {
            let x = mesh.vertices()[v];
            assert!((vtx[v] - (1.0 + x.x + x.y + x.z)).abs() < 1e-12);
        }

        let cells = compute_from_potential(flag::PRIMAL_CELL, &def, &mesh, &quant, &zones, 0.0).unwrap();
        assert!((cells[0] - 0.75).abs() < 1e-12);
        assert!(cells[1..].iter().all(|&c| c == 0.0));
    }

    #[test]
    fn test_invalid_location() {
        let (mesh, quant, zones) = setup();
        let def = XDef::volume(1, 0, state::DENSITY, flag::FULL_LOC, XDefInput::Value(vec![1.0]));
        assert!(compute_from_density(flag::PRIMAL_FACE, &def, &mesh, &quant, &zones, 0.0).is_err());
        assert!(compute_from_potential(flag::PRIMAL_EDGE, &def, &mesh, &quant, &zones, 0.0).is_err());
        let qov = XDef::volume(1, 0, state::DENSITY, flag::FULL_LOC, XDefInput::Qov(1.0));
        assert!(compute_from_density(flag::PRIMAL_CELL, &qov, &mesh, &quant, &zones, 0.0).is_err());
    }
}
