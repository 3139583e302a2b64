// crates/cs_cdo/src/source_term/face.rs

//! 面型格式（Fb / HHO-P0）的源项核函数
//!
//! 局部向量先排面自由度再排单元自由度；源项只作用于单元部分，即标量位于
//! `out[n_fc]`，矢量位于 `out[3·n_fc..3·n_fc + 3]`。

use crate::hodge::CellBuilder;
use crate::xdef::{XDef, XDefInput};
use cs_mesh::CellMesh;

/// 常值标量密度
pub fn pcsd_by_value(def: &XDef, cm: &CellMesh, out: &mut [f64]) {
    let Some(val) = def.values() else { return };
    out[cm.n_fc()] += val[0] * cm.vol_c;
}

/// 在单元形心处求值的标量密度
pub fn pcsd_bary_by_analytic(def: &XDef, cm: &CellMesh, time: f64, out: &mut [f64]) {
    let Some(func) = def.analytic() else { return };
    let mut r = [0.0];
    func.eval_at(time, cm.xc, &mut r);
    out[cm.n_fc()] += cm.vol_c * r[0];
}

/// 逐单元数组给出的标量密度
pub fn pcsd_by_array(def: &XDef, cm: &CellMesh, out: &mut [f64]) {
    let XDefInput::Array { stride, values, .. } = &def.input else { return };
    out[cm.n_fc()] += values[cm.c_id * stride] * cm.vol_c;
}

/// 自由度函数在本单元上给出的标量密度
pub fn pcsd_by_dof_func(def: &XDef, cm: &CellMesh, _cb: &mut CellBuilder, out: &mut [f64]) {
    let XDefInput::DofFunc { func, .. } = &def.input else { return };
    let mut r = [0.0];
    func.call(&[cm.c_id], true, &mut r);
    out[cm.n_fc()] += r[0] * cm.vol_c;
}

/// 常值矢量密度
pub fn pcvd_by_value(def: &XDef, cm: &CellMesh, out: &mut [f64]) {
    let Some(val) = def.values() else { return };
    let shift = 3 * cm.n_fc();
    for k in 0..3 {
        out[shift + k] += val[k] * cm.vol_c;
    }
}

/// 在单元形心处求值的矢量密度
pub fn pcvd_bary_by_analytic(def: &XDef, cm: &CellMesh, time: f64, out: &mut [f64]) {
    let Some(func) = def.analytic() else { return };
    let mut r = [0.0; 3];
    func.eval_at(time, cm.xc, &mut r);
    let shift = 3 * cm.n_fc();
    for k in 0..3 {
        out[shift + k] += cm.vol_c * r[k];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xdef::{AnalyticFunc, DofFunc};
    use cs_foundation::flag::{self, state};
    use cs_mesh::{BoxMeshGenerator, CellMeshFlag};
    use glam::DVec3;

    fn cell(c_id: usize) -> CellMesh {
        let mesh = BoxMeshGenerator::cube(2, 2.0).build();
        let quant = mesh.compute_quantities();
        let mut cm = CellMesh::default();
        cm.build(&mesh, &quant, c_id, CellMeshFlag::PFQ);
        cm
    }

    #[test]
    fn test_scalar_cell_slot() {
        let cm = cell(0);
        assert_eq!(cm.n_fc(), 6);
        let def = XDef::volume(1, 0, state::DENSITY, flag::PRIMAL_CELL, XDefInput::Value(vec![2.0]));
        let mut out = vec![0.0; 7];
        pcsd_by_value(&def, &cm, &mut out);
        assert!(out[..6].iter().all(|&x| x == 0.0));
        assert!((out[6] - 2.0).abs() < 1e-12);

        // 单元 0 的形心为 (0.5, 0.5, 0.5)
        let def = XDef::volume(
            1,
            0,
            state::DENSITY,
            flag::PRIMAL_CELL,
            XDefInput::Analytic(AnalyticFunc::scalar(|_, x| x.x + x.y)),
        );
        pcsd_bary_by_analytic(&def, &cm, 0.0, &mut out);
        assert!((out[6] - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_array_and_dof_func() {
        let cm = cell(5);
        let def = XDef::volume(
            1,
            0,
            state::DENSITY | state::CELLWISE,
            flag::PRIMAL_CELL,
            XDefInput::Array {
                stride: 1,
                loc: flag::PRIMAL_CELL,
                values: (0..8).map(|c| c as f64).collect(),
            },
        );
        let mut out = vec![0.0; 7];
        pcsd_by_array(&def, &cm, &mut out);
        assert!((out[6] - 5.0).abs() < 1e-12);

        let def = XDef::volume(
            1,
            0,
            state::DENSITY,
            flag::PRIMAL_CELL,
            XDefInput::DofFunc {
                loc: flag::PRIMAL_CELL,
                func: DofFunc::new(|ids, _, out| out[0] = 10.0 * ids[0] as f64),
            },
        );
        let mut cb = CellBuilder::new();
        let mut out = vec![0.0; 7];
        pcsd_by_dof_func(&def, &cm, &mut cb, &mut out);
        assert!((out[6] - 50.0).abs() < 1e-12);
    }

    #[test]
    fn test_vector_cell_slot() {
        let cm = cell(0);
        let def = XDef::volume(
            3,
            0,
            state::DENSITY,
            flag::PRIMAL_CELL,
            XDefInput::Analytic(AnalyticFunc::vector(|_, x| DVec3::new(x.x, 2.0, -x.z))),
        );
        let mut out = vec![0.0; 21];
        pcvd_bary_by_analytic(&def, &cm, 0.0, &mut out);
        for (a, b) in out[18..].iter().zip([0.5, 2.0, -0.5]) {
            assert!((a - b).abs() < 1e-12);
        }

        let def = XDef::volume(3, 0, state::DENSITY, flag::PRIMAL_CELL, XDefInput::Value(vec![1.0, 0.0, 3.0]));
        pcvd_by_value(&def, &cm, &mut out);
        for (a, b) in out[18..].iter().zip([1.5, 2.0, 2.5]) {
            assert!((a - b).abs() < 1e-12);
        }
    }
}
