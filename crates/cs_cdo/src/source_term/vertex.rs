// crates/cs_cdo/src/source_term/vertex.rs

//! 顶点型格式的源项核函数
//!
//! 对偶单元密度（dcsd）：把源项密度在 `p_v ∩ c` 上积分，得到每个局部顶点的
//! 贡献。`p_v ∩ c` 被剖分为子四面体 `(x_v, x_e, x_f, x_c)`，每个的体积为
//! `tef·hfc/6`。
//!
//! 主网格势（pvsp / vcsp）：先在顶点（及单元）上求势，再乘以局部 Hodge。
//!
//! 所有核函数都把结果累加到 `out`，不清零。

use crate::hodge::CellBuilder;
use crate::xdef::{AnalyticFunc, XDef, XDefInput};
use cs_foundation::flag;
use cs_mesh::quadrature::{tet_5pts, tet_volume, Q10_EDGE_WEIGHT, Q10_VERTEX_WEIGHT};
use cs_mesh::CellMesh;
use glam::DVec3;

#[inline]
fn eval1(func: &AnalyticFunc, time: f64, x: DVec3) -> f64 {
    let mut r = [0.0];
    func.eval_at(time, x, &mut r);
    r[0]
}

// ============================================================================
// 对偶单元密度
// ============================================================================

/// 常值密度：`out[v] += s·wvc·|c|`
pub fn dcsd_by_value(def: &XDef, cm: &CellMesh, out: &mut [f64]) {
    let Some(val) = def.values() else { return };
    let s = val[0];
    for v in 0..cm.n_vc() {
        out[v] += s * cm.wvc[v] * cm.vol_c;
    }
}

/// 在 `p_v ∩ c` 的重心处求值，乘以其体积
pub fn dcsd_bary_by_analytic(def: &XDef, cm: &CellMesh, time: f64, cb: &mut CellBuilder, out: &mut [f64]) {
    let Some(func) = def.analytic() else { return };
    let n_vc = cm.n_vc();
    let CellBuilder { values, vectors, .. } = cb;

    vectors.clear();
    vectors.resize(n_vc, DVec3::ZERO);
    for f in 0..cm.n_fc() {
        let hf_coef = cm.hfc[f] / 6.0;
        let xfc = 0.25 * (cm.xf[f] + cm.xc);
        for i in cm.face_edge_range(f) {
            let [v1, v2] = cm.e2v[cm.f2e_ids[i]];
            let tet_vol = cm.tef[i] * hf_coef;
            let (x1, x2) = (cm.xv[v1], cm.xv[v2]);
            vectors[v1] += tet_vol * (xfc + 0.375 * x1 + 0.125 * x2);
            vectors[v2] += tet_vol * (xfc + 0.375 * x2 + 0.125 * x1);
        }
    }
    for (xg, &w) in vectors.iter_mut().zip(&cm.wvc) {
        *xg /= cm.vol_c * w;
    }

    values.clear();
    values.resize(n_vc, 0.0);
    func.eval(time, vectors, values);
    for v in 0..n_vc {
        out[v] += cm.vol_c * cm.wvc[v] * values[v];
    }
}

/// 子四面体重心一点公式（对线性函数精确）
pub fn dcsd_q1o1_by_analytic(def: &XDef, cm: &CellMesh, time: f64, _cb: &mut CellBuilder, out: &mut [f64]) {
    let Some(func) = def.analytic() else { return };
    for f in 0..cm.n_fc() {
        let hf_coef = cm.hfc[f] / 6.0;
        let xfc = 0.25 * (cm.xf[f] + cm.xc);
        for i in cm.face_edge_range(f) {
            let [v1, v2] = cm.e2v[cm.f2e_ids[i]];
            let half_pef = cm.tef[i] * hf_coef;
            let (x1, x2) = (cm.xv[v1], cm.xv[v2]);
            let xg = [xfc + 0.375 * x1 + 0.125 * x2, xfc + 0.375 * x2 + 0.125 * x1];
            let mut r = [0.0; 2];
            func.eval(time, &xg, &mut r);
            out[v1] += half_pef * r[0];
            out[v2] += half_pef * r[1];
        }
    }
}

/// 10 点公式（对二次函数精确）
///
/// 每个子四面体 `(v, e, f, c)` 上：顶点权重 -1/20，棱中点权重 1/5。
/// 与单元、顶点、边相关的求值在单元层面合并，避免重复计算。
pub fn dcsd_q10o2_by_analytic(def: &XDef, cm: &CellMesh, time: f64, cb: &mut CellBuilder, out: &mut [f64]) {
    let Some(func) = def.analytic() else { return };
    let n_vc = cm.n_vc();
    let n_ec = cm.n_ec();
    let CellBuilder { values, vectors, .. } = cb;

    // 点的排列：xc | xv | (xc+xv)/2 | xe | (xc+xe)/2 | (xv1+xe)/2 (xv2+xe)/2
    let off_v = 1;
    let off_vc = off_v + n_vc;
    let off_e = off_vc + n_vc;
    let off_ec = off_e + n_ec;
    let off_ve = off_ec + n_ec;
    let n_pts = off_ve + 2 * n_ec;

    vectors.clear();
    vectors.push(cm.xc);
    vectors.extend_from_slice(&cm.xv);
    vectors.extend(cm.xv.iter().map(|&x| 0.5 * (cm.xc + x)));
    vectors.extend_from_slice(&cm.xe);
    vectors.extend(cm.xe.iter().map(|&x| 0.5 * (cm.xc + x)));
    for (e, [v1, v2]) in cm.e2v.iter().enumerate() {
        vectors.push(0.5 * (cm.xv[*v1] + cm.xe[e]));
        vectors.push(0.5 * (cm.xv[*v2] + cm.xe[e]));
    }
    debug_assert_eq!(vectors.len(), n_pts);

    values.clear();
    values.resize(n_pts, 0.0);
    func.eval(time, vectors, values);

    let eval_c = values[0];
    for v in 0..n_vc {
        let vol_vc = cm.wvc[v] * cm.vol_c;
        out[v] += vol_vc * (Q10_VERTEX_WEIGHT * (eval_c + values[off_v + v]) + Q10_EDGE_WEIGHT * values[off_vc + v]);
    }

    let mut pvf_vol = vec![0.0; n_vc];
    for f in 0..cm.n_fc() {
        let xf = cm.xf[f];
        let hf_coef = cm.hfc[f] / 6.0;
        pvf_vol.iter_mut().for_each(|x| *x = 0.0);

        for i in cm.face_edge_range(f) {
            let e = cm.f2e_ids[i];
            let [v1, v2] = cm.e2v[e];
            let half_pef = cm.tef[i] * hf_coef;
            pvf_vol[v1] += half_pef;
            pvf_vol[v2] += half_pef;

            let eval_ef = eval1(func, time, 0.5 * (cm.xe[e] + xf));
            let common = Q10_EDGE_WEIGHT * (eval_ef + values[off_ec + e]) + Q10_VERTEX_WEIGHT * values[off_e + e];
            out[v1] += half_pef * (common + Q10_EDGE_WEIGHT * values[off_ve + 2 * e]);
            out[v2] += half_pef * (common + Q10_EDGE_WEIGHT * values[off_ve + 2 * e + 1]);
        }

        let eval_f = eval1(func, time, xf);
        let eval_fc = eval1(func, time, 0.5 * (xf + cm.xc));
        for v in 0..n_vc {
            if pvf_vol[v] > 0.0 {
                let eval_vf = eval1(func, time, 0.5 * (xf + cm.xv[v]));
                out[v] += pvf_vol[v]
                    * (Q10_VERTEX_WEIGHT * eval_f + Q10_EDGE_WEIGHT * (eval_fc + eval_vf));
            }
        }
    }
}

/// 每个子四面体上的 5 点 Gauss 公式（对三次函数精确）
pub fn dcsd_q5o3_by_analytic(def: &XDef, cm: &CellMesh, time: f64, _cb: &mut CellBuilder, out: &mut [f64]) {
    let Some(func) = def.analytic() else { return };
    let mut r = [0.0; 5];
    for f in 0..cm.n_fc() {
        let xf = cm.xf[f];
        for i in cm.face_edge_range(f) {
            let e = cm.f2e_ids[i];
            let xe = cm.xe[e];
            for v in cm.e2v[e] {
                let xv = cm.xv[v];
                let vol = tet_volume(xv, xe, xf, cm.xc);
                let (pts, w) = tet_5pts(xv, xe, xf, cm.xc, vol);
                func.eval(time, &pts, &mut r);
                out[v] += r.iter().zip(w).map(|(a, b)| a * b).sum::<f64>();
            }
        }
    }
}

/// 数组给出的密度，位于主网格单元或逐顶点（对偶单元/主网格顶点）
pub fn dcsd_by_array(def: &XDef, cm: &CellMesh, out: &mut [f64]) {
    let XDefInput::Array { stride, loc, values } = &def.input else { return };
    if loc.contains(flag::PRIMAL_CELL) {
        let s = values[cm.c_id * stride];
        for v in 0..cm.n_vc() {
            out[v] += s * cm.wvc[v] * cm.vol_c;
        }
    } else {
        for (v, &v_id) in cm.v_ids.iter().enumerate() {
            out[v] += values[v_id * stride] * cm.wvc[v] * cm.vol_c;
        }
    }
}

/// 自由度函数给出的密度
pub fn dcsd_by_dof_func(def: &XDef, cm: &CellMesh, cb: &mut CellBuilder, out: &mut [f64]) {
    let XDefInput::DofFunc { loc, func } = &def.input else { return };
    if loc.contains(flag::PRIMAL_CELL) {
        let mut r = [0.0];
        func.call(&[cm.c_id], true, &mut r);
        for v in 0..cm.n_vc() {
            out[v] += r[0] * cm.wvc[v] * cm.vol_c;
        }
    } else {
        let values = &mut cb.values;
        values.clear();
        values.resize(cm.n_vc(), 0.0);
        func.call(&cm.v_ids, true, values);
        for v in 0..cm.n_vc() {
            out[v] += values[v] * cm.wvc[v] * cm.vol_c;
        }
    }
}

// ============================================================================
// 主网格势
// ============================================================================

/// 势乘以局部 Hodge 后累加；`fill` 写入前 `n` 个势值
fn reduce_potential<F>(cb: &mut CellBuilder, n: usize, out: &mut [f64], fill: F)
where
    F: FnOnce(&mut [f64]),
{
    debug_assert!(cb.hdg.is_some(), "局部 Hodge 未构建");
    let CellBuilder { values, hdg, .. } = cb;
    let Some(hdg) = hdg.as_ref() else { return };
    debug_assert_eq!(hdg.n(), n);

    values.clear();
    values.resize(2 * n, 0.0);
    let (eval, hdg_eval) = values.split_at_mut(n);
    fill(eval);
    hdg.matvec(eval, hdg_eval);
    for (o, x) in out.iter_mut().zip(hdg_eval.iter()) {
        *o += x;
    }
}

/// 顶点上的常值势
pub fn pvsp_by_value(def: &XDef, cm: &CellMesh, cb: &mut CellBuilder, out: &mut [f64]) {
    let Some(val) = def.values() else { return };
    let s = val[0];
    reduce_potential(cb, cm.n_vc(), out, |eval| eval.fill(s));
}

/// 顶点上求值的解析势
pub fn pvsp_by_analytic(def: &XDef, cm: &CellMesh, time: f64, cb: &mut CellBuilder, out: &mut [f64]) {
    let Some(func) = def.analytic() else { return };
    reduce_potential(cb, cm.n_vc(), out, |eval| func.eval(time, &cm.xv, eval));
}

/// 顶点与单元上的常值势
pub fn vcsp_by_value(def: &XDef, cm: &CellMesh, cb: &mut CellBuilder, out: &mut [f64]) {
    let Some(val) = def.values() else { return };
    let s = val[0];
    reduce_potential(cb, cm.n_vc() + 1, out, |eval| eval.fill(s));
}

/// 顶点与单元形心上求值的解析势
pub fn vcsp_by_analytic(def: &XDef, cm: &CellMesh, time: f64, cb: &mut CellBuilder, out: &mut [f64]) {
    let Some(func) = def.analytic() else { return };
    let n_vc = cm.n_vc();
    reduce_potential(cb, n_vc + 1, out, |eval| {
        func.eval(time, &cm.xv, &mut eval[..n_vc]);
        eval[n_vc] = eval1(func, time, cm.xc);
    });
}
