// crates/cs_cdo/tests/source_term_assembly.rs

//! 源项组装的精度与区域限制
//!
//! # 测试覆盖
//!
//! - 常值、线性、二次源项的全局积分
//! - Vb / VCb / Fb 三种格式的守恒
//! - 子区域源项只作用于区域内单元
//! - 主网格顶点约化与对偶单元约化的总量一致

use cs_cdo::equation_param::EquationParam;
use cs_cdo::param::{BcType, EquationType, SpaceScheme};
use cs_cdo::source_term::{evaluate, SourceTermSetup};
use cs_cdo::xdef::AnalyticFunc;
use cs_foundation::flag;
use cs_mesh::{BoxMeshGenerator, MeshQuantities, PolyMesh, QuadratureType, ZoneRegistry};
use glam::DVec3;

// ============================================================================
// 测试辅助函数
// ============================================================================

struct Fixture {
    mesh: PolyMesh,
    quant: MeshQuantities,
    zones: ZoneRegistry,
}

fn fixture(n: usize) -> Fixture {
    let mesh = BoxMeshGenerator::cube(n, 1.0).build();
    let quant = mesh.compute_quantities();
    let mut zones = ZoneRegistry::new(&mesh, &quant);
    zones
        .add_volume_zone_by_box("left", DVec3::ZERO, DVec3::new(0.5, 1.0, 1.0), &quant)
        .unwrap();
    Fixture { mesh, quant, zones }
}

fn equation(scheme: &str) -> EquationParam {
    let mut eqp = EquationParam::new("Scalar", EquationType::User, 1, BcType::HmgDirichlet);
    eqp.set_param_str("space_scheme", scheme).unwrap();
    eqp
}

fn assemble(fx: &Fixture, eqp: &mut EquationParam, time: f64) -> Vec<f64> {
    eqp.last_stage().unwrap();
    let st = SourceTermSetup::init(eqp.space_scheme(), eqp.source_terms(), &fx.zones).unwrap();
    st.assemble(eqp.source_terms(), &fx.mesh, &fx.quant, time).unwrap()
}

fn total(v: &[f64]) -> f64 {
    v.iter().sum()
}

// ============================================================================
// 全局积分
// ============================================================================

#[test]
fn test_constant_density_all_schemes() {
    let fx = fixture(3);
    for scheme in ["cdo_vb", "cdo_vcb", "cdo_fb"] {
        let mut eqp = equation(scheme);
        eqp.add_source_term_by_val(&fx.zones, "", &[3.0]).unwrap();
        let rhs = assemble(&fx, &mut eqp, 0.0);
        assert!(
            (total(&rhs) - 3.0).abs() < 1e-10,
            "{}: total = {}",
            scheme,
            total(&rhs)
        );
    }
}

#[test]
fn test_linear_analytic_is_exact() {
    let fx = fixture(3);
    for q in ["bary", "bary_subdiv", "higher", "highest"] {
        let mut eqp = equation("cdo_vb");
        let f = AnalyticFunc::scalar(|_, x| 1.0 + x.x + 2.0 * x.y);
        let id = eqp.add_source_term_by_analytic(&fx.zones, "", f).unwrap();
        eqp.set_source_term_quadrature(id, QuadratureType::from_keyword(q).unwrap())
            .unwrap();
        let rhs = assemble(&fx, &mut eqp, 0.0);
        // ∫(1 + x + 2y) = 1 + 1/2 + 1
        assert!((total(&rhs) - 2.5).abs() < 1e-10, "{}: total = {}", q, total(&rhs));
    }
}

#[test]
fn test_quadratic_needs_higher_quadrature() {
    let fx = fixture(2);
    let integral = |q: QuadratureType| {
        let mut eqp = equation("cdo_vb");
        let f = AnalyticFunc::scalar(|_, x| x.length_squared());
        let id = eqp.add_source_term_by_analytic(&fx.zones, "", f).unwrap();
        eqp.set_source_term_quadrature(id, q).unwrap();
        total(&assemble(&fx, &mut eqp, 0.0))
    };
    // ∫|x|² over the unit cube = 1
    assert!((integral(QuadratureType::Higher) - 1.0).abs() < 1e-10);
    assert!((integral(QuadratureType::Highest) - 1.0).abs() < 1e-10);
    assert!((integral(QuadratureType::Bary) - 1.0).abs() > 1e-6);
}

#[test]
fn test_time_dependent_source() {
    let fx = fixture(2);
    let mut eqp = equation("cdo_fb");
    eqp.add_source_term_by_analytic(&fx.zones, "", AnalyticFunc::scalar(|t, _| 2.0 * t))
        .unwrap();
    let rhs = assemble(&fx, &mut eqp, 1.5);
    assert!((total(&rhs) - 3.0).abs() < 1e-12);
    assert_eq!(rhs.len(), 8);
}

// ============================================================================
// 区域与约化
// ============================================================================

#[test]
fn test_zone_restriction() {
    let fx = fixture(2);
    let mut eqp = equation("cdo_vb");
    eqp.add_source_term_by_val(&fx.zones, "left", &[1.0]).unwrap();
    let rhs = assemble(&fx, &mut eqp, 0.0);

    assert!((total(&rhs) - 0.5).abs() < 1e-12);
    for (v, x) in fx.mesh.vertices().iter().enumerate() {
        if x.x > 0.75 {
            assert_eq!(rhs[v], 0.0, "vertex {} at {:?}", v, x);
        }
    }
}

#[test]
fn test_overlapping_terms_add_up() {
    let fx = fixture(2);
    let mut eqp = equation("cdo_vcb");
    eqp.add_source_term_by_val(&fx.zones, "", &[1.0]).unwrap();
    eqp.add_source_term_by_val(&fx.zones, "left", &[2.0]).unwrap();
    let rhs = assemble(&fx, &mut eqp, 0.0);
    assert!((total(&rhs) - 2.0).abs() < 1e-12);
}

#[test]
fn test_primal_reduction_keeps_total() {
    let fx = fixture(2);

    let mut dual = equation("cdo_vb");
    dual.add_source_term_by_val(&fx.zones, "", &[4.0]).unwrap();
    let rhs_dual = assemble(&fx, &mut dual, 0.0);

    let mut primal = equation("cdo_vb");
    let id = primal.add_source_term_by_val(&fx.zones, "", &[4.0]).unwrap();
    primal.set_source_term_reduction(id, flag::PRIMAL_VTX).unwrap();
    let rhs_primal = assemble(&fx, &mut primal, 0.0);

    assert!((total(&rhs_primal) - total(&rhs_dual)).abs() < 1e-10);
}

#[test]
fn test_density_evaluation_matches_assembly() {
    let fx = fixture(2);
    let mut eqp = equation("cdo_vb");
    eqp.add_source_term_by_analytic(&fx.zones, "", AnalyticFunc::scalar(|_, x| x.z))
        .unwrap();
    let assembled = assemble(&fx, &mut eqp, 0.0);

    let def = &eqp.source_terms()[0];
    let dual = evaluate::compute_from_density(flag::DUAL_CELL, def, &fx.mesh, &fx.quant, &fx.zones, 0.0).unwrap();
    for (a, b) in assembled.iter().zip(&dual) {
        assert!((a - b).abs() < 1e-12);
    }

    let cells = evaluate::compute_from_density(flag::PRIMAL_CELL, def, &fx.mesh, &fx.quant, &fx.zones, 0.0).unwrap();
    assert_eq!(cells.len(), fx.mesh.n_cells());
    assert!((total(&cells) - 0.5).abs() < 1e-12);
}

#[test]
fn test_edge_scheme_rejects_source_terms() {
    let fx = fixture(1);
    let mut eqp = equation("cdo_eb");
    assert!(eqp.add_source_term_by_val(&fx.zones, "", &[1.0]).is_err());
    assert_eq!(eqp.space_scheme(), SpaceScheme::CdoEb);
}
