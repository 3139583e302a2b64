// crates/cs_cdo/src/equation_param/summary.rs

//! 设置摘要输出

use super::EquationParam;
use crate::param::{bc_flag, eq_flag, AdvectionScheme, BcEnforcement, EquationType, HodgeParam, TimeScheme};
use crate::property::Property;
use crate::sles_param::{IterativeSolver, Preconditioner, SolverClass};
use crate::xdef::XDef;
use cs_foundation::Flag;
use std::fmt::Write;
use std::sync::Arc;

fn yes_no(b: bool) -> &'static str {
    if b {
        "**True**"
    } else {
        "**False**"
    }
}

fn property_name(p: &Option<Arc<Property>>) -> &str {
    p.as_deref().map(Property::name).unwrap_or("NULL")
}

fn bc_desc(meta: Flag) -> &'static str {
    const TABLE: [(Flag, &str); 7] = [
        (bc_flag::HMG_DIRICHLET, "Homogeneous Dirichlet"),
        (bc_flag::DIRICHLET, "Dirichlet"),
        (bc_flag::HMG_NEUMANN, "Homogeneous Neumann"),
        (bc_flag::NEUMANN, "Neumann"),
        (bc_flag::ROBIN, "Robin"),
        (bc_flag::SLIDING, "Sliding"),
        (bc_flag::CIRCULATION, "Circulation"),
    ];
    TABLE
        .iter()
        .find(|(f, _)| meta.contains(*f))
        .map(|(_, d)| *d)
        .unwrap_or("Undefined")
}

fn write_hodge(s: &mut String, prefix: &str, h: &HodgeParam) {
    let _ = writeln!(s, "{}| Type: {}", prefix, h.kind);
    let _ = writeln!(s, "{}| Algo: {}", prefix, h.algo);
    let _ = writeln!(s, "{}| Algo.Coef: {:.3e}", prefix, h.coef);
    let _ = writeln!(
        s,
        "{}| Property inversion: {}",
        prefix,
        yes_no(h.inv_pty)
    );
}

fn write_defs(s: &mut String, defs: &[XDef]) {
    for (i, d) in defs.iter().enumerate() {
        let _ = writeln!(s, "        Definition {:4} | {}", i, d.describe());
    }
}

impl EquationParam {
    /// 生成设置摘要
    pub fn summary(&self) -> String {
        let mut s = String::new();
        let eq = self.name.as_str();

        // 总体设置
        let _ = writeln!(s, "\n### {}: High-level settings", eq);
        let ty = match self.eq_type {
            EquationType::Groundwater => "Associated to groundwater flows",
            EquationType::Maxwell => "Associated to the Maxwell module",
            EquationType::Thermal => "Associated to the thermal module",
            EquationType::Navsto => "Associated to the Navier-Stokes system",
            EquationType::Predefined => "Predefined",
            EquationType::User => "User-defined",
        };
        let _ = writeln!(s, "  * {} | Type: {}", eq, ty);

        let has = |f: Flag| self.flag.contains(f);
        let _ = writeln!(
            s,
            "  * {} | Terms: unsteady:{}, convection:{}, diffusion:{}",
            eq,
            yes_no(has(eq_flag::UNSTEADY)),
            yes_no(has(eq_flag::CONVECTION)),
            yes_no(has(eq_flag::DIFFUSION))
        );
        let _ = writeln!(
            s,
            "  * {} | Terms: curl-curl:{}, grad-div:{}",
            eq,
            yes_no(has(eq_flag::CURLCURL)),
            yes_no(has(eq_flag::GRADDIV))
        );
        let _ = writeln!(
            s,
            "  * {} | Terms: reaction:{}, source term:{}, force internal values: {}",
            eq,
            yes_no(has(eq_flag::REACTION)),
            yes_no(!self.source_terms.is_empty()),
            yes_no(has(eq_flag::FORCE_VALUES))
        );
        let _ = writeln!(s, "  * {} | Space scheme:       {}", eq, self.space_scheme);
        let _ = writeln!(s, "  * {} | Space poly degree:  {}", eq, self.space_poly_degree);
        let _ = writeln!(s, "  * {} | Verbosity:          {}", eq, self.verbosity);
        if rayon::current_num_threads() > 1 {
            let _ = writeln!(s, "  * {} | OpenMP.Assembly.Choice:  {}", eq, self.assembly);
        }

        // 边界条件
        let _ = writeln!(s, "\n### {}: Boundary condition settings", eq);
        let _ = writeln!(s, "  * {} | Boundary conditions | Default: {}", eq, self.bc.default_bc);
        let _ = writeln!(s, "  * {} | Boundary conditions | Enforcement: {}", eq, self.bc.enforcement);
        match self.bc.enforcement {
            BcEnforcement::Penalized => {
                let _ = writeln!(
                    s,
                    "  * {} | Boundary conditions | Penalization coefficient: {:.3e}",
                    eq, self.bc.strong_pena_coeff
                );
            }
            BcEnforcement::WeakNitsche | BcEnforcement::WeakSym => {
                let _ = writeln!(
                    s,
                    "  * {} | Boundary conditions | Penalization coefficient: {:.3e}",
                    eq, self.bc.weak_pena_coeff
                );
            }
            BcEnforcement::Algebraic => {}
        }
        let _ = writeln!(
            s,
            "  * {} | Boundary conditions | Number of definitions: {}",
            eq,
            self.bc.defs.len()
        );
        if self.verbosity > 0 {
            for (i, d) in self.bc.defs.iter().enumerate() {
                let _ = writeln!(s, "        Definition {:4} | Type: {}", i, bc_desc(d.meta));
                let _ = writeln!(s, "        Definition {:4} | {}", i, d.describe());
            }
        }

        // 时间项
        if has(eq_flag::UNSTEADY) {
            let _ = writeln!(s, "\n### {}: Time settings", eq);
            let _ = writeln!(
                s,
                "  * {} | Initial conditions | Number of definitions: {}",
                eq,
                self.ic_defs.len()
            );
            write_defs(&mut s, &self.ic_defs);
            if self.time.scheme == TimeScheme::Theta {
                let _ = writeln!(s, "  * {} | Time scheme: {} with value {:.6}", eq, self.time.scheme, self.time.theta);
            } else {
                let _ = writeln!(s, "  * {} | Time scheme: {}", eq, self.time.scheme);
            }
            let _ = writeln!(s, "  * {} | Mass.Lumping: {}", eq, yes_no(self.time.do_lumping));
            let _ = writeln!(s, "  * {} | Time property: {}", eq, property_name(&self.time.property));
            write_hodge(&mut s, "        Time Hodge op. ", &self.time.hodge);
        }

        // 二阶项
        let second_order = [
            (eq_flag::DIFFUSION, "Diffusion", "Diffusion", &self.diffusion),
            (eq_flag::CURLCURL, "Curl-Curl", "Curl-curl", &self.curlcurl),
            (eq_flag::GRADDIV, "Grad-Div", "Grad-Div", &self.graddiv),
        ];
        for (f, title, hodge_label, term) in second_order {
            if !has(f) {
                continue;
            }
            let _ = writeln!(s, "\n### {}: {} term settings", eq, title);
            let _ = writeln!(s, "  * {} | {} property: {}", eq, title, property_name(&term.property));
            write_hodge(&mut s, &format!("        {} Hodge op. ", hodge_label), &term.hodge);
        }

        // 对流项
        if has(eq_flag::CONVECTION) {
            let adv = &self.advection;
            let _ = writeln!(s, "\n### {}: Advection term settings", eq);
            let field = adv.field.as_deref().map(|f| f.name()).unwrap_or("NULL");
            let _ = writeln!(s, "  * {} | Advection.Field: {}", eq, field);
            let _ = writeln!(s, "  * {} | Advection.Formulation: {}", eq, adv.formulation);
            if adv.scheme == AdvectionScheme::MixCenteredUpwind {
                let _ = writeln!(
                    s,
                    "  * {} | Advection.Scheme: centered-upwind ({:3.2} % of upwind)",
                    eq,
                    100.0 * adv.upwind_portion
                );
            } else {
                let _ = writeln!(s, "  * {} | Advection.Scheme: {}", eq, adv.scheme);
            }
        }

        // 反应项
        if has(eq_flag::REACTION) {
            let _ = writeln!(s, "\n### {}: Reaction settings", eq);
            let _ = writeln!(
                s,
                "  * {} | Reaction | Number of terms: {}",
                eq,
                self.reaction.properties.len()
            );
            write_hodge(&mut s, "        Reaction Hodge op. ", &self.reaction.hodge);
        }

        // 源项
        if !self.source_terms.is_empty() {
            let _ = writeln!(s, "\n### {}: Source term settings", eq);
            let _ = writeln!(
                s,
                "  * {} | Source terms | Number of terms: {}",
                eq,
                self.source_terms.len()
            );
            write_defs(&mut s, &self.source_terms);
        }

        // 线性代数
        let sles = &self.sles;
        let family = match sles.solver_class {
            SolverClass::Cs => "Code_Saturne",
            SolverClass::Petsc => "PETSc",
            SolverClass::Hypre => "HYPRE",
        };
        let _ = writeln!(s, "\n### {}: Linear algebra settings\n", eq);
        let _ = writeln!(s, "        SLES | Family:             {}", family);
        let _ = writeln!(s, "        SLES | Verbosity:          {}", sles.verbosity);
        let _ = writeln!(s, "        SLES | Field id:           {}", sles.field_id);
        let _ = writeln!(s, "        SLES | Solver.MaxIter:     {}", sles.n_max_iter);
        let _ = writeln!(s, "        SLES | Solver.Name:        {}", sles.solver);
        if sles.solver == IterativeSolver::Amg {
            let _ = writeln!(s, "        SLES | AMG.Type:           {}", sles.amg_type);
        }
        let _ = writeln!(s, "        SLES | Solver.Precond:     {}", sles.precond);
        if sles.precond == Preconditioner::Amg {
            let _ = writeln!(s, "        SLES | AMG.Type:           {}", sles.amg_type);
        }
        let _ = writeln!(s, "        SLES | Solver.Eps:         {:.6e}", sles.eps);
        let _ = writeln!(s, "        SLES | Solver.Normalized:  {}", sles.resnorm_type);

        s
    }

    /// 将设置摘要逐行写入日志（target = "setup"）
    pub fn log_summary(&self) {
        for line in self.summary().lines() {
            log::info!(target: "setup", "{}", line);
        }
    }
}
