// crates/af_physics/src/turbulence.rs

//! 湍流工作变量输运与源项闭合
//!
//! 一方程涡黏性输运（Spalart-Allmaras 型工作变量 ν̃）：
//! 一阶上风对流 + 源项（生成/耗散），显式推进，原子累加器并行散布。
//! 输出逐点涡黏性 μ_t = ρ·ν̃·f_v1 供主求解器作为辅助标量输入。
//!
//! 源项闭合是可插拔策略：按配置选定，运行期不变。

use af_mesh::MeshTopology;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::assembly::atomic::atomic_add_f64;
use crate::fluid::Primitive;
use crate::numerics::gradient::{GradientStorage, GRAD_U, GRAD_V};
use crate::state::FlowField;

/// 源项闭合类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// 无湍流（冻结涡黏性）
    #[default]
    None,
    /// Spalart-Allmaras 一方程
    SpalartAllmaras,
}

/// 源项闭合 trait
///
/// 纯函数：输入当前点状态，输出单位体积源项与其对 ν̃ 的对角导数。
pub trait SourceScheme: Send + Sync {
    /// 闭合名称
    fn name(&self) -> &'static str;

    /// 计算源项
    ///
    /// # 参数
    /// - `prim`: 点原始状态
    /// - `nu_tilde`: 工作变量
    /// - `wall_distance`: 壁面距离
    /// - `vorticity`: 涡量模长
    ///
    /// # 返回
    /// (源项, ∂源项/∂ν̃)
    fn source(
        &self,
        prim: &Primitive,
        nu_tilde: f64,
        wall_distance: f64,
        vorticity: f64,
    ) -> (f64, f64);

    /// 由工作变量计算涡黏性
    fn eddy_viscosity(&self, prim: &Primitive, nu_tilde: f64) -> f64;
}

/// 无源项（冻结）
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSource;

impl SourceScheme for NoSource {
    fn name(&self) -> &'static str {
        "None"
    }

    fn source(&self, _: &Primitive, _: f64, _: f64, _: f64) -> (f64, f64) {
        (0.0, 0.0)
    }

    fn eddy_viscosity(&self, _: &Primitive, _: f64) -> f64 {
        0.0
    }
}

/// Spalart-Allmaras 源项
#[derive(Debug, Clone, Copy)]
pub struct SpalartAllmaras {
    cb1: f64,
    cw1: f64,
    cv1: f64,
    kappa: f64,
}

impl Default for SpalartAllmaras {
    fn default() -> Self {
        let cb1 = 0.1355;
        let sigma = 2.0 / 3.0;
        let cb2 = 0.622;
        let kappa = 0.41;
        Self {
            cb1,
            cw1: cb1 / (kappa * kappa) + (1.0 + cb2) / sigma,
            cv1: 7.1,
            kappa,
        }
    }
}

impl SpalartAllmaras {
    /// f_v1 阻尼函数
    #[inline]
    fn fv1(&self, chi: f64) -> f64 {
        let chi3 = chi * chi * chi;
        chi3 / (chi3 + self.cv1 * self.cv1 * self.cv1)
    }
}

impl SourceScheme for SpalartAllmaras {
    fn name(&self) -> &'static str {
        "SpalartAllmaras"
    }

    fn source(
        &self,
        prim: &Primitive,
        nu_tilde: f64,
        wall_distance: f64,
        vorticity: f64,
    ) -> (f64, f64) {
        if nu_tilde <= 0.0 {
            return (0.0, 0.0);
        }
        let nu = prim.laminar_viscosity / prim.density;
        let d = wall_distance.max(1e-10);
        let chi = nu_tilde / nu;
        let fv1 = self.fv1(chi);
        let fv2 = 1.0 - chi / (1.0 + chi * fv1);

        // 修正应变率 S̃
        let s_tilde =
            (vorticity + nu_tilde / (self.kappa * self.kappa * d * d) * fv2).max(1e-10);

        // 生成
        let production = self.cb1 * s_tilde * nu_tilde;
        // 耗散（fw 近似为 1 的紧凑形式）
        let destruction = self.cw1 * (nu_tilde / d) * (nu_tilde / d);

        let source = production - destruction;
        // 对角线性化: ∂P/∂ν̃ − ∂D/∂ν̃（只保留负贡献增强稳定性）
        let jac = (self.cb1 * s_tilde - 2.0 * self.cw1 * nu_tilde / (d * d)).min(0.0);
        (source, jac)
    }

    fn eddy_viscosity(&self, prim: &Primitive, nu_tilde: f64) -> f64 {
        if nu_tilde <= 0.0 {
            return 0.0;
        }
        let nu = prim.laminar_viscosity / prim.density;
        let chi = nu_tilde / nu;
        prim.density * nu_tilde * self.fv1(chi)
    }
}

/// 按配置创建源项闭合
pub fn create_source_scheme(kind: SourceKind) -> Box<dyn SourceScheme> {
    match kind {
        SourceKind::None => Box::new(NoSource),
        SourceKind::SpalartAllmaras => Box::new(SpalartAllmaras::default()),
    }
}

/// 湍流工作变量标量输运
pub struct ScalarTransport {
    source: Box<dyn SourceScheme>,
    nu_tilde: Vec<f64>,
    wall_distance: Vec<f64>,
    /// 散布缓冲（扁平标量，CAS 原子加）
    flux_bits: Vec<std::sync::atomic::AtomicU64>,
}

impl ScalarTransport {
    /// 创建输运求解器
    ///
    /// # 参数
    /// - `kind`: 源项闭合
    /// - `wall_distance`: 逐点壁面距离
    /// - `nu_tilde_init`: 初始工作变量（自由流值）
    pub fn new(kind: SourceKind, wall_distance: Vec<f64>, nu_tilde_init: f64) -> Self {
        let n = wall_distance.len();
        Self {
            source: create_source_scheme(kind),
            nu_tilde: vec![nu_tilde_init; n],
            wall_distance,
            flux_bits: (0..n)
                .map(|_| std::sync::atomic::AtomicU64::new(0))
                .collect(),
        }
    }

    /// 工作变量场
    #[inline]
    pub fn nu_tilde(&self) -> &[f64] {
        &self.nu_tilde
    }

    /// 闭合名称
    pub fn source_name(&self) -> &'static str {
        self.source.name()
    }

    /// 显式推进一步并写回涡黏性场
    ///
    /// 一阶上风对流 + 点源项；ν̃ 在更新后钳制为非负。
    pub fn advance(
        &mut self,
        mesh: &MeshTopology,
        field: &mut FlowField,
        grads: &GradientStorage,
        dt: &[f64],
    ) {
        use std::sync::atomic::Ordering;

        let n = mesh.n_points();
        debug_assert_eq!(dt.len(), n);

        for a in &self.flux_bits {
            a.store(0f64.to_bits(), Ordering::Relaxed);
        }

        // 对流：一阶上风，原子散布（并行安全；浮点求和顺序不固定）
        let nu_tilde = &self.nu_tilde;
        let flux_bits = &self.flux_bits;
        let field_ref: &FlowField = field;
        mesh.edges().par_iter().for_each(|edge| {
            let vel = 0.5
                * (field_ref.primitive(edge.i).velocity + field_ref.primitive(edge.j).velocity);
            let vn = vel.dot(edge.normal);
            let upwind = if vn >= 0.0 {
                nu_tilde[edge.i]
            } else {
                nu_tilde[edge.j]
            };
            let flux = vn * upwind;

            atomic_add_f64(&flux_bits[edge.i], flux);
            atomic_add_f64(&flux_bits[edge.j], -flux);
        });

        // 源项 + 更新
        let source = self.source.as_ref();
        let wall_distance = &self.wall_distance;
        let new_nu: Vec<f64> = (0..n)
            .into_par_iter()
            .map(|i| {
                let prim = field_ref.primitive(i);
                let g = grads.point(i);
                let vorticity = (g[GRAD_V].x - g[GRAD_U].y).abs();
                let (src, _jac) =
                    source.source(prim, nu_tilde[i], wall_distance[i], vorticity);
                let conv =
                    f64::from_bits(flux_bits[i].load(Ordering::Relaxed));
                let vol = mesh.point(i).volume;
                (nu_tilde[i] + dt[i] * (src - conv / vol)).max(0.0)
            })
            .collect();
        self.nu_tilde = new_nu;

        // 写回涡黏性
        let mu_t: Vec<f64> = (0..n)
            .map(|i| self.source.eddy_viscosity(field.primitive(i), self.nu_tilde[i]))
            .collect();
        field.set_eddy_viscosity(&mu_t);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fluid::IdealGas;
    use af_mesh::generation;
    use glam::DVec2;

    fn prim() -> Primitive {
        IdealGas::default().primitive_from_rho_vel_p(1.0, DVec2::new(50.0, 0.0), 101325.0, 0.0)
    }

    #[test]
    fn test_sa_production_positive_far_from_wall() {
        let sa = SpalartAllmaras::default();
        let p = prim();
        let (src, _) = sa.source(&p, 1e-4, 10.0, 100.0);
        // 远离壁面、强涡量: 生成占主导
        assert!(src > 0.0);
    }

    #[test]
    fn test_sa_destruction_dominates_near_wall() {
        let sa = SpalartAllmaras::default();
        let p = prim();
        let (src, jac) = sa.source(&p, 1e-3, 1e-5, 0.1);
        assert!(src < 0.0);
        assert!(jac <= 0.0);
    }

    #[test]
    fn test_sa_eddy_viscosity_monotone() {
        let sa = SpalartAllmaras::default();
        let p = prim();
        let low = sa.eddy_viscosity(&p, 1e-6);
        let high = sa.eddy_viscosity(&p, 1e-3);
        assert!(high > low);
        assert!(low >= 0.0);
    }

    #[test]
    fn test_no_source_keeps_frozen() {
        let ns = NoSource;
        let p = prim();
        assert_eq!(ns.source(&p, 1.0, 1.0, 1.0), (0.0, 0.0));
        assert_eq!(ns.eddy_viscosity(&p, 1.0), 0.0);
    }

    #[test]
    fn test_transport_uniform_field_stays_uniform() {
        // 均匀 ν̃ 均匀速度: 对流通量望远镜抵消（内点），场保持
        let mesh = generation::cartesian(4, 4, 1.0, 1.0).unwrap();
        let gas = IdealGas::default();
        let fs = gas.primitive_from_rho_vel_p(1.0, DVec2::ZERO, 101325.0, 0.0);
        let mut field = FlowField::uniform(gas, mesh.n_points(), fs);
        let grads = GradientStorage::new(mesh.n_points());

        let mut transport =
            ScalarTransport::new(SourceKind::None, vec![1.0; mesh.n_points()], 1e-4);
        let dt = vec![1e-3; mesh.n_points()];
        transport.advance(&mesh, &mut field, &grads, &dt);

        // 零速度下对流为零，NoSource 无源: ν̃ 不变
        for &v in transport.nu_tilde() {
            assert!((v - 1e-4).abs() < 1e-18);
        }
        // 涡黏性写回（NoSource → 0）
        assert!(field.eddy_viscosity().iter().all(|&m| m == 0.0));
    }

    #[test]
    fn test_positivity_clamp() {
        // 强耗散下 ν̃ 不会变负
        let mesh = generation::cartesian(3, 3, 1.0, 1.0).unwrap();
        let gas = IdealGas::default();
        let fs = gas.primitive_from_rho_vel_p(1.0, DVec2::ZERO, 101325.0, 0.0);
        let mut field = FlowField::uniform(gas, mesh.n_points(), fs);
        let grads = GradientStorage::new(mesh.n_points());

        let mut transport = ScalarTransport::new(
            SourceKind::SpalartAllmaras,
            vec![1e-8; mesh.n_points()],
            1e-2,
        );
        let dt = vec![1.0; mesh.n_points()];
        for _ in 0..5 {
            transport.advance(&mesh, &mut field, &grads, &dt);
        }
        assert!(transport.nu_tilde().iter().all(|&v| v >= 0.0));
    }
}
