// crates/af_physics/src/numerics/reconstruction.rs

//! MUSCL 二阶重构
//!
//! 将点值用限制后的梯度外推到边中点，得到左右状态交给对流格式。
//! 流程：梯度（外部提供）→ 限制因子（按点按场，取关联边最小）→ 外推。
//!
//! 外推出非物理状态（负密度/压力）的边退回一阶取值，
//! 保证激波附近的低阶求值始终有界。

use af_mesh::MeshTopology;

use super::gradient::{GradientStorage, GRAD_P, GRAD_RHO, GRAD_U, GRAD_V};
use super::limiter::{create_limiter, LimiterContext, LimiterKind, SlopeLimiter};
use crate::fluid::Primitive;
use crate::state::FlowField;

/// MUSCL 重构的标量场数（rho, u, v, p）
pub const N_RECON: usize = 4;

/// MUSCL 重构器
pub struct MusclReconstructor {
    second_order: bool,
    limiter: Box<dyn SlopeLimiter>,
    eps2: f64,
    /// 限制因子 ψ[点][场]
    limiters: Vec<[f64; N_RECON]>,
}

impl MusclReconstructor {
    /// 创建重构器
    ///
    /// # 参数
    /// - `n_points`: 点数
    /// - `second_order`: false 时退化为一阶（ψ 恒 1、梯度不用）
    /// - `limiter_kind`: 限制器类型
    /// - `venkat_k`: Venkatakrishnan 常数
    /// - `mesh_scale`: 网格特征尺度
    pub fn new(
        n_points: usize,
        second_order: bool,
        limiter_kind: LimiterKind,
        venkat_k: f64,
        mesh_scale: f64,
    ) -> Self {
        let kh = venkat_k * mesh_scale;
        Self {
            second_order,
            limiter: create_limiter(limiter_kind, venkat_k, mesh_scale),
            eps2: (kh * kh * kh).max(1e-30),
            limiters: vec![[1.0; N_RECON]; n_points],
        }
    }

    /// 是否二阶
    #[inline]
    pub fn is_second_order(&self) -> bool {
        self.second_order
    }

    /// 点的限制因子
    #[inline]
    pub fn limiter_values(&self, i: usize) -> &[f64; N_RECON] {
        &self.limiters[i]
    }

    /// 计算所有点的限制因子
    pub fn compute_limiters(
        &mut self,
        mesh: &MeshTopology,
        field: &FlowField,
        grads: &GradientStorage,
    ) {
        if !self.second_order {
            self.limiters.fill([1.0; N_RECON]);
            return;
        }

        for i in 0..mesh.n_points() {
            let vals = recon_values(field, i);
            let xi = mesh.point(i).coord;

            // 邻域极值
            let mut vmin = vals;
            let mut vmax = vals;
            for &j in mesh.neighbors(i) {
                let vj = recon_values(field, j);
                for k in 0..N_RECON {
                    vmin[k] = vmin[k].min(vj[k]);
                    vmax[k] = vmax[k].max(vj[k]);
                }
            }

            let mut psi = [1.0f64; N_RECON];
            for &e in mesh.point_edges(i) {
                let edge = mesh.edge(e);
                let other = if edge.i == i { edge.j } else { edge.i };
                let mid = 0.5 * (xi + mesh.point(other).coord);
                let dr = mid - xi;

                let g = grads.point(i);
                let proj = [
                    g[GRAD_RHO].dot(dr),
                    g[GRAD_U].dot(dr),
                    g[GRAD_V].dot(dr),
                    g[GRAD_P].dot(dr),
                ];
                for k in 0..N_RECON {
                    let ctx = LimiterContext {
                        delta_max: vmax[k] - vals[k],
                        delta_min: vmin[k] - vals[k],
                        projection: proj[k],
                        eps2: self.eps2,
                    };
                    psi[k] = psi[k].min(self.limiter.limit(&ctx));
                }
            }
            self.limiters[i] = psi;
        }
    }

    /// 重构边 e 的左右状态
    ///
    /// 返回 (左状态, 右状态)。一阶模式直接取节点值。
    pub fn reconstruct_edge(
        &self,
        mesh: &MeshTopology,
        field: &FlowField,
        grads: &GradientStorage,
        e: usize,
    ) -> (Primitive, Primitive) {
        let edge = mesh.edge(e);
        let pi = field.primitive(edge.i);
        let pj = field.primitive(edge.j);

        if !self.second_order {
            return (*pi, *pj);
        }

        let mid = 0.5 * (mesh.point(edge.i).coord + mesh.point(edge.j).coord);
        let left = self.extrapolate(mesh, field, grads, edge.i, mid).unwrap_or(*pi);
        let right = self.extrapolate(mesh, field, grads, edge.j, mid).unwrap_or(*pj);
        (left, right)
    }

    /// 从点 i 外推到指定位置；产生非物理状态时返回 None
    fn extrapolate(
        &self,
        mesh: &MeshTopology,
        field: &FlowField,
        grads: &GradientStorage,
        i: usize,
        target: glam::DVec2,
    ) -> Option<Primitive> {
        let p = field.primitive(i);
        let dr = target - mesh.point(i).coord;
        let g = grads.point(i);
        let psi = &self.limiters[i];

        let rho = p.density + psi[0] * g[GRAD_RHO].dot(dr);
        let u = p.velocity.x + psi[1] * g[GRAD_U].dot(dr);
        let v = p.velocity.y + psi[2] * g[GRAD_V].dot(dr);
        let pressure = p.pressure + psi[3] * g[GRAD_P].dot(dr);

        if rho <= 0.0 || pressure <= 0.0 {
            return None;
        }
        Some(field.gas().primitive_from_rho_vel_p(
            rho,
            glam::DVec2::new(u, v),
            pressure,
            p.eddy_viscosity,
        ))
    }
}

/// 重构用标量场值 (rho, u, v, p)
#[inline]
fn recon_values(field: &FlowField, i: usize) -> [f64; N_RECON] {
    let p = field.primitive(i);
    [p.density, p.velocity.x, p.velocity.y, p.pressure]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fluid::{Conserved, IdealGas};
    use crate::numerics::gradient::{compute_gradients, GradientKind};
    use af_mesh::generation;
    use glam::DVec2;

    fn setup(second_order: bool) -> (MeshTopology, FlowField, GradientStorage, MusclReconstructor) {
        let mesh = generation::cartesian(5, 5, 1.0, 1.0).unwrap();
        let gas = IdealGas::default();
        let prim = gas.primitive_from_rho_vel_p(1.0, DVec2::ZERO, 101325.0, 0.0);
        let mut field = FlowField::uniform(gas, mesh.n_points(), prim);
        // 密度线性变化
        for i in 0..mesh.n_points() {
            let x = mesh.point(i).coord.x;
            field.set_conserved(
                i,
                Conserved {
                    density: 1.0 + 0.2 * x,
                    momentum: DVec2::ZERO,
                    energy: 101325.0 / 0.4,
                },
            );
        }
        field.set_primitive_variables();

        let mut grads = GradientStorage::new(mesh.n_points());
        compute_gradients(GradientKind::WeightedLeastSquares, &mesh, &field, &mut grads);

        let mut muscl = MusclReconstructor::new(
            mesh.n_points(),
            second_order,
            LimiterKind::Venkatakrishnan,
            5.0,
            0.25,
        );
        muscl.compute_limiters(&mesh, &field, &grads);
        (mesh, field, grads, muscl)
    }

    #[test]
    fn test_first_order_uses_nodal_values() {
        let (mesh, field, grads, muscl) = setup(false);
        let (l, r) = muscl.reconstruct_edge(&mesh, &field, &grads, 0);
        let e = mesh.edge(0);
        assert!((l.density - field.primitive(e.i).density).abs() < 1e-14);
        assert!((r.density - field.primitive(e.j).density).abs() < 1e-14);
    }

    #[test]
    fn test_second_order_meets_at_midpoint_for_linear_field() {
        // 线性场 + 精确梯度：左右重构值在边中点一致
        let (mesh, field, grads, muscl) = setup(true);
        // 找一条内部水平边
        let e = mesh
            .edges()
            .iter()
            .position(|e| {
                let ci = mesh.point(e.i).coord;
                let cj = mesh.point(e.j).coord;
                (ci.y - cj.y).abs() < 1e-12 && ci.y > 0.2 && ci.y < 0.8 && ci.x > 0.2 && cj.x < 0.8
            })
            .unwrap();
        let (l, r) = muscl.reconstruct_edge(&mesh, &field, &grads, e);
        assert!(
            (l.density - r.density).abs() < 1e-6,
            "左 {} 右 {}",
            l.density,
            r.density
        );
    }

    #[test]
    fn test_limiters_in_unit_range() {
        let (_, _, _, muscl) = setup(true);
        for psi in &muscl.limiters {
            for &v in psi {
                assert!((0.0..=1.0).contains(&v));
            }
        }
    }
}
