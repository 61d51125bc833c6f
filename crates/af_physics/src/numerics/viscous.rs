// crates/af_physics/src/numerics/viscous.rs

//! 黏性通量
//!
//! 边中点的应力张量 + Fourier 热流。面梯度取两端平均并做方向修正
//! （平均梯度沿点连线方向用两点差分替换，抑制奇偶解耦）。
//!
//! 隐式 Jacobian 采用薄剪切层近似：factor = μ_tot·A / (ρ̄·dist)，
//! 动量块用 θ/η 张量结构，能量行含热传导项的 ∂T/∂U 线性化。

use af_foundation::Tolerance;
use glam::DVec2;

use crate::fluid::{IdealGas, Primitive};
use crate::numerics::gradient::{GRAD_T, GRAD_U, GRAD_V, N_GRAD};
use crate::{FluxVector, JacobianBlock, N_VAR, ZERO_BLOCK};

use super::convective::FluxResult;

/// 黏性通量计算器
#[derive(Debug, Clone, Copy)]
pub struct ViscousFlux {
    gas: IdealGas,
    tol: Tolerance,
}

impl ViscousFlux {
    /// 创建黏性通量计算器
    pub fn new(gas: IdealGas) -> Self {
        Self {
            gas,
            tol: Tolerance::default(),
        }
    }

    /// 计算边黏性通量（从 i 到 j 的扩散输运，含面积权）
    ///
    /// 调用方将总通量组合为 F_conv − F_visc。
    #[allow(clippy::too_many_arguments)]
    pub fn edge_flux(
        &self,
        prim_i: &Primitive,
        prim_j: &Primitive,
        grad_i: &[DVec2; N_GRAD],
        grad_j: &[DVec2; N_GRAD],
        coord_i: DVec2,
        coord_j: DVec2,
        normal: DVec2,
        implicit: bool,
    ) -> FluxResult {
        let area = normal.length();
        let nh = normal / area;

        let dr = coord_j - coord_i;
        let dist = dr.length().max(self.tol.min_distance);
        let er = dr / dist;

        // 平均输运系数与速度
        let mu_tot = 0.5 * (prim_i.total_viscosity() + prim_j.total_viscosity());
        let k_tot = 0.5 * (prim_i.thermal_conductivity + prim_j.thermal_conductivity);
        let vel = 0.5 * (prim_i.velocity + prim_j.velocity);
        let rho_mean = 0.5 * (prim_i.density + prim_j.density);

        // 面梯度：平均 + 方向修正
        let correct = |g_avg: DVec2, phi_i: f64, phi_j: f64| -> DVec2 {
            g_avg - (g_avg.dot(er) - (phi_j - phi_i) / dist) * er
        };
        let grad_u = correct(
            0.5 * (grad_i[GRAD_U] + grad_j[GRAD_U]),
            prim_i.velocity.x,
            prim_j.velocity.x,
        );
        let grad_v = correct(
            0.5 * (grad_i[GRAD_V] + grad_j[GRAD_V]),
            prim_i.velocity.y,
            prim_j.velocity.y,
        );
        let grad_t = correct(
            0.5 * (grad_i[GRAD_T] + grad_j[GRAD_T]),
            prim_i.temperature,
            prim_j.temperature,
        );

        // 应力张量 τ = μ(∇v + ∇vᵀ − ⅔(∇·v)I)
        let div = grad_u.x + grad_v.y;
        let txx = mu_tot * (2.0 * grad_u.x - 2.0 / 3.0 * div);
        let tyy = mu_tot * (2.0 * grad_v.y - 2.0 / 3.0 * div);
        let txy = mu_tot * (grad_u.y + grad_v.x);

        let tau_n = DVec2::new(txx * nh.x + txy * nh.y, txy * nh.x + tyy * nh.y);
        let q_n = k_tot * grad_t.dot(nh);

        let flux: FluxVector = [
            0.0,
            tau_n.x * area,
            tau_n.y * area,
            (tau_n.dot(vel) + q_n) * area,
        ];

        let (jac_i, jac_j) = if implicit {
            let (ji, jj) = self.thin_layer_jacobians(
                prim_i, prim_j, vel, rho_mean, mu_tot, k_tot, nh, area, dist,
            );
            (Some(ji), Some(jj))
        } else {
            (None, None)
        };

        FluxResult { flux, jac_i, jac_j }
    }

    /// 薄剪切层 Jacobian 近似
    ///
    /// θ_x = 1 + n_x²/3, θ_y = 1 + n_y²/3, η = n_x·n_y/3。
    /// ∂G/∂U_j = +factor·(...)，∂G/∂U_i 为其相反数（G ~ (v_j − v_i)/dist）。
    #[allow(clippy::too_many_arguments)]
    fn thin_layer_jacobians(
        &self,
        prim_i: &Primitive,
        prim_j: &Primitive,
        vel: DVec2,
        rho_mean: f64,
        mu_tot: f64,
        k_tot: f64,
        nh: DVec2,
        area: f64,
        dist: f64,
    ) -> (JacobianBlock, JacobianBlock) {
        let factor = mu_tot * area / (rho_mean * dist);
        let theta_x = 1.0 + nh.x * nh.x / 3.0;
        let theta_y = 1.0 + nh.y * nh.y / 3.0;
        let eta = nh.x * nh.y / 3.0;

        let pix = theta_x * vel.x + eta * vel.y;
        let piy = eta * vel.x + theta_y * vel.y;

        // ∂G/∂U_j（速度经 v = (ρv)/ρ 线性化）
        let mut jac_j = ZERO_BLOCK;
        jac_j[1][0] = -factor * pix;
        jac_j[1][1] = factor * theta_x;
        jac_j[1][2] = factor * eta;
        jac_j[2][0] = -factor * piy;
        jac_j[2][1] = factor * eta;
        jac_j[2][2] = factor * theta_y;
        // 能量行：剪切做功项
        jac_j[3][0] = -factor * (pix * vel.x + piy * vel.y);
        jac_j[3][1] = factor * pix;
        jac_j[3][2] = factor * piy;

        // 热传导项: q_n ≈ k·(T_j − T_i)/dist
        let cond = k_tot * area / dist;
        let gas = self.gas;
        let dtj = gas.temperature_jacobian(&gas.conserved_from_primitive(prim_j));
        let dti = gas.temperature_jacobian(&gas.conserved_from_primitive(prim_i));
        for k in 0..N_VAR {
            jac_j[3][k] += cond * dtj[k];
        }

        let mut jac_i = ZERO_BLOCK;
        for k in 0..N_VAR {
            for l in 0..N_VAR {
                jac_i[k][l] = -jac_j[k][l];
            }
        }
        // i 侧热传导用 i 的 ∂T/∂U
        for k in 0..N_VAR {
            jac_i[3][k] += cond * (dtj[k] - dti[k]);
        }

        (jac_i, jac_j)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gas() -> IdealGas {
        IdealGas::default()
    }

    fn uniform_grad() -> [DVec2; N_GRAD] {
        [DVec2::ZERO; N_GRAD]
    }

    #[test]
    fn test_uniform_state_zero_flux() {
        let g = gas();
        let vf = ViscousFlux::new(g);
        let p = g.primitive_from_rho_vel_p(1.0, DVec2::new(50.0, 0.0), 101325.0, 0.0);
        let result = vf.edge_flux(
            &p,
            &p,
            &uniform_grad(),
            &uniform_grad(),
            DVec2::ZERO,
            DVec2::X,
            DVec2::X,
            false,
        );
        for v in result.flux {
            assert!(v.abs() < 1e-10);
        }
    }

    #[test]
    fn test_shear_flow_momentum_flux() {
        // 纯剪切 du/dy: τ_xy = μ·du/dy，法向 y 的边动量通量为 τ_xy
        let g = gas();
        let vf = ViscousFlux::new(g);
        let p = g.primitive_from_rho_vel_p(1.0, DVec2::ZERO, 101325.0, 0.0);
        let mut grad = uniform_grad();
        grad[GRAD_U] = DVec2::new(0.0, 100.0); // du/dy = 100

        // 连线沿 x，法向沿 y: 方向修正只作用于 x 分量，du/dy 保持
        let result = vf.edge_flux(
            &p,
            &p,
            &grad,
            &grad,
            DVec2::ZERO,
            DVec2::new(1.0, 0.0),
            DVec2::new(0.0, 1.0),
            false,
        );
        let mu = p.laminar_viscosity;
        // τ·n̂ = (τ_xy, τ_yy)
        assert!(
            (result.flux[1] - mu * 100.0).abs() < 1e-9,
            "τ_xy·A = {}, 期望 {}",
            result.flux[1],
            mu * 100.0
        );
    }

    #[test]
    fn test_temperature_jump_heat_flux() {
        // 温差驱动的热流进入能量方程
        let g = gas();
        let vf = ViscousFlux::new(g);
        let cold = g.primitive_from_rho_vel_p(1.0, DVec2::ZERO, 101325.0, 0.0);
        let hot = g.primitive_from_rho_vel_p(0.9, DVec2::ZERO, 101325.0, 0.0);
        assert!(hot.temperature > cold.temperature);

        let result = vf.edge_flux(
            &cold,
            &hot,
            &uniform_grad(),
            &uniform_grad(),
            DVec2::ZERO,
            DVec2::X,
            DVec2::X,
            true,
        );
        // 热量从 j（热）流向 i（冷）: 沿 +x 的热流为正
        assert!(result.flux[3] > 0.0);
        assert!(result.jac_i.is_some() && result.jac_j.is_some());
    }

    #[test]
    fn test_jacobian_antisymmetry_momentum_rows() {
        let g = gas();
        let vf = ViscousFlux::new(g);
        let p = g.primitive_from_rho_vel_p(1.0, DVec2::new(10.0, 5.0), 101325.0, 0.0);
        let result = vf.edge_flux(
            &p,
            &p,
            &uniform_grad(),
            &uniform_grad(),
            DVec2::ZERO,
            DVec2::X,
            DVec2::X,
            true,
        );
        let ji = result.jac_i.unwrap();
        let jj = result.jac_j.unwrap();
        // 动量行严格反号（热传导只进能量行）
        for row in 1..3 {
            for col in 0..N_VAR {
                assert!((ji[row][col] + jj[row][col]).abs() < 1e-12);
            }
        }
    }
}
