// crates/af_physics/src/numerics/convective/roe.rs

//! Roe 近似黎曼求解器
//!
//! 通量 = ½(F_L + F_R) − ½|A_roe|(U_R − U_L)，耗散项按波强分解计算，
//! Harten 熵修正防止膨胀激波。Roe 平均声速平方在开方前钳制为非负。

use glam::DVec2;

use super::traits::{ConvectiveScheme, FluxResult, SchemeCapabilities};
use super::{projected_flux, spectral_jacobian_pair};
use crate::fluid::{IdealGas, Primitive};
use crate::N_VAR;

/// 熵修正阈值比例
const ENTROPY_RATIO: f64 = 0.1;

/// Roe 格式
#[derive(Debug, Clone, Copy)]
pub struct RoeScheme {
    gas: IdealGas,
}

impl RoeScheme {
    /// 创建 Roe 格式
    pub fn new(gas: IdealGas) -> Self {
        Self { gas }
    }

    /// Harten 熵修正
    #[inline]
    fn entropy_fix(lambda: f64, delta: f64) -> f64 {
        let a = lambda.abs();
        if a < delta {
            0.5 * (lambda * lambda + delta * delta) / delta
        } else {
            a
        }
    }
}

impl ConvectiveScheme for RoeScheme {
    fn name(&self) -> &'static str {
        "Roe"
    }

    fn capabilities(&self) -> SchemeCapabilities {
        SchemeCapabilities {
            upwind: true,
            has_entropy_fix: true,
            resolves_contact: true,
        }
    }

    fn flux(
        &self,
        left: &Primitive,
        right: &Primitive,
        normal: DVec2,
        implicit: bool,
    ) -> FluxResult {
        let gamma = self.gas.gamma;
        let area = normal.length();
        let nh = normal / area;

        // Roe 平均
        let sq_l = left.density.sqrt();
        let sq_r = right.density.sqrt();
        let inv_sum = 1.0 / (sq_l + sq_r);
        let rho_roe = sq_l * sq_r;
        let vel_roe = (sq_l * left.velocity + sq_r * right.velocity) * inv_sum;
        let h_roe = (sq_l * left.enthalpy + sq_r * right.enthalpy) * inv_sum;
        let q2 = vel_roe.length_squared();
        // 声速平方钳制为非负后再开方
        let c2 = ((gamma - 1.0) * (h_roe - 0.5 * q2)).max(0.0);
        let c_roe = c2.sqrt().max(1e-12);
        let vn_roe = vel_roe.dot(nh);

        // 原始量跳跃
        let d_rho = right.density - left.density;
        let d_p = right.pressure - left.pressure;
        let d_vel = right.velocity - left.velocity;
        let d_vn = d_vel.dot(nh);

        // 波强
        let alpha_1 = (d_p - rho_roe * c_roe * d_vn) / (2.0 * c2);
        let alpha_2 = d_rho - d_p / c2;
        let alpha_3 = (d_p + rho_roe * c_roe * d_vn) / (2.0 * c2);

        // 特征速度（带熵修正）
        let delta = (ENTROPY_RATIO * (vn_roe.abs() + c_roe)).max(1e-12);
        let l1 = Self::entropy_fix(vn_roe - c_roe, delta);
        let l2 = vn_roe.abs();
        let l3 = Self::entropy_fix(vn_roe + c_roe, delta);

        // 耗散 = Σ |λ_k| α_k K_k
        let (u, v) = (vel_roe.x, vel_roe.y);
        let k1 = [
            1.0,
            u - c_roe * nh.x,
            v - c_roe * nh.y,
            h_roe - c_roe * vn_roe,
        ];
        let k2 = [1.0, u, v, 0.5 * q2];
        let k3 = [
            1.0,
            u + c_roe * nh.x,
            v + c_roe * nh.y,
            h_roe + c_roe * vn_roe,
        ];
        // 剪切波（切向速度跳跃）
        let d_vt = d_vel - d_vn * nh;
        let k4 = [
            0.0,
            d_vt.x,
            d_vt.y,
            vel_roe.dot(d_vel) - vn_roe * d_vn,
        ];

        let mut diss = [0.0; N_VAR];
        for k in 0..N_VAR {
            diss[k] = l1 * alpha_1 * k1[k]
                + l2 * alpha_2 * k2[k]
                + l3 * alpha_3 * k3[k]
                + l2 * rho_roe * k4[k];
        }

        let f_l = projected_flux(left, normal);
        let f_r = projected_flux(right, normal);
        let mut flux = [0.0; N_VAR];
        for k in 0..N_VAR {
            flux[k] = 0.5 * (f_l[k] + f_r[k]) - 0.5 * diss[k] * area;
        }

        let (jac_i, jac_j) = if implicit {
            let lambda = (vn_roe.abs() + c_roe) * area;
            let (ji, jj) = spectral_jacobian_pair(left, right, normal, lambda, gamma);
            (Some(ji), Some(jj))
        } else {
            (None, None)
        };

        FluxResult { flux, jac_i, jac_j }
    }
}
