// crates/af_physics/src/numerics/convective/hllc.rs

//! HLLC 近似黎曼求解器
//!
//! 波速估计采用左右声速与 Roe 平均的组合，接触波速 S* 由
//! 动量守恒关系恢复。四分支按波速符号选择左/右/星区通量。

use glam::DVec2;

use super::traits::{ConvectiveScheme, FluxResult, SchemeCapabilities};
use super::{projected_flux, spectral_jacobian_pair};
use crate::fluid::{IdealGas, Primitive};
use crate::{FluxVector, N_VAR};

/// HLLC 格式
#[derive(Debug, Clone, Copy)]
pub struct HllcScheme {
    gas: IdealGas,
}

impl HllcScheme {
    /// 创建 HLLC 格式
    pub fn new(gas: IdealGas) -> Self {
        Self { gas }
    }

    /// 星区状态 U* 及其通量贡献 F_side + S(U* − U)
    fn star_flux(
        p: &Primitive,
        normal: DVec2,
        s: f64,
        s_star: f64,
        f_side: &FluxVector,
    ) -> FluxVector {
        let area = normal.length();
        let nh = normal / area;
        let vn = p.velocity.dot(nh);
        let rho = p.density;
        let factor = rho * (s - vn) / (s - s_star);

        // U* 星区守恒量
        let e_total = p.enthalpy - p.pressure / rho; // E
        let u_star = [
            factor,
            factor * (p.velocity.x + (s_star - vn) * nh.x),
            factor * (p.velocity.y + (s_star - vn) * nh.y),
            factor * (e_total + (s_star - vn) * (s_star + p.pressure / (rho * (s - vn)))),
        ];
        let u_side = [
            rho,
            rho * p.velocity.x,
            rho * p.velocity.y,
            rho * e_total,
        ];

        let mut flux = [0.0; N_VAR];
        for k in 0..N_VAR {
            flux[k] = f_side[k] + s * (u_star[k] - u_side[k]) * area;
        }
        flux
    }
}

impl ConvectiveScheme for HllcScheme {
    fn name(&self) -> &'static str {
        "HLLC"
    }

    fn capabilities(&self) -> SchemeCapabilities {
        SchemeCapabilities {
            upwind: true,
            has_entropy_fix: false,
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

        let vn_l = left.velocity.dot(nh);
        let vn_r = right.velocity.dot(nh);

        // Roe 平均波速估计
        let sq_l = left.density.sqrt();
        let sq_r = right.density.sqrt();
        let inv_sum = 1.0 / (sq_l + sq_r);
        let vn_roe = (sq_l * vn_l + sq_r * vn_r) * inv_sum;
        let h_roe = (sq_l * left.enthalpy + sq_r * right.enthalpy) * inv_sum;
        let vel_roe = (sq_l * left.velocity + sq_r * right.velocity) * inv_sum;
        let c2_roe = ((gamma - 1.0) * (h_roe - 0.5 * vel_roe.length_squared())).max(0.0);
        let c_roe = c2_roe.sqrt();

        let s_l = (vn_l - left.sound_speed).min(vn_roe - c_roe);
        let s_r = (vn_r + right.sound_speed).max(vn_roe + c_roe);

        // 接触波速
        let num = right.pressure - left.pressure
            + left.density * vn_l * (s_l - vn_l)
            - right.density * vn_r * (s_r - vn_r);
        let den = left.density * (s_l - vn_l) - right.density * (s_r - vn_r);
        let s_star = if den.abs() > 1e-14 { num / den } else { 0.0 };

        let f_l = projected_flux(left, normal);
        let f_r = projected_flux(right, normal);

        let flux = if s_l >= 0.0 {
            f_l
        } else if s_r <= 0.0 {
            f_r
        } else if s_star >= 0.0 {
            Self::star_flux(left, normal, s_l, s_star, &f_l)
        } else {
            Self::star_flux(right, normal, s_r, s_star, &f_r)
        };

        let (jac_i, jac_j) = if implicit {
            let lambda = s_l.abs().max(s_r.abs()) * area;
            let (ji, jj) = spectral_jacobian_pair(left, right, normal, lambda, gamma);
            (Some(ji), Some(jj))
        } else {
            (None, None)
        };

        FluxResult { flux, jac_i, jac_j }
    }
}
