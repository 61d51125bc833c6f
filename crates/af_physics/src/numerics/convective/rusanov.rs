// crates/af_physics/src/numerics/convective/rusanov.rs

//! Rusanov（局部 Lax-Friedrichs）格式
//!
//! 中心平均通量 + 标量谱半径耗散。一阶、强耗散，
//! 在激波处始终有界，用作低阶回退与稳健基线。

use glam::DVec2;

use super::traits::{ConvectiveScheme, FluxResult, SchemeCapabilities};
use super::{projected_flux, spectral_jacobian_pair};
use crate::fluid::{IdealGas, Primitive};
use crate::N_VAR;

/// Rusanov 格式
#[derive(Debug, Clone, Copy)]
pub struct RusanovScheme {
    gas: IdealGas,
}

impl RusanovScheme {
    /// 创建 Rusanov 格式
    pub fn new(gas: IdealGas) -> Self {
        Self { gas }
    }
}

impl ConvectiveScheme for RusanovScheme {
    fn name(&self) -> &'static str {
        "Rusanov"
    }

    fn capabilities(&self) -> SchemeCapabilities {
        SchemeCapabilities {
            upwind: false,
            has_entropy_fix: false,
            resolves_contact: false,
        }
    }

    fn flux(
        &self,
        left: &Primitive,
        right: &Primitive,
        normal: DVec2,
        implicit: bool,
    ) -> FluxResult {
        let gas = self.gas;
        let area = normal.length();
        let nh = normal / area;

        let lambda = left
            .spectral_radius(nh)
            .max(right.spectral_radius(nh));

        let f_l = projected_flux(left, normal);
        let f_r = projected_flux(right, normal);

        let u_l = gas.conserved_from_primitive(left).to_array();
        let u_r = gas.conserved_from_primitive(right).to_array();

        let mut flux = [0.0; N_VAR];
        for k in 0..N_VAR {
            flux[k] = 0.5 * (f_l[k] + f_r[k]) - 0.5 * lambda * (u_r[k] - u_l[k]) * area;
        }

        let (jac_i, jac_j) = if implicit {
            let (ji, jj) = spectral_jacobian_pair(left, right, normal, lambda * area, gas.gamma);
            (Some(ji), Some(jj))
        } else {
            (None, None)
        };

        FluxResult { flux, jac_i, jac_j }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numerics::convective::tests_common::*;

    #[test]
    fn test_antisymmetry() {
        assert_flux_antisymmetric(&RusanovScheme::new(IdealGas::default()));
    }

    #[test]
    fn test_stagnation_pressure_flux() {
        assert_pure_pressure_flux(&RusanovScheme::new(IdealGas::default()));
    }

    #[test]
    fn test_bounded_at_strong_jump() {
        assert_finite_at_strong_jump(&RusanovScheme::new(IdealGas::default()));
    }

    #[test]
    fn test_jacobian_sum_equals_central_jacobian() {
        // 谱半径项在 jac_i/jac_j 中符号相反，二者之和应等于中心平均 Jacobian
        let gas = IdealGas::default();
        let scheme = RusanovScheme::new(gas);
        let l = gas.primitive_from_rho_vel_p(1.0, DVec2::new(30.0, 0.0), 101325.0, 0.0);
        let r = gas.primitive_from_rho_vel_p(1.0, DVec2::new(30.0, 0.0), 101325.0, 0.0);
        let n = DVec2::X;
        let result = scheme.flux(&l, &r, n, true);
        let ji = result.jac_i.unwrap();
        let jj = result.jac_j.unwrap();
        let a = crate::numerics::convective::inviscid_jacobian(&l, n, gas.gamma);
        for k in 0..N_VAR {
            for m in 0..N_VAR {
                let sum = ji[k][m] + jj[k][m];
                assert!((sum - a[k][m]).abs() < 1e-9 * a[k][m].abs().max(1.0));
            }
        }
    }
}
