// crates/af_physics/src/numerics/convective/ausm.rs

//! AUSM+ 通量分裂格式
//!
//! 界面马赫数与压力分别用四次/五次多项式分裂，
//! 质量通量上风取值。亚声速分支系数 beta = 1/8, alpha = 3/16。

use glam::DVec2;

use super::traits::{ConvectiveScheme, FluxResult, SchemeCapabilities};
use super::spectral_jacobian_pair;
use crate::fluid::{IdealGas, Primitive};
use crate::N_VAR;

const BETA: f64 = 1.0 / 8.0;
const ALPHA: f64 = 3.0 / 16.0;

/// AUSM+ 格式
#[derive(Debug, Clone, Copy)]
pub struct AusmScheme {
    gas: IdealGas,
}

impl AusmScheme {
    /// 创建 AUSM+ 格式
    pub fn new(gas: IdealGas) -> Self {
        Self { gas }
    }

    /// 分裂马赫数 M⁺ (4次多项式)
    #[inline]
    fn mach_plus(m: f64) -> f64 {
        if m.abs() >= 1.0 {
            0.5 * (m + m.abs())
        } else {
            let m2 = 0.25 * (m + 1.0) * (m + 1.0);
            m2 + BETA * (m * m - 1.0) * (m * m - 1.0)
        }
    }

    /// 分裂马赫数 M⁻
    #[inline]
    fn mach_minus(m: f64) -> f64 {
        if m.abs() >= 1.0 {
            0.5 * (m - m.abs())
        } else {
            let m2 = -0.25 * (m - 1.0) * (m - 1.0);
            m2 - BETA * (m * m - 1.0) * (m * m - 1.0)
        }
    }

    /// 分裂压力 P⁺ (5次多项式)
    #[inline]
    fn pressure_plus(m: f64) -> f64 {
        if m.abs() >= 1.0 {
            0.5 * (1.0 + m.signum())
        } else {
            let base = 0.25 * (m + 1.0) * (m + 1.0) * (2.0 - m);
            base + ALPHA * m * (m * m - 1.0) * (m * m - 1.0)
        }
    }

    /// 分裂压力 P⁻
    #[inline]
    fn pressure_minus(m: f64) -> f64 {
        if m.abs() >= 1.0 {
            0.5 * (1.0 - m.signum())
        } else {
            let base = 0.25 * (m - 1.0) * (m - 1.0) * (2.0 + m);
            base - ALPHA * m * (m * m - 1.0) * (m * m - 1.0)
        }
    }
}

impl ConvectiveScheme for AusmScheme {
    fn name(&self) -> &'static str {
        "AUSM+"
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
        let area = normal.length();
        let nh = normal / area;

        let vn_l = left.velocity.dot(nh);
        let vn_r = right.velocity.dot(nh);

        // 界面声速：算术平均
        let c_half = (0.5 * (left.sound_speed + right.sound_speed)).max(1e-12);
        let m_l = vn_l / c_half;
        let m_r = vn_r / c_half;

        // 界面马赫数与压力
        let m_half = Self::mach_plus(m_l) + Self::mach_minus(m_r);
        let p_half = Self::pressure_plus(m_l) * left.pressure
            + Self::pressure_minus(m_r) * right.pressure;

        // 质量通量上风
        let mdot = if m_half > 0.0 {
            c_half * m_half * left.density
        } else {
            c_half * m_half * right.density
        };

        let upwind = if m_half > 0.0 { left } else { right };
        let psi = [
            1.0,
            upwind.velocity.x,
            upwind.velocity.y,
            upwind.enthalpy,
        ];

        let mut flux = [0.0; N_VAR];
        for k in 0..N_VAR {
            flux[k] = mdot * psi[k] * area;
        }
        flux[1] += p_half * nh.x * area;
        flux[2] += p_half * nh.y * area;

        let (jac_i, jac_j) = if implicit {
            let lambda = (vn_l.abs() + left.sound_speed)
                .max(vn_r.abs() + right.sound_speed)
                * area;
            let (ji, jj) = spectral_jacobian_pair(left, right, normal, lambda, self.gas.gamma);
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
    fn test_split_mach_consistency() {
        // M⁺(m) + M⁻(m) = m
        for &m in &[-2.0, -0.5, 0.0, 0.3, 1.5] {
            let sum = AusmScheme::mach_plus(m) + AusmScheme::mach_minus(m);
            assert!((sum - m).abs() < 1e-12, "m={}", m);
        }
    }

    #[test]
    fn test_split_pressure_consistency() {
        // P⁺(m) + P⁻(m) = 1
        for &m in &[-2.0, -0.5, 0.0, 0.3, 1.5] {
            let sum = AusmScheme::pressure_plus(m) + AusmScheme::pressure_minus(m);
            assert!((sum - 1.0).abs() < 1e-12, "m={}", m);
        }
    }

    #[test]
    fn test_antisymmetry() {
        assert_flux_antisymmetric(&AusmScheme::new(IdealGas::default()));
    }

    #[test]
    fn test_stagnation_pressure_flux() {
        assert_pure_pressure_flux(&AusmScheme::new(IdealGas::default()));
    }

    #[test]
    fn test_bounded_at_strong_jump() {
        assert_finite_at_strong_jump(&AusmScheme::new(IdealGas::default()));
    }
}
