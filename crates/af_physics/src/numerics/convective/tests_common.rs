// crates/af_physics/src/numerics/convective/tests_common.rs

//! 对流格式共享测试断言
//!
//! 所有格式都必须满足的守恒性/有界性性质。

use glam::DVec2;

use super::traits::ConvectiveScheme;
use crate::fluid::IdealGas;
use crate::N_VAR;

/// 通量反对称性: F(L, R, n) = -F(R, L, -n)
///
/// 核心守恒不变式：内部边两侧看到的通量大小相等方向相反。
pub fn assert_flux_antisymmetric(scheme: &dyn ConvectiveScheme) {
    let gas = IdealGas::default();
    let left = gas.primitive_from_rho_vel_p(1.0, DVec2::new(100.0, 20.0), 101325.0, 0.0);
    let right = gas.primitive_from_rho_vel_p(0.8, DVec2::new(50.0, -10.0), 80000.0, 0.0);
    let n = DVec2::new(0.6, 0.8) * 2.5;

    let fwd = scheme.flux(&left, &right, n, false);
    let bwd = scheme.flux(&right, &left, -n, false);

    for k in 0..N_VAR {
        let scale = fwd.flux[k].abs().max(1.0);
        assert!(
            (fwd.flux[k] + bwd.flux[k]).abs() < 1e-9 * scale,
            "{} 分量 {} 不反对称: {} vs {}",
            scheme.name(),
            k,
            fwd.flux[k],
            bwd.flux[k]
        );
    }
}

/// 驻点边: 左右状态相同且速度为零时，动量通量 = p·n，质量/能量通量为零
pub fn assert_pure_pressure_flux(scheme: &dyn ConvectiveScheme) {
    let gas = IdealGas::default();
    let p = gas.primitive_from_rho_vel_p(1.0, DVec2::ZERO, 101325.0, 0.0);
    let n = DVec2::new(1.0, 0.0);

    let result = scheme.flux(&p, &p, n, false);
    assert!(
        result.flux[0].abs() < 1e-9,
        "{} 质量通量非零: {}",
        scheme.name(),
        result.flux[0]
    );
    assert!(
        (result.flux[1] - 101325.0).abs() < 1e-6,
        "{} 动量通量 {} ≠ p·n",
        scheme.name(),
        result.flux[1]
    );
    assert!(result.flux[2].abs() < 1e-9);
    assert!(
        result.flux[3].abs() < 1e-9,
        "{} 能量通量非零: {}",
        scheme.name(),
        result.flux[3]
    );
}

/// 强间断下通量保持有限（合法物理输入绝不产生 NaN/Inf）
pub fn assert_finite_at_strong_jump(scheme: &dyn ConvectiveScheme) {
    let gas = IdealGas::default();
    let left = gas.primitive_from_rho_vel_p(10.0, DVec2::new(800.0, 0.0), 1.0e6, 0.0);
    let right = gas.primitive_from_rho_vel_p(0.01, DVec2::new(-300.0, 5.0), 100.0, 0.0);
    let n = DVec2::new(1.0, 0.0);

    let result = scheme.flux(&left, &right, n, true);
    assert!(result.is_valid(), "{} 在强间断下产生非有限通量", scheme.name());
    if let (Some(ji), Some(jj)) = (result.jac_i, result.jac_j) {
        for k in 0..N_VAR {
            for l in 0..N_VAR {
                assert!(ji[k][l].is_finite() && jj[k][l].is_finite());
            }
        }
    }
}
