// crates/af_physics/src/boundary/ghost.rs

//! 幽灵状态计算器
//!
//! 弱边界条件在边界外虚拟一个状态，与内部状态配对后复用内部
//! 对流格式。统一内部与边界的数值格式，实现天然并行安全。
//!
//! 法向约定：`unit_normal` 始终为指向计算域外的单位法向。

use glam::DVec2;

use crate::fluid::{IdealGas, Primitive};

/// 幽灵状态计算器
#[derive(Debug, Clone, Copy)]
pub struct GhostStateCalculator {
    gas: IdealGas,
    freestream: Primitive,
}

impl GhostStateCalculator {
    /// 创建计算器
    pub fn new(gas: IdealGas, freestream: Primitive) -> Self {
        Self { gas, freestream }
    }

    /// 自由流状态
    #[inline]
    pub fn freestream(&self) -> &Primitive {
        &self.freestream
    }

    /// 对称/无黏壁镜像: 法向速度反向，切向保持
    pub fn mirror(&self, interior: &Primitive, unit_normal: DVec2) -> Primitive {
        let vn = interior.velocity.dot(unit_normal);
        let mirrored = interior.velocity - 2.0 * vn * unit_normal;
        self.gas.primitive_from_rho_vel_p(
            interior.density,
            mirrored,
            interior.pressure,
            interior.eddy_viscosity,
        )
    }

    /// 远场特征重构
    ///
    /// 按法向马赫数分四类：超声速出/入流直接取内部/自由流；
    /// 亚声速用 Riemann 不变量组合，熵与切向速度从上风侧取。
    pub fn far_field(&self, interior: &Primitive, unit_normal: DVec2) -> Primitive {
        let gamma = self.gas.gamma;
        let g1 = gamma - 1.0;
        let inf = &self.freestream;

        let vn_i = interior.velocity.dot(unit_normal);
        let vn_inf = inf.velocity.dot(unit_normal);

        if vn_i - interior.sound_speed > 0.0 {
            // 超声速出流：全部外推
            return *interior;
        }
        if vn_inf + inf.sound_speed < 0.0 {
            // 超声速入流：全部给定
            return *inf;
        }

        // 亚声速: R⁺ 从内部、R⁻ 从自由流
        let r_plus = vn_i + 2.0 * interior.sound_speed / g1;
        let r_minus = vn_inf - 2.0 * inf.sound_speed / g1;
        let vn_b = 0.5 * (r_plus + r_minus);
        let c_b = (0.25 * g1 * (r_plus - r_minus)).max(1e-12);

        // 上风侧提供熵与切向速度
        let (entropy, v_tang) = if vn_b > 0.0 {
            // 出流
            (
                interior.pressure / interior.density.powf(gamma),
                interior.velocity - vn_i * unit_normal,
            )
        } else {
            (
                inf.pressure / inf.density.powf(gamma),
                inf.velocity - vn_inf * unit_normal,
            )
        };

        let density = (c_b * c_b / (gamma * entropy)).powf(1.0 / g1);
        let pressure = density * c_b * c_b / gamma;
        let velocity = v_tang + vn_b * unit_normal;

        self.gas
            .primitive_from_rho_vel_p(density, velocity, pressure, inf.eddy_viscosity)
    }

    /// 吹气入流状态（亚声速特征入流重构）
    ///
    /// 单一策略：密度取内部点当前状态，吹气速度 = 比例 × 自由流速度，
    /// 方向为内法向；外行 Riemann 不变量闭合声速与压力。
    /// 可选的吹气温度经配置给定（`Some` 时密度/能量由理想气体关系重算）。
    ///
    /// 返回 (入流状态, 是否强制全部状态行)。
    pub fn blowing_inlet(
        &self,
        interior: &Primitive,
        unit_normal: DVec2,
        blowing_ratio: f64,
        blowing_temperature: Option<f64>,
    ) -> (Primitive, bool) {
        let gamma = self.gas.gamma;
        let g1 = gamma - 1.0;

        let vel_mag = blowing_ratio * self.freestream.velocity.length();
        let flow_dir = -unit_normal; // 吹入计算域

        // 密度策略：内部点当前状态
        let mut density = interior.density;

        // 外行 Riemann 不变量（从内部外推）
        let riemann = 2.0 * interior.sound_speed / g1 + interior.velocity.dot(unit_normal);

        // 虚拟入流状态的声速: flow_dir·n̂ = −1
        let c_pre = riemann - vel_mag * flow_dir.dot(unit_normal);
        let c_b2 = {
            let half = (0.5 * g1 * c_pre).max(0.0);
            half * half
        };

        let pressure = c_b2 * density / gamma;
        let velocity = vel_mag * flow_dir;

        let impose_all = vel_mag > 0.0 && blowing_temperature.is_some();
        if impose_all {
            // 强制温度：密度由状态方程重算，压力保持特征重构值
            let t = blowing_temperature.unwrap();
            density = pressure / (self.gas.gas_constant * t);
        }

        let state = self.gas.primitive_from_rho_vel_p(
            density.max(1e-12),
            velocity,
            pressure.max(1e-12),
            self.freestream.eddy_viscosity,
        );
        (state, impose_all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calc() -> GhostStateCalculator {
        let gas = IdealGas::default();
        let freestream =
            gas.primitive_from_rho_vel_p(1.0, DVec2::new(100.0, 0.0), 101325.0, 0.0);
        GhostStateCalculator::new(gas, freestream)
    }

    #[test]
    fn test_mirror_reverses_normal_velocity() {
        let c = calc();
        let gas = IdealGas::default();
        let p = gas.primitive_from_rho_vel_p(1.0, DVec2::new(50.0, 30.0), 101325.0, 0.0);
        let ghost = c.mirror(&p, DVec2::X);
        assert!((ghost.velocity.x + 50.0).abs() < 1e-12);
        assert!((ghost.velocity.y - 30.0).abs() < 1e-12);
        assert!((ghost.pressure - p.pressure).abs() < 1e-9);
    }

    #[test]
    fn test_far_field_supersonic_outflow_extrapolates() {
        let c = calc();
        let gas = IdealGas::default();
        let p = gas.primitive_from_rho_vel_p(1.0, DVec2::new(800.0, 0.0), 101325.0, 0.0);
        let ghost = c.far_field(&p, DVec2::X);
        assert!((ghost.density - p.density).abs() < 1e-12);
        assert!((ghost.pressure - p.pressure).abs() < 1e-9);
    }

    #[test]
    fn test_far_field_supersonic_inflow_takes_freestream() {
        let gas = IdealGas::default();
        // 自由流超声速，左边界（外法向 −x）: vn_inf = −800 − c < 0
        let fast_inf = gas.primitive_from_rho_vel_p(1.0, DVec2::new(800.0, 0.0), 101325.0, 0.0);
        let c = GhostStateCalculator::new(gas, fast_inf);
        let p = gas.primitive_from_rho_vel_p(1.2, DVec2::new(100.0, 0.0), 90000.0, 0.0);
        let ghost = c.far_field(&p, -DVec2::X);
        assert!((ghost.density - fast_inf.density).abs() < 1e-12);
    }

    #[test]
    fn test_far_field_subsonic_preserves_riemann_invariant() {
        // 亚声速出流: R⁺ 在边界状态上保持
        let c = calc();
        let gas = IdealGas::default();
        let g1 = gas.gamma - 1.0;
        let p = gas.primitive_from_rho_vel_p(1.0, DVec2::new(50.0, 0.0), 101325.0, 0.0);
        let n = DVec2::X;
        let ghost = c.far_field(&p, n);

        let r_interior = p.velocity.dot(n) + 2.0 * p.sound_speed / g1;
        let r_ghost = ghost.velocity.dot(n) + 2.0 * ghost.sound_speed / g1;
        assert!(
            (r_interior - r_ghost).abs() < 1e-6 * r_interior.abs(),
            "R⁺ 内部 {} 边界 {}",
            r_interior,
            r_ghost
        );
    }

    #[test]
    fn test_blowing_inlet_direction_and_density_policy() {
        let c = calc();
        let gas = IdealGas::default();
        let interior = gas.primitive_from_rho_vel_p(1.3, DVec2::new(10.0, 0.0), 95000.0, 0.0);
        let (state, impose_all) = c.blowing_inlet(&interior, DVec2::X, 0.01, None);
        // 速度指向域内（−x）
        assert!(state.velocity.x < 0.0);
        assert!((state.velocity.length() - 0.01 * 100.0).abs() < 1e-9);
        // 密度策略: 取内部点
        assert!((state.density - 1.3).abs() < 1e-12);
        assert!(!impose_all);
    }

    #[test]
    fn test_blowing_inlet_imposed_temperature() {
        let c = calc();
        let gas = IdealGas::default();
        let interior = gas.primitive_from_rho_vel_p(1.0, DVec2::ZERO, 101325.0, 0.0);
        let (state, impose_all) = c.blowing_inlet(&interior, DVec2::X, 0.05, Some(400.0));
        assert!(impose_all);
        assert!((state.temperature - 400.0).abs() < 1e-6);
    }

    #[test]
    fn test_blowing_zero_ratio_keeps_weak_rows() {
        let c = calc();
        let gas = IdealGas::default();
        let interior = gas.primitive_from_rho_vel_p(1.0, DVec2::ZERO, 101325.0, 0.0);
        // 速度为零时即使给了温度也不强制全部行
        let (_, impose_all) = c.blowing_inlet(&interior, DVec2::X, 0.0, Some(400.0));
        assert!(!impose_all);
    }
}
