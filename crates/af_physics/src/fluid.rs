// crates/af_physics/src/fluid.rs

//! 理想气体热力学与状态转换
//!
//! 守恒量 [rho, rho·u, rho·v, rho·E] 与原始量（压力、速度、温度、
//! 输运系数）之间的转换。非物理状态（负密度/压力/温度）的检测
//! 在此完成：转换失败返回 `None`，由调用方决定回退策略。

use glam::DVec2;

use crate::{FluxVector, N_VAR};

/// Sutherland 定律参考黏性 [Pa·s]
const SUTHERLAND_MU_REF: f64 = 1.716e-5;
/// Sutherland 定律参考温度 [K]
const SUTHERLAND_T_REF: f64 = 273.15;
/// Sutherland 常数 [K]
const SUTHERLAND_S: f64 = 110.4;

/// 理想气体模型
#[derive(Debug, Clone, Copy)]
pub struct IdealGas {
    /// 比热比
    pub gamma: f64,
    /// 气体常数 [J/(kg·K)]
    pub gas_constant: f64,
    /// 层流 Prandtl 数
    pub prandtl_lam: f64,
    /// 湍流 Prandtl 数
    pub prandtl_turb: f64,
}

impl Default for IdealGas {
    fn default() -> Self {
        Self {
            gamma: 1.4,
            gas_constant: 287.058,
            prandtl_lam: 0.72,
            prandtl_turb: 0.90,
        }
    }
}

impl IdealGas {
    /// 定压比热
    #[inline]
    pub fn cp(&self) -> f64 {
        self.gamma * self.gas_constant / (self.gamma - 1.0)
    }

    /// 定容比热
    #[inline]
    pub fn cv(&self) -> f64 {
        self.gas_constant / (self.gamma - 1.0)
    }

    /// Sutherland 定律层流黏性
    #[inline]
    pub fn sutherland_viscosity(&self, temperature: f64) -> f64 {
        let t = temperature.max(1.0);
        SUTHERLAND_MU_REF
            * (t / SUTHERLAND_T_REF).powf(1.5)
            * (SUTHERLAND_T_REF + SUTHERLAND_S)
            / (t + SUTHERLAND_S)
    }

    /// 由密度/速度/压力构造完整原始量
    ///
    /// 输入必须已通过正定性检查；声速平方在开方前钳制为非负，
    /// 保证合法物理输入不会产生 NaN。
    pub fn primitive_from_rho_vel_p(
        &self,
        density: f64,
        velocity: DVec2,
        pressure: f64,
        eddy_viscosity: f64,
    ) -> Primitive {
        let temperature = pressure / (density * self.gas_constant);
        let sound_speed = (self.gamma * pressure / density).max(0.0).sqrt();
        let energy = pressure / ((self.gamma - 1.0) * density) + 0.5 * velocity.length_squared();
        let enthalpy = energy + pressure / density;
        let laminar_viscosity = self.sutherland_viscosity(temperature);
        let thermal_conductivity = self.cp()
            * (laminar_viscosity / self.prandtl_lam + eddy_viscosity / self.prandtl_turb);

        Primitive {
            density,
            velocity,
            pressure,
            temperature,
            enthalpy,
            sound_speed,
            laminar_viscosity,
            eddy_viscosity,
            thermal_conductivity,
        }
    }

    /// 守恒量 → 原始量
    ///
    /// 负密度/压力/温度视为非物理状态，返回 `None`。
    pub fn primitive_from_conserved(
        &self,
        u: &Conserved,
        eddy_viscosity: f64,
    ) -> Option<Primitive> {
        if u.density <= 0.0 {
            return None;
        }
        let velocity = u.momentum / u.density;
        let pressure =
            (self.gamma - 1.0) * (u.energy - 0.5 * u.momentum.length_squared() / u.density);
        if pressure <= 0.0 {
            return None;
        }
        let temperature = pressure / (u.density * self.gas_constant);
        if temperature <= 0.0 {
            return None;
        }
        Some(self.primitive_from_rho_vel_p(u.density, velocity, pressure, eddy_viscosity))
    }

    /// 原始量 → 守恒量
    pub fn conserved_from_primitive(&self, p: &Primitive) -> Conserved {
        let energy = p.pressure / (self.gamma - 1.0)
            + 0.5 * p.density * p.velocity.length_squared();
        Conserved {
            density: p.density,
            momentum: p.density * p.velocity,
            energy,
        }
    }

    /// 温度对守恒量的偏导 ∂T/∂U
    ///
    /// T = (γ-1)/R · (U₃/U₀ - ½|U_m|²/U₀²)，用于能量方程的隐式线性化。
    pub fn temperature_jacobian(&self, u: &Conserved) -> FluxVector {
        let g1r = (self.gamma - 1.0) / self.gas_constant;
        let rho = u.density;
        let vel = u.momentum / rho;
        let energy_specific = u.energy / rho;
        [
            g1r / rho * (vel.length_squared() - energy_specific),
            -g1r * vel.x / rho,
            -g1r * vel.y / rho,
            g1r / rho,
        ]
    }
}

/// 守恒状态
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Conserved {
    /// 密度 rho
    pub density: f64,
    /// 动量 rho·v
    pub momentum: DVec2,
    /// 总能 rho·E
    pub energy: f64,
}

impl Conserved {
    /// 零状态
    pub const ZERO: Self = Self {
        density: 0.0,
        momentum: DVec2::ZERO,
        energy: 0.0,
    };

    /// 转换为数组（固定变量序: rho, rho·u, rho·v, rho·E）
    #[inline]
    pub fn to_array(self) -> FluxVector {
        [self.density, self.momentum.x, self.momentum.y, self.energy]
    }

    /// 从数组构造
    #[inline]
    pub fn from_array(a: FluxVector) -> Self {
        Self {
            density: a[0],
            momentum: DVec2::new(a[1], a[2]),
            energy: a[3],
        }
    }

    /// 叠加增量 u += s·d
    #[inline]
    pub fn add_scaled(&mut self, d: &FluxVector, s: f64) {
        self.density += s * d[0];
        self.momentum.x += s * d[1];
        self.momentum.y += s * d[2];
        self.energy += s * d[3];
    }

    /// 数值有效性检查
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.density.is_finite() && self.momentum.is_finite() && self.energy.is_finite()
    }
}

/// 原始状态（派生量缓存）
#[derive(Debug, Clone, Copy)]
pub struct Primitive {
    /// 密度
    pub density: f64,
    /// 速度
    pub velocity: DVec2,
    /// 压力
    pub pressure: f64,
    /// 温度
    pub temperature: f64,
    /// 总焓 H = E + p/rho
    pub enthalpy: f64,
    /// 声速
    pub sound_speed: f64,
    /// 层流黏性（Sutherland）
    pub laminar_viscosity: f64,
    /// 涡黏性（湍流闭合输入）
    pub eddy_viscosity: f64,
    /// 热导率
    pub thermal_conductivity: f64,
}

impl Primitive {
    /// 总黏性
    #[inline]
    pub fn total_viscosity(&self) -> f64 {
        self.laminar_viscosity + self.eddy_viscosity
    }

    /// 法向速度
    #[inline]
    pub fn normal_velocity(&self, unit_normal: DVec2) -> f64 {
        self.velocity.dot(unit_normal)
    }

    /// 谱半径 |v·n| + c
    #[inline]
    pub fn spectral_radius(&self, unit_normal: DVec2) -> f64 {
        self.normal_velocity(unit_normal).abs() + self.sound_speed
    }
}
