// crates/af_config/src/solver_config.rs

//! SolverConfig - 求解器配置
//!
//! 所有参数用 JSON 序列化，带逐字段默认值。`validate()` 在构建
//! 求解器之前做一致性检查；违反项是致命配置错误，不会进入运行循环。

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use af_foundation::{AfError, AfResult};
use af_mesh::{generation, HaloExchange, MeshTopology};
use af_physics::boundary::{BoundaryKind, MarkerCondition, WallFunctionSettings};
use af_physics::fluid::IdealGas;
use af_physics::numerics::convective::ConvectiveSchemeKind;
use af_physics::numerics::gradient::GradientKind;
use af_physics::numerics::limiter::LimiterKind;
use af_physics::numerics::linear_algebra::SolverControl;
use af_physics::solver::{CflSettings, ImplicitDriver, SolverSetup};
use af_physics::turbulence::SourceKind;
use glam::DVec2;

use crate::error::ConfigError;

/// 求解器配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SolverConfig {
    /// 物理参数
    #[serde(default)]
    pub physics: PhysicsSection,

    /// 自由流状态
    #[serde(default)]
    pub freestream: FreestreamSection,

    /// 数值格式
    #[serde(default)]
    pub numerics: NumericsSection,

    /// 伪时间推进
    #[serde(default)]
    pub time: TimeSection,

    /// 线性求解器
    #[serde(default)]
    pub linear_solver: SolverControl,

    /// 壁面函数常数
    #[serde(default)]
    pub wall_function: WallFunctionSettings,

    /// 网格（结构化测试网格参数）
    #[serde(default)]
    pub mesh: MeshSection,

    /// 边界条件表
    #[serde(default)]
    pub markers: Vec<MarkerCondition>,

    /// 重启文件（存在则从中初始化）
    #[serde(default)]
    pub restart: Option<PathBuf>,

    /// 动网格
    #[serde(default)]
    pub dynamic_grid: bool,
}

/// 物理参数段
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhysicsSection {
    /// 比热比
    #[serde(default = "default_gamma")]
    pub gamma: f64,
    /// 气体常数 [J/(kg·K)]
    #[serde(default = "default_gas_constant")]
    pub gas_constant: f64,
    /// 层流 Prandtl 数
    #[serde(default = "default_prandtl_lam")]
    pub prandtl_lam: f64,
    /// 湍流 Prandtl 数
    #[serde(default = "default_prandtl_turb")]
    pub prandtl_turb: f64,
    /// 是否求解黏性项
    #[serde(default = "default_true")]
    pub viscous: bool,
    /// 湍流闭合
    #[serde(default)]
    pub turbulence: SourceKind,
}

fn default_gamma() -> f64 {
    1.4
}
fn default_gas_constant() -> f64 {
    287.058
}
fn default_prandtl_lam() -> f64 {
    0.72
}
fn default_prandtl_turb() -> f64 {
    0.90
}
fn default_true() -> bool {
    true
}

impl Default for PhysicsSection {
    fn default() -> Self {
        Self {
            gamma: default_gamma(),
            gas_constant: default_gas_constant(),
            prandtl_lam: default_prandtl_lam(),
            prandtl_turb: default_prandtl_turb(),
            viscous: true,
            turbulence: SourceKind::None,
        }
    }
}

/// 自由流状态段
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FreestreamSection {
    /// 密度 [kg/m³]
    #[serde(default = "default_density")]
    pub density: f64,
    /// 速度 [m/s]
    #[serde(default = "default_velocity")]
    pub velocity: [f64; 2],
    /// 压力 [Pa]
    #[serde(default = "default_pressure")]
    pub pressure: f64,
}

fn default_density() -> f64 {
    1.225
}
fn default_velocity() -> [f64; 2] {
    [50.0, 0.0]
}
fn default_pressure() -> f64 {
    101325.0
}

impl Default for FreestreamSection {
    fn default() -> Self {
        Self {
            density: default_density(),
            velocity: default_velocity(),
            pressure: default_pressure(),
        }
    }
}

/// 数值格式段
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NumericsSection {
    /// 对流格式
    #[serde(default)]
    pub convective_scheme: ConvectiveSchemeKind,
    /// 是否启用 MUSCL 二阶重构
    #[serde(default = "default_true")]
    pub muscl: bool,
    /// 限制器
    #[serde(default)]
    pub limiter: LimiterKind,
    /// 梯度方法
    #[serde(default)]
    pub gradient: GradientKind,
    /// Venkatakrishnan 常数 K
    #[serde(default = "default_venkat_k")]
    pub venkat_k: f64,
}

fn default_venkat_k() -> f64 {
    5.0
}

impl Default for NumericsSection {
    fn default() -> Self {
        Self {
            convective_scheme: ConvectiveSchemeKind::default(),
            muscl: true,
            limiter: LimiterKind::default(),
            gradient: GradientKind::default(),
            venkat_k: default_venkat_k(),
        }
    }
}

/// 伪时间推进段
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSection {
    /// CFL 自适应参数
    #[serde(default)]
    pub cfl: CflSettings,
    /// 外层迭代上限
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    /// 收敛阈值（RMS 残差）
    #[serde(default = "default_convergence_tol")]
    pub convergence_tol: f64,
}

fn default_max_iterations() -> usize {
    1000
}
fn default_convergence_tol() -> f64 {
    1e-10
}

impl Default for TimeSection {
    fn default() -> Self {
        Self {
            cfl: CflSettings::default(),
            max_iterations: default_max_iterations(),
            convergence_tol: default_convergence_tol(),
        }
    }
}

/// 网格段（结构化测试网格）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeshSection {
    /// x 方向点数
    #[serde(default = "default_nx")]
    pub nx: usize,
    /// y 方向点数
    #[serde(default = "default_ny")]
    pub ny: usize,
    /// 域长 [m]
    #[serde(default = "default_length")]
    pub length: f64,
    /// 域高 [m]
    #[serde(default = "default_height")]
    pub height: f64,
}

fn default_nx() -> usize {
    33
}
fn default_ny() -> usize {
    17
}
fn default_length() -> f64 {
    1.0
}
fn default_height() -> f64 {
    0.5
}

impl Default for MeshSection {
    fn default() -> Self {
        Self {
            nx: default_nx(),
            ny: default_ny(),
            length: default_length(),
            height: default_height(),
        }
    }
}

impl SolverConfig {
    /// 从文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: SolverConfig =
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// 保存配置到文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::Parse(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// 验证配置有效性
    ///
    /// 致命项: 自由流速度为零、非物理气体参数、CFL 带无效、
    /// 共轭传热标记缺少耦合模式。
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.physics.gamma <= 1.0 {
            return Err(ConfigError::invalid(
                "physics.gamma",
                self.physics.gamma,
                "比热比必须大于 1",
            ));
        }
        if self.physics.gas_constant <= 0.0 {
            return Err(ConfigError::invalid(
                "physics.gas_constant",
                self.physics.gas_constant,
                "气体常数必须为正",
            ));
        }

        let speed =
            (self.freestream.velocity[0].powi(2) + self.freestream.velocity[1].powi(2)).sqrt();
        if speed <= 0.0 {
            return Err(ConfigError::invalid(
                "freestream.velocity",
                format!("{:?}", self.freestream.velocity),
                "自由流速度不能为零（无量纲化基准）",
            ));
        }
        if self.freestream.density <= 0.0 || self.freestream.pressure <= 0.0 {
            return Err(ConfigError::invalid(
                "freestream",
                format!(
                    "rho={}, p={}",
                    self.freestream.density, self.freestream.pressure
                ),
                "自由流密度与压力必须为正",
            ));
        }

        let cfl = &self.time.cfl;
        if cfl.start <= 0.0 || cfl.min <= 0.0 || cfl.max < cfl.min {
            return Err(ConfigError::invalid(
                "time.cfl",
                format!("start={}, min={}, max={}", cfl.start, cfl.min, cfl.max),
                "CFL 带必须满足 0 < min ≤ max 且 start > 0",
            ));
        }

        if self.linear_solver.max_iter == 0 {
            return Err(ConfigError::invalid(
                "linear_solver.max_iter",
                self.linear_solver.max_iter,
                "线性求解迭代上限必须大于 0",
            ));
        }

        for m in &self.markers {
            if m.kind == BoundaryKind::ConjugateHeatInterface && m.cht_coupling.is_none() {
                return Err(ConfigError::invalid(
                    format!("markers.{}.cht_coupling", m.name),
                    "null",
                    "共轭传热界面必须给定耦合模式",
                ));
            }
        }

        if self.mesh.nx < 2 || self.mesh.ny < 2 {
            return Err(ConfigError::invalid(
                "mesh",
                format!("{}x{}", self.mesh.nx, self.mesh.ny),
                "网格每个方向至少 2 个点",
            ));
        }

        Ok(())
    }

    /// 气体模型
    pub fn gas(&self) -> IdealGas {
        IdealGas {
            gamma: self.physics.gamma,
            gas_constant: self.physics.gas_constant,
            prandtl_lam: self.physics.prandtl_lam,
            prandtl_turb: self.physics.prandtl_turb,
        }
    }

    /// 生成结构化网格
    pub fn build_mesh(&self) -> AfResult<MeshTopology> {
        generation::cartesian(
            self.mesh.nx,
            self.mesh.ny,
            self.mesh.length,
            self.mesh.height,
        )
    }

    /// 构建隐式驱动器（配置中有重启文件时从中初始化）
    pub fn build_driver(
        &self,
        mesh: Arc<MeshTopology>,
        halo: Box<dyn HaloExchange>,
    ) -> AfResult<ImplicitDriver> {
        self.validate()
            .map_err(|e| AfError::config(e.to_string()))?;

        let gas = self.gas();
        let freestream = gas.primitive_from_rho_vel_p(
            self.freestream.density,
            DVec2::new(self.freestream.velocity[0], self.freestream.velocity[1]),
            self.freestream.pressure,
            0.0,
        );

        let setup = SolverSetup {
            scheme: self.numerics.convective_scheme,
            viscous: self.physics.viscous,
            muscl: self.numerics.muscl,
            limiter: self.numerics.limiter,
            gradient: self.numerics.gradient,
            venkat_k: self.numerics.venkat_k,
            turbulence: self.physics.turbulence,
            markers: self.markers.clone(),
            linear: self.linear_solver,
            cfl: self.time.cfl,
            wall_function: self.wall_function,
            max_iterations: self.time.max_iterations,
            convergence_tol: self.time.convergence_tol,
            dynamic_grid: self.dynamic_grid,
        };

        let mut driver = ImplicitDriver::new(mesh, gas, freestream, setup, halo)?;
        if let Some(path) = &self.restart {
            driver.load_restart(path)?;
        }
        Ok(driver)
    }
}
