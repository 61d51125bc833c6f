// crates/af_physics/src/lib.rs

//! AeroFlux Physics Layer (Layer 3)
//!
//! 边基有限体积可压缩流求解核心：
//!
//! - [`fluid`]: 理想气体热力学、守恒量/原始量转换
//! - [`state`]: 逐点状态存储（工作解、旧解快照、原始量缓存）
//! - [`numerics`]: 对流/黏性通量格式、梯度、限制器、MUSCL 重构、块稀疏线性代数
//! - [`assembly`]: 边遍历残差/Jacobian 装配
//! - [`boundary`]: 边界条件分发器与壁面函数
//! - [`turbulence`]: 湍流工作变量输运与源项闭合
//! - [`solver`]: 隐式伪时间推进驱动器、CFL 自适应、收敛诊断
//! - [`restart`]: 重启快照读写
//!
//! # 设计要点
//!
//! 通量计算是纯函数（无隐藏全局状态），按值返回通量与可选的 Jacobian 块，
//! 不返回指向求解器内部存储的指针。并行装配采用"着色批次并行计算 +
//! 有序串行散布"的纪律，保证固定网格与状态下结果确定。

#![warn(clippy::all)]

pub mod assembly;
pub mod boundary;
pub mod fluid;
pub mod numerics;
pub mod restart;
pub mod solver;
pub mod state;
pub mod turbulence;

/// 每点状态变量数: [rho, rho·u, rho·v, rho·E]
pub const N_VAR: usize = 4;

/// 通量/残差块
pub type FluxVector = [f64; N_VAR];

/// Jacobian 块（行优先）
pub type JacobianBlock = [[f64; N_VAR]; N_VAR];

/// 零通量块
pub const ZERO_FLUX: FluxVector = [0.0; N_VAR];

/// 零 Jacobian 块
pub const ZERO_BLOCK: JacobianBlock = [[0.0; N_VAR]; N_VAR];

pub use fluid::{Conserved, IdealGas, Primitive};
pub use state::FlowField;
