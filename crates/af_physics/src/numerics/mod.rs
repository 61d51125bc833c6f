// crates/af_physics/src/numerics/mod.rs

//! 数值格式模块
//!
//! - [`convective`]: 对流通量格式（Roe / HLLC / AUSM+ / Rusanov）
//! - [`viscous`]: 黏性通量与薄剪切层 Jacobian 近似
//! - [`gradient`]: Green-Gauss / 加权最小二乘梯度
//! - [`limiter`]: 斜率限制器（Venkatakrishnan / Barth-Jespersen）
//! - [`reconstruction`]: MUSCL 二阶重构
//! - [`linear_algebra`]: 块 CSR 矩阵、预条件器、BiCGStab

pub mod convective;
pub mod gradient;
pub mod limiter;
pub mod linear_algebra;
pub mod reconstruction;
pub mod viscous;
