// crates/af_physics/src/assembly/mod.rs

//! 残差/Jacobian 装配
//!
//! - [`residual`]: 全局残差向量（每点一个块）
//! - [`atomic`]: 原子 f64 累加器（显式路径的并行散布）
//! - [`sweep`]: 边遍历装配循环（着色批次并行计算 + 有序串行散布）

pub mod atomic;
pub mod residual;
pub mod sweep;

pub use atomic::AtomicResidual;
pub use residual::Residual;
pub use sweep::EdgeSweep;
