// crates/af_physics/src/solver/mod.rs

//! 非线性/线性求解驱动
//!
//! - [`cfl`]: 逐点 CFL 自适应控制器与局部伪时间步
//! - [`diagnostics`]: 收敛历史与诊断计数器
//! - [`driver`]: 隐式伪时间推进驱动器（外层 Newton 循环）

pub mod cfl;
pub mod diagnostics;
pub mod driver;

pub use cfl::{CflController, CflSettings};
pub use diagnostics::{ConvergenceHistory, IterationRecord};
pub use driver::{ImplicitDriver, RunReport, RunStatus, SolverSetup};
