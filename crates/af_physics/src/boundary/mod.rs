// crates/af_physics/src/boundary/mod.rs

//! 边界条件
//!
//! 每个边界标记是一个状态机：处理器要么构造幽灵/外部状态并复用
//! 内部通量格式（弱施加），要么直接覆写残差行与 Jacobian 行
//! （强 Dirichlet 施加）。
//!
//! - [`types`]: `BoundaryKind` 枚举、标记条件、共轭传热耦合模式
//! - [`ghost`]: 远场特征重构 / 对称镜像 / 吹气入流状态
//! - [`dispatcher`]: 按标记分发的边界条件施加器
//! - [`wall_function`]: Nichols-Nelson 壁面函数 Newton 子迭代

pub mod dispatcher;
pub mod ghost;
pub mod types;
pub mod wall_function;

pub use dispatcher::BoundaryDispatcher;
pub use ghost::GhostStateCalculator;
pub use types::{BoundaryKind, ChtCouplingMode, ConjugateHeatData, MarkerCondition};
pub use wall_function::{WallFunctionCounters, WallFunctionSettings};
