// crates/af_physics/src/numerics/limiter/mod.rs

//! 斜率限制器
//!
//! 限制 MUSCL 梯度外推，防止在面上产生新的极值（单调性保持）。
//! 限制因子 ψ ∈ [0, 1] 按点按场计算，取所有关联边投影的最小值。

mod barth_jespersen;
mod venkatakrishnan;

pub use barth_jespersen::BarthJespersenLimiter;
pub use venkatakrishnan::VenkatakrishnanLimiter;

use serde::{Deserialize, Serialize};

/// 限制器类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LimiterKind {
    /// 不限制（ψ ≡ 1）
    None,
    /// Venkatakrishnan（光滑，收敛性好）
    #[default]
    Venkatakrishnan,
    /// Barth-Jespersen（严格单调，非光滑）
    BarthJespersen,
}

/// 限制器计算上下文
///
/// 单条边投影的限制输入：
/// - `delta_max`/`delta_min`: 邻域极值与本点值之差
/// - `projection`: 梯度在点心→边中点向量上的投影 ∇φ·dr
#[derive(Debug, Clone, Copy)]
pub struct LimiterContext {
    /// max_j(φ_j) − φ_i（≥ 0）
    pub delta_max: f64,
    /// min_j(φ_j) − φ_i（≤ 0）
    pub delta_min: f64,
    /// 梯度投影 ∇φ·dr
    pub projection: f64,
    /// Venkatakrishnan 光滑参数 ε²
    pub eps2: f64,
}

/// 斜率限制器 trait
pub trait SlopeLimiter: Send + Sync {
    /// 限制器名称
    fn name(&self) -> &'static str;

    /// 单条边投影的限制因子 ψ ∈ [0, 1]
    fn limit(&self, ctx: &LimiterContext) -> f64;
}

/// 无限制器
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLimiter;

impl SlopeLimiter for NoLimiter {
    fn name(&self) -> &'static str {
        "None"
    }

    fn limit(&self, _ctx: &LimiterContext) -> f64 {
        1.0
    }
}

/// 按配置创建限制器
///
/// # 参数
/// - `venkat_k`: Venkatakrishnan 常数 K
/// - `mesh_scale`: 网格特征尺度 h（ε² = (K·h)³）
pub fn create_limiter(kind: LimiterKind, venkat_k: f64, mesh_scale: f64) -> Box<dyn SlopeLimiter> {
    match kind {
        LimiterKind::None => Box::new(NoLimiter),
        LimiterKind::Venkatakrishnan => {
            Box::new(VenkatakrishnanLimiter::new(venkat_k, mesh_scale))
        }
        LimiterKind::BarthJespersen => Box::new(BarthJespersenLimiter),
    }
}
