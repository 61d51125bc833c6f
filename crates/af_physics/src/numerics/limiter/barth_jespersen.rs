// crates/af_physics/src/numerics/limiter/barth_jespersen.rs

//! Barth-Jespersen 限制器
//!
//! 严格单调：重构值不超出邻域极值。非光滑（min/max 运算），
//! 可能阻碍深度收敛，换取最强的保单调性。

use super::{LimiterContext, SlopeLimiter};

/// Barth-Jespersen 限制器
#[derive(Debug, Clone, Copy, Default)]
pub struct BarthJespersenLimiter;

impl SlopeLimiter for BarthJespersenLimiter {
    fn name(&self) -> &'static str {
        "BarthJespersen"
    }

    fn limit(&self, ctx: &LimiterContext) -> f64 {
        let d = ctx.projection;
        if d > 1e-30 {
            (ctx.delta_max / d).min(1.0).max(0.0)
        } else if d < -1e-30 {
            (ctx.delta_min / d).min(1.0).max(0.0)
        } else {
            1.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_within_bounds_unrestricted() {
        let lim = BarthJespersenLimiter;
        let ctx = LimiterContext {
            delta_max: 1.0,
            delta_min: -1.0,
            projection: 0.5,
            eps2: 0.0,
        };
        assert!((lim.limit(&ctx) - 1.0).abs() < 1e-14);
    }

    #[test]
    fn test_overshoot_clipped_exactly() {
        // 投影 2 倍于允许差 → ψ = 0.5，重构值恰好落在邻域极值上
        let lim = BarthJespersenLimiter;
        let ctx = LimiterContext {
            delta_max: 1.0,
            delta_min: -1.0,
            projection: 2.0,
            eps2: 0.0,
        };
        assert!((lim.limit(&ctx) - 0.5).abs() < 1e-14);
    }

    #[test]
    fn test_local_extremum_fully_limited() {
        // 本点是局部极大（delta_max = 0）且外推为正 → ψ = 0
        let lim = BarthJespersenLimiter;
        let ctx = LimiterContext {
            delta_max: 0.0,
            delta_min: -2.0,
            projection: 1.0,
            eps2: 0.0,
        };
        assert!(lim.limit(&ctx).abs() < 1e-14);
    }
}
