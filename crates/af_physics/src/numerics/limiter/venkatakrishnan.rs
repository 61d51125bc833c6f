// crates/af_physics/src/numerics/limiter/venkatakrishnan.rs

//! Venkatakrishnan 限制器
//!
//! 光滑可微的限制函数，ε² = (K·h)³ 控制在光滑区域的激活程度：
//! K 越大限制越弱、收敛越快，但单调性越松。

use super::{LimiterContext, SlopeLimiter};

/// Venkatakrishnan 限制器
#[derive(Debug, Clone, Copy)]
pub struct VenkatakrishnanLimiter {
    eps2: f64,
}

impl VenkatakrishnanLimiter {
    /// 创建限制器
    ///
    /// # 参数
    /// - `k`: 常数 K（典型值 0.3 ~ 5）
    /// - `mesh_scale`: 网格特征尺度 h
    pub fn new(k: f64, mesh_scale: f64) -> Self {
        let kh = k * mesh_scale;
        Self {
            eps2: (kh * kh * kh).max(1e-30),
        }
    }

    /// 光滑限制函数 φ(Δ, d) = (Δ² + ε² + 2Δd) / (Δ² + 2d² + Δd + ε²)
    #[inline]
    fn smooth(delta: f64, d: f64, eps2: f64) -> f64 {
        let num = delta * delta + eps2 + 2.0 * delta * d;
        let den = delta * delta + 2.0 * d * d + delta * d + eps2;
        (num / den).clamp(0.0, 1.0)
    }
}

impl SlopeLimiter for VenkatakrishnanLimiter {
    fn name(&self) -> &'static str {
        "Venkatakrishnan"
    }

    fn limit(&self, ctx: &LimiterContext) -> f64 {
        let eps2 = if ctx.eps2 > 0.0 { ctx.eps2 } else { self.eps2 };
        if ctx.projection > 0.0 {
            Self::smooth(ctx.delta_max, ctx.projection, eps2)
        } else if ctx.projection < 0.0 {
            Self::smooth(ctx.delta_min, ctx.projection, eps2)
        } else {
            1.0
        }
    }
}
