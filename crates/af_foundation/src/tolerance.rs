// crates/af_foundation/src/tolerance.rs

//! 数值容差配置
//!
//! 集中管理求解器中的各类阈值，避免魔法数散落在各处。

/// 数值容差集合
#[derive(Debug, Clone, Copy)]
pub struct Tolerance {
    /// 通用浮点比较容差
    pub eps: f64,
    /// 密度/压力下限（低于此值视为非物理状态）
    pub positivity: f64,
    /// 距离下限（避免零距离除法）
    pub min_distance: f64,
    /// 迭代停滞判据
    pub stagnation: f64,
}

impl Tolerance {
    /// 创建自定义容差
    pub fn new(eps: f64) -> Self {
        Self {
            eps,
            ..Self::default()
        }
    }

    /// 两值是否在容差内相等
    #[inline]
    pub fn approx_eq(&self, a: f64, b: f64) -> bool {
        (a - b).abs() <= self.eps * a.abs().max(b.abs()).max(1.0)
    }

    /// 值是否满足正定性要求
    #[inline]
    pub fn is_positive(&self, value: f64) -> bool {
        value > self.positivity
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self {
            eps: 1e-12,
            positivity: 1e-30,
            min_distance: 1e-14,
            stagnation: 1e-30,
        }
    }
}
