// crates/af_physics/src/solver/cfl.rs

//! CFL 自适应与局部伪时间步
//!
//! 每个外层迭代后按残差走向缩放逐点 CFL 数：残差下降则乘
//! `factor_up`，上升/发散则乘 `factor_down`，始终钳制在
//! `[min, max]` 带内。逐点伪时间步由谱半径求和得到。

use af_mesh::MeshTopology;
use serde::{Deserialize, Serialize};

use crate::state::FlowField;

/// CFL 自适应配置
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CflSettings {
    /// 初始 CFL
    pub start: f64,
    /// 下限
    pub min: f64,
    /// 上限
    pub max: f64,
    /// 残差下降时的放大系数
    pub factor_up: f64,
    /// 残差上升时的缩小系数
    pub factor_down: f64,
}

impl Default for CflSettings {
    fn default() -> Self {
        Self {
            start: 5.0,
            min: 0.5,
            max: 1e4,
            factor_up: 1.2,
            factor_down: 0.5,
        }
    }
}

/// 逐点 CFL 控制器
#[derive(Debug, Clone)]
pub struct CflController {
    settings: CflSettings,
    values: Vec<f64>,
    last_norm: Option<f64>,
}

impl CflController {
    /// 创建控制器
    pub fn new(settings: CflSettings, n_points: usize) -> Self {
        Self {
            settings,
            values: vec![settings.start; n_points],
            last_norm: None,
        }
    }

    /// 逐点 CFL 值
    #[inline]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// 平均 CFL（诊断输出）
    pub fn mean(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        self.values.iter().sum::<f64>() / self.values.len() as f64
    }

    /// 按残差范数自适应
    ///
    /// 残差下降（或首个迭代）→ 放大；上升或非有限 → 缩小。
    pub fn adapt(&mut self, residual_norm: f64) {
        let factor = match self.last_norm {
            Some(prev) if !residual_norm.is_finite() || residual_norm > prev => {
                self.settings.factor_down
            }
            Some(_) => self.settings.factor_up,
            None => 1.0,
        };
        for v in &mut self.values {
            *v = (*v * factor).clamp(self.settings.min, self.settings.max);
        }
        if residual_norm.is_finite() {
            self.last_norm = Some(residual_norm);
        }
    }

    /// 逐点局部伪时间步
    ///
    /// Δt_i = CFL_i·Ω_i / Σ(|v·n̂|+c)·A，求和覆盖关联边与边界面。
    pub fn local_time_steps(&self, mesh: &MeshTopology, field: &FlowField) -> Vec<f64> {
        let n = mesh.n_points();
        let mut lambda_sum = vec![0.0f64; n];

        for e in mesh.edges() {
            let nh = e.unit_normal();
            let area = e.area();
            let li = field.primitive(e.i).spectral_radius(nh) * area;
            let lj = field.primitive(e.j).spectral_radius(nh) * area;
            lambda_sum[e.i] += 0.5 * (li + lj);
            lambda_sum[e.j] += 0.5 * (li + lj);
        }
        for m in mesh.markers() {
            for v in &m.vertices {
                let nh = v.unit_normal();
                lambda_sum[v.point] +=
                    field.primitive(v.point).spectral_radius(nh) * v.area();
            }
        }

        (0..n)
            .map(|i| {
                let vol = mesh.point(i).volume;
                self.values[i] * vol / lambda_sum[i].max(1e-30)
            })
            .collect()
    }
}
