// crates/af_physics/src/solver/diagnostics.rs

//! 收敛历史与诊断
//!
//! 数值类问题（非物理点、线性求解未收敛、壁面函数未收敛）是
//! 诊断而非错误：逐迭代记录、全局归约后在报告进程上输出一次，
//! 运行永不因此中止。

use crate::boundary::wall_function::WallFunctionCounters;
use crate::{FluxVector, N_VAR};

/// 单个外层迭代的记录
#[derive(Debug, Clone, Copy)]
pub struct IterationRecord {
    /// 迭代序号
    pub iteration: usize,
    /// 每个方程的 RMS 残差
    pub rms: FluxVector,
    /// 最大残差分量
    pub max_residual: f64,
    /// 线性求解迭代数
    pub linear_iterations: usize,
    /// 线性求解是否收敛
    pub linear_converged: bool,
    /// 非物理点计数（全局归约后）
    pub non_physical_points: u64,
    /// 壁面函数计数器（全局归约后）
    pub wall_function: WallFunctionCounters,
    /// 平均 CFL
    pub cfl_mean: f64,
}

impl IterationRecord {
    /// 密度方程残差的 log10（收敛历史惯用标度）
    pub fn log_density_residual(&self) -> f64 {
        self.rms[0].max(1e-300).log10()
    }

    /// RMS 残差的最大分量
    pub fn rms_max(&self) -> f64 {
        self.rms.iter().fold(0.0f64, |acc, &v| acc.max(v))
    }
}

/// 收敛历史
#[derive(Debug, Clone, Default)]
pub struct ConvergenceHistory {
    records: Vec<IterationRecord>,
    /// 线性求解到达迭代上限的累计次数
    pub linear_cap_hits: u64,
}

impl ConvergenceHistory {
    /// 创建空历史
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加记录
    pub fn push(&mut self, record: IterationRecord) {
        if !record.linear_converged {
            self.linear_cap_hits += 1;
        }
        self.records.push(record);
    }

    /// 所有记录
    #[inline]
    pub fn records(&self) -> &[IterationRecord] {
        &self.records
    }

    /// 最后一条记录
    pub fn last(&self) -> Option<&IterationRecord> {
        self.records.last()
    }

    /// 迭代数
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// 残差相对初始值的下降量级（log10）
    pub fn orders_reduced(&self) -> f64 {
        match (self.records.first(), self.records.last()) {
            (Some(first), Some(last)) => {
                first.log_density_residual() - last.log_density_residual()
            }
            _ => 0.0,
        }
    }

    /// 写成 CSV 行（诊断输出接口）
    pub fn to_csv(&self) -> String {
        let mut out = String::from(
            "iteration,rms_density,rms_momentum_x,rms_momentum_y,rms_energy,\
             linear_iterations,non_physical,wf_not_converged,wf_below_threshold,cfl_mean\n",
        );
        for r in &self.records {
            out.push_str(&format!(
                "{},{:.6e},{:.6e},{:.6e},{:.6e},{},{},{},{},{:.3}\n",
                r.iteration,
                r.rms[0],
                r.rms[1],
                r.rms[2],
                r.rms[N_VAR - 1],
                r.linear_iterations,
                r.non_physical_points,
                r.wall_function.not_converged,
                r.wall_function.below_threshold,
                r.cfl_mean,
            ));
        }
        out
    }
}
