// crates/af_physics/src/solver/driver.rs

//! 隐式伪时间推进驱动器
//!
//! 外层循环状态机:
//! Preprocessing → ResidualAssembly → BoundaryConditions →
//! LinearSolve → Update → ConvergenceCheck，直到残差低于阈值
//! （Converged）或到达迭代上限（IterationLimitReached，不是错误——
//! 调用方可以接受最后一个迭代解）。
//!
//! 每个迭代求解 (V/Δt·I + ∂R/∂U)·ΔU = −R(U)，更新 U = U_old + ΔU。
//! 强边界行的 ΔU 为零，强制值经 `solution_old` 传递。

use std::sync::Arc;

use af_foundation::{AfError, AfResult};
use af_mesh::{HaloExchange, MeshTopology};
use glam::DVec2;

use crate::assembly::{EdgeSweep, Residual};
use crate::boundary::wall_function::{
    update_wall_functions, WallFunctionCounters, WallFunctionSettings,
};
use crate::boundary::{BoundaryDispatcher, MarkerCondition};
use crate::fluid::{IdealGas, Primitive};
use crate::numerics::convective::ConvectiveSchemeKind;
use crate::numerics::gradient::{compute_gradients, GradientKind, GradientStorage};
use crate::numerics::limiter::LimiterKind;
use crate::numerics::linear_algebra::{
    BiCgStab, BlockCsrMatrix, BlockJacobiPreconditioner, Preconditioner, SolverControl,
};
use crate::restart;
use crate::state::FlowField;
use crate::turbulence::{ScalarTransport, SourceKind};
use crate::N_VAR;

use super::cfl::{CflController, CflSettings};
use super::diagnostics::{ConvergenceHistory, IterationRecord};

/// 求解器装配配置
#[derive(Debug, Clone)]
pub struct SolverSetup {
    /// 对流格式
    pub scheme: ConvectiveSchemeKind,
    /// 是否计算黏性通量
    pub viscous: bool,
    /// 是否启用 MUSCL 二阶重构
    pub muscl: bool,
    /// 限制器
    pub limiter: LimiterKind,
    /// 梯度方法
    pub gradient: GradientKind,
    /// Venkatakrishnan 常数
    pub venkat_k: f64,
    /// 湍流源项闭合
    pub turbulence: SourceKind,
    /// 边界条件表
    pub markers: Vec<MarkerCondition>,
    /// 线性求解配置
    pub linear: SolverControl,
    /// CFL 自适应配置
    pub cfl: CflSettings,
    /// 壁面函数常数
    pub wall_function: WallFunctionSettings,
    /// 外层迭代上限
    pub max_iterations: usize,
    /// 收敛阈值（RMS 残差）
    pub convergence_tol: f64,
    /// 动网格
    pub dynamic_grid: bool,
}

impl Default for SolverSetup {
    fn default() -> Self {
        Self {
            scheme: ConvectiveSchemeKind::Roe,
            viscous: true,
            muscl: true,
            limiter: LimiterKind::Venkatakrishnan,
            gradient: GradientKind::GreenGauss,
            venkat_k: 5.0,
            turbulence: SourceKind::None,
            markers: Vec::new(),
            linear: SolverControl::default(),
            cfl: CflSettings::default(),
            wall_function: WallFunctionSettings::default(),
            max_iterations: 1000,
            convergence_tol: 1e-10,
            dynamic_grid: false,
        }
    }
}

/// 外层循环终止状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// 残差低于阈值
    Converged,
    /// 到达迭代上限（调用方可接受最后迭代）
    IterationLimitReached,
}

/// 运行结果摘要
#[derive(Debug, Clone)]
pub struct RunReport {
    /// 终止状态
    pub status: RunStatus,
    /// 完成的外层迭代数
    pub iterations: usize,
    /// 最终 RMS 残差
    pub final_rms: [f64; N_VAR],
}

/// 隐式驱动器
pub struct ImplicitDriver {
    mesh: Arc<MeshTopology>,
    gas: IdealGas,
    field: FlowField,
    grads: GradientStorage,
    sweep: EdgeSweep,
    dispatcher: BoundaryDispatcher,
    jacobian: BlockCsrMatrix,
    residual: Residual,
    rhs: Vec<f64>,
    delta: Vec<f64>,
    linear: BiCgStab,
    precond: BlockJacobiPreconditioner,
    cfl: CflController,
    turbulence: Option<ScalarTransport>,
    halo: Box<dyn HaloExchange>,
    gradient_kind: GradientKind,
    wall_function: WallFunctionSettings,
    max_iterations: usize,
    convergence_tol: f64,
    history: ConvergenceHistory,
}

impl ImplicitDriver {
    /// 构建驱动器
    ///
    /// 自由流速度为零是致命配置错误（无量纲化基准）。
    pub fn new(
        mesh: Arc<MeshTopology>,
        gas: IdealGas,
        freestream: Primitive,
        setup: SolverSetup,
        halo: Box<dyn HaloExchange>,
    ) -> AfResult<Self> {
        if freestream.velocity.length() <= 0.0 {
            return Err(AfError::config(
                "自由流速度为零，无法用于无量纲化基准",
            ));
        }

        let n = mesh.n_points();
        let field = FlowField::uniform(gas, n, freestream);
        let sweep = EdgeSweep::new(
            &mesh,
            gas,
            setup.scheme,
            setup.viscous,
            setup.muscl,
            setup.limiter,
            setup.venkat_k,
        );
        let dispatcher = BoundaryDispatcher::new(
            &mesh,
            gas,
            freestream,
            &setup.markers,
            setup.scheme,
            setup.dynamic_grid,
        )?;
        let jacobian = BlockCsrMatrix::from_adjacency(n, mesh.adjacency());
        let precond = BlockJacobiPreconditioner::from_matrix(&jacobian);

        let turbulence = match setup.turbulence {
            SourceKind::None => None,
            kind => {
                let wall_distance = wall_distances(&mesh, &setup.markers);
                // 自由流工作变量: 3ν（标准 SA 远场值）
                let nu_inf = 3.0 * freestream.laminar_viscosity / freestream.density;
                Some(ScalarTransport::new(kind, wall_distance, nu_inf))
            }
        };

        let driver = Self {
            mesh,
            gas,
            field,
            grads: GradientStorage::new(n),
            sweep,
            dispatcher,
            jacobian,
            residual: Residual::new(n),
            rhs: vec![0.0; n * N_VAR],
            delta: vec![0.0; n * N_VAR],
            linear: BiCgStab::new(setup.linear),
            precond,
            cfl: CflController::new(setup.cfl, n),
            turbulence,
            halo,
            gradient_kind: setup.gradient,
            wall_function: setup.wall_function,
            max_iterations: setup.max_iterations,
            convergence_tol: setup.convergence_tol,
            history: ConvergenceHistory::new(),
        };
        Ok(driver)
    }

    /// 流场状态
    pub fn field(&self) -> &FlowField {
        &self.field
    }

    /// 可变流场状态（初始化/测试用）
    pub fn field_mut(&mut self) -> &mut FlowField {
        &mut self.field
    }

    /// 边界分发器（共轭数据注入等）
    pub fn dispatcher_mut(&mut self) -> &mut BoundaryDispatcher {
        &mut self.dispatcher
    }

    /// 网格
    pub fn mesh(&self) -> &MeshTopology {
        &self.mesh
    }

    /// 收敛历史
    pub fn history(&self) -> &ConvergenceHistory {
        &self.history
    }

    /// 从重启文件载入守恒量
    pub fn load_restart(&mut self, path: &std::path::Path) -> AfResult<()> {
        let snapshot = restart::load(path, self.mesh.n_points())?;
        for (i, u) in snapshot.into_iter().enumerate() {
            self.field.set_conserved(i, u);
        }
        self.field.set_primitive_variables();
        Ok(())
    }

    /// 写出重启文件
    pub fn save_restart(&self, path: &std::path::Path) -> AfResult<()> {
        restart::save(path, &self.field)
    }

    /// 只做一次显式残差评估（预处理 + 内部装配 + 边界条件）
    ///
    /// 不触碰 Jacobian/线性求解；用于诊断与守恒性验证。
    pub fn evaluate_residual(&mut self) -> AfResult<&Residual> {
        self.field.set_primitive_variables();
        compute_gradients(self.gradient_kind, &self.mesh, &self.field, &mut self.grads);
        self.field.snapshot_old();
        self.residual.reset();
        self.sweep.assemble(
            self.mesh.as_ref(),
            &self.field,
            &self.grads,
            &mut self.residual,
            None,
            false,
        );
        self.dispatcher.apply(
            self.mesh.as_ref(),
            &mut self.field,
            &self.grads,
            &mut self.residual,
            None,
        )?;
        Ok(&self.residual)
    }

    /// 单个外层迭代
    pub fn iterate(&mut self, iteration: usize) -> AfResult<IterationRecord> {
        // --- Preprocessing ---
        let non_physical_local = self.field.set_primitive_variables() as u64;
        let non_physical = self.halo.reduce_sum_u64(non_physical_local);

        compute_gradients(self.gradient_kind, &self.mesh, &self.field, &mut self.grads);

        let dt = self.cfl.local_time_steps(&self.mesh, &self.field);

        if let Some(turb) = self.turbulence.as_mut() {
            turb.advance(self.mesh.as_ref(), &mut self.field, &self.grads, &dt);
        }

        let wf_markers = self.dispatcher.wall_function_markers();
        let wf_local = if wf_markers.is_empty() {
            WallFunctionCounters::default()
        } else {
            update_wall_functions(
                self.mesh.as_ref(),
                &mut self.field,
                &self.grads,
                &wf_markers,
                &self.wall_function,
                &self.gas,
            )
        };
        let wall_function = WallFunctionCounters {
            not_converged: self.halo.reduce_sum_u64(wf_local.not_converged),
            below_threshold: self.halo.reduce_sum_u64(wf_local.below_threshold),
        };

        self.field.snapshot_old();

        // --- ResidualAssembly ---
        self.residual.reset();
        self.jacobian.set_zero();
        self.sweep.assemble(
            self.mesh.as_ref(),
            &self.field,
            &self.grads,
            &mut self.residual,
            Some(&mut self.jacobian),
            true,
        );

        // 伪时间项 V/Δt（在边界行覆写之前加入）
        for i in 0..self.mesh.n_points() {
            let vol = self.mesh.point(i).volume;
            self.jacobian.add_scalar_to_diag(i, vol / dt[i].max(1e-30));
        }

        // --- BoundaryConditions ---
        self.dispatcher.apply(
            self.mesh.as_ref(),
            &mut self.field,
            &self.grads,
            &mut self.residual,
            Some(&mut self.jacobian),
        )?;

        // --- LinearSolve ---
        self.precond.update(&self.jacobian);
        self.residual.negate_into(&mut self.rhs);
        self.delta.fill(0.0);
        let lin = self
            .linear
            .solve(&self.jacobian, &self.rhs, &mut self.delta, &self.precond);
        if !lin.is_converged() {
            log::debug!(
                "线性求解未达容差: {:?} 迭代 {} 残差 {:.3e}（解仍被采用）",
                lin.status,
                lin.iterations,
                lin.residual_norm
            );
        }

        // --- Update ---
        self.field.update_from_old(&self.delta);
        let mut flat = self.field.conserved_flat();
        self.halo
            .exchange_point_field("conserved", N_VAR, &mut flat)?;
        self.field.load_conserved_flat(&flat);

        // --- ConvergenceCheck ---
        let rms = self.residual.rms_norms();
        let record = IterationRecord {
            iteration,
            rms,
            max_residual: self.residual.max_norm(),
            linear_iterations: lin.iterations,
            linear_converged: lin.is_converged(),
            non_physical_points: non_physical,
            wall_function,
            cfl_mean: self.cfl.mean(),
        };
        self.cfl.adapt(record.rms_max());

        if self.halo.is_master() {
            log::info!(
                "iter {:4}  log10(res) {:7.3}  lin {:3}  cfl {:8.1}  nonphys {}",
                iteration,
                record.log_density_residual(),
                record.linear_iterations,
                record.cfl_mean,
                record.non_physical_points,
            );
            if wall_function.not_converged > 0 {
                log::warn!(
                    "壁面函数在 {} 个顶点未收敛",
                    wall_function.not_converged
                );
            }
            if wall_function.below_threshold > 0 {
                log::debug!(
                    "{} 个顶点 y+ 低于阈值，壁面函数未激活",
                    wall_function.below_threshold
                );
            }
        }

        self.history.push(record);
        Ok(record)
    }

    /// 运行到收敛或迭代上限
    pub fn run(&mut self) -> AfResult<RunReport> {
        let mut final_rms = [0.0; N_VAR];
        for iteration in 0..self.max_iterations {
            let record = self.iterate(iteration)?;
            final_rms = record.rms;
            if record.rms_max() < self.convergence_tol {
                if self.halo.is_master() {
                    log::info!("在 {} 次迭代后收敛", iteration + 1);
                }
                return Ok(RunReport {
                    status: RunStatus::Converged,
                    iterations: iteration + 1,
                    final_rms,
                });
            }
        }
        if self.halo.is_master() {
            log::info!("到达迭代上限 {}（接受最后迭代解）", self.max_iterations);
        }
        Ok(RunReport {
            status: RunStatus::IterationLimitReached,
            iterations: self.max_iterations,
            final_rms,
        })
    }
}

/// 逐点到最近黏性壁标记顶点的距离
fn wall_distances(mesh: &MeshTopology, markers: &[MarkerCondition]) -> Vec<f64> {
    let mut wall_points: Vec<DVec2> = Vec::new();
    for cond in markers {
        if cond.kind.is_viscous_wall() {
            if let Some(marker) = mesh.marker(&cond.name) {
                for v in &marker.vertices {
                    wall_points.push(mesh.point(v.point).coord);
                }
            }
        }
    }
    if wall_points.is_empty() {
        return vec![1e10; mesh.n_points()];
    }
    (0..mesh.n_points())
        .map(|i| {
            let x = mesh.point(i).coord;
            wall_points
                .iter()
                .map(|&w| (x - w).length())
                .fold(f64::INFINITY, f64::min)
        })
        .collect()
}
