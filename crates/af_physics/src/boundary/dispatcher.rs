// crates/af_physics/src/boundary/dispatcher.rs

//! 边界条件分发器
//!
//! 按标记逐顶点施加边界条件，在残差装配之后、线性求解之前调用。
//!
//! 弱施加（EulerWall/Symmetry/FarField）向残差与 Jacobian 对角块
//! 累加边界通量；强施加（无滑移壁、吹气入流）覆写 `solution_old`、
//! 将对应残差行清零并把 Jacobian 行置为单位行。
//!
//! 动壁贡献（压力·网格速度·法向 + 应力张量·网格速度）由单个
//! `dynamic_grid` 布尔开关控制，静壁与动壁共享同一代码路径。

use af_mesh::MeshTopology;
use glam::DVec2;

use af_foundation::{AfError, AfResult};

use crate::assembly::residual::Residual;
use crate::fluid::{IdealGas, Primitive};
use crate::numerics::convective::{
    create_convective_scheme, ConvectiveScheme, ConvectiveSchemeKind,
};
use crate::numerics::gradient::{GradientStorage, GRAD_U, GRAD_V};
use crate::numerics::linear_algebra::BlockCsrMatrix;
use crate::state::FlowField;
use crate::{JacobianBlock, N_VAR, ZERO_BLOCK};

use super::ghost::GhostStateCalculator;
use super::types::{BoundaryKind, ChtCouplingMode, ConjugateHeatData, MarkerCondition};
use super::wall_function::WallFunctionMarker;

/// 解析到网格标记的边界条件
struct ResolvedMarker {
    marker_idx: usize,
    cond: MarkerCondition,
    conjugate: Option<ConjugateHeatData>,
}

/// 边界条件分发器
pub struct BoundaryDispatcher {
    gas: IdealGas,
    ghost: GhostStateCalculator,
    scheme: Box<dyn ConvectiveScheme>,
    markers: Vec<ResolvedMarker>,
    dynamic_grid: bool,
    /// 逐点网格速度（dynamic_grid 时非空）
    grid_velocity: Vec<DVec2>,
}

impl BoundaryDispatcher {
    /// 创建分发器
    ///
    /// # 错误
    ///
    /// - 条件引用的标记名在网格中不存在
    /// - ConjugateHeatInterface 未给定耦合模式（致命配置错误）
    pub fn new(
        mesh: &MeshTopology,
        gas: IdealGas,
        freestream: Primitive,
        conditions: &[MarkerCondition],
        scheme_kind: ConvectiveSchemeKind,
        dynamic_grid: bool,
    ) -> AfResult<Self> {
        let mut markers = Vec::with_capacity(conditions.len());
        for cond in conditions {
            let marker_idx = mesh
                .markers()
                .iter()
                .position(|m| m.name == cond.name)
                .ok_or_else(|| {
                    AfError::config(format!("边界条件引用了不存在的标记 '{}'", cond.name))
                })?;

            if cond.kind == BoundaryKind::ConjugateHeatInterface && cond.cht_coupling.is_none() {
                return Err(AfError::unknown_cht_coupling(format!(
                    "标记 '{}' 未给定耦合模式",
                    cond.name
                )));
            }

            markers.push(ResolvedMarker {
                marker_idx,
                cond: cond.clone(),
                conjugate: None,
            });
        }

        Ok(Self {
            gas,
            ghost: GhostStateCalculator::new(gas, freestream),
            scheme: create_convective_scheme(scheme_kind, gas),
            markers,
            dynamic_grid,
            grid_velocity: Vec::new(),
        })
    }

    /// 设置网格速度场（动网格）
    pub fn set_grid_velocity(&mut self, velocity: Vec<DVec2>) {
        self.grid_velocity = velocity;
    }

    /// 设置共轭传热数据
    ///
    /// # 错误
    ///
    /// 标记不存在或数据长度与顶点数不符。
    pub fn set_conjugate_data(
        &mut self,
        mesh: &MeshTopology,
        name: &str,
        data: ConjugateHeatData,
    ) -> AfResult<()> {
        let resolved = self
            .markers
            .iter_mut()
            .find(|m| m.cond.name == name)
            .ok_or_else(|| AfError::config(format!("共轭数据引用了未配置的标记 '{}'", name)))?;
        let n_vertices = mesh.markers()[resolved.marker_idx].vertices.len();
        AfError::check_size("conjugate_temperature", n_vertices, data.temperature.len())?;
        AfError::check_size(
            "conjugate_transfer_coefficient",
            n_vertices,
            data.transfer_coefficient.len(),
        )?;
        resolved.conjugate = Some(data);
        Ok(())
    }

    /// 启用壁面函数的标记列表（驱动器预处理阶段用）
    pub fn wall_function_markers(&self) -> Vec<WallFunctionMarker> {
        self.markers
            .iter()
            .filter(|m| m.cond.wall_function && m.cond.kind.is_viscous_wall())
            .map(|m| WallFunctionMarker {
                marker_idx: m.marker_idx,
                isothermal: matches!(
                    m.cond.kind,
                    BoundaryKind::IsothermalWall | BoundaryKind::ConjugateHeatInterface
                ),
                heat_flux: m.cond.heat_flux,
            })
            .collect()
    }

    /// 施加全部边界条件
    ///
    /// `jacobian` 为 `Some` 时按隐式路径同时修补 Jacobian 行。
    pub fn apply(
        &self,
        mesh: &MeshTopology,
        field: &mut FlowField,
        grads: &GradientStorage,
        residual: &mut Residual,
        mut jacobian: Option<&mut BlockCsrMatrix>,
    ) -> AfResult<()> {
        for resolved in &self.markers {
            let marker = &mesh.markers()[resolved.marker_idx];
            match resolved.cond.kind {
                BoundaryKind::EulerWall | BoundaryKind::Symmetry => {
                    self.apply_weak_wall(mesh, field, marker, residual, jacobian.as_deref_mut());
                }
                BoundaryKind::FarField => {
                    self.apply_far_field(mesh, field, marker, residual, jacobian.as_deref_mut());
                }
                BoundaryKind::HeatFluxWall
                | BoundaryKind::IsothermalWall
                | BoundaryKind::HeatTransferWall
                | BoundaryKind::ConjugateHeatInterface => {
                    self.apply_thermal_wall(
                        mesh,
                        field,
                        grads,
                        resolved,
                        residual,
                        jacobian.as_deref_mut(),
                    )?;
                }
                BoundaryKind::InletBlowing => {
                    self.apply_inlet_blowing(
                        mesh,
                        field,
                        &resolved.cond,
                        marker,
                        residual,
                        jacobian.as_deref_mut(),
                    );
                }
            }
        }
        Ok(())
    }

    /// 无黏壁/对称: 弱压力通量
    ///
    /// 镜像幽灵状态下对流通量退化为纯压力项 [0, p·N, 0]。
    fn apply_weak_wall(
        &self,
        mesh: &MeshTopology,
        field: &FlowField,
        marker: &af_mesh::Marker,
        residual: &mut Residual,
        mut jacobian: Option<&mut BlockCsrMatrix>,
    ) {
        let g1 = self.gas.gamma - 1.0;
        for vertex in &marker.vertices {
            let point = vertex.point;
            if !mesh.is_domain(point) {
                continue;
            }
            let p = field.primitive(point);
            let n = vertex.normal;

            residual.add_component(point, 1, p.pressure * n.x);
            residual.add_component(point, 2, p.pressure * n.y);

            if let Some(jac) = jacobian.as_deref_mut() {
                // ∂p/∂U = [φ, −(γ−1)u, −(γ−1)v, γ−1]
                let dp = [
                    0.5 * g1 * p.velocity.length_squared(),
                    -g1 * p.velocity.x,
                    -g1 * p.velocity.y,
                    g1,
                ];
                let mut blk = ZERO_BLOCK;
                for l in 0..N_VAR {
                    blk[1][l] = n.x * dp[l];
                    blk[2][l] = n.y * dp[l];
                }
                jac.add_to_diag(point, &blk);
            }
        }
    }

    /// 远场: 特征幽灵状态 + 内部对流格式
    fn apply_far_field(
        &self,
        mesh: &MeshTopology,
        field: &FlowField,
        marker: &af_mesh::Marker,
        residual: &mut Residual,
        mut jacobian: Option<&mut BlockCsrMatrix>,
    ) {
        for vertex in &marker.vertices {
            let point = vertex.point;
            if !mesh.is_domain(point) {
                continue;
            }
            let interior = field.primitive(point);
            let ghost = self.ghost.far_field(interior, vertex.unit_normal());
            let implicit = jacobian.is_some();

            let result = self
                .scheme
                .flux(interior, &ghost, vertex.normal, implicit);
            residual.add(point, &result.flux);

            if let Some(jac) = jacobian.as_deref_mut() {
                if let Some(ji) = result.jac_i {
                    jac.add_to_diag(point, &ji);
                }
            }
        }
    }

    /// 无滑移热壁通用处理
    ///
    /// 速度强 Dirichlet + 能量方程弱通量；四种热边界只在 q_w 的
    /// 确定方式与能量行 Jacobian 上不同。
    fn apply_thermal_wall(
        &self,
        mesh: &MeshTopology,
        field: &mut FlowField,
        grads: &GradientStorage,
        resolved: &ResolvedMarker,
        residual: &mut Residual,
        mut jacobian: Option<&mut BlockCsrMatrix>,
    ) -> AfResult<()> {
        let cond = &resolved.cond;
        let marker = &mesh.markers()[resolved.marker_idx];
        let implicit = jacobian.is_some();

        for (ivertex, vertex) in marker.vertices.iter().enumerate() {
            let point = vertex.point;
            if !mesh.is_domain(point) {
                continue;
            }
            let area = vertex.area();
            // 壁面处理使用指向壁面的法向（外法向取反）
            let unit_normal = -vertex.unit_normal();
            let neighbor = vertex.normal_neighbor;
            let dist = mesh.distance(point, neighbor).max(1e-14);

            // 能量行 Jacobian 收集块
            let mut jac_energy: Option<JacobianBlock> = None;

            // 能量方程的对流/黏性弱贡献
            let mut res_conv = 0.0;
            let mut res_visc;

            match cond.kind {
                BoundaryKind::HeatFluxWall => {
                    res_visc = cond.heat_flux * area;
                }
                BoundaryKind::HeatTransferWall => {
                    let t_wall = field.primitive(point).temperature;
                    let q = cond.transfer_coefficient * (cond.ambient_temperature - t_wall);
                    res_visc = q * area;

                    if implicit {
                        // T(ρ, ρE) 线性化: dR_E/dU = h·A·∂T/∂U
                        let dt = self.gas.temperature_jacobian(field.conserved(point));
                        let mut blk = ZERO_BLOCK;
                        for l in 0..N_VAR {
                            blk[N_VAR - 1][l] = cond.transfer_coefficient * dt[l] * area;
                        }
                        jac_energy = Some(blk);
                    }
                }
                BoundaryKind::IsothermalWall | BoundaryKind::ConjugateHeatInterface => {
                    let prim = field.primitive(point);
                    let k_wall = prim.thermal_conductivity;
                    let t_near = field.primitive(neighbor).temperature;

                    let t_wall = if cond.kind == BoundaryKind::IsothermalWall {
                        cond.wall_temperature
                    } else {
                        self.cht_wall_temperature(
                            resolved, ivertex, t_near, k_wall, dist,
                        )?
                    };

                    // 单侧法向温度梯度 → 弱热流
                    let dtdn = -(t_near - t_wall) / dist;
                    res_visc = k_wall * dtdn * area;

                    if implicit {
                        let rho = prim.density;
                        let g1 = self.gas.gamma - 1.0;
                        let r_gas = self.gas.gas_constant;
                        let vel2 = prim.velocity.length_squared();
                        let dtdrho = (-t_wall + g1 / r_gas * 0.5 * vel2) / rho;

                        let mut blk = ZERO_BLOCK;
                        blk[N_VAR - 1][0] = k_wall / dist * dtdrho * area;
                        blk[N_VAR - 1][N_VAR - 1] = k_wall / dist * g1 / (r_gas * rho) * area;
                        jac_energy = Some(blk);
                    }
                }
                _ => unreachable!("apply_thermal_wall 只处理黏性壁类型"),
            }

            // 速度强 Dirichlet: 壁面速度（动网格）或零
            let wall_velocity = if self.dynamic_grid {
                self.grid_velocity.get(point).copied().unwrap_or(DVec2::ZERO)
            } else {
                DVec2::ZERO
            };
            field.set_velocity_old(point, wall_velocity);
            residual.set_component_zero(point, 1);
            residual.set_component_zero(point, 2);

            // 动壁附加项: 压力·网格速度·法向 + 应力张量·网格速度
            if self.dynamic_grid {
                let blk = jac_energy.get_or_insert(ZERO_BLOCK);
                self.add_dynamic_grid_contribution(
                    mesh,
                    field,
                    grads,
                    point,
                    neighbor,
                    unit_normal,
                    area,
                    wall_velocity,
                    implicit.then_some(blk),
                    &mut res_conv,
                    &mut res_visc,
                );
            }

            residual.add_component(point, N_VAR - 1, res_conv - res_visc);

            if let Some(jac) = jacobian.as_deref_mut() {
                if let Some(blk) = jac_energy {
                    jac.add_to_diag(point, &blk);
                }
                // 速度行置为单位行（强无滑移）
                jac.delete_row_set_identity(point, 1);
                jac.delete_row_set_identity(point, 2);
            }
        }
        Ok(())
    }

    /// 共轭传热壁温
    fn cht_wall_temperature(
        &self,
        resolved: &ResolvedMarker,
        ivertex: usize,
        t_near: f64,
        conductivity: f64,
        dist: f64,
    ) -> AfResult<f64> {
        let mode = resolved
            .cond
            .cht_coupling
            .expect("构造时已验证耦合模式存在");
        let data = resolved.conjugate.as_ref().ok_or_else(|| {
            AfError::config(format!(
                "标记 '{}' 缺少共轭传热数据",
                resolved.cond.name
            ))
        })?;

        let t_conjugate = data.temperature[ivertex];
        Ok(match mode {
            ChtCouplingMode::AveragedTemperatureNeumann
            | ChtCouplingMode::AveragedTemperatureRobin => {
                // 两侧热阻加权平均
                let factor_here = conductivity / dist;
                let factor_conj = data.transfer_coefficient[ivertex];
                (t_near * factor_here + t_conjugate * factor_conj)
                    / (factor_here + factor_conj).max(1e-30)
            }
            ChtCouplingMode::DirectTemperatureNeumann
            | ChtCouplingMode::DirectTemperatureRobin => t_conjugate,
        })
    }

    /// 动壁残差/Jacobian 附加项
    ///
    /// 能量方程获得 p·(v_grid·n)·A（对流）与 (τ·v_grid)·n·A（黏性）。
    #[allow(clippy::too_many_arguments)]
    fn add_dynamic_grid_contribution(
        &self,
        mesh: &MeshTopology,
        field: &FlowField,
        grads: &GradientStorage,
        point: usize,
        neighbor: usize,
        unit_normal: DVec2,
        area: f64,
        grid_vel: DVec2,
        jac_energy: Option<&mut JacobianBlock>,
        res_conv: &mut f64,
        res_visc: &mut f64,
    ) {
        let prim = field.primitive(point);
        let proj_grid_vel = area * grid_vel.dot(unit_normal);

        // 应力张量
        let g = grads.point(point);
        let mu_tot = prim.total_viscosity();
        let div = g[GRAD_U].x + g[GRAD_V].y;
        let txx = mu_tot * (2.0 * g[GRAD_U].x - 2.0 / 3.0 * div);
        let tyy = mu_tot * (2.0 * g[GRAD_V].y - 2.0 / 3.0 * div);
        let txy = mu_tot * (g[GRAD_U].y + g[GRAD_V].x);
        let tau_vel = DVec2::new(
            txx * grid_vel.x + txy * grid_vel.y,
            txy * grid_vel.x + tyy * grid_vel.y,
        );

        *res_conv += prim.pressure * proj_grid_vel;
        *res_visc += tau_vel.dot(unit_normal) * area;

        if let Some(blk) = jac_energy {
            let gamma = self.gas.gamma;
            let g1 = gamma - 1.0;
            let grid_vel2 = grid_vel.length_squared();
            let erow = N_VAR - 1;

            // 压力项线性化
            blk[erow][0] += 0.5 * g1 * grid_vel2 * proj_grid_vel;
            blk[erow][1] += -g1 * grid_vel.x * proj_grid_vel;
            blk[erow][2] += -g1 * grid_vel.y * proj_grid_vel;
            blk[erow][3] += g1 * proj_grid_vel;

            // 剪切应力项线性化（薄剪切层 θ/η 结构）
            let dist = mesh.distance(point, neighbor).max(1e-14);
            let factor = mu_tot * area / (prim.density * dist);
            let theta_x = 1.0 + unit_normal.x * unit_normal.x / 3.0;
            let theta_y = 1.0 + unit_normal.y * unit_normal.y / 3.0;
            let eta = unit_normal.x * unit_normal.y / 3.0;
            let pix = grid_vel.x * theta_x + grid_vel.y * eta;
            let piy = grid_vel.x * eta + grid_vel.y * theta_y;

            blk[erow][0] += factor * (-pix * grid_vel.x - piy * grid_vel.y);
            blk[erow][1] += factor * pix;
            blk[erow][2] += factor * piy;
        }
    }

    /// 吹气入流
    ///
    /// 弱对流通量（内部状态 × 入流状态）+ 强 Dirichlet：
    /// 无强制温度时只固定速度行，有强制温度时固定全部状态行。
    fn apply_inlet_blowing(
        &self,
        mesh: &MeshTopology,
        field: &mut FlowField,
        cond: &MarkerCondition,
        marker: &af_mesh::Marker,
        residual: &mut Residual,
        mut jacobian: Option<&mut BlockCsrMatrix>,
    ) {
        let implicit = jacobian.is_some();
        for vertex in &marker.vertices {
            let point = vertex.point;
            if !mesh.is_domain(point) {
                continue;
            }
            let interior = *field.primitive(point);
            let (inlet, impose_all) = self.ghost.blowing_inlet(
                &interior,
                vertex.unit_normal(),
                cond.blowing_ratio,
                cond.blowing_temperature,
            );

            // 上风弱通量
            let result = self.scheme.flux(&interior, &inlet, vertex.normal, implicit);
            residual.add(point, &result.flux);
            if let Some(jac) = jacobian.as_deref_mut() {
                if let Some(ji) = result.jac_i {
                    jac.add_to_diag(point, &ji);
                }
            }

            // 强制状态写入旧解
            let imposed = self.gas.conserved_from_primitive(&inlet);
            field.set_solution_old(point, imposed);

            let rows: &[usize] = if impose_all { &[0, 1, 2, 3] } else { &[1, 2] };
            for &var in rows {
                residual.set_component_zero(point, var);
            }
            if let Some(jac) = jacobian.as_deref_mut() {
                for &var in rows {
                    jac.delete_row_set_identity(point, var);
                }
            }
        }
    }
}
