// crates/af_physics/src/boundary/wall_function.rs

//! Nichols-Nelson 律壁面函数
//!
//! 对每个壁面顶点做有界 Newton 子迭代，从可压缩对数律关系中求精
//! 壁面剪切应力与壁面温度：
//! - Crocco-Busemann 关系更新壁温（等温壁固定温度，跳过更新）
//! - White-Christoph 外层 y+ 与 Spalding 速度型叠加
//! - 收敛容差 1e-12，固定最大迭代数与松弛因子
//!
//! 失败语义：迭代上限退回安全默认值 (y+=30, 涡黏性=1, U_tau=1)
//! 并计数；起始 y+ 低于配置阈值的顶点整体跳过（对数律不适用）
//! 并单独计数。两个计数器每外层迭代全局归约一次后报告。

use af_mesh::MeshTopology;
use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::fluid::IdealGas;
use crate::numerics::gradient::{GradientStorage, GRAD_U, GRAD_V};
use crate::state::FlowField;

/// 壁面函数常数
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WallFunctionSettings {
    /// von Karman 常数
    pub kappa: f64,
    /// 对数律截距 B
    pub b: f64,
    /// y+ 有效下限（低于此值跳过）
    pub min_yplus: f64,
    /// Newton 最大迭代数
    pub max_iter: usize,
    /// Newton 松弛因子
    pub relaxation: f64,
}

impl Default for WallFunctionSettings {
    fn default() -> Self {
        Self {
            kappa: 0.41,
            b: 5.5,
            min_yplus: 5.0,
            max_iter: 200,
            relaxation: 0.5,
        }
    }
}

/// 壁面函数诊断计数器
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WallFunctionCounters {
    /// Newton 未收敛的顶点数
    pub not_converged: u64,
    /// y+ 低于阈值被跳过的顶点数
    pub below_threshold: u64,
}

impl WallFunctionCounters {
    /// 合并（线程本地 → 全局前的进程内归约）
    pub fn merge(&mut self, other: &Self) {
        self.not_converged += other.not_converged;
        self.below_threshold += other.below_threshold;
    }
}

/// 需要壁面函数处理的标记描述
#[derive(Debug, Clone, Copy)]
pub struct WallFunctionMarker {
    /// 网格标记索引
    pub marker_idx: usize,
    /// 是否等温壁（壁温固定，跳过 Crocco-Busemann 更新）
    pub isothermal: bool,
    /// 给定壁面热流（HeatFlux 壁），其余为 0
    pub heat_flux: f64,
}

/// Newton 收敛容差（1e-10 不够）
const NEWTON_TOL: f64 = 1e-12;

/// 对所有壁面函数标记更新壁面剪切应力
///
/// 向 `field` 写回 tau_wall / y+ / u_tau / 壁面涡黏性，返回诊断计数。
pub fn update_wall_functions(
    mesh: &MeshTopology,
    field: &mut FlowField,
    grads: &GradientStorage,
    markers: &[WallFunctionMarker],
    settings: &WallFunctionSettings,
    gas: &IdealGas,
) -> WallFunctionCounters {
    let mut counters = WallFunctionCounters::default();
    let cp = gas.cp();
    // 恢复因子: 层流 Prandtl 数的立方根
    let recovery = gas.prandtl_lam.powf(1.0 / 3.0);
    let kappa = settings.kappa;
    let b = settings.b;

    for wf in markers {
        let marker = &mesh.markers()[wf.marker_idx];
        for vertex in &marker.vertices {
            let point = vertex.point;
            if !mesh.is_domain(point) {
                continue;
            }
            let neighbor = vertex.normal_neighbor;
            let unit_normal = vertex.unit_normal();

            // 最近法向内点的速度、压力、温度
            let vel = field.primitive(neighbor).velocity;
            let p_normal = field.primitive(neighbor).pressure;
            let t_normal = field.primitive(neighbor).temperature;

            // 壁面平行速度
            let vel_normal = vel.dot(unit_normal);
            let vel_tang = vel - vel_normal * unit_normal;
            let vel_tang_mod = vel_tang.length().max(1e-12);

            // 内点到壁面的法向距离
            let wall_dist = mesh.distance(point, neighbor).max(1e-14);

            // 壁面状态: 压力外推，密度由状态方程
            let mut t_wall = field.primitive(point).temperature;
            let p_wall = p_normal;
            let mut rho_wall = p_wall / (gas.gas_constant * t_wall);
            let lam_visc_normal = field.primitive(neighbor).laminar_viscosity;
            let lam_visc_wall = field.primitive(point).laminar_viscosity;
            let conductivity_wall = field.primitive(point).thermal_conductivity;

            // 常规方式由壁面应力张量得到初始剪切应力
            let wall_shear = wall_shear_stress(grads, point, unit_normal, lam_visc_wall);

            let mut u_tau = (wall_shear / rho_wall).sqrt().max(1.0e-6);
            let mut y_plus = 0.99 * settings.min_yplus;

            // 起始 y+ 低于阈值: 对数律不适用，整体跳过
            let y_plus_start = rho_wall * u_tau * wall_dist / lam_visc_wall;
            if y_plus_start < settings.min_yplus {
                counters.below_threshold += 1;
                continue;
            }

            let mut diff: f64 = 1.0;
            let mut counter = 0usize;
            let mut converged = true;
            loop {
                if diff.abs() <= NEWTON_TOL {
                    break;
                }

                let u_plus = vel_tang_mod / u_tau;

                // Nichols & Nelson (2004) 的 Γ, β, Q, φ
                let gam = recovery * u_tau * u_tau / (2.0 * cp * t_wall);
                let beta = wf.heat_flux * lam_visc_wall
                    / (rho_wall * t_wall * conductivity_wall * u_tau);
                let q = (beta * beta + 4.0 * gam).max(1e-30).sqrt();
                let phi = (-beta / q).clamp(-1.0, 1.0).asin();

                // Crocco-Busemann 壁温更新（等温壁固定）
                if !wf.isothermal {
                    let denom = 1.0 + beta * u_plus - gam * u_plus * u_plus;
                    if denom > 1e-12 {
                        t_wall = t_normal / denom;
                        field.set_temperature(point, t_wall);
                    } else {
                        log::warn!("壁面函数: 点 {} 的壁温更新分母非正", point);
                    }
                }
                rho_wall = p_wall / (gas.gas_constant * t_wall);

                // White & Christoph 外层 y+
                let asin_arg = ((2.0 * gam * u_plus - beta) / q).clamp(-1.0, 1.0);
                let y_plus_white =
                    ((kappa / gam.max(1e-30).sqrt()) * (asin_arg.asin() - phi)).exp()
                        * (-kappa * b).exp();

                // Spalding 速度型
                let k_up = kappa * u_plus;
                y_plus = u_plus + y_plus_white
                    - (-kappa * b).exp()
                        * (1.0 + k_up + 0.5 * k_up * k_up + k_up * k_up * k_up / 6.0);

                // Newton 目标函数与导数
                diff = rho_wall * u_tau * wall_dist / lam_visc_wall - y_plus;

                let grad_diff = rho_wall * wall_dist / lam_visc_wall
                    + vel_tang_mod / (u_tau * u_tau)
                    + kappa / (u_tau * gam.max(1e-30).sqrt())
                        * (u_plus * gam.max(1e-30).sqrt()).clamp(-1.0, 1.0).asin()
                        * y_plus_white
                    - (-kappa * b).exp()
                        * (0.5 * (vel_tang_mod * kappa / u_tau).powi(3)
                            + (vel_tang_mod * kappa / u_tau).powi(2)
                            + vel_tang_mod * kappa / u_tau)
                        / u_tau;

                u_tau -= settings.relaxation * (diff / grad_diff);

                counter += 1;
                if counter > settings.max_iter {
                    counters.not_converged += 1;
                    // 退回安全默认值
                    y_plus = 30.0;
                    u_tau = 1.0;
                    converged = false;
                    break;
                }
            }

            let nu_t = if converged {
                let u_plus = vel_tang_mod / u_tau;
                let gam = recovery * u_tau * u_tau / (2.0 * cp * t_wall);
                let beta = wf.heat_flux * lam_visc_wall
                    / (rho_wall * t_wall * conductivity_wall * u_tau);
                let q = (beta * beta + 4.0 * gam).max(1e-30).sqrt();
                let phi = (-beta / q).clamp(-1.0, 1.0).asin();
                let asin_arg = ((2.0 * gam * u_plus - beta) / q).clamp(-1.0, 1.0);
                let y_plus_white =
                    ((kappa / gam.max(1e-30).sqrt()) * (asin_arg.asin() - phi)).exp()
                        * (-kappa * b).exp();
                let k_up = kappa * u_plus;
                let dypw_dyp = 2.0 * y_plus_white * (kappa * gam.max(1e-30).sqrt() / q)
                    * (1.0 - (2.0 * gam * u_plus - beta).powi(2) / (q * q))
                        .max(0.0)
                        .sqrt();
                (lam_visc_wall
                    * (1.0 + dypw_dyp
                        - kappa * (-kappa * b).exp() * (1.0 + k_up + 0.5 * k_up * k_up)
                        - lam_visc_normal / lam_visc_wall))
                    .max(1.0e-6)
            } else {
                1.0
            };

            // 由 y+ 定义反推壁面剪切应力
            let tau_wall = (1.0 / rho_wall) * (y_plus * lam_visc_wall / wall_dist).powi(2);

            field.set_wall_function_output(point, y_plus, u_tau, nu_t);
            field.set_tau_wall(point, tau_wall);
        }
    }

    counters
}

/// 壁面切向剪切应力模长（应力张量的切向投影）
fn wall_shear_stress(
    grads: &GradientStorage,
    point: usize,
    unit_normal: DVec2,
    viscosity: f64,
) -> f64 {
    let g = grads.point(point);
    let grad_u = g[GRAD_U];
    let grad_v = g[GRAD_V];
    let div = grad_u.x + grad_v.y;

    let txx = viscosity * (2.0 * grad_u.x - 2.0 / 3.0 * div);
    let tyy = viscosity * (2.0 * grad_v.y - 2.0 / 3.0 * div);
    let txy = viscosity * (grad_u.y + grad_v.x);

    let tau_n = DVec2::new(
        txx * unit_normal.x + txy * unit_normal.y,
        txy * unit_normal.x + tyy * unit_normal.y,
    );
    // 切向投影
    let tang = tau_n - tau_n.dot(unit_normal) * unit_normal;
    tang.length()
}
