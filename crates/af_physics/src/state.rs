// crates/af_physics/src/state.rs

//! 逐点状态存储
//!
//! `FlowField` 持有工作守恒量、旧解快照（`solution_old`，仅由
//! Dirichlet 型边界条件修改，与工作解分开存储以支持强边界的残差置零）、
//! 原始量缓存以及逐点辅助标量（涡黏性、壁面剪切应力、y+）。
//!
//! # 不变式
//!
//! 守恒量变化后必须显式调用 [`FlowField::set_primitive_variables`]
//! 重新派生原始量；重构失败的点保留上一个有效原始状态并被计数，
//! 不会向缓存写入 NaN。

use glam::DVec2;
use rayon::prelude::*;

use crate::fluid::{Conserved, IdealGas, Primitive};
use crate::{FluxVector, N_VAR};

/// 流场状态
#[derive(Debug, Clone)]
pub struct FlowField {
    gas: IdealGas,
    n_points: usize,
    conserved: Vec<Conserved>,
    solution_old: Vec<Conserved>,
    primitive: Vec<Primitive>,
    non_physical: Vec<bool>,
    /// 涡黏性输入场（湍流闭合提供）
    eddy_viscosity: Vec<f64>,
    /// 壁面剪切应力（壁面函数输出）
    tau_wall: Vec<f64>,
    /// 无量纲壁面距离（壁面函数输出）
    y_plus: Vec<f64>,
    /// 摩擦速度（壁面函数输出）
    u_tau: Vec<f64>,
}

impl FlowField {
    /// 以均匀原始状态初始化
    pub fn uniform(gas: IdealGas, n_points: usize, freestream: Primitive) -> Self {
        let cons = gas.conserved_from_primitive(&freestream);
        Self {
            gas,
            n_points,
            conserved: vec![cons; n_points],
            solution_old: vec![cons; n_points],
            primitive: vec![freestream; n_points],
            non_physical: vec![false; n_points],
            eddy_viscosity: vec![freestream.eddy_viscosity; n_points],
            tau_wall: vec![0.0; n_points],
            y_plus: vec![0.0; n_points],
            u_tau: vec![0.0; n_points],
        }
    }

    /// 点数
    #[inline]
    pub fn n_points(&self) -> usize {
        self.n_points
    }

    /// 气体模型
    #[inline]
    pub fn gas(&self) -> &IdealGas {
        &self.gas
    }

    /// 工作守恒量
    #[inline]
    pub fn conserved(&self, i: usize) -> &Conserved {
        &self.conserved[i]
    }

    /// 覆写工作守恒量
    #[inline]
    pub fn set_conserved(&mut self, i: usize, u: Conserved) {
        self.conserved[i] = u;
    }

    /// 原始量缓存
    #[inline]
    pub fn primitive(&self, i: usize) -> &Primitive {
        &self.primitive[i]
    }

    /// 点是否处于非物理状态（最近一次重构失败）
    #[inline]
    pub fn is_non_physical(&self, i: usize) -> bool {
        self.non_physical[i]
    }

    /// 旧解快照
    #[inline]
    pub fn solution_old(&self, i: usize) -> &Conserved {
        &self.solution_old[i]
    }

    /// 涡黏性输入场
    #[inline]
    pub fn eddy_viscosity(&self) -> &[f64] {
        &self.eddy_viscosity
    }

    /// 覆写涡黏性输入场
    pub fn set_eddy_viscosity(&mut self, values: &[f64]) {
        self.eddy_viscosity.copy_from_slice(values);
    }

    /// 壁面剪切应力
    #[inline]
    pub fn tau_wall(&self, i: usize) -> f64 {
        self.tau_wall[i]
    }

    /// 记录壁面剪切应力
    #[inline]
    pub fn set_tau_wall(&mut self, i: usize, value: f64) {
        self.tau_wall[i] = value;
    }

    /// y+
    #[inline]
    pub fn y_plus(&self, i: usize) -> f64 {
        self.y_plus[i]
    }

    /// 记录壁面函数输出 (y+, u_tau, 壁面涡黏性)
    pub fn set_wall_function_output(&mut self, i: usize, y_plus: f64, u_tau: f64, nu_t: f64) {
        self.y_plus[i] = y_plus;
        self.u_tau[i] = u_tau;
        self.eddy_viscosity[i] = nu_t;
    }

    /// 覆写缓存温度（壁面函数的 Crocco-Busemann 更新）
    ///
    /// 只修改温度分量；完整的一致化在下一次原始量重构时发生。
    pub fn set_temperature(&mut self, i: usize, temperature: f64) {
        self.primitive[i].temperature = temperature;
    }

    /// 重构所有点的原始量，返回非物理点计数
    ///
    /// 线程本地计数在内部归约；失败的点保留之前的有效原始状态。
    /// 对不相交的点范围并发调用是安全的（每点只被一个逻辑工作者访问）。
    pub fn set_primitive_variables(&mut self) -> usize {
        let gas = self.gas;
        self.conserved
            .par_iter()
            .zip(self.primitive.par_iter_mut())
            .zip(self.non_physical.par_iter_mut())
            .zip(self.eddy_viscosity.par_iter())
            .map(|(((u, prim), flag), &mu_t)| {
                match gas.primitive_from_conserved(u, mu_t) {
                    Some(p) => {
                        *prim = p;
                        *flag = false;
                        0usize
                    }
                    None => {
                        // 保留上一个有效原始状态
                        *flag = true;
                        1usize
                    }
                }
            })
            .sum()
    }

    /// 快照当前工作解到 `solution_old`
    pub fn snapshot_old(&mut self) {
        self.solution_old.copy_from_slice(&self.conserved);
    }

    /// 覆写旧解的速度分量（无滑移壁的强制量）
    ///
    /// 动量 = 当前密度 × 给定速度；密度与能量保持不变。
    pub fn set_velocity_old(&mut self, i: usize, velocity: DVec2) {
        let rho = self.solution_old[i].density;
        self.solution_old[i].momentum = rho * velocity;
    }

    /// 覆写旧解的完整状态（入流边界的强制量）
    pub fn set_solution_old(&mut self, i: usize, u: Conserved) {
        self.solution_old[i] = u;
    }

    /// 从旧解与增量更新工作解: U = U_old + ΔU
    ///
    /// Dirichlet 行的增量为零，因此强制值由 `solution_old` 直接传递。
    pub fn update_from_old(&mut self, delta: &[f64]) {
        debug_assert_eq!(delta.len(), self.n_points * N_VAR);
        for i in 0..self.n_points {
            let mut u = self.solution_old[i];
            let base = i * N_VAR;
            let d: FluxVector = [
                delta[base],
                delta[base + 1],
                delta[base + 2],
                delta[base + 3],
            ];
            u.add_scaled(&d, 1.0);
            self.conserved[i] = u;
        }
    }

    /// 导出守恒量的扁平数组（halo 交换 / 重启写出用）
    pub fn conserved_flat(&self) -> Vec<f64> {
        let mut out = Vec::with_capacity(self.n_points * N_VAR);
        for u in &self.conserved {
            out.extend_from_slice(&u.to_array());
        }
        out
    }

    /// 从扁平数组载入守恒量（halo 交换 / 重启读取用）
    pub fn load_conserved_flat(&mut self, data: &[f64]) {
        debug_assert_eq!(data.len(), self.n_points * N_VAR);
        for i in 0..self.n_points {
            let base = i * N_VAR;
            self.conserved[i] = Conserved::from_array([
                data[base],
                data[base + 1],
                data[base + 2],
                data[base + 3],
            ]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(n: usize) -> FlowField {
        let gas = IdealGas::default();
        let prim = gas.primitive_from_rho_vel_p(1.0, DVec2::new(10.0, 0.0), 101325.0, 0.0);
        FlowField::uniform(gas, n, prim)
    }

    #[test]
    fn test_uniform_init() {
        let mut f = field(4);
        assert_eq!(f.n_points(), 4);
        assert!((f.primitive(2).pressure - 101325.0).abs() < 1e-9);
        assert_eq!(f.set_primitive_variables(), 0);
    }

    #[test]
    fn test_non_physical_fallback_idempotence() {
        // 规定：非物理状态保留旧原始量，每个坏点恰好计数一次
        let mut f = field(3);
        let good_pressure = f.primitive(1).pressure;

        f.set_conserved(
            1,
            Conserved {
                density: -1.0,
                momentum: DVec2::ZERO,
                energy: 1.0,
            },
        );
        let count = f.set_primitive_variables();
        assert_eq!(count, 1);
        assert!(f.is_non_physical(1));
        // 原始量缓存未被破坏
        assert!((f.primitive(1).pressure - good_pressure).abs() < 1e-9);

        // 再次调用：计数仍为 1（坏点只按点计数，不累积）
        let count = f.set_primitive_variables();
        assert_eq!(count, 1);
        assert!((f.primitive(1).pressure - good_pressure).abs() < 1e-9);
    }

    #[test]
    fn test_set_velocity_old_keeps_density() {
        let mut f = field(2);
        f.snapshot_old();
        f.set_velocity_old(0, DVec2::new(5.0, -2.0));
        let old = f.solution_old(0);
        assert!((old.density - 1.0).abs() < 1e-12);
        assert!((old.momentum.x - 5.0).abs() < 1e-12);
        assert!((old.momentum.y + 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_update_from_old() {
        let mut f = field(2);
        f.snapshot_old();
        let mut delta = vec![0.0; 2 * N_VAR];
        delta[0] = 0.1; // 点0密度增量
        delta[N_VAR + 3] = -5.0; // 点1能量增量
        let e_before = f.conserved(1).energy;
        f.update_from_old(&delta);
        assert!((f.conserved(0).density - 1.1).abs() < 1e-12);
        assert!((f.conserved(1).energy - (e_before - 5.0)).abs() < 1e-9);
    }

    #[test]
    fn test_flat_round_trip() {
        let mut f = field(3);
        let flat = f.conserved_flat();
        assert_eq!(flat.len(), 3 * N_VAR);
        f.load_conserved_flat(&flat);
        assert!((f.conserved(2).density - 1.0).abs() < 1e-12);
    }
}
