// crates/af_physics/src/numerics/gradient.rs

//! 原始量梯度计算
//!
//! 点中心边基网格上的两种梯度方法：
//! - Green-Gauss: 对偶面平均值的散度定理重构
//! - 加权最小二乘: 逆距离平方加权的 2×2 正规方程
//!
//! 梯度作用于 5 个标量场（密度、速度分量、压力、温度），
//! 前 4 个用于 MUSCL 重构，速度与温度梯度用于黏性通量。

use af_mesh::MeshTopology;
use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::state::FlowField;

/// 梯度场索引: 密度
pub const GRAD_RHO: usize = 0;
/// 梯度场索引: x 速度
pub const GRAD_U: usize = 1;
/// 梯度场索引: y 速度
pub const GRAD_V: usize = 2;
/// 梯度场索引: 压力
pub const GRAD_P: usize = 3;
/// 梯度场索引: 温度
pub const GRAD_T: usize = 4;
/// 梯度标量场数量
pub const N_GRAD: usize = 5;

/// 梯度方法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GradientKind {
    /// Green-Gauss
    #[default]
    GreenGauss,
    /// 加权最小二乘
    WeightedLeastSquares,
}

/// 逐点梯度存储
#[derive(Debug, Clone)]
pub struct GradientStorage {
    /// grads[点][场] = ∇φ
    pub grads: Vec<[DVec2; N_GRAD]>,
}

impl GradientStorage {
    /// 创建并清零
    pub fn new(n_points: usize) -> Self {
        Self {
            grads: vec![[DVec2::ZERO; N_GRAD]; n_points],
        }
    }

    /// 清零
    pub fn reset(&mut self) {
        self.grads.fill([DVec2::ZERO; N_GRAD]);
    }

    /// 点 i 的梯度
    #[inline]
    pub fn point(&self, i: usize) -> &[DVec2; N_GRAD] {
        &self.grads[i]
    }
}

/// 提取点的标量场值
#[inline]
fn scalar_values(field: &FlowField, i: usize) -> [f64; N_GRAD] {
    let p = field.primitive(i);
    [
        p.density,
        p.velocity.x,
        p.velocity.y,
        p.pressure,
        p.temperature,
    ]
}

/// 计算所有点的原始量梯度
pub fn compute_gradients(
    kind: GradientKind,
    mesh: &MeshTopology,
    field: &FlowField,
    storage: &mut GradientStorage,
) {
    match kind {
        GradientKind::GreenGauss => green_gauss(mesh, field, storage),
        GradientKind::WeightedLeastSquares => weighted_least_squares(mesh, field, storage),
    }
}

/// Green-Gauss 梯度
///
/// ∇φ_i = (1/Ω_i) [ Σ_边 ½(φ_i+φ_j)·n_ij ± + Σ_边界 φ_i·n_b ]
fn green_gauss(mesh: &MeshTopology, field: &FlowField, storage: &mut GradientStorage) {
    storage.reset();

    for e in mesh.edges() {
        let vi = scalar_values(field, e.i);
        let vj = scalar_values(field, e.j);
        for k in 0..N_GRAD {
            let avg = 0.5 * (vi[k] + vj[k]);
            storage.grads[e.i][k] += avg * e.normal;
            storage.grads[e.j][k] -= avg * e.normal;
        }
    }

    for m in mesh.markers() {
        for v in &m.vertices {
            let vals = scalar_values(field, v.point);
            for k in 0..N_GRAD {
                storage.grads[v.point][k] += vals[k] * v.normal;
            }
        }
    }

    for i in 0..mesh.n_points() {
        let inv_vol = 1.0 / mesh.point(i).volume;
        for k in 0..N_GRAD {
            storage.grads[i][k] *= inv_vol;
        }
    }
}

/// 加权最小二乘梯度
///
/// 每点求解 2×2 正规方程 (Σ w·dx·dxᵀ)·∇φ = Σ w·dx·Δφ，w = 1/|dx|²。
fn weighted_least_squares(mesh: &MeshTopology, field: &FlowField, storage: &mut GradientStorage) {
    storage.reset();

    for i in 0..mesh.n_points() {
        let xi = mesh.point(i).coord;
        let vi = scalar_values(field, i);

        // 正规矩阵 [a11 a12; a12 a22]
        let mut a11 = 0.0;
        let mut a12 = 0.0;
        let mut a22 = 0.0;
        let mut rhs = [DVec2::ZERO; N_GRAD];

        for &j in mesh.neighbors(i) {
            let dx = mesh.point(j).coord - xi;
            let w = 1.0 / dx.length_squared().max(1e-30);
            a11 += w * dx.x * dx.x;
            a12 += w * dx.x * dx.y;
            a22 += w * dx.y * dx.y;

            let vj = scalar_values(field, j);
            for k in 0..N_GRAD {
                rhs[k] += w * (vj[k] - vi[k]) * dx;
            }
        }

        let det = a11 * a22 - a12 * a12;
        if det.abs() < 1e-30 {
            // 退化模板（共线邻点）：梯度置零
            continue;
        }
        let inv_det = 1.0 / det;
        for k in 0..N_GRAD {
            storage.grads[i][k] = DVec2::new(
                (a22 * rhs[k].x - a12 * rhs[k].y) * inv_det,
                (a11 * rhs[k].y - a12 * rhs[k].x) * inv_det,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fluid::{Conserved, IdealGas};
    use af_mesh::generation;

    /// 构造密度线性变化的场: rho = 1 + 0.1 x
    fn linear_field(mesh: &MeshTopology) -> FlowField {
        let gas = IdealGas::default();
        let prim = gas.primitive_from_rho_vel_p(1.0, DVec2::ZERO, 101325.0, 0.0);
        let mut field = FlowField::uniform(gas, mesh.n_points(), prim);
        for i in 0..mesh.n_points() {
            let x = mesh.point(i).coord.x;
            let rho = 1.0 + 0.1 * x;
            field.set_conserved(
                i,
                Conserved {
                    density: rho,
                    momentum: DVec2::ZERO,
                    energy: 101325.0 / 0.4,
                },
            );
        }
        field.set_primitive_variables();
        field
    }

    #[test]
    fn test_wls_exact_for_linear_field() {
        // 最小二乘梯度对线性场精确
        let mesh = generation::cartesian(5, 5, 1.0, 1.0).unwrap();
        let field = linear_field(&mesh);
        let mut storage = GradientStorage::new(mesh.n_points());
        compute_gradients(GradientKind::WeightedLeastSquares, &mesh, &field, &mut storage);

        for i in 0..mesh.n_points() {
            let g = storage.point(i)[GRAD_RHO];
            assert!(
                (g.x - 0.1).abs() < 1e-10 && g.y.abs() < 1e-10,
                "点 {} 梯度 {:?}",
                i,
                g
            );
        }
    }

    #[test]
    fn test_green_gauss_interior_linear_field() {
        // Green-Gauss 在封闭控制体的内点对线性场精确
        let mesh = generation::cartesian(5, 5, 1.0, 1.0).unwrap();
        let field = linear_field(&mesh);
        let mut storage = GradientStorage::new(mesh.n_points());
        compute_gradients(GradientKind::GreenGauss, &mesh, &field, &mut storage);

        // 只检查内部点（边界点的单侧模板有 O(h) 偏差）
        for iy in 1..4 {
            for ix in 1..4 {
                let i = iy * 5 + ix;
                let g = storage.point(i)[GRAD_RHO];
                assert!(
                    (g.x - 0.1).abs() < 1e-10 && g.y.abs() < 1e-10,
                    "点 {} 梯度 {:?}",
                    i,
                    g
                );
            }
        }
    }

    #[test]
    fn test_uniform_field_zero_gradient() {
        let mesh = generation::cartesian(4, 4, 1.0, 1.0).unwrap();
        let gas = IdealGas::default();
        let prim = gas.primitive_from_rho_vel_p(1.0, DVec2::new(10.0, 5.0), 101325.0, 0.0);
        let field = FlowField::uniform(gas, mesh.n_points(), prim);
        let mut storage = GradientStorage::new(mesh.n_points());

        for kind in [GradientKind::GreenGauss, GradientKind::WeightedLeastSquares] {
            compute_gradients(kind, &mesh, &field, &mut storage);
            for i in 0..mesh.n_points() {
                for k in 0..N_GRAD {
                    // 压力量级 ~1e5，容差按场量级缩放
                    let scale = scalar_values(&field, i)[k].abs().max(1.0);
                    assert!(
                        storage.point(i)[k].length() < 1e-10 * scale,
                        "{:?} 点 {} 场 {} 梯度非零",
                        kind,
                        i,
                        k
                    );
                }
            }
        }
    }
}
