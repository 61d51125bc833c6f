// crates/af_physics/src/numerics/convective/mod.rs

//! 对流通量格式
//!
//! 每个格式是左右重构状态 + 边法向的纯函数，按值返回通量与可选的
//! 两个 Jacobian 块（∂F/∂U_i, ∂F/∂U_j），绝不返回指向内部缓冲区的指针。
//! 格式在构造期由配置选定，运行期不变。

mod ausm;
mod hllc;
mod roe;
mod rusanov;
#[cfg(test)]
pub(crate) mod tests_common;
mod traits;

pub use ausm::AusmScheme;
pub use hllc::HllcScheme;
pub use roe::RoeScheme;
pub use rusanov::RusanovScheme;
pub use traits::{ConvectiveScheme, ConvectiveSchemeKind, FluxResult, SchemeCapabilities};

use glam::DVec2;

use crate::fluid::{IdealGas, Primitive};
use crate::{FluxVector, JacobianBlock, N_VAR};

/// 按配置枚举创建对流格式
pub fn create_convective_scheme(
    kind: ConvectiveSchemeKind,
    gas: IdealGas,
) -> Box<dyn ConvectiveScheme> {
    match kind {
        ConvectiveSchemeKind::Roe => Box::new(RoeScheme::new(gas)),
        ConvectiveSchemeKind::Hllc => Box::new(HllcScheme::new(gas)),
        ConvectiveSchemeKind::Ausm => Box::new(AusmScheme::new(gas)),
        ConvectiveSchemeKind::Rusanov => Box::new(RusanovScheme::new(gas)),
    }
}

/// 投影欧拉通量 F(U)·n（法向量带面积权）
pub fn projected_flux(p: &Primitive, normal: DVec2) -> FluxVector {
    let area = normal.length();
    let nh = normal / area;
    let vn = p.velocity.dot(nh);
    [
        p.density * vn * area,
        (p.density * p.velocity.x * vn + p.pressure * nh.x) * area,
        (p.density * p.velocity.y * vn + p.pressure * nh.y) * area,
        p.density * p.enthalpy * vn * area,
    ]
}

/// 投影欧拉通量 Jacobian ∂(F·n)/∂U（含面积权）
pub fn inviscid_jacobian(p: &Primitive, normal: DVec2, gamma: f64) -> JacobianBlock {
    let area = normal.length();
    let nh = normal / area;
    let (nx, ny) = (nh.x, nh.y);
    let (u, v) = (p.velocity.x, p.velocity.y);
    let vn = u * nx + v * ny;
    let g1 = gamma - 1.0;
    let phi = 0.5 * g1 * (u * u + v * v);
    let h = p.enthalpy;

    let mut jac = [
        [0.0, nx, ny, 0.0],
        [
            phi * nx - u * vn,
            vn + (2.0 - gamma) * u * nx,
            u * ny - g1 * v * nx,
            g1 * nx,
        ],
        [
            phi * ny - v * vn,
            v * nx - g1 * u * ny,
            vn + (2.0 - gamma) * v * ny,
            g1 * ny,
        ],
        [
            (phi - h) * vn,
            h * nx - g1 * u * vn,
            h * ny - g1 * v * vn,
            gamma * vn,
        ],
    ];
    for row in jac.iter_mut() {
        for val in row.iter_mut() {
            *val *= area;
        }
    }
    jac
}

/// 谱半径线性化的上风 Jacobian 对
///
/// ∂F/∂U_i ≈ ½(A_i + λI)，∂F/∂U_j ≈ ½(A_j − λI)，λ 为带面积权的最大波速。
/// 对 Rusanov 这是精确线性化（忽略 ∂λ/∂U），对其余上风格式是标准的
/// 谱半径近似，换取对角占优与装配成本。
pub fn spectral_jacobian_pair(
    left: &Primitive,
    right: &Primitive,
    normal: DVec2,
    lambda: f64,
    gamma: f64,
) -> (JacobianBlock, JacobianBlock) {
    let mut jac_i = inviscid_jacobian(left, normal, gamma);
    let mut jac_j = inviscid_jacobian(right, normal, gamma);
    for k in 0..N_VAR {
        for l in 0..N_VAR {
            jac_i[k][l] *= 0.5;
            jac_j[k][l] *= 0.5;
        }
        jac_i[k][k] += 0.5 * lambda;
        jac_j[k][k] -= 0.5 * lambda;
    }
    (jac_i, jac_j)
}
