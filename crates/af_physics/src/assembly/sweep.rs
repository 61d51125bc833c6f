// crates/af_physics/src/assembly/sweep.rs

//! 边遍历装配循环
//!
//! 对每条内部边：重构左右状态（一阶取点值，二阶 MUSCL），调用对流
//! 格式与黏性通量，将 +flux 加到 Residual[i]、−flux 加到 Residual[j]
//! （机器精度的反对称守恒），隐式时把 Jacobian 块按 2×2 块模式
//! 累加进全局块稀疏矩阵。
//!
//! # 并发纪律
//!
//! 边按贪心着色分批：同一批内通量计算由 rayon 并行（纯函数求值），
//! 散布阶段按批内固定顺序串行执行。固定网格、状态与着色下结果
//! 确定；跨线程数的位级可复现性不在保证范围（浮点求和顺序），
//! 测试套件中明确标注。

use af_mesh::{ColoringResult, GreedyColoring, MeshTopology};
use rayon::prelude::*;

use crate::fluid::IdealGas;
use crate::numerics::convective::{
    create_convective_scheme, ConvectiveScheme, ConvectiveSchemeKind,
};
use crate::numerics::gradient::GradientStorage;
use crate::numerics::limiter::LimiterKind;
use crate::numerics::linear_algebra::BlockCsrMatrix;
use crate::numerics::reconstruction::MusclReconstructor;
use crate::numerics::viscous::ViscousFlux;
use crate::state::FlowField;
use crate::{FluxVector, JacobianBlock, N_VAR};

use super::residual::Residual;

/// 单条边的装配贡献
#[derive(Debug, Clone, Copy)]
struct EdgeContribution {
    flux: FluxVector,
    jac_i: Option<JacobianBlock>,
    jac_j: Option<JacobianBlock>,
}

/// 边遍历装配器
pub struct EdgeSweep {
    scheme: Box<dyn ConvectiveScheme>,
    viscous: Option<ViscousFlux>,
    muscl: MusclReconstructor,
    coloring: ColoringResult,
    scratch: Vec<EdgeContribution>,
}

impl EdgeSweep {
    /// 创建装配器
    ///
    /// # 参数
    /// - `scheme_kind`: 对流格式
    /// - `viscous`: 是否计算黏性通量
    /// - `second_order`: 是否启用 MUSCL 重构
    /// - `limiter_kind`, `venkat_k`: 限制器配置
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        mesh: &MeshTopology,
        gas: IdealGas,
        scheme_kind: ConvectiveSchemeKind,
        viscous: bool,
        second_order: bool,
        limiter_kind: LimiterKind,
        venkat_k: f64,
    ) -> Self {
        // 网格特征尺度：平均控制体体积的平方根
        let total_volume: f64 = (0..mesh.n_points()).map(|i| mesh.point(i).volume).sum();
        let mesh_scale = (total_volume / mesh.n_points().max(1) as f64).sqrt();

        let coloring = GreedyColoring::color_edges(mesh.n_points(), &mesh.edge_endpoints());
        log::debug!(
            "边着色: {} 色, 均衡度 {:.3}",
            coloring.num_colors,
            coloring.balance_factor()
        );

        Self {
            scheme: create_convective_scheme(scheme_kind, gas),
            viscous: viscous.then(|| ViscousFlux::new(gas)),
            muscl: MusclReconstructor::new(
                mesh.n_points(),
                second_order,
                limiter_kind,
                venkat_k,
                mesh_scale,
            ),
            coloring,
            scratch: Vec::new(),
        }
    }

    /// 对流格式名称
    pub fn scheme_name(&self) -> &'static str {
        self.scheme.name()
    }

    /// 边着色结果
    pub fn coloring(&self) -> &ColoringResult {
        &self.coloring
    }

    /// 装配所有内部边的残差与 Jacobian
    ///
    /// 调用前 `residual`/`jacobian` 应已清零；本方法只累加。
    pub fn assemble(
        &mut self,
        mesh: &MeshTopology,
        field: &FlowField,
        grads: &GradientStorage,
        residual: &mut Residual,
        mut jacobian: Option<&mut BlockCsrMatrix>,
        implicit: bool,
    ) {
        self.muscl.compute_limiters(mesh, field, grads);

        let Self {
            scheme,
            viscous,
            muscl,
            coloring,
            scratch,
        } = self;
        let scheme: &dyn ConvectiveScheme = scheme.as_ref();
        let viscous: Option<&ViscousFlux> = viscous.as_ref();
        let muscl: &MusclReconstructor = muscl;

        for color_edges in &coloring.color_edges {
            // 计算阶段：批内并行，纯函数求值
            color_edges
                .par_iter()
                .map(|&e| compute_edge(mesh, field, grads, scheme, viscous, muscl, e, implicit))
                .collect_into_vec(scratch);

            // 散布阶段：批内固定顺序串行
            for (&e, contrib) in color_edges.iter().zip(scratch.iter()) {
                let edge = mesh.edge(e);
                residual.add(edge.i, &contrib.flux);
                residual.sub(edge.j, &contrib.flux);

                if let Some(jac) = jacobian.as_deref_mut() {
                    if let (Some(ji), Some(jj)) = (&contrib.jac_i, &contrib.jac_j) {
                        jac.add_block(edge.i, edge.i, ji);
                        jac.add_block(edge.i, edge.j, jj);
                        jac.sub_block(edge.j, edge.i, ji);
                        jac.sub_block(edge.j, edge.j, jj);
                    }
                }
            }
        }
    }
}

/// 单条边的通量与 Jacobian 计算（纯函数）
#[allow(clippy::too_many_arguments)]
fn compute_edge(
    mesh: &MeshTopology,
    field: &FlowField,
    grads: &GradientStorage,
    scheme: &dyn ConvectiveScheme,
    viscous: Option<&ViscousFlux>,
    muscl: &MusclReconstructor,
    e: usize,
    implicit: bool,
) -> EdgeContribution {
    let edge = mesh.edge(e);
    let (left, right) = muscl.reconstruct_edge(mesh, field, grads, e);

    let conv = scheme.flux(&left, &right, edge.normal, implicit);
    let mut flux = conv.flux;
    let mut jac_i = conv.jac_i;
    let mut jac_j = conv.jac_j;

    if let Some(vf) = viscous {
        // 黏性通量用节点值与节点梯度（非重构值）
        let visc = vf.edge_flux(
            field.primitive(edge.i),
            field.primitive(edge.j),
            grads.point(edge.i),
            grads.point(edge.j),
            mesh.point(edge.i).coord,
            mesh.point(edge.j).coord,
            edge.normal,
            implicit,
        );
        for k in 0..N_VAR {
            flux[k] -= visc.flux[k];
        }
        if implicit {
            if let (Some(ji), Some(jj), Some(vi), Some(vj)) =
                (jac_i.as_mut(), jac_j.as_mut(), visc.jac_i, visc.jac_j)
            {
                for k in 0..N_VAR {
                    for l in 0..N_VAR {
                        ji[k][l] -= vi[k][l];
                        jj[k][l] -= vj[k][l];
                    }
                }
            }
        }
    }

    EdgeContribution { flux, jac_i, jac_j }
}

#[cfg(test)]
mod tests {
    use super::*;
    use af_mesh::generation;
    use glam::DVec2;

    use crate::numerics::gradient::{compute_gradients, GradientKind};

    fn uniform_setup(
        scheme: ConvectiveSchemeKind,
        second_order: bool,
    ) -> (MeshTopology, FlowField, GradientStorage, EdgeSweep) {
        let mesh = generation::cartesian(5, 4, 1.0, 0.8).unwrap();
        let gas = IdealGas::default();
        let prim = gas.primitive_from_rho_vel_p(1.0, DVec2::new(50.0, 10.0), 101325.0, 0.0);
        let field = FlowField::uniform(gas, mesh.n_points(), prim);
        let mut grads = GradientStorage::new(mesh.n_points());
        compute_gradients(GradientKind::GreenGauss, &mesh, &field, &mut grads);
        let sweep = EdgeSweep::new(
            &mesh,
            gas,
            scheme,
            false,
            second_order,
            LimiterKind::Venkatakrishnan,
            5.0,
        );
        (mesh, field, grads, sweep)
    }

    #[test]
    fn test_interior_contributions_telescope() {
        // 封闭域守恒: 均匀状态下所有内部边贡献之和为零向量
        // （逐点残差非零部分来自虚拟的边界缺口，全域求和严格望远镜抵消）
        for kind in [
            ConvectiveSchemeKind::Roe,
            ConvectiveSchemeKind::Hllc,
            ConvectiveSchemeKind::Ausm,
            ConvectiveSchemeKind::Rusanov,
        ] {
            let (mesh, field, grads, mut sweep) = uniform_setup(kind, false);
            let mut residual = Residual::new(mesh.n_points());
            sweep.assemble(&mesh, &field, &grads, &mut residual, None, false);

            let mut total = [0.0f64; N_VAR];
            for i in 0..mesh.n_points() {
                for k in 0..N_VAR {
                    total[k] += residual.block(i)[k];
                }
            }
            for k in 0..N_VAR {
                assert!(
                    total[k].abs() < 1e-6,
                    "{:?} 分量 {} 全域和 = {}",
                    kind,
                    k,
                    total[k]
                );
            }
        }
    }

    #[test]
    fn test_deterministic_across_repeated_assembly() {
        // 固定网格/状态/着色下装配结果逐位确定。
        // 注意：跨线程数的位级可复现性是明确的非目标（散布阶段
        // 串行有序保证了这里的确定性，但不同着色会改变求和顺序）。
        let (mesh, field, grads, mut sweep) = uniform_setup(ConvectiveSchemeKind::Roe, true);
        let mut r1 = Residual::new(mesh.n_points());
        sweep.assemble(&mesh, &field, &grads, &mut r1, None, false);
        let mut r2 = Residual::new(mesh.n_points());
        sweep.assemble(&mesh, &field, &grads, &mut r2, None, false);

        for i in 0..mesh.n_points() {
            for k in 0..N_VAR {
                assert_eq!(r1.block(i)[k].to_bits(), r2.block(i)[k].to_bits());
            }
        }
    }

    #[test]
    fn test_implicit_fills_jacobian_blocks() {
        let (mesh, field, grads, mut sweep) = uniform_setup(ConvectiveSchemeKind::Roe, false);
        let mut residual = Residual::new(mesh.n_points());
        let mut jac = BlockCsrMatrix::from_adjacency(mesh.n_points(), mesh.adjacency());
        sweep.assemble(&mesh, &field, &grads, &mut residual, Some(&mut jac), true);

        // 任取一条边：对角与非对角块都应非零
        let e = mesh.edge(0);
        let diag = jac.block(e.i, e.i).unwrap();
        let off = jac.block(e.i, e.j).unwrap();
        let diag_norm: f64 = diag.iter().flatten().map(|v| v.abs()).sum();
        let off_norm: f64 = off.iter().flatten().map(|v| v.abs()).sum();
        assert!(diag_norm > 1e-10);
        assert!(off_norm > 1e-10);
    }
}
