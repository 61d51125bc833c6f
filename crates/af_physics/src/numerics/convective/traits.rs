// crates/af_physics/src/numerics/convective/traits.rs

//! 对流格式统一接口

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::fluid::Primitive;
use crate::{FluxVector, JacobianBlock, ZERO_FLUX};

/// 对流格式类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConvectiveSchemeKind {
    /// Roe 近似黎曼求解器（Harten 熵修正）
    #[default]
    Roe,
    /// HLLC
    Hllc,
    /// AUSM+
    Ausm,
    /// Rusanov（标量耗散中心格式）
    Rusanov,
}

/// 通量计算结果
///
/// 按值返回；Jacobian 块仅在请求隐式线性化时填充。
#[derive(Debug, Clone, Copy)]
pub struct FluxResult {
    /// 数值通量（含面积权）
    pub flux: FluxVector,
    /// ∂F/∂U_i
    pub jac_i: Option<JacobianBlock>,
    /// ∂F/∂U_j
    pub jac_j: Option<JacobianBlock>,
}

impl FluxResult {
    /// 零通量、无 Jacobian
    pub const ZERO: Self = Self {
        flux: ZERO_FLUX,
        jac_i: None,
        jac_j: None,
    };

    /// 仅通量（显式路径）
    pub fn explicit(flux: FluxVector) -> Self {
        Self {
            flux,
            jac_i: None,
            jac_j: None,
        }
    }

    /// 数值有效性检查
    pub fn is_valid(&self) -> bool {
        self.flux.iter().all(|v| v.is_finite())
    }
}

/// 格式能力标志
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemeCapabilities {
    /// 是否为上风格式
    pub upwind: bool,
    /// 是否包含熵修正
    pub has_entropy_fix: bool,
    /// 是否提供接触间断分辨
    pub resolves_contact: bool,
}

/// 对流格式 trait
///
/// 实现必须是输入的纯函数（无隐藏全局状态），因此天然并行安全。
pub trait ConvectiveScheme: Send + Sync {
    /// 格式名称
    fn name(&self) -> &'static str;

    /// 格式能力
    fn capabilities(&self) -> SchemeCapabilities;

    /// 计算数值通量
    ///
    /// # 参数
    /// - `left`, `right`: 左右重构原始状态
    /// - `normal`: 面积加权法向量（从左指向右）
    /// - `implicit`: 是否同时计算 Jacobian 块
    fn flux(&self, left: &Primitive, right: &Primitive, normal: DVec2, implicit: bool)
        -> FluxResult;
}
