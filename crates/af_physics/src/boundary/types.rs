// crates/af_physics/src/boundary/types.rs

//! 边界条件类型定义
//!
//! 本模块定义可压缩流求解所需的边界条件类型：
//! - BoundaryKind: 边界类型枚举
//! - ChtCouplingMode: 共轭传热耦合模式
//! - MarkerCondition: 单个边界标记的完整条件配置
//! - ConjugateHeatData: 外部求解器提供的共轭温度/换热系数

use serde::{Deserialize, Serialize};

// ============================================================
// 边界类型枚举
// ============================================================

/// 边界类型枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryKind {
    /// 无黏固壁（弱压力通量）
    #[default]
    EulerWall,

    /// 远场（特征量重构）
    FarField,

    /// 对称边界（无黏镜像）
    Symmetry,

    /// 给定热流密度的无滑移壁（弱 Neumann）
    HeatFluxWall,

    /// 等温无滑移壁（单侧温度梯度弱通量）
    IsothermalWall,

    /// Robin 换热壁: q = h·(T∞ − T_wall)
    HeatTransferWall,

    /// 共轭传热界面（外部提供温度/换热系数）
    ConjugateHeatInterface,

    /// 吹气入流（亚声速特征入流重构）
    InletBlowing,
}

impl BoundaryKind {
    /// 是否为无滑移黏性壁（速度强 Dirichlet + 能量弱通量）
    #[inline]
    pub fn is_viscous_wall(&self) -> bool {
        matches!(
            self,
            Self::HeatFluxWall
                | Self::IsothermalWall
                | Self::HeatTransferWall
                | Self::ConjugateHeatInterface
        )
    }

    /// 是否需要外部共轭数据
    #[inline]
    pub fn requires_conjugate_data(&self) -> bool {
        matches!(self, Self::ConjugateHeatInterface)
    }

    /// 是否为弱施加（幽灵状态 + 内部格式）
    #[inline]
    pub fn is_weak(&self) -> bool {
        matches!(self, Self::EulerWall | Self::FarField | Self::Symmetry)
    }
}

impl std::fmt::Display for BoundaryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::EulerWall => "EulerWall",
            Self::FarField => "FarField",
            Self::Symmetry => "Symmetry",
            Self::HeatFluxWall => "HeatFluxWall",
            Self::IsothermalWall => "IsothermalWall",
            Self::HeatTransferWall => "HeatTransferWall",
            Self::ConjugateHeatInterface => "ConjugateHeatInterface",
            Self::InletBlowing => "InletBlowing",
        };
        write!(f, "{}", name)
    }
}

// ============================================================
// 共轭传热耦合模式
// ============================================================

/// 共轭传热耦合模式
///
/// 无法识别的模式是致命配置错误（配置解析阶段即拒绝）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChtCouplingMode {
    /// 平均温度 + Neumann 热流
    AveragedTemperatureNeumann,
    /// 平均温度 + Robin 热流
    AveragedTemperatureRobin,
    /// 直接温度 + Neumann 热流
    DirectTemperatureNeumann,
    /// 直接温度 + Robin 热流
    DirectTemperatureRobin,
}

impl ChtCouplingMode {
    /// 壁温是否取两侧加权平均（否则直接取共轭温度）
    #[inline]
    pub fn is_averaged(&self) -> bool {
        matches!(
            self,
            Self::AveragedTemperatureNeumann | Self::AveragedTemperatureRobin
        )
    }
}

// ============================================================
// 标记条件配置
// ============================================================

/// 单个边界标记的条件配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkerCondition {
    /// 标记名（与网格标记匹配）
    pub name: String,

    /// 边界类型
    pub kind: BoundaryKind,

    /// 壁面热流密度 [W/m²]（HeatFluxWall）
    #[serde(default)]
    pub heat_flux: f64,

    /// 壁面温度 [K]（IsothermalWall）
    #[serde(default)]
    pub wall_temperature: f64,

    /// 换热系数 [W/(m²·K)]（HeatTransferWall）
    #[serde(default)]
    pub transfer_coefficient: f64,

    /// 环境温度 [K]（HeatTransferWall）
    #[serde(default)]
    pub ambient_temperature: f64,

    /// 吹气速度比（相对自由流速度，InletBlowing）
    #[serde(default)]
    pub blowing_ratio: f64,

    /// 吹气区强制温度 [K]（InletBlowing，None = 温度自由）
    ///
    /// 经配置接口给定；不做任何文件探测。
    #[serde(default)]
    pub blowing_temperature: Option<f64>,

    /// 共轭传热耦合模式（ConjugateHeatInterface 必填）
    #[serde(default)]
    pub cht_coupling: Option<ChtCouplingMode>,

    /// 是否在该标记上启用壁面函数
    #[serde(default)]
    pub wall_function: bool,
}

impl MarkerCondition {
    /// 无黏固壁
    pub fn euler_wall(name: impl Into<String>) -> Self {
        Self::base(name, BoundaryKind::EulerWall)
    }

    /// 远场
    pub fn far_field(name: impl Into<String>) -> Self {
        Self::base(name, BoundaryKind::FarField)
    }

    /// 对称边界
    pub fn symmetry(name: impl Into<String>) -> Self {
        Self::base(name, BoundaryKind::Symmetry)
    }

    /// 给定热流的无滑移壁
    pub fn heat_flux_wall(name: impl Into<String>, heat_flux: f64) -> Self {
        Self {
            heat_flux,
            ..Self::base(name, BoundaryKind::HeatFluxWall)
        }
    }

    /// 等温无滑移壁
    pub fn isothermal_wall(name: impl Into<String>, wall_temperature: f64) -> Self {
        Self {
            wall_temperature,
            ..Self::base(name, BoundaryKind::IsothermalWall)
        }
    }

    /// Robin 换热壁
    pub fn heat_transfer_wall(
        name: impl Into<String>,
        transfer_coefficient: f64,
        ambient_temperature: f64,
    ) -> Self {
        Self {
            transfer_coefficient,
            ambient_temperature,
            ..Self::base(name, BoundaryKind::HeatTransferWall)
        }
    }

    /// 共轭传热界面
    pub fn conjugate_heat(name: impl Into<String>, coupling: ChtCouplingMode) -> Self {
        Self {
            cht_coupling: Some(coupling),
            ..Self::base(name, BoundaryKind::ConjugateHeatInterface)
        }
    }

    /// 吹气入流
    pub fn inlet_blowing(name: impl Into<String>, blowing_ratio: f64) -> Self {
        Self {
            blowing_ratio,
            ..Self::base(name, BoundaryKind::InletBlowing)
        }
    }

    /// 启用壁面函数
    pub fn with_wall_function(mut self) -> Self {
        self.wall_function = true;
        self
    }

    /// 设置吹气温度
    pub fn with_blowing_temperature(mut self, temperature: f64) -> Self {
        self.blowing_temperature = Some(temperature);
        self
    }

    fn base(name: impl Into<String>, kind: BoundaryKind) -> Self {
        Self {
            name: name.into(),
            kind,
            heat_flux: 0.0,
            wall_temperature: 0.0,
            transfer_coefficient: 0.0,
            ambient_temperature: 0.0,
            blowing_ratio: 0.0,
            blowing_temperature: None,
            cht_coupling: None,
            wall_function: false,
        }
    }
}

// ============================================================
// 共轭传热数据
// ============================================================

/// 外部求解器提供的共轭传热数据（按标记顶点顺序）
#[derive(Debug, Clone, Default)]
pub struct ConjugateHeatData {
    /// 共轭温度 [K]
    pub temperature: Vec<f64>,
    /// 共轭换热系数 [W/(m²·K)]
    pub transfer_coefficient: Vec<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_properties() {
        assert!(BoundaryKind::HeatFluxWall.is_viscous_wall());
        assert!(BoundaryKind::ConjugateHeatInterface.is_viscous_wall());
        assert!(BoundaryKind::ConjugateHeatInterface.requires_conjugate_data());
        assert!(BoundaryKind::EulerWall.is_weak());
        assert!(!BoundaryKind::IsothermalWall.is_weak());
        assert!(!BoundaryKind::InletBlowing.is_weak());
    }

    #[test]
    fn test_cht_mode_classification() {
        assert!(ChtCouplingMode::AveragedTemperatureNeumann.is_averaged());
        assert!(ChtCouplingMode::AveragedTemperatureRobin.is_averaged());
        assert!(!ChtCouplingMode::DirectTemperatureNeumann.is_averaged());
        assert!(!ChtCouplingMode::DirectTemperatureRobin.is_averaged());
    }

    #[test]
    fn test_builders() {
        let wall = MarkerCondition::isothermal_wall("lower_wall", 350.0).with_wall_function();
        assert_eq!(wall.kind, BoundaryKind::IsothermalWall);
        assert!((wall.wall_temperature - 350.0).abs() < 1e-12);
        assert!(wall.wall_function);

        let inlet = MarkerCondition::inlet_blowing("blow", 0.01).with_blowing_temperature(400.0);
        assert_eq!(inlet.blowing_temperature, Some(400.0));
    }

    #[test]
    fn test_unknown_kind_rejected_by_serde() {
        // 未知边界类型字符串在反序列化阶段即失败（致命配置错误）
        let json = r#"{"name": "w", "kind": "slip_wall"}"#;
        let parsed: Result<MarkerCondition, _> = serde_json::from_str(json);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_unknown_cht_mode_rejected_by_serde() {
        let json = r#"{
            "name": "interface",
            "kind": "conjugate_heat_interface",
            "cht_coupling": "averaged_flux_only"
        }"#;
        let parsed: Result<MarkerCondition, _> = serde_json::from_str(json);
        assert!(parsed.is_err());
    }
}
