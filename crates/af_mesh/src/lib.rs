// crates/af_mesh/src/lib.rs

//! AeroFlux Mesh Layer (Layer 2)
//!
//! 边基有限体积网格拓扑。求解器核心只通过本层提供的窄接口访问网格：
//! 点数/归属查询、边端点与法向、对偶体积、边界标记顶点枚举、
//! 最近内部邻点查询、halo 交换原语。
//!
//! # 模块概览
//!
//! - [`topology`]: `MeshTopology` 网格拓扑与查询接口
//! - [`coloring`]: 贪心边着色（并行装配的冲突消除）
//! - [`halo`]: `HaloExchange` 通信抽象与单分区实现
//! - [`generation`]: 结构化测试网格生成

#![warn(clippy::all)]

pub mod coloring;
pub mod generation;
pub mod halo;
pub mod topology;

pub use coloring::{ColoringResult, GreedyColoring};
pub use halo::{HaloExchange, NoHalo};
pub use topology::{BoundaryVertex, Edge, Marker, MeshTopology, Point};
