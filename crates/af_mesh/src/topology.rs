// crates/af_mesh/src/topology.rs

//! 网格拓扑与查询接口
//!
//! 点中心（对偶单元）有限体积网格：每个网格点对应一个控制体，
//! 每条内部边携带面积加权法向量，边界以标记（marker）组织顶点列表。
//!
//! 拓扑在载入后不可变；所有几何/连接查询都是只读的。

use af_foundation::{AfError, AfResult};
use glam::DVec2;

/// 网格点（对偶控制体）
#[derive(Debug, Clone, Copy)]
pub struct Point {
    /// 坐标
    pub coord: DVec2,
    /// 对偶单元体积（2D 中为面积）
    pub volume: f64,
    /// 是否属于本分区（false 表示 halo/ghost 点）
    pub is_domain: bool,
}

/// 内部边
///
/// 连接两个相邻点的对偶面。法向量按面积加权，方向从 `i` 指向 `j`。
#[derive(Debug, Clone, Copy)]
pub struct Edge {
    /// 起点索引
    pub i: usize,
    /// 终点索引
    pub j: usize,
    /// 面积加权法向量（i → j 方向）
    pub normal: DVec2,
}

impl Edge {
    /// 法向量模长（对偶面面积）
    #[inline]
    pub fn area(&self) -> f64 {
        self.normal.length()
    }

    /// 单位法向量
    #[inline]
    pub fn unit_normal(&self) -> DVec2 {
        self.normal / self.area()
    }
}

/// 边界顶点
#[derive(Debug, Clone, Copy)]
pub struct BoundaryVertex {
    /// 对应的网格点索引
    pub point: usize,
    /// 面积加权外法向量（指向计算域外）
    pub normal: DVec2,
    /// 最近的内部法向邻点索引（单侧梯度重构用）
    pub normal_neighbor: usize,
}

impl BoundaryVertex {
    /// 边界面面积
    #[inline]
    pub fn area(&self) -> f64 {
        self.normal.length()
    }

    /// 单位外法向量
    #[inline]
    pub fn unit_normal(&self) -> DVec2 {
        self.normal / self.area()
    }
}

/// 边界标记
#[derive(Debug, Clone)]
pub struct Marker {
    /// 标记名（与配置中的边界条件匹配）
    pub name: String,
    /// 该标记下的边界顶点列表
    pub vertices: Vec<BoundaryVertex>,
}

/// 网格拓扑
///
/// 构造后不可变。邻接表在构造时由边列表导出。
#[derive(Debug, Clone)]
pub struct MeshTopology {
    points: Vec<Point>,
    edges: Vec<Edge>,
    markers: Vec<Marker>,
    /// 点 → 相邻点
    neighbors: Vec<Vec<usize>>,
    /// 点 → 关联边
    point_edges: Vec<Vec<usize>>,
}

impl MeshTopology {
    /// 从点/边/标记列表构造拓扑
    ///
    /// # 错误
    ///
    /// 边端点或标记顶点索引越界时返回 [`AfError::InvalidMesh`]。
    pub fn new(points: Vec<Point>, edges: Vec<Edge>, markers: Vec<Marker>) -> AfResult<Self> {
        let n = points.len();
        for (k, e) in edges.iter().enumerate() {
            if e.i >= n || e.j >= n {
                return Err(AfError::invalid_mesh(format!(
                    "边 {} 的端点 ({}, {}) 超出点数 {}",
                    k, e.i, e.j, n
                )));
            }
            if e.i == e.j {
                return Err(AfError::invalid_mesh(format!("边 {} 的两端点相同", k)));
            }
        }
        for m in &markers {
            for v in &m.vertices {
                if v.point >= n || v.normal_neighbor >= n {
                    return Err(AfError::invalid_mesh(format!(
                        "标记 '{}' 的顶点索引越界",
                        m.name
                    )));
                }
            }
        }

        let mut neighbors = vec![Vec::new(); n];
        let mut point_edges = vec![Vec::new(); n];
        for (k, e) in edges.iter().enumerate() {
            neighbors[e.i].push(e.j);
            neighbors[e.j].push(e.i);
            point_edges[e.i].push(k);
            point_edges[e.j].push(k);
        }
        for nb in &mut neighbors {
            nb.sort_unstable();
            nb.dedup();
        }

        Ok(Self {
            points,
            edges,
            markers,
            neighbors,
            point_edges,
        })
    }

    /// 点数
    #[inline]
    pub fn n_points(&self) -> usize {
        self.points.len()
    }

    /// 边数
    #[inline]
    pub fn n_edges(&self) -> usize {
        self.edges.len()
    }

    /// 获取点
    #[inline]
    pub fn point(&self, i: usize) -> &Point {
        &self.points[i]
    }

    /// 点是否属于本分区
    #[inline]
    pub fn is_domain(&self, i: usize) -> bool {
        self.points[i].is_domain
    }

    /// 获取边
    #[inline]
    pub fn edge(&self, e: usize) -> &Edge {
        &self.edges[e]
    }

    /// 所有边
    #[inline]
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// 点的相邻点
    #[inline]
    pub fn neighbors(&self, i: usize) -> &[usize] {
        &self.neighbors[i]
    }

    /// 完整邻接表（Jacobian 稀疏结构构造用）
    #[inline]
    pub fn adjacency(&self) -> &[Vec<usize>] {
        &self.neighbors
    }

    /// 点关联的边
    #[inline]
    pub fn point_edges(&self, i: usize) -> &[usize] {
        &self.point_edges[i]
    }

    /// 所有边界标记
    #[inline]
    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    /// 按名称查找标记
    pub fn marker(&self, name: &str) -> Option<&Marker> {
        self.markers.iter().find(|m| m.name == name)
    }

    /// 两点间距离
    #[inline]
    pub fn distance(&self, i: usize, j: usize) -> f64 {
        (self.points[i].coord - self.points[j].coord).length()
    }

    /// 边端点对列表（着色用）
    pub fn edge_endpoints(&self) -> Vec<(usize, usize)> {
        self.edges.iter().map(|e| (e.i, e.j)).collect()
    }
}
