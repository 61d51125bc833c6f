// crates/af_mesh/src/generation.rs

//! 结构化测试网格生成
//!
//! 生成点中心笛卡尔网格及其对偶控制体几何。主要用于测试与 CLI 演示；
//! 生产网格由外部读取器提供（本工作区不包含 SU2/CGNS 读取器）。

use af_foundation::{AfError, AfResult};
use glam::DVec2;

use crate::topology::{BoundaryVertex, Edge, Marker, MeshTopology, Point};

/// 生成 nx × ny 点的矩形笛卡尔网格
///
/// 对偶单元为以网格点为中心、在域边界处截断的矩形，
/// 保证每个控制体封闭（边法向 + 边界法向之和为零）。
///
/// 四条边界的标记名固定为 `left` / `right` / `bottom` / `top`。
///
/// # 参数
/// - `nx`, `ny`: 每个方向的点数（≥ 2）
/// - `lx`, `ly`: 域尺寸
pub fn cartesian(nx: usize, ny: usize, lx: f64, ly: f64) -> AfResult<MeshTopology> {
    if nx < 2 || ny < 2 {
        return Err(AfError::invalid_mesh(format!(
            "笛卡尔网格至少需要 2x2 个点, 实际 {}x{}",
            nx, ny
        )));
    }
    if lx <= 0.0 || ly <= 0.0 {
        return Err(AfError::invalid_mesh("域尺寸必须为正"));
    }

    let dx = lx / (nx - 1) as f64;
    let dy = ly / (ny - 1) as f64;
    let idx = |ix: usize, iy: usize| iy * nx + ix;

    // 对偶单元在边界行/列处截断为一半
    let cell_w = |ix: usize| if ix == 0 || ix == nx - 1 { dx / 2.0 } else { dx };
    let cell_h = |iy: usize| if iy == 0 || iy == ny - 1 { dy / 2.0 } else { dy };

    let mut points = Vec::with_capacity(nx * ny);
    for iy in 0..ny {
        for ix in 0..nx {
            points.push(Point {
                coord: DVec2::new(ix as f64 * dx, iy as f64 * dy),
                volume: cell_w(ix) * cell_h(iy),
                is_domain: true,
            });
        }
    }

    let mut edges = Vec::new();
    for iy in 0..ny {
        for ix in 0..nx {
            // 水平边：对偶面高度为单元高度
            if ix + 1 < nx {
                edges.push(Edge {
                    i: idx(ix, iy),
                    j: idx(ix + 1, iy),
                    normal: DVec2::new(cell_h(iy), 0.0),
                });
            }
            // 垂直边：对偶面宽度为单元宽度
            if iy + 1 < ny {
                edges.push(Edge {
                    i: idx(ix, iy),
                    j: idx(ix, iy + 1),
                    normal: DVec2::new(0.0, cell_w(ix)),
                });
            }
        }
    }

    let mut left = Vec::with_capacity(ny);
    let mut right = Vec::with_capacity(ny);
    for iy in 0..ny {
        left.push(BoundaryVertex {
            point: idx(0, iy),
            normal: DVec2::new(-cell_h(iy), 0.0),
            normal_neighbor: idx(1, iy),
        });
        right.push(BoundaryVertex {
            point: idx(nx - 1, iy),
            normal: DVec2::new(cell_h(iy), 0.0),
            normal_neighbor: idx(nx - 2, iy),
        });
    }
    let mut bottom = Vec::with_capacity(nx);
    let mut top = Vec::with_capacity(nx);
    for ix in 0..nx {
        bottom.push(BoundaryVertex {
            point: idx(ix, 0),
            normal: DVec2::new(0.0, -cell_w(ix)),
            normal_neighbor: idx(ix, 1),
        });
        top.push(BoundaryVertex {
            point: idx(ix, ny - 1),
            normal: DVec2::new(0.0, cell_w(ix)),
            normal_neighbor: idx(ix, ny - 2),
        });
    }

    let markers = vec![
        Marker {
            name: "left".into(),
            vertices: left,
        },
        Marker {
            name: "right".into(),
            vertices: right,
        },
        Marker {
            name: "bottom".into(),
            vertices: bottom,
        },
        Marker {
            name: "top".into(),
            vertices: top,
        },
    ];

    MeshTopology::new(points, edges, markers)
}
