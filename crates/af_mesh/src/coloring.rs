// crates/af_mesh/src/coloring.rs

//! 图着色算法
//!
//! 用于并行残差装配中的边分组：同一颜色的边不共享任何端点，
//! 因此同色边的通量可以无竞争地并行散布到共享的残差/Jacobian 存储。

use std::collections::HashSet;

/// 着色结果
#[derive(Debug, Clone)]
pub struct ColoringResult {
    /// 每条边的颜色
    pub edge_colors: Vec<usize>,
    /// 颜色数量
    pub num_colors: usize,
    /// 每个颜色包含的边数
    pub color_sizes: Vec<usize>,
    /// 每个颜色的边索引
    pub color_edges: Vec<Vec<usize>>,
}

impl ColoringResult {
    /// 获取指定颜色的边
    pub fn edges_with_color(&self, color: usize) -> &[usize] {
        if color < self.color_edges.len() {
            &self.color_edges[color]
        } else {
            &[]
        }
    }

    /// 获取边的颜色
    pub fn color_of(&self, edge: usize) -> Option<usize> {
        self.edge_colors.get(edge).copied()
    }

    /// 检查是否为有效着色（同色边不共享端点）
    pub fn is_valid(&self, endpoints: &[(usize, usize)]) -> bool {
        for color in 0..self.num_colors {
            let mut touched = HashSet::new();
            for &e in &self.color_edges[color] {
                let (i, j) = endpoints[e];
                if !touched.insert(i) || !touched.insert(j) {
                    return false;
                }
            }
        }
        true
    }

    /// 计算负载均衡度 (1.0 = 完美均衡)
    pub fn balance_factor(&self) -> f64 {
        if self.color_sizes.is_empty() {
            return 1.0;
        }

        let min_size = *self.color_sizes.iter().min().unwrap_or(&0);
        let max_size = *self.color_sizes.iter().max().unwrap_or(&1);

        if max_size == 0 {
            1.0
        } else {
            min_size as f64 / max_size as f64
        }
    }
}

/// 贪心边着色器
pub struct GreedyColoring;

impl GreedyColoring {
    /// 对边进行着色
    ///
    /// 两条边"相邻"当且仅当它们共享端点。按度数降序贪心分配最小可用颜色。
    ///
    /// # 参数
    /// - `num_points`: 点数量
    /// - `endpoints`: 每条边的端点对 (i, j)
    pub fn color_edges(num_points: usize, endpoints: &[(usize, usize)]) -> ColoringResult {
        let num_edges = endpoints.len();
        if num_edges == 0 {
            return ColoringResult {
                edge_colors: Vec::new(),
                num_colors: 0,
                color_sizes: Vec::new(),
                color_edges: Vec::new(),
            };
        }

        // 点 → 关联边
        let mut point_edges: Vec<Vec<usize>> = vec![Vec::new(); num_points];
        for (e, &(i, j)) in endpoints.iter().enumerate() {
            point_edges[i].push(e);
            point_edges[j].push(e);
        }

        // 边的度数 = 共享端点的其他边数量
        let degree = |e: usize| -> usize {
            let (i, j) = endpoints[e];
            point_edges[i].len() + point_edges[j].len() - 2
        };

        // 按度数排序（高度数优先）
        let mut order: Vec<usize> = (0..num_edges).collect();
        order.sort_by_key(|&e| std::cmp::Reverse(degree(e)));

        // 贪心着色
        let mut colors = vec![usize::MAX; num_edges];
        let mut num_colors = 0;

        for e in order {
            let (i, j) = endpoints[e];
            let used_colors: HashSet<usize> = point_edges[i]
                .iter()
                .chain(point_edges[j].iter())
                .filter_map(|&other| {
                    if other != e && colors[other] != usize::MAX {
                        Some(colors[other])
                    } else {
                        None
                    }
                })
                .collect();

            let mut color = 0;
            while used_colors.contains(&color) {
                color += 1;
            }

            colors[e] = color;
            num_colors = num_colors.max(color + 1);
        }

        // 统计每个颜色的边
        let mut color_edges: Vec<Vec<usize>> = vec![Vec::new(); num_colors];
        for (e, &color) in colors.iter().enumerate() {
            color_edges[color].push(e);
        }

        let color_sizes: Vec<usize> = color_edges.iter().map(|c| c.len()).collect();

        ColoringResult {
            edge_colors: colors,
            num_colors,
            color_sizes,
            color_edges,
        }
    }
}
