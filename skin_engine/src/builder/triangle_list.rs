//! 三角形列表的顶点缓存优化
//!
//! 贪心地选择与 FIFO 缓存重合顶点最多的下一个三角形。

use std::collections::VecDeque;

/// 模拟的后变换缓存大小
pub const VERTEX_CACHE_SIZE: usize = 16;

/// 重新排列三角形顺序，返回新的索引列表
///
/// `indices.len()` 必须是 3 的倍数，每个三角形内部的顶点顺序保持不变。
pub fn optimize_triangle_order(indices: &[u32], num_vertices: usize) -> Vec<u32> {
    let num_triangles = indices.len() / 3;
    if num_triangles < 2 {
        return indices.to_vec();
    }

    let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); num_vertices];
    for (triangle, corners) in indices.chunks_exact(3).enumerate() {
        for &vertex in corners {
            adjacency[vertex as usize].push(triangle);
        }
    }

    let mut emitted = vec![false; num_triangles];
    let mut cache: VecDeque<u32> = VecDeque::with_capacity(VERTEX_CACHE_SIZE);
    let mut result = Vec::with_capacity(indices.len());
    let mut next_unemitted = 0;

    for _ in 0..num_triangles {
        // 候选：与缓存中顶点相邻、尚未输出的三角形
        let mut best: Option<(usize, usize)> = None;
        for &vertex in &cache {
            for &triangle in &adjacency[vertex as usize] {
                if emitted[triangle] {
                    continue;
                }
                let score = indices[triangle * 3..triangle * 3 + 3]
                    .iter()
                    .filter(|v| cache.contains(v))
                    .count();
                let better = match best {
                    None => true,
                    Some((best_triangle, best_score)) => {
                        score > best_score || (score == best_score && triangle < best_triangle)
                    }
                };
                if better {
                    best = Some((triangle, score));
                }
            }
        }

        let triangle = match best {
            Some((triangle, _)) => triangle,
            None => {
                while emitted[next_unemitted] {
                    next_unemitted += 1;
                }
                next_unemitted
            }
        };

        emitted[triangle] = true;
        for &vertex in &indices[triangle * 3..triangle * 3 + 3] {
            result.push(vertex);
            if !cache.contains(&vertex) {
                if cache.len() == VERTEX_CACHE_SIZE {
                    cache.pop_front();
                }
                cache.push_back(vertex);
            }
        }
    }

    result
}

/// FIFO 缓存下每个三角形的平均未命中数
pub fn calc_cache_miss_ratio(indices: &[u32]) -> f32 {
    let num_triangles = indices.len() / 3;
    if num_triangles == 0 {
        return 0.0;
    }
    let mut cache: VecDeque<u32> = VecDeque::with_capacity(VERTEX_CACHE_SIZE);
    let mut misses = 0usize;
    for &vertex in indices {
        if !cache.contains(&vertex) {
            misses += 1;
            if cache.len() == VERTEX_CACHE_SIZE {
                cache.pop_front();
            }
            cache.push_back(vertex);
        }
    }
    misses as f32 / num_triangles as f32
}
