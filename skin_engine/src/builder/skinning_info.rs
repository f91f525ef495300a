//! 构建期蒙皮信息（按原始顶点）

use crate::mesh::{optimize_influence_row, SkinInfluence};

#[derive(Clone, Debug, Default)]
pub struct MeshBuilderSkinningInfo {
    influences: Vec<Vec<SkinInfluence>>,
}

impl MeshBuilderSkinningInfo {
    pub fn new(num_org_vertices: usize) -> Self {
        Self {
            influences: vec![Vec::new(); num_org_vertices],
        }
    }

    pub fn num_org_vertices(&self) -> usize {
        self.influences.len()
    }

    pub fn add_influence(&mut self, org_vertex: usize, node_nr: usize, weight: f32) {
        self.influences[org_vertex].push(SkinInfluence::new(node_nr, weight, 0));
    }

    pub fn num_influences(&self, org_vertex: usize) -> usize {
        self.influences[org_vertex].len()
    }

    pub fn influence(&self, org_vertex: usize, index: usize) -> &SkinInfluence {
        &self.influences[org_vertex][index]
    }

    pub fn influences(&self, org_vertex: usize) -> &[SkinInfluence] {
        &self.influences[org_vertex]
    }

    pub fn remove_influence(&mut self, org_vertex: usize, index: usize) {
        self.influences[org_vertex].remove(index);
    }

    /// 所有顶点的总权重是否都接近 1
    pub fn is_normalized(&self, tolerance: f32) -> bool {
        self.influences.iter().all(|row| {
            row.is_empty() || (row.iter().map(|i| i.weight).sum::<f32>() - 1.0).abs() <= tolerance
        })
    }

    /// 剔除小权重、限制数量、不足 1 时补足（总权重 >= 1 不缩放）
    pub fn optimize_skinning_influences(&mut self, tolerance: f32, max_weights: usize) {
        for row in &mut self.influences {
            optimize_influence_row(row, tolerance, max_weights);
        }
    }

    /// 每个顶点的影响按权重降序排列
    pub fn sort_influences(&mut self) {
        for row in &mut self.influences {
            row.sort_by(|a, b| b.weight.total_cmp(&a.weight));
        }
    }

    /// 把某原始顶点引用的骨骼加入 out（去重）
    pub fn collect_bones(&self, org_vertex: usize, out: &mut Vec<usize>) {
        for influence in &self.influences[org_vertex] {
            if !out.contains(&influence.node_nr) {
                out.push(influence.node_nr);
            }
        }
    }
}
