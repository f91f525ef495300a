//! 蒙皮影响层（共享层，按原始顶点索引）

/// 单个骨骼影响
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SkinInfluence {
    /// 骨骼（骨架节点）索引
    pub node_nr: usize,
    pub weight: f32,
    /// 子网格局部骨骼索引，烘焙后填写
    pub bone_nr: usize,
}

impl SkinInfluence {
    pub fn new(node_nr: usize, weight: f32, bone_nr: usize) -> Self {
        Self {
            node_nr,
            weight,
            bone_nr,
        }
    }
}

/// 按原始顶点存放的不定长影响列表
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SkinningInfoVertexAttributeLayer {
    name: String,
    influences: Vec<Vec<SkinInfluence>>,
}

impl SkinningInfoVertexAttributeLayer {
    pub fn new(num_org_vertices: usize) -> Self {
        Self {
            name: String::new(),
            influences: vec![Vec::new(); num_org_vertices],
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn num_attributes(&self) -> usize {
        self.influences.len()
    }

    /// 追加一个影响，不做去重
    pub fn add_influence(
        &mut self,
        org_vertex: usize,
        node_nr: usize,
        weight: f32,
        bone_nr: usize,
    ) {
        self.influences[org_vertex].push(SkinInfluence::new(node_nr, weight, bone_nr));
    }

    pub fn num_influences(&self, org_vertex: usize) -> usize {
        self.influences[org_vertex].len()
    }

    pub fn influence(&self, org_vertex: usize, index: usize) -> &SkinInfluence {
        &self.influences[org_vertex][index]
    }

    pub fn influence_mut(&mut self, org_vertex: usize, index: usize) -> &mut SkinInfluence {
        &mut self.influences[org_vertex][index]
    }

    /// 某个原始顶点的全部影响
    pub fn influences(&self, org_vertex: usize) -> &[SkinInfluence] {
        &self.influences[org_vertex]
    }

    pub fn remove_influence(&mut self, org_vertex: usize, index: usize) {
        self.influences[org_vertex].remove(index);
    }

    /// 优化影响：剔除小权重、限制数量、补足到 1
    ///
    /// 只有总权重小于 1 时才会重新归一化，总权重 >= 1 保持原样。
    pub fn optimize_influences(&mut self, tolerance: f32, max_weights: usize) {
        for row in &mut self.influences {
            optimize_influence_row(row, tolerance, max_weights);
        }
    }

    /// 所有影响都指向同一骨骼时合并为权重 1 的单个影响
    pub fn collapse_influences(&mut self, org_vertex: usize) {
        let row = &mut self.influences[org_vertex];
        let Some(first) = row.first().copied() else {
            return;
        };
        if row.iter().all(|i| i.node_nr == first.node_nr) {
            row.clear();
            row.push(SkinInfluence::new(first.node_nr, 1.0, first.bone_nr));
        }
    }

    /// 把引用 old_node 的影响改为 new_node
    pub fn remap_influences(&mut self, old_node: usize, new_node: usize) {
        for influence in self.influences.iter_mut().flatten() {
            if influence.node_nr == old_node {
                influence.node_nr = new_node;
            }
        }
    }

    pub fn remove_all_influences_for_node(&mut self, node_nr: usize) {
        for row in &mut self.influences {
            row.retain(|i| i.node_nr != node_nr);
        }
    }

    /// 收集被引用的骨骼（去重，保持首次出现顺序）
    pub fn collect_influenced_nodes(&self, out: &mut Vec<usize>) {
        self.collect_influenced_nodes_in_range(0, self.influences.len(), out);
    }

    /// 只收集原始顶点 [start, end) 范围内的骨骼
    pub fn collect_influenced_nodes_in_range(
        &self,
        start: usize,
        end: usize,
        out: &mut Vec<usize>,
    ) {
        out.clear();
        let end = end.min(self.influences.len());
        for row in &self.influences[start.min(end)..end] {
            for influence in row {
                if !out.contains(&influence.node_nr) {
                    out.push(influence.node_nr);
                }
            }
        }
    }

    /// 最大影响数
    pub fn max_num_influences(&self) -> usize {
        self.influences.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// 删除原始顶点闭区间 [start, end]
    pub fn remove_attributes(&mut self, start: usize, end: usize) {
        self.influences.drain(start..=end);
    }
}

/// 单行影响的优化，构建器与运行时层共用
pub(crate) fn optimize_influence_row(
    row: &mut Vec<SkinInfluence>,
    tolerance: f32,
    max_weights: usize,
) {
    // 1. 剔除小权重，至少保留一个
    let mut i = 0;
    while i < row.len() && row.len() > 1 {
        if row[i].weight < tolerance {
            row.remove(i);
        } else {
            i += 1;
        }
    }

    // 2. 逐个删除最小权重，直到不超过上限
    while row.len() > max_weights {
        let mut min_index = 0;
        for (index, influence) in row.iter().enumerate().skip(1) {
            if influence.weight < row[min_index].weight {
                min_index = index;
            }
        }
        row.remove(min_index);
    }

    // 3. 总权重不足 1 时按比例补足
    let total: f32 = row.iter().map(|i| i.weight).sum();
    if total < 1.0 && total > 0.0 {
        for influence in row.iter_mut() {
            influence.weight += (influence.weight / total) * (1.0 - total);
        }
    }
}
