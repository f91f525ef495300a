//! 子网格定义

use super::SkinningInfoVertexAttributeLayer;

/// 子网格：父网格中连续的一段顶点/索引/多边形，共享材质与骨骼列表
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SubMesh {
    start_vertex: usize,
    start_index: usize,
    start_polygon: usize,
    num_vertices: usize,
    num_indices: usize,
    num_polygons: usize,
    material: usize,
    bones: Vec<usize>,
}

impl SubMesh {
    pub fn new(
        start_vertex: usize,
        start_index: usize,
        start_polygon: usize,
        num_vertices: usize,
        num_indices: usize,
        num_polygons: usize,
        material: usize,
    ) -> Self {
        Self {
            start_vertex,
            start_index,
            start_polygon,
            num_vertices,
            num_indices,
            num_polygons,
            material,
            bones: Vec::new(),
        }
    }

    pub fn start_vertex(&self) -> usize {
        self.start_vertex
    }

    pub fn start_index(&self) -> usize {
        self.start_index
    }

    pub fn start_polygon(&self) -> usize {
        self.start_polygon
    }

    pub fn num_vertices(&self) -> usize {
        self.num_vertices
    }

    pub fn num_indices(&self) -> usize {
        self.num_indices
    }

    pub fn num_polygons(&self) -> usize {
        self.num_polygons
    }

    pub fn material(&self) -> usize {
        self.material
    }

    pub fn set_start_vertex(&mut self, value: usize) {
        self.start_vertex = value;
    }

    pub fn set_start_index(&mut self, value: usize) {
        self.start_index = value;
    }

    pub fn set_start_polygon(&mut self, value: usize) {
        self.start_polygon = value;
    }

    pub fn set_num_vertices(&mut self, value: usize) {
        self.num_vertices = value;
    }

    pub fn set_num_indices(&mut self, value: usize) {
        self.num_indices = value;
    }

    pub fn set_num_polygons(&mut self, value: usize) {
        self.num_polygons = value;
    }

    pub fn set_material(&mut self, value: usize) {
        self.material = value;
    }

    /// 顶点范围 [start, start + num)
    pub fn vertex_range(&self) -> std::ops::Range<usize> {
        self.start_vertex..self.start_vertex + self.num_vertices
    }

    /// 索引范围 [start, start + num)
    pub fn index_range(&self) -> std::ops::Range<usize> {
        self.start_index..self.start_index + self.num_indices
    }

    pub fn polygon_range(&self) -> std::ops::Range<usize> {
        self.start_polygon..self.start_polygon + self.num_polygons
    }

    // ========== 骨骼列表 ==========

    pub fn num_bones(&self) -> usize {
        self.bones.len()
    }

    /// 获取局部骨骼 i 对应的骨架节点
    pub fn bone(&self, index: usize) -> usize {
        self.bones[index]
    }

    pub fn bones(&self) -> &[usize] {
        &self.bones
    }

    pub fn set_bone(&mut self, index: usize, node_nr: usize) {
        self.bones[index] = node_nr;
    }

    pub fn set_bones(&mut self, bones: Vec<usize>) {
        self.bones = bones;
    }

    pub fn set_num_bones(&mut self, count: usize) {
        self.bones.resize(count, 0);
    }

    /// 查找节点在局部骨骼列表中的位置
    pub fn find_bone_index(&self, node_nr: usize) -> Option<usize> {
        self.bones.iter().position(|&b| b == node_nr)
    }

    /// 把骨骼 old 替换为 new
    pub fn remap_bone(&mut self, old_node: usize, new_node: usize) {
        for bone in &mut self.bones {
            if *bone == old_node {
                *bone = new_node;
            }
        }
    }

    /// 按范围内顶点的蒙皮影响重建骨骼列表
    ///
    /// `org_vertices` 是父网格的原始顶点映射层。
    pub fn reinit_bones_array(
        &mut self,
        skinning: &SkinningInfoVertexAttributeLayer,
        org_vertices: &[u32],
    ) {
        self.bones.clear();
        for vertex in self.vertex_range() {
            let org_vertex = org_vertices[vertex] as usize;
            for influence in skinning.influences(org_vertex) {
                if !self.bones.contains(&influence.node_nr) {
                    self.bones.push(influence.node_nr);
                }
            }
        }
    }

    /// 三角形数（扇形三角化）
    pub fn calc_num_triangles(&self, poly_vertex_counts: &[u8]) -> usize {
        poly_vertex_counts[self.polygon_range()]
            .iter()
            .map(|&count| (count as usize).saturating_sub(2))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_bone_index() {
        let mut sub_mesh = SubMesh::new(0, 0, 0, 0, 0, 0, 0);
        sub_mesh.set_bones(vec![3, 7, 12]);
        assert_eq!(sub_mesh.find_bone_index(7), Some(1));
        assert_eq!(sub_mesh.find_bone_index(9), None);
    }

    #[test]
    fn test_reinit_bones_array_uses_range() {
        let mut skinning = SkinningInfoVertexAttributeLayer::new(3);
        skinning.add_influence(0, 4, 1.0, 0);
        skinning.add_influence(1, 6, 0.5, 0);
        skinning.add_influence(1, 4, 0.5, 0);
        skinning.add_influence(2, 9, 1.0, 0);

        // 顶点 2..4 映射到原始顶点 1、0
        let org_vertices = [2, 2, 1, 0];
        let mut sub_mesh = SubMesh::new(2, 0, 0, 2, 0, 0, 0);
        sub_mesh.reinit_bones_array(&skinning, &org_vertices);
        assert_eq!(sub_mesh.bones(), &[6, 4]);

        sub_mesh.remap_bone(4, 5);
        assert_eq!(sub_mesh.bones(), &[6, 5]);
    }

    #[test]
    fn test_calc_num_triangles() {
        let sub_mesh = SubMesh::new(0, 0, 1, 0, 0, 2, 0);
        assert_eq!(sub_mesh.calc_num_triangles(&[3, 4, 5]), 5);
    }
}
