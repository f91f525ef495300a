//! 网格运行时数据
//!
//! 非共享层每层 `num_vertices` 个元素，共享层每层 `num_org_vertices` 个元素。

use glam::Vec3;

use super::{
    AttributeElement, AttributeKind, SharedAttributeKind, SharedVertexAttributeLayer,
    SkinningInfoVertexAttributeLayer, SubMesh, VertexAttributeLayer,
};

/// 网格
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mesh {
    num_vertices: usize,
    num_org_vertices: usize,
    num_indices: usize,
    num_polygons: usize,

    indices: Vec<u32>,
    poly_vertex_counts: Vec<u8>,

    sub_meshes: Vec<SubMesh>,
    vertex_attributes: Vec<VertexAttributeLayer>,
    shared_vertex_attributes: Vec<SharedVertexAttributeLayer>,

    is_collision_mesh: bool,
    num_unique_joints: usize,
    highest_joint_index: usize,
}

impl Mesh {
    /// 创建空网格
    pub fn new() -> Self {
        Self::default()
    }

    /// 创建并分配索引与多边形缓冲区
    pub fn with_counts(
        num_vertices: usize,
        num_indices: usize,
        num_polygons: usize,
        num_org_vertices: usize,
        is_collision_mesh: bool,
    ) -> Self {
        let mut mesh = Self {
            is_collision_mesh,
            ..Self::default()
        };
        mesh.allocate(num_vertices, num_indices, num_polygons, num_org_vertices);
        mesh
    }

    /// 释放旧数据并按新数量分配
    pub fn allocate(
        &mut self,
        num_vertices: usize,
        num_indices: usize,
        num_polygons: usize,
        num_org_vertices: usize,
    ) {
        self.release_data();
        self.num_vertices = num_vertices;
        self.num_indices = num_indices;
        self.num_polygons = num_polygons;
        self.num_org_vertices = num_org_vertices;
        self.indices = vec![0; num_indices];
        self.poly_vertex_counts = vec![0; num_polygons];
    }

    /// 释放所有数据
    pub fn release_data(&mut self) {
        self.vertex_attributes.clear();
        self.shared_vertex_attributes.clear();
        self.sub_meshes.clear();
        self.indices.clear();
        self.poly_vertex_counts.clear();
        self.num_vertices = 0;
        self.num_org_vertices = 0;
        self.num_indices = 0;
        self.num_polygons = 0;
    }

    // ========== 基本信息 ==========

    pub fn num_vertices(&self) -> usize {
        self.num_vertices
    }

    pub fn num_org_vertices(&self) -> usize {
        self.num_org_vertices
    }

    pub fn num_indices(&self) -> usize {
        self.num_indices
    }

    pub fn num_polygons(&self) -> usize {
        self.num_polygons
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn indices_mut(&mut self) -> &mut [u32] {
        &mut self.indices
    }

    /// 每个多边形的顶点数
    pub fn poly_vertex_counts(&self) -> &[u8] {
        &self.poly_vertex_counts
    }

    pub fn poly_vertex_counts_mut(&mut self) -> &mut [u8] {
        &mut self.poly_vertex_counts
    }

    pub fn is_collision_mesh(&self) -> bool {
        self.is_collision_mesh
    }

    pub fn set_is_collision_mesh(&mut self, value: bool) {
        self.is_collision_mesh = value;
    }

    /// 蒙皮用到的不同骨骼数
    pub fn num_unique_joints(&self) -> usize {
        self.num_unique_joints
    }

    pub fn set_num_unique_joints(&mut self, value: usize) {
        self.num_unique_joints = value;
    }

    pub fn highest_joint_index(&self) -> usize {
        self.highest_joint_index
    }

    pub fn set_highest_joint_index(&mut self, value: usize) {
        self.highest_joint_index = value;
    }

    /// 所有层恢复原始数据
    pub fn reset_to_original_data(&mut self) {
        for layer in &mut self.vertex_attributes {
            layer.reset_to_original_data();
        }
    }

    // ========== 逐顶点属性层 ==========

    pub fn add_vertex_attribute_layer(&mut self, layer: VertexAttributeLayer) {
        debug_assert_eq!(layer.num_attributes(), self.num_vertices);
        self.vertex_attributes.push(layer);
    }

    pub fn num_vertex_attribute_layers(&self) -> usize {
        self.vertex_attributes.len()
    }

    pub fn vertex_attribute_layer(&self, index: usize) -> &VertexAttributeLayer {
        &self.vertex_attributes[index]
    }

    pub fn vertex_attribute_layer_mut(&mut self, index: usize) -> &mut VertexAttributeLayer {
        &mut self.vertex_attributes[index]
    }

    pub fn vertex_attribute_layers(&self) -> &[VertexAttributeLayer] {
        &self.vertex_attributes
    }

    /// 第 occurrence 个 kind 类型层的序号
    pub fn find_vertex_attribute_layer_number(
        &self,
        kind: AttributeKind,
        occurrence: usize,
    ) -> Option<usize> {
        self.vertex_attributes
            .iter()
            .enumerate()
            .filter(|(_, layer)| layer.kind() == kind)
            .nth(occurrence)
            .map(|(index, _)| index)
    }

    pub fn find_vertex_attribute_layer(
        &self,
        kind: AttributeKind,
        occurrence: usize,
    ) -> Option<&VertexAttributeLayer> {
        self.find_vertex_attribute_layer_number(kind, occurrence)
            .map(|index| &self.vertex_attributes[index])
    }

    pub fn find_vertex_attribute_layer_mut(
        &mut self,
        kind: AttributeKind,
        occurrence: usize,
    ) -> Option<&mut VertexAttributeLayer> {
        self.find_vertex_attribute_layer_number(kind, occurrence)
            .map(move |index| &mut self.vertex_attributes[index])
    }

    /// 按类型与名称查找
    pub fn find_vertex_attribute_layer_by_name(
        &self,
        kind: AttributeKind,
        name: &str,
    ) -> Option<&VertexAttributeLayer> {
        self.vertex_attributes
            .iter()
            .find(|layer| layer.kind() == kind && layer.name() == name)
    }

    /// 只按名称查找序号
    pub fn find_vertex_attribute_layer_index_by_name(&self, name: &str) -> Option<usize> {
        self.vertex_attributes
            .iter()
            .position(|layer| layer.name() == name)
    }

    pub fn remove_vertex_attribute_layer(&mut self, index: usize) -> VertexAttributeLayer {
        self.vertex_attributes.remove(index)
    }

    pub fn remove_all_vertex_attribute_layers(&mut self) {
        self.vertex_attributes.clear();
    }

    /// 某类型层的数量
    pub fn calc_num_attribute_layers(&self, kind: AttributeKind) -> usize {
        self.vertex_attributes
            .iter()
            .filter(|layer| layer.kind() == kind)
            .count()
    }

    pub fn calc_num_uv_layers(&self) -> usize {
        self.calc_num_attribute_layers(AttributeKind::UvCoords)
    }

    /// 当前数据
    pub fn find_vertex_data<T: AttributeElement>(
        &self,
        kind: AttributeKind,
        occurrence: usize,
    ) -> Option<&[T]> {
        self.find_vertex_attribute_layer(kind, occurrence)?.data()
    }

    pub fn find_vertex_data_mut<T: AttributeElement>(
        &mut self,
        kind: AttributeKind,
        occurrence: usize,
    ) -> Option<&mut [T]> {
        self.find_vertex_attribute_layer_mut(kind, occurrence)?
            .data_mut()
    }

    /// 原始数据（未保留原始数据的层返回当前数据）
    pub fn find_original_vertex_data<T: AttributeElement>(
        &self,
        kind: AttributeKind,
        occurrence: usize,
    ) -> Option<&[T]> {
        self.find_vertex_attribute_layer(kind, occurrence)?
            .original_data()
    }

    pub fn find_original_vertex_data_mut<T: AttributeElement>(
        &mut self,
        kind: AttributeKind,
        occurrence: usize,
    ) -> Option<&mut [T]> {
        self.find_vertex_attribute_layer_mut(kind, occurrence)?
            .original_data_mut()
    }

    /// 当前数据的字节视图，供渲染端上传
    pub fn find_vertex_bytes(&self, kind: AttributeKind, occurrence: usize) -> Option<&[u8]> {
        self.find_vertex_attribute_layer(kind, occurrence)
            .map(VertexAttributeLayer::as_bytes)
    }

    /// 复制顶点到原始顶点的映射
    pub fn org_vertex_numbers(&self) -> Option<&[u32]> {
        self.find_vertex_data(AttributeKind::OrgVtxNumbers, 0)
    }

    // ========== 共享属性层 ==========

    pub fn add_shared_vertex_attribute_layer(
        &mut self,
        layer: impl Into<SharedVertexAttributeLayer>,
    ) {
        let layer = layer.into();
        debug_assert_eq!(layer.num_attributes(), self.num_org_vertices);
        self.shared_vertex_attributes.push(layer);
    }

    pub fn num_shared_vertex_attribute_layers(&self) -> usize {
        self.shared_vertex_attributes.len()
    }

    pub fn shared_vertex_attribute_layer(&self, index: usize) -> &SharedVertexAttributeLayer {
        &self.shared_vertex_attributes[index]
    }

    pub fn find_shared_vertex_attribute_layer_number(
        &self,
        kind: SharedAttributeKind,
        occurrence: usize,
    ) -> Option<usize> {
        self.shared_vertex_attributes
            .iter()
            .enumerate()
            .filter(|(_, layer)| layer.kind() == kind)
            .nth(occurrence)
            .map(|(index, _)| index)
    }

    pub fn find_shared_vertex_attribute_layer_index_by_name(&self, name: &str) -> Option<usize> {
        self.shared_vertex_attributes
            .iter()
            .position(|layer| layer.name() == name)
    }

    pub fn remove_shared_vertex_attribute_layer(
        &mut self,
        index: usize,
    ) -> SharedVertexAttributeLayer {
        self.shared_vertex_attributes.remove(index)
    }

    pub fn remove_all_shared_vertex_attribute_layers(&mut self) {
        self.shared_vertex_attributes.clear();
    }

    /// 第一个蒙皮层
    pub fn skinning_info(&self) -> Option<&SkinningInfoVertexAttributeLayer> {
        self.shared_vertex_attributes
            .iter()
            .find_map(SharedVertexAttributeLayer::as_skinning_info)
    }

    pub fn skinning_info_mut(&mut self) -> Option<&mut SkinningInfoVertexAttributeLayer> {
        self.shared_vertex_attributes
            .iter_mut()
            .find_map(SharedVertexAttributeLayer::as_skinning_info_mut)
    }

    // ========== 子网格 ==========

    pub fn num_sub_meshes(&self) -> usize {
        self.sub_meshes.len()
    }

    pub fn sub_mesh(&self, index: usize) -> &SubMesh {
        &self.sub_meshes[index]
    }

    pub fn sub_mesh_mut(&mut self, index: usize) -> &mut SubMesh {
        &mut self.sub_meshes[index]
    }

    pub fn sub_meshes(&self) -> &[SubMesh] {
        &self.sub_meshes
    }

    pub fn add_sub_mesh(&mut self, sub_mesh: SubMesh) {
        self.sub_meshes.push(sub_mesh);
    }

    pub fn insert_sub_mesh(&mut self, index: usize, sub_mesh: SubMesh) {
        self.sub_meshes.insert(index, sub_mesh);
    }

    pub fn remove_sub_mesh(&mut self, index: usize) -> SubMesh {
        self.sub_meshes.remove(index)
    }

    /// 删除空子网格，返回删除数量
    ///
    /// `only_remove_on_zero_verts_and_triangles` 为 true 时只删除顶点与索引都为空的子网格，
    /// 否则任一为空即删除。
    pub fn remove_empty_sub_meshes(
        &mut self,
        only_remove_on_zero_verts_and_triangles: bool,
    ) -> usize {
        let before = self.sub_meshes.len();
        self.sub_meshes.retain(|sub_mesh| {
            let zero_verts = sub_mesh.num_vertices() == 0;
            let zero_tris = sub_mesh.num_indices() == 0;
            if only_remove_on_zero_verts_and_triangles {
                !(zero_verts && zero_tris)
            } else {
                !(zero_verts || zero_tris)
            }
        });
        before - self.sub_meshes.len()
    }

    // ========== 顶点编辑 ==========

    /// 交换两个顶点在所有非共享层中的数据
    pub fn swap_vertex(&mut self, a: usize, b: usize) {
        debug_assert!(a < self.num_vertices && b < self.num_vertices);
        if a == b {
            return;
        }
        for layer in &mut self.vertex_attributes {
            layer.swap_attributes(a, b);
        }
    }

    /// 删除闭区间内的复制顶点，修正子网格偏移与数量
    ///
    /// 共享层按原始顶点索引，不受影响。`change_index_buffer` 时，
    /// 大于区间末端的索引减去删除数量。
    pub fn remove_vertices(
        &mut self,
        start: usize,
        end: usize,
        change_index_buffer: bool,
        remove_empty_sub_meshes: bool,
    ) {
        let (start, end) = if start > end { (end, start) } else { (start, end) };
        debug_assert!(end < self.num_vertices);

        let num_to_remove = end - start + 1;
        self.num_vertices -= num_to_remove;
        for layer in &mut self.vertex_attributes {
            layer.remove_attributes(start, end);
        }

        // 每删一个顶点，后面的顶点都前移到 start
        for _ in 0..num_to_remove {
            let mut s = 0;
            while s < self.sub_meshes.len() {
                let sub_mesh = &mut self.sub_meshes[s];
                if sub_mesh.vertex_range().contains(&start) {
                    sub_mesh.set_num_vertices(sub_mesh.num_vertices() - 1);
                }
                if sub_mesh.start_vertex() > start {
                    sub_mesh.set_start_vertex(sub_mesh.start_vertex() - 1);
                }

                if remove_empty_sub_meshes && sub_mesh.num_vertices() == 0 {
                    self.sub_meshes.remove(s);
                } else {
                    s += 1;
                }
            }
        }

        if change_index_buffer {
            let removed = num_to_remove as u32;
            for index in &mut self.indices {
                if *index as usize > end {
                    *index -= removed;
                }
            }
        }
    }

    /// 缩放位置（当前与原始数据）
    pub fn scale(&mut self, factor: f32) {
        if let Some(layer) = self.find_vertex_attribute_layer_mut(AttributeKind::Positions, 0) {
            if let Some(positions) = layer.data_mut::<Vec3>() {
                positions.iter_mut().for_each(|p| *p *= factor);
            }
            if layer.keeps_originals() {
                if let Some(positions) = layer.original_data_mut::<Vec3>() {
                    positions.iter_mut().for_each(|p| *p *= factor);
                }
            }
        }
    }

    // ========== 骨骼影响统计 ==========

    /// 面（三个顶点）引用的骨骼，去重
    pub fn gather_bones_for_face(&self, start_index_of_face: usize, out: &mut Vec<usize>) {
        out.clear();
        let (Some(skinning), Some(org_vertices)) = (self.skinning_info(), self.org_vertex_numbers())
        else {
            return;
        };

        for &vertex in &self.indices[start_index_of_face..start_index_of_face + 3] {
            let org_vertex = org_vertices[vertex as usize] as usize;
            for influence in skinning.influences(org_vertex) {
                if !out.contains(&influence.node_nr) {
                    out.push(influence.node_nr);
                }
            }
        }
    }

    /// 面上三个顶点的最大影响数
    pub fn calc_max_num_influences_for_face(&self, start_index_of_face: usize) -> usize {
        let (Some(skinning), Some(org_vertices)) = (self.skinning_info(), self.org_vertex_numbers())
        else {
            return 0;
        };

        self.indices[start_index_of_face..start_index_of_face + 3]
            .iter()
            .map(|&vertex| skinning.num_influences(org_vertices[vertex as usize] as usize))
            .max()
            .unwrap_or(0)
    }

    /// 所有顶点中的最大影响数；没有蒙皮层时为 0
    pub fn calc_max_num_influences(&self) -> usize {
        let (Some(skinning), Some(org_vertices)) = (self.skinning_info(), self.org_vertex_numbers())
        else {
            return 0;
        };

        org_vertices
            .iter()
            .map(|&org| skinning.num_influences(org as usize))
            .max()
            .unwrap_or(0)
    }

    /// 同上，另外输出每个影响数对应的顶点数量（下标为影响数）
    pub fn calc_max_num_influences_with_counts(&self, out_vertex_counts: &mut Vec<usize>) -> usize {
        let max_influences = self.calc_max_num_influences();
        out_vertex_counts.clear();
        out_vertex_counts.resize(max_influences + 1, 0);

        let (Some(skinning), Some(org_vertices)) = (self.skinning_info(), self.org_vertex_numbers())
        else {
            out_vertex_counts[0] = self.num_vertices;
            return 0;
        };

        for &org in org_vertices {
            out_vertex_counts[skinning.num_influences(org as usize)] += 1;
        }
        max_influences
    }

    // ========== 其它 ==========

    /// 转为 16 位索引，超出范围的索引写为 u16::MAX 并返回 false
    pub fn convert_to_16bit_indices(&self) -> (Vec<u16>, bool) {
        let mut ok = true;
        let converted: Vec<u16> = self
            .indices
            .iter()
            .enumerate()
            .map(|(i, &index)| match u16::try_from(index) {
                Ok(value) => value,
                Err(_) => {
                    log::warn!(
                        "顶点索引 {} ({}) 超出 u16 范围，无法转换为 16 位索引",
                        i,
                        index
                    );
                    ok = false;
                    u16::MAX
                }
            })
            .collect();
        (converted, ok)
    }

    /// 按原始顶点提取位置（未引用的原始顶点使用第一个位置）
    pub fn extract_original_vertex_positions(&self) -> Vec<Vec3> {
        let positions = self
            .find_original_vertex_data::<Vec3>(AttributeKind::Positions, 0)
            .unwrap_or(&[]);
        let Some(&first) = positions.first() else {
            return vec![Vec3::ZERO; self.num_org_vertices];
        };

        let mut out = vec![first; self.num_org_vertices];
        if let Some(org_vertices) = self.org_vertex_numbers() {
            for (&org, &position) in org_vertices.iter().zip(positions) {
                out[org as usize] = position;
            }
        }
        out
    }

    pub fn check_if_is_triangle_mesh(&self) -> bool {
        self.poly_vertex_counts.iter().all(|&count| count == 3)
    }

    pub fn check_if_is_quad_mesh(&self) -> bool {
        self.poly_vertex_counts.iter().all(|&count| count == 4)
    }

    /// 扇形三角化后的三角形数
    pub fn calc_num_triangles(&self) -> usize {
        self.poly_vertex_counts
            .iter()
            .map(|&count| (count as usize).saturating_sub(2))
            .sum()
    }

    /// 以 debug 级别输出网格统计
    pub fn log(&self) {
        log::debug!("- Mesh");
        log::debug!("  + 顶点数        = {}", self.num_vertices);
        log::debug!(
            "  + 索引数        = {} ({} 个多边形)",
            self.num_indices,
            self.num_polygons
        );
        log::debug!("  + 原始顶点数    = {}", self.num_org_vertices);
        log::debug!("  + 子网格数      = {}", self.sub_meshes.len());
        log::debug!("  + 属性层数      = {}", self.vertex_attributes.len());
        log::debug!("  + 共享属性层数  = {}", self.shared_vertex_attributes.len());
        log::debug!("  + 三角网格      = {}", self.check_if_is_triangle_mesh());
        log::debug!("  + 四边形网格    = {}", self.check_if_is_quad_mesh());

        for (s, sub_mesh) in self.sub_meshes.iter().enumerate() {
            log::debug!("   - SubMesh #{}:", s);
            log::debug!("     + 起始顶点 = {}", sub_mesh.start_vertex());
            log::debug!("     + 起始索引 = {}", sub_mesh.start_index());
            log::debug!("     + 顶点数   = {}", sub_mesh.num_vertices());
            log::debug!(
                "     + 索引数   = {} ({} 个多边形)",
                sub_mesh.num_indices(),
                sub_mesh.num_polygons()
            );
            log::debug!("     + 骨骼数   = {}", sub_mesh.num_bones());
            for node_nr in sub_mesh.bones() {
                log::debug!("       + NodeNr {}", node_nr);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 两个三角形、两个子网格，每个子网格 3 个顶点
    fn two_triangle_mesh() -> Mesh {
        let mut mesh = Mesh::with_counts(6, 6, 2, 4, false);
        mesh.indices_mut().copy_from_slice(&[0, 1, 2, 3, 4, 5]);
        mesh.poly_vertex_counts_mut().copy_from_slice(&[3, 3]);

        let positions: Vec<Vec3> = (0..6).map(|i| Vec3::splat(i as f32)).collect();
        mesh.add_vertex_attribute_layer(VertexAttributeLayer::from_values(
            AttributeKind::Positions,
            positions,
            true,
        ));
        mesh.add_vertex_attribute_layer(VertexAttributeLayer::from_values(
            AttributeKind::OrgVtxNumbers,
            vec![0u32, 1, 2, 2, 1, 3],
            false,
        ));

        let mut skinning = SkinningInfoVertexAttributeLayer::new(4);
        skinning.add_influence(0, 1, 1.0, 0);
        skinning.add_influence(1, 1, 0.5, 0);
        skinning.add_influence(1, 2, 0.5, 0);
        skinning.add_influence(2, 3, 1.0, 0);
        skinning.add_influence(3, 4, 0.2, 0);
        skinning.add_influence(3, 5, 0.3, 0);
        skinning.add_influence(3, 6, 0.5, 0);
        mesh.add_shared_vertex_attribute_layer(skinning);

        mesh.add_sub_mesh(SubMesh::new(0, 0, 0, 3, 3, 1, 0));
        mesh.add_sub_mesh(SubMesh::new(3, 3, 1, 3, 3, 1, 1));
        mesh
    }

    #[test]
    fn test_find_layers_by_occurrence() {
        let mut mesh = two_triangle_mesh();
        mesh.add_vertex_attribute_layer(
            VertexAttributeLayer::new(6, AttributeKind::UvCoords, false).with_name("uv0"),
        );
        mesh.add_vertex_attribute_layer(
            VertexAttributeLayer::new(6, AttributeKind::UvCoords, false).with_name("uv1"),
        );

        assert_eq!(mesh.calc_num_uv_layers(), 2);
        assert_eq!(
            mesh.find_vertex_attribute_layer_number(AttributeKind::UvCoords, 1),
            Some(3)
        );
        assert_eq!(mesh.find_vertex_attribute_layer_index_by_name("uv0"), Some(2));
        assert!(mesh
            .find_vertex_attribute_layer(AttributeKind::Normals, 0)
            .is_none());
        assert_eq!(
            mesh.find_vertex_bytes(AttributeKind::Positions, 0).map(<[u8]>::len),
            Some(6 * 12)
        );
    }

    #[test]
    fn test_clone_is_deep_and_identical() {
        let mesh = two_triangle_mesh();
        let mut clone = mesh.clone();
        assert_eq!(clone, mesh);
        for (a, b) in mesh
            .vertex_attribute_layers()
            .iter()
            .zip(clone.vertex_attribute_layers())
        {
            assert_eq!(a.as_bytes(), b.as_bytes());
            assert_eq!(a.original_as_bytes(), b.original_as_bytes());
        }

        clone.find_vertex_data_mut::<Vec3>(AttributeKind::Positions, 0).unwrap()[0] = Vec3::ONE;
        assert_eq!(
            mesh.find_vertex_data::<Vec3>(AttributeKind::Positions, 0).unwrap()[0],
            Vec3::ZERO
        );
    }

    #[test]
    fn test_remove_vertices_adjusts_sub_meshes() {
        let mut mesh = two_triangle_mesh();
        mesh.remove_vertices(2, 1, true, false);

        assert_eq!(mesh.num_vertices(), 4);
        assert_eq!(mesh.sub_mesh(0).start_vertex(), 0);
        assert_eq!(mesh.sub_mesh(0).num_vertices(), 1);
        assert_eq!(mesh.sub_mesh(1).start_vertex(), 1);
        assert_eq!(mesh.sub_mesh(1).num_vertices(), 3);
        assert_eq!(mesh.indices(), &[0, 1, 2, 1, 2, 3]);

        let positions = mesh.find_vertex_data::<Vec3>(AttributeKind::Positions, 0).unwrap();
        assert_eq!(positions[1], Vec3::splat(3.0));
    }

    #[test]
    fn test_remove_vertices_drops_empty_sub_mesh() {
        let mut mesh = two_triangle_mesh();
        mesh.remove_vertices(0, 2, true, true);
        assert_eq!(mesh.num_sub_meshes(), 1);
        assert_eq!(mesh.sub_mesh(0).start_vertex(), 0);
        assert_eq!(mesh.sub_mesh(0).num_vertices(), 3);
    }

    #[test]
    fn test_remove_empty_sub_meshes_modes() {
        let mut mesh = two_triangle_mesh();
        mesh.add_sub_mesh(SubMesh::new(6, 6, 2, 0, 3, 0, 0));
        mesh.add_sub_mesh(SubMesh::new(6, 6, 2, 0, 0, 0, 0));

        assert_eq!(mesh.remove_empty_sub_meshes(true), 1);
        assert_eq!(mesh.num_sub_meshes(), 3);
        assert_eq!(mesh.remove_empty_sub_meshes(false), 1);
        assert_eq!(mesh.num_sub_meshes(), 2);
    }

    #[test]
    fn test_influence_statistics() {
        let mesh = two_triangle_mesh();
        assert_eq!(mesh.calc_max_num_influences(), 3);
        assert_eq!(mesh.calc_max_num_influences_for_face(0), 2);

        let mut counts = Vec::new();
        assert_eq!(mesh.calc_max_num_influences_with_counts(&mut counts), 3);
        assert_eq!(counts, vec![0, 3, 2, 1]);

        let mut bones = Vec::new();
        mesh.gather_bones_for_face(3, &mut bones);
        assert_eq!(bones, vec![3, 1, 2, 4, 5, 6]);
    }

    #[test]
    fn test_convert_to_16bit_indices() {
        let mut mesh = two_triangle_mesh();
        let (indices, ok) = mesh.convert_to_16bit_indices();
        assert!(ok);
        assert_eq!(indices, vec![0, 1, 2, 3, 4, 5]);

        mesh.indices_mut()[4] = 70_000;
        let (indices, ok) = mesh.convert_to_16bit_indices();
        assert!(!ok);
        assert_eq!(indices[4], u16::MAX);
    }

    #[test]
    fn test_extract_original_positions_and_scale() {
        let mut mesh = two_triangle_mesh();
        mesh.scale(2.0);
        let points = mesh.extract_original_vertex_positions();
        assert_eq!(points.len(), 4);
        assert_eq!(points[0], Vec3::ZERO);
        assert_eq!(points[1], Vec3::splat(8.0));
        assert_eq!(points[2], Vec3::splat(6.0));
        assert_eq!(points[3], Vec3::splat(10.0));
    }

    #[test]
    fn test_swap_vertex_and_mesh_kind_checks() {
        let mut mesh = two_triangle_mesh();
        mesh.swap_vertex(0, 5);
        assert_eq!(mesh.org_vertex_numbers().unwrap()[0], 3);
        assert!(mesh.check_if_is_triangle_mesh());
        assert!(!mesh.check_if_is_quad_mesh());
        assert_eq!(mesh.calc_num_triangles(), 2);
    }
}
