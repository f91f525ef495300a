//! 网格构建器
//!
//! 使用顺序：
//! 1. 添加属性层、设置蒙皮信息
//! 2. 对每个多边形：`begin_polygon` → 对每个顶点设置当前属性值并 `add_polygon_vertex` → `end_polygon`
//! 3. 可选 `optimize_triangle_list` / `generate_sub_mesh_vertex_orders`
//! 4. `Mesh::from_mesh_builder` 烘焙

use super::triangle_list::{calc_cache_miss_ratio, optimize_triangle_order};
use super::{
    AttributeValue, MeshBuilderSkinningInfo, MeshBuilderSubMesh, MeshBuilderVertexAttributeLayer,
    MeshBuilderVertexLookup,
};
use crate::config::{get_config, SkinningConfig};
use crate::mesh::{AttributeKind, Mesh};
use crate::{Result, SkinError};

#[derive(Clone, Debug)]
struct PolygonInProgress {
    material: usize,
    vertices: Vec<MeshBuilderVertexLookup>,
}

#[derive(Clone, Debug)]
pub struct MeshBuilder {
    num_org_vertices: usize,
    max_bones_per_sub_mesh: usize,
    max_sub_mesh_vertices: usize,
    vertex_weld_tolerance: f32,
    is_collision_mesh: bool,

    layers: Vec<MeshBuilderVertexAttributeLayer>,
    skinning_info: Option<MeshBuilderSkinningInfo>,
    sub_meshes: Vec<MeshBuilderSubMesh>,
    /// 每个原始顶点已生成的复制数
    num_duplicates: Vec<usize>,
    polygon: Option<PolygonInProgress>,
}

impl MeshBuilder {
    /// 焊接容差取自全局配置
    pub fn new(
        num_org_vertices: usize,
        max_bones_per_sub_mesh: usize,
        max_sub_mesh_vertices: usize,
        is_collision_mesh: bool,
    ) -> Self {
        Self {
            num_org_vertices,
            max_bones_per_sub_mesh,
            max_sub_mesh_vertices,
            vertex_weld_tolerance: get_config().vertex_weld_tolerance,
            is_collision_mesh,
            layers: Vec::new(),
            skinning_info: None,
            sub_meshes: Vec::new(),
            num_duplicates: vec![0; num_org_vertices],
            polygon: None,
        }
    }

    /// 从配置读取子网格限制与焊接容差
    pub fn with_config(
        num_org_vertices: usize,
        is_collision_mesh: bool,
        config: &SkinningConfig,
    ) -> Self {
        let mut builder = Self::new(
            num_org_vertices,
            config.max_bones_per_submesh,
            config.max_submesh_vertices,
            is_collision_mesh,
        );
        builder.vertex_weld_tolerance = config.vertex_weld_tolerance;
        builder
    }

    pub fn num_org_vertices(&self) -> usize {
        self.num_org_vertices
    }

    pub fn max_bones_per_sub_mesh(&self) -> usize {
        self.max_bones_per_sub_mesh
    }

    pub fn max_sub_mesh_vertices(&self) -> usize {
        self.max_sub_mesh_vertices
    }

    pub fn vertex_weld_tolerance(&self) -> f32 {
        self.vertex_weld_tolerance
    }

    pub fn set_vertex_weld_tolerance(&mut self, tolerance: f32) {
        self.vertex_weld_tolerance = tolerance;
    }

    pub fn is_collision_mesh(&self) -> bool {
        self.is_collision_mesh
    }

    fn has_vertices(&self) -> bool {
        self.polygon.is_some() || self.num_duplicates.iter().any(|&count| count > 0)
    }

    /// 添加属性层，返回层索引
    ///
    /// 原始顶点号层由烘焙自动生成，不能手动添加。
    pub fn add_layer(&mut self, layer: MeshBuilderVertexAttributeLayer) -> Result<usize> {
        if layer.kind() == AttributeKind::OrgVtxNumbers {
            return Err(SkinError::Builder("原始顶点号层由构建器自动生成".into()));
        }
        if layer.num_org_vertices() != self.num_org_vertices {
            return Err(SkinError::Builder(format!(
                "属性层原始顶点数 {} 与构建器 {} 不一致",
                layer.num_org_vertices(),
                self.num_org_vertices
            )));
        }
        if self.has_vertices() {
            return Err(SkinError::Builder("添加多边形之后不能再添加属性层".into()));
        }
        self.layers.push(layer);
        Ok(self.layers.len() - 1)
    }

    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }

    pub fn layer(&self, index: usize) -> &MeshBuilderVertexAttributeLayer {
        &self.layers[index]
    }

    pub fn layer_mut(&mut self, index: usize) -> &mut MeshBuilderVertexAttributeLayer {
        &mut self.layers[index]
    }

    pub fn layers(&self) -> &[MeshBuilderVertexAttributeLayer] {
        &self.layers
    }

    /// 第 occurrence 个该类型的层
    pub fn find_layer(&self, kind: AttributeKind, occurrence: usize) -> Option<usize> {
        self.layers
            .iter()
            .enumerate()
            .filter(|(_, layer)| layer.kind() == kind)
            .nth(occurrence)
            .map(|(index, _)| index)
    }

    /// 设置某层的当前顶点值
    pub fn set_current_vertex_value(
        &mut self,
        layer_index: usize,
        value: impl Into<AttributeValue>,
    ) -> Result<()> {
        let layer = self
            .layers
            .get_mut(layer_index)
            .ok_or_else(|| SkinError::Builder(format!("属性层 {} 不存在", layer_index)))?;
        layer.set_current_vertex_value(value)
    }

    /// 设置蒙皮信息，必须在添加多边形之前
    pub fn set_skinning_info(&mut self, skinning_info: MeshBuilderSkinningInfo) -> Result<()> {
        if skinning_info.num_org_vertices() != self.num_org_vertices {
            return Err(SkinError::Builder(format!(
                "蒙皮信息原始顶点数 {} 与构建器 {} 不一致",
                skinning_info.num_org_vertices(),
                self.num_org_vertices
            )));
        }
        if self.has_vertices() {
            return Err(SkinError::Builder("添加多边形之后不能再设置蒙皮信息".into()));
        }
        self.skinning_info = Some(skinning_info);
        Ok(())
    }

    pub fn skinning_info(&self) -> Option<&MeshBuilderSkinningInfo> {
        self.skinning_info.as_ref()
    }

    pub fn skinning_info_mut(&mut self) -> Option<&mut MeshBuilderSkinningInfo> {
        self.skinning_info.as_mut()
    }

    pub fn begin_polygon(&mut self, material: usize) -> Result<()> {
        if self.polygon.is_some() {
            return Err(SkinError::Builder("上一个多边形尚未结束".into()));
        }
        self.polygon = Some(PolygonInProgress {
            material,
            vertices: Vec::new(),
        });
        Ok(())
    }

    /// 用各层当前值添加一个多边形顶点
    ///
    /// 所有层的值都在容差内与已有复制相同时复用该复制，否则新建复制。
    pub fn add_polygon_vertex(&mut self, org_vertex: usize) -> Result<()> {
        if self.polygon.is_none() {
            return Err(SkinError::Builder("add_polygon_vertex 必须在 begin_polygon 之后调用".into()));
        }
        if org_vertex >= self.num_org_vertices {
            return Err(SkinError::Builder(format!(
                "原始顶点 {} 超出范围 ({})",
                org_vertex, self.num_org_vertices
            )));
        }

        let tolerance = self.vertex_weld_tolerance;
        let existing = (0..self.num_duplicates[org_vertex]).find(|&duplicate_nr| {
            self.layers
                .iter()
                .all(|layer| layer.current_matches(org_vertex, duplicate_nr, tolerance))
        });
        let duplicate_nr = match existing {
            Some(duplicate_nr) => duplicate_nr,
            None => {
                for layer in &mut self.layers {
                    layer.push_current(org_vertex);
                }
                self.num_duplicates[org_vertex] += 1;
                self.num_duplicates[org_vertex] - 1
            }
        };

        if let Some(polygon) = self.polygon.as_mut() {
            polygon
                .vertices
                .push(MeshBuilderVertexLookup::new(org_vertex, duplicate_nr));
        }
        Ok(())
    }

    /// 结束多边形并放入第一个能容纳它的子网格
    pub fn end_polygon(&mut self) -> Result<()> {
        let polygon = self
            .polygon
            .take()
            .ok_or_else(|| SkinError::Builder("end_polygon 之前没有 begin_polygon".into()))?;

        let num_vertices = polygon.vertices.len();
        if !(3..=u8::MAX as usize).contains(&num_vertices) {
            return Err(SkinError::Builder(format!(
                "多边形顶点数 {} 不在 [3, 255] 范围内",
                num_vertices
            )));
        }

        let mut bones = Vec::new();
        if let Some(skinning_info) = &self.skinning_info {
            for lookup in &polygon.vertices {
                skinning_info.collect_bones(lookup.org_vtx, &mut bones);
            }
        }

        let target = self.sub_meshes.iter().position(|sub_mesh| {
            sub_mesh.can_handle_polygon(
                &polygon.vertices,
                &bones,
                polygon.material,
                self.max_bones_per_sub_mesh,
                self.max_sub_mesh_vertices,
            )
        });

        let index = match target {
            Some(index) => index,
            None => {
                let sub_mesh = MeshBuilderSubMesh::new(polygon.material);
                let num_unique = sub_mesh.calc_num_new_vertices(&polygon.vertices);
                if bones.len() > self.max_bones_per_sub_mesh
                    || num_unique > self.max_sub_mesh_vertices
                {
                    log::warn!(
                        "多边形本身超出子网格限制（骨骼 {}/{}，顶点 {}/{}），单独放入一个子网格",
                        bones.len(),
                        self.max_bones_per_sub_mesh,
                        num_unique,
                        self.max_sub_mesh_vertices
                    );
                }
                self.sub_meshes.push(sub_mesh);
                self.sub_meshes.len() - 1
            }
        };
        self.sub_meshes[index].add_polygon(&polygon.vertices, &bones);
        Ok(())
    }

    /// 便捷方法：添加整个多边形，`values` 按层顺序给出每个顶点的属性值
    pub fn add_polygon(
        &mut self,
        material: usize,
        org_vertices: &[usize],
        values: &[Vec<AttributeValue>],
    ) -> Result<()> {
        self.begin_polygon(material)?;
        for (corner, &org_vertex) in org_vertices.iter().enumerate() {
            if let Some(corner_values) = values.get(corner) {
                for (layer_index, value) in corner_values.iter().enumerate() {
                    self.set_current_vertex_value(layer_index, *value)?;
                }
            }
            self.add_polygon_vertex(org_vertex)?;
        }
        self.end_polygon()
    }

    pub fn num_sub_meshes(&self) -> usize {
        self.sub_meshes.len()
    }

    pub fn sub_mesh(&self, index: usize) -> &MeshBuilderSubMesh {
        &self.sub_meshes[index]
    }

    pub fn sub_meshes(&self) -> &[MeshBuilderSubMesh] {
        &self.sub_meshes
    }

    pub fn calc_num_vertices(&self) -> usize {
        self.sub_meshes.iter().map(|s| s.num_vertices()).sum()
    }

    pub fn calc_num_indices(&self) -> usize {
        self.sub_meshes.iter().map(|s| s.num_indices()).sum()
    }

    pub fn calc_num_polygons(&self) -> usize {
        self.sub_meshes.iter().map(|s| s.num_polygons()).sum()
    }

    /// 对只含三角形的子网格做顶点缓存优化
    pub fn optimize_triangle_list(&mut self) {
        for sub_mesh in &mut self.sub_meshes {
            if !sub_mesh.is_triangle_only() {
                continue;
            }
            let optimized = optimize_triangle_order(sub_mesh.indices(), sub_mesh.num_vertices());
            sub_mesh.set_indices(optimized);
        }
    }

    /// 每个子网格按索引首次出现顺序排列顶点
    pub fn generate_sub_mesh_vertex_orders(&mut self) {
        for sub_mesh in &mut self.sub_meshes {
            sub_mesh.generate_vertex_order();
        }
    }

    /// 烘焙为运行时网格
    pub fn build(&self) -> Mesh {
        Mesh::from_mesh_builder(self)
    }

    pub fn log_contents(&self) {
        log::debug!(
            "MeshBuilder: 原始顶点 {}, 顶点 {}, 索引 {}, 多边形 {}, 属性层 {}, 子网格 {}",
            self.num_org_vertices,
            self.calc_num_vertices(),
            self.calc_num_indices(),
            self.calc_num_polygons(),
            self.layers.len(),
            self.sub_meshes.len()
        );
        for (i, sub_mesh) in self.sub_meshes.iter().enumerate() {
            log::debug!(
                "  子网格 {}: 材质 {}, 顶点 {}, 索引 {}, 多边形 {}, 骨骼 {:?}",
                i,
                sub_mesh.material(),
                sub_mesh.num_vertices(),
                sub_mesh.num_indices(),
                sub_mesh.num_polygons(),
                sub_mesh.bones()
            );
            if sub_mesh.is_triangle_only() {
                log::debug!(
                    "    顶点缓存未命中率 {:.3}",
                    calc_cache_miss_ratio(sub_mesh.indices())
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    /// 两个三角形共享 1、2 号原始顶点
    fn two_triangles(builder: &mut MeshBuilder, normal_a: Vec3, normal_b: Vec3) {
        let normals = builder.find_layer(AttributeKind::Normals, 0);
        for (org_vertices, normal) in [([0, 1, 2], normal_a), ([2, 1, 3], normal_b)] {
            builder.begin_polygon(0).unwrap();
            for org in org_vertices {
                if let Some(layer) = normals {
                    builder.set_current_vertex_value(layer, normal).unwrap();
                }
                builder.add_polygon_vertex(org).unwrap();
            }
            builder.end_polygon().unwrap();
        }
    }

    fn normals_builder() -> MeshBuilder {
        let mut builder = MeshBuilder::new(4, 50, 65535, false);
        builder
            .add_layer(MeshBuilderVertexAttributeLayer::new(4, AttributeKind::Normals, true))
            .unwrap();
        builder
    }

    #[test]
    fn test_equal_values_are_welded() {
        let mut builder = normals_builder();
        two_triangles(&mut builder, Vec3::Z, Vec3::Z);
        assert_eq!(builder.num_sub_meshes(), 1);
        assert_eq!(builder.calc_num_vertices(), 4);
        assert_eq!(builder.calc_num_indices(), 6);
        assert_eq!(builder.calc_num_polygons(), 2);
    }

    #[test]
    fn test_differing_values_are_duplicated() {
        let mut builder = normals_builder();
        two_triangles(&mut builder, Vec3::Z, Vec3::X);
        assert_eq!(builder.calc_num_vertices(), 6);
    }

    #[test]
    fn test_oversized_polygon_gets_own_sub_mesh() {
        let mut builder = MeshBuilder::new(4, 2, 65535, false);
        let mut skinning = MeshBuilderSkinningInfo::new(4);
        for org in 0..4 {
            skinning.add_influence(org, org, 1.0);
        }
        builder.set_skinning_info(skinning).unwrap();
        two_triangles(&mut builder, Vec3::Z, Vec3::Z);

        assert_eq!(builder.num_sub_meshes(), 2);
        assert_eq!(builder.sub_mesh(0).bones(), &[0, 1, 2]);
        assert_eq!(builder.sub_mesh(1).bones(), &[2, 1, 3]);
        // 1、2 号原始顶点在两个子网格中各出现一次
        assert_eq!(builder.calc_num_vertices(), 6);
    }

    #[test]
    fn test_material_splits_sub_meshes() {
        let mut builder = MeshBuilder::new(4, 50, 65535, false);
        builder.add_polygon(0, &[0, 1, 2], &[]).unwrap();
        builder.add_polygon(1, &[2, 1, 3], &[]).unwrap();
        builder.add_polygon(0, &[1, 3, 2], &[]).unwrap();
        assert_eq!(builder.num_sub_meshes(), 2);
        assert_eq!(builder.sub_mesh(0).num_polygons(), 2);
        assert_eq!(builder.sub_mesh(1).material(), 1);
    }

    #[test]
    fn test_log_contents_after_triangle_optimization() {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut builder = normals_builder();
        two_triangles(&mut builder, Vec3::Z, Vec3::Z);
        builder.optimize_triangle_list();
        assert!(builder.sub_mesh(0).is_triangle_only());
        assert!(calc_cache_miss_ratio(builder.sub_mesh(0).indices()) <= 3.0);
        builder.log_contents();
        assert_eq!(builder.calc_num_indices(), 6);
    }

    #[test]
    fn test_protocol_errors() {
        let mut builder = MeshBuilder::new(3, 50, 65535, false);
        assert!(matches!(builder.add_polygon_vertex(0), Err(SkinError::Builder(_))));
        assert!(builder.end_polygon().is_err());

        builder.begin_polygon(0).unwrap();
        assert!(builder.begin_polygon(0).is_err());
        builder.add_polygon_vertex(0).unwrap();
        assert!(builder.add_polygon_vertex(3).is_err());
        builder.add_polygon_vertex(1).unwrap();
        assert!(builder.end_polygon().is_err());
        assert_eq!(builder.num_sub_meshes(), 0);

        assert!(builder
            .add_layer(MeshBuilderVertexAttributeLayer::new(3, AttributeKind::OrgVtxNumbers, false))
            .is_err());
    }
}
