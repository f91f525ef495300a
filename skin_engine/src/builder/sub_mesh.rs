//! 构建期子网格

use std::collections::HashMap;

use super::MeshBuilderVertexLookup;

/// 构建期子网格
///
/// 索引保存的是子网格内的局部顶点号，烘焙时再加上子网格的起始顶点。
#[derive(Clone, Debug, Default)]
pub struct MeshBuilderSubMesh {
    material: usize,
    bones: Vec<usize>,
    vertices: Vec<MeshBuilderVertexLookup>,
    vertex_map: HashMap<MeshBuilderVertexLookup, u32>,
    indices: Vec<u32>,
    poly_vertex_counts: Vec<u8>,
}

impl MeshBuilderSubMesh {
    pub fn new(material: usize) -> Self {
        Self {
            material,
            ..Self::default()
        }
    }

    pub fn material(&self) -> usize {
        self.material
    }

    pub fn num_bones(&self) -> usize {
        self.bones.len()
    }

    pub fn bones(&self) -> &[usize] {
        &self.bones
    }

    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub fn vertex(&self, local_index: usize) -> MeshBuilderVertexLookup {
        self.vertices[local_index]
    }

    pub fn vertices(&self) -> &[MeshBuilderVertexLookup] {
        &self.vertices
    }

    pub fn num_indices(&self) -> usize {
        self.indices.len()
    }

    /// 局部索引
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn num_polygons(&self) -> usize {
        self.poly_vertex_counts.len()
    }

    pub fn poly_vertex_counts(&self) -> &[u8] {
        &self.poly_vertex_counts
    }

    pub fn is_triangle_only(&self) -> bool {
        self.poly_vertex_counts.iter().all(|&count| count == 3)
    }

    /// 多边形中尚未出现在本子网格的顶点数
    pub fn calc_num_new_vertices(&self, polygon: &[MeshBuilderVertexLookup]) -> usize {
        let mut seen: Vec<MeshBuilderVertexLookup> = Vec::with_capacity(polygon.len());
        for lookup in polygon {
            if !self.vertex_map.contains_key(lookup) && !seen.contains(lookup) {
                seen.push(*lookup);
            }
        }
        seen.len()
    }

    /// 多边形中尚未出现在本子网格的骨骼数
    pub fn calc_num_new_bones(&self, polygon_bones: &[usize]) -> usize {
        polygon_bones
            .iter()
            .filter(|bone| !self.bones.contains(bone))
            .count()
    }

    /// 加入多边形后是否仍满足材质、骨骼和顶点限制
    pub fn can_handle_polygon(
        &self,
        polygon: &[MeshBuilderVertexLookup],
        polygon_bones: &[usize],
        material: usize,
        max_bones: usize,
        max_vertices: usize,
    ) -> bool {
        if self.material != material {
            return false;
        }
        if self.bones.len() + self.calc_num_new_bones(polygon_bones) > max_bones {
            return false;
        }
        self.vertices.len() + self.calc_num_new_vertices(polygon) <= max_vertices
    }

    pub fn add_polygon(&mut self, polygon: &[MeshBuilderVertexLookup], polygon_bones: &[usize]) {
        for bone in polygon_bones {
            if !self.bones.contains(bone) {
                self.bones.push(*bone);
            }
        }
        for lookup in polygon {
            let local = match self.vertex_map.get(lookup) {
                Some(&local) => local,
                None => {
                    let local = self.vertices.len() as u32;
                    self.vertices.push(*lookup);
                    self.vertex_map.insert(*lookup, local);
                    local
                }
            };
            self.indices.push(local);
        }
        self.poly_vertex_counts.push(polygon.len() as u8);
    }

    /// 替换索引顺序（局部顶点集合不变）
    pub(crate) fn set_indices(&mut self, indices: Vec<u32>) {
        debug_assert_eq!(indices.len(), self.indices.len());
        self.indices = indices;
    }

    /// 按索引中首次出现的顺序重新编号局部顶点
    pub fn generate_vertex_order(&mut self) {
        let mut remap = vec![u32::MAX; self.vertices.len()];
        let mut vertices = Vec::with_capacity(self.vertices.len());
        for index in &mut self.indices {
            let old = *index as usize;
            if remap[old] == u32::MAX {
                remap[old] = vertices.len() as u32;
                vertices.push(self.vertices[old]);
            }
            *index = remap[old];
        }
        // 未被索引引用的顶点放在末尾
        for (old, lookup) in self.vertices.iter().enumerate() {
            if remap[old] == u32::MAX {
                remap[old] = vertices.len() as u32;
                vertices.push(*lookup);
            }
        }

        self.vertex_map = vertices
            .iter()
            .enumerate()
            .map(|(local, lookup)| (*lookup, local as u32))
            .collect();
        self.vertices = vertices;
    }
}
