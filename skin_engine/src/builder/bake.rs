//! 构建器 → 运行时网格

use super::MeshBuilder;
use crate::mesh::{
    AttributeData, AttributeKind, Mesh, SkinningInfoVertexAttributeLayer, SubMesh,
    VertexAttributeLayer,
};

impl Mesh {
    /// 从构建器生成网格
    ///
    /// 子网格按顺序连续排列顶点、索引和多边形；始终生成原始顶点号层；
    /// 蒙皮影响的 `bone_nr` 取第一个使用该原始顶点的子网格中的骨骼序号。
    pub fn from_mesh_builder(builder: &MeshBuilder) -> Mesh {
        let num_vertices = builder.calc_num_vertices();
        let num_org_vertices = builder.num_org_vertices();
        let mut mesh = Mesh::with_counts(
            num_vertices,
            builder.calc_num_indices(),
            builder.calc_num_polygons(),
            num_org_vertices,
            builder.is_collision_mesh(),
        );

        let lookups = || builder.sub_meshes().iter().flat_map(|s| s.vertices().iter());

        for layer in builder.layers() {
            let mut data = AttributeData::zeroed(layer.kind(), num_vertices);
            for (vertex, lookup) in lookups().enumerate() {
                layer
                    .value(lookup.org_vtx, lookup.duplicate_nr)
                    .write_into(&mut data, vertex);
            }
            mesh.add_vertex_attribute_layer(
                VertexAttributeLayer::from_data(layer.kind(), data, layer.keep_originals())
                    .with_name(layer.name()),
            );
        }

        let org_vertex_numbers: Vec<u32> = lookups().map(|lookup| lookup.org_vtx as u32).collect();
        mesh.add_vertex_attribute_layer(VertexAttributeLayer::from_values(
            AttributeKind::OrgVtxNumbers,
            org_vertex_numbers,
            false,
        ));

        let mut start_vertex = 0;
        let mut start_index = 0;
        let mut start_polygon = 0;
        for builder_sub_mesh in builder.sub_meshes() {
            let num_indices = builder_sub_mesh.num_indices();
            let num_polygons = builder_sub_mesh.num_polygons();

            let indices = &mut mesh.indices_mut()[start_index..start_index + num_indices];
            for (out, &local) in indices.iter_mut().zip(builder_sub_mesh.indices()) {
                *out = start_vertex as u32 + local;
            }
            mesh.poly_vertex_counts_mut()[start_polygon..start_polygon + num_polygons]
                .copy_from_slice(builder_sub_mesh.poly_vertex_counts());

            let mut sub_mesh = SubMesh::new(
                start_vertex,
                start_index,
                start_polygon,
                builder_sub_mesh.num_vertices(),
                num_indices,
                num_polygons,
                builder_sub_mesh.material(),
            );
            sub_mesh.set_bones(builder_sub_mesh.bones().to_vec());
            mesh.add_sub_mesh(sub_mesh);

            start_vertex += builder_sub_mesh.num_vertices();
            start_index += num_indices;
            start_polygon += num_polygons;
        }

        if let Some(skinning_info) = builder.skinning_info() {
            let mut first_sub_mesh: Vec<Option<usize>> = vec![None; num_org_vertices];
            for (index, sub_mesh) in builder.sub_meshes().iter().enumerate() {
                for lookup in sub_mesh.vertices() {
                    first_sub_mesh[lookup.org_vtx].get_or_insert(index);
                }
            }

            let mut layer = SkinningInfoVertexAttributeLayer::new(num_org_vertices);
            for (org_vertex, sub_mesh_index) in first_sub_mesh.iter().enumerate() {
                for influence in skinning_info.influences(org_vertex) {
                    let bone_nr = sub_mesh_index
                        .and_then(|s| mesh.sub_mesh(s).find_bone_index(influence.node_nr))
                        .unwrap_or(0);
                    layer.add_influence(org_vertex, influence.node_nr, influence.weight, bone_nr);
                }
            }

            let mut nodes = Vec::new();
            layer.collect_influenced_nodes(&mut nodes);
            mesh.set_num_unique_joints(nodes.len());
            mesh.set_highest_joint_index(nodes.iter().copied().max().unwrap_or(0));
            mesh.add_shared_vertex_attribute_layer(layer);
        }

        mesh
    }
}
