//! 网格几何计算：法线、切线、包围盒、射线求交
//!
//! 多边形一律按扇形三角化：第 i 个三角形为 (idx[s], idx[s+i], idx[s+i-1])。

use glam::{Mat4, Vec2, Vec3, Vec4};

use super::{AttributeKind, Mesh, VertexAttributeLayer};
use crate::math::{Aabb, Ray};

/// 射线命中信息（世界空间）
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayHit {
    pub point: Vec3,
    pub bary_u: f32,
    pub bary_v: f32,
    /// 命中三角形的三个顶点索引
    pub indices: [u32; 3],
}

impl Mesh {
    /// 遍历扇形三角化后的三角形 (a, b, c)
    pub fn for_each_triangle(&self, mut f: impl FnMut(u32, u32, u32)) {
        let indices = self.indices();
        let mut poly_start = 0usize;
        for &count in self.poly_vertex_counts() {
            let count = count as usize;
            for i in 2..count {
                f(
                    indices[poly_start],
                    indices[poly_start + i],
                    indices[poly_start + i - 1],
                );
            }
            poly_start += count;
        }
    }

    /// 计算法线，写入法线层（当前与原始数据）
    ///
    /// `use_duplicates` 为 false 时按原始顶点累加面法线（跨接缝平滑），
    /// 为 true 时按复制顶点累加（保留硬边）。
    pub fn calc_normals(&mut self, use_duplicates: bool) {
        let num_vertices = self.num_vertices();
        let normals = {
            let Some(positions) =
                self.find_original_vertex_data::<Vec3>(AttributeKind::Positions, 0)
            else {
                log::warn!("网格没有位置数据，无法计算法线");
                return;
            };
            let org_vertices = self.org_vertex_numbers();

            let slot = |v: u32| -> usize {
                match (use_duplicates, org_vertices) {
                    (false, Some(org)) => org[v as usize] as usize,
                    _ => v as usize,
                }
            };
            let num_slots = match (use_duplicates, org_vertices) {
                (false, Some(_)) => self.num_org_vertices(),
                _ => num_vertices,
            };

            let mut sums = vec![Vec3::ZERO; num_slots];
            self.for_each_triangle(|c, b, a| {
                let pos_a = positions[a as usize];
                let pos_b = positions[b as usize];
                let pos_c = positions[c as usize];
                let face_normal = (pos_b - pos_a).cross(pos_c - pos_b).normalize_or_zero();
                sums[slot(a)] += face_normal;
                sums[slot(b)] += face_normal;
                sums[slot(c)] += face_normal;
            });

            (0..num_vertices as u32)
                .map(|v| sums[slot(v)].normalize_or_zero())
                .collect::<Vec<_>>()
        };

        if self
            .find_vertex_attribute_layer(AttributeKind::Normals, 0)
            .is_none()
        {
            self.add_vertex_attribute_layer(VertexAttributeLayer::new(
                num_vertices,
                AttributeKind::Normals,
                true,
            ));
        }
        if let Some(layer) = self.find_vertex_attribute_layer_mut(AttributeKind::Normals, 0) {
            layer.copy_from_slice_all(&normals);
        }
    }

    /// 计算切线（w 为手性）与可选的副切线
    ///
    /// 只支持纯三角网格。缺少 `uv_set` 时回退到 UV 0，都没有则返回 false。
    pub fn calc_tangents(&mut self, uv_set: usize, store_bitangents: bool) -> bool {
        if !self.check_if_is_triangle_mesh() {
            log::warn!("网格不是纯三角网格，无法计算切线");
            return false;
        }

        let mut uv_set = uv_set;
        if self
            .find_vertex_attribute_layer(AttributeKind::UvCoords, uv_set)
            .is_none()
        {
            if uv_set == 0
                || self
                    .find_vertex_attribute_layer(AttributeKind::UvCoords, 0)
                    .is_none()
            {
                return false;
            }
            log::warn!("找不到 UV 集 {}，回退到 UV 集 0 计算切线", uv_set);
            uv_set = 0;
        }

        let num_vertices = self.num_vertices();
        let computed = {
            let (Some(positions), Some(normals), Some(uvs)) = (
                self.find_original_vertex_data::<Vec3>(AttributeKind::Positions, 0),
                self.find_original_vertex_data::<Vec3>(AttributeKind::Normals, 0),
                self.find_vertex_data::<Vec2>(AttributeKind::UvCoords, uv_set),
            ) else {
                log::warn!("网格缺少位置或法线数据，无法计算切线");
                return false;
            };
            compute_tangents(self, positions, normals, uvs)
        };

        // 为 uv_set 之前的每个 UV 集补齐切线层
        let num_tangent_layers = self.calc_num_attribute_layers(AttributeKind::Tangents);
        for _ in num_tangent_layers..=uv_set {
            self.add_vertex_attribute_layer(VertexAttributeLayer::from_values(
                AttributeKind::Tangents,
                vec![Vec4::new(1.0, 0.0, 0.0, 0.0); num_vertices],
                true,
            ));
            if store_bitangents {
                self.add_vertex_attribute_layer(VertexAttributeLayer::from_values(
                    AttributeKind::Bitangents,
                    vec![Vec3::Z; num_vertices],
                    true,
                ));
            }
        }

        let (tangents, bitangents) = computed;
        if let Some(layer) = self.find_vertex_attribute_layer_mut(AttributeKind::Tangents, uv_set) {
            layer.copy_from_slice_all(&tangents);
        }
        if let Some(layer) = self.find_vertex_attribute_layer_mut(AttributeKind::Bitangents, uv_set)
        {
            layer.copy_from_slice_all(&bitangents);
        }
        true
    }

    /// 计算包围盒，每隔 `vertex_frequency` 个顶点取一个
    pub fn calc_aabb(&self, transform: &Mat4, vertex_frequency: usize) -> Aabb {
        debug_assert!(vertex_frequency >= 1);
        let mut aabb = Aabb::null();
        if let Some(positions) = self.find_vertex_data::<Vec3>(AttributeKind::Positions, 0) {
            for position in positions.iter().step_by(vertex_frequency.max(1)) {
                aabb.add_point(transform.transform_point3(*position));
            }
        }
        aabb
    }

    /// 射线是否与网格相交（射线在世界空间）
    pub fn intersects(&self, transform: &Mat4, ray: &Ray) -> bool {
        let Some(positions) = self.find_vertex_data::<Vec3>(AttributeKind::Positions, 0) else {
            return false;
        };
        let local_ray = ray.transformed(&transform.inverse());

        let mut hit = false;
        self.for_each_triangle(|a, b, c| {
            if !hit {
                hit = local_ray.intersects_triangle(
                    positions[a as usize],
                    positions[b as usize],
                    positions[c as usize],
                );
            }
        });
        hit
    }

    /// 求最近交点，返回世界空间交点、重心坐标与三角形索引
    pub fn intersects_detailed(&self, transform: &Mat4, ray: &Ray) -> Option<RayHit> {
        let positions = self.find_vertex_data::<Vec3>(AttributeKind::Positions, 0)?;
        let local_ray = ray.transformed(&transform.inverse());
        let origin = local_ray.origin();

        let mut closest: Option<(f32, RayHit)> = None;
        self.for_each_triangle(|a, b, c| {
            let Some(hit) = local_ray.intersect_triangle(
                positions[a as usize],
                positions[b as usize],
                positions[c as usize],
            ) else {
                return;
            };

            let dist = (hit.point - origin).length_squared();
            if closest.map_or(true, |(best, _)| dist < best) {
                closest = Some((
                    dist,
                    RayHit {
                        point: hit.point,
                        bary_u: hit.bary_u,
                        bary_v: hit.bary_v,
                        indices: [a, b, c],
                    },
                ));
            }
        });

        closest.map(|(_, hit)| RayHit {
            point: transform.transform_point3(hit.point),
            ..hit
        })
    }
}

/// 由 UV 梯度计算面切线与副切线（未归一化）
fn tangent_and_bitangent_for_face(
    pos_a: Vec3,
    pos_b: Vec3,
    pos_c: Vec3,
    uv_a: Vec2,
    uv_b: Vec2,
    uv_c: Vec2,
) -> (Vec3, Vec3) {
    let e1 = pos_b - pos_a;
    let e2 = pos_c - pos_a;
    let d1 = uv_b - uv_a;
    let d2 = uv_c - uv_a;

    let divider = d1.x * d2.y - d2.x * d1.y;
    let r = if divider.abs() < f32::EPSILON {
        1.0
    } else {
        1.0 / divider
    };

    let tangent = (e1 * d2.y - e2 * d1.y) * r;
    let bitangent = (e2 * d1.x - e1 * d2.x) * r;
    (tangent, bitangent)
}

/// 按原始顶点累加面切线，再逐复制顶点做 Gram-Schmidt 正交化
fn compute_tangents(
    mesh: &Mesh,
    positions: &[Vec3],
    normals: &[Vec3],
    uvs: &[Vec2],
) -> (Vec<Vec4>, Vec<Vec3>) {
    let num_vertices = mesh.num_vertices();
    let org_vertices = mesh.org_vertex_numbers();
    let slot = |v: usize| org_vertices.map_or(v, |org| org[v] as usize);
    let num_slots = if org_vertices.is_some() {
        mesh.num_org_vertices()
    } else {
        num_vertices
    };

    let mut tangent_sums = vec![Vec3::ZERO; num_slots];
    let mut bitangent_sums = vec![Vec3::ZERO; num_slots];
    mesh.for_each_triangle(|a, b, c| {
        let (a, b, c) = (a as usize, b as usize, c as usize);
        let (tangent, bitangent) = tangent_and_bitangent_for_face(
            positions[a],
            positions[b],
            positions[c],
            uvs[a],
            uvs[b],
            uvs[c],
        );
        let tangent = tangent.normalize_or_zero();
        let bitangent = bitangent.normalize_or_zero();
        for v in [a, b, c] {
            tangent_sums[slot(v)] += tangent;
            bitangent_sums[slot(v)] += bitangent;
        }
    });

    let mut tangents = Vec::with_capacity(num_vertices);
    let mut bitangents = Vec::with_capacity(num_vertices);
    for v in 0..num_vertices {
        let normal = normals[v].normalize_or_zero();

        let tangent = tangent_sums[slot(v)];
        let tangent = if tangent.length() < f32::EPSILON {
            Vec3::X
        } else {
            tangent.normalize()
        };

        let bitangent = bitangent_sums[slot(v)];
        let bitangent = if bitangent.length() < f32::EPSILON {
            Vec3::Y
        } else {
            bitangent.normalize()
        };

        let fixed = (tangent - normal * normal.dot(tangent)).normalize_or_zero();
        let handedness = if normal.cross(tangent).dot(bitangent) < 0.0 {
            -1.0
        } else {
            1.0
        };

        tangents.push(fixed.extend(handedness));
        bitangents.push(bitangent);
    }
    (tangents, bitangents)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// XY 平面上的单位正方形（一个四边形），法线 +Z
    fn quad_mesh() -> Mesh {
        let mut mesh = Mesh::with_counts(4, 4, 1, 4, false);
        mesh.indices_mut().copy_from_slice(&[0, 1, 2, 3]);
        mesh.poly_vertex_counts_mut()[0] = 4;
        mesh.add_vertex_attribute_layer(VertexAttributeLayer::from_values(
            AttributeKind::Positions,
            vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(1.0, 1.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
            ],
            true,
        ));
        mesh.add_vertex_attribute_layer(VertexAttributeLayer::from_values(
            AttributeKind::OrgVtxNumbers,
            vec![0u32, 1, 2, 3],
            false,
        ));
        mesh.add_vertex_attribute_layer(VertexAttributeLayer::from_values(
            AttributeKind::UvCoords,
            vec![Vec2::ZERO, Vec2::X, Vec2::ONE, Vec2::Y],
            false,
        ));
        mesh
    }

    /// 同一个正方形拆成两个三角形
    fn triangle_mesh() -> Mesh {
        let mut mesh = quad_mesh();
        let layers: Vec<VertexAttributeLayer> = mesh.vertex_attribute_layers().to_vec();
        mesh.allocate(4, 6, 2, 4);
        mesh.indices_mut().copy_from_slice(&[0, 1, 2, 0, 2, 3]);
        mesh.poly_vertex_counts_mut().copy_from_slice(&[3, 3]);
        for layer in layers {
            mesh.add_vertex_attribute_layer(layer);
        }
        mesh
    }

    #[test]
    fn test_calc_normals_ccw_points_up() {
        let mut mesh = quad_mesh();
        mesh.calc_normals(false);
        let normals = mesh.find_vertex_data::<Vec3>(AttributeKind::Normals, 0).unwrap();
        for normal in normals {
            assert!((*normal - Vec3::Z).length() < 1e-5);
        }
        let original = mesh
            .find_original_vertex_data::<Vec3>(AttributeKind::Normals, 0)
            .unwrap();
        assert_eq!(original, normals);
    }

    #[test]
    fn test_calc_tangents_requires_triangles() {
        let mut mesh = quad_mesh();
        mesh.calc_normals(true);
        assert!(!mesh.calc_tangents(0, false));
        assert_eq!(mesh.calc_num_attribute_layers(AttributeKind::Tangents), 0);
    }

    #[test]
    fn test_calc_tangents_follow_u_axis() {
        let mut mesh = triangle_mesh();
        mesh.calc_normals(true);
        assert!(mesh.calc_tangents(0, true));

        let tangents = mesh.find_vertex_data::<Vec4>(AttributeKind::Tangents, 0).unwrap();
        let bitangents = mesh
            .find_vertex_data::<Vec3>(AttributeKind::Bitangents, 0)
            .unwrap();
        for (tangent, bitangent) in tangents.iter().zip(bitangents) {
            assert!((tangent.truncate() - Vec3::X).length() < 1e-5);
            assert_eq!(tangent.w, 1.0);
            assert!((*bitangent - Vec3::Y).length() < 1e-5);
        }
    }

    #[test]
    fn test_calc_tangents_falls_back_to_uv0() {
        let mut mesh = triangle_mesh();
        mesh.calc_normals(true);
        assert!(mesh.calc_tangents(2, false));
        // 回退后只补齐 UV 0 的切线层
        assert_eq!(mesh.calc_num_attribute_layers(AttributeKind::Tangents), 1);
    }

    #[test]
    fn test_intersects_detailed_returns_closest() {
        let mesh = triangle_mesh();
        let transform = Mat4::from_translation(Vec3::new(0.0, 0.0, 2.0));
        let ray = Ray::new(Vec3::new(0.75, 0.25, 10.0), Vec3::new(0.75, 0.25, -10.0));

        assert!(mesh.intersects(&transform, &ray));
        let hit = mesh.intersects_detailed(&transform, &ray).unwrap();
        assert!((hit.point - Vec3::new(0.75, 0.25, 2.0)).length() < 1e-4);
        assert_eq!(hit.indices, [0, 2, 1]);

        let miss = Ray::new(Vec3::new(3.0, 3.0, 10.0), Vec3::new(3.0, 3.0, -10.0));
        assert!(mesh.intersects_detailed(&transform, &miss).is_none());
    }

    #[test]
    fn test_calc_aabb_with_transform() {
        let mesh = quad_mesh();
        let aabb = mesh.calc_aabb(&Mat4::from_scale(Vec3::splat(2.0)), 1);
        assert_eq!(aabb.min(), Vec3::ZERO);
        assert_eq!(aabb.max(), Vec3::new(2.0, 2.0, 0.0));

        let sparse = mesh.calc_aabb(&Mat4::IDENTITY, 2);
        assert_eq!(sparse.max(), Vec3::new(1.0, 1.0, 0.0));
    }
}
