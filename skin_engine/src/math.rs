//! 数学辅助类型：TRS 变换、射线、包围盒、对偶四元数

use glam::{Mat4, Quat, Vec3, Vec4};

/// 节点 TRS 变换
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }

    pub fn from_rotation_translation(rotation: Quat, translation: Vec3) -> Self {
        Self {
            translation,
            rotation,
            scale: Vec3::ONE,
        }
    }

    /// 从矩阵分解（假设矩阵不含切变）
    pub fn from_matrix(matrix: &Mat4) -> Self {
        let (scale, rotation, translation) = matrix.to_scale_rotation_translation();
        Self {
            translation,
            rotation,
            scale,
        }
    }

    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.rotation * (point * self.scale) + self.translation
    }
}

/// 射线（线段形式：起点到终点）
#[derive(Clone, Copy, Debug)]
pub struct Ray {
    origin: Vec3,
    dest: Vec3,
}

/// 射线与三角形相交结果
#[derive(Clone, Copy, Debug)]
pub struct TriangleHit {
    pub point: Vec3,
    pub bary_u: f32,
    pub bary_v: f32,
}

impl Ray {
    pub fn new(origin: Vec3, dest: Vec3) -> Self {
        Self { origin, dest }
    }

    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    pub fn dest(&self) -> Vec3 {
        self.dest
    }

    pub fn direction(&self) -> Vec3 {
        (self.dest - self.origin).normalize_or_zero()
    }

    pub fn length(&self) -> f32 {
        (self.dest - self.origin).length()
    }

    /// 用矩阵变换起点与终点
    pub fn transformed(&self, matrix: &Mat4) -> Self {
        Self {
            origin: matrix.transform_point3(self.origin),
            dest: matrix.transform_point3(self.dest),
        }
    }

    /// 与三角形求交（Möller-Trumbore），只接受线段范围内的交点
    pub fn intersect_triangle(&self, p1: Vec3, p2: Vec3, p3: Vec3) -> Option<TriangleHit> {
        let dir = self.dest - self.origin;
        let edge1 = p2 - p1;
        let edge2 = p3 - p1;

        let pvec = dir.cross(edge2);
        let det = edge1.dot(pvec);
        if det.abs() < f32::EPSILON {
            return None;
        }

        let inv_det = 1.0 / det;
        let tvec = self.origin - p1;
        let u = tvec.dot(pvec) * inv_det;
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let qvec = tvec.cross(edge1);
        let v = dir.dot(qvec) * inv_det;
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        // t 以线段长度归一化
        let t = edge2.dot(qvec) * inv_det;
        if !(0.0..=1.0).contains(&t) {
            return None;
        }

        Some(TriangleHit {
            point: self.origin + dir * t,
            bary_u: u,
            bary_v: v,
        })
    }

    pub fn intersects_triangle(&self, p1: Vec3, p2: Vec3, p3: Vec3) -> bool {
        self.intersect_triangle(p1, p2, p3).is_some()
    }
}

/// 轴对齐包围盒，可以为空
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    min: Vec3,
    max: Vec3,
}

impl Default for Aabb {
    fn default() -> Self {
        Self::null()
    }
}

impl Aabb {
    /// 空包围盒（min > max）
    pub fn null() -> Self {
        Self {
            min: Vec3::splat(f32::MAX),
            max: Vec3::splat(-f32::MAX),
        }
    }

    pub fn from_min_max(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    pub fn is_valid(&self) -> bool {
        self.min.cmple(self.max).all()
    }

    pub fn add_point(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    pub fn min(&self) -> Vec3 {
        self.min
    }

    pub fn max(&self) -> Vec3 {
        self.max
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn extents(&self) -> Vec3 {
        self.max - self.min
    }
}

/// 对偶四元数（刚体变换），分量以 Vec4(x, y, z, w) 存储以便线性混合
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DualQuat {
    pub real: Vec4,
    pub dual: Vec4,
}

impl Default for DualQuat {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// 四元数 Hamilton 乘积，不要求单位长度
fn quat_mul(a: Vec4, b: Vec4) -> Vec4 {
    Vec4::new(
        a.w * b.x + a.x * b.w + a.y * b.z - a.z * b.y,
        a.w * b.y - a.x * b.z + a.y * b.w + a.z * b.x,
        a.w * b.z + a.x * b.y - a.y * b.x + a.z * b.w,
        a.w * b.w - a.x * b.x - a.y * b.y - a.z * b.z,
    )
}

fn quat_conjugate(q: Vec4) -> Vec4 {
    Vec4::new(-q.x, -q.y, -q.z, q.w)
}

impl DualQuat {
    pub const IDENTITY: Self = Self {
        real: Vec4::new(0.0, 0.0, 0.0, 1.0),
        dual: Vec4::ZERO,
    };

    pub const ZERO: Self = Self {
        real: Vec4::ZERO,
        dual: Vec4::ZERO,
    };

    /// dual = 0.5 * t * r
    pub fn from_rotation_translation(rotation: Quat, translation: Vec3) -> Self {
        let real = Vec4::from(rotation);
        let t = translation.extend(0.0);
        Self {
            real,
            dual: quat_mul(t, real) * 0.5,
        }
    }

    /// 从矩阵构建，忽略缩放
    pub fn from_matrix(matrix: &Mat4) -> Self {
        let (_, rotation, translation) = matrix.to_scale_rotation_translation();
        Self::from_rotation_translation(rotation.normalize(), translation)
    }

    pub fn scaled(&self, s: f32) -> Self {
        Self {
            real: self.real * s,
            dual: self.dual * s,
        }
    }

    pub fn add(&self, other: &Self) -> Self {
        Self {
            real: self.real + other.real,
            dual: self.dual + other.dual,
        }
    }

    /// 实部点积，用于混合时的对跖检测
    pub fn real_dot(&self, other: &Self) -> f32 {
        self.real.dot(other.real)
    }

    /// 按实部长度归一化，退化时返回单位变换
    pub fn normalized(&self) -> Self {
        let length = self.real.length();
        if length < 1e-10 {
            log::debug!("对偶四元数实部长度 {} 接近 0，使用单位变换", length);
            return Self::IDENTITY;
        }
        let inv = 1.0 / length;
        Self {
            real: self.real * inv,
            dual: self.dual * inv,
        }
    }

    pub fn rotation(&self) -> Quat {
        Quat::from_vec4(self.real)
    }

    /// 平移 = 2 * dual * conj(real)
    pub fn translation(&self) -> Vec3 {
        (quat_mul(self.dual, quat_conjugate(self.real)) * 2.0).truncate()
    }

    /// 变换点（要求已归一化）
    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.rotation() * point + self.translation()
    }

    /// 变换方向（只旋转）
    pub fn transform_vector(&self, vector: Vec3) -> Vec3 {
        self.rotation() * vector
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ray_hits_triangle_inside_segment() {
        let ray = Ray::new(Vec3::new(0.25, 0.25, 5.0), Vec3::new(0.25, 0.25, -5.0));
        let hit = ray
            .intersect_triangle(Vec3::ZERO, Vec3::X, Vec3::Y)
            .unwrap();
        assert!((hit.point - Vec3::new(0.25, 0.25, 0.0)).length() < 1e-5);
        assert!((hit.bary_u - 0.25).abs() < 1e-5);
        assert!((hit.bary_v - 0.25).abs() < 1e-5);
    }

    #[test]
    fn test_ray_segment_too_short() {
        let ray = Ray::new(Vec3::new(0.25, 0.25, 5.0), Vec3::new(0.25, 0.25, 1.0));
        assert!(!ray.intersects_triangle(Vec3::ZERO, Vec3::X, Vec3::Y));
    }

    #[test]
    fn test_aabb_null_and_points() {
        let mut aabb = Aabb::null();
        assert!(!aabb.is_valid());
        aabb.add_point(Vec3::new(1.0, -2.0, 3.0));
        aabb.add_point(Vec3::new(-1.0, 2.0, 0.0));
        assert!(aabb.is_valid());
        assert_eq!(aabb.min(), Vec3::new(-1.0, -2.0, 0.0));
        assert_eq!(aabb.max(), Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_dual_quat_matches_matrix() {
        let rotation = Quat::from_rotation_y(0.7);
        let translation = Vec3::new(1.0, 2.0, -3.0);
        let matrix = Mat4::from_rotation_translation(rotation, translation);
        let dq = DualQuat::from_matrix(&matrix);
        let p = Vec3::new(0.5, -1.0, 2.0);
        let expected = matrix.transform_point3(p);
        assert!((dq.transform_point(p) - expected).length() < 1e-4);
        assert!((dq.translation() - translation).length() < 1e-4);
    }

    #[test]
    fn test_cancelled_blend_normalizes_to_identity() {
        let dq = DualQuat::from_rotation_translation(Quat::from_rotation_x(0.4), Vec3::Y);
        let cancelled = dq.scaled(0.5).add(&dq.scaled(-0.5)).normalized();
        let p = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(cancelled.rotation(), Quat::IDENTITY);
        assert!((cancelled.transform_point(p) - p).length() < 1e-6);
    }

    #[test]
    fn test_transform_roundtrip_matrix() {
        let t = Transform {
            translation: Vec3::new(1.0, 0.0, 2.0),
            rotation: Quat::from_rotation_z(0.3),
            scale: Vec3::splat(2.0),
        };
        let p = Vec3::new(1.0, 1.0, 1.0);
        assert!((t.to_matrix().transform_point3(p) - t.transform_point(p)).length() < 1e-5);
    }
}
