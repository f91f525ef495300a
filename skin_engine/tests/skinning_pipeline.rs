//! 蒙皮权重优化 → 烘焙 → Actor 实例更新

use std::f32::consts::FRAC_PI_2;
use std::sync::Arc;

use glam::{Quat, Vec3};
use rstest::rstest;
use skin_engine::builder::MeshBuilderVertexAttributeLayer;
use skin_engine::deformer::{MorphDelta, MorphTarget};
use skin_engine::math::Transform;
use skin_engine::{
    Actor, ActorInstance, AttributeKind, DualQuatSkinDeformer, Mesh, MeshBuilder,
    MeshBuilderSkinningInfo, MeshDeformerStack, MeshType, MorphMeshDeformer, Node, Skeleton,
    SkinningConfig, SoftSkinDeformer, UpdateScheduler,
};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[rstest]
#[case::fills_missing_weight(vec![0.5, 0.3], vec![0.625, 0.375])]
#[case::over_unity_untouched(vec![0.7, 0.6], vec![0.7, 0.6])]
#[case::drops_tiny_weight(vec![0.99995, 0.00005], vec![1.0])]
#[case::keeps_four_largest(vec![0.3, 0.25, 0.2, 0.15, 0.1], vec![0.3333, 0.2778, 0.2222, 0.1667])]
fn optimize_weights_with_default_config(#[case] weights: Vec<f32>, #[case] expected: Vec<f32>) {
    let config = SkinningConfig::default();
    let mut info = MeshBuilderSkinningInfo::new(1);
    for (node, weight) in weights.iter().enumerate() {
        info.add_influence(0, node, *weight);
    }

    info.optimize_skinning_influences(config.weight_tolerance, config.max_weights_per_vertex);

    let result: Vec<f32> = info.influences(0).iter().map(|i| i.weight).collect();
    assert_eq!(result.len(), expected.len());
    for (got, want) in result.iter().zip(&expected) {
        assert!((got - want).abs() < 1e-3, "{:?} != {:?}", result, expected);
    }
}

/// root 在原点，elbow 在 (1, 0, 0)
fn arm_skeleton() -> Skeleton {
    let mut skeleton = Skeleton::new();
    skeleton.add_node(Node::new("root", None, Transform::IDENTITY));
    skeleton.add_node(Node::new("elbow", Some(0), Transform::from_translation(Vec3::X)));
    skeleton.build_hierarchy().unwrap();
    skeleton
}

/// 两行三列的条带：x = 0 绑定 root，x = 1 各一半，x = 2 绑定 elbow
fn arm_mesh() -> Mesh {
    let point = |org: usize| Vec3::new((org % 3) as f32, (org / 3) as f32, 0.0);

    let mut skinning = MeshBuilderSkinningInfo::new(6);
    for org in 0..6 {
        match org % 3 {
            0 => skinning.add_influence(org, 0, 1.0),
            1 => {
                skinning.add_influence(org, 0, 0.5);
                skinning.add_influence(org, 1, 0.5);
            }
            _ => skinning.add_influence(org, 1, 1.0),
        }
    }

    let mut builder = MeshBuilder::with_config(6, false, &SkinningConfig::default());
    let positions = builder
        .add_layer(MeshBuilderVertexAttributeLayer::new(6, AttributeKind::Positions, true))
        .unwrap();
    let normals = builder
        .add_layer(MeshBuilderVertexAttributeLayer::new(6, AttributeKind::Normals, true))
        .unwrap();
    builder.set_skinning_info(skinning).unwrap();

    for quad in [[0, 1, 4, 3], [1, 2, 5, 4]] {
        builder.begin_polygon(0).unwrap();
        for org in quad {
            builder.set_current_vertex_value(positions, point(org)).unwrap();
            builder.set_current_vertex_value(normals, Vec3::Z).unwrap();
            builder.add_polygon_vertex(org).unwrap();
        }
        builder.end_polygon().unwrap();
    }
    builder.build()
}

fn arm_actor(stack: MeshDeformerStack) -> Arc<Actor> {
    let mut actor = Actor::new("arm", arm_skeleton());
    actor.set_mesh(0, 1, arm_mesh()).unwrap();
    actor.set_mesh_deformer_stack(0, 1, stack).unwrap();
    actor.reinitialize_mesh_deformers(0).unwrap();
    Arc::new(actor)
}

fn bend_elbow(instance: &mut ActorInstance, angle: f32) {
    instance.pose_mut().set_local_transform(
        1,
        Transform::from_rotation_translation(Quat::from_rotation_z(angle), Vec3::X),
    );
}

fn deformed_positions(instance: &ActorInstance) -> Vec<Vec3> {
    instance
        .mesh(1)
        .unwrap()
        .find_vertex_data::<Vec3>(AttributeKind::Positions, 0)
        .unwrap()
        .to_vec()
}

fn position_of_org(instance: &ActorInstance, org: u32) -> Vec3 {
    let mesh = instance.mesh(1).unwrap();
    let vertex = mesh
        .org_vertex_numbers()
        .unwrap()
        .iter()
        .position(|&o| o == org)
        .unwrap();
    deformed_positions(instance)[vertex]
}

#[test]
fn baked_arm_classifies_as_gpu_skinned() {
    let mut stack = MeshDeformerStack::new();
    stack.add_deformer(SoftSkinDeformer::new());
    let actor = arm_actor(stack);

    let mesh = actor.mesh(0, 1).unwrap().unwrap();
    assert_eq!(mesh.num_vertices(), 6);
    assert_eq!(mesh.num_unique_joints(), 2);
    assert_eq!(mesh.highest_joint_index(), 1);
    assert_eq!(mesh.calc_max_num_influences(), 2);
    assert_eq!(mesh.sub_mesh(0).bones(), &[0, 1]);

    let config = SkinningConfig::default();
    assert_eq!(actor.classify_mesh_type(0, 1, Some(&config)).unwrap(), MeshType::GpuDeformed);
    let tight = SkinningConfig {
        max_influences: 1,
        ..SkinningConfig::default()
    };
    assert_eq!(actor.classify_mesh_type(0, 1, Some(&tight)).unwrap(), MeshType::CpuDeformed);
}

#[test]
fn soft_skin_bends_arm() {
    init_logger();
    let mut stack = MeshDeformerStack::new();
    stack.add_deformer(SoftSkinDeformer::new());
    let mut instance = ActorInstance::new(arm_actor(stack));

    bend_elbow(&mut instance, FRAC_PI_2);
    assert_eq!(instance.update_mesh_deformers(0.016), 1);

    assert!((position_of_org(&instance, 0) - Vec3::ZERO).length() < 1e-5);
    assert!((position_of_org(&instance, 2) - Vec3::new(1.0, 1.0, 0.0)).length() < 1e-5);
    assert!((position_of_org(&instance, 5) - Vec3::new(0.0, 1.0, 0.0)).length() < 1e-5);
    // 半权重顶点在 elbow 处不动
    assert!((position_of_org(&instance, 1) - Vec3::X).length() < 1e-5);

    // 回到绑定姿势后结果与原始数据一致
    bend_elbow(&mut instance, 0.0);
    instance.update_mesh_deformers(0.016);
    let mesh = instance.mesh(1).unwrap();
    let original = mesh
        .find_original_vertex_data::<Vec3>(AttributeKind::Positions, 0)
        .unwrap();
    for (p, q) in deformed_positions(&instance).iter().zip(original) {
        assert!((*p - *q).length() < 1e-5);
    }
}

#[test]
fn dual_quat_matches_linear_for_rigid_vertices() {
    let mut linear_stack = MeshDeformerStack::new();
    linear_stack.add_deformer(SoftSkinDeformer::new());
    let mut dual_stack = MeshDeformerStack::new();
    dual_stack.add_deformer(DualQuatSkinDeformer::new());

    let mut linear = ActorInstance::new(arm_actor(linear_stack));
    let mut dual = ActorInstance::new(arm_actor(dual_stack));
    for instance in [&mut linear, &mut dual] {
        bend_elbow(instance, FRAC_PI_2);
        instance.update_mesh_deformers(0.0);
    }

    for org in [0, 2, 3, 5] {
        let a = position_of_org(&linear, org);
        let b = position_of_org(&dual, org);
        assert!((a - b).length() < 1e-4, "org {}: {} vs {}", org, a, b);
    }
    // 半权重顶点：线性混合塌向关节，对偶四元数保持到关节的距离
    let elbow = Vec3::X;
    let dual_mid = position_of_org(&dual, 4);
    let linear_mid = position_of_org(&linear, 4);
    assert!((dual_mid - elbow).length() > (linear_mid - elbow).length());
}

#[test]
fn morph_then_skin_chain() {
    let mut morph = MorphMeshDeformer::new();
    // 复制顶点号在烘焙后才确定，这里按原始顶点 2 查找
    let mesh = arm_mesh();
    let vertex = mesh
        .org_vertex_numbers()
        .unwrap()
        .iter()
        .position(|&o| o == 2)
        .unwrap() as u32;
    let stretch = MorphTarget::new("stretch", vec![MorphDelta::position(vertex, Vec3::X)]);
    let target = morph.add_target(stretch);
    morph.set_target_weight(target, 1.0);

    let mut stack = MeshDeformerStack::new();
    stack.add_deformer(morph);
    stack.add_deformer(SoftSkinDeformer::new());
    let actor = arm_actor(stack);
    assert_eq!(
        actor.classify_mesh_type(0, 1, Some(&SkinningConfig::default())).unwrap(),
        MeshType::CpuDeformed
    );

    let mut instance = ActorInstance::new(actor);
    bend_elbow(&mut instance, FRAC_PI_2);
    assert_eq!(instance.update_mesh_deformers(0.016), 2);
    // (3, 0, 0) 绕 elbow 旋转 90 度
    assert!((position_of_org(&instance, 2) - Vec3::new(1.0, 2.0, 0.0)).length() < 1e-5);

    // 每帧从原始数据重新开始，偏移不会累积
    instance.update_mesh_deformers(0.016);
    assert!((position_of_org(&instance, 2) - Vec3::new(1.0, 2.0, 0.0)).length() < 1e-5);
}

#[test]
fn schedulers_produce_identical_results() {
    let mut stack = MeshDeformerStack::new();
    stack.add_deformer(SoftSkinDeformer::new());
    let actor = arm_actor(stack);

    let mut single: Vec<ActorInstance> = (0..8)
        .map(|i| {
            let mut instance = ActorInstance::new(Arc::clone(&actor));
            bend_elbow(&mut instance, i as f32 * 0.2);
            instance
        })
        .collect();
    let mut multi = single.clone();

    assert_eq!(UpdateScheduler::SingleThread.update(&mut single, 0.016), 8);
    assert_eq!(UpdateScheduler::MultiThread.update(&mut multi, 0.016), 8);
    for (a, b) in single.iter().zip(&multi) {
        assert_eq!(deformed_positions(a), deformed_positions(b));
    }
    assert_ne!(deformed_positions(&single[0]), deformed_positions(&single[7]));
}
