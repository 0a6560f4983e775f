use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use cicp_3d::{
    camera::CameraIntrinsics,
    depth::{depth_to_cloud_u16, DepthWindow},
    linalg::transform_points_inplace,
    parallel::ExecutionStrategy,
    transforms::vector6_to_transform,
};
use cicp_icp::{icp_point_to_plane, ICPConvergenceCriteria, ProjectiveScene};

fn bench_icp_point_to_plane(c: &mut Criterion) {
    let mut group = c.benchmark_group("icp_point_to_plane");
    group.sample_size(20);

    let (width, height) = (320, 240);
    let intrinsics = CameraIntrinsics::new(260.0, 260.0, 160.0, 120.0);
    let depth = (0..width * height)
        .map(|i| {
            let (u, v) = ((i % width) as f32, (i / width) as f32);
            (1200.0 + 80.0 * (u * 0.05).sin() * (v * 0.04).cos() + 0.5 * u) as u16
        })
        .collect::<Vec<_>>();

    let scene = ProjectiveScene::new(&depth, width, height, intrinsics, 0.05)
        .expect("valid depth image");
    let perturbation = vector6_to_transform(&[0.01, -0.01, 0.005, 0.01, 0.0, -0.01]);
    let criteria = ICPConvergenceCriteria {
        max_iteration: 10,
        relative_fitness: 0.0,
        relative_rmse: 0.0,
    };

    for stride in [2, 4] {
        let window = DepthWindow {
            stride,
            ..Default::default()
        };
        let mut cloud = depth_to_cloud_u16(
            &depth,
            width,
            height,
            &intrinsics.scaled(stride),
            &window,
            ExecutionStrategy::default(),
        )
        .expect("valid depth image");
        transform_points_inplace(&mut cloud, &perturbation, ExecutionStrategy::default())
            .expect("global thread pool");

        for (name, strategy) in [
            ("serial", ExecutionStrategy::Serial),
            ("parallel", ExecutionStrategy::ParallelElements),
        ] {
            group.bench_with_input(BenchmarkId::new(name, cloud.len()), &cloud, |b, cloud| {
                b.iter(|| {
                    let mut source = cloud.clone();
                    black_box(icp_point_to_plane(&mut source, &scene, &criteria, strategy))
                })
            });
        }
    }
    group.finish();
}

criterion_group!(benches, bench_icp_point_to_plane);
criterion_main!(benches);
