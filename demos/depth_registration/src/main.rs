use argh::FromArgs;

use cicp::c3d::{
    camera::CameraIntrinsics,
    depth::{depth_to_cloud_u16, DepthWindow},
    linalg::{transform_inverse, transform_points_inplace},
    parallel::ExecutionStrategy,
    transforms::{transform_to_vector6, vector6_to_transform},
};
use cicp::icp::{icp_point_to_plane, ICPConvergenceCriteria, ProjectiveScene};

#[derive(FromArgs)]
/// Register a perturbed depth cloud back onto its depth map with point-to-plane ICP
struct Args {
    /// the synthetic depth image width
    #[argh(option, default = "320")]
    width: usize,

    /// the synthetic depth image height
    #[argh(option, default = "240")]
    height: usize,

    /// the pixel stride used to downsample the source cloud
    #[argh(option, default = "2")]
    stride: usize,

    /// the rotation angle of the perturbation in radians
    #[argh(option, default = "0.02")]
    angle: f64,

    /// the maximum number of ICP iterations
    #[argh(option, default = "30")]
    max_iterations: usize,

    /// run the passes on the current thread only
    #[argh(switch)]
    serial: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: Args = argh::from_env();

    let intrinsics = CameraIntrinsics::new(
        0.8 * args.width as f32,
        0.8 * args.width as f32,
        args.width as f32 / 2.0,
        args.height as f32 / 2.0,
    );

    // a tilted wavy wall in front of the camera
    let depth = (0..args.width * args.height)
        .map(|i| {
            let (u, v) = ((i % args.width) as f32, (i / args.width) as f32);
            let z = 1500.0 + 0.8 * u - 0.5 * v + 90.0 * (u * 0.04).sin() * (v * 0.05).cos();
            z.max(0.0) as u16
        })
        .collect::<Vec<_>>();

    let strategy = if args.serial {
        ExecutionStrategy::Serial
    } else {
        ExecutionStrategy::ParallelElements
    };

    let scene = ProjectiveScene::new(&depth, args.width, args.height, intrinsics, 0.05)?;

    let window = DepthWindow {
        stride: args.stride,
        ..Default::default()
    };
    let mut cloud = depth_to_cloud_u16(
        &depth,
        args.width,
        args.height,
        &intrinsics.scaled(args.stride),
        &window,
        strategy,
    )?;
    println!("Source cloud: #{} points", cloud.len());

    let perturbation = vector6_to_transform(&[
        args.angle,
        -0.5 * args.angle,
        0.3 * args.angle,
        0.01,
        -0.005,
        0.01,
    ]);
    transform_points_inplace(&mut cloud, &perturbation, strategy)?;

    let criteria = ICPConvergenceCriteria {
        max_iteration: args.max_iterations,
        ..Default::default()
    };

    let now = std::time::Instant::now();
    let result = icp_point_to_plane(&mut cloud, &scene, &criteria, strategy)?;
    log::info!("registration took {:?}", now.elapsed());

    println!("ICP registration result: {}", serde_json::to_string_pretty(&result)?);
    println!(
        "expected update: {:?}",
        transform_to_vector6(&transform_inverse(&perturbation))
    );
    println!(
        "estimated update: {:?}",
        transform_to_vector6(&result.transformation)
    );

    Ok(())
}
