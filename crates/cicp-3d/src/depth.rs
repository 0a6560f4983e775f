use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::{
    camera::CameraIntrinsics,
    parallel::{self, ExecutionStrategy, ParallelError},
    Cicp3dError,
};

/// Number of mask slots scanned by a single task in the parallel exclusive scan.
const SCAN_CHUNK_SIZE: usize = 4096;

/// A depth sample stored in millimeters.
pub trait DepthSample: Copy + Send + Sync {
    /// Whether the sample holds a measurement, i.e. it is strictly positive.
    fn is_valid(self) -> bool;

    /// The depth in meters.
    fn to_meters(self) -> f32;
}

impl DepthSample for i32 {
    #[inline]
    fn is_valid(self) -> bool {
        self > 0
    }

    #[inline]
    fn to_meters(self) -> f32 {
        self as f32 / 1000.0
    }
}

impl DepthSample for u16 {
    #[inline]
    fn is_valid(self) -> bool {
        self > 0
    }

    #[inline]
    fn to_meters(self) -> f32 {
        self as f32 / 1000.0
    }
}

/// The sampling window of a depth image.
///
/// The depth buffer holds the cropped region itself; `tl_x` and `tl_y` locate
/// its top-left pixel in the full image and only shift the projected coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepthWindow {
    /// Sample every `stride` pixel in both directions.
    pub stride: usize,
    /// Column of the crop origin in the full image.
    pub tl_x: usize,
    /// Row of the crop origin in the full image.
    pub tl_y: usize,
}

impl Default for DepthWindow {
    fn default() -> Self {
        Self {
            stride: 1,
            tl_x: 0,
            tl_y: 0,
        }
    }
}

/// Replace every element by the sum of the elements strictly before it.
///
/// # Returns
///
/// The sum of all the input elements.
///
/// Example:
///
/// ```
/// use cicp_3d::depth::exclusive_scan_serial;
///
/// let mut mask = vec![1, 0, 1, 1, 0];
/// let total = exclusive_scan_serial(&mut mask);
/// assert_eq!(mask, vec![0, 1, 1, 2, 3]);
/// assert_eq!(total, 3);
/// ```
pub fn exclusive_scan_serial(data: &mut [u32]) -> u32 {
    let mut sum = 0u32;
    for v in data.iter_mut() {
        let count = *v;
        *v = sum;
        sum += count;
    }
    sum
}

/// Exclusive prefix sum executed with the given strategy.
///
/// The parallel version scans fixed size chunks independently, scans the chunk
/// totals and adds each chunk offset back. Its output is identical to
/// [`exclusive_scan_serial`].
pub fn exclusive_scan(data: &mut [u32], strategy: ExecutionStrategy) -> Result<u32, ParallelError> {
    if strategy == ExecutionStrategy::Serial {
        return Ok(exclusive_scan_serial(data));
    }

    let mut offsets = parallel::map_chunks_mut(strategy, data, SCAN_CHUNK_SIZE, |_, chunk| {
        exclusive_scan_serial(chunk)
    })?;
    let total = exclusive_scan_serial(&mut offsets);

    parallel::for_each_chunk_mut(strategy, data, SCAN_CHUNK_SIZE, |i, chunk| {
        let offset = offsets[i];
        if offset > 0 {
            chunk.iter_mut().for_each(|v| *v += offset);
        }
    })?;

    Ok(total)
}

/// Project a depth image into a compacted point cloud.
///
/// The strided grid has `width / stride` columns and `height / stride` rows. The
/// pixels are processed in three passes:
///
/// 1. a mask pass marking every grid pixel with a positive depth,
/// 2. an exclusive scan of the mask giving every valid pixel its output index,
/// 3. a scatter pass writing the camera space point of every valid pixel.
///
/// The mask is keyed by `x + y * width` using the full image width, so the
/// valid pixels of one grid row own a contiguous range of the output.
///
/// The points are `z = depth / 1000`, `x = (x + tl_x - cx) / fx * z` and
/// `y = (y + tl_y - cy) / fy * z` where `x` and `y` are grid coordinates.
///
/// # Arguments
///
/// * `depth` - The row-major depth samples in millimeters, at least `width * height` long.
/// * `width` - The image width.
/// * `height` - The image height.
/// * `intrinsics` - The camera intrinsics in grid coordinates.
/// * `window` - The stride and crop offset.
/// * `strategy` - The execution strategy of the three passes.
///
/// # Returns
///
/// One point per positive depth sample of the grid, in row-major grid order.
pub fn depth_to_cloud<T: DepthSample>(
    depth: &[T],
    width: usize,
    height: usize,
    intrinsics: &CameraIntrinsics,
    window: &DepthWindow,
    strategy: ExecutionStrategy,
) -> Result<Vec<Vec3>, Cicp3dError> {
    let stride = window.stride;
    if stride == 0 {
        return Err(Cicp3dError::InvalidStride);
    }
    if depth.len() < width * height {
        return Err(Cicp3dError::InvalidDepthSize(depth.len(), width, height));
    }

    let (cols, rows) = (width / stride, height / stride);
    if cols == 0 || rows == 0 {
        return Ok(Vec::new());
    }

    // mask pass, one grid row per task
    let mut mask = vec![0u32; rows * width];
    parallel::for_each_chunk_mut(strategy, &mut mask, width, |y, mask_row| {
        for (x, m) in mask_row.iter_mut().take(cols).enumerate() {
            *m = depth[x * stride + y * stride * width].is_valid() as u32;
        }
    })?;

    // scan to find map: depth idx --> cloud idx
    let mask_back = mask.last().copied().unwrap_or(0);
    let scanned = exclusive_scan(&mut mask, strategy)?;
    let total = (mask.last().copied().unwrap_or(0) + mask_back) as usize;
    debug_assert_eq!(total, scanned as usize);

    log::trace!(
        "depth_to_cloud: {}x{} grid, {} valid pixels",
        cols,
        rows,
        total
    );

    // split the output in the contiguous ranges owned by each grid row
    let mut cloud = vec![Vec3::ZERO; total];
    let mut cloud_rows: Vec<&mut [Vec3]> = Vec::with_capacity(rows);
    let mut rest = cloud.as_mut_slice();
    for y in 0..rows {
        let end = if y + 1 < rows {
            mask[(y + 1) * width] as usize
        } else {
            total
        };
        let len = end - mask[y * width] as usize;
        let (head, tail) = std::mem::take(&mut rest).split_at_mut(len);
        cloud_rows.push(head);
        rest = tail;
    }

    // scatter pass
    parallel::for_each_mut(strategy, &mut cloud_rows, |y, cloud_row| {
        let row_start = mask[y * width];
        for x in 0..cols {
            let sample = depth[x * stride + y * stride * width];
            if !sample.is_valid() {
                continue;
            }
            let idx = (mask[x + y * width] - row_start) as usize;
            cloud_row[idx] = intrinsics.backproject(
                (x + window.tl_x) as f32,
                (y + window.tl_y) as f32,
                sample.to_meters(),
            );
        }
    })?;

    Ok(cloud)
}

/// Project a signed 32 bit depth image in millimeters. See [`depth_to_cloud`].
pub fn depth_to_cloud_i32(
    depth: &[i32],
    width: usize,
    height: usize,
    intrinsics: &CameraIntrinsics,
    window: &DepthWindow,
    strategy: ExecutionStrategy,
) -> Result<Vec<Vec3>, Cicp3dError> {
    depth_to_cloud(depth, width, height, intrinsics, window, strategy)
}

/// Project an unsigned 16 bit depth image in millimeters. See [`depth_to_cloud`].
pub fn depth_to_cloud_u16(
    depth: &[u16],
    width: usize,
    height: usize,
    intrinsics: &CameraIntrinsics,
    window: &DepthWindow,
    strategy: ExecutionStrategy,
) -> Result<Vec<Vec3>, Cicp3dError> {
    depth_to_cloud(depth, width, height, intrinsics, window, strategy)
}
