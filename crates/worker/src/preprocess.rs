// SPDX-License-Identifier: MIT

//! Converts a window of raw landmark frames into the fixed-shape feature
//! tensor the classifier expects: shoulder-frame normalization, flattening,
//! time resampling, then augmentation with velocity and acceleration.

use ndarray::{s, Array1, Array2, Axis};
use signrt_core::{LandmarkFrame, Point3};

const POSE_POINTS: usize = 33;
const HAND_POINTS: usize = 21;
const FRAME_VECTOR_LEN: usize = (POSE_POINTS + 2 * HAND_POINTS) * 3; // 225
const LEFT_SHOULDER_INDEX: usize = 11;
const RIGHT_SHOULDER_INDEX: usize = 12;

/// Converts a window of frames into a `(sequence_length, feature_dim)` tensor,
/// where `feature_dim == 3 * 225` once velocity and acceleration are appended.
pub fn preprocess(frames: &[LandmarkFrame], sequence_length: usize) -> Array2<f32> {
    let feature_dim = FRAME_VECTOR_LEN * 3;
    if frames.is_empty() {
        return Array2::zeros((sequence_length, feature_dim));
    }

    let flattened: Vec<Array1<f32>> = frames.iter().map(flatten_frame).collect();
    let position = resample_time_axis(&flattened, sequence_length);
    augment_with_dynamics(&position)
}

/// Shoulder-frame-normalize and flatten one frame into a length-225 vector.
fn flatten_frame(frame: &LandmarkFrame) -> Array1<f32> {
    let (center, scale) = shoulder_frame(frame);

    let mut out = Vec::with_capacity(FRAME_VECTOR_LEN);
    push_points(&mut out, frame.pose.as_ref().map(|p| p.as_slice()), POSE_POINTS, center, scale);
    push_points(&mut out, frame.left_hand.as_ref().map(|p| p.as_slice()), HAND_POINTS, center, scale);
    push_points(&mut out, frame.right_hand.as_ref().map(|p| p.as_slice()), HAND_POINTS, center, scale);
    Array1::from_vec(out)
}

/// Computes the shoulder center and scale for a frame. Frames with no pose
/// pass through with an identity transform (center at origin, scale 1).
fn shoulder_frame(frame: &LandmarkFrame) -> (Point3, f32) {
    let Some(pose) = frame.pose.as_ref() else {
        return (Point3::ZERO, 1.0);
    };
    let left = pose[LEFT_SHOULDER_INDEX];
    let right = pose[RIGHT_SHOULDER_INDEX];
    let center = Point3((left.x() + right.x()) / 2.0, (left.y() + right.y()) / 2.0, (left.z() + right.z()) / 2.0);
    let scale = (right.x() - left.x()).abs();
    let scale = if scale == 0.0 { 1.0 } else { scale };
    (center, scale)
}

fn push_points(out: &mut Vec<f32>, points: Option<&[Point3]>, expected: usize, center: Point3, scale: f32) {
    match points {
        Some(points) => {
            for p in points {
                out.push((p.x() - center.x()) / scale);
                out.push((p.y() - center.y()) / scale);
                out.push((p.z() - center.z()) / scale);
            }
        }
        None => out.extend(std::iter::repeat(0.0).take(expected * 3)),
    }
}

/// Linearly resamples each feature column onto `target_length` evenly spaced
/// points along the time axis. A no-op when the lengths already match.
fn resample_time_axis(frames: &[Array1<f32>], target_length: usize) -> Array2<f32> {
    let source_length = frames.len();
    let feature_dim = frames[0].len();

    if source_length == target_length {
        let mut out = Array2::zeros((target_length, feature_dim));
        for (i, frame) in frames.iter().enumerate() {
            out.row_mut(i).assign(frame);
        }
        return out;
    }

    let mut out = Array2::zeros((target_length, feature_dim));
    if target_length == 0 {
        return out;
    }
    if source_length == 1 {
        for i in 0..target_length {
            out.row_mut(i).assign(&frames[0]);
        }
        return out;
    }

    let x_old: Vec<f32> = (0..source_length).map(|i| i as f32 / (source_length - 1) as f32).collect();
    let x_new: Vec<f32> = if target_length == 1 {
        vec![0.0]
    } else {
        (0..target_length).map(|i| i as f32 / (target_length - 1) as f32).collect()
    };

    for feature in 0..feature_dim {
        let column: Vec<f32> = frames.iter().map(|f| f[feature]).collect();
        for (i, &xn) in x_new.iter().enumerate() {
            out[[i, feature]] = linear_interp(&x_old, &column, xn);
        }
    }
    out
}

/// `numpy.interp`-equivalent: piecewise-linear interpolation, clamped at the
/// domain edges.
fn linear_interp(xs: &[f32], ys: &[f32], x: f32) -> f32 {
    if x <= xs[0] {
        return ys[0];
    }
    if x >= xs[xs.len() - 1] {
        return ys[ys.len() - 1];
    }
    let idx = xs.partition_point(|&v| v <= x);
    let (x0, x1) = (xs[idx - 1], xs[idx]);
    let (y0, y1) = (ys[idx - 1], ys[idx]);
    let t = (x - x0) / (x1 - x0);
    y0 + t * (y1 - y0)
}

/// First- and second-difference the position sequence along the time axis,
/// prepending the first row so lengths are preserved, then concatenates
/// `[position | velocity | acceleration]` along the feature axis.
fn augment_with_dynamics(position: &Array2<f32>) -> Array2<f32> {
    let velocity = diff_prepend_first(position);
    let acceleration = diff_prepend_first(&velocity);

    let (rows, cols) = position.dim();
    let mut out = Array2::zeros((rows, cols * 3));
    out.slice_mut(s![.., 0..cols]).assign(position);
    out.slice_mut(s![.., cols..2 * cols]).assign(&velocity);
    out.slice_mut(s![.., 2 * cols..3 * cols]).assign(&acceleration);
    out
}

fn diff_prepend_first(sequence: &Array2<f32>) -> Array2<f32> {
    let rows = sequence.len_of(Axis(0));
    if rows <= 1 {
        return Array2::zeros(sequence.dim());
    }
    let mut out = Array2::zeros(sequence.dim());
    out.row_mut(0).fill(0.0);
    for i in 1..rows {
        let diff = &sequence.row(i) - &sequence.row(i - 1);
        out.row_mut(i).assign(&diff);
    }
    out
}

#[cfg(test)]
#[path = "preprocess_tests.rs"]
mod tests;
