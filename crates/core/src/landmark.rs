// SPDX-License-Identifier: MIT

//! A single frame of body/hand landmarks as received from the client.
//!
//! Each field is either absent (not detected this frame) or a fixed-length
//! list of 3D points; the preprocessor is responsible for substituting zeros
//! where a field is absent.

use serde::{Deserialize, Serialize};

/// Serde bridging for `Option<PoseLandmarks>`: the array has 33 elements,
/// beyond serde's built-in array impls, so we delegate to `BigArray` via a
/// thin wrapper (BigArray itself only supports bare arrays, not `Option<_>`).
mod serde_with_pose {
    use super::{PoseLandmarks, Point3};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use serde_big_array::BigArray;

    #[derive(Serialize)]
    struct SerWrapper(#[serde(with = "BigArray")] [Point3; 33]);

    #[derive(Deserialize)]
    struct DeWrapper(#[serde(with = "BigArray")] [Point3; 33]);

    pub fn serialize<S>(value: &Option<PoseLandmarks>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (*value).map(SerWrapper).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<PoseLandmarks>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<DeWrapper>::deserialize(deserializer)?.map(|w| w.0))
    }
}

/// One 3D point. Serializes as a JSON array `[x, y, z]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point3(pub f32, pub f32, pub f32);

impl Point3 {
    pub const ZERO: Point3 = Point3(0.0, 0.0, 0.0);

    pub fn x(&self) -> f32 {
        self.0
    }

    pub fn y(&self) -> f32 {
        self.1
    }

    pub fn z(&self) -> f32 {
        self.2
    }
}

/// The 33-point body pose landmark set (MediaPipe pose topology).
pub type PoseLandmarks = [Point3; 33];

/// A 21-point hand landmark set.
pub type HandLandmarks = [Point3; 21];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandmarkFrame {
    #[serde(default, with = "serde_with_pose")]
    pub pose: Option<PoseLandmarks>,
    #[serde(default)]
    pub left_hand: Option<HandLandmarks>,
    #[serde(default)]
    pub right_hand: Option<HandLandmarks>,
}

impl LandmarkFrame {
    pub fn empty() -> Self {
        Self { pose: None, left_hand: None, right_hand: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_serializes_as_array() {
        let p = Point3(1.0, 2.0, 3.0);
        let json = serde_json::to_string(&p).expect("serializes");
        assert_eq!(json, "[1.0,2.0,3.0]");
    }

    #[test]
    fn frame_round_trips_through_json_with_nulls() {
        let frame = LandmarkFrame::empty();
        let json = serde_json::to_string(&frame).expect("serializes");
        let back: LandmarkFrame = serde_json::from_str(&json).expect("deserializes");
        assert_eq!(frame, back);
    }

    #[test]
    fn frame_deserializes_full_pose() {
        let pose = vec![[0.1_f32, 0.2, 0.3]; 33];
        let json = serde_json::json!({
            "pose": pose,
            "left_hand": null,
            "right_hand": null,
        });
        let frame: LandmarkFrame = serde_json::from_value(json).expect("deserializes");
        assert!(frame.pose.is_some());
        assert!(frame.left_hand.is_none());
    }

    use proptest::prop_assert_eq;

    proptest::proptest! {
        #[test]
        fn point_round_trips_through_json_for_any_coordinates(x: f32, y: f32, z: f32) {
            // NaN never round-trips through serde_json's float handling, and
            // isn't a value the preprocessor can produce from real landmarks.
            if x.is_nan() || y.is_nan() || z.is_nan() {
                return Ok(());
            }
            let p = Point3(x, y, z);
            let json = serde_json::to_string(&p).unwrap();
            let back: Point3 = serde_json::from_str(&json).unwrap();
            prop_assert_eq!(p, back);
        }
    }
}
