use na::geometry::{Isometry3, Translation3, UnitQuaternion};
use nalgebra as na;

use crate::geometry_msgs::{Quaternion, Transform, TransformStamped, Vector3};
use crate::std_msgs::Header;
use crate::Time;

pub fn isometry_from_transform(tf: &Transform) -> Isometry3<f64> {
    let trans = Translation3::new(tf.translation.x, tf.translation.y, tf.translation.z);
    let rot = UnitQuaternion::new_normalize(na::geometry::Quaternion::new(
        tf.rotation.w,
        tf.rotation.x,
        tf.rotation.y,
        tf.rotation.z,
    ));

    Isometry3::from_parts(trans, rot)
}

pub fn isometry_to_transform(iso: Isometry3<f64>) -> Transform {
    Transform {
        translation: Vector3 {
            x: iso.translation.x,
            y: iso.translation.y,
            z: iso.translation.z,
        },
        rotation: Quaternion {
            x: iso.rotation.i,
            y: iso.rotation.j,
            z: iso.rotation.k,
            w: iso.rotation.w,
        },
    }
}

pub fn get_inverse(tfs: &TransformStamped) -> TransformStamped {
    TransformStamped {
        header: Header {
            seq: 1,
            stamp: tfs.header.stamp,
            frame_id: tfs.child_frame_id.clone(),
        },
        child_frame_id: tfs.header.frame_id.clone(),
        transform: isometry_to_transform(isometry_from_transform(&tfs.transform).inverse()),
    }
}

/// Chain multiple transforms together, leftmost applied last. The slice
/// should be in order of desired transformations.
pub fn chain_transforms(transforms: &[Transform]) -> Transform {
    let mut final_transform = Isometry3::identity();
    for t in transforms {
        final_transform *= isometry_from_transform(t);
    }
    isometry_to_transform(final_transform)
}

/// Interpolate between two transforms; `alpha` is 0 at `t1` and 1 at `t2`.
/// Translation is linear, rotation takes the shortest arc and the result is
/// renormalized.
pub fn interpolate(t1: Transform, t2: Transform, alpha: f64) -> Transform {
    let translation = Vector3 {
        x: t1.translation.x * (1.0 - alpha) + t2.translation.x * alpha,
        y: t1.translation.y * (1.0 - alpha) + t2.translation.y * alpha,
        z: t1.translation.z * (1.0 - alpha) + t2.translation.z * alpha,
    };
    let r1 = UnitQuaternion::new_normalize(na::geometry::Quaternion::new(
        t1.rotation.w,
        t1.rotation.x,
        t1.rotation.y,
        t1.rotation.z,
    ));
    let mut r2 = UnitQuaternion::new_normalize(na::geometry::Quaternion::new(
        t2.rotation.w,
        t2.rotation.x,
        t2.rotation.y,
        t2.rotation.z,
    ));
    // same rotation, opposite sign covers: flip so the slerp stays on the
    // shorter arc
    if r1.coords.dot(&r2.coords) < 0.0 {
        r2 = UnitQuaternion::new_normalize(-r2.into_inner());
    }
    let rotation = match r1.try_slerp(&r2, alpha, 1e-9) {
        Some(q) => Quaternion {
            x: q.i,
            y: q.j,
            z: q.k,
            w: q.w,
        },
        None => {
            // antipodal pair, fall back to the nearer endpoint
            let q = if alpha < 0.5 { r1 } else { r2 };
            Quaternion {
                x: q.i,
                y: q.j,
                z: q.k,
                w: q.w,
            }
        }
    };
    Transform {
        translation,
        rotation,
    }
}

pub fn to_transform_stamped(
    tf: Transform,
    frame_id: String,
    child_frame_id: String,
    stamp: Time,
) -> TransformStamped {
    TransformStamped {
        header: Header {
            seq: 1,
            stamp,
            frame_id,
        },
        child_frame_id,
        transform: tf,
    }
}
