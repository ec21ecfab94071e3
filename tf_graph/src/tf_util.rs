use chrono::TimeDelta;
use serde_derive::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::SystemTime;

use tf_graph_core::{geometry_msgs, tf2_msgs, Time};

pub fn to_stamp(secs: u32, nsecs: u32) -> Time {
    Time { secs, nsecs }
}

pub fn duration_now() -> TimeDelta {
    let elapsed = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap();
    TimeDelta::new(elapsed.as_secs() as i64, elapsed.subsec_nanos()).unwrap()
}

pub fn duration_to_stamp(time: TimeDelta) -> Time {
    to_stamp(time.num_seconds() as u32, time.subsec_nanos() as u32)
}

pub fn f64_to_stamp(seconds: f64) -> Time {
    let secs = seconds as u32;
    let nsecs = ((seconds - secs as f64) * 1e9) as u32;
    to_stamp(secs, nsecs)
}

pub fn stamp_now() -> Time {
    duration_to_stamp(duration_now())
}

pub fn stamp_to_duration(stamp: &Time) -> TimeDelta {
    // a manually created stamp could carry nsecs > 1e9, which TimeDelta
    // refuses, so carry the excess into the seconds
    let mut secs = stamp.secs;
    let mut nsecs = stamp.nsecs;
    let nsecs_per_sec = 1e9 as u32;
    secs += nsecs / nsecs_per_sec;
    nsecs %= nsecs_per_sec;
    TimeDelta::new(secs.into(), nsecs).unwrap_or_else(|| panic!("secs: {secs} nsecs: {nsecs}"))
}

pub fn duration_to_f64(time: TimeDelta) -> f64 {
    time.num_seconds() as f64 + (time.subsec_nanos() as f64 / 1e9)
}

pub fn stamp_to_f64(stamp: &Time) -> f64 {
    stamp.secs as f64 + (stamp.nsecs as f64) / 1e9
}

pub fn quat_msg_to_rpy(quat_msg: geometry_msgs::Quaternion) -> (f64, f64, f64) {
    let quat = nalgebra::UnitQuaternion::new_normalize(nalgebra::geometry::Quaternion::new(
        quat_msg.w, quat_msg.x, quat_msg.y, quat_msg.z,
    ));
    let (roll, pitch, yaw) = quat.euler_angles();
    (roll, pitch, yaw)
}

pub fn rpy_to_quat_msg(roll: f64, pitch: f64, yaw: f64) -> geometry_msgs::Quaternion {
    let unit_quat = nalgebra::UnitQuaternion::from_euler_angles(roll, pitch, yaw);
    let quat = unit_quat.quaternion();
    geometry_msgs::Quaternion {
        x: quat.coords[0],
        y: quat.coords[1],
        z: quat.coords[2],
        w: quat.coords[3],
    }
}

/// One row of a `[[tf]]` table, for loading static transforms from a toml
#[derive(Deserialize, Serialize, Debug)]
struct TransformRaw {
    frame: String,
    child_frame: String,
    x: Option<f64>,
    y: Option<f64>,
    z: Option<f64>,
    roll: Option<f64>,
    pitch: Option<f64>,
    yaw: Option<f64>,
}

impl TransformRaw {
    fn from_transform_stamped(tfs: geometry_msgs::TransformStamped) -> Self {
        let (roll, pitch, yaw) = quat_msg_to_rpy(tfs.transform.rotation);

        let tr = tfs.transform.translation;
        let (x, y, z) = (tr.x, tr.y, tr.z);

        Self {
            frame: tfs.header.frame_id,
            child_frame: tfs.child_frame_id,
            x: Some(x),
            y: Some(y),
            z: Some(z),
            roll: Some(roll),
            pitch: Some(pitch),
            yaw: Some(yaw),
        }
    }
}

pub fn transforms_to_toml(tfm: tf2_msgs::TFMessage) -> Result<String, anyhow::Error> {
    let mut tf_vec = Vec::new();
    for tfs in tfm.transforms {
        tf_vec.push(TransformRaw::from_transform_stamped(tfs));
    }

    let mut tf_data = HashMap::new();
    tf_data.insert("tf", tf_vec);

    Ok(toml::to_string(&tf_data)?)
}

/// Load a `[[tf]]` table of static transforms. The stamps are left at zero,
/// the caller stamps them before feeding the message to a buffer.
pub fn get_transforms_from_toml(filename: &str) -> Result<tf2_msgs::TFMessage, anyhow::Error> {
    let contents = std::fs::read_to_string(filename)?;
    let tf_data: HashMap<String, Vec<TransformRaw>> = toml::from_str(&contents)?;

    let mut tfm = tf2_msgs::TFMessage::default();
    for tfr in tf_data.get("tf").ok_or(anyhow::anyhow!("no tfs"))? {
        let mut transform = geometry_msgs::TransformStamped::default();
        transform.header.frame_id = tfr.frame.clone();
        transform.child_frame_id = tfr.child_frame.clone();
        transform.transform.rotation.w = 1.0;

        if let Some(x) = tfr.x {
            transform.transform.translation.x = x;
        }
        if let Some(y) = tfr.y {
            transform.transform.translation.y = y;
        }
        if let Some(z) = tfr.z {
            transform.transform.translation.z = z;
        }

        let roll = tfr.roll.unwrap_or(0.0);
        let pitch = tfr.pitch.unwrap_or(0.0);
        let yaw = tfr.yaw.unwrap_or(0.0);

        transform.transform.rotation = rpy_to_quat_msg(roll, pitch, yaw);

        tfm.transforms.push(transform);
    }

    Ok(tfm)
}

#[cfg(test)]
mod test {
    use super::*;
    use tf_graph_core::geometry_msgs::{Transform, TransformStamped, Vector3};
    use tf_graph_core::std_msgs::Header;

    #[test]
    fn test_time_conversion() {
        let base_stamp = Time {
            secs: 1_002_003_000,
            nsecs: 0,
        };

        for i in 0..1000 {
            let offset = i as f64 * 0.1;
            // see if there's a panic within this
            let _stamp = f64_to_stamp(stamp_to_f64(&base_stamp) + offset);
        }
    }

    #[test]
    fn test_rpy_round_trip() {
        let (roll, pitch, yaw) = (0.1, -0.2, 1.5);
        let quat = rpy_to_quat_msg(roll, pitch, yaw);
        let (r, p, y) = quat_msg_to_rpy(quat);
        assert!((r - roll).abs() < 1e-9);
        assert!((p - pitch).abs() < 1e-9);
        assert!((y - yaw).abs() < 1e-9);
    }

    #[test]
    fn test_toml_round_trip() {
        let tfm = tf2_msgs::TFMessage {
            transforms: vec![TransformStamped {
                header: Header {
                    seq: 1,
                    stamp: Time::default(),
                    frame_id: "map".to_string(),
                },
                child_frame_id: "odom".to_string(),
                transform: Transform {
                    translation: Vector3 {
                        x: 1.0,
                        y: -0.7,
                        z: 3.0,
                    },
                    rotation: rpy_to_quat_msg(0.0, 0.0, 0.5),
                },
            }],
        };

        let text = transforms_to_toml(tfm).unwrap();
        let path = std::env::temp_dir().join("tf_graph_util_round_trip.toml");
        std::fs::write(&path, text).unwrap();

        let loaded = get_transforms_from_toml(path.to_str().unwrap()).unwrap();
        assert_eq!(loaded.transforms.len(), 1);
        let tfs = &loaded.transforms[0];
        assert_eq!(tfs.header.frame_id, "map");
        assert_eq!(tfs.child_frame_id, "odom");
        assert!((tfs.transform.translation.x - 1.0).abs() < 1e-9);
        assert!((tfs.transform.translation.y - -0.7).abs() < 1e-9);
        let (_, _, yaw) = quat_msg_to_rpy(tfs.transform.rotation);
        assert!((yaw - 0.5).abs() < 1e-9);
    }
}
