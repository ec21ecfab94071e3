//! Message-style value types and rigid-body transform math shared by the
//! tf_graph crates. The type names follow the ROS message definitions they
//! originated from so that code written against `geometry_msgs` and
//! `tf2_msgs` reads the same here, but nothing in this crate talks to a
//! transport.

use serde_derive::{Deserialize, Serialize};

pub mod geometry_msgs;
pub mod std_msgs;
pub mod tf2_msgs;
pub mod transforms;

/// A stamp in seconds and nanoseconds since the epoch.
///
/// The all-zero stamp doubles as the "default time" sentinel meaning "the
/// latest available data" in lookups.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Time {
    pub secs: u32,
    pub nsecs: u32,
}
