//! Core bookkeeping for a time-varying tree of rigid-body coordinate frames,
//! in the spirit of the [ROS tf library](http://wiki.ros.org/tf) but with no
//! transport attached: producers feed stamped parent->child transforms into a
//! [`TfBuffer`] and consumers look up interpolated frame-to-frame transforms
//! at arbitrary times.
//!
//! Example usage:
//!
//! ```
//! use tf_graph::{TfBuffer, tf_util};
//! use tf_graph_core::geometry_msgs::TransformStamped;
//!
//! let buffer = TfBuffer::new();
//!
//! let mut tfs = TransformStamped::default();
//! tfs.header.frame_id = "base_link".to_string();
//! tfs.header.stamp = tf_util::to_stamp(10, 0);
//! tfs.child_frame_id = "camera".to_string();
//! tfs.transform.translation.x = 0.5;
//! tfs.transform.rotation.w = 1.0;
//! assert!(buffer.set_transform(&tfs, "example"));
//!
//! let tf = buffer.lookup_transform("base_link", "camera", Some(tf_util::to_stamp(10, 0)));
//! println!("{tf:?}");
//! ```

use tf_graph_core::geometry_msgs::TransformStamped;

/// The lookup surface, implemented both by the bare [`FrameGraph`] and by the
/// lock-wrapped [`TfBuffer`].
pub trait LookupTransform {
    fn lookup_transform(
        &self,
        target: &str,
        source: &str,
        stamp: Option<Time>,
    ) -> Result<TransformStamped, tf_error::TfError>;

    fn lookup_transform_with_time_travel(
        &self,
        target: &str,
        target_time: Time,
        source: &str,
        source_time: Time,
        fixed_frame: &str,
    ) -> Result<TransformStamped, tf_error::TfError>;
}

mod tf_buffer;
mod tf_error;
mod tf_frame_graph;
mod tf_resolver;
mod tf_time_cache;
pub mod tf_util;

pub use tf_buffer::TfBuffer;
pub use tf_error::TfError;
pub use tf_frame_graph::{FrameGraph, NO_PARENT};
pub use tf_resolver::MAX_GRAPH_DEPTH;
pub use tf_time_cache::{QueryMode, TimeCache, TransformStorage};

pub use tf_graph_core::{geometry_msgs, std_msgs, tf2_msgs, transforms, Time};
