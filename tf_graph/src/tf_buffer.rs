use std::sync::RwLock;

use chrono::TimeDelta;
use log::error;

use tf_graph_core::geometry_msgs::TransformStamped;
use tf_graph_core::tf2_msgs::TFMessage;
use tf_graph_core::Time;

use crate::tf_error::TfError;
use crate::tf_frame_graph::FrameGraph;
use crate::LookupTransform;

/// The process-wide shared handle over a [`FrameGraph`].
///
/// Producers call [`Self::set_transform`] under the write side of the lock,
/// consumers run lookups under the read side; id-table growth only happens
/// during ingest so it is always serialized with respect to walkers. All
/// results are returned by value, nothing borrowed from the graph escapes.
#[derive(Debug)]
pub struct TfBuffer {
    graph: RwLock<FrameGraph>,
}

impl Default for TfBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl TfBuffer {
    pub fn new() -> Self {
        Self::new_with_graph(FrameGraph::new())
    }

    pub fn new_with_duration(cache_time: TimeDelta) -> Self {
        Self::new_with_graph(FrameGraph::new_with_duration(cache_time))
    }

    pub fn new_with_graph(graph: FrameGraph) -> Self {
        TfBuffer {
            graph: RwLock::new(graph),
        }
    }

    pub fn set_max_extrapolation_distance(&self, distance: TimeDelta) {
        if let Ok(mut graph) = self.graph.write() {
            graph.set_max_extrapolation_distance(distance);
        }
    }

    /// Validate and ingest one stamped sample. Rejections are logged and
    /// returned as false, never raised; a poisoned lock also drops the
    /// sample.
    pub fn set_transform(&self, tfs: &TransformStamped, authority: &str) -> bool {
        match self.graph.write() {
            Ok(mut graph) => graph.set_transform(tfs, authority),
            Err(_) => {
                error!("transform graph lock poisoned, dropping sample from '{authority}'");
                false
            }
        }
    }

    /// Feed every transform of a message through [`Self::set_transform`] and
    /// report how many were accepted.
    pub fn handle_incoming_transforms(&self, tfm: TFMessage, authority: &str) -> usize {
        tfm.transforms
            .iter()
            .filter(|tfs| self.set_transform(tfs, authority))
            .count()
    }

    pub fn lookup_transform(
        &self,
        target: &str,
        source: &str,
        stamp: Option<Time>,
    ) -> Result<TransformStamped, TfError> {
        let graph = self.graph.read().map_err(|_| TfError::CouldNotAcquireLock)?;
        graph.lookup_transform(target, source, stamp)
    }

    pub fn lookup_transform_with_time_travel(
        &self,
        target: &str,
        target_time: Time,
        source: &str,
        source_time: Time,
        fixed_frame: &str,
    ) -> Result<TransformStamped, TfError> {
        let graph = self.graph.read().map_err(|_| TfError::CouldNotAcquireLock)?;
        graph.lookup_transform_with_time_travel(target, target_time, source, source_time, fixed_frame)
    }

    pub fn latest_common_time(&self, target: &str, source: &str) -> Result<Option<Time>, TfError> {
        let graph = self.graph.read().map_err(|_| TfError::CouldNotAcquireLock)?;
        graph.latest_common_time(target, source)
    }

    pub fn can_transform(
        &self,
        target: &str,
        source: &str,
        stamp: Option<Time>,
        error_msg: Option<&mut String>,
    ) -> bool {
        match self.graph.read() {
            Ok(graph) => graph.can_transform(target, source, stamp, error_msg),
            Err(_) => {
                if let Some(out) = error_msg {
                    *out = TfError::CouldNotAcquireLock.to_string();
                }
                false
            }
        }
    }

    pub fn can_transform_with_time_travel(
        &self,
        target: &str,
        target_time: Time,
        source: &str,
        source_time: Time,
        fixed_frame: &str,
        error_msg: Option<&mut String>,
    ) -> bool {
        match self.graph.read() {
            Ok(graph) => graph.can_transform_with_time_travel(
                target,
                target_time,
                source,
                source_time,
                fixed_frame,
                error_msg,
            ),
            Err(_) => {
                if let Some(out) = error_msg {
                    *out = TfError::CouldNotAcquireLock.to_string();
                }
                false
            }
        }
    }

    pub fn all_frames_as_string(&self) -> Result<String, TfError> {
        let graph = self.graph.read().map_err(|_| TfError::CouldNotAcquireLock)?;
        Ok(graph.all_frames_as_string())
    }

    pub fn authority(&self, frame: &str) -> Result<Option<String>, TfError> {
        let graph = self.graph.read().map_err(|_| TfError::CouldNotAcquireLock)?;
        Ok(graph.authority(frame).map(str::to_string))
    }

    pub fn rejected_samples(&self) -> u64 {
        self.graph
            .read()
            .map(|graph| graph.rejected_samples())
            .unwrap_or(0)
    }

    /// Empty every cache but keep id assignments.
    pub fn clear(&self) -> Result<(), TfError> {
        let mut graph = self.graph.write().map_err(|_| TfError::CouldNotAcquireLock)?;
        graph.clear();
        Ok(())
    }
}

impl LookupTransform for TfBuffer {
    fn lookup_transform(
        &self,
        target: &str,
        source: &str,
        stamp: Option<Time>,
    ) -> Result<TransformStamped, TfError> {
        TfBuffer::lookup_transform(self, target, source, stamp)
    }

    fn lookup_transform_with_time_travel(
        &self,
        target: &str,
        target_time: Time,
        source: &str,
        source_time: Time,
        fixed_frame: &str,
    ) -> Result<TransformStamped, TfError> {
        TfBuffer::lookup_transform_with_time_travel(
            self,
            target,
            target_time,
            source,
            source_time,
            fixed_frame,
        )
    }
}
