use std::collections::HashMap;

use chrono::TimeDelta;
use log::{error, warn};

use tf_graph_core::geometry_msgs::TransformStamped;

use crate::tf_error::TfError;
use crate::tf_time_cache::{TimeCache, TransformStorage};
use crate::tf_util::{stamp_to_duration, stamp_to_f64};

/// Reserved frame id meaning "no parent"; terminates upward walks.
pub const NO_PARENT: u32 = 0;

const DEFAULT_CACHE_DURATION_SECONDS: u16 = 10;

fn canonical_name(name: &str) -> &str {
    if name.is_empty() {
        "/"
    } else {
        name
    }
}

/// The registry of frames: name to dense-id interning, one [`TimeCache`] per
/// non-root frame, and the authority that produced each frame's most recent
/// accepted sample.
///
/// Ids are assigned monotonically on first mention and never reused; id 0 is
/// the `NO_PARENT` sentinel and never appears as a child. All mutation takes
/// `&mut self`; [`crate::TfBuffer`] wraps a graph in a lock for shared use.
#[derive(Clone, Debug)]
pub struct FrameGraph {
    frame_ids: HashMap<String, u32>,
    frame_names: Vec<String>,
    frames: Vec<Option<TimeCache>>,
    frame_authority: HashMap<u32, String>,
    cache_time: TimeDelta,
    max_extrapolation_distance: TimeDelta,
    rejected_samples: u64,
}

impl Default for FrameGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameGraph {
    pub fn new() -> Self {
        Self::new_with_duration(TimeDelta::new(DEFAULT_CACHE_DURATION_SECONDS.into(), 0).unwrap())
    }

    pub fn new_with_duration(cache_time: TimeDelta) -> Self {
        let mut frame_ids = HashMap::new();
        frame_ids.insert("NO_PARENT".to_string(), NO_PARENT);
        FrameGraph {
            frame_ids,
            frame_names: vec!["NO_PARENT".to_string()],
            frames: vec![None],
            frame_authority: HashMap::new(),
            cache_time,
            max_extrapolation_distance: TimeDelta::zero(),
            rejected_samples: 0,
        }
    }

    /// How far outside the bracketing samples a query may reach; zero
    /// disallows extrapolation entirely.
    pub fn set_max_extrapolation_distance(&mut self, distance: TimeDelta) {
        self.max_extrapolation_distance = distance;
    }

    pub(crate) fn max_extrapolation_distance(&self) -> TimeDelta {
        self.max_extrapolation_distance
    }

    /// Look up or assign the dense id for a frame name.
    pub fn intern(&mut self, name: &str) -> u32 {
        let name = canonical_name(name);
        if let Some(id) = self.frame_ids.get(name) {
            return *id;
        }
        let id = self.frames.len() as u32;
        self.frames.push(Some(TimeCache::new(self.cache_time)));
        self.frame_ids.insert(name.to_string(), id);
        self.frame_names.push(name.to_string());
        id
    }

    pub fn lookup_id(&self, name: &str) -> Result<u32, TfError> {
        self.frame_ids
            .get(canonical_name(name))
            .copied()
            .ok_or_else(|| {
                TfError::LookupError(format!("frame '{name}' does not exist in the tf tree"))
            })
    }

    pub fn lookup_name(&self, id: u32) -> Result<&str, TfError> {
        self.frame_names
            .get(id as usize)
            .map(String::as_str)
            .ok_or_else(|| TfError::LookupError(format!("reverse lookup of frame id {id} failed")))
    }

    pub(crate) fn name(&self, id: u32) -> &str {
        self.frame_names
            .get(id as usize)
            .map(String::as_str)
            .unwrap_or("NO_PARENT")
    }

    pub(crate) fn frame(&self, id: u32) -> Option<&TimeCache> {
        self.frames.get(id as usize)?.as_ref()
    }

    /// The authority that supplied the most recent accepted sample for a
    /// frame, if any sample was ever accepted.
    pub fn authority(&self, frame: &str) -> Option<&str> {
        let id = self.frame_ids.get(canonical_name(frame))?;
        self.frame_authority.get(id).map(String::as_str)
    }

    /// How many samples have been rejected by validation or the retention
    /// window since the graph was created.
    pub fn rejected_samples(&self) -> u64 {
        self.rejected_samples
    }

    /// Validate and ingest one stamped parent->child sample. Returns false
    /// (never an error) on rejection, logging a diagnostic that names the
    /// authority; producers stream too fast to handle per-sample failures.
    pub fn set_transform(&mut self, tfs: &TransformStamped, authority: &str) -> bool {
        let child = tfs.child_frame_id.as_str();
        let parent = tfs.header.frame_id.as_str();

        let mut error_exists = false;
        if child == parent {
            error!(
                "ignoring transform from authority '{authority}' with frame_id and child_frame_id both '{child}'"
            );
            error_exists = true;
        }
        if child.is_empty() || child == "/" {
            error!("ignoring transform from authority '{authority}' because child_frame_id is not set");
            error_exists = true;
        }
        if parent.is_empty() || parent == "/" {
            error!(
                "ignoring transform with child_frame_id '{child}' from authority '{authority}' because frame_id is not set"
            );
            error_exists = true;
        }
        let transform = &tfs.transform;
        if transform.translation.x.is_nan()
            || transform.translation.y.is_nan()
            || transform.translation.z.is_nan()
            || transform.rotation.x.is_nan()
            || transform.rotation.y.is_nan()
            || transform.rotation.z.is_nan()
            || transform.rotation.w.is_nan()
        {
            error!(
                "ignoring transform for child_frame_id '{child}' from authority '{authority}' because of a nan value in the transform ({} {} {}) ({} {} {} {})",
                transform.translation.x,
                transform.translation.y,
                transform.translation.z,
                transform.rotation.x,
                transform.rotation.y,
                transform.rotation.z,
                transform.rotation.w,
            );
            error_exists = true;
        }
        if error_exists {
            self.rejected_samples += 1;
            return false;
        }

        let parent_id = self.intern(parent);
        let child_id = self.intern(child);
        let storage = TransformStorage {
            stamp: stamp_to_duration(&tfs.header.stamp),
            translation: transform.translation,
            rotation: transform.rotation,
            parent_id,
        };

        let Some(cache) = self
            .frames
            .get_mut(child_id as usize)
            .and_then(Option::as_mut)
        else {
            return false;
        };
        if cache.insert(storage) {
            self.frame_authority.insert(child_id, authority.to_string());
            true
        } else {
            warn!(
                "ignoring data from the past for frame '{child}' at time {:.3} according to authority '{authority}'",
                stamp_to_f64(&tfs.header.stamp)
            );
            self.rejected_samples += 1;
            false
        }
    }

    /// Empty every cache but keep all id assignments and authorities.
    pub fn clear(&mut self) {
        for cache in self.frames.iter_mut().flatten() {
            cache.clear();
        }
    }

    /// Newline-delimited enumeration of every known frame and its most
    /// recently observed parent.
    pub fn all_frames_as_string(&self) -> String {
        let mut out = String::new();
        for id in 1..self.frames.len() {
            let parent_id = self.frames[id]
                .as_ref()
                .and_then(|cache| cache.query(None))
                .map(|(sample, _)| sample.parent_id)
                .unwrap_or(NO_PARENT);
            out.push_str(&format!(
                "Frame {} exists with parent {}.\n",
                self.frame_names[id],
                self.name(parent_id)
            ));
        }
        out
    }
}
