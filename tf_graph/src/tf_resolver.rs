use chrono::TimeDelta;
use nalgebra::Isometry3;

use tf_graph_core::geometry_msgs::{Transform, TransformStamped};
use tf_graph_core::transforms::{
    chain_transforms, isometry_from_transform, isometry_to_transform, to_transform_stamped,
};
use tf_graph_core::Time;

use crate::tf_error::TfError;
use crate::tf_frame_graph::{FrameGraph, NO_PARENT};
use crate::tf_time_cache::{QueryMode, TransformStorage};
use crate::tf_util::{duration_to_f64, duration_to_stamp, stamp_to_duration};
use crate::LookupTransform;

/// Walks deeper than this are assumed to have hit a loop in the tree.
pub const MAX_GRAPH_DEPTH: u32 = 1000;

/// One edge sample collected during an upward walk.
struct ChainLink {
    child_id: u32,
    storage: TransformStorage,
    mode: QueryMode,
}

/// The two upward walks of a lookup: `inverse` climbs from the source frame,
/// `forward` from the target frame. After the shared tail is cancelled the
/// remaining links describe the minimal path through the common ancestor.
#[derive(Default)]
struct TransformChain {
    inverse: Vec<ChainLink>,
    forward: Vec<ChainLink>,
}

fn compute_transform_from_chain(chain: &TransformChain) -> Isometry3<f64> {
    let mut out = Isometry3::identity();
    // source-side transforms compose directly, walked top-down
    for link in chain.inverse.iter().rev() {
        out *= isometry_from_transform(&link.storage.transform());
    }
    // target-side transforms were collected walking the wrong way, so each
    // one is inverted and left-multiplied
    for link in chain.forward.iter().rev() {
        out = isometry_from_transform(&link.storage.transform()).inverse() * out;
    }
    out
}

impl FrameGraph {
    /// Climb parent pointers from `start`, interpolating each edge at `time`
    /// (`None` means "newest"), until the root sentinel or a frame with no
    /// data. Returns the frame the walk terminated on.
    fn walk_to_top(
        &self,
        start: u32,
        time: Option<TimeDelta>,
        links: &mut Vec<ChainLink>,
    ) -> Result<u32, TfError> {
        let mut frame = start;
        let mut depth = 0u32;
        loop {
            if frame == NO_PARENT {
                return Ok(frame);
            }
            let Some(cache) = self.frame(frame) else {
                return Ok(frame);
            };
            let Some((storage, mode)) = cache.query(time) else {
                return Ok(frame);
            };
            links.push(ChainLink {
                child_id: frame,
                storage,
                mode,
            });
            frame = storage.parent_id;

            depth += 1;
            if depth > MAX_GRAPH_DEPTH {
                return Err(TfError::LookupError(format!(
                    "the tf tree is invalid because it contains a loop:\n{}",
                    self.all_frames_as_string()
                )));
            }
        }
    }

    /// Run both walks and match them up: they must terminate on the same
    /// frame, and any shared tail of the two chains contributes identity and
    /// is cancelled.
    fn lookup_lists(
        &self,
        target_id: u32,
        source_id: u32,
        time: Option<TimeDelta>,
    ) -> Result<TransformChain, TfError> {
        let mut chain = TransformChain::default();
        let last_inverse = self.walk_to_top(source_id, time, &mut chain.inverse)?;
        let last_forward = self.walk_to_top(target_id, time, &mut chain.forward)?;

        let connectivity_error = || {
            TfError::ConnectivityError(format!(
                "could not find a connection between '{}' and '{}' because they are not part of the same tree; tf has two or more unconnected trees",
                self.name(target_id),
                self.name(source_id),
            ))
        };

        if chain.inverse.is_empty() {
            // the source walk went nowhere, so the target walk must have
            // descended exactly onto the source frame
            if chain.forward.is_empty() || last_forward != source_id {
                return Err(connectivity_error());
            }
            return Ok(chain);
        }
        if chain.forward.is_empty() {
            let top_parent = chain.inverse.last().map(|link| link.storage.parent_id);
            if top_parent != Some(target_id) {
                return Err(connectivity_error());
            }
            return Ok(chain);
        }
        if last_forward != last_inverse {
            return Err(connectivity_error());
        }

        // cancel the shared tail; an edge walked by both sides contributes
        // identity to the composition
        while let (Some(inverse_top), Some(forward_top)) =
            (chain.inverse.last(), chain.forward.last())
        {
            if inverse_top.child_id != forward_top.child_id {
                break;
            }
            chain.inverse.pop();
            chain.forward.pop();
        }
        Ok(chain)
    }

    /// Check every retained sample against the extrapolation bound. Returns a
    /// description of the first violation.
    fn test_extrapolation(&self, time: TimeDelta, chain: &TransformChain) -> Option<String> {
        let max_distance = self.max_extrapolation_distance();
        for link in chain.inverse.iter().chain(chain.forward.iter()) {
            let stamp = link.storage.stamp;
            match link.mode {
                QueryMode::Interpolated => {}
                QueryMode::OneValue => {
                    if stamp - time > max_distance || time - stamp > max_distance {
                        return Some(format!(
                            "you requested a transform at time {:.3}, but the buffer for frame '{}' only contains a single transform at time {:.3}",
                            duration_to_f64(time),
                            self.name(link.child_id),
                            duration_to_f64(stamp),
                        ));
                    }
                }
                QueryMode::ExtrapolateBack => {
                    if stamp - time > max_distance {
                        return Some(format!(
                            "extrapolating into the past, you requested a transform at time {:.3} but the buffer for frame '{}' only has a history back to {:.3}",
                            duration_to_f64(time),
                            self.name(link.child_id),
                            duration_to_f64(stamp),
                        ));
                    }
                }
                QueryMode::ExtrapolateForward => {
                    if time - stamp > max_distance {
                        return Some(format!(
                            "extrapolating into the future, you requested a transform at time {:.3} but the most recent transform for frame '{}' is at {:.3}",
                            duration_to_f64(time),
                            self.name(link.child_id),
                            duration_to_f64(stamp),
                        ));
                    }
                }
            }
        }
        None
    }

    pub(crate) fn latest_common_time_delta(
        &self,
        target: &str,
        source: &str,
    ) -> Result<Option<TimeDelta>, TfError> {
        let target_id = self.lookup_id(target)?;
        let source_id = self.lookup_id(source)?;
        if target_id == source_id {
            return Ok(None);
        }
        let chain = self.lookup_lists(target_id, source_id, None)?;
        let mut time: Option<TimeDelta> = None;
        for link in chain.inverse.iter().chain(chain.forward.iter()) {
            let stamp = link.storage.stamp;
            time = Some(match time {
                None => stamp,
                Some(time) => std::cmp::min(time, stamp),
            });
        }
        Ok(time)
    }

    /// The newest timestamp at which every edge between the two frames has
    /// data. `None` means the frames are identical and any time works.
    pub fn latest_common_time(&self, target: &str, source: &str) -> Result<Option<Time>, TfError> {
        Ok(self
            .latest_common_time_delta(target, source)?
            .map(duration_to_stamp))
    }

    /// Look up the transform that maps poses in `source` into `target` at
    /// `stamp`. `None` (or the zero stamp) asks for the latest common time.
    pub fn lookup_transform(
        &self,
        target: &str,
        source: &str,
        stamp: Option<Time>,
    ) -> Result<TransformStamped, TfError> {
        // short circuit the zero length transform to allow lookups on frames
        // that were never published
        if target == source {
            return Ok(to_transform_stamped(
                Transform::identity(),
                target.to_string(),
                source.to_string(),
                stamp.unwrap_or_default(),
            ));
        }

        let requested = stamp
            .map(|stamp| stamp_to_duration(&stamp))
            .filter(|time| !time.is_zero());
        let time = match requested {
            Some(time) => Some(time),
            None => self.latest_common_time_delta(target, source)?,
        };

        let target_id = self.lookup_id(target)?;
        let source_id = self.lookup_id(source)?;
        let chain = self.lookup_lists(target_id, source_id, time)?;

        if let Some(time) = time {
            if let Some(violation) = self.test_extrapolation(time, &chain) {
                if requested.is_none() {
                    // one of the edges is out of date, the latest common time
                    // is not usable
                    return Err(TfError::ConnectivityError(format!(
                        "could not find a common time between '{source}' and '{target}'"
                    )));
                }
                return Err(TfError::ExtrapolationError(format!(
                    "{violation}, when trying to transform between '{source}' and '{target}'"
                )));
            }
        }

        let output = compute_transform_from_chain(&chain);
        Ok(to_transform_stamped(
            isometry_to_transform(output),
            target.to_string(),
            source.to_string(),
            time.map(duration_to_stamp).unwrap_or_default(),
        ))
    }

    /// Look up a transform between two frames observed at two different
    /// times, travelling through `fixed_frame`.
    pub fn lookup_transform_with_time_travel(
        &self,
        target: &str,
        target_time: Time,
        source: &str,
        source_time: Time,
        fixed_frame: &str,
    ) -> Result<TransformStamped, TfError> {
        let tf1 = self.lookup_transform(fixed_frame, source, Some(source_time))?;
        let tf2 = self.lookup_transform(target, fixed_frame, Some(target_time))?;
        let transform = chain_transforms(&[tf2.transform, tf1.transform]);
        Ok(to_transform_stamped(
            transform,
            target.to_string(),
            source.to_string(),
            tf2.header.stamp,
        ))
    }

    /// Non-throwing probe for [`Self::lookup_transform`]; the failure
    /// description is written to `error_msg` when one is supplied.
    pub fn can_transform(
        &self,
        target: &str,
        source: &str,
        stamp: Option<Time>,
        error_msg: Option<&mut String>,
    ) -> bool {
        match self.lookup_transform(target, source, stamp) {
            Ok(_) => true,
            Err(err) => {
                if let Some(out) = error_msg {
                    *out = err.to_string();
                }
                false
            }
        }
    }

    /// Non-throwing probe for [`Self::lookup_transform_with_time_travel`].
    pub fn can_transform_with_time_travel(
        &self,
        target: &str,
        target_time: Time,
        source: &str,
        source_time: Time,
        fixed_frame: &str,
        error_msg: Option<&mut String>,
    ) -> bool {
        match self.lookup_transform_with_time_travel(
            target,
            target_time,
            source,
            source_time,
            fixed_frame,
        ) {
            Ok(_) => true,
            Err(err) => {
                if let Some(out) = error_msg {
                    *out = err.to_string();
                }
                false
            }
        }
    }
}

impl LookupTransform for FrameGraph {
    fn lookup_transform(
        &self,
        target: &str,
        source: &str,
        stamp: Option<Time>,
    ) -> Result<TransformStamped, TfError> {
        FrameGraph::lookup_transform(self, target, source, stamp)
    }

    fn lookup_transform_with_time_travel(
        &self,
        target: &str,
        target_time: Time,
        source: &str,
        source_time: Time,
        fixed_frame: &str,
    ) -> Result<TransformStamped, TfError> {
        FrameGraph::lookup_transform_with_time_travel(
            self,
            target,
            target_time,
            source,
            source_time,
            fixed_frame,
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::tf_util::to_stamp;
    use chrono::TimeDelta;
    use tf_graph_core::geometry_msgs::{Quaternion, Transform, Vector3};
    use tf_graph_core::std_msgs::Header;

    fn stamped(
        parent: &str,
        child: &str,
        stamp: Time,
        translation: (f64, f64, f64),
        rotation: Quaternion,
    ) -> TransformStamped {
        TransformStamped {
            header: Header {
                seq: 1,
                stamp,
                frame_id: parent.to_string(),
            },
            child_frame_id: child.to_string(),
            transform: Transform {
                translation: Vector3 {
                    x: translation.0,
                    y: translation.1,
                    z: translation.2,
                },
                rotation,
            },
        }
    }

    fn identity_rotation() -> Quaternion {
        Quaternion {
            x: 0.0,
            y: 0.0,
            z: 0.0,
            w: 1.0,
        }
    }

    fn assert_translation(tfs: &TransformStamped, expected: (f64, f64, f64)) {
        assert!(
            (tfs.transform.translation.x - expected.0).abs() < 1e-9
                && (tfs.transform.translation.y - expected.1).abs() < 1e-9
                && (tfs.transform.translation.z - expected.2).abs() < 1e-9,
            "translation {:?} != {expected:?}",
            tfs.transform.translation
        );
    }

    #[test]
    fn test_identity_short_circuit() {
        let graph = FrameGraph::new();
        let tfs = graph
            .lookup_transform("x", "x", Some(to_stamp(5, 0)))
            .unwrap();
        assert_eq!(tfs.header.frame_id, "x");
        assert_eq!(tfs.child_frame_id, "x");
        assert_eq!(tfs.header.stamp, to_stamp(5, 0));
        assert_eq!(tfs.transform, Transform::identity());
    }

    #[test]
    fn test_two_frame_interpolation() {
        let mut graph = FrameGraph::new();
        assert!(graph.set_transform(
            &stamped("a", "b", to_stamp(0, 0), (0.0, 0.0, 0.0), identity_rotation()),
            "tester"
        ));
        assert!(graph.set_transform(
            &stamped("a", "b", to_stamp(2, 0), (2.0, 0.0, 0.0), identity_rotation()),
            "tester"
        ));
        let tfs = graph
            .lookup_transform("a", "b", Some(to_stamp(1, 0)))
            .unwrap();
        assert_translation(&tfs, (1.0, 0.0, 0.0));
        assert_eq!(tfs.header.stamp, to_stamp(1, 0));
        assert_eq!(tfs.header.frame_id, "a");
        assert_eq!(tfs.child_frame_id, "b");
    }

    #[test]
    fn test_chain_composition() {
        let mut graph = FrameGraph::new();
        assert!(graph.set_transform(
            &stamped("a", "b", to_stamp(1, 0), (1.0, 0.0, 0.0), identity_rotation()),
            "tester"
        ));
        assert!(graph.set_transform(
            &stamped("b", "c", to_stamp(1, 0), (0.0, 1.0, 0.0), identity_rotation()),
            "tester"
        ));
        let tfs = graph
            .lookup_transform("a", "c", Some(to_stamp(1, 0)))
            .unwrap();
        assert_translation(&tfs, (1.0, 1.0, 0.0));
    }

    #[test]
    fn test_lookup_down_the_tree() {
        let mut graph = FrameGraph::new();
        assert!(graph.set_transform(
            &stamped("a", "b", to_stamp(1, 0), (1.0, 2.0, 0.0), identity_rotation()),
            "tester"
        ));
        // target below source, the whole chain is target-side and inverted
        let tfs = graph
            .lookup_transform("b", "a", Some(to_stamp(1, 0)))
            .unwrap();
        assert_translation(&tfs, (-1.0, -2.0, 0.0));
    }

    #[test]
    fn test_lookups_are_mutual_inverses() {
        let mut graph = FrameGraph::new();
        let half = std::f64::consts::FRAC_PI_4;
        let rot_z = Quaternion {
            x: 0.0,
            y: 0.0,
            z: half.sin(),
            w: half.cos(),
        };
        assert!(graph.set_transform(
            &stamped("world", "base", to_stamp(1, 0), (1.0, -0.5, 2.0), rot_z),
            "tester"
        ));
        assert!(graph.set_transform(
            &stamped(
                "world",
                "beacon",
                to_stamp(1, 0),
                (3.0, 1.0, 0.0),
                identity_rotation()
            ),
            "tester"
        ));

        let ab = graph
            .lookup_transform("base", "beacon", Some(to_stamp(1, 0)))
            .unwrap();
        let ba = graph
            .lookup_transform("beacon", "base", Some(to_stamp(1, 0)))
            .unwrap();
        let round_trip = chain_transforms(&[ab.transform, ba.transform]);
        assert!((round_trip.translation.x).abs() < 1e-9);
        assert!((round_trip.translation.y).abs() < 1e-9);
        assert!((round_trip.translation.z).abs() < 1e-9);
        assert!((round_trip.rotation.w.abs() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_triangle_composition() {
        let mut graph = FrameGraph::new();
        let half = std::f64::consts::FRAC_PI_6;
        let rot_z = Quaternion {
            x: 0.0,
            y: 0.0,
            z: half.sin(),
            w: half.cos(),
        };
        assert!(graph.set_transform(
            &stamped("world", "base", to_stamp(1, 0), (1.0, 0.0, 0.0), rot_z),
            "tester"
        ));
        assert!(graph.set_transform(
            &stamped(
                "base",
                "camera",
                to_stamp(1, 0),
                (0.5, 0.5, 0.0),
                identity_rotation()
            ),
            "tester"
        ));

        let ac = graph
            .lookup_transform("world", "camera", Some(to_stamp(1, 0)))
            .unwrap();
        let ab = graph
            .lookup_transform("world", "base", Some(to_stamp(1, 0)))
            .unwrap();
        let bc = graph
            .lookup_transform("base", "camera", Some(to_stamp(1, 0)))
            .unwrap();
        let composed = chain_transforms(&[ab.transform, bc.transform]);
        assert!((ac.transform.translation.x - composed.translation.x).abs() < 1e-9);
        assert!((ac.transform.translation.y - composed.translation.y).abs() < 1e-9);
        assert!((ac.transform.rotation.z - composed.rotation.z).abs() < 1e-9);
        assert!((ac.transform.rotation.w - composed.rotation.w).abs() < 1e-9);
    }

    #[test]
    fn test_extrapolation_rejected_at_zero_distance() {
        let mut graph = FrameGraph::new();
        assert!(graph.set_transform(
            &stamped(
                "parent",
                "child",
                to_stamp(10, 0),
                (1.0, 0.0, 0.0),
                identity_rotation()
            ),
            "tester"
        ));

        // dead on the single sample works
        assert!(graph
            .lookup_transform("parent", "child", Some(to_stamp(10, 0)))
            .is_ok());
        // one second past it does not
        let result = graph.lookup_transform("parent", "child", Some(to_stamp(11, 0)));
        assert!(matches!(result, Err(TfError::ExtrapolationError(_))));
    }

    #[test]
    fn test_extrapolation_distance_allows_nearby_times() {
        let mut graph = FrameGraph::new();
        graph.set_max_extrapolation_distance(TimeDelta::new(2, 0).unwrap());
        assert!(graph.set_transform(
            &stamped(
                "parent",
                "child",
                to_stamp(10, 0),
                (1.0, 0.0, 0.0),
                identity_rotation()
            ),
            "tester"
        ));

        assert!(graph
            .lookup_transform("parent", "child", Some(to_stamp(11, 0)))
            .is_ok());
        let result = graph.lookup_transform("parent", "child", Some(to_stamp(13, 0)));
        assert!(matches!(result, Err(TfError::ExtrapolationError(_))));
    }

    #[test]
    fn test_connectivity_failure() {
        let mut graph = FrameGraph::new();
        assert!(graph.set_transform(
            &stamped("a", "b", to_stamp(1, 0), (1.0, 0.0, 0.0), identity_rotation()),
            "tester"
        ));
        assert!(graph.set_transform(
            &stamped("c", "d", to_stamp(1, 0), (2.0, 0.0, 0.0), identity_rotation()),
            "tester"
        ));
        let result = graph.lookup_transform("a", "c", Some(to_stamp(1, 0)));
        assert!(matches!(result, Err(TfError::ConnectivityError(_))));
    }

    #[test]
    fn test_loop_detection() {
        let mut graph = FrameGraph::new();
        assert!(graph.set_transform(
            &stamped("a", "b", to_stamp(1, 0), (1.0, 0.0, 0.0), identity_rotation()),
            "tester"
        ));
        assert!(graph.set_transform(
            &stamped("b", "a", to_stamp(1, 0), (1.0, 0.0, 0.0), identity_rotation()),
            "tester"
        ));
        let result = graph.lookup_transform("a", "b", Some(to_stamp(1, 0)));
        match result {
            Err(TfError::LookupError(message)) => assert!(message.contains("loop")),
            other => panic!("expected a lookup error citing a loop, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_frame_is_lookup_error() {
        let mut graph = FrameGraph::new();
        assert!(graph.set_transform(
            &stamped("a", "b", to_stamp(1, 0), (1.0, 0.0, 0.0), identity_rotation()),
            "tester"
        ));
        let result = graph.lookup_transform("a", "nowhere", Some(to_stamp(1, 0)));
        assert!(matches!(result, Err(TfError::LookupError(_))));
    }

    #[test]
    fn test_latest_common_time() {
        let mut graph = FrameGraph::new();
        assert!(graph.set_transform(
            &stamped(
                "world",
                "base",
                to_stamp(5, 0),
                (1.0, 0.0, 0.0),
                identity_rotation()
            ),
            "tester"
        ));
        assert!(graph.set_transform(
            &stamped(
                "world",
                "base",
                to_stamp(9, 0),
                (1.0, 0.0, 0.0),
                identity_rotation()
            ),
            "tester"
        ));
        assert!(graph.set_transform(
            &stamped(
                "world",
                "beacon",
                to_stamp(7, 0),
                (2.0, 0.0, 0.0),
                identity_rotation()
            ),
            "tester"
        ));

        // base is newest at 9, beacon at 7; the common time is the older one
        let time = graph.latest_common_time("base", "beacon").unwrap();
        assert_eq!(time, Some(to_stamp(7, 0)));
        // identical frames carry no constraint
        assert_eq!(graph.latest_common_time("base", "base").unwrap(), None);
    }

    #[test]
    fn test_latest_lookup_resolves_common_time() {
        let mut graph = FrameGraph::new();
        assert!(graph.set_transform(
            &stamped(
                "world",
                "base",
                to_stamp(5, 0),
                (0.0, 5.0, 0.0),
                identity_rotation()
            ),
            "tester"
        ));
        assert!(graph.set_transform(
            &stamped(
                "world",
                "base",
                to_stamp(9, 0),
                (0.0, 9.0, 0.0),
                identity_rotation()
            ),
            "tester"
        ));
        assert!(graph.set_transform(
            &stamped(
                "world",
                "beacon",
                to_stamp(7, 0),
                (2.0, 0.0, 0.0),
                identity_rotation()
            ),
            "tester"
        ));

        let tfs = graph.lookup_transform("beacon", "base", None).unwrap();
        assert_eq!(tfs.header.stamp, to_stamp(7, 0));
        // base interpolated at t=7 sits at y=7
        assert_translation(&tfs, (-2.0, 7.0, 0.0));
    }

    #[test]
    fn test_latest_lookup_without_overlap_is_connectivity_failure() {
        let mut graph = FrameGraph::new_with_duration(TimeDelta::new(1000, 0).unwrap());
        assert!(graph.set_transform(
            &stamped(
                "world",
                "base",
                to_stamp(100, 0),
                (1.0, 0.0, 0.0),
                identity_rotation()
            ),
            "tester"
        ));
        assert!(graph.set_transform(
            &stamped(
                "world",
                "base",
                to_stamp(200, 0),
                (1.0, 0.0, 0.0),
                identity_rotation()
            ),
            "tester"
        ));
        // beacon's only data is far older than base's history
        assert!(graph.set_transform(
            &stamped(
                "world",
                "beacon",
                to_stamp(10, 0),
                (2.0, 0.0, 0.0),
                identity_rotation()
            ),
            "tester"
        ));
        assert!(graph.set_transform(
            &stamped(
                "world",
                "beacon",
                to_stamp(20, 0),
                (2.0, 0.0, 0.0),
                identity_rotation()
            ),
            "tester"
        ));

        let result = graph.lookup_transform("base", "beacon", None);
        match result {
            Err(TfError::ConnectivityError(message)) => {
                assert!(message.contains("common time"), "{message}");
            }
            other => panic!("expected a connectivity error, got {other:?}"),
        }
    }

    #[test]
    fn test_time_travel_lookup() {
        let mut graph = FrameGraph::new();
        // base moves along y over time, camera rides half a meter ahead
        for secs in [0, 1] {
            assert!(graph.set_transform(
                &stamped(
                    "world",
                    "base",
                    to_stamp(secs, 0),
                    (0.0, secs as f64, 0.0),
                    identity_rotation()
                ),
                "tester"
            ));
            assert!(graph.set_transform(
                &stamped(
                    "base",
                    "camera",
                    to_stamp(secs, 0),
                    (0.5, 0.0, 0.0),
                    identity_rotation()
                ),
                "tester"
            ));
        }

        let tfs = graph
            .lookup_transform_with_time_travel(
                "camera",
                to_stamp(0, 400_000_000),
                "camera",
                to_stamp(0, 700_000_000),
                "world",
            )
            .unwrap();
        assert_eq!(tfs.header.frame_id, "camera");
        assert_eq!(tfs.child_frame_id, "camera");
        assert_eq!(tfs.header.stamp, to_stamp(0, 400_000_000));
        // the robot advanced 0.3 m between the two observation times
        assert_translation(&tfs, (0.0, 0.3, 0.0));
    }

    #[test]
    fn test_can_transform_reports_diagnostics() {
        let mut graph = FrameGraph::new();
        assert!(graph.set_transform(
            &stamped("a", "b", to_stamp(1, 0), (1.0, 0.0, 0.0), identity_rotation()),
            "tester"
        ));

        assert!(graph.can_transform("a", "b", Some(to_stamp(1, 0)), None));

        let mut diagnostic = String::new();
        assert!(!graph.can_transform("a", "nowhere", Some(to_stamp(1, 0)), Some(&mut diagnostic)));
        assert!(diagnostic.contains("nowhere"));
    }

    #[test]
    fn test_clear_disconnects_until_new_samples() {
        let mut graph = FrameGraph::new();
        assert!(graph.set_transform(
            &stamped("a", "b", to_stamp(1, 0), (1.0, 0.0, 0.0), identity_rotation()),
            "tester"
        ));
        assert!(graph.lookup_transform("a", "b", Some(to_stamp(1, 0))).is_ok());

        graph.clear();
        // both walks stop immediately on their empty caches
        let result = graph.lookup_transform("a", "b", Some(to_stamp(1, 0)));
        assert!(matches!(result, Err(TfError::ConnectivityError(_))));

        assert!(graph.set_transform(
            &stamped("a", "b", to_stamp(2, 0), (1.0, 0.0, 0.0), identity_rotation()),
            "tester"
        ));
        assert!(graph.lookup_transform("a", "b", Some(to_stamp(2, 0))).is_ok());
    }

    #[test]
    fn test_reparenting_gap_is_extrapolation() {
        let mut graph = FrameGraph::new_with_duration(TimeDelta::new(100, 0).unwrap());
        assert!(graph.set_transform(
            &stamped(
                "camera1",
                "marker",
                to_stamp(10, 0),
                (1.0, 0.0, 0.0),
                identity_rotation()
            ),
            "tester"
        ));
        assert!(graph.set_transform(
            &stamped(
                "camera2",
                "marker",
                to_stamp(30, 0),
                (2.0, 0.0, 0.0),
                identity_rotation()
            ),
            "tester"
        ));
        assert!(graph.set_transform(
            &stamped(
                "world",
                "camera1",
                to_stamp(10, 0),
                (5.0, 0.0, 0.0),
                identity_rotation()
            ),
            "tester"
        ));

        // t=12 falls in the gap between the two parent series; the nearer
        // side is camera1 and its sample is 2 s away, too far to extrapolate
        let result = graph.lookup_transform("world", "marker", Some(to_stamp(12, 0)));
        assert!(matches!(result, Err(TfError::ExtrapolationError(_))));

        // at the camera1 sample itself the old series still resolves
        let tfs = graph
            .lookup_transform("world", "marker", Some(to_stamp(10, 0)))
            .unwrap();
        assert_translation(&tfs, (6.0, 0.0, 0.0));
    }
}
