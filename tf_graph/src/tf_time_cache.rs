use chrono::TimeDelta;

use tf_graph_core::geometry_msgs::{Quaternion, Transform, Vector3};
use tf_graph_core::transforms::interpolate;

use crate::tf_util::duration_to_f64;

/// Classifies how a cache answered a point query.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueryMode {
    /// The query time was bracketed by two samples of the same series.
    Interpolated,
    /// The cache held exactly one sample, returned verbatim.
    OneValue,
    /// The query time was older than the nearest series, its oldest sample
    /// was returned.
    ExtrapolateBack,
    /// The query time was newer than the nearest series, its newest sample
    /// was returned.
    ExtrapolateForward,
}

/// One sample of a child frame's pose in its parent at an instant.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransformStorage {
    pub stamp: TimeDelta,
    pub translation: Vector3,
    pub rotation: Quaternion,
    /// Frame this edge points toward at this instant. Samples with different
    /// parents belong to different series and never interpolate.
    pub parent_id: u32,
}

impl TransformStorage {
    pub fn transform(&self) -> Transform {
        Transform {
            translation: self.translation,
            rotation: self.rotation,
        }
    }
}

fn binary_search_stamp(samples: &[TransformStorage], stamp: TimeDelta) -> Result<usize, usize> {
    samples.binary_search_by(|sample| sample.stamp.cmp(&stamp))
}

/// A bounded, time-sorted history of samples for a single child frame.
///
/// Capacity is unbounded in count but bounded in time span: whenever a sample
/// is inserted, everything strictly older than `newest.stamp - cache_time` is
/// evicted.
#[derive(Clone, Debug)]
pub struct TimeCache {
    cache_time: TimeDelta,
    samples: Vec<TransformStorage>,
}

impl TimeCache {
    pub fn new(cache_time: TimeDelta) -> Self {
        Self {
            cache_time,
            samples: Vec::new(),
        }
    }

    pub fn latest_stamp(&self) -> Option<TimeDelta> {
        self.samples.last().map(|sample| sample.stamp)
    }

    pub fn oldest_stamp(&self) -> Option<TimeDelta> {
        self.samples.first().map(|sample| sample.stamp)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    /// Insert a sample in stamp order. Returns false when the sample is
    /// older than everything the retention window keeps, i.e. it would be
    /// evicted immediately.
    pub fn insert(&mut self, sample: TransformStorage) -> bool {
        if let Some(newest) = self.latest_stamp() {
            if sample.stamp < newest - self.cache_time {
                return false;
            }
        }
        let index = binary_search_stamp(&self.samples, sample.stamp).unwrap_or_else(|index| index);
        self.samples.insert(index, sample);

        if let Some(newest) = self.latest_stamp() {
            let horizon = newest - self.cache_time;
            let keep_from = binary_search_stamp(&self.samples, horizon).unwrap_or_else(|index| index);
            self.samples.drain(..keep_from);
        }
        true
    }

    /// Point query. `None` asks for the newest sample; an empty cache yields
    /// `None`.
    pub fn query(&self, time: Option<TimeDelta>) -> Option<(TransformStorage, QueryMode)> {
        let newest = *self.samples.last()?;
        if self.samples.len() == 1 {
            return Some((newest, QueryMode::OneValue));
        }
        let time = match time {
            Some(time) => time,
            None => return Some((newest, QueryMode::Interpolated)),
        };
        let oldest = self.samples[0];
        if time < oldest.stamp {
            return Some((oldest, QueryMode::ExtrapolateBack));
        }
        if time > newest.stamp {
            return Some((newest, QueryMode::ExtrapolateForward));
        }
        match binary_search_stamp(&self.samples, time) {
            Ok(index) => Some((self.samples[index], QueryMode::Interpolated)),
            Err(index) => {
                let s0 = self.samples[index - 1];
                let s1 = self.samples[index];
                if s0.parent_id != s1.parent_id {
                    // a re-parenting event is a hard series boundary, resolve
                    // to the nearer side instead of interpolating across it
                    if time - s0.stamp <= s1.stamp - time {
                        return Some((s0, QueryMode::ExtrapolateForward));
                    }
                    return Some((s1, QueryMode::ExtrapolateBack));
                }
                let alpha =
                    duration_to_f64(time - s0.stamp) / duration_to_f64(s1.stamp - s0.stamp);
                let interpolated = interpolate(s0.transform(), s1.transform(), alpha);
                Some((
                    TransformStorage {
                        stamp: time,
                        translation: interpolated.translation,
                        rotation: interpolated.rotation,
                        parent_id: s0.parent_id,
                    },
                    QueryMode::Interpolated,
                ))
            }
        }
    }
}
