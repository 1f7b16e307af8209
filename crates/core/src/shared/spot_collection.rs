use std::collections::{BTreeMap, HashMap};

use super::spot::{SpotId, Trackable};

/// Trackable objects bucketed by frame.
///
/// Within a frame, objects are kept sorted by id so that matrix row and
/// column orders are reproducible.
#[derive(Clone, Debug)]
pub struct SpotCollection<T> {
    frames: BTreeMap<usize, Vec<T>>,
    frame_of: HashMap<SpotId, usize>,
}

impl<T> Default for SpotCollection<T> {
    fn default() -> Self {
        Self {
            frames: BTreeMap::new(),
            frame_of: HashMap::new(),
        }
    }
}

impl<T: Trackable> SpotCollection<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `spot`. Returns `false`, leaving the collection unchanged, when an
    /// object with the same id is already present.
    pub fn add(&mut self, spot: T) -> bool {
        let id = spot.id();
        if self.frame_of.contains_key(&id) {
            return false;
        }
        let bucket = self.frames.entry(spot.frame()).or_default();
        let at = bucket.partition_point(|s| s.id() < id);
        self.frame_of.insert(id, spot.frame());
        bucket.insert(at, spot);
        true
    }

    /// Objects in `frame`, sorted by id.
    pub fn frame(&self, frame: usize) -> &[T] {
        self.frames.get(&frame).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Indices of frames holding at least one object, ascending.
    pub fn frames(&self) -> impl Iterator<Item = usize> + '_ {
        self.frames
            .iter()
            .filter(|(_, spots)| !spots.is_empty())
            .map(|(&frame, _)| frame)
    }

    /// Pairs of consecutive non-empty frames. Empty frames are skipped, so a
    /// pair may span more than one frame index.
    pub fn frame_pairs(&self) -> Vec<(usize, usize)> {
        let frames: Vec<usize> = self.frames().collect();
        frames.windows(2).map(|w| (w[0], w[1])).collect()
    }

    pub fn get(&self, id: SpotId) -> Option<&T> {
        let frame = self.frame_of.get(&id)?;
        let bucket = self.frames.get(frame)?;
        bucket
            .binary_search_by_key(&id, |s| s.id())
            .ok()
            .map(|at| &bucket[at])
    }

    pub fn len(&self) -> usize {
        self.frame_of.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frame_of.is_empty()
    }

    /// All objects, by frame then id.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.frames.values().flatten()
    }
}

impl<T: Trackable> FromIterator<T> for SpotCollection<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut collection = Self::new();
        for spot in iter {
            if !collection.add(spot) {
                log::warn!("Ignoring object with duplicate id");
            }
        }
        collection
    }
}
