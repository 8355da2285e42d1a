use rustc_hash::FxHashMap;

use crate::document::{Asset, UpAxis};

/// Shared context of one import run.
///
/// Holds the document conventions (up-axis, unit), the registries mapping
/// node ids/sids/names to import-node indices, and the running animation
/// duration maximum. Always passed by reference through the pipeline;
/// populated while nodes import, read-only afterwards.
#[derive(Debug)]
pub struct ImportSession {
    pub up_axis: UpAxis,
    pub unit_meter: f32,

    ids: FxHashMap<String, usize>,
    sids: FxHashMap<String, usize>,
    names: FxHashMap<String, usize>,

    duration: f32,
}

impl ImportSession {
    #[must_use]
    pub fn new(asset: &Asset) -> Self {
        Self {
            up_axis: asset.up_axis,
            unit_meter: asset.unit_meter,
            ids: FxHashMap::default(),
            sids: FxHashMap::default(),
            names: FxHashMap::default(),
            duration: 0.0,
        }
    }

    /// Registers an imported node under its id, sid and name.
    pub fn register_node(
        &mut self,
        index: usize,
        id: &str,
        sid: Option<&str>,
        name: Option<&str>,
    ) {
        if !id.is_empty() {
            self.ids.insert(id.to_string(), index);
        }
        if let Some(sid) = sid {
            self.sids.insert(sid.to_string(), index);
        }
        if let Some(name) = name {
            self.names.insert(name.to_string(), index);
        }
    }

    #[must_use]
    pub fn find_node_by_id(&self, id: &str) -> Option<usize> {
        self.ids.get(id).copied()
    }

    #[must_use]
    pub fn find_node_by_sid(&self, sid: &str) -> Option<usize> {
        self.sids.get(sid).copied()
    }

    #[must_use]
    pub fn find_node_by_name(&self, name: &str) -> Option<usize> {
        self.names.get(name).copied()
    }

    /// Feeds one channel input time into the document-wide duration.
    pub fn max_animation_duration(&mut self, time: f32) {
        self.duration = self.duration.max(time);
    }

    /// The overall animation duration: the maximum over every channel's
    /// input times seen so far.
    #[inline]
    #[must_use]
    pub fn animation_duration(&self) -> f32 {
        self.duration
    }
}
