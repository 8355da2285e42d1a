//! Output boundary: typed keyframe tracks and the animation-node graph.
//!
//! Track synthesis produces an [`AnimationGraph`] mirroring the animated
//! subtree of the scene; each animation node owns the typed tracks driving
//! one scene node. All key times are normalized to `[0, 1]` against the
//! document-wide duration.

pub mod graph;
pub mod tracks;
pub mod values;

pub use graph::{AnimNodeKey, AnimationGraph, AnimationNode};
pub use tracks::{
    InterpolationMode, Keyframe, KeyframeTrack, TangentPair, Track, TrackData, TrackTarget,
};
pub use values::Interpolatable;
