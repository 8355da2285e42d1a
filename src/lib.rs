#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

pub mod animation;
pub mod document;
pub mod errors;
pub mod import;
pub mod scene;

pub use animation::{AnimationGraph, AnimationNode, InterpolationMode, KeyframeTrack, Track, TrackData, TrackTarget};
pub use document::Document;
pub use errors::{ImportError, Result};
pub use import::{ImportResult, import_document};
pub use scene::{FaceGroup, Mesh, SceneGraph, SceneNode, Skeleton, Skin};
