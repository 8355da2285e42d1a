//! Animation import and track synthesis.
//!
//! An `<animation>` element carries flat float sources, samplers mapping
//! semantic roles onto them, and channels binding a sampler to a scene
//! target path. Import resolves and classifies every channel and feeds the
//! document-wide duration; synthesis turns the resolved channels into
//! typed tracks on the target's animation node.
//!
//! Axis-split rotation channels accumulate into one orientation track:
//! a key landing on an exact existing time composes into that key's
//! quaternion instead of inserting. Matrix channels decompose into
//! rotation + translation tracks; the scale part is not extracted.

use glam::{Mat4, Quat, Vec2, Vec3};
use rustc_hash::FxHashMap;

use crate::animation::{
    AnimationNode, InterpolationMode, KeyframeTrack, TangentPair, Track, TrackData, TrackTarget,
};
use crate::document::{
    AddressedElement, AnimationElement, ChannelElement, Document, SamplerElement, SourceArray,
    SourceElement, TransformOp,
};
use crate::errors::{ImportError, Result};
use crate::import::mat4_from_row_major;
use crate::import::node::ImportNode;
use crate::import::session::ImportSession;

/// What a resolved channel drives, with the component count per key
/// implied by the classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    Rotate,
    RotateX,
    RotateY,
    RotateZ,
    Translate,
    Scale,
    Matrix,
    /// A raw source value.
    Source,
    /// A generic 3-component parameter.
    Generic,
    GenericX,
    GenericY,
    GenericZ,
}

#[derive(Debug, Clone)]
struct AnimSampler {
    /// Semantic role -> source id.
    sources: FxHashMap<String, String>,
    mode: InterpolationMode,
}

/// A resolved channel, ready for synthesis.
#[derive(Debug, Clone)]
struct AnimChannel {
    input: String,
    output: String,
    left_tangent: Option<String>,
    right_tangent: Option<String>,
    mode: InterpolationMode,
    target: TargetKind,
    component_count: usize,
}

/// The intermediate model of one `<animation>` element.
#[derive(Debug)]
pub struct AnimationImport {
    pub id: String,
    sources: FxHashMap<String, Vec<f32>>,
    samplers: FxHashMap<String, AnimSampler>,
    channels: Vec<AnimChannel>,
    /// Id of the scene node the channels target.
    pub target_node_id: Option<String>,
    /// Merge per-axis rotation channels into one orientation track.
    pub combined_rot_tracks: bool,
}

fn parse_mode(name: &str) -> InterpolationMode {
    match name {
        "BEZIER" => InterpolationMode::Bezier,
        "TCB" => InterpolationMode::Tcb,
        _ => InterpolationMode::Linear,
    }
}

impl AnimationImport {
    /// Imports an animation element and its sub-animations, attaching each
    /// to its target import node. An element with children reads the first
    /// child's content in place of its own.
    pub fn import(
        document: &Document,
        element: &AnimationElement,
        session: &mut ImportSession,
        nodes: &mut [ImportNode],
        out: &mut Vec<AnimationImport>,
    ) -> Result<()> {
        let effective = if element.children.is_empty() {
            element
        } else {
            &element.children[0]
        };

        let mut animation = Self {
            id: element.id.clone(),
            sources: FxHashMap::default(),
            samplers: FxHashMap::default(),
            channels: Vec::new(),
            target_node_id: None,
            combined_rot_tracks: true,
        };

        for source in &effective.sources {
            animation.read_source(source)?;
        }
        for sampler in &effective.samplers {
            animation.read_sampler(sampler, effective)?;
        }
        for channel in &effective.channels {
            animation.read_channel(document, channel, session);
        }

        if let Some(id) = &animation.target_node_id {
            if let Some(index) = session.find_node_by_id(id) {
                nodes[index].animations.push(out.len());
            }
        }
        out.push(animation);

        for child in &effective.children {
            Self::import(document, child, session, nodes, out)?;
        }
        Ok(())
    }

    #[must_use]
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    fn read_source(&mut self, source: &SourceElement) -> Result<()> {
        if source.id.is_empty() {
            log::warn!("Undefined animation source id");
            return Ok(());
        }
        match &source.array {
            SourceArray::Float(data) => {
                self.sources.insert(source.id.clone(), data.clone());
                Ok(())
            }
            // Interpolation-mode names are read through the sampler.
            SourceArray::Name(_) => Ok(()),
            SourceArray::IdRef(_) => Err(ImportError::InvalidFormat(format!(
                "Animation source {} has no usable array",
                source.id
            ))),
        }
    }

    /// Reads a sampler. All entries of an interpolation-mode source must
    /// agree; a mixed sampler is a format error and drops the whole
    /// animation element (the sampler may serve several channels).
    fn read_sampler(&mut self, sampler: &SamplerElement, owner: &AnimationElement) -> Result<()> {
        let mut entry = AnimSampler {
            sources: FxHashMap::default(),
            mode: InterpolationMode::Linear,
        };

        for input in &sampler.inputs {
            entry
                .sources
                .insert(input.semantic.clone(), input.source.clone());

            if let Some(source) = owner.find_source(&input.source) {
                if let SourceArray::Name(names) = &source.array {
                    if let Some(first) = names.first() {
                        entry.mode = parse_mode(first);
                        for name in &names[1..] {
                            if parse_mode(name) != entry.mode {
                                return Err(ImportError::InvalidFormat(
                                    "Mixed animations key mode are not supported".into(),
                                ));
                            }
                        }
                    }
                }
            }
        }

        self.samplers.insert(sampler.id.clone(), entry);
        Ok(())
    }

    /// Resolves one channel: sampler roles, duration contribution, target
    /// path and target-kind classification. Unresolvable channels produce
    /// a warning and are discarded; siblings continue.
    fn read_channel(
        &mut self,
        document: &Document,
        element: &ChannelElement,
        session: &mut ImportSession,
    ) {
        let (input, output, left_tangent, right_tangent, mode) = {
            let Some(sampler) = self.samplers.get(&element.sampler) else {
                log::warn!("Undefined animation sampler {}", element.sampler);
                return;
            };
            let Some(input) = sampler.sources.get("INPUT").cloned() else {
                log::warn!("Animation sampler {} has no INPUT", element.sampler);
                return;
            };
            let Some(output) = sampler.sources.get("OUTPUT").cloned() else {
                log::warn!("Animation sampler {} has no OUTPUT", element.sampler);
                return;
            };
            (
                input,
                output,
                sampler.sources.get("IN_TANGENT").cloned(),
                sampler.sources.get("OUT_TANGENT").cloned(),
                sampler.mode,
            )
        };

        // Every input time feeds the document-wide duration maximum.
        if let Some(times) = self.sources.get(&input) {
            for &time in times {
                session.max_animation_duration(time);
            }
        }

        // Target path: the prefix up to the first of '/', '(' or '.' is
        // the node id; the suffix after '.' or '(' is the member.
        let target = element.target.as_str();
        let id_sep = target.find(['/', '(', '.']);
        let (target_id, member) = match id_sep {
            Some(pos) => {
                let sid_sep = target.find('.').or_else(|| target.find('('));
                let member = match sid_sep {
                    Some(sep) if sep >= pos => Some(target[sep + 1..].to_string()),
                    _ => None,
                };
                (target[..pos].to_string(), member)
            }
            None => (target.to_string(), None),
        };
        self.target_node_id = Some(target_id);

        let Some(resolved) = document.resolve_target(target) else {
            log::warn!("Animation target can not be solved: {target}");
            return;
        };

        let (mut kind, mut components) = match resolved.element {
            AddressedElement::Transform(op) => match op {
                TransformOp::Translate(_) => (TargetKind::Translate, 3),
                TransformOp::Rotate(_) => (TargetKind::Rotate, 4),
                TransformOp::Scale(_) => (TargetKind::Scale, 3),
                TransformOp::Matrix(_) => (TargetKind::Matrix, 16),
                TransformOp::LookAt(_) | TransformOp::Skew(_) => {
                    log::warn!("Unsupported animation target: {target}");
                    return;
                }
            },
            AddressedElement::Source(_) => (TargetKind::Source, 1),
            AddressedElement::Node(_) => {
                log::warn!("Unsupported animation target: {target}");
                return;
            }
        };

        if let Some(member) = member {
            let upper = member.to_ascii_uppercase();
            if upper == "AXIS" || upper == "ANGLE" {
                // The concrete axis comes from the resolved rotate
                // element's static axis vector.
                if let AddressedElement::Transform(TransformOp::Rotate(value)) = resolved.element {
                    if value.x == 1.0 {
                        (kind, components) = (TargetKind::RotateX, 1);
                    } else if value.y == 1.0 {
                        (kind, components) = (TargetKind::RotateY, 1);
                    } else if value.z == 1.0 {
                        (kind, components) = (TargetKind::RotateZ, 1);
                    }
                }
            } else if upper == "X" {
                (kind, components) = (TargetKind::GenericX, 1);
            } else if upper == "Y" {
                (kind, components) = (TargetKind::GenericY, 1);
            } else if upper == "Z" {
                (kind, components) = (TargetKind::GenericZ, 1);
            } else if member.starts_with(|c: char| c.is_ascii_digit()) {
                (kind, components) = (TargetKind::Source, 1);
            } else {
                (kind, components) = (TargetKind::Generic, 3);
            }
        }

        self.channels.push(AnimChannel {
            input,
            output,
            left_tangent,
            right_tangent,
            mode,
            target: kind,
            component_count: components,
        });
    }

    /// Synthesizes this animation's channels into tracks on `anim_node`.
    ///
    /// Key times are normalized by `duration`; matrix keys are
    /// premultiplied by `node_matrix_inv`, the inverse of the target
    /// node's local transform.
    pub fn generate_keys(
        &self,
        duration: f32,
        node_matrix_inv: Mat4,
        anim_node: &mut AnimationNode,
    ) -> Result<()> {
        let inv_duration = if duration > 0.0 { 1.0 / duration } else { 1.0 };

        for channel in &self.channels {
            let Some(times) = self.sources.get(&channel.input) else {
                log::warn!("Undefined source id {}", channel.input);
                continue;
            };
            let Some(outputs) = self.sources.get(&channel.output) else {
                log::warn!("Undefined source id {}", channel.output);
                continue;
            };

            match channel.mode {
                InterpolationMode::Linear => {
                    self.generate_linear(channel, times, outputs, inv_duration, node_matrix_inv, anim_node)?;
                }
                InterpolationMode::Bezier => {
                    self.generate_bezier(channel, times, outputs, inv_duration, anim_node)?;
                }
                InterpolationMode::Tcb => {
                    return Err(ImportError::Unsupported("TCB interpolation".into()));
                }
            }
        }
        Ok(())
    }

    fn generate_linear(
        &self,
        channel: &AnimChannel,
        times: &[f32],
        outputs: &[f32],
        inv_duration: f32,
        node_matrix_inv: Mat4,
        anim_node: &mut AnimationNode,
    ) -> Result<()> {
        let components = channel.component_count;

        match channel.target {
            TargetKind::Rotate
            | TargetKind::RotateX
            | TargetKind::RotateY
            | TargetKind::RotateZ => {
                if components != 1 && components != 4 {
                    return Err(ImportError::InvalidFormat(
                        "Rotation track should have 1 or 4 components".into(),
                    ));
                }
                if components == 4 {
                    return Err(ImportError::Unsupported(
                        "Quaternion-array rotation samplers".into(),
                    ));
                }

                if self.combined_rot_tracks {
                    // All single-axis channels of a node share one
                    // orientation track.
                    if anim_node.rotation_track_mut().is_none() {
                        anim_node.tracks.push(Track {
                            target: TrackTarget::Rotation,
                            data: TrackData::Quaternion(KeyframeTrack::new(
                                InterpolationMode::Linear,
                            )),
                        });
                    }
                    let Some(track) = anim_node.rotation_track_mut() else {
                        return Ok(());
                    };
                    let TrackData::Quaternion(track) = &mut track.data else {
                        return Ok(());
                    };

                    let axis = match channel.target {
                        TargetKind::RotateY => Vec3::Y,
                        TargetKind::RotateZ => Vec3::Z,
                        _ => Vec3::X,
                    };

                    for (&time, &angle) in times.iter().zip(outputs.iter()) {
                        let quat = Quat::from_axis_angle(axis, angle.to_radians());
                        let time = time * inv_duration;

                        // A key already at this exact time composes; a new
                        // time inserts.
                        match track.key_index_at(time) {
                            Some(existing) => {
                                let key = &mut track.keys[existing];
                                key.value = (key.value * quat).normalize();
                            }
                            None => track.push(time, quat),
                        }
                    }
                } else {
                    let target = match channel.target {
                        TargetKind::RotateX => TrackTarget::RotationX,
                        TargetKind::RotateY => TrackTarget::RotationY,
                        TargetKind::RotateZ => TrackTarget::RotationZ,
                        _ => TrackTarget::Rotation,
                    };
                    let mut track = KeyframeTrack::new(InterpolationMode::Linear);
                    for (&time, &angle) in times.iter().zip(outputs.iter()) {
                        track.push(time * inv_duration, angle.to_radians());
                    }
                    anim_node.tracks.push(Track {
                        target,
                        data: TrackData::Scalar(track),
                    });
                }
            }

            TargetKind::Translate | TargetKind::Scale => {
                if components != 3 {
                    return Err(ImportError::InvalidFormat(format!(
                        "{} track should have 3 components",
                        if channel.target == TargetKind::Translate {
                            "Translation"
                        } else {
                            "Scale"
                        }
                    )));
                }
                let target = if channel.target == TargetKind::Translate {
                    TrackTarget::Position
                } else {
                    TrackTarget::Scale
                };

                let mut track = KeyframeTrack::new(InterpolationMode::Linear);
                // Default-pose key at time 0, ahead of the real keys.
                track.push(0.0, Vec3::ZERO);
                for (i, &time) in times.iter().enumerate() {
                    let offset = i * components;
                    let Some(v) = outputs.get(offset..offset + 3) else {
                        break;
                    };
                    track.push(time * inv_duration, Vec3::new(v[0], v[1], v[2]));
                }
                anim_node.tracks.push(Track {
                    target,
                    data: TrackData::Vector(track),
                });
            }

            TargetKind::Matrix => {
                if components != 16 {
                    return Err(ImportError::InvalidFormat(
                        "Animation matrix track should have 16 components".into(),
                    ));
                }

                let mut rot_track: Option<KeyframeTrack<Quat>> = None;
                let mut pos_track: Option<KeyframeTrack<Vec3>> = None;

                for (i, &time) in times.iter().enumerate() {
                    let offset = i * 16;
                    let Some(values) = outputs.get(offset..offset + 16) else {
                        break;
                    };
                    let mat = node_matrix_inv * mat4_from_row_major(values);
                    let time = time * inv_duration;

                    let quat = Quat::from_mat4(&mat);
                    if quat != Quat::IDENTITY {
                        rot_track
                            .get_or_insert_with(|| KeyframeTrack::new(InterpolationMode::Linear))
                            .push(time, quat);
                    }

                    let translation = Vec3::new(mat.w_axis.x, mat.w_axis.y, mat.w_axis.z);
                    if translation.length_squared() != 0.0 {
                        pos_track
                            .get_or_insert_with(|| KeyframeTrack::new(InterpolationMode::Linear))
                            .push(time, translation);
                    }

                    // The scale part is intentionally not extracted.
                }

                if let Some(track) = rot_track {
                    anim_node.tracks.push(Track {
                        target: TrackTarget::Rotation,
                        data: TrackData::Quaternion(track),
                    });
                }
                if let Some(track) = pos_track {
                    anim_node.tracks.push(Track {
                        target: TrackTarget::Position,
                        data: TrackData::Vector(track),
                    });
                }
            }

            // Classified, but no synthesis rule exists for raw source and
            // generic parameter targets.
            TargetKind::Source
            | TargetKind::Generic
            | TargetKind::GenericX
            | TargetKind::GenericY
            | TargetKind::GenericZ => {}
        }
        Ok(())
    }

    fn generate_bezier(
        &self,
        channel: &AnimChannel,
        times: &[f32],
        outputs: &[f32],
        inv_duration: f32,
        anim_node: &mut AnimationNode,
    ) -> Result<()> {
        let components = channel.component_count;

        match channel.target {
            TargetKind::Rotate
            | TargetKind::RotateX
            | TargetKind::RotateY
            | TargetKind::RotateZ => {
                // Bezier rotation is one channel per axis.
                if components != 1 && components != 3 {
                    return Err(ImportError::InvalidFormat(
                        "Rotation track should have 1 or 3 components".into(),
                    ));
                }
                if components == 3 {
                    return Err(ImportError::Unsupported(
                        "Multi-component Bezier rotation samplers".into(),
                    ));
                }

                let left = channel
                    .left_tangent
                    .as_ref()
                    .and_then(|id| self.sources.get(id));
                let right = channel
                    .right_tangent
                    .as_ref()
                    .and_then(|id| self.sources.get(id));
                let (Some(left), Some(right)) = (left, right) else {
                    return Err(ImportError::InvalidFormat(
                        "Bezier rotation channel without tangent sources".into(),
                    ));
                };

                let target = match channel.target {
                    TargetKind::RotateX => TrackTarget::RotationX,
                    TargetKind::RotateY => TrackTarget::RotationY,
                    TargetKind::RotateZ => TrackTarget::RotationZ,
                    _ => TrackTarget::Rotation,
                };

                let mut keys = KeyframeTrack::new(InterpolationMode::Bezier);
                for (i, &time) in times.iter().enumerate() {
                    let Some(&angle) = outputs.get(i) else { break };
                    let (Some(l), Some(r)) = (
                        left.get(i * 2..i * 2 + 2),
                        right.get(i * 2..i * 2 + 2),
                    ) else {
                        break;
                    };
                    // Angle-valued tangents arrive in degrees.
                    keys.push_with_tangents(
                        time * inv_duration,
                        angle.to_radians(),
                        TangentPair {
                            left: Vec2::new(l[0].to_radians(), l[1].to_radians()),
                            right: Vec2::new(r[0].to_radians(), r[1].to_radians()),
                        },
                    );
                }

                let mut track = Track {
                    target,
                    data: TrackData::Scalar(keys),
                };
                // The curve is only valid once fully populated.
                track.finalize();
                anim_node.tracks.push(track);
            }

            TargetKind::Translate | TargetKind::Scale => {
                if components != 3 {
                    return Err(ImportError::InvalidFormat(format!(
                        "{} track should have 3 components",
                        if channel.target == TargetKind::Translate {
                            "Translation"
                        } else {
                            "Scale"
                        }
                    )));
                }
                let target = if channel.target == TargetKind::Translate {
                    TrackTarget::Position
                } else {
                    TrackTarget::Scale
                };

                // No tangent data survives for vector targets; the track
                // samples linearly between its keys.
                let mut track = KeyframeTrack::new(InterpolationMode::Bezier);
                for (i, &time) in times.iter().enumerate() {
                    let offset = i * components;
                    let Some(v) = outputs.get(offset..offset + 3) else {
                        break;
                    };
                    track.push(time * inv_duration, Vec3::new(v[0], v[1], v[2]));
                }
                anim_node.tracks.push(Track {
                    target,
                    data: TrackData::Vector(track),
                });
            }

            TargetKind::Matrix
            | TargetKind::Source
            | TargetKind::Generic
            | TargetKind::GenericX
            | TargetKind::GenericY
            | TargetKind::GenericZ => {}
        }
        Ok(())
    }
}
