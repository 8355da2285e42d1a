use glam::{Quat, Vec2, Vec3};

use crate::animation::values::Interpolatable;

/// Curve interpolation mode, from the sampler's interpolation source.
///
/// All entries of one sampler's mode source must agree; a mixed sampler is
/// rejected at channel resolution. `Tcb` is declared but never synthesized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InterpolationMode {
    #[default]
    Linear,
    Bezier,
    Tcb,
}

/// One key: a normalized time in `[0, 1]` and a typed value.
#[derive(Debug, Clone, Copy)]
pub struct Keyframe<T> {
    pub time: f32,
    pub value: T,
}

/// 2D Bezier control data for one key: the incoming and outgoing tangent
/// points on the (time, value) plane.
#[derive(Debug, Clone, Copy, Default)]
pub struct TangentPair {
    pub left: Vec2,
    pub right: Vec2,
}

/// Per-segment cubic Bezier evaluator over the (time, value) plane.
///
/// Control points: the bracketing keys plus the left key's outgoing and
/// the right key's incoming tangent. The curve parameter is recovered from
/// the time axis by Newton iteration.
#[derive(Debug, Clone, Copy)]
struct BezierEvaluator {
    p0: Vec2,
    p1: Vec2,
    p2: Vec2,
    p3: Vec2,
}

impl BezierEvaluator {
    fn bezier(a: f32, b: f32, c: f32, d: f32, s: f32) -> f32 {
        let u = 1.0 - s;
        u * u * u * a + 3.0 * u * u * s * b + 3.0 * u * s * s * c + s * s * s * d
    }

    fn bezier_derivative(a: f32, b: f32, c: f32, d: f32, s: f32) -> f32 {
        let u = 1.0 - s;
        3.0 * u * u * (b - a) + 6.0 * u * s * (c - b) + 3.0 * s * s * (d - c)
    }

    /// Evaluates the curve value at the given time.
    fn evaluate(&self, time: f32) -> f32 {
        let span = self.p3.x - self.p0.x;
        if span <= f32::EPSILON {
            return self.p0.y;
        }

        // Initial guess from the linear parametrization, refined on x(s).
        let mut s = ((time - self.p0.x) / span).clamp(0.0, 1.0);
        for _ in 0..8 {
            let x = Self::bezier(self.p0.x, self.p1.x, self.p2.x, self.p3.x, s);
            let dx = Self::bezier_derivative(self.p0.x, self.p1.x, self.p2.x, self.p3.x, s);
            if dx.abs() <= f32::EPSILON {
                break;
            }
            s = (s - (x - time) / dx).clamp(0.0, 1.0);
        }

        Self::bezier(self.p0.y, self.p1.y, self.p2.y, self.p3.y, s)
    }
}

/// An ordered-as-inserted sequence of typed keyframes.
///
/// Keys are appended during synthesis; for Bezier tracks the per-segment
/// evaluators must be initialized once all keys are in
/// ([`KeyframeTrack::init_evaluators`]); the curve is only valid fully
/// populated.
#[derive(Debug, Clone, Default)]
pub struct KeyframeTrack<T> {
    pub keys: Vec<Keyframe<T>>,
    /// Parallel to `keys` when the source supplied tangent pairs; empty
    /// otherwise (Bezier tracks without tangents sample linearly).
    pub tangents: Vec<TangentPair>,
    pub interpolation: InterpolationMode,
    evaluators: Vec<BezierEvaluator>,
}

impl<T: Interpolatable> KeyframeTrack<T> {
    #[must_use]
    pub fn new(interpolation: InterpolationMode) -> Self {
        Self {
            keys: Vec::new(),
            tangents: Vec::new(),
            interpolation,
            evaluators: Vec::new(),
        }
    }

    pub fn push(&mut self, time: f32, value: T) {
        self.keys.push(Keyframe { time, value });
    }

    pub fn push_with_tangents(&mut self, time: f32, value: T, tangents: TangentPair) {
        self.keys.push(Keyframe { time, value });
        self.tangents.push(tangents);
    }

    /// Index of the key at exactly `time`, if one exists. Bit-exact time
    /// comparison, first match wins.
    #[must_use]
    pub fn key_index_at(&self, time: f32) -> Option<usize> {
        self.keys.iter().position(|k| k.time == time)
    }

    /// Samples the track at `time`, clamping outside the key range.
    /// Piecewise linear over insertion order; Bezier segments are handled
    /// by the scalar specialization.
    #[must_use]
    pub fn sample_linear(&self, time: f32) -> Option<T> {
        let first = self.keys.first()?;
        if self.keys.len() == 1 || time <= first.time {
            return Some(first.value);
        }

        let next = self.keys.partition_point(|k| k.time <= time).max(1);
        if next >= self.keys.len() {
            return Some(self.keys[self.keys.len() - 1].value);
        }

        let k0 = &self.keys[next - 1];
        let k1 = &self.keys[next];
        let dt = k1.time - k0.time;
        let t = if dt > 1e-6 { (time - k0.time) / dt } else { 0.0 };
        Some(T::interpolate_linear(k0.value, k1.value, t))
    }
}

impl KeyframeTrack<f32> {
    /// Builds the per-segment Bezier evaluators. Must run after the last
    /// key is appended; a no-op for tracks without tangent data.
    pub fn init_evaluators(&mut self) {
        self.evaluators.clear();
        if self.interpolation != InterpolationMode::Bezier
            || self.tangents.len() != self.keys.len()
            || self.keys.len() < 2
        {
            return;
        }

        for i in 0..self.keys.len() - 1 {
            let k0 = self.keys[i];
            let k1 = self.keys[i + 1];
            self.evaluators.push(BezierEvaluator {
                p0: Vec2::new(k0.time, k0.value),
                p1: self.tangents[i].right,
                p2: self.tangents[i + 1].left,
                p3: Vec2::new(k1.time, k1.value),
            });
        }
    }

    /// Samples the scalar track, using Bezier evaluators when initialized.
    #[must_use]
    pub fn sample(&self, time: f32) -> Option<f32> {
        if self.evaluators.is_empty() {
            return self.sample_linear(time);
        }

        let first = self.keys.first()?;
        if time <= first.time {
            return Some(first.value);
        }
        let next = self.keys.partition_point(|k| k.time <= time).max(1);
        if next >= self.keys.len() {
            return Some(self.keys[self.keys.len() - 1].value);
        }
        Some(self.evaluators.get(next - 1)?.evaluate(time))
    }
}

/// What a track drives on its scene node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackTarget {
    Position,
    Scale,
    /// Combined orientation (quaternion) track.
    Rotation,
    /// Per-axis scalar rotation, radians. Emitted in non-combined mode.
    RotationX,
    RotationY,
    RotationZ,
}

/// Typed keyframe payload of a track.
#[derive(Debug, Clone)]
pub enum TrackData {
    Vector(KeyframeTrack<Vec3>),
    Quaternion(KeyframeTrack<Quat>),
    Scalar(KeyframeTrack<f32>),
}

/// A synthesized animation track.
#[derive(Debug, Clone)]
pub struct Track {
    pub target: TrackTarget,
    pub data: TrackData,
}

impl Track {
    /// Whether this is the combined orientation track axis-split rotation
    /// channels accumulate into.
    #[inline]
    #[must_use]
    pub fn is_rotation_target(&self) -> bool {
        self.target == TrackTarget::Rotation
    }

    /// Finalizes the track after the last key: initializes Bezier
    /// evaluators where tangent data exists.
    pub fn finalize(&mut self) {
        if let TrackData::Scalar(track) = &mut self.data {
            track.init_evaluators();
        }
    }

    #[must_use]
    pub fn key_count(&self) -> usize {
        match &self.data {
            TrackData::Vector(t) => t.keys.len(),
            TrackData::Quaternion(t) => t.keys.len(),
            TrackData::Scalar(t) => t.keys.len(),
        }
    }
}
