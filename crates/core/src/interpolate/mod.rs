use std::f32::consts::PI;

use serde::{Deserialize, Serialize};

use crate::{
    skeleton::{Articulation, Limb, Point, Pose, JOINT_COUNT},
    PldError, Result,
};

/// Easing curve applied to the local time of a keyframe segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    Linear,
    /// `3t² − 2t³`
    #[default]
    Smoothstep,
    /// `(1 − cos(tπ)) / 2`
    Cosine,
}

impl Easing {
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::Smoothstep => t * t * (3.0 - 2.0 * t),
            Easing::Cosine => (1.0 - (t * PI).cos()) * 0.5,
        }
    }
}

/// Values that can be mixed along a keyframe segment.
pub trait Blend: Clone {
    fn blend(&self, other: &Self, t: f32) -> Self;
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

impl Blend for Pose {
    /// Interpolates every coordinate independently.
    fn blend(&self, other: &Self, t: f32) -> Self {
        let mut points = [Point::ZERO; JOINT_COUNT];
        for (out, (a, b)) in points
            .iter_mut()
            .zip(self.points().iter().zip(other.points().iter()))
        {
            *out = a.lerp(*b, t);
        }
        Pose::from_points(points)
    }
}

impl Blend for Limb {
    fn blend(&self, other: &Self, t: f32) -> Self {
        Limb::new(lerp(self.upper, other.upper, t), lerp(self.lower, other.lower, t))
    }
}

impl Blend for Articulation {
    /// Interpolates joint angles, so limb segments keep their length once
    /// the result goes through forward kinematics.
    fn blend(&self, other: &Self, t: f32) -> Self {
        Articulation {
            trunk: lerp(self.trunk, other.trunk, t),
            neck: lerp(self.neck, other.neck, t),
            right_arm: self.right_arm.blend(&other.right_arm, t),
            left_arm: self.left_arm.blend(&other.left_arm, t),
            right_leg: self.right_leg.blend(&other.right_leg, t),
            left_leg: self.left_leg.blend(&other.left_leg, t),
            rotation: lerp(self.rotation, other.rotation, t),
            lateral: lerp(self.lateral, other.lateral, t),
            advance: lerp(self.advance, other.advance, t),
            lift: lerp(self.lift, other.lift, t),
        }
    }
}

/// A value pinned to a fraction of an action's duration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Keyframe<T> {
    pub at: f32,
    pub value: T,
}

/// Ordered keyframes with cumulative timing fractions from 0 to 1.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Keyframes<T> {
    frames: Vec<Keyframe<T>>,
    easing: Easing,
}

impl<T: Blend> Keyframes<T> {
    /// Validates the timing contract: at least two frames, the first at 0,
    /// the last at 1 and strictly increasing in between.
    pub fn new(frames: Vec<(f32, T)>, easing: Easing) -> Result<Self> {
        if frames.len() < 2 {
            return Err(PldError::InvalidKeyframes("at least two keyframes are required"));
        }
        if frames.iter().any(|(at, _)| !at.is_finite()) {
            return Err(PldError::InvalidKeyframes("keyframe fractions must be finite"));
        }
        if frames[0].0 != 0.0 {
            return Err(PldError::InvalidKeyframes("first keyframe must sit at 0"));
        }
        if frames[frames.len() - 1].0 != 1.0 {
            return Err(PldError::InvalidKeyframes("last keyframe must sit at 1"));
        }
        if frames.windows(2).any(|pair| pair[1].0 <= pair[0].0) {
            return Err(PldError::InvalidKeyframes(
                "keyframe fractions must strictly increase",
            ));
        }

        Ok(Self {
            frames: frames
                .into_iter()
                .map(|(at, value)| Keyframe { at, value })
                .collect(),
            easing,
        })
    }

    pub fn frames(&self) -> &[Keyframe<T>] {
        &self.frames
    }

    pub fn easing(&self) -> Easing {
        self.easing
    }

    pub fn first(&self) -> &T {
        &self.frames[0].value
    }

    pub fn last(&self) -> &T {
        &self.frames[self.frames.len() - 1].value
    }

    /// Value at global phase `p`. Outside `[0, 1]` the result is clamped to
    /// the first or last keyframe; with `cyclic` the phase wraps instead.
    pub fn sample(&self, p: f32, cyclic: bool) -> T {
        if p.is_nan() {
            return self.first().clone();
        }
        let p = if cyclic {
            let wrapped = p.rem_euclid(1.0);
            if wrapped >= 1.0 {
                0.0
            } else {
                wrapped
            }
        } else {
            p
        };

        if p <= 0.0 {
            return self.first().clone();
        }
        if p >= 1.0 {
            return self.last().clone();
        }

        let index = self
            .frames
            .windows(2)
            .position(|pair| p < pair[1].at)
            .unwrap_or(self.frames.len() - 2);
        let from = &self.frames[index];
        let to = &self.frames[index + 1];
        let local = (p - from.at) / (to.at - from.at);
        from.value.blend(&to.value, self.easing.apply(local))
    }

    /// Applies `f` to every keyframe value, keeping the timing.
    pub fn map<U, F>(&self, mut f: F) -> Keyframes<U>
    where
        U: Blend,
        F: FnMut(&T) -> U,
    {
        Keyframes {
            frames: self
                .frames
                .iter()
                .map(|frame| Keyframe {
                    at: frame.at,
                    value: f(&frame.value),
                })
                .collect(),
            easing: self.easing,
        }
    }

    /// Plays the sequence forward in the first half and backward in the
    /// second, so the result starts and ends on the same keyframe.
    pub fn there_and_back(&self) -> Keyframes<T> {
        let forward = self.frames.iter().map(|frame| Keyframe {
            at: frame.at * 0.5,
            value: frame.value.clone(),
        });
        let backward = self.frames.iter().rev().skip(1).map(|frame| Keyframe {
            at: 1.0 - frame.at * 0.5,
            value: frame.value.clone(),
        });

        Keyframes {
            frames: forward.chain(backward).collect(),
            easing: self.easing,
        }
    }
}
