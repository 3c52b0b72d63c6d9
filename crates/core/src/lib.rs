//! Core library for point-light display stimuli.
//!
//! A fifteen-joint figure is posed by angle-based forward kinematics, driven
//! through one of ten actions, and modulated by gender, weight and emotion.
//! Each module owns one concern (skeleton geometry, keyframe interpolation,
//! the action library, profile modulation, playback) and the crate never
//! touches a screen: hosts receive body-space coordinates and draw them
//! through a [`RenderSurface`].

pub mod analysis;
pub mod config;
pub mod error;
pub mod interpolate;
pub mod library;
pub mod modulation;
pub mod render;
pub mod skeleton;
pub mod timeline;

pub use analysis::{analyse, LimbDrift, MotionAnalyzer, MotionReport};
pub use config::{AnimationOptions, AppConfig, DisplayConfig};
pub use error::{PldError, Result};
pub use interpolate::{Blend, Easing, Keyframe, Keyframes};
pub use library::{Action, ActionKind, ActionLibrary, ActionSpec, Motion, Posture};
pub use modulation::{BodyProfile, Emotion, Gender, Weight};
pub use render::{AsciiSurface, Color, PointPainter, RenderSurface, ScreenMapping};
pub use skeleton::{
    Articulation, BodyDimensions, Joint, Limb, Point, Pose, Skeleton, View, JOINT_COUNT,
};
pub use timeline::{create_animation, Animation, AnimationClock, AnimationState, AnimationStatus};
