use std::ops::{Add, Mul, Sub};

use serde::{Deserialize, Serialize};

use crate::{PldError, Result};

/// Number of points in every pose produced by the crate.
pub const JOINT_COUNT: usize = 15;

/// Fraction of the lateral body width that stays visible when the figure is
/// seen from the side. Keeps near and far limbs apart on screen.
const DEPTH_SEPARATION: f32 = 0.3;

/// Resting abduction of each arm in the frontal view, in radians.
const REST_ARM_SPREAD: f32 = 0.08;

/// Segments shorter than this cannot define a direction.
const MIN_SEGMENT: f32 = 1e-4;

/// The fifteen tracked points, in their fixed output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Joint {
    Head,
    Neck,
    RightShoulder,
    RightElbow,
    RightWrist,
    LeftShoulder,
    LeftElbow,
    LeftWrist,
    Torso,
    RightHip,
    RightKnee,
    RightAnkle,
    LeftHip,
    LeftKnee,
    LeftAnkle,
}

impl Joint {
    pub const ALL: [Joint; JOINT_COUNT] = [
        Joint::Head,
        Joint::Neck,
        Joint::RightShoulder,
        Joint::RightElbow,
        Joint::RightWrist,
        Joint::LeftShoulder,
        Joint::LeftElbow,
        Joint::LeftWrist,
        Joint::Torso,
        Joint::RightHip,
        Joint::RightKnee,
        Joint::RightAnkle,
        Joint::LeftHip,
        Joint::LeftKnee,
        Joint::LeftAnkle,
    ];

    /// Position of the joint in [`Pose`] output, 0..=14.
    pub fn id(self) -> usize {
        self as usize
    }

    pub fn from_id(id: usize) -> Option<Joint> {
        Self::ALL.get(id).copied()
    }
}

/// The two-segment limbs whose segment lengths must never change.
pub const LIMB_CHAINS: [(&str, [Joint; 3]); 4] = [
    (
        "right_arm",
        [Joint::RightShoulder, Joint::RightElbow, Joint::RightWrist],
    ),
    (
        "left_arm",
        [Joint::LeftShoulder, Joint::LeftElbow, Joint::LeftWrist],
    ),
    ("right_leg", [Joint::RightHip, Joint::RightKnee, Joint::RightAnkle]),
    ("left_leg", [Joint::LeftHip, Joint::LeftKnee, Joint::LeftAnkle]),
];

const FRONTAL_NAMES: [&str; JOINT_COUNT] = [
    "head",
    "neck",
    "right_shoulder",
    "right_elbow",
    "right_wrist",
    "left_shoulder",
    "left_elbow",
    "left_wrist",
    "torso",
    "right_hip",
    "right_knee",
    "right_ankle",
    "left_hip",
    "left_knee",
    "left_ankle",
];

const SAGITTAL_NAMES: [&str; JOINT_COUNT] = [
    "head",
    "neck",
    "near_shoulder",
    "near_elbow",
    "near_wrist",
    "far_shoulder",
    "far_elbow",
    "far_wrist",
    "torso",
    "near_hip",
    "near_knee",
    "near_ankle",
    "far_hip",
    "far_knee",
    "far_ankle",
];

/// Viewing plane of an action family. The joint order is the same for both
/// families; only the labels and the projection of lateral offsets differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    /// Figure faces the viewer; its right side appears on screen left.
    Frontal,
    /// Figure faces +x; its right side is the near side.
    Sagittal,
}

impl View {
    pub fn joint_names(self) -> [&'static str; JOINT_COUNT] {
        match self {
            View::Frontal => FRONTAL_NAMES,
            View::Sagittal => SAGITTAL_NAMES,
        }
    }

    /// Screen-x of a unit lateral offset toward the figure's right side.
    fn right_axis(self) -> f32 {
        match self {
            View::Frontal => -1.0,
            View::Sagittal => DEPTH_SEPARATION,
        }
    }
}

/// 2D point in body space: metres, y up, origin at the rest-pose hip centre.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Unit vector at `angle` radians from straight down, counter-clockwise
    /// positive (toward +x).
    pub fn hanging(angle: f32) -> Self {
        Self::new(angle.sin(), -angle.cos())
    }

    pub fn distance(self, other: Point) -> f32 {
        (self - other).length()
    }

    pub fn length(self) -> f32 {
        self.x.hypot(self.y)
    }

    /// Counter-clockwise rotation about the origin.
    pub fn rotated(self, angle: f32) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self::new(self.x * cos - self.y * sin, self.x * sin + self.y * cos)
    }

    pub fn lerp(self, other: Point, t: f32) -> Self {
        self + (other - self) * t
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Point {
    type Output = Point;

    fn mul(self, rhs: f32) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

/// Positions of all fifteen joints at one instant, indexed by [`Joint::id`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    points: [Point; JOINT_COUNT],
}

impl Pose {
    pub fn from_points(points: [Point; JOINT_COUNT]) -> Self {
        Self { points }
    }

    pub fn get(&self, joint: Joint) -> Point {
        self.points[joint.id()]
    }

    pub fn points(&self) -> &[Point; JOINT_COUNT] {
        &self.points
    }

    pub fn iter(&self) -> impl Iterator<Item = (Joint, Point)> + '_ {
        Joint::ALL.iter().map(move |joint| (*joint, self.get(*joint)))
    }

    /// Coordinates as plain pairs, in joint order.
    pub fn to_pairs(&self) -> Vec<(f32, f32)> {
        self.points.iter().map(|p| (p.x, p.y)).collect()
    }

    pub fn translated(&self, offset: Point) -> Self {
        let mut points = self.points;
        for point in &mut points {
            *point = *point + offset;
        }
        Self { points }
    }

    /// Largest per-joint distance between two poses.
    pub fn max_deviation(&self, other: &Pose) -> f32 {
        self.points
            .iter()
            .zip(other.points.iter())
            .map(|(a, b)| a.distance(*b))
            .fold(0.0, f32::max)
    }

    pub fn lowest(&self) -> f32 {
        self.points.iter().map(|p| p.y).fold(f32::INFINITY, f32::min)
    }

    /// Lengths of the upper and lower segment of the named chain.
    pub fn segment_lengths(&self, chain: [Joint; 3]) -> (f32, f32) {
        let [root, mid, end] = chain.map(|joint| self.get(joint));
        (root.distance(mid), mid.distance(end))
    }
}

/// Segment lengths and widths of the figure, in metres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BodyDimensions {
    pub head: f32,
    pub spine: f32,
    pub upper_arm: f32,
    pub forearm: f32,
    pub thigh: f32,
    pub shin: f32,
    pub shoulder_width: f32,
    pub hip_width: f32,
}

impl Default for BodyDimensions {
    fn default() -> Self {
        Self {
            head: 0.25,
            spine: 0.52,
            upper_arm: 0.30,
            forearm: 0.27,
            thigh: 0.45,
            shin: 0.45,
            shoulder_width: 0.38,
            hip_width: 0.28,
        }
    }
}

impl BodyDimensions {
    /// Rejects segments that cannot carry a direction.
    pub fn validate(&self) -> Result<()> {
        let segments = [
            ("head", self.head),
            ("spine", self.spine),
            ("upper_arm", self.upper_arm),
            ("forearm", self.forearm),
            ("thigh", self.thigh),
            ("shin", self.shin),
        ];
        for (segment, length) in segments {
            if !length.is_finite() || length < MIN_SEGMENT {
                return Err(PldError::DegenerateChain { segment, length });
            }
        }

        let widths = [
            ("shoulder_width", self.shoulder_width),
            ("hip_width", self.hip_width),
        ];
        for (segment, length) in widths {
            if !length.is_finite() || length < 0.0 {
                return Err(PldError::DegenerateChain { segment, length });
            }
        }
        Ok(())
    }

    pub fn leg_length(&self) -> f32 {
        self.thigh + self.shin
    }

    pub fn arm_length(&self) -> f32 {
        self.upper_arm + self.forearm
    }

    /// Standing height from ankle to head point.
    pub fn height(&self) -> f32 {
        self.leg_length() + self.spine + self.head
    }
}

/// Angles of a two-segment limb. `upper` is measured from straight down in
/// the image plane (counter-clockwise positive); `lower` is the bend of the
/// distal segment relative to the upper one.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Limb {
    pub upper: f32,
    pub lower: f32,
}

impl Limb {
    pub const fn new(upper: f32, lower: f32) -> Self {
        Self { upper, lower }
    }
}

/// Full joint-angle description of a body configuration. Turned into a
/// [`Pose`] by [`Skeleton::solve`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Articulation {
    /// Forward lean of the spine from vertical.
    pub trunk: f32,
    /// Forward tilt of the head relative to the spine.
    pub neck: f32,
    pub right_arm: Limb,
    pub left_arm: Limb,
    pub right_leg: Limb,
    pub left_leg: Limb,
    /// Whole-body pitch about the hip centre, clockwise (forward) positive.
    pub rotation: f32,
    /// Scale on lateral offsets; 1.0 faces the view, -1.0 faces away.
    pub lateral: f32,
    /// Horizontal displacement of the whole figure.
    pub advance: f32,
    /// Height above the ground contact.
    pub lift: f32,
}

impl Articulation {
    /// Relaxed upright stance for the given view.
    pub fn standing(view: View) -> Self {
        let spread = match view {
            View::Frontal => REST_ARM_SPREAD,
            View::Sagittal => 0.0,
        };
        Self {
            trunk: 0.0,
            neck: 0.0,
            right_arm: Limb::new(-spread, 0.0),
            left_arm: Limb::new(spread, 0.0),
            right_leg: Limb::default(),
            left_leg: Limb::default(),
            rotation: 0.0,
            lateral: 1.0,
            advance: 0.0,
            lift: 0.0,
        }
    }
}

/// Body dimensions bound to a viewing plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Skeleton {
    dims: BodyDimensions,
    view: View,
}

impl Skeleton {
    pub fn new(dims: BodyDimensions, view: View) -> Result<Self> {
        dims.validate()?;
        Ok(Self { dims, view })
    }

    /// Default anthropometry, which is always valid.
    pub fn standard(view: View) -> Self {
        Self {
            dims: BodyDimensions::default(),
            view,
        }
    }

    pub fn dimensions(&self) -> &BodyDimensions {
        &self.dims
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn joint_names(&self) -> [&'static str; JOINT_COUNT] {
        self.view.joint_names()
    }

    /// Same view with different dimensions.
    pub fn with_dimensions(&self, dims: BodyDimensions) -> Result<Self> {
        Self::new(dims, self.view)
    }

    pub fn rest_articulation(&self) -> Articulation {
        Articulation::standing(self.view)
    }

    pub fn rest_pose(&self) -> Pose {
        self.solve(&self.rest_articulation())
    }

    /// Height of the ground line in body space.
    pub fn ground(&self) -> f32 {
        self.place(&self.rest_articulation()).lowest()
    }

    /// Forward kinematics followed by ground anchoring: the figure is shifted
    /// so its lowest joint rests on [`Skeleton::ground`], then lifted and
    /// advanced by the articulation's root offsets.
    pub fn solve(&self, articulation: &Articulation) -> Pose {
        let placed = self.place(articulation);
        let settle = self.ground() - placed.lowest();
        placed.translated(Point::new(
            articulation.advance,
            settle + articulation.lift,
        ))
    }

    /// Forward kinematics about the hip centre, without anchoring.
    fn place(&self, a: &Articulation) -> Pose {
        let d = &self.dims;
        let right = self.view.right_axis() * a.lateral;

        let root = Point::ZERO;
        let (neck, head, shoulder_offset) = match self.view {
            View::Frontal => {
                let neck = root + Point::new(0.0, d.spine * a.trunk.cos());
                let head = neck + Point::new(0.0, d.head * (a.trunk + a.neck).cos());
                (neck, head, Point::new(right * d.shoulder_width * 0.5, 0.0))
            }
            View::Sagittal => {
                let spine_dir = Point::new(a.trunk.sin(), a.trunk.cos());
                let head_dir = Point::new((a.trunk + a.neck).sin(), (a.trunk + a.neck).cos());
                let neck = root + spine_dir * d.spine;
                let head = neck + head_dir * d.head;
                let offset = Point::new(right * d.shoulder_width * 0.5, 0.0).rotated(-a.trunk);
                (neck, head, offset)
            }
        };
        let hip_offset = Point::new(right * d.hip_width * 0.5, 0.0);

        let right_shoulder = neck + shoulder_offset;
        let left_shoulder = neck - shoulder_offset;
        let right_hip = root + hip_offset;
        let left_hip = root - hip_offset;

        let (right_elbow, right_wrist) = chain(right_shoulder, a.right_arm, d.upper_arm, d.forearm);
        let (left_elbow, left_wrist) = chain(left_shoulder, a.left_arm, d.upper_arm, d.forearm);
        let (right_knee, right_ankle) = chain(right_hip, a.right_leg, d.thigh, d.shin);
        let (left_knee, left_ankle) = chain(left_hip, a.left_leg, d.thigh, d.shin);

        let mut points = [
            head,
            neck,
            right_shoulder,
            right_elbow,
            right_wrist,
            left_shoulder,
            left_elbow,
            left_wrist,
            root,
            right_hip,
            right_knee,
            right_ankle,
            left_hip,
            left_knee,
            left_ankle,
        ];
        if a.rotation != 0.0 {
            for point in &mut points {
                *point = (*point - root).rotated(-a.rotation) + root;
            }
        }
        Pose::from_points(points)
    }
}

/// Child = parent + L·direction(angle), applied twice.
fn chain(base: Point, limb: Limb, upper: f32, lower: f32) -> (Point, Point) {
    let mid = base + Point::hanging(limb.upper) * upper;
    let end = mid + Point::hanging(limb.upper + limb.lower) * lower;
    (mid, end)
}
