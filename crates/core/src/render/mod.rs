//! Presentation helpers. Nothing here feeds back into the kinematic core:
//! poses stay in body space (metres, y up) until a [`ScreenMapping`] turns
//! them into surface coordinates.

use serde::{Deserialize, Serialize};

use crate::{
    config::DisplayConfig,
    skeleton::{Point, Pose},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn luminance(self) -> f32 {
        (0.2126 * self.r as f32 + 0.7152 * self.g as f32 + 0.0722 * self.b as f32) / 255.0
    }
}

impl From<[u8; 3]> for Color {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Self::rgb(r, g, b)
    }
}

/// Drawing backend supplied by the host application.
pub trait RenderSurface {
    fn clear(&mut self, color: Color);
    fn draw_point(&mut self, x: f32, y: f32, radius: f32, color: Color);
}

/// Scale plus origin offset from body space to screen space (y down).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenMapping {
    pub scale: f32,
    pub origin: Point,
}

impl ScreenMapping {
    pub fn new(scale: f32, origin: Point) -> Self {
        Self { scale, origin }
    }

    /// Places the hip centre in the middle of the display.
    pub fn centered(display: &DisplayConfig) -> Self {
        Self::new(
            display.scale,
            Point::new(display.width as f32 * 0.5, display.height as f32 * 0.5),
        )
    }

    pub fn to_screen(&self, point: Point) -> (f32, f32) {
        (
            self.origin.x + point.x * self.scale,
            self.origin.y - point.y * self.scale,
        )
    }
}

/// Draws the fifteen dots of a pose.
#[derive(Debug, Clone, PartialEq)]
pub struct PointPainter {
    pub mapping: ScreenMapping,
    pub radius: f32,
    pub foreground: Color,
    pub background: Color,
}

impl PointPainter {
    pub fn from_config(display: &DisplayConfig) -> Self {
        Self {
            mapping: ScreenMapping::centered(display),
            radius: display.point_radius,
            foreground: display.foreground.into(),
            background: display.background.into(),
        }
    }

    pub fn paint<S: RenderSurface + ?Sized>(&self, pose: &Pose, surface: &mut S) {
        self.paint_shifted(pose, Point::ZERO, surface);
    }

    /// Paints with an extra body-space offset, e.g. accumulated travel.
    pub fn paint_shifted<S: RenderSurface + ?Sized>(
        &self,
        pose: &Pose,
        offset: Point,
        surface: &mut S,
    ) {
        surface.clear(self.background);
        for point in pose.points() {
            let (x, y) = self.mapping.to_screen(*point + offset);
            surface.draw_point(x, y, self.radius, self.foreground);
        }
    }
}

/// Character-grid surface for terminal previews.
#[derive(Debug, Clone)]
pub struct AsciiSurface {
    width: usize,
    height: usize,
    cells: Vec<char>,
}

impl AsciiSurface {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![' '; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn cell(&self, column: usize, row: usize) -> Option<char> {
        if column < self.width && row < self.height {
            Some(self.cells[row * self.width + column])
        } else {
            None
        }
    }

    pub fn render(&self) -> String {
        let mut out = String::with_capacity((self.width + 1) * self.height);
        for row in self.cells.chunks(self.width.max(1)) {
            out.extend(row.iter());
            out.push('\n');
        }
        out
    }
}

impl RenderSurface for AsciiSurface {
    fn clear(&mut self, color: Color) {
        let fill = if color.luminance() > 0.5 { '.' } else { ' ' };
        self.cells.fill(fill);
    }

    fn draw_point(&mut self, x: f32, y: f32, _radius: f32, color: Color) {
        if !x.is_finite() || !y.is_finite() || x < 0.0 || y < 0.0 {
            return;
        }
        let (column, row) = (x.round() as usize, y.round() as usize);
        if column < self.width && row < self.height {
            self.cells[row * self.width + column] = if color.luminance() > 0.5 { 'o' } else { '#' };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skeleton::{Joint, Skeleton, View, JOINT_COUNT};

    #[derive(Default)]
    struct RecordingSurface {
        cleared: Vec<Color>,
        points: Vec<(f32, f32, f32, Color)>,
    }

    impl RenderSurface for RecordingSurface {
        fn clear(&mut self, color: Color) {
            self.cleared.push(color);
        }

        fn draw_point(&mut self, x: f32, y: f32, radius: f32, color: Color) {
            self.points.push((x, y, radius, color));
        }
    }

    #[test]
    fn mapping_flips_y_and_scales() {
        let mapping = ScreenMapping::new(100.0, Point::new(400.0, 300.0));
        assert_eq!(mapping.to_screen(Point::new(0.0, 0.0)), (400.0, 300.0));
        assert_eq!(mapping.to_screen(Point::new(1.0, 1.0)), (500.0, 200.0));
    }

    #[test]
    fn painter_clears_then_draws_every_joint() {
        let painter = PointPainter::from_config(&DisplayConfig::default());
        let pose = Skeleton::standard(View::Frontal).rest_pose();
        let mut surface = RecordingSurface::default();
        painter.paint(&pose, &mut surface);

        assert_eq!(surface.cleared, vec![Color::BLACK]);
        assert_eq!(surface.points.len(), JOINT_COUNT);
        let (_, head_y, radius, color) = surface.points[Joint::Head.id()];
        let (_, ankle_y, _, _) = surface.points[Joint::LeftAnkle.id()];
        assert!(head_y < ankle_y);
        assert_eq!(radius, 5.0);
        assert_eq!(color, Color::WHITE);
    }

    #[test]
    fn ascii_surface_plots_points_inside_bounds() {
        let mut surface = AsciiSurface::new(10, 4);
        surface.clear(Color::BLACK);
        surface.draw_point(2.2, 1.4, 1.0, Color::WHITE);
        surface.draw_point(-3.0, 1.0, 1.0, Color::WHITE);
        surface.draw_point(40.0, 1.0, 1.0, Color::WHITE);

        assert_eq!(surface.cell(2, 1), Some('o'));
        let text = surface.render();
        assert_eq!(text.lines().count(), 4);
        assert_eq!(text.matches('o').count(), 1);
    }
}
