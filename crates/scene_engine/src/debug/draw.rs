//! Debug drawing primitives
//!
//! The actual renderer lives outside this crate. Render and debug-render hooks
//! talk to it through [`RenderTarget`]; [`DrawList`] is an in-memory target
//! that simply records what was drawn.

use crate::foundation::math::{Rect, Vec2};
use serde::{Serialize, Deserialize};

/// RGBA color, 8 bits per channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    /// Red
    pub r: u8,
    /// Green
    pub g: u8,
    /// Blue
    pub b: u8,
    /// Alpha
    pub a: u8,
}

impl Color {
    /// Create a color from its channels
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque white
    pub const WHITE: Self = Self::rgba(255, 255, 255, 255);
}

/// Drawing surface provided by the renderer
pub trait RenderTarget {
    /// Outline of a rectangle
    fn draw_hollow_rect(&mut self, rect: Rect, color: Color);

    /// Closed polygon outline; `points` are relative to `origin`
    fn draw_polygon(&mut self, origin: Vec2, points: &[Vec2], color: Color);

    /// Circle outline
    fn draw_circle(&mut self, center: Vec2, radius: f32, color: Color);

    /// Single point
    fn draw_point(&mut self, position: Vec2, color: Color);

    /// Opaque sprite-like quad; the default forwards to an outline
    fn draw_quad(&mut self, rect: Rect, color: Color) {
        self.draw_hollow_rect(rect, color);
    }
}

/// Palette for collider debug drawing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugColors {
    /// Collider bounding rectangle
    pub collider_bounds: Color,
    /// Collider shape outline
    pub collider_edge: Color,
    /// Owning entity position
    pub collider_position: Color,
    /// Shape center
    pub collider_center: Color,
}

impl Default for DebugColors {
    fn default() -> Self {
        Self {
            collider_bounds: Color::rgba(255, 255, 255, 76),
            collider_edge: Color::rgba(139, 0, 0, 255),
            collider_position: Color::rgba(255, 255, 0, 255),
            collider_center: Color::rgba(255, 0, 0, 153),
        }
    }
}

/// A recorded draw call
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// [`RenderTarget::draw_hollow_rect`]
    HollowRect(Rect, Color),
    /// [`RenderTarget::draw_quad`]
    Quad(Rect, Color),
    /// [`RenderTarget::draw_polygon`], points already in world space
    Polygon(Vec<Vec2>, Color),
    /// [`RenderTarget::draw_circle`]
    Circle(Vec2, f32, Color),
    /// [`RenderTarget::draw_point`]
    Point(Vec2, Color),
}

/// Render target that records every call
#[derive(Debug, Default)]
pub struct DrawList {
    /// Calls in submission order
    pub commands: Vec<DrawCommand>,
}

impl DrawList {
    /// Create an empty list
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget all recorded calls
    pub fn clear(&mut self) {
        self.commands.clear();
    }
}

impl RenderTarget for DrawList {
    fn draw_hollow_rect(&mut self, rect: Rect, color: Color) {
        self.commands.push(DrawCommand::HollowRect(rect, color));
    }

    fn draw_polygon(&mut self, origin: Vec2, points: &[Vec2], color: Color) {
        self.commands
            .push(DrawCommand::Polygon(points.iter().map(|p| origin + p).collect(), color));
    }

    fn draw_circle(&mut self, center: Vec2, radius: f32, color: Color) {
        self.commands.push(DrawCommand::Circle(center, radius, color));
    }

    fn draw_point(&mut self, position: Vec2, color: Color) {
        self.commands.push(DrawCommand::Point(position, color));
    }

    fn draw_quad(&mut self, rect: Rect, color: Color) {
        self.commands.push(DrawCommand::Quad(rect, color));
    }
}
