//! Shape generation for 2D primitives
//!
//! All shapes are emitted as triangle lists in view coordinates (origin top
//! left, y down).

use glam::Vec2;
use std::f32::consts::PI;

use super::vertex::Vertex;

/// Axis-aligned filled rectangle
pub fn rect(pos: Vec2, size: Vec2, color: [f32; 4]) -> [Vertex; 6] {
    quad([pos, pos + Vec2::new(size.x, 0.0), pos + size, pos + Vec2::new(0.0, size.y)], color)
}

/// Filled quad from four corners in winding order
pub fn quad(corners: [Vec2; 4], color: [f32; 4]) -> [Vertex; 6] {
    let [a, b, c, d] = corners;
    [
        Vertex::new(a.x, a.y, color),
        Vertex::new(b.x, b.y, color),
        Vertex::new(c.x, c.y, color),
        Vertex::new(a.x, a.y, color),
        Vertex::new(c.x, c.y, color),
        Vertex::new(d.x, d.y, color),
    ]
}

pub fn triangle(a: Vec2, b: Vec2, c: Vec2, color: [f32; 4]) -> [Vertex; 3] {
    [
        Vertex::new(a.x, a.y, color),
        Vertex::new(b.x, b.y, color),
        Vertex::new(c.x, c.y, color),
    ]
}

/// Rectangle shaded from `top` to `bottom`
pub fn vertical_gradient(pos: Vec2, size: Vec2, top: [f32; 4], bottom: [f32; 4]) -> [Vertex; 6] {
    let (x0, y0) = (pos.x, pos.y);
    let (x1, y1) = (pos.x + size.x, pos.y + size.y);
    [
        Vertex::new(x0, y0, top),
        Vertex::new(x1, y0, top),
        Vertex::new(x1, y1, bottom),
        Vertex::new(x0, y0, top),
        Vertex::new(x1, y1, bottom),
        Vertex::new(x0, y1, bottom),
    ]
}

/// Generate vertices for a filled circle
pub fn circle(center: Vec2, radius: f32, color: [f32; 4], segments: u32) -> Vec<Vertex> {
    let mut vertices = Vec::with_capacity((segments * 3) as usize);

    for i in 0..segments {
        let theta1 = (i as f32 / segments as f32) * 2.0 * PI;
        let theta2 = ((i + 1) as f32 / segments as f32) * 2.0 * PI;

        // Triangle from center to edge
        vertices.push(Vertex::new(center.x, center.y, color));
        vertices.push(Vertex::new(
            center.x + radius * theta1.cos(),
            center.y + radius * theta1.sin(),
            color,
        ));
        vertices.push(Vertex::new(
            center.x + radius * theta2.cos(),
            center.y + radius * theta2.sin(),
            color,
        ));
    }

    vertices
}

/// Thick arc band from `theta_start` to `theta_end` (radians, y down)
pub fn arc_band(
    center: Vec2,
    radius: f32,
    thickness: f32,
    (theta_start, theta_end): (f32, f32),
    color: [f32; 4],
    segments: u32,
) -> Vec<Vertex> {
    let segments = segments.max(1);
    let inner_r = radius - thickness / 2.0;
    let outer_r = radius + thickness / 2.0;
    let span = theta_end - theta_start;
    let point = |r: f32, theta: f32| center + Vec2::new(r * theta.cos(), r * theta.sin());

    let mut vertices = Vec::with_capacity((segments * 6) as usize);
    for i in 0..segments {
        let theta1 = theta_start + span * (i as f32 / segments as f32);
        let theta2 = theta_start + span * ((i + 1) as f32 / segments as f32);
        vertices.extend(quad(
            [
                point(inner_r, theta1),
                point(outer_r, theta1),
                point(outer_r, theta2),
                point(inner_r, theta2),
            ],
            color,
        ));
    }
    vertices
}

/// Filled band under a polyline, closed down to `floor_y`
pub fn band_below(points: &[Vec2], floor_y: f32, color: [f32; 4]) -> Vec<Vertex> {
    let mut vertices = Vec::with_capacity(points.len().saturating_sub(1) * 6);
    for pair in points.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        vertices.extend(quad(
            [a, b, Vec2::new(b.x, floor_y), Vec2::new(a.x, floor_y)],
            color,
        ));
    }
    vertices
}
