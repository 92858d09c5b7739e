use egui::{Color32, Painter, Pos2, Shape, Stroke};

use crate::network::link::{Link, Rgb};

const DASH_LENGTH: f32 = 6.0;
const GAP_LENGTH: f32 = 4.0;
/// Extra pointer slack around thin links.
const HIT_SLACK: f32 = 3.0;

impl From<Rgb> for Color32 {
    fn from(Rgb(r, g, b): Rgb) -> Self {
        Color32::from_rgb(r, g, b)
    }
}

pub fn link_stroke(link: &Link) -> Stroke {
    Stroke::new(link.width, Color32::from(link.color))
}

/// Draw one link between two canvas points. Neighbour-cell measurements are
/// dashed, serving-cell links solid.
pub fn paint_link(painter: &Painter, a: Pos2, b: Pos2, link: &Link) {
    let stroke = link_stroke(link);
    if link.is_neighbor_cell() {
        painter.extend(Shape::dashed_line(&[a, b], stroke, DASH_LENGTH, GAP_LENGTH));
    } else {
        painter.line_segment([a, b], stroke);
    }
}

/// Whether `pos` lies on the drawn link.
pub fn is_inside(a: Pos2, b: Pos2, link: &Link, pos: Pos2) -> bool {
    distance_point_to_segment(pos, a, b) <= link.width / 2.0 + HIT_SLACK
}

fn distance_point_to_segment(p: Pos2, a: Pos2, b: Pos2) -> f32 {
    let ap = p - a;
    let ab = b - a;
    let ab_len2 = ab.length_sq();
    if ab_len2 <= f32::EPSILON {
        return ap.length();
    }
    let t = (ap.dot(ab) / ab_len2).clamp(0.0, 1.0);
    let closest = a + ab * t;
    (p - closest).length()
}
