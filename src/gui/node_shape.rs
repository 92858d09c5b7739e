use std::cell::RefCell;

use egui::{
    Align2, Color32, ColorImage, Context, FontId, Painter, Pos2, Rect, Stroke, TextureHandle,
    TextureOptions, Vec2,
};
use tiny_skia::Pixmap;
use usvg::Tree;

use crate::network::node::{Entity, Node};

/// Side of the square eNB icon.
pub const ENB_ICON_SIZE: f32 = 50.0;
pub const UE_RADIUS: f32 = 13.0;
const UE_STROKE_WIDTH: f32 = 2.5;
const UE_LABEL_OFFSET: f32 = 4.0;

/// d3's `category20` palette.
pub const CATEGORY20: [Color32; 20] = [
    Color32::from_rgb(0x1f, 0x77, 0xb4),
    Color32::from_rgb(0xae, 0xc7, 0xe8),
    Color32::from_rgb(0xff, 0x7f, 0x0e),
    Color32::from_rgb(0xff, 0xbb, 0x78),
    Color32::from_rgb(0x2c, 0xa0, 0x2c),
    Color32::from_rgb(0x98, 0xdf, 0x8a),
    Color32::from_rgb(0xd6, 0x27, 0x28),
    Color32::from_rgb(0xff, 0x98, 0x96),
    Color32::from_rgb(0x94, 0x67, 0xbd),
    Color32::from_rgb(0xc5, 0xb0, 0xd5),
    Color32::from_rgb(0x8c, 0x56, 0x4b),
    Color32::from_rgb(0xc4, 0x9c, 0x94),
    Color32::from_rgb(0xe3, 0x77, 0xc2),
    Color32::from_rgb(0xf7, 0xb6, 0xd2),
    Color32::from_rgb(0x7f, 0x7f, 0x7f),
    Color32::from_rgb(0xc7, 0xc7, 0xc7),
    Color32::from_rgb(0xbc, 0xbd, 0x22),
    Color32::from_rgb(0xdb, 0xdb, 0x8d),
    Color32::from_rgb(0x17, 0xbe, 0xcf),
    Color32::from_rgb(0x9e, 0xda, 0xe5),
];

thread_local! {
    static ENB_TEX: RefCell<Option<TextureHandle>> = const { RefCell::new(None) };
}

// Rasterize SVG bytes so that the longest side is target_px (keeps aspect)
fn rasterize_svg(svg_bytes: &[u8], target_px: u32) -> Option<ColorImage> {
    let opt = usvg::Options::default();
    let tree = Tree::from_data(svg_bytes, &opt).ok()?;
    let int = tree.size().to_int_size();
    let max_side = int.width().max(int.height()).max(1) as f32;
    let scale = target_px as f32 / max_side;

    let w = ((int.width() as f32) * scale).ceil().max(1.0) as u32;
    let h = ((int.height() as f32) * scale).ceil().max(1.0) as u32;

    let mut pixmap = Pixmap::new(w, h)?;
    let transform = tiny_skia::Transform::from_scale(scale, scale);
    resvg::render(&tree, transform, &mut pixmap.as_mut());

    Some(ColorImage::from_rgba_unmultiplied(
        [w as usize, h as usize],
        pixmap.data(),
    ))
}

/// Texture of the eNB icon, rasterized once per thread.
fn enb_texture(ctx: &Context) -> Option<TextureHandle> {
    ENB_TEX.with(|slot| {
        if let Some(tex) = slot.borrow().as_ref() {
            return Some(tex.clone());
        }
        // 2x the on-screen size keeps the icon sharp on HiDPI screens
        let img = rasterize_svg(include_bytes!("resources/enb-node.svg"), 100)?;
        let tex = ctx.load_texture("enb-node", img, TextureOptions::LINEAR);
        *slot.borrow_mut() = Some(tex.clone());
        Some(tex)
    })
}

/// d3's `rgb.darker()`: every channel scaled by 0.7.
pub fn darker(color: Color32) -> Color32 {
    let scale = |c: u8| (c as f32 * 0.7).round() as u8;
    Color32::from_rgba_unmultiplied(scale(color.r()), scale(color.g()), scale(color.b()), color.a())
}

fn with_opacity(color: Color32, opacity: f32) -> Color32 {
    color.gamma_multiply(opacity.clamp(0.0, 1.0))
}

pub fn enb_rect(center: Pos2) -> Rect {
    Rect::from_center_size(center, Vec2::splat(ENB_ICON_SIZE))
}

pub fn paint_enb(painter: &Painter, center: Pos2, opacity: f32) {
    let rect = enb_rect(center);
    match enb_texture(painter.ctx()) {
        Some(tex) => {
            let uv = Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0));
            painter.image(tex.id(), rect, uv, with_opacity(Color32::WHITE, opacity));
        }
        None => {
            // Icon failed to load; a plain tower-coloured square still marks the spot.
            let fill = with_opacity(Color32::from_rgb(0x4c, 0x4f, 0x69), opacity);
            painter.rect_filled(rect.shrink(ENB_ICON_SIZE / 4.0), 2.0, fill);
        }
    }
}

pub fn paint_ue(painter: &Painter, center: Pos2, fill: Color32, opacity: f32) {
    let stroke = Stroke::new(UE_STROKE_WIDTH, with_opacity(darker(fill), opacity));
    painter.circle(center, UE_RADIUS, with_opacity(fill, opacity), stroke);
    painter.text(
        center + Vec2::new(0.0, UE_LABEL_OFFSET / 2.0),
        Align2::CENTER_CENTER,
        "UE",
        FontId::proportional(10.0),
        with_opacity(Color32::BLACK, opacity),
    );
}

/// Whether `pos` (canvas space) falls on the drawn shape of `node`.
pub fn is_inside(node: &Node, pos: Pos2) -> bool {
    let center = Pos2::new(node.x, node.y);
    match node.entity {
        Entity::Enb => enb_rect(center).contains(pos),
        Entity::Ue => (pos - center).length() <= UE_RADIUS,
        Entity::Other => false,
    }
}
