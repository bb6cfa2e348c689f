use crate::config::WindowShape;
use eframe::egui::Color32;

pub const BAR_HEIGHT: f32 = 44.0;
pub const BAR_PADDING: f32 = 6.0;
pub const GRIP_WIDTH: f32 = 14.0;
pub const WORKSPACE_BUTTON: f32 = 26.0;
pub const SEPARATOR_WIDTH: f32 = 9.0;
pub const ITEM_GAP: f32 = 4.0;

#[derive(Clone, Copy)]
pub struct TaskbarTheme {
    pub panel_bg: Color32,
    pub panel_border: Color32,
    pub panel_shadow: Color32,
    pub text: Color32,
    pub muted_text: Color32,
    pub item_bg: Color32,
    pub item_hover: Color32,
    pub favorite_bg: Color32,
    pub item_border: Color32,
    pub separator: Color32,
    pub workspace_active: Color32,
    pub drop_hint: Color32,
    pub toast_bg: Color32,
    pub toast_text: Color32,
}

impl Default for TaskbarTheme {
    fn default() -> Self {
        Self {
            panel_bg: Color32::from_rgba_premultiplied(14, 20, 31, 200),
            panel_border: Color32::from_rgba_premultiplied(161, 179, 201, 36),
            panel_shadow: Color32::from_rgba_premultiplied(3, 8, 16, 75),
            text: Color32::from_rgb(242, 248, 255),
            muted_text: Color32::from_rgb(150, 165, 185),
            item_bg: Color32::from_rgba_premultiplied(24, 36, 50, 154),
            item_hover: Color32::from_rgba_premultiplied(35, 53, 74, 184),
            favorite_bg: Color32::from_rgba_premultiplied(45, 104, 114, 170),
            item_border: Color32::from_rgba_premultiplied(147, 169, 194, 78),
            separator: Color32::from_rgba_premultiplied(161, 179, 201, 90),
            workspace_active: Color32::from_rgba_premultiplied(75, 197, 165, 160),
            drop_hint: Color32::from_rgba_premultiplied(93, 214, 189, 186),
            toast_bg: Color32::from_rgba_premultiplied(8, 12, 18, 236),
            toast_text: Color32::from_rgb(245, 250, 255),
        }
    }
}

pub fn rounding(shape: WindowShape) -> f32 {
    match shape {
        WindowShape::Square => 4.0,
        WindowShape::RoundedRect => 12.0,
    }
}
