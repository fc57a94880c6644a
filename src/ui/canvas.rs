/// Drawing surface for the 128x128 display.
///
/// Screens draw in logical pixels; the backend decides how those land on a
/// real device (terminal cells here, an LCD on hardware).

pub const WIDTH: i32 = 128;
pub const HEIGHT: i32 = 128;

/// Layout metrics for text, in logical pixels.
pub const CHAR_W: i32 = 6;
pub const LINE_H: i32 = 8;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Color {
    Black,
    White,
    Gray,
    Red,
    Green,
    Blue,
    Yellow,
    Cyan,
    Orange,
    Purple,
}

pub trait Canvas {
    fn fill_rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: Color);

    /// Text with its top-left corner at (`x`, `y`).
    fn draw_text(&mut self, x: i32, y: i32, text: &str, color: Color);

    /// Width `text` occupies, for centering.
    fn text_width(&self, text: &str) -> i32 {
        text.chars().count() as i32 * CHAR_W
    }

    fn clear(&mut self, color: Color) {
        self.fill_rect(0, 0, WIDTH, HEIGHT, color);
    }
}
