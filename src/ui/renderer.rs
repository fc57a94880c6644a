/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// The 128x128 logical display maps onto a 64x32 block of terminal cells
/// (2x4 logical pixels per cell), centered in the terminal.
///
/// How it works:
///   1. Screens draw into the `front` buffer through the `Canvas` trait
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// This eliminates flicker caused by full-screen redraws.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
    execute, queue,
    style::{Color as TermColor, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use super::canvas::{Canvas, Color, HEIGHT, WIDTH};

/// Logical pixels per terminal cell.
const PX_PER_COL: i32 = 2;
const PX_PER_ROW: i32 = 4;

const CANVAS_COLS: usize = (WIDTH / PX_PER_COL) as usize;
const CANVAS_ROWS: usize = (HEIGHT / PX_PER_ROW) as usize;

/// Explicit dark background for all "empty" terminal cells.
///
/// Using the same explicit RGB for `Clear(ClearType::All)` and every cell's
/// background keeps VTE terminals from showing lines between rows.
const BASE_BG: TermColor = TermColor::Rgb { r: 22, g: 22, b: 35 };
const BEZEL: TermColor = TermColor::Rgb { r: 70, g: 70, b: 90 };

fn term_color(c: Color) -> TermColor {
    match c {
        Color::Black => BASE_BG,
        Color::White => TermColor::Rgb { r: 235, g: 235, b: 235 },
        Color::Gray => TermColor::Rgb { r: 110, g: 110, b: 125 },
        Color::Red => TermColor::Rgb { r: 220, g: 60, b: 60 },
        Color::Green => TermColor::Rgb { r: 70, g: 200, b: 90 },
        Color::Blue => TermColor::Rgb { r: 70, g: 110, b: 230 },
        Color::Yellow => TermColor::Rgb { r: 240, g: 210, b: 70 },
        Color::Cyan => TermColor::Rgb { r: 70, g: 210, b: 220 },
        Color::Orange => TermColor::Rgb { r: 240, g: 150, b: 50 },
        Color::Purple => TermColor::Rgb { r: 170, g: 90, b: 210 },
    }
}

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Cell {
    ch: char,
    fg: TermColor,
    bg: TermColor,
}

impl Cell {
    const BLANK: Cell = Cell { ch: ' ', fg: TermColor::White, bg: BASE_BG };

    /// Sentinel cell used to invalidate the back buffer.
    /// Different from any real cell, so every position will be diff'd.
    const INVALID: Cell = Cell { ch: '?', fg: TermColor::Magenta, bg: TermColor::Magenta };
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer {
            width: w,
            height: h,
            cells: vec![Cell::BLANK; w * h],
        }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn get_mut(&mut self, x: usize, y: usize) -> Option<&mut Cell> {
        if x < self.width && y < self.height {
            self.cells.get_mut(y * self.width + x)
        } else {
            None
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }
}

// ── Renderer ──

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    /// Terminal cell of the display's top-left pixel.
    origin: (usize, usize),
    enhanced_keys: bool,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            origin: (0, 0),
            enhanced_keys: false,
        }
    }

    /// Enter raw mode and the alternate screen. Returns whether the
    /// terminal will report key releases.
    pub fn init(&mut self) -> io::Result<bool> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(BASE_BG),
            Clear(ClearType::All)
        )?;

        if terminal::supports_keyboard_enhancement().unwrap_or(false) {
            execute!(
                self.writer,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
            self.enhanced_keys = true;
        }

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.layout(tw as usize, th as usize);
        Ok(self.enhanced_keys)
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        if self.enhanced_keys {
            execute!(self.writer, PopKeyboardEnhancementFlags)?;
        }
        execute!(
            self.writer,
            ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    /// Resize the buffers for a terminal of `tw` x `th` cells and center
    /// the display in it. Forces a full repaint.
    fn layout(&mut self, tw: usize, th: usize) {
        self.term_w = tw;
        self.term_h = th;
        self.front.resize(tw, th);
        self.back.resize(tw, th);
        self.back.cells.fill(Cell::INVALID);
        self.origin = (
            tw.saturating_sub(CANVAS_COLS) / 2,
            th.saturating_sub(CANVAS_ROWS) / 2,
        );
    }

    /// Start a frame: pick up terminal resizes and clear the front buffer.
    pub fn begin_frame(&mut self) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.layout(tw as usize, th as usize);
            queue!(self.writer, SetBackgroundColor(BASE_BG), Clear(ClearType::All))?;
        }
        self.front.clear();
        self.compose_bezel();
        Ok(())
    }

    /// Finish a frame: emit the diff and swap buffers.
    pub fn end_frame(&mut self) -> io::Result<()> {
        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    /// Frame around the display, when the terminal has room for it.
    fn compose_bezel(&mut self) {
        let (ox, oy) = self.origin;
        if ox == 0 || oy == 0 {
            return;
        }
        let (left, top) = (ox - 1, oy - 1);
        let (right, bottom) = (ox + CANVAS_COLS, oy + CANVAS_ROWS);
        for x in left..=right {
            for y in [top, bottom] {
                if let Some(c) = self.front.get_mut(x, y) {
                    *c = Cell { ch: '▀', fg: BEZEL, bg: BASE_BG };
                }
            }
        }
        for y in oy..bottom {
            for x in [left, right] {
                if let Some(c) = self.front.get_mut(x, y) {
                    *c = Cell { ch: '█', fg: BEZEL, bg: BASE_BG };
                }
            }
        }
    }

    /// Terminal cell covering logical pixel (`px`, `py`).
    fn cell_at(&mut self, px: i32, py: i32) -> Option<&mut Cell> {
        let x = self.origin.0 + (px / PX_PER_COL) as usize;
        let y = self.origin.1 + (py / PX_PER_ROW) as usize;
        self.front.get_mut(x, y)
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = TermColor::White;
        let mut last_bg = BASE_BG;
        let mut need_move = true;
        let mut last_x: usize = 0;
        let mut last_y: usize = 0;

        // Explicit base colors; ResetColor would fall back to the
        // terminal's own default and leave line artifacts.
        queue!(self.writer,
            SetForegroundColor(TermColor::White),
            SetBackgroundColor(BASE_BG),
        )?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    need_move = true;
                    continue;
                }

                if need_move || x != last_x + 1 || y != last_y {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                    need_move = false;
                }

                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }

                queue!(self.writer, Print(cell.ch))?;
                last_x = x;
                last_y = y;
            }
        }

        self.writer.flush()
    }
}

impl Canvas for Renderer {
    fn text_width(&self, text: &str) -> i32 {
        text.chars().count() as i32 * PX_PER_COL
    }

    /// Paint every cell the rectangle touches.
    fn fill_rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: Color) {
        let (x0, y0) = (x.max(0), y.max(0));
        let (x1, y1) = ((x + w).min(WIDTH), (y + h).min(HEIGHT));
        if x0 >= x1 || y0 >= y1 {
            return;
        }
        let bg = term_color(color);
        let mut py = y0 - y0 % PX_PER_ROW;
        while py < y1 {
            let mut px = x0 - x0 % PX_PER_COL;
            while px < x1 {
                if let Some(c) = self.cell_at(px, py) {
                    *c = Cell { ch: ' ', fg: TermColor::White, bg };
                }
                px += PX_PER_COL;
            }
            py += PX_PER_ROW;
        }
    }

    /// One character per cell, over whatever background is already there.
    fn draw_text(&mut self, x: i32, y: i32, text: &str, color: Color) {
        if y < 0 || y >= HEIGHT {
            return;
        }
        let fg = term_color(color);
        for (i, ch) in text.chars().enumerate() {
            let px = x + i as i32 * PX_PER_COL;
            if px < 0 {
                continue;
            }
            if px >= WIDTH {
                break;
            }
            if let Some(c) = self.cell_at(px, y) {
                c.ch = ch;
                c.fg = fg;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn renderer(tw: usize, th: usize) -> Renderer {
        let mut r = Renderer::new();
        r.layout(tw, th);
        r
    }

    #[test]
    fn display_is_centered() {
        let r = renderer(80, 40);
        assert_eq!(r.origin, ((80 - CANVAS_COLS) / 2, (40 - CANVAS_ROWS) / 2));
        let tiny = renderer(20, 10);
        assert_eq!(tiny.origin, (0, 0));
    }

    #[test]
    fn fill_rect_maps_pixels_to_cells() {
        let mut r = renderer(CANVAS_COLS, CANVAS_ROWS);
        r.fill_rect(4, 8, 8, 8, Color::Red);
        let red = term_color(Color::Red);
        for x in 2..6 {
            for y in 2..4 {
                assert_eq!(r.front.get(x, y).bg, red);
            }
        }
        assert_eq!(r.front.get(1, 2).bg, BASE_BG);
        assert_eq!(r.front.get(6, 2).bg, BASE_BG);
        assert_eq!(r.front.get(2, 4).bg, BASE_BG);
    }

    #[test]
    fn partial_cells_are_painted_and_edges_clipped() {
        let mut r = renderer(CANVAS_COLS, CANVAS_ROWS);
        r.fill_rect(-10, 125, 13, 10, Color::Blue);
        let blue = term_color(Color::Blue);
        assert_eq!(r.front.get(0, CANVAS_ROWS - 1).bg, blue);
        assert_eq!(r.front.get(1, CANVAS_ROWS - 1).bg, blue);
        assert_eq!(r.front.get(2, CANVAS_ROWS - 1).bg, BASE_BG);
    }

    #[test]
    fn text_keeps_background() {
        let mut r = renderer(CANVAS_COLS, CANVAS_ROWS);
        r.fill_rect(0, 0, WIDTH, 4, Color::Green);
        r.draw_text(0, 0, "hi", Color::White);
        let c = r.front.get(1, 0);
        assert_eq!(c.ch, 'i');
        assert_eq!(c.bg, term_color(Color::Green));
    }

    #[test]
    fn text_clipped_at_right_edge() {
        let mut r = renderer(CANVAS_COLS + 10, CANVAS_ROWS);
        r.draw_text(WIDTH - 4, 0, "abcd", Color::White);
        let (ox, _) = r.origin;
        assert_eq!(r.front.get(ox + CANVAS_COLS - 1, 0).ch, 'b');
        assert_eq!(r.front.get(ox + CANVAS_COLS, 0).ch, ' ');
    }
}
