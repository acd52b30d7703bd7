/// Character-cell surface for terminal rendering
use crossterm::{
    cursor::MoveTo,
    style::{self, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    QueueableCommand,
};
use poly3d_core::{Color, Font, RenderError, ScreenPoint, ScreenVertex, Surface};
use std::io::{Stdout, Write};

/// Character luminosity ramp for shading (darkest to lightest)
const LUMINOSITY_RAMP: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

const LINE_GLYPH: char = '*';

#[derive(Debug, Clone, Copy, PartialEq)]
struct Cell {
    glyph: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    fn blank(bg: Color) -> Self {
        Self {
            glyph: ' ',
            fg: bg,
            bg,
        }
    }
}

/// Pick a ramp character for a shaded color
fn shade(color: Color) -> char {
    let top = LUMINOSITY_RAMP.len() - 1;
    let index = (color.luminance() * top as f64).round() as usize;
    LUMINOSITY_RAMP[index.min(top)]
}

fn term_color(color: Color) -> style::Color {
    style::Color::Rgb {
        r: color.r(),
        g: color.g(),
        b: color.b(),
    }
}

/// A [`Surface`] that rasterizes into a grid of cells and writes the grid
/// to a terminal on [`Surface::present`]. One cell is one device pixel.
pub struct TerminalSurface<W: Write = Stdout> {
    out: W,
    width: usize,
    height: usize,
    cells: Vec<Cell>,
    draw_color: Color,
    /// Largest size a resize may grow to
    limit: Option<(u32, u32)>,
}

impl<W: Write> TerminalSurface<W> {
    pub fn new(out: W, width: u32, height: u32) -> Self {
        let (width, height) = (width as usize, height as usize);
        Self {
            out,
            width,
            height,
            cells: vec![Cell::blank(Color::BLACK); width * height],
            draw_color: Color::WHITE,
            limit: None,
        }
    }

    /// Cap the size later resizes can reach
    pub fn with_size_limit(mut self, width: u32, height: u32) -> Self {
        self.limit = Some((width, height));
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn glyph_at(&self, x: usize, y: usize) -> Option<char> {
        self.cell(x, y).map(|cell| cell.glyph)
    }

    /// One row of glyphs, for inspection
    pub fn row(&self, y: usize) -> Option<String> {
        (y < self.height).then(|| {
            self.cells[y * self.width..(y + 1) * self.width]
                .iter()
                .map(|cell| cell.glyph)
                .collect()
        })
    }

    fn cell(&self, x: usize, y: usize) -> Option<&Cell> {
        (x < self.width && y < self.height).then(|| &self.cells[y * self.width + x])
    }

    fn cell_mut(&mut self, x: i32, y: i32) -> Option<&mut Cell> {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return None;
        }
        Some(&mut self.cells[y as usize * self.width + x as usize])
    }

    fn plot(&mut self, x: i32, y: i32, glyph: char, fg: Color) {
        if let Some(cell) = self.cell_mut(x, y) {
            cell.glyph = glyph;
            cell.fg = fg;
        }
    }

    /// Liang-Barsky clip of a segment to the cell grid, in cell coordinates
    fn clip(&self, from: ScreenPoint, to: ScreenPoint) -> Option<((i32, i32), (i32, i32))> {
        if self.width == 0 || self.height == 0 {
            return None;
        }
        let (x0, y0, x1, y1) = (from.x as f64, from.y as f64, to.x as f64, to.y as f64);
        if ![x0, y0, x1, y1].iter().all(|v| v.is_finite()) {
            return None;
        }
        let (x_max, y_max) = ((self.width - 1) as f64, (self.height - 1) as f64);
        let (dx, dy) = (x1 - x0, y1 - y0);
        let (mut t0, mut t1) = (0.0f64, 1.0f64);
        for (p, q) in [(-dx, x0), (dx, x_max - x0), (-dy, y0), (dy, y_max - y0)] {
            if p == 0.0 {
                if q < 0.0 {
                    return None;
                }
                continue;
            }
            let r = q / p;
            if p < 0.0 {
                if r > t1 {
                    return None;
                }
                t0 = t0.max(r);
            } else {
                if r < t0 {
                    return None;
                }
                t1 = t1.min(r);
            }
        }
        let cell = |t: f64| {
            (
                (x0 + t * dx).round().clamp(0.0, x_max) as i32,
                (y0 + t * dy).round().clamp(0.0, y_max) as i32,
            )
        };
        Some((cell(t0), cell(t1)))
    }

    /// Bresenham line between two device points, clipped to the surface
    fn line(&mut self, from: ScreenPoint, to: ScreenPoint, color: Color) {
        let Some(((mut x0, mut y0), (x1, y1))) = self.clip(from, to) else {
            return;
        };
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        loop {
            self.plot(x0, y0, LINE_GLYPH, color);
            if x0 == x1 && y0 == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x0 += sx;
            }
            if e2 <= dx {
                err += dx;
                y0 += sy;
            }
        }
    }
}

impl<W: Write> Surface for TerminalSurface<W> {
    fn set_draw_color(&mut self, color: Color) -> Result<(), RenderError> {
        self.draw_color = color;
        Ok(())
    }

    fn clear(&mut self) -> Result<(), RenderError> {
        let blank = Cell::blank(self.draw_color);
        self.cells.fill(blank);
        Ok(())
    }

    fn fill_triangle(&mut self, vertices: &[ScreenVertex; 3]) -> Result<(), RenderError> {
        let [v0, v1, v2] = vertices.map(|v| (v.position.x, v.position.y));
        let color = vertices[0].color;
        let glyph = shade(color);

        // Bounding box, clipped to the surface
        let min_x = v0.0.min(v1.0).min(v2.0).floor().max(0.0) as i32;
        let max_x = (v0.0.max(v1.0).max(v2.0).ceil() as i32).min(self.width as i32 - 1);
        let min_y = v0.1.min(v1.1).min(v2.1).floor().max(0.0) as i32;
        let max_y = (v0.1.max(v1.1).max(v2.1).ceil() as i32).min(self.height as i32 - 1);

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let p = (x as f32 + 0.5, y as f32 + 0.5);
                if let Some((w0, w1, w2)) = barycentric(v0, v1, v2, p) {
                    if w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0 {
                        self.plot(x, y, glyph, color);
                    }
                }
            }
        }
        Ok(())
    }

    fn draw_lines(&mut self, points: &[ScreenPoint]) -> Result<(), RenderError> {
        let color = self.draw_color;
        for pair in points.windows(2) {
            self.line(pair[0], pair[1], color);
        }
        Ok(())
    }

    fn draw_text(
        &mut self,
        x: i32,
        y: i32,
        text: &str,
        _font: Font,
        color: Color,
    ) -> Result<(), RenderError> {
        for (i, glyph) in text.chars().enumerate() {
            self.plot(x + i as i32, y, glyph, color);
        }
        Ok(())
    }

    fn present(&mut self) -> Result<(), RenderError> {
        let mut colors: Option<(Color, Color)> = None;
        for y in 0..self.height {
            self.out.queue(MoveTo(0, y as u16))?;
            for cell in &self.cells[y * self.width..(y + 1) * self.width] {
                if colors != Some((cell.fg, cell.bg)) {
                    self.out.queue(SetForegroundColor(term_color(cell.fg)))?;
                    self.out.queue(SetBackgroundColor(term_color(cell.bg)))?;
                    colors = Some((cell.fg, cell.bg));
                }
                self.out.queue(Print(cell.glyph))?;
            }
        }
        self.out.queue(ResetColor)?;
        self.out.flush()?;
        Ok(())
    }

    fn size(&self) -> (u32, u32) {
        (self.width as u32, self.height as u32)
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<(), RenderError> {
        let (width, height) = match self.limit {
            Some((max_width, max_height)) => (width.min(max_width), height.min(max_height)),
            None => (width, height),
        };
        self.width = width as usize;
        self.height = height as usize;
        self.cells = vec![Cell::blank(Color::BLACK); self.width * self.height];
        Ok(())
    }
}

/// Barycentric coordinates of `p`, or `None` for a degenerate triangle.
/// Both windings give non-negative weights inside the triangle.
fn barycentric(
    v0: (f32, f32),
    v1: (f32, f32),
    v2: (f32, f32),
    p: (f32, f32),
) -> Option<(f32, f32, f32)> {
    let denom = (v1.1 - v2.1) * (v0.0 - v2.0) + (v2.0 - v1.0) * (v0.1 - v2.1);

    if denom.abs() < 1e-6 {
        return None;
    }

    let w0 = ((v1.1 - v2.1) * (p.0 - v2.0) + (v2.0 - v1.0) * (p.1 - v2.1)) / denom;
    let w1 = ((v2.1 - v0.1) * (p.0 - v2.0) + (v0.0 - v2.0) * (p.1 - v2.1)) / denom;
    let w2 = 1.0 - w0 - w1;

    Some((w0, w1, w2))
}
