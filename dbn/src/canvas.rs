use std::fmt::Write;
use std::rc::Rc;


/// A DBN greyscale value in `[0, 100]`; `0` is white and `100` is black.
pub type Color = u8;

pub const WHITE: Color = 0;
pub const BLACK: Color = 100;

pub const WIDTH: usize = 101;
pub const HEIGHT: usize = 101;

/// Clips any integer into the DBN color range.
pub fn clip(value: i64) -> Color {
    value.clamp(WHITE as i64, BLACK as i64) as Color
}

/// The fixed 101x101 drawing surface.
///
/// Pixels are addressed in DBN coordinates: `x` is the column and `y` counts
/// up from the bottom row. Storage is row-major with the top row first and is
/// shared between clones until one of them writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Canvas {
    pixels: Rc<Vec<Color>>,
    paper: Color,
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new(WHITE as i64)
    }
}

impl Canvas {
    /// A uniformly colored canvas; `color` is clipped.
    pub fn new(color: i64) -> Self {
        let paper = clip(color);
        Self {
            pixels: Rc::new(vec![paper; WIDTH * HEIGHT]),
            paper,
        }
    }

    /// The color the canvas was created with.
    pub fn paper(&self) -> Color {
        self.paper
    }

    fn index(x: i64, y: i64) -> Option<usize> {
        let col = usize::try_from(x).ok().filter(|&c| c < WIDTH)?;
        let row = (HEIGHT as i64 - 1)
            .checked_sub(y)
            .and_then(|r| usize::try_from(r).ok())
            .filter(|&r| r < HEIGHT)?;
        Some(row * WIDTH + col)
    }

    /// The color at `(x, y)`, or `None` outside the grid.
    pub fn pixel(&self, x: i64, y: i64) -> Option<Color> {
        Self::index(x, y).map(|i| self.pixels[i])
    }

    /// The color at `(x, y)`; reads outside the grid see the paper color.
    pub fn query_pixel(&self, x: i64, y: i64) -> Color {
        self.pixel(x, y).unwrap_or(self.paper)
    }

    /// Writes in place, copying the grid first if it is shared.
    /// Out-of-range coordinates are ignored.
    pub fn put(&mut self, x: i64, y: i64, value: i64) -> bool {
        let Some(i) = Self::index(x, y) else {
            return false;
        };
        Rc::make_mut(&mut self.pixels)[i] = clip(value);
        true
    }

    pub fn set_pixel(mut self, x: i64, y: i64, value: i64) -> Self {
        self.put(x, y, value);
        self
    }

    pub fn set_pixels(mut self, pixels: impl IntoIterator<Item = (i64, i64, i64)>) -> Self {
        for (x, y, value) in pixels {
            self.put(x, y, value);
        }
        self
    }

    /// Rasterizes a line with the given color, endpoints included.
    pub fn draw_line(mut self, x0: i64, y0: i64, x1: i64, y1: i64, color: Color) -> Self {
        self.line(x0, y0, x1, y1, color);
        self
    }

    pub fn line(&mut self, x0: i64, y0: i64, x1: i64, y1: i64, color: Color) {
        for (x, y) in bresenham_line(x0, y0, x1, y1) {
            self.put(x, y, color as i64);
        }
    }

    /// Rows of the grid, top row first.
    pub fn rows(&self) -> impl Iterator<Item = &[Color]> {
        self.pixels.chunks_exact(WIDTH)
    }

    /// 101 shades of grey, white first.
    pub fn palette() -> [[u8; 3]; 101] {
        let mut palette = [[0; 3]; 101];
        for (l, entry) in palette.iter_mut().enumerate() {
            let shade = 255 - (l * 255 / 100) as u8;
            *entry = [shade; 3];
        }
        palette
    }

    /// Plain-text greyscale PGM of the grid, mapped through [`Canvas::palette`].
    pub fn to_pgm(&self) -> String {
        let palette = Self::palette();
        let mut out = format!("P2\n{WIDTH} {HEIGHT}\n255\n");
        for row in self.rows() {
            let mut sep = "";
            for &c in row {
                let _ = write!(out, "{sep}{}", palette[c as usize][0]);
                sep = " ";
            }
            out.push('\n');
        }
        out
    }
}

/// Bresenham's algorithm, normalized to a shallow left-to-right line.
///
/// Only the stretch whose driving coordinate falls inside the canvas is
/// produced, so at most 101 points come back for any endpoints. Points are
/// computed directly from their column in 128-bit arithmetic.
pub fn bresenham_line(x0: i64, y0: i64, x1: i64, y1: i64) -> Vec<(i64, i64)> {
    let (mut x0, mut y0, mut x1, mut y1) = (x0 as i128, y0 as i128, x1 as i128, y1 as i128);
    let steep = (y1 - y0).abs() > (x1 - x0).abs();
    if steep {
        std::mem::swap(&mut x0, &mut y0);
        std::mem::swap(&mut x1, &mut y1);
    }
    if x0 > x1 {
        std::mem::swap(&mut x0, &mut x1);
        std::mem::swap(&mut y0, &mut y1);
    }
    let ystep = if y0 < y1 { 1 } else { -1 };
    let deltax = (x1 - x0) as u128;
    let deltay = (y1 - y0).unsigned_abs();
    let last = (if steep { HEIGHT } else { WIDTH }) as i128 - 1;

    (x0.max(0)..=x1.min(last))
        .map(|x| {
            // The error term starts at -(deltax / 2) and y steps whenever it
            // turns positive, so the steps taken so far are a ceiling division.
            let k = (x - x0) as u128;
            let steps = match deltax {
                0 => 0,
                _ => (k * deltay + deltax - 1 - deltax / 2) / deltax,
            };
            let (x, y) = (x as i64, (y0 + ystep * steps as i128) as i64);
            if steep {
                (y, x)
            } else {
                (x, y)
            }
        })
        .collect()
}
