//! Frame generators for animations
//!
//! A generator produces one pixel matrix per tick. Animations run at
//! [`FRAME_RATE`] ticks per second, so a generator that moves with time
//! converts ticks to seconds itself. Generators with randomness are seeded
//! and replay the same frames for the same seed.

use core::f32::consts::PI;

use libm::sinf;

use crate::matrix::{Pixel, PixelMatrix, DISPLAY_ROWS};
use crate::render::RenderError;

/// Ticks per second
pub const FRAME_RATE: u32 = 10;

/// Drops on screen at once in [`Rain`]
pub const MAX_DROPS: usize = 32;

/// Columns with a falling stream in [`Cascade`]
pub const STREAMS: usize = 20;

const CENTER_ROW: usize = DISPLAY_ROWS / 2;

/// Source of animation frames
pub trait FrameGenerator {
    /// Produce the frame for `tick`, `width` columns wide
    fn frame(&mut self, tick: u32, width: usize) -> Result<PixelMatrix, RenderError>;
}

fn seconds(tick: u32) -> f32 {
    tick as f32 / FRAME_RATE as f32
}

/// Xorshift generator
#[derive(Debug, Clone)]
struct Noise(u32);

impl Noise {
    fn new(seed: u32) -> Self {
        // Zero is a fixed point
        Self(if seed == 0 { 0x9E37_79B9 } else { seed })
    }

    fn next(&mut self) -> u32 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.0 = x;
        x
    }

    /// True `percent` times out of 100
    fn chance(&mut self, percent: u32) -> bool {
        self.next() % 100 < percent
    }

    /// Uniform in `0..n`, `n` > 0
    fn below(&mut self, n: u32) -> u32 {
        self.next() % n
    }

    /// Uniform in `low..=high`, in hundredths
    fn between(&mut self, low: f32, high: f32) -> f32 {
        let steps = ((high - low) * 100.0) as u32 + 1;
        low + self.below(steps) as f32 / 100.0
    }
}

/// Centred block that grows and shrinks
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pulse {
    /// Seconds from smallest to largest
    pub duration: f32,
}

impl Default for Pulse {
    fn default() -> Self {
        Self { duration: 2.0 }
    }
}

impl FrameGenerator for Pulse {
    fn frame(&mut self, tick: u32, width: usize) -> Result<PixelMatrix, RenderError> {
        let mut matrix = PixelMatrix::blank(width)?;

        let intensity = (sinf(seconds(tick) * PI / self.duration) + 1.0) / 2.0;
        let size = (10.0 * intensity) as usize + 5;
        let center = width / 2;
        let columns = center.saturating_sub(size)..(center + size).min(width);
        let rows = CENTER_ROW.saturating_sub(size / 2)..(CENTER_ROW + size / 2).min(DISPLAY_ROWS);

        for x in columns {
            for y in rows.clone() {
                matrix.set(x, y, Pixel::On);
            }
        }
        Ok(matrix)
    }
}

/// Two sine waves drifting across the panel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Wave {
    pub speed: f32,
}

impl Default for Wave {
    fn default() -> Self {
        Self { speed: 1.0 }
    }
}

impl FrameGenerator for Wave {
    fn frame(&mut self, tick: u32, width: usize) -> Result<PixelMatrix, RenderError> {
        let mut matrix = PixelMatrix::blank(width)?;
        let phase = seconds(tick) * self.speed;

        for x in 0..width {
            let column = x as f32;
            let high = 8.0 + 4.0 * sinf(phase + column * 0.2);
            let low = 8.0 + 2.0 * sinf(phase * 1.5 + column * 0.3 + PI);
            matrix.set(x, high as usize, Pixel::On);
            matrix.set(x, low as usize, Pixel::On);
        }
        Ok(matrix)
    }
}

/// Flickering flames over a glowing base
#[derive(Debug, Clone)]
pub struct Fire {
    noise: Noise,
}

impl Fire {
    pub fn new(seed: u32) -> Self {
        Self {
            noise: Noise::new(seed),
        }
    }
}

impl FrameGenerator for Fire {
    fn frame(&mut self, _tick: u32, width: usize) -> Result<PixelMatrix, RenderError> {
        let mut matrix = PixelMatrix::blank(width)?;

        for x in 0..width {
            if self.noise.chance(80) {
                matrix.set(x, DISPLAY_ROWS - 1, Pixel::On);
                matrix.set(x, DISPLAY_ROWS - 2, Pixel::On);
            }
        }

        for x in 0..width {
            let height = self.noise.below(8) as usize + 4;
            for y in DISPLAY_ROWS - height..DISPLAY_ROWS {
                if self.noise.chance(70) {
                    matrix.set(x, y, Pixel::On);
                }
            }
        }
        Ok(matrix)
    }
}

#[derive(Debug, Clone, Copy)]
struct Raindrop {
    x: usize,
    y: f32,
    speed: f32,
}

/// Drops falling with a one-pixel trail
#[derive(Debug, Clone)]
pub struct Rain {
    noise: Noise,
    speed: f32,
    drops: [Option<Raindrop>; MAX_DROPS],
}

impl Rain {
    pub fn new(seed: u32, speed: f32) -> Self {
        Self {
            noise: Noise::new(seed),
            speed,
            drops: [None; MAX_DROPS],
        }
    }

    fn spawn(&mut self, width: usize) {
        if width == 0 || !self.noise.chance(30) {
            return;
        }
        let x = self.noise.below(width as u32) as usize;
        let speed = self.noise.between(0.5, 1.5) * self.speed;
        if let Some(slot) = self.drops.iter_mut().find(|slot| slot.is_none()) {
            *slot = Some(Raindrop { x, y: 0.0, speed });
        }
    }
}

impl FrameGenerator for Rain {
    fn frame(&mut self, _tick: u32, width: usize) -> Result<PixelMatrix, RenderError> {
        let mut matrix = PixelMatrix::blank(width)?;
        self.spawn(width);

        for slot in self.drops.iter_mut() {
            let Some(falling) = slot.as_mut() else {
                continue;
            };
            falling.y += falling.speed;
            if falling.y >= DISPLAY_ROWS as f32 {
                *slot = None;
                continue;
            }

            let y = falling.y as usize;
            matrix.set(falling.x, y, Pixel::On);
            if y > 0 {
                matrix.set(falling.x, y - 1, Pixel::On);
            }
        }
        Ok(matrix)
    }
}

#[derive(Debug, Clone, Copy)]
struct Stream {
    head: f32,
    speed: f32,
}

/// Streams of light falling down every third column
#[derive(Debug, Clone)]
pub struct Cascade {
    noise: Noise,
    speed: f32,
    streams: [Stream; STREAMS],
}

impl Cascade {
    /// Columns between two streams
    pub const SPACING: usize = 3;
    /// Lit pixels at the head of a stream
    pub const HEAD: usize = 3;

    pub fn new(seed: u32, speed: f32) -> Self {
        let mut noise = Noise::new(seed);
        let streams = core::array::from_fn(|_| Stream {
            head: -(noise.below(21) as f32),
            speed: noise.between(0.5, 2.0) * speed,
        });
        Self {
            noise,
            speed,
            streams,
        }
    }

    /// Column of stream `index`
    pub fn column(index: usize) -> usize {
        index * Self::SPACING + 2
    }
}

impl FrameGenerator for Cascade {
    fn frame(&mut self, _tick: u32, width: usize) -> Result<PixelMatrix, RenderError> {
        let mut matrix = PixelMatrix::blank(width)?;

        for (index, stream) in self.streams.iter_mut().enumerate() {
            let x = Self::column(index);
            if x >= width {
                continue;
            }

            stream.head += stream.speed;
            if stream.head > 20.0 {
                stream.head = -((self.noise.below(16) + 5) as f32);
                stream.speed = self.noise.between(0.5, 2.0) * self.speed;
            }

            let head = stream.head as i32;
            for y in (head - Self::HEAD as i32 + 1..=head).filter(|y| *y >= 0) {
                matrix.set(x, y as usize, Pixel::On);
            }
        }
        Ok(matrix)
    }
}
