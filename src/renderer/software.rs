//! ---------------------------------------------------------------------------
//! Software (CPU) wireframe renderer
//!
//! * Fills a `Vec<u32>` frame-buffer in **0x00RRGGBB** format.
//! * Segments are clipped in homogeneous space (near plane plus the four
//!   frustum sides) before the Bresenham walk, so nothing is drawn behind
//!   the eye and no pixel loop ever leaves the screen by much.
//! ---------------------------------------------------------------------------

use glam::{Mat4, Vec2, Vec4};

use crate::renderer::{Renderer, Rgba, WorldLine};

/// Anything closer than this in clip-w is behind the near plane.
const MIN_W: f32 = 1e-4;

/*───────────────────────────────────────────────────────────────────────*/
/*                              Backend                                 */
/*───────────────────────────────────────────────────────────────────────*/

#[derive(Default)]
pub struct Software {
    scratch: Vec<Rgba>,
    width: usize,
    height: usize,
}

/*──────────────────────── Renderer trait impl ────────────────────────*/
impl Renderer for Software {
    fn begin_frame(&mut self, w: usize, h: usize, clear: Rgba) {
        // (re)allocate if resolution changed
        if w != self.width || h != self.height {
            self.width = w;
            self.height = h;
            self.scratch.resize(w * h, 0);
        }
        self.scratch.fill(clear);
    }

    fn draw_line(&mut self, world_to_clip: &Mat4, line: &WorldLine) {
        let p0 = *world_to_clip * line.a.extend(1.0);
        let p1 = *world_to_clip * line.b.extend(1.0);
        let Some((p0, p1)) = clip_segment(p0, p1) else {
            return;
        };
        let a = self.to_screen(p0);
        let b = self.to_screen(p1);
        self.bresenham(a.x as i32, a.y as i32, b.x as i32, b.y as i32, line.color);
    }

    fn end_frame<F>(&mut self, submit: F)
    where
        F: FnOnce(&[Rgba], usize, usize),
    {
        submit(&self.scratch, self.width, self.height);
    }
}

/*──────────────────────── rasterisation ──────────────────────────────*/

impl Software {
    #[inline]
    pub fn pixels(&self) -> &[Rgba] {
        &self.scratch
    }

    /// NDC → pixel centre coordinates, +y down.
    fn to_screen(&self, clip: Vec4) -> Vec2 {
        let ndc = clip.truncate().truncate() / clip.w;
        Vec2::new(
            (ndc.x * 0.5 + 0.5) * (self.width as f32 - 1.0),
            (0.5 - ndc.y * 0.5) * (self.height as f32 - 1.0),
        )
        .round()
    }

    fn bresenham(&mut self, mut x0: i32, mut y0: i32, x1: i32, y1: i32, colour: Rgba) {
        let (w, h) = (self.width as i32, self.height as i32);
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;

        loop {
            if (0..w).contains(&x0) && (0..h).contains(&y0) {
                self.scratch[y0 as usize * self.width + x0 as usize] = colour;
            }
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

/// Liang–Barsky against `w > MIN_W` and `-w <= x, y <= w`.
fn clip_segment(p0: Vec4, p1: Vec4) -> Option<(Vec4, Vec4)> {
    let d = p1 - p0;
    let mut t0 = 0.0_f32;
    let mut t1 = 1.0_f32;

    // each plane as (distance at p0, change along d); inside when >= 0
    let planes = [
        (p0.w - MIN_W, d.w),
        (p0.w + p0.x, d.w + d.x),
        (p0.w - p0.x, d.w - d.x),
        (p0.w + p0.y, d.w + d.y),
        (p0.w - p0.y, d.w - d.y),
    ];
    for (dist, delta) in planes {
        if delta == 0.0 {
            if dist < 0.0 {
                return None;
            }
            continue;
        }
        let t = -dist / delta;
        if delta > 0.0 {
            t0 = t0.max(t);
        } else {
            t1 = t1.min(t);
        }
        if t0 > t1 {
            return None;
        }
    }
    Some((p0 + d * t0, p0 + d * t1))
}
