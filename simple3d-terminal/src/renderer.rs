/// Ray-cast ASCII renderer for terminal output
use crossterm::{
    style::{Color, Print, ResetColor, SetForegroundColor},
    QueueableCommand,
};
use nalgebra::Vector3;
use simple3d_core::{Camera, ObjectId, Scene, Viewport};
use std::io::Write;

/// Character luminosity ramp for depth/shading (darkest to lightest)
const LUMINOSITY_RAMP: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// Light falling on surfaces that face away from the light
const AMBIENT: f32 = 0.15;

/// ASCII renderer that shades the nearest surface under each character cell
pub struct AsciiRenderer {
    width: usize,
    height: usize,
    char_buffer: Vec<char>,
    highlight: Vec<bool>,
    light_dir: Vector3<f32>,
}

impl AsciiRenderer {
    pub fn new(width: usize, height: usize) -> Self {
        let size = width * height;
        Self {
            width,
            height,
            char_buffer: vec![' '; size],
            highlight: vec![false; size],
            light_dir: Vector3::new(-0.4, 1.0, 0.6).normalize(),
        }
    }

    /// Direction towards the light; ignored when zero
    pub fn set_light_direction(&mut self, direction: Vector3<f32>) {
        if let Some(direction) = direction.try_normalize(f32::EPSILON) {
            self.light_dir = direction;
        }
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        *self = Self {
            light_dir: self.light_dir,
            ..Self::new(width, height)
        };
    }

    /// Viewport in character cells, the same space pointer events arrive in
    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.width as f32, self.height as f32)
    }

    pub fn clear(&mut self) {
        self.char_buffer.fill(' ');
        self.highlight.fill(false);
    }

    /// Cast one ray through the centre of every cell
    pub fn render_scene(&mut self, scene: &Scene, camera: &Camera, hovered: Option<ObjectId>) {
        self.clear();
        let viewport = self.viewport();
        for y in 0..self.height {
            for x in 0..self.width {
                let Ok(ndc) = viewport.screen_to_ndc(x as f32 + 0.5, y as f32 + 0.5) else {
                    return;
                };
                let Ok(ray) = camera.ray_through(&ndc) else {
                    continue;
                };
                if let Some(hit) = scene.first_hit(&ray) {
                    let idx = y * self.width + x;
                    let brightness = hit.normal.dot(&self.light_dir).max(0.0) * (1.0 - AMBIENT) + AMBIENT;
                    self.char_buffer[idx] = shade(brightness);
                    self.highlight[idx] = hovered == Some(hit.object);
                }
            }
        }
    }

    pub fn char_at(&self, x: usize, y: usize) -> Option<char> {
        (x < self.width && y < self.height).then(|| self.char_buffer[y * self.width + x])
    }

    pub fn is_highlighted(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height && self.highlight[y * self.width + x]
    }

    pub fn draw<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        for y in 0..self.height {
            for x in 0..self.width {
                let idx = y * self.width + x;
                let c = self.char_buffer[idx];

                // Color based on character intensity
                let color = if self.highlight[idx] {
                    Color::Yellow
                } else {
                    match c {
                        ' ' | '.' | ':' => Color::DarkGrey,
                        '-' | '=' => Color::Grey,
                        '+' | '*' => Color::White,
                        '#' | '%' | '@' => Color::Cyan,
                        _ => Color::White,
                    }
                };

                writer.queue(SetForegroundColor(color))?;
                writer.queue(Print(c))?;
            }
            if y + 1 < self.height {
                writer.queue(Print("\r\n"))?;
            }
        }
        writer.queue(ResetColor)?;
        Ok(())
    }
}

fn shade(brightness: f32) -> char {
    // Index 0 is blank; lit surfaces always get a visible glyph
    let steps = (LUMINOSITY_RAMP.len() - 2) as f32;
    let index = 1 + (brightness.clamp(0.0, 1.0) * steps).round() as usize;
    LUMINOSITY_RAMP[index.min(LUMINOSITY_RAMP.len() - 1)]
}
