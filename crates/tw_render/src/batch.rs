use std::sync::Arc;

use crate::vertex::SpriteVertex;

/// A contiguous run of indices that share the same texture binding.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    pub texture_key: Arc<str>,
    pub index_start: u32,
    pub index_count: u32,
}

/// One axis-aligned quad in world space. `min` is the top-left corner in the
/// y-down world; `uv` is `[u0, v0, u1, v1]` with `v0` at the top edge.
#[derive(Debug, Clone, Copy)]
pub struct Quad<'a> {
    pub texture_key: &'a str,
    pub min: [f32; 2],
    pub size: [f32; 2],
    pub uv: [f32; 4],
    pub color: [f32; 4],
    pub flip_x: bool,
}

impl<'a> Quad<'a> {
    pub fn solid(texture_key: &'a str, min: [f32; 2], size: [f32; 2], color: [f32; 4]) -> Self {
        Self {
            texture_key,
            min,
            size,
            uv: [0.0, 0.0, 1.0, 1.0],
            color,
            flip_x: false,
        }
    }
}

/// CPU-side geometry for one frame, rebuilt every redraw.
#[derive(Debug, Default)]
pub struct SpriteBatch {
    pub vertices: Vec<SpriteVertex>,
    pub indices: Vec<u32>,
    pub draw_calls: Vec<DrawCall>,
}

impl SpriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.vertices.clear();
        self.indices.clear();
        self.draw_calls.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn push_quad(&mut self, quad: Quad<'_>) {
        let [x0, y0] = quad.min;
        let x1 = x0 + quad.size[0];
        let y1 = y0 + quad.size[1];
        let [mut u0, v0, mut u1, v1] = quad.uv;
        if quad.flip_x {
            std::mem::swap(&mut u0, &mut u1);
        }

        let base_index = self.vertices.len() as u32;
        for (position, tex_coords) in [
            ([x0, y0], [u0, v0]),
            ([x1, y0], [u1, v0]),
            ([x1, y1], [u1, v1]),
            ([x0, y1], [u0, v1]),
        ] {
            self.vertices.push(SpriteVertex {
                position,
                tex_coords,
                color: quad.color,
            });
        }

        let draw_start = self.indices.len() as u32;
        self.indices.extend_from_slice(&[
            base_index,
            base_index + 1,
            base_index + 2,
            base_index,
            base_index + 2,
            base_index + 3,
        ]);

        self.push_draw_call(quad.texture_key, draw_start, 6);
    }

    /// Outline a rectangle with four thin quads of `thickness` world units.
    pub fn push_outline(
        &mut self,
        texture_key: &str,
        min: [f32; 2],
        size: [f32; 2],
        thickness: f32,
        color: [f32; 4],
    ) {
        let [x, y] = min;
        let [w, h] = size;
        let t = thickness.min(w * 0.5).min(h * 0.5).max(0.0);
        self.push_quad(Quad::solid(texture_key, [x, y], [w, t], color));
        self.push_quad(Quad::solid(texture_key, [x, y + h - t], [w, t], color));
        self.push_quad(Quad::solid(texture_key, [x, y + t], [t, h - 2.0 * t], color));
        self.push_quad(Quad::solid(
            texture_key,
            [x + w - t, y + t],
            [t, h - 2.0 * t],
            color,
        ));
    }

    /// Merge with the previous draw call when the texture matches and the
    /// index ranges are contiguous.
    fn push_draw_call(&mut self, texture_key: &str, index_start: u32, index_count: u32) {
        if let Some(last) = self.draw_calls.last_mut() {
            let contiguous = last.index_start + last.index_count == index_start;
            if &*last.texture_key == texture_key && contiguous {
                last.index_count += index_count;
                return;
            }
        }
        self.draw_calls.push(DrawCall {
            texture_key: Arc::from(texture_key),
            index_start,
            index_count,
        });
    }

    pub fn texture_binds(&self) -> usize {
        let mut binds = 0usize;
        let mut current: Option<&str> = None;
        for draw in &self.draw_calls {
            let key: &str = &draw.texture_key;
            if current != Some(key) {
                current = Some(key);
                binds += 1;
            }
        }
        binds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHITE: [f32; 4] = [1.0; 4];

    #[test]
    fn consecutive_quads_with_same_texture_merge() {
        let mut batch = SpriteBatch::new();
        batch.push_quad(Quad::solid("map", [0.0, 0.0], [10.0, 10.0], WHITE));
        batch.push_quad(Quad::solid("map", [10.0, 0.0], [10.0, 10.0], WHITE));
        batch.push_quad(Quad::solid("player", [0.0, 0.0], [4.0, 4.0], WHITE));
        batch.push_quad(Quad::solid("map", [0.0, 0.0], [1.0, 1.0], WHITE));

        assert_eq!(batch.draw_calls.len(), 3);
        assert_eq!(batch.draw_calls[0].index_count, 12);
        assert_eq!(batch.draw_calls[1].index_start, 12);
        assert_eq!(batch.texture_binds(), 3);
        assert_eq!(batch.vertices.len(), 16);
        assert_eq!(batch.indices.len(), 24);
    }

    #[test]
    fn quad_corners_follow_y_down_layout() {
        let mut batch = SpriteBatch::new();
        batch.push_quad(Quad {
            texture_key: "sheet",
            min: [2.0, 3.0],
            size: [4.0, 5.0],
            uv: [0.25, 0.5, 0.5, 0.75],
            color: WHITE,
            flip_x: false,
        });
        assert_eq!(batch.vertices[0].position, [2.0, 3.0]);
        assert_eq!(batch.vertices[0].tex_coords, [0.25, 0.5]);
        assert_eq!(batch.vertices[2].position, [6.0, 8.0]);
        assert_eq!(batch.vertices[2].tex_coords, [0.5, 0.75]);
    }

    #[test]
    fn flip_x_mirrors_horizontal_texture_coordinates() {
        let mut batch = SpriteBatch::new();
        batch.push_quad(Quad {
            texture_key: "sheet",
            min: [0.0, 0.0],
            size: [1.0, 1.0],
            uv: [0.0, 0.0, 0.5, 1.0],
            color: WHITE,
            flip_x: true,
        });
        assert_eq!(batch.vertices[0].tex_coords, [0.5, 0.0]);
        assert_eq!(batch.vertices[1].tex_coords, [0.0, 0.0]);
    }

    #[test]
    fn outline_emits_four_quads_in_one_call() {
        let mut batch = SpriteBatch::new();
        batch.push_outline("white", [0.0, 0.0], [20.0, 10.0], 1.0, WHITE);
        assert_eq!(batch.vertices.len(), 16);
        assert_eq!(batch.draw_calls.len(), 1);
        batch.clear();
        assert!(batch.is_empty());
        assert!(batch.draw_calls.is_empty());
    }
}
