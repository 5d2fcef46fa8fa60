use glam::{Mat4, Vec2};

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
}

/// 2D camera over a y-down world. `position` is the world point shown at the
/// viewport centre; `scale` is screen pixels per world unit.
#[derive(Debug, Clone)]
pub struct Camera2D {
    pub position: Vec2,
    pub scale: f32,
    pub viewport: (u32, u32),
}

impl Camera2D {
    pub fn new(viewport_width: u32, viewport_height: u32) -> Self {
        Self {
            position: Vec2::ZERO,
            scale: 1.0,
            viewport: (viewport_width, viewport_height),
        }
    }

    fn half_viewport(&self) -> Vec2 {
        Vec2::new(self.viewport.0 as f32, self.viewport.1 as f32) * 0.5
    }

    pub fn screen_to_world(&self, screen: Vec2) -> Vec2 {
        self.position + (screen - self.half_viewport()) / self.scale
    }

    pub fn world_to_screen(&self, world: Vec2) -> Vec2 {
        (world - self.position) * self.scale + self.half_viewport()
    }

    pub fn build_uniform(&self) -> CameraUniform {
        let half = self.half_viewport() / self.scale;

        // Bottom/top are swapped relative to a y-up projection so world y grows downward.
        let proj = Mat4::orthographic_rh(
            self.position.x - half.x,
            self.position.x + half.x,
            self.position.y + half.y,
            self.position.y - half.y,
            -1.0,
            1.0,
        );

        CameraUniform {
            view_proj: proj.to_cols_array_2d(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    fn close(a: Vec2, b: Vec2) -> bool {
        (a - b).length() < 1e-4
    }

    #[test]
    fn viewport_centre_maps_to_camera_position() {
        let mut camera = Camera2D::new(800, 600);
        camera.position = Vec2::new(120.0, -40.0);
        camera.scale = 1.5;
        assert!(close(
            camera.screen_to_world(Vec2::new(400.0, 300.0)),
            camera.position
        ));
    }

    #[test]
    fn screen_and_world_round_trip() {
        let mut camera = Camera2D::new(1280, 720);
        camera.position = Vec2::new(500.0, 250.0);
        camera.scale = 1.5;
        let world = Vec2::new(530.0, 190.0);
        let screen = camera.world_to_screen(world);
        assert!(close(screen, Vec2::new(640.0 + 45.0, 360.0 - 90.0)));
        assert!(close(camera.screen_to_world(screen), world));
    }

    #[test]
    fn projection_is_y_down() {
        let mut camera = Camera2D::new(200, 100);
        camera.position = Vec2::new(10.0, 10.0);
        let m = Mat4::from_cols_array_2d(&camera.build_uniform().view_proj);

        let below = m * Vec4::new(10.0, 60.0, 0.0, 1.0);
        let right = m * Vec4::new(110.0, 10.0, 0.0, 1.0);
        // Larger world y lands at the bottom edge of clip space.
        assert!((below.y + 1.0).abs() < 1e-5);
        assert!((right.x - 1.0).abs() < 1e-5);
    }
}
