/// Camera: low-level passive data container.
///
/// The Camera computes nothing beyond the combined view-projection matrix.
/// The caller sets the eye position, view and projection matrices and the
/// viewport. Every setter bumps a revision so shaders can skip re-uploading
/// camera uniforms that did not change since their last draw.

use std::sync::atomic::{AtomicU64, Ordering};
use glam::{Mat4, Vec3};

static NEXT_CAMERA_ID: AtomicU64 = AtomicU64::new(1);

/// Viewport rectangle in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { x: 0, y: 0, width, height }
    }

    /// Width / height, 1.0 for an empty viewport
    pub fn aspect(&self) -> f32 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }
}

/// Identity of a camera state: camera id and revision
pub type CameraStamp = (u64, u64);

/// Low-level camera. A passive data container.
#[derive(Debug)]
pub struct Camera {
    id: u64,
    revision: u64,
    eye: Vec3,
    view_matrix: Mat4,
    projection_matrix: Mat4,
    viewport: Viewport,
}

impl Camera {
    pub fn new(eye: Vec3, view: Mat4, projection: Mat4, viewport: Viewport) -> Self {
        Self {
            id: NEXT_CAMERA_ID.fetch_add(1, Ordering::Relaxed),
            revision: 0,
            eye,
            view_matrix: view,
            projection_matrix: projection,
            viewport,
        }
    }

    /// Camera at `eye` looking at `center` (right-handed, `up` hint)
    pub fn looking_at(eye: Vec3, center: Vec3, up: Vec3, projection: Mat4, viewport: Viewport) -> Self {
        Self::new(eye, Mat4::look_at_rh(eye, center, up), projection, viewport)
    }

    // ===== GETTERS =====

    /// World-space eye position
    pub fn eye(&self) -> Vec3 {
        self.eye
    }

    pub fn view_matrix(&self) -> &Mat4 {
        &self.view_matrix
    }

    pub fn projection_matrix(&self) -> &Mat4 {
        &self.projection_matrix
    }

    /// Combined view-projection matrix (projection * view).
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix * self.view_matrix
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Changes whenever any camera field is set
    pub fn stamp(&self) -> CameraStamp {
        (self.id, self.revision)
    }

    // ===== SETTERS (store, compute nothing) =====

    pub fn set_eye(&mut self, eye: Vec3) {
        self.eye = eye;
        self.revision += 1;
    }

    pub fn set_view(&mut self, matrix: Mat4) {
        self.view_matrix = matrix;
        self.revision += 1;
    }

    /// Move the eye and aim it at `center`
    pub fn look_at(&mut self, eye: Vec3, center: Vec3, up: Vec3) {
        self.eye = eye;
        self.view_matrix = Mat4::look_at_rh(eye, center, up);
        self.revision += 1;
    }

    pub fn set_projection(&mut self, matrix: Mat4) {
        self.projection_matrix = matrix;
        self.revision += 1;
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.revision += 1;
    }
}

#[cfg(test)]
#[path = "camera_tests.rs"]
mod tests;
