// viewer.rs — orientation, pointer drag and projection settings of the preview

use crate::mesh::Subdivision;
use crate::projection::ProjectionMode;
use glam::{Mat4, Vec2};

pub const PITCH_LIMIT: f32 = 90.0;
pub const DEFAULT_FOV: f32 = 60.0;
pub const Z_NEAR: f32 = 0.1;
pub const Z_FAR: f32 = 100.0;

/// View rotation in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Orientation {
    pub pitch: f32,
    pub yaw: f32,
}

impl Orientation {
    pub const INITIAL: Orientation = Orientation {
        pitch: 20.0,
        yaw: -30.0,
    };

    pub fn new(pitch: f32, yaw: f32) -> Self {
        Self {
            pitch: pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT),
            yaw,
        }
    }
}

impl Default for Orientation {
    fn default() -> Self {
        Self::INITIAL
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragState {
    Idle,
    Dragging { last: Vec2 },
}

pub struct SkyboxViewer {
    pub orientation: Orientation,
    pub drag: DragState,
    pub projection: ProjectionMode,
    pub subdivision: Subdivision,
    /// Degrees of rotation per pixel of pointer travel.
    pub sensitivity: f32,
    pub fov: f32,
    initial: Orientation,
    needs_redraw: bool,
}

impl Default for SkyboxViewer {
    fn default() -> Self {
        Self::new()
    }
}

impl SkyboxViewer {
    pub fn new() -> Self {
        Self::with_orientation(Orientation::INITIAL)
    }

    pub fn with_orientation(initial: Orientation) -> Self {
        Self {
            orientation: initial,
            drag: DragState::Idle,
            projection: ProjectionMode::Flat,
            subdivision: Subdivision::DEFAULT,
            sensitivity: 1.0,
            fov: DEFAULT_FOV,
            initial,
            needs_redraw: true,
        }
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.drag, DragState::Dragging { .. })
    }

    pub fn pointer_pressed(&mut self, position: Vec2) {
        self.drag = DragState::Dragging { last: position };
    }

    /// Returns `true` when the orientation changed.
    pub fn pointer_moved(&mut self, position: Vec2) -> bool {
        let DragState::Dragging { last } = self.drag else {
            return false;
        };

        let delta = (position - last) * self.sensitivity;
        let before = self.orientation;
        self.orientation.pitch = (self.orientation.pitch + delta.y).clamp(-PITCH_LIMIT, PITCH_LIMIT);
        self.orientation.yaw += delta.x;
        self.drag = DragState::Dragging { last: position };

        let changed = self.orientation != before;
        self.needs_redraw |= changed;
        changed
    }

    pub fn pointer_released(&mut self) {
        self.drag = DragState::Idle;
    }

    pub fn set_projection(&mut self, mode: ProjectionMode) {
        if self.projection != mode {
            self.projection = mode;
            self.needs_redraw = true;
        }
    }

    pub fn set_subdivision(&mut self, subdivision: Subdivision) {
        if self.subdivision != subdivision {
            self.subdivision = subdivision;
            self.needs_redraw = true;
        }
    }

    pub fn reset_view(&mut self) {
        self.orientation = self.initial;
        self.drag = DragState::Idle;
        self.needs_redraw = true;
    }

    pub fn request_redraw(&mut self) {
        self.needs_redraw = true;
    }

    /// Clears and returns the redraw flag.
    pub fn take_redraw(&mut self) -> bool {
        std::mem::take(&mut self.needs_redraw)
    }

    /// Pitch about X after yaw about Y, camera at the cube center.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_rotation_x(self.orientation.pitch.to_radians())
            * Mat4::from_rotation_y(self.orientation.yaw.to_radians())
    }

    pub fn view_projection(&self, aspect: f32) -> Mat4 {
        let aspect = if aspect.is_finite() && aspect > 0.0 { aspect } else { 1.0 };
        Mat4::perspective_rh(self.fov.to_radians(), aspect, Z_NEAR, Z_FAR) * self.view_matrix()
    }
}
