// esp.rs — ESP (Extra-Sensory Perception) overlay drawing logic.
//
// Runs once per overlay frame (driven by scheduler.rs). It reads the camera
// matrix, reads each enabled target's world position, projects it to screen
// space and draws either a box or a crosshair with the target's label.
//
// Nothing here reports errors: a missing camera, a null instance or a point
// behind the camera just means that target is not drawn this frame.

use crate::camera::MatrixSource;
use crate::canvas::{Argb, Canvas};
use crate::entities::{DrawStyle, PositionReader, TrackedEntity};
use crate::math::Vec2;
use crate::projection::world_to_screen;
use crate::state::SharedState;
use std::sync::Arc;

// ============================================================
// Style Constants
// ============================================================

const BOX_WIDTH: f32 = 50.0;
const BOX_HEIGHT: f32 = 100.0;
const BOX_THICKNESS: f32 = 2.0;
const BOX_LABEL_RISE: f32 = 20.0;   // Label baseline above the box top

const CROSS_HALF: f32 = 5.0;
const CROSS_THICKNESS: f32 = 5.0;
const CROSS_LABEL_DX: f32 = -20.0;
const CROSS_LABEL_DY: f32 = 10.0;

const LABEL_SIZE: f32 = 16.0;

// ============================================================
// Target Drawing
// ============================================================

/// Box standing on `at` (the projected feet), label above the top-left corner.
fn draw_box<C: Canvas + ?Sized>(canvas: &C, at: Vec2, label: &str, color: Argb) {
    let x = at.x - BOX_WIDTH / 2.0;
    let y = at.y - BOX_HEIGHT;
    let (r, b) = (x + BOX_WIDTH, y + BOX_HEIGHT);

    canvas.draw_line(x, y, r, y, BOX_THICKNESS, color); // Top
    canvas.draw_line(x, y, x, b, BOX_THICKNESS, color); // Left
    canvas.draw_line(r, y, r, b, BOX_THICKNESS, color); // Right
    canvas.draw_line(x, b, r, b, BOX_THICKNESS, color); // Bottom
    canvas.draw_text(x, y - BOX_LABEL_RISE, LABEL_SIZE, label, color);
}

/// Plus sign centred on `at`, label below and to the left.
fn draw_crosshair<C: Canvas + ?Sized>(canvas: &C, at: Vec2, label: &str, color: Argb) {
    canvas.draw_line(at.x - CROSS_HALF, at.y, at.x + CROSS_HALF, at.y, CROSS_THICKNESS, color);
    canvas.draw_line(at.x, at.y - CROSS_HALF, at.x, at.y + CROSS_HALF, CROSS_THICKNESS, color);
    canvas.draw_text(at.x + CROSS_LABEL_DX, at.y + CROSS_LABEL_DY, LABEL_SIZE, label, color);
}

pub fn draw_target<C: Canvas + ?Sized>(canvas: &C, entity: &TrackedEntity, at: Vec2) {
    match entity.style {
        DrawStyle::Box => draw_box(canvas, at, &entity.label, entity.color),
        DrawStyle::Crosshair => draw_crosshair(canvas, at, &entity.label, entity.color),
    }
}

// ============================================================
// Frame Handler
// ============================================================

/// Everything one overlay frame needs.
pub struct EspOverlay<M, P, C> {
    matrix: M,
    positions: P,
    canvas: C,
    entities: Vec<TrackedEntity>,
    state: Arc<SharedState>,
}

impl<M, P, C> EspOverlay<M, P, C>
where
    M: MatrixSource,
    P: PositionReader,
    C: Canvas,
{
    /// `entities[i]` is controlled by `state.slot(i)`.
    pub fn new(matrix: M, positions: P, canvas: C, entities: Vec<TrackedEntity>, state: Arc<SharedState>) -> Self {
        Self { matrix, positions, canvas, entities, state }
    }

    /// Draw one frame. Returns how many targets were drawn.
    pub fn on_frame(&self) -> usize {
        // Cheap exit while every toggle is off: no matrix read, no memory reads.
        if !self.state.any_enabled() {
            return 0;
        }

        let matrix = self.matrix.read_matrix();
        if matrix.is_zero() {
            // No camera this frame.
            return 0;
        }
        let (width, height) = (self.canvas.screen_width(), self.canvas.screen_height());

        let mut drawn = 0;
        for (entity, slot) in self.entities.iter().zip(self.state.slots()) {
            if !slot.is_enabled() {
                continue;
            }

            let world = self.positions.read_position(slot.instance(), &entity.position);
            let Some(screen) = world_to_screen(world, &matrix, width, height) else { continue };

            draw_target(&self.canvas, entity, screen);
            tracing::debug!("{} on screen at ({:.2}, {:.2})", entity.label, screen.x, screen.y);
            drawn += 1;
        }
        drawn
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::testing::{DrawCall, RecordingCanvas};
    use crate::entities::PositionSource;
    use crate::math::{Matrix4x4, Vec3};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Matrix source returning a fixed matrix and counting reads.
    struct FixedMatrix {
        m: Matrix4x4,
        reads: AtomicUsize,
    }

    impl FixedMatrix {
        fn new(m: Matrix4x4) -> Self {
            Self { m, reads: AtomicUsize::new(0) }
        }
    }

    impl MatrixSource for FixedMatrix {
        fn read_matrix(&self) -> Matrix4x4 {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.m
        }
    }

    /// Position reader returning a fixed vector for any non-null instance.
    struct FixedPosition(Vec3);

    impl PositionReader for FixedPosition {
        fn read_position(&self, instance: usize, _: &PositionSource) -> Vec3 {
            if instance == 0 { Vec3::ZERO } else { self.0 }
        }
    }

    /// Matrix taking world (10, 5, 20) to (800, 400) on a 1920x1080 screen:
    /// w = 1, nx = 800/960 - 1, ny = 1 - 400/540, plus the translation.
    fn matrix_to_800_400() -> Matrix4x4 {
        let mut m = Matrix4x4::ZERO;
        m.m[15] = 1.0;
        m.m[12] = 800.0 / 960.0 - 1.0;
        m.m[13] = 1.0 - 400.0 / 540.0;
        m
    }

    fn overlay(
        matrix: Matrix4x4,
        pos: Vec3,
    ) -> (EspOverlay<Arc<FixedMatrix>, FixedPosition, Arc<RecordingCanvas>>, Arc<FixedMatrix>, Arc<RecordingCanvas>, Arc<SharedState>) {
        let entities = TrackedEntity::defaults();
        let state = Arc::new(SharedState::new(entities.iter().map(|e| e.instance)));
        let m = Arc::new(FixedMatrix::new(matrix));
        let canvas = Arc::new(RecordingCanvas::with_size(1920, 1080));
        let o = EspOverlay::new(m.clone(), FixedPosition(pos), canvas.clone(), entities, state.clone());
        (o, m, canvas, state)
    }

    #[test]
    fn granny_box_end_to_end() {
        let (o, _, canvas, state) = overlay(matrix_to_800_400(), Vec3::new(10.0, 5.0, 20.0));
        state.slot(0).unwrap().set_enabled(true);

        assert_eq!(o.on_frame(), 1);
        let calls = canvas.take();
        let lines: Vec<_> = calls.iter().filter(|c| matches!(c, DrawCall::Line { .. })).collect();
        let texts: Vec<_> = calls.iter().filter(|c| matches!(c, DrawCall::Text { .. })).collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(texts.len(), 1);

        let DrawCall::Text { x, y, size, text, color } = texts[0] else { unreachable!() };
        assert_eq!(text, "Granny");
        assert_eq!(*color, 0xFFFF_0000);
        assert_eq!(*size, 16.0);
        // Box top-left is (800 - 25, 400 - 100); label sits 20 px above it.
        assert!((x - 775.0).abs() < 1e-3, "x = {x}");
        assert!((y - 280.0).abs() < 1e-3, "y = {y}");

        for l in lines {
            let DrawCall::Line { thickness, color, .. } = l else { unreachable!() };
            assert_eq!(*thickness, 2.0);
            assert_eq!(*color, 0xFFFF_0000);
        }
    }

    #[test]
    fn last_sighting_crosshair() {
        let mut m = Matrix4x4::ZERO;
        m.m[15] = 1.0; // everything lands on the screen centre
        let (o, _, canvas, state) = overlay(m, Vec3::new(1.0, 2.0, 3.0));
        state.slot(1).unwrap().set_enabled(true);

        assert_eq!(o.on_frame(), 1);
        assert_eq!(
            canvas.take(),
            vec![
                DrawCall::Line { x1: 955.0, y1: 540.0, x2: 965.0, y2: 540.0, thickness: 5.0, color: 0xFF00_00FF },
                DrawCall::Line { x1: 960.0, y1: 535.0, x2: 960.0, y2: 545.0, thickness: 5.0, color: 0xFF00_00FF },
                DrawCall::Text { x: 940.0, y: 550.0, size: 16.0, text: "Last Sighting".into(), color: 0xFF00_00FF },
            ]
        );
    }

    #[test]
    fn all_toggles_off_skips_everything() {
        let (o, m, canvas, _) = overlay(matrix_to_800_400(), Vec3::new(10.0, 5.0, 20.0));
        assert_eq!(o.on_frame(), 0);
        assert_eq!(m.reads.load(Ordering::SeqCst), 0);
        assert!(canvas.take().is_empty());
    }

    #[test]
    fn toggle_off_takes_effect_next_frame() {
        let (o, m, canvas, state) = overlay(matrix_to_800_400(), Vec3::new(10.0, 5.0, 20.0));
        let granny = state.slot(0).unwrap();
        let sighting = state.slot(1).unwrap();
        granny.set_enabled(true);
        sighting.set_enabled(true);
        assert_eq!(o.on_frame(), 2);
        // One matrix read per frame, not per target.
        assert_eq!(m.reads.load(Ordering::SeqCst), 1);
        assert_eq!(canvas.texts(), vec!["Granny".to_string(), "Last Sighting".to_string()]);
        canvas.take();

        granny.set_enabled(false);
        assert_eq!(o.on_frame(), 1);
        assert_eq!(m.reads.load(Ordering::SeqCst), 2);
        assert_eq!(canvas.texts(), vec!["Last Sighting".to_string()]);
    }

    #[test]
    fn zero_matrix_draws_nothing() {
        let (o, m, canvas, state) = overlay(Matrix4x4::ZERO, Vec3::new(10.0, 5.0, 20.0));
        state.slot(0).unwrap().set_enabled(true);
        assert_eq!(o.on_frame(), 0);
        assert_eq!(m.reads.load(Ordering::SeqCst), 1);
        assert_eq!(canvas.lines(), 0);
    }

    #[test]
    fn null_instance_reads_as_origin() {
        // Origin still projects with this matrix; the overlay cannot tell it apart.
        let mut m = Matrix4x4::ZERO;
        m.m[15] = 1.0;
        let (o, _, canvas, state) = overlay(m, Vec3::new(10.0, 5.0, 20.0));
        let granny = state.slot(0).unwrap();
        granny.set_instance(0);
        granny.set_enabled(true);
        assert_eq!(o.on_frame(), 1);
        assert_eq!(canvas.texts(), vec!["Granny".to_string()]);
    }

    #[test]
    fn behind_camera_is_skipped() {
        let mut m = Matrix4x4::ZERO;
        m.m[15] = -1.0;
        let (o, _, canvas, state) = overlay(m, Vec3::new(10.0, 5.0, 20.0));
        state.slot(0).unwrap().set_enabled(true);
        state.slot(1).unwrap().set_enabled(true);
        assert_eq!(o.on_frame(), 0);
        assert!(canvas.take().is_empty());
    }
}
