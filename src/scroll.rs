//! Viewport scrolling: caret-visibility margins and per-axis animation.
//!
//! Offsets are in pixels. Each axis animates independently toward its
//! target by a fixed fraction of the remaining distance per frame, with a
//! minimum step so convergence takes a bounded number of frames and a snap
//! threshold that stops the floating-point asymptote.

/// Horizontal margin kept between the caret and the viewport edge.
const MARGIN_X: f32 = 48.0;
/// Vertical margin kept between the caret and the viewport edge.
const MARGIN_Y: f32 = 24.0;
/// Fraction of the remaining distance covered per 60 Hz frame.
const STEP_FRACTION: f32 = 0.25;
/// Minimum animation step per frame, in pixels.
const MIN_STEP: f32 = 0.75;
/// Distance at which the offset snaps to the target and the axis stops.
const SNAP_DISTANCE: f32 = 0.5;
/// Targets closer than this to the active one are treated as re-requests.
const RETARGET_EPSILON: f32 = 0.5;

#[derive(Debug, Clone, Copy, Default)]
struct Axis {
    current: f32,
    target: f32,
    active: bool,
}

impl Axis {
    fn set_target(&mut self, target: f32) {
        let target = target.max(0.0);
        // Re-requesting an already-active target is a no-op.
        if self.active && (self.target - target).abs() < RETARGET_EPSILON {
            return;
        }
        self.target = target;
        if (target - self.current).abs() <= SNAP_DISTANCE {
            self.current = target;
            self.active = false;
        } else {
            self.active = true;
        }
    }

    fn tick(&mut self, frames: f32) -> bool {
        if !self.active {
            return false;
        }
        let remaining = self.target - self.current;
        if remaining.abs() <= SNAP_DISTANCE {
            self.current = self.target;
            self.active = false;
            return false;
        }
        let mut step = remaining * (1.0 - (1.0 - STEP_FRACTION).powf(frames));
        if step.abs() < MIN_STEP {
            step = MIN_STEP.copysign(remaining);
        }
        if step.abs() >= remaining.abs() {
            self.current = self.target;
            self.active = false;
            return false;
        }
        self.current += step;
        true
    }

    fn snap(&mut self) {
        self.current = self.target;
        self.active = false;
    }
}

#[derive(Debug, Clone, Default)]
pub struct ViewportScroller {
    x: Axis,
    y: Axis,
    viewport_width: f32,
    viewport_height: f32,
    /// Set by an explicit jump; suppresses margin-driven retargeting until
    /// the next tick so the jump wins for that frame.
    jump_pending: bool,
}

impl ViewportScroller {
    pub fn new(viewport_width: f32, viewport_height: f32) -> Self {
        Self {
            viewport_width: viewport_width.max(1.0),
            viewport_height: viewport_height.max(1.0),
            ..Self::default()
        }
    }

    pub fn set_viewport(&mut self, width: f32, height: f32) {
        self.viewport_width = width.max(1.0);
        self.viewport_height = height.max(1.0);
    }

    pub fn viewport(&self) -> (f32, f32) {
        (self.viewport_width, self.viewport_height)
    }

    /// Current animated offset.
    pub fn offset(&self) -> (f32, f32) {
        (self.x.current, self.y.current)
    }

    /// Animation target per axis.
    pub fn target(&self) -> (f32, f32) {
        (self.x.target, self.y.target)
    }

    pub fn is_animating(&self) -> bool {
        self.x.active || self.y.active
    }

    /// Retargets any axis whose margin the caret violates. `caret_x`/
    /// `caret_y` are content-space pixels of the caret's top-left corner.
    pub fn ensure_visible(&mut self, caret_x: f32, caret_y: f32, line_height: f32) {
        if self.jump_pending {
            return;
        }
        let margin_x = MARGIN_X.min(self.viewport_width / 4.0);
        let margin_y = MARGIN_Y.min(self.viewport_height / 4.0);

        if caret_x < self.x.current + margin_x {
            self.x.set_target(caret_x - margin_x);
        } else if caret_x > self.x.current + self.viewport_width - margin_x {
            self.x.set_target(caret_x - (self.viewport_width - margin_x));
        }

        if caret_y < self.y.current + margin_y {
            self.y.set_target(caret_y - margin_y);
        } else if caret_y + line_height > self.y.current + self.viewport_height - margin_y {
            self.y
                .set_target(caret_y + line_height - (self.viewport_height - margin_y));
        }
    }

    /// Explicit jump request (line jump, bookmark restore): sets the targets
    /// directly and takes priority over margin computation this frame.
    pub fn jump_to(&mut self, x: f32, y: f32) {
        self.x.set_target(x);
        self.y.set_target(y);
        self.jump_pending = true;
    }

    /// Skips the animation, landing both axes on their targets.
    pub fn snap(&mut self) {
        self.x.snap();
        self.y.snap();
        self.jump_pending = false;
    }

    /// Advances the animation by `dt` seconds. Returns true while either
    /// axis is still moving.
    pub fn tick(&mut self, dt: f32) -> bool {
        self.jump_pending = false;
        let frames = (dt * 60.0).clamp(0.25, 4.0);
        let x_moving = self.x.tick(frames);
        let y_moving = self.y.tick(frames);
        x_moving || y_moving
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: f32 = 1.0 / 60.0;

    fn scroller() -> ViewportScroller {
        ViewportScroller::new(800.0, 600.0)
    }

    #[test]
    fn caret_inside_margins_does_not_scroll() {
        let mut s = scroller();
        s.ensure_visible(400.0, 300.0, 16.0);
        assert!(!s.is_animating());
        assert_eq!(s.offset(), (0.0, 0.0));
    }

    #[test]
    fn caret_below_viewport_sets_a_clamped_target() {
        let mut s = scroller();
        s.ensure_visible(0.0, 2000.0, 16.0);
        let (_, ty) = s.target();
        assert!(ty > 0.0);
        assert_eq!(ty, 2000.0 + 16.0 - (600.0 - 24.0));
    }

    #[test]
    fn caret_above_viewport_never_targets_negative_offset() {
        let mut s = scroller();
        s.jump_to(0.0, 500.0);
        s.snap();
        s.ensure_visible(0.0, 2.0, 16.0);
        let (_, ty) = s.target();
        assert_eq!(ty, 0.0);
    }

    #[test]
    fn animation_converges_and_snaps_in_bounded_frames() {
        let mut s = scroller();
        s.jump_to(0.0, 10_000.0);
        let mut frames = 0;
        while s.tick(FRAME) {
            frames += 1;
            assert!(frames < 10_000, "animation failed to converge");
        }
        assert_eq!(s.offset().1, 10_000.0);
        assert!(!s.is_animating());
    }

    #[test]
    fn minimum_step_finishes_short_distances_quickly() {
        let mut s = scroller();
        s.jump_to(0.0, 3.0);
        let mut frames = 0;
        while s.tick(FRAME) {
            frames += 1;
        }
        // 3 px at >= 0.75 px/frame: a handful of frames, not an asymptote.
        assert!(frames <= 4, "took {frames} frames");
    }

    #[test]
    fn axes_animate_independently() {
        let mut s = scroller();
        s.jump_to(100.0, 0.0);
        while s.tick(FRAME) {}
        let (x, y) = s.offset();
        assert_eq!(x, 100.0);
        assert_eq!(y, 0.0);
    }

    #[test]
    fn jump_suppresses_margin_retarget_for_one_frame() {
        let mut s = scroller();
        s.jump_to(0.0, 5_000.0);
        // A visibility request in the same frame loses to the jump.
        s.ensure_visible(0.0, 0.0, 16.0);
        assert_eq!(s.target().1, 5_000.0);
        s.tick(FRAME);
        // Next frame the margins apply again.
        s.ensure_visible(0.0, 0.0, 16.0);
        assert_eq!(s.target().1, 0.0);
    }

    #[test]
    fn rerequesting_active_target_is_a_noop() {
        let mut s = scroller();
        s.jump_to(0.0, 1_000.0);
        s.tick(FRAME);
        let mid = s.offset().1;
        assert!(mid > 0.0 && mid < 1_000.0);
        s.jump_to(0.0, 1_000.0);
        assert_eq!(s.offset().1, mid);
        assert_eq!(s.target().1, 1_000.0);
    }
}
