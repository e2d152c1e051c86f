// renderer/state.rs
//
// Raster-state transitions of one portal, as named operations. The portal
// renderer issues the geometry in between; this type owns every stencil,
// depth and color-mask change so the ordering lives in one place.

use crate::renderer::gfx::{CompareFunction, GraphicsContext, StencilOperation, STENCIL_ALL};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortalPhase {
    Idle,
    /// Portal aperture is being written into the stencil buffer.
    Mask,
    /// Depth inside the aperture is being pushed back to the far plane.
    DepthReset,
    SecondaryView,
    SecondaryDraw,
    /// Portal surface depth is being written back.
    Restore,
}

/// Tracks the phase of one portal at a given nesting level. Level 1 is a
/// portal seen from the primary camera; its stencil reference is 1, and each
/// nested level adds one.
#[derive(Debug)]
pub struct PortalPasses {
    level: u32,
    phase: PortalPhase,
}

impl PortalPasses {
    pub fn new(level: u32) -> Self {
        debug_assert!(level >= 1, "portal levels start at 1");
        Self {
            level,
            phase: PortalPhase::Idle,
        }
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn phase(&self) -> PortalPhase {
        self.phase
    }

    fn advance(&mut self, expected: PortalPhase, next: PortalPhase) {
        debug_assert_eq!(
            self.phase, expected,
            "portal level {} entering {:?}",
            self.level, next
        );
        log::trace!("portal level {}: {:?} -> {:?}", self.level, self.phase, next);
        self.phase = next;
    }

    /// Stencil writes the aperture with the level as reference, color off.
    /// Nested levels only mark pixels inside the parent aperture.
    pub fn begin_mask(&mut self, ctx: &mut dyn GraphicsContext) {
        self.advance(PortalPhase::Idle, PortalPhase::Mask);

        if self.level == 1 {
            ctx.set_stencil_test(true);
            ctx.clear_stencil();
            ctx.stencil_op(
                StencilOperation::Keep,
                StencilOperation::Keep,
                StencilOperation::Replace,
            );
            ctx.stencil_func(CompareFunction::Always, 1, STENCIL_ALL);
        } else {
            ctx.stencil_op(
                StencilOperation::Keep,
                StencilOperation::Keep,
                StencilOperation::IncrementClamp,
            );
            ctx.stencil_func(CompareFunction::Equal, self.level - 1, STENCIL_ALL);
        }
        ctx.stencil_write_mask(STENCIL_ALL);
        ctx.color_mask(false);
    }

    pub fn begin_depth_reset(&mut self, ctx: &mut dyn GraphicsContext) {
        self.advance(PortalPhase::Mask, PortalPhase::DepthReset);

        ctx.stencil_func(CompareFunction::Equal, self.level, STENCIL_ALL);
        ctx.stencil_op(
            StencilOperation::Keep,
            StencilOperation::Keep,
            StencilOperation::Keep,
        );
        ctx.stencil_write_mask(0);
        ctx.depth_func(CompareFunction::Always);
        ctx.color_mask(true);
    }

    pub fn end_depth_reset(&mut self, ctx: &mut dyn GraphicsContext) {
        self.advance(PortalPhase::DepthReset, PortalPhase::SecondaryView);
        ctx.depth_func(CompareFunction::Less);
    }

    pub fn begin_secondary_draw(&mut self) {
        self.advance(PortalPhase::SecondaryView, PortalPhase::SecondaryDraw);
    }

    /// Color off and depth always, so redrawing the portal surface puts its
    /// depth back. Nested levels also hand the aperture back to the parent.
    pub fn begin_restore(&mut self, ctx: &mut dyn GraphicsContext) {
        self.advance(PortalPhase::SecondaryDraw, PortalPhase::Restore);

        ctx.color_mask(false);
        ctx.depth_func(CompareFunction::Always);
        if self.level > 1 {
            ctx.stencil_func(CompareFunction::Equal, self.level, STENCIL_ALL);
            ctx.stencil_op(
                StencilOperation::Keep,
                StencilOperation::Keep,
                StencilOperation::DecrementClamp,
            );
            ctx.stencil_write_mask(STENCIL_ALL);
        }
    }

    /// Leaves the context as the parent view expects it: stencil disabled,
    /// cleared and reset to its initial registers at level 1, restricted to
    /// the parent aperture otherwise.
    pub fn end_portal(&mut self, ctx: &mut dyn GraphicsContext) {
        self.advance(PortalPhase::Restore, PortalPhase::Idle);

        ctx.depth_func(CompareFunction::Less);
        ctx.color_mask(true);
        if self.level == 1 {
            ctx.stencil_write_mask(STENCIL_ALL);
            ctx.clear_stencil();
            ctx.set_stencil_test(false);
            ctx.stencil_func(CompareFunction::Always, 0, STENCIL_ALL);
            ctx.stencil_op(
                StencilOperation::Keep,
                StencilOperation::Keep,
                StencilOperation::Keep,
            );
        } else {
            ctx.stencil_func(CompareFunction::Equal, self.level - 1, STENCIL_ALL);
            ctx.stencil_op(
                StencilOperation::Keep,
                StencilOperation::Keep,
                StencilOperation::Keep,
            );
            ctx.stencil_write_mask(0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::recording::{GfxCommand, RasterState, RecordingContext};

    fn run_phases(passes: &mut PortalPasses, ctx: &mut RecordingContext) {
        passes.begin_mask(ctx);
        passes.begin_depth_reset(ctx);
        passes.end_depth_reset(ctx);
        passes.begin_secondary_draw();
        passes.begin_restore(ctx);
        passes.end_portal(ctx);
    }

    #[test]
    fn first_level_round_trips_raster_state() {
        let mut ctx = RecordingContext::new();
        let mut passes = PortalPasses::new(1);
        run_phases(&mut passes, &mut ctx);

        assert_eq!(passes.phase(), PortalPhase::Idle);
        assert_eq!(*ctx.state(), RasterState::default());
        assert_eq!(ctx.count(|c| *c == GfxCommand::ClearStencil), 2);
    }

    #[test]
    fn outer_level_resets_registers_left_by_nested_level() {
        let mut ctx = RecordingContext::new();
        let mut outer = PortalPasses::new(1);
        outer.begin_mask(&mut ctx);
        outer.begin_depth_reset(&mut ctx);
        outer.end_depth_reset(&mut ctx);
        outer.begin_secondary_draw();
        run_phases(&mut PortalPasses::new(2), &mut ctx);
        assert_eq!(ctx.state().stencil_compare, CompareFunction::Equal);
        outer.begin_restore(&mut ctx);
        outer.end_portal(&mut ctx);

        let state = ctx.state();
        assert!(!state.stencil_test);
        assert_eq!(state.stencil_compare, CompareFunction::Always);
        assert_eq!(state.stencil_reference, 0);
        assert_eq!(state.stencil_pass, StencilOperation::Keep);
        assert_eq!(*state, RasterState::default());
    }

    #[test]
    fn mask_phase_writes_reference_one() {
        let mut ctx = RecordingContext::new();
        let mut passes = PortalPasses::new(1);
        passes.begin_mask(&mut ctx);

        let state = ctx.state();
        assert!(state.stencil_test);
        assert_eq!(state.stencil_compare, CompareFunction::Always);
        assert_eq!(state.stencil_reference, 1);
        assert_eq!(state.stencil_pass, StencilOperation::Replace);
        assert_eq!(state.stencil_write_mask, STENCIL_ALL);
        assert!(!state.color_writes);
    }

    #[test]
    fn nested_level_restricts_to_parent_and_returns_to_it() {
        let mut ctx = RecordingContext::new();
        let mut passes = PortalPasses::new(2);

        passes.begin_mask(&mut ctx);
        assert_eq!(ctx.state().stencil_compare, CompareFunction::Equal);
        assert_eq!(ctx.state().stencil_reference, 1);
        assert_eq!(ctx.state().stencil_pass, StencilOperation::IncrementClamp);
        assert_eq!(ctx.count(|c| *c == GfxCommand::ClearStencil), 0);

        passes.begin_depth_reset(&mut ctx);
        assert_eq!(ctx.state().stencil_reference, 2);
        passes.end_depth_reset(&mut ctx);
        passes.begin_secondary_draw();
        passes.begin_restore(&mut ctx);
        assert_eq!(ctx.state().stencil_pass, StencilOperation::DecrementClamp);
        passes.end_portal(&mut ctx);

        let state = ctx.state();
        assert_eq!(state.stencil_compare, CompareFunction::Equal);
        assert_eq!(state.stencil_reference, 1);
        assert_eq!(state.stencil_pass, StencilOperation::Keep);
        assert_eq!(state.stencil_write_mask, 0);
        assert!(state.color_writes);
        assert_eq!(state.depth_compare, CompareFunction::Less);
    }

    #[test]
    #[should_panic]
    #[cfg(debug_assertions)]
    fn out_of_order_transition_is_caught() {
        let mut ctx = RecordingContext::new();
        let mut passes = PortalPasses::new(1);
        passes.begin_depth_reset(&mut ctx);
    }
}
