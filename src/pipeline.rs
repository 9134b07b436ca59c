//! Frame orchestration: one strictly ordered pipeline iteration per
//! displayed frame.
//!
//! The cycle is `Idle -> GeometryRebuild -> Compute -> Barrier -> Present ->
//! Idle`. Frames are fully serialized: no stage of frame N+1 starts before
//! frame N's present has been issued, which is what lets the geometry
//! rebuild drop the previous frame's scene buffer safely. Resize is never a
//! pipeline stage; the driver services it between Present and the next
//! GeometryRebuild.

use anyhow::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameState {
    Idle,
    GeometryRebuild,
    Compute,
    Barrier,
    Present,
}

impl FrameState {
    pub fn next(self) -> FrameState {
        match self {
            FrameState::Idle => FrameState::GeometryRebuild,
            FrameState::GeometryRebuild => FrameState::Compute,
            FrameState::Compute => FrameState::Barrier,
            FrameState::Barrier => FrameState::Present,
            FrameState::Present => FrameState::Idle,
        }
    }
}

/// The stage hooks a frame driver provides. `GpuFrame` in `main.rs`
/// implements this over the real device resources.
pub trait FrameStages {
    /// Recreates a stale render target, if a resize was recorded since the
    /// last frame. Returns `Ok(())` when nothing is pending. An error here
    /// means the frame has no valid target and must not run at all.
    fn service_resize(&mut self) -> Result<()>;
    /// Packs and uploads the scene, releasing the previous frame's buffer.
    fn rebuild_geometry(&mut self) -> Result<()>;
    /// Records the compute dispatch covering the render target.
    fn dispatch_compute(&mut self) -> Result<()>;
    /// Synchronization point: all compute writes to the target become
    /// visible before anything later reads it.
    fn barrier(&mut self);
    /// Draws the target to the surface and presents.
    fn present(&mut self) -> Result<()>;
}

/// Drives one frame through the state machine. A failing stage aborts the
/// rest of the frame; the caller logs it and retries on the next tick.
pub fn run_frame(stages: &mut impl FrameStages) -> Result<()> {
    // resize is an out-of-band interrupt, serviced only here, between the
    // previous frame's present and this frame's geometry rebuild. If the
    // replacement target cannot be created, no stage of this frame runs:
    // compute and present never see a stale-size target.
    stages.service_resize()?;

    let mut state = FrameState::Idle;
    loop {
        state = state.next();
        match state {
            FrameState::Idle => return Ok(()),
            FrameState::GeometryRebuild => stages.rebuild_geometry()?,
            FrameState::Compute => stages.dispatch_compute()?,
            FrameState::Barrier => stages.barrier(),
            FrameState::Present => stages.present()?,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;

    #[derive(Default)]
    struct Recorder {
        calls: Vec<&'static str>,
        fail_at: Option<&'static str>,
    }

    impl Recorder {
        fn step(&mut self, name: &'static str) -> Result<()> {
            self.calls.push(name);
            if self.fail_at == Some(name) {
                bail!("injected failure in {name}");
            }
            Ok(())
        }
    }

    impl FrameStages for Recorder {
        fn service_resize(&mut self) -> Result<()> {
            self.step("resize")
        }
        fn rebuild_geometry(&mut self) -> Result<()> {
            self.step("rebuild")
        }
        fn dispatch_compute(&mut self) -> Result<()> {
            self.step("dispatch")
        }
        fn barrier(&mut self) {
            self.calls.push("barrier");
        }
        fn present(&mut self) -> Result<()> {
            self.step("present")
        }
    }

    #[test]
    fn state_machine_cycles_in_order() {
        let mut state = FrameState::Idle;
        let mut seen = vec![];
        loop {
            state = state.next();
            seen.push(state);
            if state == FrameState::Idle {
                break;
            }
        }
        assert_eq!(
            seen,
            [
                FrameState::GeometryRebuild,
                FrameState::Compute,
                FrameState::Barrier,
                FrameState::Present,
                FrameState::Idle,
            ]
        );
    }

    #[test]
    fn stages_run_once_each_in_pipeline_order() {
        let mut recorder = Recorder::default();
        run_frame(&mut recorder).unwrap();
        assert_eq!(
            recorder.calls,
            ["resize", "rebuild", "dispatch", "barrier", "present"]
        );
    }

    #[test]
    fn present_never_runs_before_the_barrier() {
        let mut recorder = Recorder::default();
        run_frame(&mut recorder).unwrap();
        let barrier_at = recorder.calls.iter().position(|c| *c == "barrier");
        let present_at = recorder.calls.iter().position(|c| *c == "present");
        assert!(barrier_at.unwrap() < present_at.unwrap());
    }

    #[test]
    fn a_failed_resize_service_skips_the_whole_frame() {
        let mut recorder = Recorder {
            fail_at: Some("resize"),
            ..Default::default()
        };
        // no compute, no present: the frame never runs against a target
        // whose recreation failed
        assert!(run_frame(&mut recorder).is_err());
        assert_eq!(recorder.calls, ["resize"]);
    }

    #[test]
    fn a_failed_rebuild_skips_the_rest_of_the_frame() {
        let mut recorder = Recorder {
            fail_at: Some("rebuild"),
            ..Default::default()
        };
        assert!(run_frame(&mut recorder).is_err());
        assert_eq!(recorder.calls, ["resize", "rebuild"]);
    }

    #[test]
    fn a_failed_dispatch_skips_barrier_and_present() {
        let mut recorder = Recorder {
            fail_at: Some("dispatch"),
            ..Default::default()
        };
        assert!(run_frame(&mut recorder).is_err());
        assert_eq!(recorder.calls, ["resize", "rebuild", "dispatch"]);
    }
}
