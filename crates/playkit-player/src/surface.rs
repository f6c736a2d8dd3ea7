//! Surface lifecycle
//!
//! DETACHED -> ATTACHED -> DETACHED. At most one render target is attached at
//! any time, and switching targets always goes through a full detach first.
//! Owned and mutated only by the command thread.

use playkit_core::RenderTarget;
use playkit_engine::{NativeEngine, Result};
use tracing::{info, warn};

/// Tracks which render target the engine is drawing into
#[derive(Debug)]
pub struct SurfaceManager {
    attached: Option<RenderTarget>,
    video_output: String,
}

impl SurfaceManager {
    /// Manager that enables `video_output` while a target is attached
    pub fn new(video_output: impl Into<String>) -> Self {
        Self {
            attached: None,
            video_output: video_output.into(),
        }
    }

    /// Currently attached target
    pub fn attached(&self) -> Option<RenderTarget> {
        self.attached
    }

    /// Attach `target`, detaching any other target first
    pub fn attach(&mut self, engine: &mut dyn NativeEngine, target: RenderTarget) -> Result<()> {
        if self.attached == Some(target) {
            return Ok(());
        }
        if self.attached.is_some() {
            self.detach(engine)?;
        }

        engine.attach_render_target(target.raw())?;
        let enabled = engine
            .set_property_string("force-window", "yes")
            .and_then(|_| engine.set_property_string("vo", &self.video_output));
        if let Err(e) = enabled {
            warn!("Enabling video output failed, releasing target: {}", e);
            if let Err(e) = engine.detach_render_target() {
                warn!("Rollback detach failed: {}", e);
            }
            return Err(e);
        }

        self.attached = Some(target);
        info!("Render target {:#x} attached", target.raw());
        Ok(())
    }

    /// Disable rendering and release the current target; no-op when detached
    pub fn detach(&mut self, engine: &mut dyn NativeEngine) -> Result<()> {
        let Some(target) = self.attached else {
            return Ok(());
        };

        engine.set_property_string("vo", "null")?;
        engine.set_property_string("force-window", "no")?;
        engine.detach_render_target()?;

        self.attached = None;
        info!("Render target {:#x} detached", target.raw());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use playkit_engine::{EngineCall, FakeEngine};
    use proptest::prelude::*;

    fn attach_detach_calls(fake: &FakeEngine) -> Vec<EngineCall> {
        fake.calls()
            .into_iter()
            .filter(|c| {
                matches!(
                    c,
                    EngineCall::AttachRenderTarget(_) | EngineCall::DetachRenderTarget
                )
            })
            .collect()
    }

    #[test]
    fn test_attach_same_target_is_idempotent() {
        let fake = FakeEngine::new();
        let mut engine = fake.clone();
        let mut surface = SurfaceManager::new("gpu");

        surface.attach(&mut engine, RenderTarget::new(7)).unwrap();
        surface.attach(&mut engine, RenderTarget::new(7)).unwrap();

        assert_eq!(
            attach_detach_calls(&fake),
            vec![EngineCall::AttachRenderTarget(7)]
        );
        assert_eq!(
            fake.writes_to("vo"),
            vec![playkit_engine::PropertyValue::Str("gpu".into())]
        );
    }

    #[test]
    fn test_switch_detaches_first() {
        let fake = FakeEngine::new();
        let mut engine = fake.clone();
        let mut surface = SurfaceManager::new("gpu");

        surface.attach(&mut engine, RenderTarget::new(1)).unwrap();
        surface.attach(&mut engine, RenderTarget::new(2)).unwrap();

        assert_eq!(
            attach_detach_calls(&fake),
            vec![
                EngineCall::AttachRenderTarget(1),
                EngineCall::DetachRenderTarget,
                EngineCall::AttachRenderTarget(2),
            ]
        );
        assert_eq!(surface.attached(), Some(RenderTarget::new(2)));
    }

    #[test]
    fn test_detach_when_detached_is_noop() {
        let fake = FakeEngine::new();
        let mut engine = fake.clone();
        let mut surface = SurfaceManager::new("gpu");

        surface.detach(&mut engine).unwrap();
        assert!(fake.calls().is_empty());
    }

    #[test]
    fn test_failed_attach_leaves_detached() {
        let fake = FakeEngine::new();
        let mut engine = fake.clone();
        let mut surface = SurfaceManager::new("gpu");
        fake.fail_on("attach");

        assert!(surface.attach(&mut engine, RenderTarget::new(3)).is_err());
        assert_eq!(surface.attached(), None);
    }

    #[test]
    fn test_failed_enable_rolls_back() {
        let fake = FakeEngine::new();
        let mut engine = fake.clone();
        let mut surface = SurfaceManager::new("gpu");
        fake.fail_on("set:vo");

        assert!(surface.attach(&mut engine, RenderTarget::new(3)).is_err());
        assert_eq!(surface.attached(), None);
        assert_eq!(
            attach_detach_calls(&fake),
            vec![
                EngineCall::AttachRenderTarget(3),
                EngineCall::DetachRenderTarget
            ]
        );
    }

    #[test]
    fn test_failed_detach_keeps_target() {
        let fake = FakeEngine::new();
        let mut engine = fake.clone();
        let mut surface = SurfaceManager::new("gpu");

        surface.attach(&mut engine, RenderTarget::new(5)).unwrap();
        fake.fail_on("detach");
        assert!(surface.detach(&mut engine).is_err());
        assert_eq!(surface.attached(), Some(RenderTarget::new(5)));
    }

    proptest! {
        #[test]
        fn test_never_two_targets_attached(ops in proptest::collection::vec(proptest::option::of(1i64..4), 0..24)) {
            let fake = FakeEngine::new();
            let mut engine = fake.clone();
            let mut surface = SurfaceManager::new("gpu");

            for op in &ops {
                match op {
                    Some(raw) => surface.attach(&mut engine, RenderTarget::new(*raw)).unwrap(),
                    None => surface.detach(&mut engine).unwrap(),
                }
            }

            let mut engine_view: Option<i64> = None;
            for call in attach_detach_calls(&fake) {
                match call {
                    EngineCall::AttachRenderTarget(raw) => {
                        prop_assert!(engine_view.is_none(), "attach while {:?} attached", engine_view);
                        engine_view = Some(raw);
                    }
                    _ => {
                        prop_assert!(engine_view.is_some());
                        engine_view = None;
                    }
                }
            }
            prop_assert_eq!(engine_view, surface.attached().map(|t| t.raw()));
        }
    }
}
