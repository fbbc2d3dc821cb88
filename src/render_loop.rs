//! Per-engine render loop bookkeeping.

use crate::backend::SceneId;

/// Scenes an engine renders on every tick.
#[derive(Clone, Debug, Default)]
pub struct RenderLoop {
    scenes: Vec<SceneId>,
    running: bool,
    frames: u64,
}

impl RenderLoop {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `scene` (once) and starts the loop.
    pub fn register(&mut self, scene: SceneId) {
        if !self.scenes.contains(&scene) {
            self.scenes.push(scene);
        }
        self.running = true;
    }

    /// Stops rendering; registered scenes are forgotten.
    pub fn stop(&mut self) {
        self.scenes.clear();
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn scenes(&self) -> &[SceneId] {
        &self.scenes
    }

    /// Frames ticked while running.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Calls `render` once per registered scene and returns how many scenes
    /// were rendered. A stopped loop renders nothing and does not count a frame.
    pub fn tick<F>(&mut self, mut render: F) -> anyhow::Result<usize>
    where
        F: FnMut(SceneId) -> anyhow::Result<()>,
    {
        if !self.running {
            return Ok(0);
        }
        for scene in &self.scenes {
            render(*scene)?;
        }
        self.frames += 1;
        Ok(self.scenes.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_loop_renders_nothing() {
        let mut rl = RenderLoop::new();
        let mut calls = 0;
        assert_eq!(rl.tick(|_| Ok(calls += 1)).unwrap(), 0);
        assert_eq!(calls, 0);
        assert_eq!(rl.frames(), 0);
    }

    #[test]
    fn every_tick_renders_each_scene_once() {
        let mut rl = RenderLoop::new();
        rl.register(SceneId::from_index(0));
        rl.register(SceneId::from_index(0));
        let mut rendered = Vec::new();
        for _ in 0..3 {
            rl.tick(|s| {
                rendered.push(s);
                Ok(())
            })
            .unwrap();
        }
        assert_eq!(rendered.len(), 3);
        assert_eq!(rl.frames(), 3);
    }

    #[test]
    fn stop_halts_rendering() {
        let mut rl = RenderLoop::new();
        rl.register(SceneId::from_index(0));
        rl.stop();
        assert!(!rl.is_running());
        assert_eq!(rl.tick(|_| Ok(())).unwrap(), 0);
    }

    #[test]
    fn render_errors_propagate() {
        let mut rl = RenderLoop::new();
        rl.register(SceneId::from_index(1));
        let err = rl.tick(|_| anyhow::bail!("device lost")).unwrap_err();
        assert_eq!(err.to_string(), "device lost");
        assert_eq!(rl.frames(), 0);
    }
}
