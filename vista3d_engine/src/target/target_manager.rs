/// Named registry of render targets.
///
/// The screen target (`default`) is registered on creation and cannot be
/// removed. Offscreen targets follow the viewport through `resize_all`.

use rustc_hash::FxHashMap;
use crate::error::Result;
use crate::{engine_bail, engine_warn};
use crate::graphics::GraphicsContext;
use crate::resource::ResourceManager;
use super::render_target::{RenderTarget, RenderTargetOptions, DEFAULT_TARGET};

pub struct TargetManager {
    render_targets: FxHashMap<String, RenderTarget>,
}

impl TargetManager {
    /// Manager holding only the screen target
    pub fn new(width: u32, height: u32) -> Self {
        let mut render_targets = FxHashMap::default();
        render_targets.insert(DEFAULT_TARGET.to_string(), RenderTarget::screen(width, height));
        Self { render_targets }
    }

    /// Create a new named offscreen target
    ///
    /// # Errors
    ///
    /// Returns an error if a render target with the same name already exists.
    pub fn create_render_target(
        &mut self,
        ctx: &mut GraphicsContext,
        resources: &mut ResourceManager,
        name: &str,
        width: u32,
        height: u32,
        options: RenderTargetOptions,
    ) -> Result<&mut RenderTarget> {
        if self.render_targets.contains_key(name) {
            engine_bail!("vista3d::TargetManager",
                "RenderTarget '{}' already exists", name);
        }

        let target = RenderTarget::create(ctx, resources, name, width, height, options);
        Ok(self.render_targets.entry(name.to_string()).or_insert(target))
    }

    /// The screen target
    pub fn screen(&self) -> Option<&RenderTarget> {
        self.render_targets.get(DEFAULT_TARGET)
    }

    pub fn render_target(&self, name: &str) -> Option<&RenderTarget> {
        self.render_targets.get(name)
    }

    pub fn render_target_mut(&mut self, name: &str) -> Option<&mut RenderTarget> {
        self.render_targets.get_mut(name)
    }

    /// Unregister a target, returning it for `RenderTarget::destroy`
    ///
    /// The screen target is never removed.
    pub fn remove_render_target(&mut self, name: &str) -> Option<RenderTarget> {
        if name == DEFAULT_TARGET {
            engine_warn!("vista3d::TargetManager",
                "The screen target cannot be removed");
            return None;
        }
        self.render_targets.remove(name)
    }

    pub fn render_target_count(&self) -> usize {
        self.render_targets.len()
    }

    pub fn render_target_names(&self) -> Vec<&str> {
        self.render_targets.keys().map(|k| k.as_str()).collect()
    }

    /// Resize every target to a new viewport size
    ///
    /// All targets are attempted; the first error is returned.
    pub fn resize_all(
        &mut self,
        ctx: &mut GraphicsContext,
        resources: &mut ResourceManager,
        width: u32,
        height: u32,
    ) -> Result<()> {
        let mut result = Ok(());
        for target in self.render_targets.values_mut() {
            if let Err(err) = target.resize(ctx, resources, width, height) {
                engine_warn!("vista3d::TargetManager",
                    "Render target '{}' not resized: {}", target.name(), err);
                if result.is_ok() {
                    result = Err(err);
                }
            }
        }
        result
    }

    /// Destroy every offscreen target, keeping the screen
    pub fn clear(&mut self, ctx: &mut GraphicsContext, resources: &mut ResourceManager) {
        let names: Vec<String> = self
            .render_targets
            .keys()
            .filter(|name| name.as_str() != DEFAULT_TARGET)
            .cloned()
            .collect();
        for name in names {
            if let Some(target) = self.render_targets.remove(&name) {
                target.destroy(ctx, resources);
            }
        }
    }
}

#[cfg(test)]
#[path = "target_manager_tests.rs"]
mod tests;
