// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The graphics context: one batch, one state cache, one rasterize stage.
//!
//! A [`Context`] is created on a shared [`GraphicsDevice`] and
//! [`BufferStore`] and owns everything else it needs. State-setting calls
//! only record the new state and mark it dirty; the work happens lazily when
//! a draw or clear needs the hardware state, which keeps redundant state
//! changes cheap.
//!
//! Tearing a context down (explicitly with [`Context::destroy`] or by
//! dropping it) releases the rasterize stage, then the batch, then every
//! surface reference held by the bound framebuffer and sampler views.

pub mod batch;
pub mod command;
mod draw;
mod path;
mod stage;
pub mod state;
mod stats;

#[cfg(test)]
pub(crate) mod testing;

pub use self::batch::{BatchRecorder, BatchStats, FlushOutcome, Reservation};
pub use self::path::{resolve_rasterize_path, PathResolution};
pub use self::stage::{RasterizeStage, RenderStage, VbufStage};
pub use self::state::{DirtyState, HardwareDirty, StateAtom, StateTracker};
pub use self::stats::ContextStats;

use crate::renderer::api::*;
use crate::renderer::error::{RenderError, ResourceError, StateError};
use crate::renderer::traits::{BufferStore, GraphicsDevice, PrimitiveAssembler, RenderContext};
use std::sync::Arc;

/// An immediate-mode graphics context.
#[derive(Debug)]
pub struct Context {
    label: String,
    device: Arc<dyn GraphicsDevice>,
    buffers: Arc<dyn BufferStore>,
    assembler: Box<dyn PrimitiveAssembler>,
    batch: Option<BatchRecorder>,
    stage: Option<RasterizeStage>,
    state: StateTracker,
    path: PathResolution,
    stats: ContextStats,
}

impl Context {
    /// Creates a context on `device`.
    ///
    /// Allocates the batch, installs the rasterize stage chosen from the
    /// configuration and what the device supports, and starts with every
    /// state group dirty.
    ///
    /// ## Arguments
    /// * `device` - The device batches are submitted to.
    /// * `buffers` - The store vertex and index buffers are mapped from.
    /// * `assembler` - Turns mapped vertex data into primitives.
    /// * `config` - Batch size, rasterize path and label.
    ///
    /// ## Errors
    /// * `RenderError::InvalidConfig` - If the configuration is rejected.
    /// * `RenderError::BatchAllocationFailed` - If the device cannot allocate the batch.
    /// * `RenderError::InitializationFailed` - If the device supports no rasterize path.
    pub fn new(
        device: Arc<dyn GraphicsDevice>,
        buffers: Arc<dyn BufferStore>,
        assembler: Box<dyn PrimitiveAssembler>,
        config: &ContextConfig,
    ) -> Result<Self, RenderError> {
        config.validate()?;

        let batch = BatchRecorder::create(
            Arc::clone(&device),
            config.batch_capacity_words,
            &config.label,
        )?;
        let path = resolve_rasterize_path(config.rasterize_path, |path| {
            device.supports_path(path)
        })?;
        let stage = RasterizeStage::new(path.path());

        log::info!(
            "Created context '{}' on {} ({:?} path, {} word batches)",
            config.label,
            device.device_info().name,
            path.path(),
            config.batch_capacity_words
        );

        Ok(Self {
            label: config.label.clone(),
            device,
            buffers,
            assembler,
            batch: Some(batch),
            stage: Some(stage),
            state: StateTracker::new(),
            path,
            stats: ContextStats::default(),
        })
    }

    /// The label given at creation.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The installed rasterize path.
    pub fn rasterize_path(&self) -> RasterizePath {
        self.path.path()
    }

    /// How the rasterize path was chosen.
    pub fn path_resolution(&self) -> PathResolution {
        self.path
    }

    /// Describes the device this context records for.
    pub fn device_info(&self) -> DeviceInfo {
        self.device.device_info()
    }

    /// The pipeline state cache.
    pub fn state(&self) -> &StateTracker {
        &self.state
    }

    /// Words recorded since the last submission.
    pub fn pending_words(&self) -> usize {
        self.batch.as_ref().map_or(0, BatchRecorder::len)
    }

    /// Work counters, including the batch's submission counters.
    pub fn stats(&self) -> ContextStats {
        let mut stats = self.stats;
        if let Some(batch) = &self.batch {
            let submitted = batch.stats();
            stats.submitted_batches = submitted.submitted_batches;
            stats.submitted_words = submitted.submitted_words;
        }
        stats
    }

    /// Adds a state atom run after the built-in ones.
    pub fn register_state_atom(&mut self, atom: Box<dyn StateAtom>) {
        self.state.register_atom(atom);
    }

    /// Marks state groups as changed without changing any state.
    pub fn mark_dirty(&mut self, groups: DirtyState) {
        self.state.mark_dirty(groups);
    }

    /// Sets the rasterizer state.
    pub fn set_rasterizer_state(&mut self, rasterizer: RasterizerState) {
        self.state
            .modify(DirtyState::RASTERIZER, |state| state.rasterizer = rasterizer);
    }

    /// Sets the blend state.
    pub fn set_blend_state(&mut self, blend: BlendState) {
        self.state.modify(DirtyState::BLEND, |state| state.blend = blend);
    }

    /// Sets the blend constant color.
    pub fn set_blend_color(&mut self, color: [f32; 4]) {
        self.state
            .modify(DirtyState::BLEND_COLOR, |state| state.blend_color = color);
    }

    /// Sets the depth and stencil state.
    pub fn set_depth_stencil_state(&mut self, depth_stencil: DepthStencilState) {
        self.state.modify(DirtyState::DEPTH_STENCIL, |state| {
            state.depth_stencil = depth_stencil
        });
    }

    /// Sets the stencil reference value.
    pub fn set_stencil_ref(&mut self, reference: u8) {
        self.state
            .modify(DirtyState::STENCIL_REF, |state| state.stencil_ref = reference);
    }

    /// Sets the viewport transform.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.state
            .modify(DirtyState::VIEWPORT, |state| state.viewport = viewport);
    }

    /// Sets the scissor rectangle.
    pub fn set_scissor(&mut self, scissor: ScissorRect) {
        self.state
            .modify(DirtyState::SCISSOR, |state| state.scissor = scissor);
    }

    /// Binds sampler states to the first `samplers.len()` units.
    pub fn set_sampler_states(&mut self, samplers: &[SamplerState]) -> Result<(), StateError> {
        if samplers.len() > MAX_SAMPLERS {
            return Err(StateError::TooManySamplers {
                count: samplers.len(),
                max: MAX_SAMPLERS,
            });
        }
        self.state.modify(DirtyState::SAMPLER, |state| {
            state.samplers = samplers.to_vec()
        });
        Ok(())
    }

    /// Binds sampler views, replacing (and releasing) the previous ones.
    pub fn set_sampler_views(&mut self, views: &[Arc<Surface>]) -> Result<(), StateError> {
        if views.len() > MAX_SAMPLERS {
            return Err(StateError::TooManySamplers {
                count: views.len(),
                max: MAX_SAMPLERS,
            });
        }
        self.state.modify(DirtyState::SAMPLER_VIEW, |state| {
            state.sampler_views = views.to_vec()
        });
        Ok(())
    }

    /// Binds the vertex shader.
    pub fn set_vertex_shader(&mut self, program: Option<ShaderProgram>) {
        self.state
            .modify(DirtyState::VERTEX_SHADER, |state| state.vertex_shader = program);
    }

    /// Binds the fragment program.
    ///
    /// ## Errors
    /// * `StateError::ProgramTooLarge` - If the program exceeds [`MAX_PROGRAM_WORDS`].
    pub fn set_fragment_shader(
        &mut self,
        program: Option<ShaderProgram>,
    ) -> Result<(), StateError> {
        if let Some(program) = &program {
            if program.words.len() > MAX_PROGRAM_WORDS {
                return Err(StateError::ProgramTooLarge {
                    words: program.words.len(),
                    max: MAX_PROGRAM_WORDS,
                });
            }
        }
        self.state.modify(DirtyState::FRAGMENT_SHADER, |state| {
            state.fragment_shader = program
        });
        Ok(())
    }

    /// Replaces the user constants of `stage`.
    pub fn set_constants(
        &mut self,
        stage: ShaderStage,
        constants: &[Constant],
    ) -> Result<(), StateError> {
        if constants.len() > MAX_CONSTANTS {
            return Err(StateError::TooManyConstants {
                count: constants.len(),
                max: MAX_CONSTANTS,
            });
        }
        let group = match stage {
            ShaderStage::Vertex => DirtyState::VERTEX_CONSTANTS,
            ShaderStage::Fragment => DirtyState::FRAGMENT_CONSTANTS,
        };
        self.state.modify(group, |state| {
            state.constants[stage.index()] = constants.to_vec()
        });
        Ok(())
    }

    /// Binds the render targets. The previous attachments are released.
    pub fn set_framebuffer(&mut self, framebuffer: Framebuffer) {
        self.state
            .modify(DirtyState::FRAMEBUFFER, |state| state.framebuffer = framebuffer);
    }

    /// Binds vertex buffers to slots `0..bindings.len()`.
    ///
    /// ## Errors
    /// * `StateError::TooManyVertexBuffers` - If more than [`MAX_VERTEX_BUFFERS`] are given.
    /// * `ResourceError::InvalidHandle` - If a binding names an unknown buffer.
    pub fn set_vertex_buffers(
        &mut self,
        bindings: &[VertexBufferBinding],
    ) -> Result<(), RenderError> {
        if bindings.len() > MAX_VERTEX_BUFFERS {
            return Err(StateError::TooManyVertexBuffers {
                count: bindings.len(),
                max: MAX_VERTEX_BUFFERS,
            }
            .into());
        }
        if bindings.iter().any(|binding| !self.buffers.contains(binding.buffer)) {
            return Err(ResourceError::InvalidHandle.into());
        }

        self.assembler.set_vertex_buffers(bindings);
        self.state.modify(DirtyState::VERTEX_BUFFERS, |state| {
            state.vertex_buffers = bindings.to_vec()
        });
        Ok(())
    }

    /// Binds (or unbinds, with `None`) the index buffer.
    pub fn set_index_buffer(
        &mut self,
        binding: Option<IndexBufferBinding>,
    ) -> Result<(), RenderError> {
        if let Some(binding) = &binding {
            if !self.buffers.contains(binding.buffer) {
                return Err(ResourceError::InvalidHandle.into());
            }
        }

        self.assembler.set_index_buffer(binding.as_ref());
        self.state
            .modify(DirtyState::INDEX_BUFFER, |state| state.index_buffer = binding);
        Ok(())
    }

    /// Describes how vertices are fetched from the bound vertex buffers.
    pub fn set_vertex_elements(&mut self, elements: &[VertexElement]) -> Result<(), StateError> {
        if elements.len() > MAX_VERTEX_ELEMENTS {
            return Err(StateError::TooManyVertexElements {
                count: elements.len(),
                max: MAX_VERTEX_ELEMENTS,
            });
        }
        if let Some((element, e)) = elements
            .iter()
            .enumerate()
            .find(|(_, e)| e.slot >= MAX_VERTEX_BUFFERS)
        {
            return Err(StateError::InvalidElementSlot {
                element,
                slot: e.slot,
            });
        }

        self.assembler.set_vertex_elements(elements);
        self.state.modify(DirtyState::VERTEX_ELEMENTS, |state| {
            state.vertex_elements = elements.to_vec()
        });
        Ok(())
    }

    /// Submits the recorded commands.
    ///
    /// Every hardware state group is emitted again at the start of the next batch.
    pub fn flush(&mut self) -> Result<FlushOutcome, RenderError> {
        self.stats.flushes += 1;
        let batch = self
            .batch
            .as_mut()
            .ok_or_else(|| RenderError::Internal("context has been torn down".to_string()))?;
        let outcome = batch.flush();
        self.state.invalidate_hardware();
        outcome
    }

    /// Tears the context down. Commands recorded since the last flush are dropped.
    pub fn destroy(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        let (Some(stage), Some(batch)) = (self.stage.take(), self.batch.take()) else {
            return;
        };

        stage.release();
        batch.destroy();
        self.state.release_surfaces();
        log::info!("Destroyed context '{}'", self.label);
    }
}

impl Drop for Context {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl RenderContext for Context {
    fn draw(&mut self, info: &DrawInfo) -> Result<(), RenderError> {
        self.dispatch_draw(info)
    }

    fn clear(
        &mut self,
        flags: ClearFlags,
        color: [f32; 4],
        depth: f64,
        stencil: u32,
    ) -> Result<(), RenderError> {
        self.record_clear(flags, color, depth, stencil)
    }

    fn flush(&mut self) -> Result<FlushOutcome, RenderError> {
        Context::flush(self)
    }

    fn destroy(self: Box<Self>) {
        Context::destroy(*self)
    }
}
