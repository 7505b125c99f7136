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

//! Draw dispatch: resolve state, map buffers, assemble, unmap.

use super::batch::BatchRecorder;
use super::command::{float_words, Opcode};
use super::stage::RasterizeStage;
use super::state::StateTracker;
use super::Context;
use crate::renderer::api::{BufferId, ClearFlags, DrawInfo, MappedBuffer, ShaderStage};
use crate::renderer::error::RenderError;
use crate::renderer::traits::{BufferStore, Primitive, PrimitiveSink};

/// The buffers mapped by one draw. Dropping the set unmaps the vertex
/// buffers in slot order, then the index buffer.
struct MappedSet<'a> {
    store: &'a dyn BufferStore,
    vertex: Vec<BufferId>,
    index: Option<BufferId>,
}

impl<'a> MappedSet<'a> {
    fn new(store: &'a dyn BufferStore) -> Self {
        Self {
            store,
            vertex: Vec::new(),
            index: None,
        }
    }

    fn map_vertex(&mut self, buffer: BufferId) -> MappedBuffer {
        let mapped = self.store.map(buffer);
        self.vertex.push(buffer);
        mapped
    }

    fn map_index(&mut self, buffer: BufferId) -> MappedBuffer {
        debug_assert!(self.index.is_none());
        let mapped = self.store.map(buffer);
        self.index = Some(buffer);
        mapped
    }

    fn vertex_slots(&self) -> usize {
        self.vertex.len()
    }
}

impl Drop for MappedSet<'_> {
    fn drop(&mut self) {
        for buffer in self.vertex.drain(..) {
            self.store.unmap(buffer);
        }
        if let Some(buffer) = self.index.take() {
            self.store.unmap(buffer);
        }
    }
}

/// Routes assembled primitives into the rasterize stage.
struct StageSink<'a> {
    stage: &'a mut RasterizeStage,
    batch: &'a mut BatchRecorder,
    state: &'a mut StateTracker,
    primitives: u64,
}

impl PrimitiveSink for StageSink<'_> {
    fn emit(&mut self, primitive: &Primitive<'_>) -> Result<(), RenderError> {
        self.stage.emit_primitive(primitive, self.batch, self.state)?;
        self.primitives += 1;
        Ok(())
    }
}

fn torn_down() -> RenderError {
    RenderError::Internal("context has been torn down".to_string())
}

impl Context {
    pub(super) fn dispatch_draw(&mut self, info: &DrawInfo) -> Result<(), RenderError> {
        self.stats.draws += 1;
        if self.state.resolve_if_dirty() {
            self.stats.state_resolutions += 1;
        }

        let (Some(batch), Some(stage)) = (self.batch.as_mut(), self.stage.as_mut()) else {
            return Err(torn_down());
        };

        let current = self.state.current();
        let mut mapped = MappedSet::new(self.buffers.as_ref());

        for (slot, binding) in current.vertex_buffers.iter().enumerate() {
            let buffer = mapped.map_vertex(binding.buffer);
            self.assembler.set_mapped_vertex_buffer(slot, Some(buffer));
        }

        let index = match (info.indexed, current.index_buffer) {
            (true, Some(binding)) => Some(mapped.map_index(binding.buffer)),
            _ => None,
        };
        let index_mapped = index.is_some();
        self.assembler.set_mapped_index_buffer(index);

        let constants = current.constants(ShaderStage::Vertex);
        self.assembler.set_mapped_constant_buffer(
            ShaderStage::Vertex,
            0,
            bytemuck::cast_slice(constants),
        );

        let result = if info.count == 0 {
            Ok(())
        } else {
            let mut sink = StageSink {
                stage: &mut *stage,
                batch: &mut *batch,
                state: &mut self.state,
                primitives: 0,
            };
            let result = self.assembler.draw(info, &mut sink);
            self.stats.primitives += sink.primitives;

            match result {
                Ok(()) => stage.finish(batch, &mut self.state),
                Err(err) => {
                    stage.discard();
                    Err(err)
                }
            }
        };

        for slot in 0..mapped.vertex_slots() {
            self.assembler.set_mapped_vertex_buffer(slot, None);
        }
        if index_mapped {
            self.assembler.set_mapped_index_buffer(None);
        }
        drop(mapped);

        log::trace!(
            "Draw {:?} x{} (indexed: {}) -> {:?}",
            info.topology,
            info.count,
            info.indexed,
            result
        );
        result
    }

    pub(super) fn record_clear(
        &mut self,
        flags: ClearFlags,
        color: [f32; 4],
        depth: f64,
        stencil: u32,
    ) -> Result<(), RenderError> {
        self.stats.clears += 1;

        let framebuffer = &self.state.current().framebuffer;
        let mut targets = flags;
        if framebuffer.color_count() == 0 {
            targets.remove(ClearFlags::COLOR);
        }
        match framebuffer.depth_stencil() {
            None => targets.remove(ClearFlags::DEPTH | ClearFlags::STENCIL),
            Some(surface) if !surface.format.has_stencil() => targets.remove(ClearFlags::STENCIL),
            Some(_) => {}
        }
        if targets.is_empty() {
            log::trace!("Clear {:?} has no bound target", flags);
            return Ok(());
        }

        if self.state.resolve_if_dirty() {
            self.stats.state_resolutions += 1;
        }
        let batch = self.batch.as_mut().ok_or_else(torn_down)?;

        let mut payload = [0u32; 7];
        payload[0] = targets.bits();
        payload[1..5].copy_from_slice(float_words(&color));
        payload[5] = (depth as f32).to_bits();
        payload[6] = stencil;

        self.state.prepare_batch(batch, 1 + payload.len())?;
        batch.push(Opcode::Clear, &payload);
        Ok(())
    }
}
