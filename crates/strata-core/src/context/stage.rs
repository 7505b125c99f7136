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

//! Rasterize stages turn assembled primitives into batch packets.

use super::batch::BatchRecorder;
use super::command::{float_words, Opcode};
use super::state::StateTracker;
use crate::renderer::api::RasterizePath;
use crate::renderer::error::RenderError;
use crate::renderer::traits::{Primitive, PrimitiveKind};

/// Words of the `PRIM_VBUF` packet closing a vertex run.
const PRIM_VBUF_WORDS: usize = 4;

/// The stage installed on a context, picked once at creation.
#[derive(Debug)]
pub enum RasterizeStage {
    /// Vertices are staged into runs, one `PRIM_VBUF` per run.
    VertexBuffer(VbufStage),
    /// Each primitive becomes one `PRIM_INLINE` packet.
    DirectRender(RenderStage),
}

impl RasterizeStage {
    /// Builds the stage for `path`.
    pub fn new(path: RasterizePath) -> Self {
        match path {
            RasterizePath::VertexBuffer => RasterizeStage::VertexBuffer(VbufStage::default()),
            RasterizePath::DirectRender => RasterizeStage::DirectRender(RenderStage::default()),
        }
    }

    /// The path this stage implements.
    pub fn path(&self) -> RasterizePath {
        match self {
            RasterizeStage::VertexBuffer(_) => RasterizePath::VertexBuffer,
            RasterizeStage::DirectRender(_) => RasterizePath::DirectRender,
        }
    }

    /// Records one primitive.
    pub fn emit_primitive(
        &mut self,
        primitive: &Primitive<'_>,
        batch: &mut BatchRecorder,
        state: &mut StateTracker,
    ) -> Result<(), RenderError> {
        debug_assert_eq!(
            primitive.vertices.len(),
            primitive.kind.vertex_count() * primitive.vertex_size
        );
        match self {
            RasterizeStage::VertexBuffer(stage) => stage.emit_primitive(primitive, batch, state),
            RasterizeStage::DirectRender(stage) => stage.emit_primitive(primitive, batch, state),
        }
    }

    /// Writes out anything staged by the current draw.
    pub fn finish(
        &mut self,
        batch: &mut BatchRecorder,
        state: &mut StateTracker,
    ) -> Result<(), RenderError> {
        match self {
            RasterizeStage::VertexBuffer(stage) => stage.finish_run(batch, state),
            RasterizeStage::DirectRender(_) => Ok(()),
        }
    }

    /// Forgets whatever the current draw staged, after a failed draw.
    pub fn discard(&mut self) {
        if let RasterizeStage::VertexBuffer(stage) = self {
            stage.vertices.clear();
            stage.vertex_count = 0;
        }
    }

    /// Drops staged data that was never written out.
    pub fn release(self) {
        if let RasterizeStage::VertexBuffer(stage) = &self {
            if stage.vertex_count > 0 {
                log::debug!("Discarding {} staged vertices", stage.vertex_count);
            }
        }
    }
}

/// Collects the vertices of a topology run before emitting them together.
#[derive(Debug, Default)]
pub struct VbufStage {
    kind: Option<PrimitiveKind>,
    vertex_size: usize,
    vertices: Vec<f32>,
    vertex_count: usize,
    runs: u64,
}

impl VbufStage {
    /// The number of runs written so far.
    pub fn runs(&self) -> u64 {
        self.runs
    }

    /// The most vertices one run can hold, a whole number of primitives.
    fn max_run_vertices(
        kind: PrimitiveKind,
        vertex_size: usize,
        batch: &BatchRecorder,
        state: &StateTracker,
    ) -> usize {
        let overhead = state.full_state_words() + 1 + 1 + PRIM_VBUF_WORDS;
        let room = batch.capacity().saturating_sub(overhead);
        let vertices = room / vertex_size.max(1);
        vertices - vertices % kind.vertex_count()
    }

    fn emit_primitive(
        &mut self,
        primitive: &Primitive<'_>,
        batch: &mut BatchRecorder,
        state: &mut StateTracker,
    ) -> Result<(), RenderError> {
        if self.kind != Some(primitive.kind) || self.vertex_size != primitive.vertex_size {
            self.finish_run(batch, state)?;
            self.kind = Some(primitive.kind);
            self.vertex_size = primitive.vertex_size;
        }

        let count = primitive.kind.vertex_count();
        let max = Self::max_run_vertices(primitive.kind, primitive.vertex_size, batch, state);
        if max < count {
            return Err(RenderError::PacketTooLarge {
                words: state.full_state_words() + 2 + PRIM_VBUF_WORDS + primitive.vertices.len(),
                capacity: batch.capacity(),
            });
        }
        if self.vertex_count + count > max {
            self.finish_run(batch, state)?;
        }

        self.vertices.extend_from_slice(primitive.vertices);
        self.vertex_count += count;
        Ok(())
    }

    fn finish_run(
        &mut self,
        batch: &mut BatchRecorder,
        state: &mut StateTracker,
    ) -> Result<(), RenderError> {
        let Some(kind) = self.kind else {
            return Ok(());
        };
        if self.vertex_count == 0 {
            return Ok(());
        }

        let words = 1 + self.vertices.len() + PRIM_VBUF_WORDS;
        let result = state.prepare_batch(batch, words).map(|()| {
            batch.push(Opcode::VertexData, float_words(&self.vertices));
            batch.push(
                Opcode::PrimVbuf,
                &[
                    kind as u32,
                    self.vertex_count as u32,
                    self.vertex_size as u32,
                ],
            );
        });

        log::trace!("Vertex run of {} {:?} vertices", self.vertex_count, kind);
        self.vertices.clear();
        self.vertex_count = 0;
        self.runs += 1;
        result
    }
}

/// Emits every primitive inline.
#[derive(Debug, Default)]
pub struct RenderStage {
    scratch: Vec<u32>,
}

impl RenderStage {
    fn emit_primitive(
        &mut self,
        primitive: &Primitive<'_>,
        batch: &mut BatchRecorder,
        state: &mut StateTracker,
    ) -> Result<(), RenderError> {
        self.scratch.clear();
        self.scratch
            .extend([primitive.kind as u32, primitive.vertex_size as u32]);
        self.scratch.extend_from_slice(float_words(primitive.vertices));

        state.prepare_batch(batch, 1 + self.scratch.len())?;
        batch.push(Opcode::PrimInline, &self.scratch);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::command::{Packet, PacketReader};
    use crate::context::testing::RecordingDevice;
    use std::sync::Arc;

    fn setup(capacity: usize) -> (Arc<RecordingDevice>, BatchRecorder, StateTracker) {
        let device = Arc::new(RecordingDevice::default());
        let batch = BatchRecorder::create(device.clone(), capacity, "stage").unwrap();
        let mut state = StateTracker::new();
        state.resolve_if_dirty();
        (device, batch, state)
    }

    fn triangle(vertices: &[f32]) -> Primitive<'_> {
        Primitive {
            kind: PrimitiveKind::Triangle,
            vertex_size: 2,
            vertices,
        }
    }

    fn draw_packets(words: &[u32]) -> Vec<Packet<'_>> {
        PacketReader::new(words)
            .map(|packet| packet.unwrap())
            .filter(|packet| !packet.opcode.is_state())
            .collect()
    }

    #[test]
    fn vbuf_stage_emits_one_run_per_draw() {
        let (_device, mut batch, mut state) = setup(1024);
        let mut stage = RasterizeStage::new(RasterizePath::VertexBuffer);
        let vertices = [0.0, 0.0, 1.0, 0.0, 0.0, 1.0];

        stage.emit_primitive(&triangle(&vertices), &mut batch, &mut state).unwrap();
        stage.emit_primitive(&triangle(&vertices), &mut batch, &mut state).unwrap();
        assert!(batch.is_empty());
        stage.finish(&mut batch, &mut state).unwrap();

        let packets = draw_packets(batch.words());
        assert_eq!(packets.len(), 2);
        assert_eq!(packets[0].opcode, Opcode::VertexData);
        assert_eq!(packets[0].payload.len(), 12);
        assert_eq!(packets[1].opcode, Opcode::PrimVbuf);
        assert_eq!(packets[1].payload, &[PrimitiveKind::Triangle as u32, 6, 2]);
    }

    #[test]
    fn vbuf_stage_starts_a_new_run_when_the_kind_changes() {
        let (_device, mut batch, mut state) = setup(1024);
        let mut stage = RasterizeStage::new(RasterizePath::VertexBuffer);
        let line = Primitive {
            kind: PrimitiveKind::Line,
            vertex_size: 2,
            vertices: &[0.0, 0.0, 1.0, 1.0],
        };

        stage.emit_primitive(&triangle(&[0.0; 6]), &mut batch, &mut state).unwrap();
        stage.emit_primitive(&line, &mut batch, &mut state).unwrap();
        stage.finish(&mut batch, &mut state).unwrap();

        let runs: Vec<_> = draw_packets(batch.words())
            .into_iter()
            .filter(|packet| packet.opcode == Opcode::PrimVbuf)
            .map(|packet| packet.payload[0])
            .collect();
        assert_eq!(
            runs,
            vec![PrimitiveKind::Triangle as u32, PrimitiveKind::Line as u32]
        );
    }

    #[test]
    fn long_runs_are_split_on_primitive_boundaries() {
        let (device, mut batch, mut state) = setup(64);
        let mut stage = RasterizeStage::new(RasterizePath::VertexBuffer);
        for _ in 0..20 {
            stage.emit_primitive(&triangle(&[0.5; 6]), &mut batch, &mut state).unwrap();
        }
        stage.finish(&mut batch, &mut state).unwrap();

        let mut total = 0;
        let submitted = device.submissions();
        for words in submitted.iter().map(Vec::as_slice).chain([batch.words()]) {
            for packet in draw_packets(words) {
                if packet.opcode == Opcode::PrimVbuf {
                    assert_eq!(packet.payload[1] % 3, 0);
                    total += packet.payload[1];
                }
            }
        }
        assert_eq!(total, 60);
        assert!(!submitted.is_empty());
    }

    #[test]
    fn direct_stage_emits_each_primitive_inline() {
        let (_device, mut batch, mut state) = setup(1024);
        let mut stage = RasterizeStage::new(RasterizePath::DirectRender);
        let vertices = [0.0, 0.0, 1.0, 0.0, 0.0, 1.0];
        stage.emit_primitive(&triangle(&vertices), &mut batch, &mut state).unwrap();
        stage.emit_primitive(&triangle(&vertices), &mut batch, &mut state).unwrap();
        stage.finish(&mut batch, &mut state).unwrap();

        let packets = draw_packets(batch.words());
        assert_eq!(packets.len(), 2);
        assert!(packets.iter().all(|p| p.opcode == Opcode::PrimInline));
        assert_eq!(packets[0].payload[..2], [PrimitiveKind::Triangle as u32, 2]);
        assert_eq!(f32::from_bits(packets[0].payload[4]), 1.0);
    }

    #[test]
    fn state_is_emitted_before_the_first_primitive() {
        let (_device, mut batch, mut state) = setup(1024);
        let mut stage = RasterizeStage::new(RasterizePath::DirectRender);
        stage.emit_primitive(&triangle(&[0.0; 6]), &mut batch, &mut state).unwrap();

        let first = PacketReader::new(batch.words()).next().unwrap().unwrap();
        assert_eq!(first.opcode, Opcode::Invariant);
        assert!(state.hardware_dirty().is_empty());
    }
}
