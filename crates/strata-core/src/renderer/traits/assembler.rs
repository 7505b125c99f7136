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

use crate::renderer::api::*;
use crate::renderer::error::RenderError;
use std::fmt::Debug;

/// The kind of an assembled primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    /// A single vertex.
    Point,
    /// Two vertices.
    Line,
    /// Three vertices.
    Triangle,
}

impl PrimitiveKind {
    /// The number of vertices of this kind of primitive.
    pub const fn vertex_count(&self) -> usize {
        match self {
            PrimitiveKind::Point => 1,
            PrimitiveKind::Line => 2,
            PrimitiveKind::Triangle => 3,
        }
    }

    /// Decodes the kind code written into primitive packets.
    pub const fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(PrimitiveKind::Point),
            1 => Some(PrimitiveKind::Line),
            2 => Some(PrimitiveKind::Triangle),
            _ => None,
        }
    }

    /// Returns the kind topology decomposes into.
    pub const fn of(topology: PrimitiveTopology) -> Self {
        match topology {
            PrimitiveTopology::PointList => PrimitiveKind::Point,
            PrimitiveTopology::LineList | PrimitiveTopology::LineStrip => PrimitiveKind::Line,
            PrimitiveTopology::TriangleList
            | PrimitiveTopology::TriangleStrip
            | PrimitiveTopology::TriangleFan => PrimitiveKind::Triangle,
        }
    }
}

/// An assembled primitive: its vertices laid out one after another.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Primitive<'a> {
    /// The kind of primitive.
    pub kind: PrimitiveKind,
    /// The number of floats per vertex.
    pub vertex_size: usize,
    /// `kind.vertex_count() * vertex_size` floats.
    pub vertices: &'a [f32],
}

/// Receives the primitives a [`PrimitiveAssembler`] produces.
pub trait PrimitiveSink {
    /// Consumes one primitive.
    fn emit(&mut self, primitive: &Primitive<'_>) -> Result<(), RenderError>;
}

/// The downstream pipeline stage fed by the draw dispatcher.
///
/// Bindings are forwarded when state is set; mapped buffer contents are
/// registered right before [`PrimitiveAssembler::draw`] and cleared right after.
pub trait PrimitiveAssembler: Debug {
    /// Records the vertex buffer bindings.
    fn set_vertex_buffers(&mut self, bindings: &[VertexBufferBinding]);

    /// Records the vertex element layout.
    fn set_vertex_elements(&mut self, elements: &[VertexElement]);

    /// Records the index buffer binding.
    fn set_index_buffer(&mut self, binding: Option<&IndexBufferBinding>);

    /// Registers (or clears, with `None`) the mapped contents of a vertex buffer slot.
    fn set_mapped_vertex_buffer(&mut self, slot: usize, buffer: Option<MappedBuffer>);

    /// Registers (or clears, with `None`) the mapped index buffer.
    fn set_mapped_index_buffer(&mut self, buffer: Option<MappedBuffer>);

    /// Registers the user constants of a stage. `data` is only valid for this call.
    fn set_mapped_constant_buffer(&mut self, stage: ShaderStage, index: u32, data: &[u8]);

    /// Assembles the primitives of one draw and forwards them to `sink`.
    fn draw(&mut self, info: &DrawInfo, sink: &mut dyn PrimitiveSink) -> Result<(), RenderError>;
}
