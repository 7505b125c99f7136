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

use strata_core::renderer::{
    DrawInfo, IndexBufferBinding, IndexFormat, MappedBuffer, Primitive, PrimitiveAssembler,
    PrimitiveKind, PrimitiveSink, PrimitiveTopology, RenderError, ResourceError, ShaderStage,
    VertexBufferBinding, VertexElement, VertexFormat, MAX_VERTEX_BUFFERS,
};

/// A reference [`PrimitiveAssembler`].
///
/// Fetches every vertex of a draw from the mapped vertex buffers, converting
/// each element to floats, then walks the topology and hands one primitive at
/// a time to the sink. Strips keep a consistent winding by swapping the first
/// two vertices of every odd triangle.
#[derive(Debug, Default)]
pub struct SoftwareAssembler {
    vertex_buffers: Vec<VertexBufferBinding>,
    elements: Vec<VertexElement>,
    index_buffer: Option<IndexBufferBinding>,
    mapped_vertex: Vec<Option<MappedBuffer>>,
    mapped_index: Option<MappedBuffer>,
    constants: [Vec<f32>; 2],
    fetched: Vec<f32>,
    primitive: Vec<f32>,
}

impl SoftwareAssembler {
    /// Creates an assembler with nothing bound.
    pub fn new() -> Self {
        Self::default()
    }

    /// The constants last registered for `stage`.
    pub fn constants(&self, stage: ShaderStage) -> &[f32] {
        &self.constants[stage.index()]
    }

    /// Floats per assembled vertex.
    pub fn vertex_size(&self) -> usize {
        self.elements.iter().map(|e| e.format.components()).sum()
    }

    fn vertex_id(&self, info: &DrawInfo, i: u32) -> Result<u32, RenderError> {
        let position = info
            .start
            .checked_add(i)
            .ok_or(ResourceError::OutOfBounds)?;
        let (Some(binding), Some(mapped)) = (
            self.index_buffer.filter(|_| info.indexed),
            self.mapped_index.as_ref(),
        ) else {
            return Ok(position);
        };

        let size = binding.format.size();
        let offset = binding.offset as usize + position as usize * size;
        let bytes = mapped
            .get(offset..offset + size)
            .ok_or(ResourceError::OutOfBounds)?;
        let index = match binding.format {
            IndexFormat::Uint16 => u32::from(bytemuck::pod_read_unaligned::<u16>(bytes)),
            IndexFormat::Uint32 => bytemuck::pod_read_unaligned::<u32>(bytes),
        };

        let biased = i64::from(index) + i64::from(info.index_bias);
        u32::try_from(biased).map_err(|_| ResourceError::OutOfBounds.into())
    }

    fn fetch_vertex(&mut self, vertex: u32) -> Result<(), RenderError> {
        for element in &self.elements {
            let binding = self
                .vertex_buffers
                .get(element.slot)
                .ok_or(ResourceError::InvalidHandle)?;
            let mapped = self
                .mapped_vertex
                .get(element.slot)
                .and_then(Option::as_ref)
                .ok_or(ResourceError::InvalidHandle)?;

            let offset = binding.offset as usize
                + vertex as usize * binding.stride as usize
                + element.offset as usize;
            let bytes = mapped
                .get(offset..offset + element.format.size())
                .ok_or(ResourceError::OutOfBounds)?;
            read_element(element.format, bytes, &mut self.fetched);
        }
        Ok(())
    }

    fn emit(
        &mut self,
        kind: PrimitiveKind,
        vertices: &[usize],
        sink: &mut dyn PrimitiveSink,
    ) -> Result<(), RenderError> {
        let vertex_size = self.vertex_size();
        self.primitive.clear();
        for &v in vertices {
            self.primitive
                .extend_from_slice(&self.fetched[v * vertex_size..(v + 1) * vertex_size]);
        }
        sink.emit(&Primitive {
            kind,
            vertex_size,
            vertices: &self.primitive,
        })
    }
}

fn read_element(format: VertexFormat, bytes: &[u8], out: &mut Vec<f32>) {
    match format {
        VertexFormat::Float32
        | VertexFormat::Float32x2
        | VertexFormat::Float32x3
        | VertexFormat::Float32x4 => out.extend(
            bytes
                .chunks_exact(4)
                .map(bytemuck::pod_read_unaligned::<f32>),
        ),
        VertexFormat::Unorm8x4 => out.extend(bytes.iter().map(|b| f32::from(*b) / 255.0)),
        VertexFormat::Uint8x4 => out.extend(bytes.iter().map(|b| f32::from(*b))),
        VertexFormat::Uint32 => out.push(bytemuck::pod_read_unaligned::<u32>(bytes) as f32),
        VertexFormat::Sint32 => out.push(bytemuck::pod_read_unaligned::<i32>(bytes) as f32),
    }
}

impl PrimitiveAssembler for SoftwareAssembler {
    fn set_vertex_buffers(&mut self, bindings: &[VertexBufferBinding]) {
        debug_assert!(bindings.len() <= MAX_VERTEX_BUFFERS);
        self.vertex_buffers = bindings.to_vec();
        self.mapped_vertex.resize(bindings.len(), None);
    }

    fn set_vertex_elements(&mut self, elements: &[VertexElement]) {
        self.elements = elements.to_vec();
    }

    fn set_index_buffer(&mut self, binding: Option<&IndexBufferBinding>) {
        self.index_buffer = binding.copied();
    }

    fn set_mapped_vertex_buffer(&mut self, slot: usize, buffer: Option<MappedBuffer>) {
        if slot >= self.mapped_vertex.len() {
            self.mapped_vertex.resize(slot + 1, None);
        }
        self.mapped_vertex[slot] = buffer;
    }

    fn set_mapped_index_buffer(&mut self, buffer: Option<MappedBuffer>) {
        self.mapped_index = buffer;
    }

    fn set_mapped_constant_buffer(&mut self, stage: ShaderStage, _index: u32, data: &[u8]) {
        let constants = &mut self.constants[stage.index()];
        constants.clear();
        constants.extend(
            data.chunks_exact(4)
                .map(bytemuck::pod_read_unaligned::<f32>),
        );
    }

    fn draw(&mut self, info: &DrawInfo, sink: &mut dyn PrimitiveSink) -> Result<(), RenderError> {
        self.fetched.clear();
        for i in 0..info.count {
            let vertex = self.vertex_id(info, i)?;
            self.fetch_vertex(vertex)?;
        }

        let kind = PrimitiveKind::of(info.topology);
        let count = info.primitive_count() as usize;
        log::trace!(
            "SoftwareAssembler: {} vertices -> {} {:?} primitives",
            info.count,
            count,
            kind
        );

        for p in 0..count {
            let vertices: [usize; 3] = match info.topology {
                PrimitiveTopology::PointList => [p, 0, 0],
                PrimitiveTopology::LineList => [2 * p, 2 * p + 1, 0],
                PrimitiveTopology::LineStrip => [p, p + 1, 0],
                PrimitiveTopology::TriangleList => [3 * p, 3 * p + 1, 3 * p + 2],
                PrimitiveTopology::TriangleStrip if p % 2 == 1 => [p + 1, p, p + 2],
                PrimitiveTopology::TriangleStrip => [p, p + 1, p + 2],
                PrimitiveTopology::TriangleFan => [0, p + 1, p + 2],
            };
            self.emit(kind, &vertices[..kind.vertex_count()], sink)?;
        }
        Ok(())
    }
}
