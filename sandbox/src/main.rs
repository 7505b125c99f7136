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

// Strata Sandbox
// Draws a few frames on the software device and prints what was submitted.

use std::mem;
use std::sync::Arc;

use anyhow::Result;
use strata_core::renderer::*;
use strata_core::Context;
use strata_infra::{HostBufferStore, SoftwareAssembler, SoftwareDevice};

const FRAMES: u32 = 4;

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct Vertex {
    position: [f32; 2],
    color: [u8; 4],
}

impl Vertex {
    fn elements() -> [VertexElement; 2] {
        [
            VertexElement {
                slot: 0,
                offset: 0,
                format: VertexFormat::Float32x2,
            },
            VertexElement {
                slot: 0,
                offset: mem::size_of::<[f32; 2]>() as u32,
                format: VertexFormat::Unorm8x4,
            },
        ]
    }
}

const QUAD: &[Vertex] = &[
    Vertex {
        position: [-0.5, -0.5],
        color: [255, 0, 0, 255],
    },
    Vertex {
        position: [0.5, -0.5],
        color: [0, 255, 0, 255],
    },
    Vertex {
        position: [-0.5, 0.5],
        color: [0, 0, 255, 255],
    },
    Vertex {
        position: [0.5, 0.5],
        color: [255, 255, 255, 255],
    },
];

const QUAD_INDICES: &[u16] = &[0, 1, 2, 2, 1, 3];

fn run() -> Result<()> {
    let config = ContextConfig {
        label: "sandbox".to_string(),
        ..ContextConfig::default()
    }
    .with_env_overrides();

    let device = SoftwareDevice::new();
    let store = Arc::new(HostBufferStore::new());
    let mut context = Context::new(
        Arc::new(device.clone()),
        store.clone(),
        Box::new(SoftwareAssembler::new()),
        &config,
    )?;

    let vertex_buffer = store.create_buffer_with_data(
        &BufferDescriptor {
            label: Some("Quad Vertex Buffer".into()),
            size: 0,
            usage: BufferUsage::VERTEX,
        },
        bytemuck::cast_slice(QUAD),
    )?;
    let index_buffer = store.create_buffer_with_data(
        &BufferDescriptor {
            label: Some("Quad Index Buffer".into()),
            size: 0,
            usage: BufferUsage::INDEX,
        },
        bytemuck::cast_slice(QUAD_INDICES),
    )?;

    let target = Surface::new(SurfaceId(0), TextureFormat::Bgra8Unorm, 320, 240);
    let depth = Surface::new(SurfaceId(1), TextureFormat::Depth24PlusStencil8, 320, 240);
    context.set_framebuffer(Framebuffer::new(320, 240, &[target], Some(depth))?);
    context.set_viewport(Viewport {
        x: 0.0,
        y: 0.0,
        width: 320.0,
        height: 240.0,
    });
    context.set_vertex_buffers(&[VertexBufferBinding {
        buffer: vertex_buffer,
        stride: mem::size_of::<Vertex>() as u32,
        offset: 0,
    }])?;
    context.set_vertex_elements(&Vertex::elements())?;
    context.set_index_buffer(Some(IndexBufferBinding {
        buffer: index_buffer,
        format: IndexFormat::Uint16,
        offset: 0,
    }))?;

    for frame in 0..FRAMES {
        let shade = frame as f32 / FRAMES as f32;
        context.set_blend_color([shade, shade, shade, 1.0]);
        context.clear(
            ClearFlags::COLOR | ClearFlags::DEPTH,
            [0.1, 0.1, 0.1, 1.0],
            1.0,
            0,
        )?;
        context.draw(&DrawInfo::elements(
            PrimitiveTopology::TriangleList,
            0,
            QUAD_INDICES.len() as u32,
        ))?;
        context.draw(&DrawInfo::arrays(PrimitiveTopology::TriangleStrip, 0, 4))?;
        let outcome = context.flush()?;
        log::info!("Frame {frame}: {outcome:?}");
    }

    for submission in device.drain_submissions() {
        let summary = submission.summary()?;
        log::info!(
            "Submission #{}: {} words, {} state packets, {} primitives, {} clears",
            submission.sequence,
            submission.words.len(),
            summary.state_packets,
            summary.primitives,
            summary.clears
        );
    }

    log::info!("Context stats: {:?}", context.stats());
    log::info!("Buffer store stats: {:?}", store.stats());
    context.destroy();
    Ok(())
}

fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info")).init();
    run()
}
