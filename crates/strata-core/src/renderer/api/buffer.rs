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

//! Defines data structures related to GPU buffer resources.

use super::enums::IndexFormat;
use crate::strata_bitflags;
use std::borrow::Cow;
use std::ops::Deref;
use std::sync::Arc;

/// The maximum number of vertex buffer slots a context can bind.
pub const MAX_VERTEX_BUFFERS: usize = 16;

strata_bitflags! {
    /// A set of flags describing the allowed usages of a buffer.
    pub struct BufferUsage: u32 {
        /// The buffer can be bound as a vertex buffer.
        const VERTEX = 1 << 0;
        /// The buffer can be bound as an index buffer.
        const INDEX = 1 << 1;
        /// The buffer holds shader constants.
        const CONSTANT = 1 << 2;
        /// The buffer can be written from the CPU after creation.
        const COPY_DST = 1 << 3;
    }
}

/// A descriptor used to create a buffer.
#[derive(Debug, Clone)]
pub struct BufferDescriptor<'a> {
    /// An optional debug label for the buffer.
    pub label: Option<Cow<'a, str>>,
    /// The total size of the buffer in bytes.
    pub size: u64,
    /// How the buffer will be used.
    pub usage: BufferUsage,
}

/// An opaque handle to a buffer owned by a [`BufferStore`](crate::renderer::BufferStore).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(pub usize);

/// A CPU-visible view of a buffer's contents.
///
/// A mapping is handed out by [`BufferStore::map`](crate::renderer::BufferStore::map)
/// and is valid until the matching `unmap`. The bytes are shared, so cloning a
/// mapping is cheap and does not map the buffer again.
#[derive(Debug, Clone)]
pub struct MappedBuffer {
    id: BufferId,
    bytes: Arc<Vec<u8>>,
}

impl MappedBuffer {
    /// Wraps the shared contents of buffer `id`.
    pub fn new(id: BufferId, bytes: Arc<Vec<u8>>) -> Self {
        Self { id, bytes }
    }

    /// The buffer this mapping belongs to.
    pub fn id(&self) -> BufferId {
        self.id
    }

    /// The mapped bytes.
    pub fn as_bytes(&self) -> &[u8] {
        self.bytes.as_slice()
    }
}

impl Deref for MappedBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.as_bytes()
    }
}

/// Binds a buffer to a vertex buffer slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexBufferBinding {
    /// The bound buffer.
    pub buffer: BufferId,
    /// The byte distance between consecutive vertices.
    pub stride: u32,
    /// The byte offset of the first vertex.
    pub offset: u64,
}

/// Binds a buffer as the index buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IndexBufferBinding {
    /// The bound buffer.
    pub buffer: BufferId,
    /// The type of each index.
    pub format: IndexFormat,
    /// The byte offset of the first index.
    pub offset: u64,
}
