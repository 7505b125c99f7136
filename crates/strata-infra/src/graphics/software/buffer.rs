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

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use strata_core::renderer::{
    BufferDescriptor, BufferId, BufferStore, BufferUsage, MappedBuffer, ResourceError,
};

#[derive(Debug)]
struct HostBufferEntry {
    label: Option<String>,
    usage: BufferUsage,
    bytes: Arc<Vec<u8>>,
    mapped: bool,
}

/// A snapshot of the store's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BufferStoreStats {
    /// Live buffers.
    pub buffers: usize,
    /// Bytes held by live buffers.
    pub allocated_bytes: usize,
    /// Successful map calls.
    pub maps: u64,
    /// Successful unmap calls.
    pub unmaps: u64,
}

/// A [`BufferStore`] keeping every buffer in system memory.
///
/// Mapping hands out a shared view of the contents; writes made while no
/// mapping is active never disturb a view an assembler may still hold.
#[derive(Debug, Default)]
pub struct HostBufferStore {
    buffers: Mutex<HashMap<BufferId, HostBufferEntry>>,
    next_buffer_id: AtomicUsize,
    allocated_bytes: AtomicUsize,
    maps: AtomicU64,
    unmaps: AtomicU64,
}

impl HostBufferStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn buffers(&self) -> MutexGuard<'_, HashMap<BufferId, HostBufferEntry>> {
        self.buffers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn insert(&self, descriptor: &BufferDescriptor, bytes: Vec<u8>) -> BufferId {
        let id = BufferId(self.next_buffer_id.fetch_add(1, Ordering::Relaxed));
        let size = bytes.len();
        self.allocated_bytes.fetch_add(size, Ordering::Relaxed);
        self.buffers().insert(
            id,
            HostBufferEntry {
                label: descriptor.label.as_deref().map(str::to_string),
                usage: descriptor.usage,
                bytes: Arc::new(bytes),
                mapped: false,
            },
        );

        log::debug!(
            "HostBufferStore: Created buffer '{}' with ID: {:?}, size: {} bytes",
            descriptor.label.as_deref().unwrap_or_default(),
            id,
            size
        );
        id
    }

    /// Allocates a zero-filled buffer.
    ///
    /// ## Errors
    /// * `ResourceError::AllocationFailed` - If the size is zero or does not fit in memory.
    pub fn create_buffer(&self, descriptor: &BufferDescriptor) -> Result<BufferId, ResourceError> {
        let size = usize::try_from(descriptor.size)
            .ok()
            .filter(|size| *size > 0)
            .ok_or_else(|| {
                ResourceError::AllocationFailed(format!("invalid buffer size {}", descriptor.size))
            })?;
        Ok(self.insert(descriptor, vec![0; size]))
    }

    /// Allocates a buffer holding a copy of `data`. The descriptor's size is ignored.
    pub fn create_buffer_with_data(
        &self,
        descriptor: &BufferDescriptor,
        data: &[u8],
    ) -> Result<BufferId, ResourceError> {
        if data.is_empty() {
            return Err(ResourceError::AllocationFailed(
                "invalid buffer size 0".to_string(),
            ));
        }
        Ok(self.insert(descriptor, data.to_vec()))
    }

    /// Copies `data` into buffer `id` at byte `offset`.
    ///
    /// ## Errors
    /// * `ResourceError::NotFound` - If `id` is unknown.
    /// * `ResourceError::Mapped` - If the buffer is mapped.
    /// * `ResourceError::OutOfBounds` - If the write runs past the end of the buffer.
    pub fn write_buffer(&self, id: BufferId, offset: u64, data: &[u8]) -> Result<(), ResourceError> {
        let mut buffers = self.buffers();
        let entry = buffers.get_mut(&id).ok_or(ResourceError::NotFound)?;
        if entry.mapped {
            return Err(ResourceError::Mapped);
        }

        let start = usize::try_from(offset).map_err(|_| ResourceError::OutOfBounds)?;
        let end = start
            .checked_add(data.len())
            .filter(|end| *end <= entry.bytes.len())
            .ok_or(ResourceError::OutOfBounds)?;

        Arc::make_mut(&mut entry.bytes)[start..end].copy_from_slice(data);
        log::trace!(
            "HostBufferStore: Wrote {} bytes to buffer ID: {:?} at offset {}",
            data.len(),
            id,
            offset
        );
        Ok(())
    }

    /// Frees buffer `id`.
    ///
    /// ## Errors
    /// * `ResourceError::NotFound` - If `id` is unknown.
    /// * `ResourceError::Mapped` - If the buffer is still mapped.
    pub fn destroy_buffer(&self, id: BufferId) -> Result<(), ResourceError> {
        let mut buffers = self.buffers();
        match buffers.get(&id) {
            None => return Err(ResourceError::NotFound),
            Some(entry) if entry.mapped => return Err(ResourceError::Mapped),
            Some(_) => {}
        }
        if let Some(entry) = buffers.remove(&id) {
            self.allocated_bytes
                .fetch_sub(entry.bytes.len(), Ordering::Relaxed);
            log::debug!(
                "HostBufferStore: Destroyed buffer '{}' ({:?})",
                entry.label.unwrap_or_default(),
                id
            );
        }
        Ok(())
    }

    /// A copy of the contents of buffer `id`.
    pub fn read_buffer(&self, id: BufferId) -> Option<Vec<u8>> {
        self.buffers().get(&id).map(|entry| entry.bytes.to_vec())
    }

    /// The usage flags buffer `id` was created with.
    pub fn usage(&self, id: BufferId) -> Option<BufferUsage> {
        self.buffers().get(&id).map(|entry| entry.usage)
    }

    /// Returns `true` if buffer `id` is currently mapped.
    pub fn is_mapped(&self, id: BufferId) -> bool {
        self.buffers().get(&id).is_some_and(|entry| entry.mapped)
    }

    /// Current counters.
    pub fn stats(&self) -> BufferStoreStats {
        BufferStoreStats {
            buffers: self.buffers().len(),
            allocated_bytes: self.allocated_bytes.load(Ordering::Relaxed),
            maps: self.maps.load(Ordering::Relaxed),
            unmaps: self.unmaps.load(Ordering::Relaxed),
        }
    }
}

impl BufferStore for HostBufferStore {
    fn contains(&self, id: BufferId) -> bool {
        self.buffers().contains_key(&id)
    }

    fn size(&self, id: BufferId) -> Option<u64> {
        self.buffers().get(&id).map(|entry| entry.bytes.len() as u64)
    }

    fn map(&self, id: BufferId) -> MappedBuffer {
        let mut buffers = self.buffers();
        let Some(entry) = buffers.get_mut(&id) else {
            panic!("HostBufferStore: map of unknown buffer {id:?}");
        };
        assert!(!entry.mapped, "HostBufferStore: buffer {id:?} is already mapped");

        entry.mapped = true;
        self.maps.fetch_add(1, Ordering::Relaxed);
        MappedBuffer::new(id, Arc::clone(&entry.bytes))
    }

    fn unmap(&self, id: BufferId) {
        let mut buffers = self.buffers();
        let Some(entry) = buffers.get_mut(&id) else {
            panic!("HostBufferStore: unmap of unknown buffer {id:?}");
        };
        assert!(entry.mapped, "HostBufferStore: buffer {id:?} is not mapped");

        entry.mapped = false;
        self.unmaps.fetch_add(1, Ordering::Relaxed);
    }
}
