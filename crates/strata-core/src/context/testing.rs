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

//! Recording test doubles for the context's collaborators.

use super::state::{CurrentState, DerivedState, DirtyState, HardwareDirty, StateAtom};
use crate::renderer::api::*;
use crate::renderer::error::{RenderError, ResourceError};
use crate::renderer::traits::*;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Map(BufferId),
    Unmap(BufferId),
    Atom(&'static str),
    Assemble {
        vertex_slots: usize,
        index: Option<BufferId>,
        constant_bytes: usize,
    },
    Submit(usize),
}

pub type EventLog = Arc<Mutex<Vec<Event>>>;

pub fn events(log: &EventLog) -> Vec<Event> {
    log.lock().unwrap().clone()
}

#[derive(Debug, Default)]
pub struct RecordingDevice {
    log: EventLog,
    submissions: Mutex<Vec<Vec<u32>>>,
    destroyed: Mutex<Vec<BatchHandle>>,
    next_batch: AtomicU64,
    failing_submits: AtomicUsize,
    fail_allocation: bool,
    unsupported: Vec<RasterizePath>,
}

impl RecordingDevice {
    pub fn with_log(log: EventLog) -> Self {
        Self {
            log,
            ..Default::default()
        }
    }

    pub fn failing_allocation() -> Self {
        Self {
            fail_allocation: true,
            ..Default::default()
        }
    }

    pub fn without_path(mut self, path: RasterizePath) -> Self {
        self.unsupported.push(path);
        self
    }

    /// Rejects the next `count` submissions.
    pub fn fail_next_submits(&self, count: usize) {
        self.failing_submits.store(count, Ordering::Relaxed);
    }

    pub fn submissions(&self) -> Vec<Vec<u32>> {
        self.submissions.lock().unwrap().clone()
    }

    pub fn destroyed(&self) -> Vec<BatchHandle> {
        self.destroyed.lock().unwrap().clone()
    }
}

impl GraphicsDevice for RecordingDevice {
    fn create_batch(&self, _: &BatchDescriptor) -> Result<BatchHandle, ResourceError> {
        if self.fail_allocation {
            return Err(ResourceError::AllocationFailed("out of batches".into()));
        }
        Ok(BatchHandle(self.next_batch.fetch_add(1, Ordering::Relaxed)))
    }

    fn destroy_batch(&self, batch: BatchHandle) {
        self.destroyed.lock().unwrap().push(batch);
    }

    fn submit_batch(&self, _: BatchHandle, words: &[u32]) -> Result<(), RenderError> {
        let failing = self
            .failing_submits
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(RenderError::SubmissionFailed("device lost".into()));
        }
        self.log.lock().unwrap().push(Event::Submit(words.len()));
        self.submissions.lock().unwrap().push(words.to_vec());
        Ok(())
    }

    fn device_info(&self) -> DeviceInfo {
        DeviceInfo {
            name: "recording".to_string(),
            device_type: DeviceType::Cpu,
        }
    }

    fn supports_path(&self, path: RasterizePath) -> bool {
        !self.unsupported.contains(&path)
    }
}

#[derive(Debug, Default)]
pub struct RecordingStore {
    log: EventLog,
    buffers: Mutex<HashMap<BufferId, (Arc<Vec<u8>>, bool)>>,
    next_id: AtomicUsize,
}

impl RecordingStore {
    pub fn with_log(log: EventLog) -> Self {
        Self {
            log,
            ..Default::default()
        }
    }

    pub fn add(&self, bytes: Vec<u8>) -> BufferId {
        let id = BufferId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.buffers
            .lock()
            .unwrap()
            .insert(id, (Arc::new(bytes), false));
        id
    }

    pub fn mapped_count(&self) -> usize {
        let buffers = self.buffers.lock().unwrap();
        buffers.values().filter(|(_, mapped)| *mapped).count()
    }
}

impl BufferStore for RecordingStore {
    fn contains(&self, id: BufferId) -> bool {
        self.buffers.lock().unwrap().contains_key(&id)
    }

    fn size(&self, id: BufferId) -> Option<u64> {
        let buffers = self.buffers.lock().unwrap();
        buffers.get(&id).map(|(bytes, _)| bytes.len() as u64)
    }

    fn map(&self, id: BufferId) -> MappedBuffer {
        let mut buffers = self.buffers.lock().unwrap();
        let (bytes, mapped) = buffers.get_mut(&id).expect("unknown buffer");
        assert!(!*mapped, "buffer {id:?} mapped twice");
        *mapped = true;
        self.log.lock().unwrap().push(Event::Map(id));
        MappedBuffer::new(id, Arc::clone(bytes))
    }

    fn unmap(&self, id: BufferId) {
        let mut buffers = self.buffers.lock().unwrap();
        let (_, mapped) = buffers.get_mut(&id).expect("unknown buffer");
        assert!(*mapped, "buffer {id:?} not mapped");
        *mapped = false;
        self.log.lock().unwrap().push(Event::Unmap(id));
    }
}

/// Emits `primitive_count` zeroed primitives of four floats per vertex.
#[derive(Debug, Default)]
pub struct RecordingAssembler {
    log: EventLog,
    vertex: Vec<Option<MappedBuffer>>,
    index: Option<MappedBuffer>,
    constant_bytes: usize,
    fail: bool,
}

impl RecordingAssembler {
    pub fn with_log(log: EventLog) -> Self {
        Self {
            log,
            ..Default::default()
        }
    }

    pub fn failing(log: EventLog) -> Self {
        Self {
            log,
            fail: true,
            ..Default::default()
        }
    }
}

impl PrimitiveAssembler for RecordingAssembler {
    fn set_vertex_buffers(&mut self, bindings: &[VertexBufferBinding]) {
        self.vertex.resize(bindings.len(), None);
    }

    fn set_vertex_elements(&mut self, _: &[VertexElement]) {}

    fn set_index_buffer(&mut self, _: Option<&IndexBufferBinding>) {}

    fn set_mapped_vertex_buffer(&mut self, slot: usize, buffer: Option<MappedBuffer>) {
        if self.vertex.len() <= slot {
            self.vertex.resize(slot + 1, None);
        }
        self.vertex[slot] = buffer;
    }

    fn set_mapped_index_buffer(&mut self, buffer: Option<MappedBuffer>) {
        self.index = buffer;
    }

    fn set_mapped_constant_buffer(&mut self, _: ShaderStage, _: u32, data: &[u8]) {
        self.constant_bytes = data.len();
    }

    fn draw(&mut self, info: &DrawInfo, sink: &mut dyn PrimitiveSink) -> Result<(), RenderError> {
        self.log.lock().unwrap().push(Event::Assemble {
            vertex_slots: self.vertex.iter().flatten().count(),
            index: self.index.as_ref().map(MappedBuffer::id),
            constant_bytes: self.constant_bytes,
        });
        if self.fail {
            return Err(RenderError::Internal("assembler failure".into()));
        }

        let kind = PrimitiveKind::of(info.topology);
        let vertices = vec![0.0; kind.vertex_count() * 4];
        for _ in 0..info.primitive_count() {
            sink.emit(&Primitive {
                kind,
                vertex_size: 4,
                vertices: &vertices,
            })?;
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct RecordingAtom {
    pub name: &'static str,
    pub dependencies: DirtyState,
    pub log: EventLog,
}

impl StateAtom for RecordingAtom {
    fn name(&self) -> &'static str {
        self.name
    }

    fn dependencies(&self) -> DirtyState {
        self.dependencies
    }

    fn update(&mut self, _: &CurrentState, _: &mut DerivedState) -> HardwareDirty {
        self.log.lock().unwrap().push(Event::Atom(self.name));
        HardwareDirty::EMPTY
    }
}
