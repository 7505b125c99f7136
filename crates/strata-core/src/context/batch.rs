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

//! The command batch a context records into.

use super::command::{header, Opcode, MAX_PAYLOAD_WORDS};
use crate::renderer::api::{BatchDescriptor, BatchHandle};
use crate::renderer::error::RenderError;
use crate::renderer::traits::GraphicsDevice;
use std::borrow::Cow;
use std::sync::Arc;

/// The result of flushing a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushOutcome {
    /// Nothing was recorded, so nothing was submitted.
    Empty,
    /// The batch was submitted to the device.
    Submitted {
        /// The number of words handed to the device.
        words: usize,
    },
}

/// What [`BatchRecorder::reserve`] had to do to make room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reservation {
    /// The words fit behind the current contents.
    Fits,
    /// The batch was flushed first and is now empty.
    Flushed,
}

/// Counters kept by a [`BatchRecorder`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchStats {
    /// The number of submitted batches, explicit and automatic.
    pub submitted_batches: u64,
    /// The total number of submitted words.
    pub submitted_words: u64,
}

/// Accumulates command packets and submits them to a [`GraphicsDevice`].
///
/// Packets are never split: when a packet does not fit behind the current
/// contents the batch is submitted first and recording starts over.
#[derive(Debug)]
pub struct BatchRecorder {
    device: Arc<dyn GraphicsDevice>,
    handle: BatchHandle,
    words: Vec<u32>,
    capacity: usize,
    stats: BatchStats,
}

impl BatchRecorder {
    /// Allocates a batch of `capacity` words on `device`.
    ///
    /// ## Errors
    /// * `RenderError::BatchAllocationFailed` - If the device refuses the allocation.
    pub fn create(
        device: Arc<dyn GraphicsDevice>,
        capacity: usize,
        label: &str,
    ) -> Result<Self, RenderError> {
        let descriptor = BatchDescriptor {
            label: Some(Cow::Borrowed(label)),
            capacity_words: capacity,
        };
        let handle = device
            .create_batch(&descriptor)
            .map_err(RenderError::BatchAllocationFailed)?;

        log::debug!("Allocated batch {:?} ({} words) for '{}'", handle, capacity, label);

        Ok(Self {
            device,
            handle,
            words: Vec::with_capacity(capacity),
            capacity,
            stats: BatchStats::default(),
        })
    }

    /// The device handle of this batch.
    pub fn handle(&self) -> BatchHandle {
        self.handle
    }

    /// The capacity in words.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The number of recorded words.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Returns `true` if nothing is recorded.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// The number of words that still fit.
    pub fn remaining(&self) -> usize {
        self.capacity - self.words.len()
    }

    /// The recorded words.
    pub fn words(&self) -> &[u32] {
        &self.words
    }

    /// Submission counters.
    pub fn stats(&self) -> BatchStats {
        self.stats
    }

    /// Makes room for `words` consecutive words, flushing if needed.
    ///
    /// ## Errors
    /// * `RenderError::PacketTooLarge` - If `words` exceeds the whole capacity.
    /// * `RenderError::SubmissionFailed` - If the automatic flush fails.
    pub fn reserve(&mut self, words: usize) -> Result<Reservation, RenderError> {
        if words > self.capacity {
            return Err(RenderError::PacketTooLarge {
                words,
                capacity: self.capacity,
            });
        }
        if words <= self.remaining() {
            return Ok(Reservation::Fits);
        }

        log::trace!(
            "Batch {:?} full ({} of {} words), flushing",
            self.handle,
            self.words.len(),
            self.capacity
        );
        self.flush()?;
        Ok(Reservation::Flushed)
    }

    /// Appends one packet, flushing first if it does not fit.
    pub fn emit(&mut self, opcode: Opcode, payload: &[u32]) -> Result<Reservation, RenderError> {
        if payload.len() > MAX_PAYLOAD_WORDS {
            return Err(RenderError::PacketTooLarge {
                words: payload.len() + 1,
                capacity: self.capacity,
            });
        }
        let reservation = self.reserve(payload.len() + 1)?;
        self.push(opcode, payload);
        Ok(reservation)
    }

    /// Appends one packet into space made by a prior [`BatchRecorder::reserve`].
    pub(crate) fn push(&mut self, opcode: Opcode, payload: &[u32]) {
        debug_assert!(payload.len() < self.remaining());
        self.words.push(header(opcode, payload.len()));
        self.words.extend_from_slice(payload);
    }

    /// Submits the recorded words and starts over with an empty batch.
    ///
    /// The recorded words are discarded even when the device rejects them.
    pub fn flush(&mut self) -> Result<FlushOutcome, RenderError> {
        if self.words.is_empty() {
            return Ok(FlushOutcome::Empty);
        }

        let words = self.words.len();
        let result = self.device.submit_batch(self.handle, &self.words);
        self.words.clear();
        result?;

        self.stats.submitted_batches += 1;
        self.stats.submitted_words += words as u64;
        log::debug!("Submitted batch {:?}: {} words", self.handle, words);
        Ok(FlushOutcome::Submitted { words })
    }

    /// Releases the batch on the device. Unsubmitted words are dropped.
    pub fn destroy(self) {
        drop(self);
    }
}

impl Drop for BatchRecorder {
    fn drop(&mut self) {
        if !self.words.is_empty() {
            log::debug!(
                "Destroying batch {:?} with {} unsubmitted words",
                self.handle,
                self.words.len()
            );
        }
        self.device.destroy_batch(self.handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::command::PacketReader;
    use crate::context::testing::RecordingDevice;

    fn recorder(device: &Arc<RecordingDevice>, capacity: usize) -> BatchRecorder {
        BatchRecorder::create(device.clone(), capacity, "test").expect("batch")
    }

    #[test]
    fn flush_of_an_empty_batch_submits_nothing() {
        let device = Arc::new(RecordingDevice::default());
        let mut batch = recorder(&device, 64);
        assert_eq!(batch.flush(), Ok(FlushOutcome::Empty));
        assert!(device.submissions().is_empty());
    }

    #[test]
    fn emit_flushes_before_a_packet_that_does_not_fit() {
        let device = Arc::new(RecordingDevice::default());
        let mut batch = recorder(&device, 8);

        assert_eq!(batch.emit(Opcode::Dynamic, &[1, 2, 3]), Ok(Reservation::Fits));
        assert_eq!(batch.len(), 4);
        assert_eq!(batch.emit(Opcode::Dynamic, &[4, 5, 6, 7]), Ok(Reservation::Flushed));

        let submissions = device.submissions();
        assert_eq!(submissions.len(), 1);
        assert_eq!(submissions[0].len(), 4);
        // The second packet sits intact at the start of the new batch.
        let packet = PacketReader::new(batch.words()).next().unwrap().unwrap();
        assert_eq!(packet.payload, &[4, 5, 6, 7]);
        assert_eq!(batch.stats().submitted_batches, 1);
    }

    #[test]
    fn a_packet_larger_than_the_batch_is_rejected() {
        let device = Arc::new(RecordingDevice::default());
        let mut batch = recorder(&device, 4);
        let err = batch.emit(Opcode::Program, &[0; 4]).unwrap_err();
        assert_eq!(err, RenderError::PacketTooLarge { words: 5, capacity: 4 });
        assert!(batch.is_empty());
    }

    #[test]
    fn a_rejected_flush_discards_the_words_and_keeps_the_recorder_usable() {
        let device = Arc::new(RecordingDevice::default());
        let mut batch = recorder(&device, 16);
        batch.emit(Opcode::Dynamic, &[1, 2, 3]).unwrap();

        device.fail_next_submits(1);
        let err = batch.flush().unwrap_err();
        assert!(matches!(err, RenderError::SubmissionFailed(_)));
        assert!(batch.is_empty());
        assert_eq!(batch.stats(), BatchStats::default());

        batch.emit(Opcode::Dynamic, &[4]).unwrap();
        assert_eq!(batch.flush(), Ok(FlushOutcome::Submitted { words: 2 }));
        assert_eq!(device.submissions(), vec![vec![header(Opcode::Dynamic, 1), 4]]);
    }

    #[test]
    fn allocation_failure_is_reported() {
        let device = Arc::new(RecordingDevice::failing_allocation());
        let err = BatchRecorder::create(device, 64, "test").unwrap_err();
        assert!(matches!(err, RenderError::BatchAllocationFailed(_)));
    }

    #[test]
    fn destroy_releases_the_device_batch() {
        let device = Arc::new(RecordingDevice::default());
        let batch = recorder(&device, 16);
        let handle = batch.handle();
        batch.destroy();
        assert_eq!(device.destroyed(), vec![handle]);
    }
}
