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
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use strata_core::context::command::{Opcode, PacketError, PacketReader};
use strata_core::renderer::{
    BatchDescriptor, BatchHandle, DeviceInfo, DeviceType, GraphicsDevice, PrimitiveKind,
    RasterizePath, RenderError, ResourceError,
};

/// A batch accepted by the [`SoftwareDevice`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    /// Position in the device-wide submission order, starting at zero.
    pub sequence: u64,
    /// The batch the words were recorded into.
    pub batch: BatchHandle,
    /// The label the batch was created with.
    pub label: Option<String>,
    /// The submitted words.
    pub words: Vec<u32>,
}

/// Packet counts of a [`Submission`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubmissionSummary {
    /// Hardware state packets.
    pub state_packets: usize,
    /// Vertex runs (`PRIM_VBUF` packets).
    pub vertex_runs: usize,
    /// Primitives, whichever packet carried them.
    pub primitives: usize,
    /// Clear packets.
    pub clears: usize,
}

impl Submission {
    /// Iterates over the packets of the batch.
    pub fn packets(&self) -> PacketReader<'_> {
        PacketReader::new(&self.words)
    }

    /// Counts the packets of the batch by kind.
    pub fn summary(&self) -> Result<SubmissionSummary, PacketError> {
        let mut summary = SubmissionSummary::default();
        for packet in self.packets() {
            let packet = packet?;
            match packet.opcode {
                op if op.is_state() => summary.state_packets += 1,
                Opcode::PrimVbuf => {
                    summary.vertex_runs += 1;
                    let per_primitive = packet
                        .payload
                        .first()
                        .and_then(|code| PrimitiveKind::from_code(*code))
                        .map_or(1, |kind| kind.vertex_count());
                    let vertices = packet.payload.get(1).copied().unwrap_or(0) as usize;
                    summary.primitives += vertices / per_primitive;
                }
                Opcode::PrimInline => summary.primitives += 1,
                Opcode::Clear => summary.clears += 1,
                _ => {}
            }
        }
        Ok(summary)
    }
}

#[derive(Debug)]
struct SoftwareBatchEntry {
    label: Option<String>,
    capacity_words: usize,
}

#[derive(Debug)]
struct SoftwareDeviceInternal {
    name: String,
    paths: Vec<RasterizePath>,
    max_batches: Option<usize>,
    batches: Mutex<HashMap<BatchHandle, SoftwareBatchEntry>>,
    next_batch_id: AtomicU64,
    next_sequence: AtomicU64,
    dropped: AtomicU64,
    sender: flume::Sender<Submission>,
    receiver: flume::Receiver<Submission>,
}

/// Submissions kept by default before the oldest are dropped.
pub const DEFAULT_FEED_CAPACITY: usize = 256;

/// A [`GraphicsDevice`] that validates submitted batches and publishes them
/// on a channel instead of executing them.
///
/// The feed keeps at most its capacity of undrained submissions (see
/// [`SoftwareDeviceBuilder::with_feed_capacity`]); past that the oldest one
/// is dropped for each new one. Cloning yields another handle to the same
/// device.
#[derive(Clone, Debug)]
pub struct SoftwareDevice {
    internal: Arc<SoftwareDeviceInternal>,
}

/// Configures a [`SoftwareDevice`].
#[derive(Debug, Clone)]
pub struct SoftwareDeviceBuilder {
    name: String,
    paths: Vec<RasterizePath>,
    max_batches: Option<usize>,
    feed_capacity: Option<usize>,
}

impl Default for SoftwareDeviceBuilder {
    fn default() -> Self {
        Self {
            name: "Strata Software Device".to_string(),
            paths: vec![RasterizePath::VertexBuffer, RasterizePath::DirectRender],
            max_batches: None,
            feed_capacity: Some(DEFAULT_FEED_CAPACITY),
        }
    }
}

impl SoftwareDeviceBuilder {
    /// Sets the name reported by [`GraphicsDevice::device_info`].
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Restricts the rasterize paths the device claims to support.
    pub fn with_paths(mut self, paths: &[RasterizePath]) -> Self {
        self.paths = paths.to_vec();
        self
    }

    /// Limits the number of live batches. Allocations beyond it fail.
    pub fn with_max_batches(mut self, max_batches: usize) -> Self {
        self.max_batches = Some(max_batches);
        self
    }

    /// Keeps at most `capacity` undrained submissions (at least one).
    pub fn with_feed_capacity(mut self, capacity: usize) -> Self {
        self.feed_capacity = Some(capacity.max(1));
        self
    }

    /// Keeps every submission until it is drained.
    pub fn with_unbounded_feed(mut self) -> Self {
        self.feed_capacity = None;
        self
    }

    /// Creates the device.
    pub fn build(self) -> SoftwareDevice {
        let (sender, receiver) = match self.feed_capacity {
            Some(capacity) => flume::bounded(capacity),
            None => flume::unbounded(),
        };
        log::info!(
            "SoftwareDevice '{}' initialized (paths: {:?})",
            self.name,
            self.paths
        );
        SoftwareDevice {
            internal: Arc::new(SoftwareDeviceInternal {
                name: self.name,
                paths: self.paths,
                max_batches: self.max_batches,
                batches: Mutex::new(HashMap::new()),
                next_batch_id: AtomicU64::new(0),
                next_sequence: AtomicU64::new(0),
                dropped: AtomicU64::new(0),
                sender,
                receiver,
            }),
        }
    }
}

impl Default for SoftwareDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl SoftwareDevice {
    /// Creates a device supporting both rasterize paths.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Starts configuring a device.
    pub fn builder() -> SoftwareDeviceBuilder {
        SoftwareDeviceBuilder::default()
    }

    fn batches(&self) -> MutexGuard<'_, HashMap<BatchHandle, SoftwareBatchEntry>> {
        self.internal
            .batches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// The receiving end of the submission feed.
    ///
    /// Every clone drains the same queue: each submission is delivered once.
    pub fn submissions(&self) -> flume::Receiver<Submission> {
        self.internal.receiver.clone()
    }

    /// Takes every submission published so far.
    pub fn drain_submissions(&self) -> Vec<Submission> {
        self.internal.receiver.try_iter().collect()
    }

    /// Submissions dropped because the feed was full.
    pub fn dropped_submissions(&self) -> u64 {
        self.internal.dropped.load(Ordering::Relaxed)
    }

    fn publish(&self, mut submission: Submission) {
        loop {
            match self.internal.sender.try_send(submission) {
                Ok(()) => return,
                Err(flume::TrySendError::Full(rejected)) => {
                    if let Ok(oldest) = self.internal.receiver.try_recv() {
                        self.internal.dropped.fetch_add(1, Ordering::Relaxed);
                        log::debug!(
                            "SoftwareDevice: Feed full, dropped submission #{}",
                            oldest.sequence
                        );
                    }
                    submission = rejected;
                }
                Err(flume::TrySendError::Disconnected(_)) => {
                    log::error!("Failed to publish submission: receiver disconnected.");
                    return;
                }
            }
        }
    }

    /// The number of live batches.
    pub fn live_batches(&self) -> usize {
        self.batches().len()
    }
}

impl GraphicsDevice for SoftwareDevice {
    fn create_batch(&self, descriptor: &BatchDescriptor) -> Result<BatchHandle, ResourceError> {
        let mut batches = self.batches();
        if let Some(max) = self.internal.max_batches {
            if batches.len() >= max {
                return Err(ResourceError::AllocationFailed(format!(
                    "batch limit of {max} reached"
                )));
            }
        }

        let handle = BatchHandle(self.internal.next_batch_id.fetch_add(1, Ordering::Relaxed));
        batches.insert(
            handle,
            SoftwareBatchEntry {
                label: descriptor.label.as_deref().map(str::to_string),
                capacity_words: descriptor.capacity_words,
            },
        );
        log::debug!(
            "SoftwareDevice: Created batch '{}' with ID: {:?}",
            descriptor.label.as_deref().unwrap_or_default(),
            handle
        );
        Ok(handle)
    }

    fn destroy_batch(&self, batch: BatchHandle) {
        if self.batches().remove(&batch).is_none() {
            log::warn!("SoftwareDevice: Attempted to destroy unknown batch {batch:?}");
        } else {
            log::debug!("SoftwareDevice: Destroyed batch {batch:?}");
        }
    }

    fn submit_batch(&self, batch: BatchHandle, words: &[u32]) -> Result<(), RenderError> {
        let label = {
            let batches = self.batches();
            let entry = batches.get(&batch).ok_or_else(|| {
                RenderError::SubmissionFailed(format!("unknown batch {batch:?}"))
            })?;
            if words.len() > entry.capacity_words {
                return Err(RenderError::SubmissionFailed(format!(
                    "{} words exceed the batch capacity of {}",
                    words.len(),
                    entry.capacity_words
                )));
            }
            entry.label.clone()
        };

        if let Some(err) = PacketReader::new(words).find_map(Result::err) {
            return Err(RenderError::SubmissionFailed(err.to_string()));
        }

        let submission = Submission {
            sequence: self.internal.next_sequence.fetch_add(1, Ordering::Relaxed),
            batch,
            label,
            words: words.to_vec(),
        };
        log::trace!(
            "SoftwareDevice: Accepted submission #{} ({} words)",
            submission.sequence,
            words.len()
        );
        self.publish(submission);
        Ok(())
    }

    fn device_info(&self) -> DeviceInfo {
        DeviceInfo {
            name: self.internal.name.clone(),
            device_type: DeviceType::Cpu,
        }
    }

    fn supports_path(&self, path: RasterizePath) -> bool {
        self.internal.paths.contains(&path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::borrow::Cow;
    use strata_core::context::command::header;

    fn descriptor(capacity_words: usize) -> BatchDescriptor<'static> {
        BatchDescriptor {
            label: Some(Cow::Borrowed("unit")),
            capacity_words,
        }
    }

    #[test]
    fn accepted_batches_are_published_in_order() {
        let device = SoftwareDevice::new();
        let batch = device.create_batch(&descriptor(16)).unwrap();
        device.submit_batch(batch, &[header(Opcode::Noop, 0)]).unwrap();
        device
            .submit_batch(batch, &[header(Opcode::Clear, 1), 0])
            .unwrap();

        let submissions = device.drain_submissions();
        assert_eq!(submissions.len(), 2);
        assert_eq!(submissions[0].sequence, 0);
        assert_eq!(submissions[1].sequence, 1);
        assert_eq!(submissions[1].label.as_deref(), Some("unit"));
        assert_eq!(submissions[1].summary().unwrap().clears, 1);
    }

    #[test]
    fn malformed_batches_are_rejected() {
        let device = SoftwareDevice::new();
        let batch = device.create_batch(&descriptor(16)).unwrap();
        let err = device
            .submit_batch(batch, &[header(Opcode::Program, 3), 1])
            .unwrap_err();
        assert!(matches!(err, RenderError::SubmissionFailed(_)));
        assert!(device.drain_submissions().is_empty());
    }

    #[test]
    fn oversized_and_unknown_batches_are_rejected() {
        let device = SoftwareDevice::new();
        let batch = device.create_batch(&descriptor(2)).unwrap();
        assert!(device.submit_batch(batch, &[0; 3]).is_err());
        assert!(device.submit_batch(BatchHandle(77), &[]).is_err());
    }

    #[test]
    fn a_full_feed_drops_the_oldest_submission() {
        let device = SoftwareDevice::builder().with_feed_capacity(2).build();
        let batch = device.create_batch(&descriptor(16)).unwrap();
        for _ in 0..3 {
            device.submit_batch(batch, &[header(Opcode::Noop, 0)]).unwrap();
        }

        let sequences: Vec<_> = device
            .drain_submissions()
            .iter()
            .map(|submission| submission.sequence)
            .collect();
        assert_eq!(sequences, vec![1, 2]);
        assert_eq!(device.dropped_submissions(), 1);
    }

    #[test]
    fn an_unbounded_feed_keeps_everything() {
        let device = SoftwareDevice::builder().with_unbounded_feed().build();
        let batch = device.create_batch(&descriptor(16)).unwrap();
        for _ in 0..DEFAULT_FEED_CAPACITY + 1 {
            device.submit_batch(batch, &[header(Opcode::Noop, 0)]).unwrap();
        }
        assert_eq!(device.drain_submissions().len(), DEFAULT_FEED_CAPACITY + 1);
        assert_eq!(device.dropped_submissions(), 0);
    }

    #[test]
    fn batch_limit_fails_allocation() {
        let device = SoftwareDevice::builder().with_max_batches(1).build();
        let first = device.create_batch(&descriptor(8)).unwrap();
        assert!(matches!(
            device.create_batch(&descriptor(8)),
            Err(ResourceError::AllocationFailed(_))
        ));

        device.destroy_batch(first);
        assert_eq!(device.live_batches(), 0);
        assert!(device.create_batch(&descriptor(8)).is_ok());
    }

    #[test]
    fn supported_paths_follow_the_builder() {
        let device = SoftwareDevice::builder()
            .with_name("direct only")
            .with_paths(&[RasterizePath::DirectRender])
            .build();
        assert!(!device.supports_path(RasterizePath::VertexBuffer));
        assert!(device.supports_path(RasterizePath::DirectRender));
        assert_eq!(device.device_info().name, "direct only");
    }

    #[test]
    fn summary_counts_primitives_of_vertex_runs() {
        let words = vec![
            header(Opcode::Dynamic, 0),
            header(Opcode::VertexData, 0),
            header(Opcode::PrimVbuf, 3),
            PrimitiveKind::Triangle as u32,
            9,
            0,
            header(Opcode::PrimInline, 2),
            PrimitiveKind::Line as u32,
            0,
        ];
        let submission = Submission {
            sequence: 0,
            batch: BatchHandle(0),
            label: None,
            words,
        };
        assert_eq!(
            submission.summary().unwrap(),
            SubmissionSummary {
                state_packets: 1,
                vertex_runs: 1,
                primitives: 4,
                clears: 0,
            }
        );
    }
}
