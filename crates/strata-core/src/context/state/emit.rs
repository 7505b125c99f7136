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

//! Emission of dirty hardware state into a batch.

use super::{HardwareDirty, StateTracker, INVARIANT_STATE};
use crate::context::batch::{BatchRecorder, Reservation};
use crate::context::command::Opcode;
use crate::renderer::error::RenderError;

const EMISSION_ORDER: [(HardwareDirty, Opcode); 8] = [
    (HardwareDirty::INVARIANT, Opcode::Invariant),
    (HardwareDirty::IMMEDIATE, Opcode::Immediate),
    (HardwareDirty::DYNAMIC, Opcode::Dynamic),
    (HardwareDirty::STATIC, Opcode::Static),
    (HardwareDirty::SAMPLER, Opcode::Sampler),
    (HardwareDirty::MAP, Opcode::Map),
    (HardwareDirty::PROGRAM, Opcode::Program),
    (HardwareDirty::CONSTANTS, Opcode::Constants),
];

impl StateTracker {
    fn payload(&self, group: HardwareDirty) -> &[u32] {
        let derived = &self.derived;
        match group {
            HardwareDirty::INVARIANT => &INVARIANT_STATE,
            HardwareDirty::IMMEDIATE => &derived.immediate,
            HardwareDirty::DYNAMIC => &derived.dynamic,
            HardwareDirty::STATIC => &derived.static_state,
            HardwareDirty::SAMPLER => &derived.sampler,
            HardwareDirty::MAP => &derived.map,
            HardwareDirty::PROGRAM => &derived.program,
            HardwareDirty::CONSTANTS => &derived.constants,
            _ => &[],
        }
    }

    fn state_words(&self, groups: HardwareDirty) -> usize {
        EMISSION_ORDER
            .iter()
            .filter(|(group, _)| groups.contains(*group))
            .map(|(group, _)| 1 + self.payload(*group).len())
            .sum()
    }

    /// Words needed to emit the currently dirty hardware groups.
    pub fn hardware_state_words(&self) -> usize {
        self.state_words(self.hardware_dirty)
    }

    /// Words needed to emit every hardware group, as at the start of a batch.
    pub fn full_state_words(&self) -> usize {
        self.state_words(HardwareDirty::ALL)
    }

    /// Writes one packet per dirty hardware group and clears the mask.
    ///
    /// The caller must have reserved [`StateTracker::hardware_state_words`].
    pub(crate) fn emit_hardware_state(&mut self, batch: &mut BatchRecorder) {
        for (group, opcode) in EMISSION_ORDER {
            if self.hardware_dirty.contains(group) {
                batch.push(opcode, self.payload(group));
            }
        }
        self.hardware_dirty = HardwareDirty::EMPTY;
    }

    /// Makes room for the dirty hardware state plus `packet_words`, then
    /// emits the state so the following packets can be pushed right behind it.
    ///
    /// A batch flushed on the way starts empty, so every hardware group is
    /// emitted again. This holds when the flush fails too: its words are
    /// discarded along with the state they carried.
    pub fn prepare_batch(
        &mut self,
        batch: &mut BatchRecorder,
        packet_words: usize,
    ) -> Result<(), RenderError> {
        let needed = self.hardware_state_words() + packet_words;
        match batch.reserve(needed) {
            Ok(Reservation::Fits) => {}
            Ok(Reservation::Flushed) => {
                self.invalidate_hardware();
                batch.reserve(self.hardware_state_words() + packet_words)?;
            }
            Err(err) => {
                // An empty batch holds no state.
                if batch.is_empty() {
                    self.invalidate_hardware();
                }
                return Err(err);
            }
        }
        self.emit_hardware_state(batch);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::command::PacketReader;
    use crate::context::testing::RecordingDevice;
    use crate::context::state::DirtyState;
    use std::sync::Arc;

    fn opcodes(words: &[u32]) -> Vec<Opcode> {
        PacketReader::new(words)
            .map(|packet| packet.expect("well formed").opcode)
            .collect()
    }

    fn setup(capacity: usize) -> (Arc<RecordingDevice>, BatchRecorder, StateTracker) {
        let device = Arc::new(RecordingDevice::default());
        let batch = BatchRecorder::create(device.clone(), capacity, "test").unwrap();
        let mut tracker = StateTracker::new();
        tracker.resolve_if_dirty();
        (device, batch, tracker)
    }

    #[test]
    fn first_emission_writes_every_group_in_order() {
        let (_device, mut batch, mut tracker) = setup(256);
        let expected = tracker.full_state_words();
        tracker.prepare_batch(&mut batch, 0).unwrap();

        assert_eq!(batch.len(), expected);
        assert_eq!(
            opcodes(batch.words()),
            EMISSION_ORDER.iter().map(|(_, op)| *op).collect::<Vec<_>>()
        );
        assert!(tracker.hardware_dirty().is_empty());
    }

    #[test]
    fn only_dirty_groups_are_emitted_again() {
        let (_device, mut batch, mut tracker) = setup(256);
        tracker.prepare_batch(&mut batch, 0).unwrap();
        let before = batch.len();

        tracker.modify(DirtyState::VIEWPORT, |state| state.viewport.width = 640.0);
        tracker.resolve_if_dirty();
        tracker.prepare_batch(&mut batch, 0).unwrap();

        assert_eq!(opcodes(&batch.words()[before..]), vec![Opcode::Dynamic]);
    }

    #[test]
    fn a_flush_on_the_way_re_emits_everything() {
        let (device, mut batch, mut tracker) = setup(64);
        tracker.prepare_batch(&mut batch, 0).unwrap();
        batch.emit(Opcode::Noop, &[0; 20]).unwrap();
        let full = tracker.full_state_words();
        assert!(batch.remaining() < 20);

        tracker.prepare_batch(&mut batch, 20).unwrap();

        assert_eq!(device.submissions().len(), 1);
        assert_eq!(batch.len(), full);
        assert_eq!(opcodes(batch.words()).len(), EMISSION_ORDER.len());
    }

    #[test]
    fn a_failed_flush_on_the_way_still_invalidates_the_state() {
        let (device, mut batch, mut tracker) = setup(64);
        tracker.prepare_batch(&mut batch, 0).unwrap();
        batch.emit(Opcode::Noop, &[0; 20]).unwrap();

        device.fail_next_submits(1);
        let err = tracker.prepare_batch(&mut batch, 20).unwrap_err();

        assert!(matches!(err, RenderError::SubmissionFailed(_)));
        assert!(batch.is_empty());
        assert_eq!(tracker.hardware_dirty(), HardwareDirty::ALL);

        tracker.prepare_batch(&mut batch, 0).unwrap();
        assert_eq!(opcodes(batch.words()).first(), Some(&Opcode::Invariant));
    }

    #[test]
    fn packets_that_cannot_fit_next_to_the_state_are_rejected() {
        let (_device, mut batch, mut tracker) = setup(64);
        let err = tracker.prepare_batch(&mut batch, 64).unwrap_err();
        assert!(matches!(err, RenderError::PacketTooLarge { .. }));
    }
}
