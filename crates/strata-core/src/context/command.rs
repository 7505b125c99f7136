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

//! Command packet encoding.
//!
//! A batch is a stream of 32-bit words. Every packet starts with a header word
//! holding the opcode in the top byte and the payload length (in words) in the
//! low 24 bits, followed by the payload itself.

use std::fmt;

/// The largest payload a single packet can carry.
pub const MAX_PAYLOAD_WORDS: usize = 0x00ff_ffff;

const OPCODE_SHIFT: u32 = 24;
const LENGTH_MASK: u32 = 0x00ff_ffff;

/// Identifies the kind of a packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    /// Padding, carries no payload.
    Noop = 0x00,
    /// State that never changes over the life of a batch.
    Invariant = 0x01,
    /// Vertex format, rasterizer, depth/stencil and blend registers.
    Immediate = 0x02,
    /// Blend color, stencil reference, scissor and viewport.
    Dynamic = 0x03,
    /// Render target description.
    Static = 0x04,
    /// Sampler registers.
    Sampler = 0x05,
    /// Texture map descriptions of the sampler views.
    Map = 0x06,
    /// Fragment program.
    Program = 0x07,
    /// Fragment constants.
    Constants = 0x08,
    /// A run of vertex data referenced by the following `PrimVbuf`.
    VertexData = 0x10,
    /// Draws the preceding vertex run: `[kind, vertex_count, vertex_size]`.
    PrimVbuf = 0x11,
    /// Draws one primitive with inline vertices: `[kind, vertex_size, vertices...]`.
    PrimInline = 0x12,
    /// Clears one attachment.
    Clear = 0x20,
}

impl Opcode {
    /// Decodes an opcode byte.
    pub fn from_u8(value: u8) -> Option<Self> {
        let opcode = match value {
            0x00 => Opcode::Noop,
            0x01 => Opcode::Invariant,
            0x02 => Opcode::Immediate,
            0x03 => Opcode::Dynamic,
            0x04 => Opcode::Static,
            0x05 => Opcode::Sampler,
            0x06 => Opcode::Map,
            0x07 => Opcode::Program,
            0x08 => Opcode::Constants,
            0x10 => Opcode::VertexData,
            0x11 => Opcode::PrimVbuf,
            0x12 => Opcode::PrimInline,
            0x20 => Opcode::Clear,
            _ => return None,
        };
        Some(opcode)
    }

    /// Returns `true` for packets that carry hardware state.
    pub fn is_state(&self) -> bool {
        matches!(
            self,
            Opcode::Invariant
                | Opcode::Immediate
                | Opcode::Dynamic
                | Opcode::Static
                | Opcode::Sampler
                | Opcode::Map
                | Opcode::Program
                | Opcode::Constants
        )
    }
}

/// Builds the header word of a packet.
pub fn header(opcode: Opcode, payload_words: usize) -> u32 {
    debug_assert!(payload_words <= MAX_PAYLOAD_WORDS);
    ((opcode as u32) << OPCODE_SHIFT) | (payload_words as u32 & LENGTH_MASK)
}

/// Splits a header word into its opcode and payload length.
pub fn decode_header(word: u32) -> Option<(Opcode, usize)> {
    let opcode = Opcode::from_u8((word >> OPCODE_SHIFT) as u8)?;
    Some((opcode, (word & LENGTH_MASK) as usize))
}

/// A decoded packet borrowing its payload from the batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Packet<'a> {
    /// The packet kind.
    pub opcode: Opcode,
    /// The payload words.
    pub payload: &'a [u32],
}

/// A malformed word stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketError {
    /// The header at `offset` has an unknown opcode.
    UnknownOpcode {
        /// Word offset of the header.
        offset: usize,
    },
    /// The packet at `offset` claims more payload than the stream holds.
    Truncated {
        /// Word offset of the header.
        offset: usize,
    },
}

impl fmt::Display for PacketError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PacketError::UnknownOpcode { offset } => {
                write!(f, "unknown opcode at word {offset}")
            }
            PacketError::Truncated { offset } => write!(f, "truncated packet at word {offset}"),
        }
    }
}

impl std::error::Error for PacketError {}

/// Iterates over the packets of a word stream.
#[derive(Debug, Clone)]
pub struct PacketReader<'a> {
    words: &'a [u32],
    offset: usize,
}

impl<'a> PacketReader<'a> {
    /// Reads packets from `words`.
    pub fn new(words: &'a [u32]) -> Self {
        Self { words, offset: 0 }
    }
}

impl<'a> Iterator for PacketReader<'a> {
    type Item = Result<Packet<'a>, PacketError>;

    fn next(&mut self) -> Option<Self::Item> {
        let offset = self.offset;
        let word = *self.words.get(offset)?;

        let Some((opcode, len)) = decode_header(word) else {
            self.offset = self.words.len();
            return Some(Err(PacketError::UnknownOpcode { offset }));
        };

        let start = offset + 1;
        let Some(payload) = self.words.get(start..start + len) else {
            self.offset = self.words.len();
            return Some(Err(PacketError::Truncated { offset }));
        };

        self.offset = start + len;
        Some(Ok(Packet { opcode, payload }))
    }
}

/// Reinterprets floats as payload words.
pub fn float_words(values: &[f32]) -> &[u32] {
    bytemuck::cast_slice(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_round_trips_opcode_and_length() {
        let word = header(Opcode::PrimInline, 11);
        assert_eq!(word >> 24, 0x12);
        assert_eq!(decode_header(word), Some((Opcode::PrimInline, 11)));
    }

    #[test]
    fn reader_walks_consecutive_packets() {
        let mut words = vec![header(Opcode::Invariant, 2), 7, 8];
        words.push(header(Opcode::Noop, 0));
        words.extend([header(Opcode::PrimVbuf, 3), 2, 3, 4]);

        let packets: Vec<_> = PacketReader::new(&words)
            .collect::<Result<_, _>>()
            .expect("well formed");
        assert_eq!(packets.len(), 3);
        assert_eq!(packets[0].payload, &[7, 8]);
        assert_eq!(packets[1].opcode, Opcode::Noop);
        assert_eq!(packets[2].payload, &[2, 3, 4]);
    }

    #[test]
    fn reader_reports_truncation_and_stops() {
        let words = [header(Opcode::Constants, 4), 1, 2];
        let mut reader = PacketReader::new(&words);
        assert_eq!(reader.next(), Some(Err(PacketError::Truncated { offset: 0 })));
        assert_eq!(reader.next(), None);
    }

    #[test]
    fn reader_reports_unknown_opcodes() {
        let words = [0x7f00_0000];
        let mut reader = PacketReader::new(&words);
        assert_eq!(
            reader.next(),
            Some(Err(PacketError::UnknownOpcode { offset: 0 }))
        );
    }

    #[test]
    fn float_words_keep_bit_patterns() {
        let words = float_words(&[1.0, -2.5]);
        assert_eq!(words, &[1.0f32.to_bits(), (-2.5f32).to_bits()]);
    }
}
