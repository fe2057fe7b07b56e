//! RFC 6455 frame codec.
//!
//! Frame layout (2-byte base header + optional extended length + optional mask
//! key + payload):
//!
//! ```text
//! +-----+------+------+------+--------+------+---------+-------------------+
//! | FIN | RSV1 | RSV2 | RSV3 | opcode | MASK | len (7) | ext len (0/16/64) |
//! | 1b  |  1b  |  1b  |  1b  |   4b   |  1b  |   7b    |   big-endian      |
//! +-----+------+------+------+--------+------+---------+-------------------+
//! | [mask key: 4 bytes if MASK set] | payload                              |
//! +---------------------------------+--------------------------------------+
//! ```
//!
//! Encoding covers the client role only: outgoing frames are always masked.
//! Decoding handles both masked and unmasked frames. Fragmented messages are
//! not reassembled; each decoded frame stands alone and `fin` is informational.

use crate::error::ProtocolError;
use bytes::{BufMut, Bytes, BytesMut};
use std::io::Read;

/// Largest payload length encodable in the 7-bit length field.
const LEN_7BIT_MAX: u64 = 125;
/// 7-bit marker for a 16-bit extended length.
const LEN_16BIT: u8 = 126;
/// 7-bit marker for a 64-bit extended length.
const LEN_64BIT: u8 = 127;

/// Chunk size for payload reads (8 KiB). Correctness does not depend on this;
/// the mask cycle position is carried across chunk boundaries.
pub const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Frame opcodes (RFC 6455 §5.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    Continuation,
    Text,
    Binary,
    Close,
    Ping,
    Pong,
}

impl Opcode {
    pub fn bits(&self) -> u8 {
        match self {
            Opcode::Continuation => 0x0,
            Opcode::Text => 0x1,
            Opcode::Binary => 0x2,
            Opcode::Close => 0x8,
            Opcode::Ping => 0x9,
            Opcode::Pong => 0xA,
        }
    }

    pub fn from_bits(bits: u8) -> Result<Self, ProtocolError> {
        match bits {
            0x0 => Ok(Opcode::Continuation),
            0x1 => Ok(Opcode::Text),
            0x2 => Ok(Opcode::Binary),
            0x8 => Ok(Opcode::Close),
            0x9 => Ok(Opcode::Ping),
            0xA => Ok(Opcode::Pong),
            other => Err(ProtocolError::UnknownOpcode(other)),
        }
    }
}

/// XOR-masks `data` in place with `key`, starting at `offset` in the 4-byte
/// cycle. Returns the cycle position after the last byte so callers can
/// continue across chunk boundaries. Applying the same key twice restores the
/// original bytes.
pub fn apply_mask(data: &mut [u8], key: [u8; 4], mut offset: usize) -> usize {
    for b in data.iter_mut() {
        *b ^= key[offset & 3];
        offset = offset.wrapping_add(1);
    }
    offset
}

/// A single WebSocket frame.
#[derive(Debug, Clone)]
pub struct Frame {
    pub fin: bool,
    pub opcode: Opcode,
    /// Whether the frame arrived masked. Always true for encoded frames.
    pub masked: bool,
    pub payload: Bytes,
}

impl Frame {
    /// Creates a final text frame with the given payload.
    pub fn text(payload: impl Into<Bytes>) -> Self {
        Self {
            fin: true,
            opcode: Opcode::Text,
            masked: true,
            payload: payload.into(),
        }
    }

    /// Encodes the frame for the client side of the connection.
    ///
    /// Client frames are always masked (RFC 6455 §5.3): the payload is XORed
    /// with `mask_key`, cycling every 4 bytes, and the key is written before
    /// the payload. Lengths up to 125 use the 7-bit field, up to 65535 the
    /// 16-bit extension, and anything larger the 64-bit extension.
    pub fn encode(&self, mask_key: [u8; 4]) -> BytesMut {
        let len = self.payload.len() as u64;
        let mut buf = BytesMut::with_capacity(14 + self.payload.len());

        // rsv bits are always 0 on the client side
        buf.put_u8((u8::from(self.fin) << 7) | self.opcode.bits());

        if len <= LEN_7BIT_MAX {
            buf.put_u8(0x80 | len as u8);
        } else if len <= u16::MAX as u64 {
            buf.put_u8(0x80 | LEN_16BIT);
            buf.put_u16(len as u16);
        } else {
            buf.put_u8(0x80 | LEN_64BIT);
            buf.put_u64(len);
        }

        buf.put_slice(&mask_key);

        let start = buf.len();
        buf.put_slice(&self.payload);
        apply_mask(&mut buf[start..], mask_key, 0);

        buf
    }

    /// Reads one frame from `reader`.
    ///
    /// Returns `Ok(None)` if the source yields no bytes at a frame boundary,
    /// which callers treat as the peer having closed the connection. A frame
    /// with reserved bits set is a protocol violation; the caller must drop
    /// the underlying transport. Zero-length frames return immediately without
    /// consuming any mask or payload bytes.
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Option<Frame>, ProtocolError> {
        let mut header = [0u8; 1];
        if reader.read(&mut header)? == 0 {
            return Ok(None);
        }

        let fin = header[0] & 0x80 != 0;
        let rsv = (header[0] >> 4) & 0x7;
        if rsv != 0 {
            return Err(ProtocolError::ReservedBits(rsv));
        }
        let opcode = Opcode::from_bits(header[0] & 0x0F)?;

        let mut lenb = [0u8; 1];
        reader.read_exact(&mut lenb)?;
        let masked = lenb[0] & 0x80 != 0;
        let mut len = (lenb[0] & 0x7F) as u64;

        if len == LEN_16BIT as u64 {
            let mut ext = [0u8; 2];
            reader.read_exact(&mut ext)?;
            len = u16::from_be_bytes(ext) as u64;
        } else if len == LEN_64BIT as u64 {
            let mut ext = [0u8; 8];
            reader.read_exact(&mut ext)?;
            len = u64::from_be_bytes(ext);
            if len > i64::MAX as u64 {
                return Err(ProtocolError::FrameTooLarge(len));
            }
        }

        if len == 0 {
            return Ok(Some(Frame {
                fin,
                opcode,
                masked,
                payload: Bytes::new(),
            }));
        }

        let mask_key = if masked {
            let mut key = [0u8; 4];
            reader.read_exact(&mut key)?;
            Some(key)
        } else {
            None
        };

        let mut payload = BytesMut::with_capacity(len.min(READ_CHUNK_SIZE as u64) as usize);
        let mut chunk = vec![0u8; READ_CHUNK_SIZE.min(len as usize)];
        let mut remaining = len as usize;
        let mut cycle = 0;
        while remaining > 0 {
            let want = remaining.min(READ_CHUNK_SIZE);
            reader.read_exact(&mut chunk[..want])?;
            if let Some(key) = mask_key {
                cycle = apply_mask(&mut chunk[..want], key, cycle);
            }
            payload.extend_from_slice(&chunk[..want]);
            remaining -= want;
        }

        Ok(Some(Frame {
            fin,
            opcode,
            masked,
            payload: payload.freeze(),
        }))
    }
}
