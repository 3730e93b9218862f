use super::Chunk::ChunkHeader;
use crate::Core::alloc::BLOCK_ALIGN;
use crate::Core::error::ConfigError;
use std::mem::{align_of, size_of};
use std::sync::atomic::AtomicPtr;

// The header is placed at the start of a BLOCK_ALIGN aligned block.
const _: () = assert!(align_of::<ChunkHeader<u8>>() <= BLOCK_ALIGN);
const _: () = assert!(align_of::<AtomicPtr<u8>>() <= BLOCK_ALIGN);

/// Byte offset of the first slot from the start of the chunk.
#[inline]
pub const fn slots_offset<T>() -> usize {
    let header = size_of::<ChunkHeader<T>>();
    let align = align_of::<AtomicPtr<T>>();
    (header + align - 1) & !(align - 1)
}

/// Size of one slot in bytes.
#[inline]
pub const fn slot_stride<T>() -> usize {
    size_of::<AtomicPtr<T>>()
}

/// Number of slots a block of `block_size` bytes can carry.
pub fn slots_for_block<T>(block_size: usize) -> Result<usize, ConfigError> {
    let required = slots_offset::<T>() + slot_stride::<T>();
    if block_size < required {
        return Err(ConfigError::BlockTooSmall { block_size, required });
    }
    Ok((block_size - slots_offset::<T>()) / slot_stride::<T>())
}

/// Smallest block size that carries `slots` slots.
pub fn block_size_for_slots<T>(slots: usize) -> Result<usize, ConfigError> {
    if slots == 0 {
        return Err(ConfigError::ZeroSlots);
    }
    slots
        .checked_mul(slot_stride::<T>())
        .and_then(|bytes| bytes.checked_add(slots_offset::<T>()))
        .ok_or(ConfigError::BlockTooLarge { block_size: usize::MAX })
}
