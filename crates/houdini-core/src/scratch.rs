//! Fixed-capacity scratch arena backing synthesized field storage
//!
//! The buffer never grows: its capacity is decided when the component is
//! created. `ScratchAllocator` lays out fields one after another, rounding
//! each offset up to the natural alignment of the stored type, and fails with
//! `Error::ScratchOverflow` instead of handing out space past the end.
//!
//! Values are accessed through typed `Slot` handles; every read and write is
//! bounds-checked against the buffer. Strings cannot live in raw bytes, so a
//! string slot stores a `StringHandle` into the buffer's string pool. Handle
//! zero is reserved for a slot that was never written, so a zeroed buffer
//! holds no string references.

use crate::error::{Error, Result};
use crate::value::Color;
use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;

/// Round `offset` up to the next multiple of `align` (a power of two)
pub fn align_up(offset: usize, align: usize) -> usize {
    debug_assert!(align.is_power_of_two());
    (offset + align - 1) & !(align - 1)
}

/// A value type that can be stored in the scratch buffer
pub trait ScratchValue: Sized {
    /// Stored size in bytes
    const SIZE: usize;
    /// Required alignment of the stored value
    const ALIGN: usize;

    /// Write this value into exactly `SIZE` bytes
    fn store(&self, out: &mut [u8]);

    /// Read a value from exactly `SIZE` bytes
    fn load(bytes: &[u8]) -> Self;
}

macro_rules! pod_scratch_value {
    ($($t:ty),* $(,)?) => {
        $(
            impl ScratchValue for $t {
                const SIZE: usize = std::mem::size_of::<$t>();
                const ALIGN: usize = std::mem::align_of::<$t>();

                fn store(&self, out: &mut [u8]) {
                    out.copy_from_slice(bytemuck::bytes_of(self));
                }

                fn load(bytes: &[u8]) -> Self {
                    bytemuck::pod_read_unaligned(bytes)
                }
            }
        )*
    };
}

/// One-based index of a string in a `ScratchBuffer`'s string pool
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Pod, Zeroable, Serialize, Deserialize)]
pub struct StringHandle(pub u32);

impl StringHandle {
    /// Handle of a string slot that was never written
    pub const NONE: StringHandle = StringHandle(0);

    pub fn is_none(&self) -> bool {
        self.0 == 0
    }
}

pod_scratch_value!(i32, u32, f32, u8, Color, StringHandle);

impl ScratchValue for bool {
    const SIZE: usize = 1;
    const ALIGN: usize = 1;

    fn store(&self, out: &mut [u8]) {
        out[0] = u8::from(*self);
    }

    fn load(bytes: &[u8]) -> Self {
        bytes[0] != 0
    }
}

/// Typed handle to `len` consecutive values starting at `offset`
pub struct Slot<T> {
    offset: usize,
    len: usize,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Slot<T> {
    /// Rebuild a slot from a recorded offset and element count
    pub fn from_raw(offset: usize, len: usize) -> Self {
        Self {
            offset,
            len,
            _marker: PhantomData,
        }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl<T: ScratchValue> Slot<T> {
    /// First byte past this slot
    pub fn end(&self) -> usize {
        self.offset + self.len * T::SIZE
    }
}

impl<T> Clone for Slot<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Slot<T> {}

impl<T> PartialEq for Slot<T> {
    fn eq(&self, other: &Self) -> bool {
        self.offset == other.offset && self.len == other.len
    }
}

impl<T> fmt::Debug for Slot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slot")
            .field("type", &std::any::type_name::<T>())
            .field("offset", &self.offset)
            .field("len", &self.len)
            .finish()
    }
}

/// Bump allocator laying out slots inside a buffer of fixed capacity
#[derive(Debug, Clone)]
pub struct ScratchAllocator {
    cursor: usize,
    capacity: usize,
}

impl ScratchAllocator {
    /// Start allocating at offset 0 of a buffer with `capacity` bytes
    pub fn new(capacity: usize) -> Self {
        Self {
            cursor: 0,
            capacity,
        }
    }

    /// Bytes consumed so far, including alignment padding
    pub fn used(&self) -> usize {
        self.cursor
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Reserve `size` bytes aligned to `align`, returning the offset
    pub fn reserve(&mut self, align: usize, size: usize) -> Result<usize> {
        let offset = align_up(self.cursor, align);
        let end = offset.checked_add(size).ok_or(Error::ScratchOverflow {
            offset,
            size,
            capacity: self.capacity,
        })?;
        if end > self.capacity {
            return Err(Error::ScratchOverflow {
                offset,
                size,
                capacity: self.capacity,
            });
        }
        self.cursor = end;
        Ok(offset)
    }

    /// Reserve room for `count` values of `T`
    pub fn allocate<T: ScratchValue>(&mut self, count: usize) -> Result<Slot<T>> {
        let size = T::SIZE.checked_mul(count).ok_or(Error::ScratchOverflow {
            offset: self.cursor,
            size: usize::MAX,
            capacity: self.capacity,
        })?;
        let offset = self.reserve(T::ALIGN, size)?;
        Ok(Slot::from_raw(offset, count))
    }
}

/// Fixed-capacity byte storage plus the string pool its string slots index
#[derive(Debug, Clone, PartialEq)]
pub struct ScratchBuffer {
    bytes: Box<[u8]>,
    strings: Vec<String>,
}

impl ScratchBuffer {
    /// Create a zeroed buffer of `capacity` bytes
    pub fn new(capacity: usize) -> Self {
        Self {
            bytes: vec![0u8; capacity].into_boxed_slice(),
            strings: Vec::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.bytes.len()
    }

    /// Raw bytes, exactly `capacity` long
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The string pool in handle order
    pub fn strings(&self) -> &[String] {
        &self.strings
    }

    /// Zero all bytes and drop every pooled string
    pub fn clear(&mut self) {
        self.bytes.fill(0);
        self.strings.clear();
    }

    /// Replace the contents with previously saved bytes and strings
    ///
    /// `bytes` may be shorter than the capacity; the remainder is zeroed.
    pub fn load(&mut self, bytes: &[u8], strings: Vec<String>) -> Result<()> {
        if bytes.len() > self.bytes.len() {
            return Err(Error::OutOfBounds {
                offset: 0,
                size: bytes.len(),
                capacity: self.bytes.len(),
            });
        }
        self.bytes.fill(0);
        self.bytes[..bytes.len()].copy_from_slice(bytes);
        self.strings = strings;
        Ok(())
    }

    fn range<T: ScratchValue>(&self, slot: &Slot<T>, index: usize) -> Result<std::ops::Range<usize>> {
        if index >= slot.len {
            return Err(Error::SlotIndex {
                index,
                len: slot.len,
            });
        }
        let start = slot.offset + index * T::SIZE;
        let end = start + T::SIZE;
        if end > self.bytes.len() {
            return Err(Error::OutOfBounds {
                offset: start,
                size: T::SIZE,
                capacity: self.bytes.len(),
            });
        }
        Ok(start..end)
    }

    /// Read element `index` of `slot`
    pub fn read<T: ScratchValue>(&self, slot: &Slot<T>, index: usize) -> Result<T> {
        let range = self.range(slot, index)?;
        Ok(T::load(&self.bytes[range]))
    }

    /// Read every element of `slot`
    pub fn read_all<T: ScratchValue>(&self, slot: &Slot<T>) -> Result<Vec<T>> {
        (0..slot.len).map(|i| self.read(slot, i)).collect()
    }

    /// Write element `index` of `slot`
    pub fn write<T: ScratchValue>(&mut self, slot: &Slot<T>, index: usize, value: T) -> Result<()> {
        let range = self.range(slot, index)?;
        value.store(&mut self.bytes[range]);
        Ok(())
    }

    /// Append a string to the pool, returning its handle
    pub fn intern(&mut self, value: impl Into<String>) -> StringHandle {
        self.strings.push(value.into());
        StringHandle(self.strings.len() as u32)
    }

    /// Look up a pooled string; `StringHandle::NONE` reads as empty
    pub fn string(&self, handle: StringHandle) -> Result<&str> {
        if handle.is_none() {
            return Ok("");
        }
        self.strings
            .get(handle.0 as usize - 1)
            .map(String::as_str)
            .ok_or(Error::UnknownString(handle.0))
    }

    /// Store a string into element `index` of a string slot
    ///
    /// A slot that already references a pooled string overwrites it in place.
    pub fn write_string(&mut self, slot: &Slot<StringHandle>, index: usize, value: &str) -> Result<()> {
        let current = self.read(slot, index)?;
        if !current.is_none() {
            if let Some(entry) = self.strings.get_mut(current.0 as usize - 1) {
                entry.clear();
                entry.push_str(value);
                return Ok(());
            }
        }
        let handle = self.intern(value);
        self.write(slot, index, handle)
    }

    /// Read the string referenced by element `index` of a string slot
    pub fn read_string(&self, slot: &Slot<StringHandle>, index: usize) -> Result<String> {
        let handle = self.read(slot, index)?;
        self.string(handle).map(str::to_owned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_align_up() {
        assert_eq!(align_up(0, 4), 0);
        assert_eq!(align_up(1, 4), 4);
        assert_eq!(align_up(4, 4), 4);
        assert_eq!(align_up(5, 1), 5);
        assert_eq!(align_up(9, 8), 16);
    }

    #[test]
    fn test_allocations_aligned_and_non_decreasing() {
        let mut alloc = ScratchAllocator::new(256);
        let a = alloc.allocate::<bool>(3).unwrap();
        let b = alloc.allocate::<f32>(2).unwrap();
        let c = alloc.allocate::<u8>(1).unwrap();
        let d = alloc.allocate::<i32>(1).unwrap();
        let e = alloc.allocate::<StringHandle>(2).unwrap();

        assert_eq!(a.offset(), 0);
        assert_eq!(b.offset(), 4);
        assert_eq!(c.offset(), 12);
        assert_eq!(d.offset(), 16);
        assert_eq!(e.offset(), 20);
        assert!(b.offset() % 4 == 0 && d.offset() % 4 == 0 && e.offset() % 4 == 0);
        assert!(a.end() <= b.offset() && b.end() <= c.offset() && c.end() <= d.offset());
        assert_eq!(alloc.used(), 28);
    }

    #[test]
    fn test_allocation_overflow_fails_loudly() {
        let mut alloc = ScratchAllocator::new(10);
        alloc.allocate::<u8>(1).unwrap();
        let err = alloc.allocate::<f32>(2).unwrap_err();
        assert_eq!(
            err,
            Error::ScratchOverflow {
                offset: 4,
                size: 8,
                capacity: 10
            }
        );
        // A failed allocation does not move the cursor
        assert_eq!(alloc.used(), 1);
        assert!(alloc.allocate::<f32>(2).is_err());
        assert!(alloc.allocate::<u8>(9).is_ok());
    }

    #[test]
    fn test_allocation_exact_fit() {
        let mut alloc = ScratchAllocator::new(8);
        assert!(alloc.allocate::<f32>(2).is_ok());
        assert!(alloc.allocate::<u8>(1).is_err());
        assert!(alloc.allocate::<u8>(0).is_ok());
    }

    #[test]
    fn test_read_write_values() {
        let mut buffer = ScratchBuffer::new(32);
        let mut alloc = ScratchAllocator::new(buffer.capacity());
        let ints = alloc.allocate::<i32>(3).unwrap();
        let flag = alloc.allocate::<bool>(1).unwrap();
        let color = alloc.allocate::<Color>(1).unwrap();

        buffer.write(&ints, 0, 7).unwrap();
        buffer.write(&ints, 2, -3).unwrap();
        buffer.write(&flag, 0, true).unwrap();
        buffer.write(&color, 0, Color::rgba(1, 2, 3, 4)).unwrap();

        assert_eq!(buffer.read_all(&ints).unwrap(), vec![7, 0, -3]);
        assert!(buffer.read(&flag, 0).unwrap());
        assert_eq!(buffer.read(&color, 0).unwrap(), Color::rgba(1, 2, 3, 4));
    }

    #[test]
    fn test_slot_index_checked() {
        let mut buffer = ScratchBuffer::new(16);
        let slot = Slot::<f32>::from_raw(0, 2);
        assert_eq!(
            buffer.write(&slot, 2, 1.0),
            Err(Error::SlotIndex { index: 2, len: 2 })
        );
    }

    #[test]
    fn test_out_of_bounds_slot_rejected() {
        let buffer = ScratchBuffer::new(8);
        let slot = Slot::<f32>::from_raw(6, 1);
        assert!(matches!(buffer.read(&slot, 0), Err(Error::OutOfBounds { .. })));
    }

    #[test]
    fn test_string_pool() {
        let mut buffer = ScratchBuffer::new(16);
        let slot = Slot::<StringHandle>::from_raw(0, 2);
        buffer.write_string(&slot, 0, "first").unwrap();
        buffer.write_string(&slot, 1, "second").unwrap();
        assert_eq!(buffer.read_string(&slot, 0).unwrap(), "first");
        assert_eq!(buffer.read_string(&slot, 1).unwrap(), "second");

        buffer.write_string(&slot, 0, "edited").unwrap();
        assert_eq!(buffer.read_string(&slot, 0).unwrap(), "edited");
        assert_eq!(buffer.read_string(&slot, 1).unwrap(), "second");
        assert!(matches!(buffer.string(StringHandle(99)), Err(Error::UnknownString(99))));
    }

    #[test]
    fn test_unwritten_string_slot_is_empty() {
        let mut buffer = ScratchBuffer::new(16);
        let slot = Slot::<StringHandle>::from_raw(4, 1);
        assert_eq!(buffer.read_string(&slot, 0).unwrap(), "");

        buffer.write_string(&Slot::from_raw(0, 1), 0, "other").unwrap();
        buffer.write_string(&slot, 0, "mine").unwrap();
        assert_eq!(buffer.read_string(&Slot::from_raw(0, 1), 0).unwrap(), "other");
        assert_eq!(buffer.read_string(&slot, 0).unwrap(), "mine");
    }

    #[test]
    fn test_rewrites_reuse_pool_entry() {
        let mut buffer = ScratchBuffer::new(16);
        let slot = Slot::<StringHandle>::from_raw(0, 2);
        buffer.write_string(&slot, 0, "a").unwrap();
        buffer.write_string(&slot, 1, "b").unwrap();
        for i in 0..1000 {
            buffer.write_string(&slot, 0, &format!("edit {}", i)).unwrap();
        }
        assert_eq!(buffer.strings().len(), 2);
        assert_eq!(buffer.read_string(&slot, 0).unwrap(), "edit 999");
        assert_eq!(buffer.read_string(&slot, 1).unwrap(), "b");
    }

    #[test]
    fn test_load_preserves_bytes() {
        let mut buffer = ScratchBuffer::new(8);
        buffer.write(&Slot::<i32>::from_raw(0, 1), 0, 42).unwrap();
        let saved = buffer.as_bytes().to_vec();

        let mut restored = ScratchBuffer::new(8);
        restored.load(&saved, vec!["x".into()]).unwrap();
        assert_eq!(restored.as_bytes(), &saved[..]);
        assert_eq!(restored.strings(), &["x".to_string()]);

        let mut small = ScratchBuffer::new(4);
        assert!(small.load(&saved, Vec::new()).is_err());
    }
}
