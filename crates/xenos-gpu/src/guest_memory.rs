//! Guest physical memory as seen by the transient upload path.
//!
//! The emulator's memory subsystem owns guest RAM; uploads only need a read-only host view of a
//! physical range so the bytes can be converted straight into the arena.

use core::fmt;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GuestMemoryError {
    pub gpa: u32,
    pub len: u32,
}

impl fmt::Display for GuestMemoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "guest memory access out of bounds: gpa=0x{:x}, len=0x{:x}",
            self.gpa, self.len
        )
    }
}

impl std::error::Error for GuestMemoryError {}

/// Guest-physical to host translation.
pub trait GuestMemory {
    /// Host view of `[gpa, gpa + len)`.
    fn translate_physical(&self, gpa: u32, len: u32) -> Result<&[u8], GuestMemoryError>;
}

/// Simple contiguous in-memory guest RAM implementation for tests.
#[derive(Clone, Debug)]
pub struct VecGuestMemory {
    mem: Vec<u8>,
}

impl VecGuestMemory {
    pub fn new(size_bytes: usize) -> Self {
        Self {
            mem: vec![0u8; size_bytes],
        }
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.mem
    }

    pub fn write(&mut self, gpa: u32, data: &[u8]) -> Result<(), GuestMemoryError> {
        let err = GuestMemoryError {
            gpa,
            len: u32::try_from(data.len()).unwrap_or(u32::MAX),
        };
        let start = gpa as usize;
        let end = start.checked_add(data.len()).ok_or(err.clone())?;
        let slice = self.mem.get_mut(start..end).ok_or(err)?;
        slice.copy_from_slice(data);
        Ok(())
    }
}

impl GuestMemory for VecGuestMemory {
    fn translate_physical(&self, gpa: u32, len: u32) -> Result<&[u8], GuestMemoryError> {
        let start = gpa as usize;
        let end = start
            .checked_add(len as usize)
            .ok_or(GuestMemoryError { gpa, len })?;
        self.mem.get(start..end).ok_or(GuestMemoryError { gpa, len })
    }
}
