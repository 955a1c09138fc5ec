/*
 * RAII ownership of the host memory block a template is serialised into.
 * An `Arena` frees its block exactly once, when released or dropped. Write
 * access goes through an `ArenaLock` guard that borrows the arena mutably, so a
 * block cannot be locked twice and its bytes cannot be touched after unlock.
 */

use crate::error::{DialogError, Result};
use crate::host::HostMemory;

use std::ops::{Deref, DerefMut};

pub struct Arena<'h, H: HostMemory + ?Sized> {
    host: &'h H,
    memory: H::Memory,
    capacity: usize,
}

impl<'h, H: HostMemory + ?Sized> Arena<'h, H> {
    pub fn acquire(host: &'h H, capacity: usize) -> Result<Self> {
        match host.allocate_movable_zeroed(capacity) {
            Ok(memory) => {
                log::debug!("Arena: acquired {capacity} bytes as {memory:?}");
                Ok(Self {
                    host,
                    memory,
                    capacity,
                })
            }
            Err(code) => {
                log::error!("Arena: allocation of {capacity} bytes failed (error {code:#x})");
                Err(DialogError::AllocationFailure {
                    size: capacity,
                    code,
                })
            }
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Host handle of the block, valid for as long as the arena lives.
    pub fn memory(&self) -> H::Memory {
        self.memory
    }

    pub fn lock(&mut self) -> Result<ArenaLock<'_, 'h, H>> {
        let ptr = self.host.lock(self.memory).map_err(|code| {
            log::error!("Arena: lock of {:?} failed (error {code:#x})", self.memory);
            DialogError::LockFailure { code }
        })?;
        // SAFETY: `HostMemory` guarantees the locked pointer addresses at least
        // `capacity` writable bytes until `unlock`. The guard holds the only
        // borrow of this arena and unlocks on drop, so the slice cannot outlive
        // the lock.
        let bytes = unsafe { std::slice::from_raw_parts_mut(ptr.as_ptr(), self.capacity) };
        Ok(ArenaLock { arena: self, bytes })
    }

    /// Frees the block. Equivalent to dropping the arena.
    pub fn release(self) {
        drop(self);
    }
}

impl<H: HostMemory + ?Sized> Drop for Arena<'_, H> {
    fn drop(&mut self) {
        match self.host.free(self.memory) {
            Ok(()) => log::debug!("Arena: released {:?}", self.memory),
            Err(code) => log::error!("Arena: freeing {:?} failed (error {code:#x})", self.memory),
        }
    }
}

/// Write access to a locked arena. Unlocks when dropped.
pub struct ArenaLock<'a, 'h, H: HostMemory + ?Sized> {
    arena: &'a mut Arena<'h, H>,
    bytes: &'a mut [u8],
}

impl<H: HostMemory + ?Sized> ArenaLock<'_, '_, H> {
    pub fn unlock(self) {
        drop(self);
    }
}

impl<H: HostMemory + ?Sized> Deref for ArenaLock<'_, '_, H> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.bytes
    }
}

impl<H: HostMemory + ?Sized> DerefMut for ArenaLock<'_, '_, H> {
    fn deref_mut(&mut self) -> &mut [u8] {
        self.bytes
    }
}

impl<H: HostMemory + ?Sized> Drop for ArenaLock<'_, '_, H> {
    fn drop(&mut self) {
        self.arena.host.unlock(self.arena.memory);
    }
}
