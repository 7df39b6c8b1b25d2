//! Slot resources: the three off-screen pixel buffers.
//!
//! Created together with identical initial content so whichever slot is
//! presented first already holds a coherent frame, and released together
//! at teardown. A double release is a fatal-tier error; it would mean
//! the session controller's ordering guarantees were violated.

use vbitx_core::{Canvas, DisplayError, Rect};
use vbitx_types::{Slot, FRAME_HEIGHT, ROW_PITCH, SLOT_COUNT};

const RESOURCE_SIZE: usize = ROW_PITCH * FRAME_HEIGHT;

#[derive(Debug)]
pub struct SlotResources {
    buffers: [Vec<u8>; SLOT_COUNT],
    released: [bool; SLOT_COUNT],
}

impl SlotResources {
    /// Create all three resources, each an identical full-frame copy of
    /// the startup canvas.
    pub fn create(canvas: &Canvas) -> Self {
        let mut buffers = [
            vec![0u8; RESOURCE_SIZE],
            vec![0u8; RESOURCE_SIZE],
            vec![0u8; RESOURCE_SIZE],
        ];
        for buffer in &mut buffers {
            canvas.copy_rect_into(Rect::FULL_FRAME, buffer);
        }
        Self {
            buffers,
            released: [false; SLOT_COUNT],
        }
    }

    /// Refresh `rect` of one slot's buffer from the canvas.
    pub fn write(&mut self, slot: Slot, canvas: &Canvas, rect: Rect) -> Result<(), DisplayError> {
        if self.released[slot.index()] {
            return Err(DisplayError::ResourceReleased { slot });
        }
        canvas.copy_rect_into(rect, &mut self.buffers[slot.index()]);
        Ok(())
    }

    /// Pixel bytes of one slot's buffer
    pub fn bytes(&self, slot: Slot) -> &[u8] {
        &self.buffers[slot.index()]
    }

    /// Release all three resources as a set. Returns how many were
    /// released; erroring if any was already gone.
    pub fn release_all(&mut self) -> Result<usize, DisplayError> {
        let mut count = 0;
        for index in 0..SLOT_COUNT {
            if self.released[index] {
                // Slot indices 0..SLOT_COUNT always map to a slot.
                let slot = Slot::from_index(index).unwrap_or(Slot::Fallback);
                return Err(DisplayError::ResourceReleased { slot });
            }
            self.released[index] = true;
            self.buffers[index].clear();
            count += 1;
        }
        Ok(count)
    }

    /// Whether every resource has been released
    pub fn all_released(&self) -> bool {
        self.released.iter().all(|&r| r)
    }
}
