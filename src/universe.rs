/// Number of addressable slots in a DMX universe
pub const SLOT_COUNT: usize = 512;

/// DMX universe as the lighting node holds it.
///
/// Byte 0 is the start code and always 0; bytes 1..=512 are the slots.
#[derive(Debug, Clone)]
pub struct DmxUniverse {
    buffer: [u8; SLOT_COUNT + 1],
}

impl Default for DmxUniverse {
    fn default() -> Self {
        DmxUniverse {
            buffer: [0; SLOT_COUNT + 1],
        }
    }
}

impl DmxUniverse {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a slot. Returns false and leaves the buffer alone for slots outside 1..=512.
    pub fn write(&mut self, slot: usize, value: u8) -> bool {
        if !(1..=SLOT_COUNT).contains(&slot) {
            log::warn!("Write request to invalid DMX channel {}", slot);
            return false;
        }
        self.buffer[slot] = value;
        true
    }

    /// Copy `values` into consecutive slots from `start`. Values past slot 512 are dropped.
    pub fn write_multiple(&mut self, start: usize, values: &[u8]) -> usize {
        if !(1..=SLOT_COUNT).contains(&start) {
            log::warn!("Write request to invalid DMX channel {}", start);
            return 0;
        }
        let count = values.len().min(SLOT_COUNT + 1 - start);
        if count < values.len() {
            log::warn!(
                "Dropping {} value(s) past DMX channel {}",
                values.len() - count,
                SLOT_COUNT
            );
        }
        self.buffer[start..start + count].copy_from_slice(&values[..count]);
        count
    }

    pub fn get(&self, slot: usize) -> Option<u8> {
        if (1..=SLOT_COUNT).contains(&slot) {
            Some(self.buffer[slot])
        } else {
            None
        }
    }

    /// Full frame including the start code
    pub fn frame(&self) -> &[u8] {
        &self.buffer
    }

    /// Slots holding a non-zero value, as `(slot, value)`
    pub fn active_slots(&self) -> impl Iterator<Item = (usize, u8)> + '_ {
        self.frame()
            .iter()
            .enumerate()
            .skip(1)
            .filter(|&(_, &value)| value != 0)
            .map(|(slot, &value)| (slot, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_valid_slot() {
        let mut universe = DmxUniverse::new();
        assert!(universe.write(101, 200));
        assert_eq!(universe.get(101), Some(200));
        assert_eq!(universe.frame()[101], 200);
    }

    #[test]
    fn test_rejects_out_of_range_slots() {
        let mut universe = DmxUniverse::new();
        assert!(!universe.write(0, 0xFF));
        assert!(!universe.write(513, 0xFF));
        assert_eq!(universe.frame()[0], 0);
        assert!(universe.frame().iter().all(|&b| b == 0));
        assert_eq!(universe.get(0), None);
    }

    #[test]
    fn test_frame_length() {
        assert_eq!(DmxUniverse::new().frame().len(), 513);
    }

    #[test]
    fn test_write_multiple_truncates_at_last_slot() {
        let mut universe = DmxUniverse::new();
        assert_eq!(universe.write_multiple(511, &[1, 2, 3, 4]), 2);
        assert_eq!(universe.get(511), Some(1));
        assert_eq!(universe.get(512), Some(2));

        assert_eq!(universe.write_multiple(0, &[9]), 0);
        assert_eq!(universe.write_multiple(513, &[9]), 0);
        assert_eq!(universe.frame()[0], 0);
    }

    #[test]
    fn test_active_slots() {
        let mut universe = DmxUniverse::new();
        universe.write(3, 10);
        universe.write(101, 255);
        assert_eq!(universe.active_slots().collect::<Vec<_>>(), vec![(3, 10), (101, 255)]);
    }
}
