//! Fixed-capacity slot storage behind the bounded buffer.
//!
//! A [`Ring`] knows nothing about cursors or concurrency. Callers pick the
//! slot index and must hold whatever lock guards the ring.

/// Value carried through the buffer.
pub type Item = u64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ring {
    slots: Box<[Item]>,
}

impl Ring {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![0; capacity].into_boxed_slice(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn write(&mut self, index: usize, value: Item) {
        self.slots[index] = value;
    }

    pub fn read(&self, index: usize) -> Item {
        self.slots[index]
    }

    pub fn clear(&mut self, index: usize) {
        self.slots[index] = 0;
    }

    /// Slot following `index`, wrapping at the capacity.
    pub fn next(&self, index: usize) -> usize {
        (index + 1) % self.slots.len()
    }
}

#[cfg(test)]
mod test {
    use super::Ring;

    #[test]
    fn starts_zeroed() {
        let ring = Ring::new(3);
        assert_eq!(ring.capacity(), 3);
        assert!((0..3).all(|i| ring.read(i) == 0));
    }

    #[test]
    fn write_read_clear() {
        let mut ring = Ring::new(2);
        ring.write(1, 42);
        assert_eq!(ring.read(1), 42);
        assert_eq!(ring.read(0), 0);
        ring.clear(1);
        assert_eq!(ring.read(1), 0);
    }

    #[test]
    fn next_wraps() {
        let ring = Ring::new(3);
        assert_eq!(ring.next(0), 1);
        assert_eq!(ring.next(2), 0);

        let single = Ring::new(1);
        assert_eq!(single.next(0), 0);
    }
}
