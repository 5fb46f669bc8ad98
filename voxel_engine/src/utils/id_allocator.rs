/// Hands out unique, monotonically increasing `u32` identifiers.
///
/// Unlike a slot allocator, released identifiers are never reused, so an id
/// stays unique for the lifetime of the allocator. Owned by whoever creates
/// the objects (see `Scene`) and passed in explicitly.
///
/// # Example
///
/// ```ignore
/// let mut ids = IdAllocator::new();
/// let a = ids.alloc();  // 0
/// let b = ids.alloc();  // 1
/// ```
#[derive(Debug, Default)]
pub struct IdAllocator {
    next_id: u32,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self { next_id: 0 }
    }

    /// Start counting at `first` (e.g. after loading saved objects)
    pub fn starting_at(first: u32) -> Self {
        Self { next_id: first }
    }

    /// Allocate the next identifier
    pub fn alloc(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id = self
            .next_id
            .checked_add(1)
            .unwrap_or_else(|| panic!("IdAllocator exhausted after {} ids", id));
        id
    }

    /// The identifier the next `alloc` will return
    pub fn peek(&self) -> u32 {
        self.next_id
    }
}

#[cfg(test)]
#[path = "id_allocator_tests.rs"]
mod tests;
