// A list read round and round. Each `tick` returns the current item and
// moves on, wrapping to the front after the last one.
#[derive(Clone, Debug)]
pub struct Ring<T> {
    items: Vec<T>,
    cursor: usize,
}

impl<T> Ring<T> {
    // callers guarantee a non-empty list; `tick` on an empty ring would panic
    pub fn new(items: Vec<T>) -> Self {
        debug_assert!(!items.is_empty(), "ring needs at least one item");
        Self { items, cursor: 0 }
    }

    pub fn tick(&mut self) -> &T {
        let i = self.cursor;
        self.cursor = (self.cursor + 1) % self.items.len();
        &self.items[i]
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}
