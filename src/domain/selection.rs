/// Wraparound cursor over a fixed-size list with a scrolling window.
///
/// One implementation serves the main menu, inventory, settings lists,
/// battle menus and the on-screen keyboard.
///
/// Invariants (when `count > 0`):
///   - `0 <= current < count`
///   - `scroll <= current < scroll + visible`
///   - `0 <= scroll <= max(0, count - visible)`

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectionIndex {
    current: usize,
    count: usize,
    scroll: usize,
    visible: usize,
}

impl SelectionIndex {
    pub fn new(count: usize, visible: usize) -> Self {
        SelectionIndex {
            current: 0,
            count,
            scroll: 0,
            visible: visible.max(1),
        }
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn scroll(&self) -> usize {
        self.scroll
    }

    pub fn visible(&self) -> usize {
        self.visible
    }

    /// Indices of the rows currently in the window.
    pub fn window(&self) -> std::ops::Range<usize> {
        self.scroll..(self.scroll + self.visible).min(self.count)
    }

    /// Move by `delta` with mathematical modulo. No-op on an empty list.
    pub fn move_by(&mut self, delta: isize) {
        if self.count == 0 {
            return;
        }
        let n = self.count as isize;
        self.current = (self.current as isize + delta).rem_euclid(n) as usize;
        self.follow();
    }

    /// Item under the cursor.
    pub fn select<'a, T>(&self, items: &'a [T]) -> Option<&'a T> {
        items.get(self.current)
    }

    /// Back to the first row.
    pub fn reset(&mut self) {
        self.current = 0;
        self.scroll = 0;
    }

    /// Resize the underlying list, pulling the cursor back onto the
    /// last row if it fell off the end.
    pub fn set_count(&mut self, count: usize) {
        self.count = count;
        if count == 0 {
            self.current = 0;
        } else if self.current >= count {
            self.current = count - 1;
        }
        self.follow();
    }

    // ── Internal ──

    /// Keep `current` inside the window, window inside the list.
    fn follow(&mut self) {
        if self.current < self.scroll {
            self.scroll = self.current;
        } else if self.current >= self.scroll + self.visible {
            self.scroll = self.current + 1 - self.visible;
        }
        let max_scroll = self.count.saturating_sub(self.visible);
        self.scroll = self.scroll.min(max_scroll);
    }
}
