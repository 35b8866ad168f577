use std::{num::NonZero, ops::Index};

use crate::{Error, Result};

/// Fixed-capacity history of the most recent values.
///
/// Indexed by recency: `window[0]` is the newest value, `window[len - 1]`
/// the oldest. Once `capacity` values have been pushed, each push evicts
/// the oldest one. Memory is allocated up front and never grows.
///
/// # Readiness
///
/// [`is_ready`](Self::is_ready) turns `true` on the `capacity`-th push and
/// stays `true` until [`reset`](Self::reset).
///
/// # Element bound
///
/// Construction, indexing and iteration work for any `T`.
/// [`push`](Self::push) needs `T: Clone`, because it both returns the
/// evicted value and keeps a copy for
/// [`most_recently_removed`](Self::most_recently_removed).
///
/// # Example
///
/// ```
/// use barflow::RollingWindow;
/// use std::num::NonZero;
///
/// let mut w = RollingWindow::new(NonZero::new(3).unwrap());
/// w.push(1);
/// w.push(2);
/// assert!(!w.is_ready());
/// w.push(3);
/// assert_eq!(w.push(4), Some(1));
///
/// assert_eq!(w[0], 4);
/// assert_eq!(w.iter().copied().collect::<Vec<_>>(), [4, 3, 2]);
/// assert_eq!(w.iter_oldest_first().copied().collect::<Vec<_>>(), [2, 3, 4]);
/// ```
#[derive(Clone, Debug)]
pub struct RollingWindow<T> {
    buffer: Vec<T>,
    /// Slot of the oldest value once the buffer is full; 0 while filling.
    head: usize,
    capacity: usize,
    samples: usize,
    removed: Option<T>,
}

impl<T> RollingWindow<T> {
    /// Creates an empty window holding at most `capacity` values.
    #[must_use]
    pub fn new(capacity: NonZero<usize>) -> Self {
        let capacity = capacity.get();

        Self {
            buffer: Vec::with_capacity(capacity),
            head: 0,
            capacity,
            samples: 0,
            removed: None,
        }
    }

    /// Fallible counterpart of [`new`](Self::new) for capacities coming from
    /// untyped configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCapacity`] if `capacity` is zero.
    pub fn try_new(capacity: usize) -> Result<Self> {
        NonZero::new(capacity)
            .map(Self::new)
            .ok_or(Error::InvalidCapacity { capacity })
    }

    /// Maximum number of values held.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of values currently held.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Whether the window has been filled to capacity.
    #[inline]
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.buffer.len() == self.capacity
    }

    /// Total number of pushes since construction or the last reset.
    #[inline]
    #[must_use]
    pub fn samples(&self) -> usize {
        self.samples
    }

    /// Value at recency offset `i` (0 = newest), or `None` if out of range.
    #[inline]
    #[must_use]
    pub fn get(&self, i: usize) -> Option<&T> {
        let len = self.buffer.len();
        (i < len).then(|| &self.buffer[(self.head + len - 1 - i) % self.capacity])
    }

    /// The most recently pushed value.
    #[inline]
    #[must_use]
    pub fn newest(&self) -> Option<&T> {
        self.get(0)
    }

    /// The oldest value still held.
    #[inline]
    #[must_use]
    pub fn oldest(&self) -> Option<&T> {
        self.buffer.get(self.head)
    }

    /// The value evicted by the latest push that overflowed the window.
    #[inline]
    #[must_use]
    pub fn most_recently_removed(&self) -> Option<&T> {
        self.removed.as_ref()
    }

    /// Iterates from newest to oldest.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator {
        (0..self.buffer.len()).map(move |i| &self[i])
    }

    /// Iterates from oldest to newest.
    pub fn iter_oldest_first(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator {
        self.iter().rev()
    }

    /// Empties the window; readiness returns to `false`.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.head = 0;
        self.samples = 0;
        self.removed = None;
    }
}

impl<T: Clone> RollingWindow<T> {
    /// Appends `value` as the newest element. Returns the evicted oldest
    /// value once the window is at capacity.
    #[inline]
    pub fn push(&mut self, value: T) -> Option<T> {
        self.samples += 1;

        if self.is_ready() {
            let old = std::mem::replace(&mut self.buffer[self.head], value);

            self.head += 1;
            if self.head == self.capacity {
                self.head = 0;
            }

            self.removed = Some(old.clone());
            Some(old)
        } else {
            self.buffer.push(value);

            None
        }
    }
}

impl<T> Index<usize> for RollingWindow<T> {
    type Output = T;

    fn index(&self, i: usize) -> &T {
        self.get(i).unwrap_or_else(|| {
            panic!(
                "index {i} out of range for window of length {}",
                self.buffer.len()
            )
        })
    }
}
