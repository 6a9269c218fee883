//! Fair round-robin merge
//!
//! Merges N ordered sequences into one bounded sequence. Index 0 of every
//! sequence is emitted (in declared order) before index 1 of any sequence,
//! and so on. Sequences of unequal length simply drop out once exhausted.
//!
//! ```rust
//! use edu_federate::interleave::interleave;
//!
//! let merged = interleave(&[vec!["A1", "A2", "A3"], vec!["B1"]], 4);
//! assert_eq!(merged.items, vec!["A1", "B1", "A2", "A3"]);
//! assert_eq!(merged.consumed, vec![3, 1]);
//! ```

/// Output of [`interleave`]
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Interleaved<T> {
    /// Merged items, at most `limit` of them
    pub items: Vec<T>,
    /// How many items were drawn from each input sequence, in input order
    pub consumed: Vec<usize>,
}

impl<T> Interleaved<T> {
    /// Number of merged items
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether nothing was merged
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Round-robin merge of `sequences`, emitting at most `limit` items
///
/// Pure: the inputs are only read. The same inputs always produce the same
/// items and the same `consumed` vector.
pub fn interleave<T, S>(sequences: &[S], limit: usize) -> Interleaved<T>
where
    T: Clone,
    S: AsRef<[T]>,
{
    let mut consumed = vec![0; sequences.len()];
    let longest = sequences.iter().map(|s| s.as_ref().len()).max().unwrap_or(0);
    let total: usize = sequences.iter().map(|s| s.as_ref().len()).sum();
    let mut items = Vec::with_capacity(limit.min(total));

    'rounds: for index in 0..longest {
        for (slot, sequence) in sequences.iter().enumerate() {
            if items.len() >= limit {
                break 'rounds;
            }
            if let Some(item) = sequence.as_ref().get(index) {
                items.push(item.clone());
                consumed[slot] += 1;
            }
        }
    }

    Interleaved { items, consumed }
}

/// [`interleave`] with a signed limit; negative limits merge nothing
pub fn interleave_signed<T, S>(sequences: &[S], limit: i64) -> Interleaved<T>
where
    T: Clone,
    S: AsRef<[T]>,
{
    let limit = usize::try_from(limit.max(0)).unwrap_or(usize::MAX);
    interleave(sequences, limit)
}
