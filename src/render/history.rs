/// Fixed-capacity ring of recent marker positions, one entry per frame
///
/// `None` marks an unvoiced frame. Appending to a full ring overwrites the
/// oldest entry; iteration runs oldest to newest.
#[derive(Debug, Clone)]
pub struct PitchHistory {
    slots: Box<[Option<f64>]>,
    /// Next slot to write
    write: usize,
    len: usize,
}

impl PitchHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity.max(1)].into_boxed_slice(),
            write: 0,
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn append(&mut self, entry: Option<f64>) {
        let capacity = self.slots.len();
        self.slots[self.write] = entry;
        self.write = (self.write + 1) % capacity;
        self.len = (self.len + 1).min(capacity);
    }

    /// Oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = Option<f64>> + '_ {
        let capacity = self.slots.len();
        let oldest = (self.write + capacity - self.len) % capacity;
        (0..self.len).map(move |i| self.slots[(oldest + i) % capacity])
    }

    /// Adjacent pairs where both frames were voiced, as
    /// `(age_of_older, older_y, newer_y)`; age 0 is the newest frame.
    /// An unvoiced frame breaks the line on both sides
    pub fn segments(&self) -> impl Iterator<Item = (usize, f64, f64)> + '_ {
        let newest = self.len.saturating_sub(1);
        self.iter()
            .zip(self.iter().skip(1))
            .enumerate()
            .filter_map(move |(i, pair)| match pair {
                (Some(older), Some(newer)) => Some((newest - i, older, newer)),
                _ => None,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_len_never_exceeds_capacity() {
        let mut history = PitchHistory::new(150);
        for i in 0..1000 {
            history.append(Some(i as f64));
            assert!(history.len() <= 150);
        }
        assert_eq!(history.len(), 150);
    }

    #[test]
    fn test_keeps_most_recent_in_order() {
        let mut history = PitchHistory::new(150);
        for i in 0..400 {
            let entry = if i % 7 == 0 { None } else { Some(i as f64) };
            history.append(entry);
        }

        let expected: Vec<Option<f64>> = (250..400)
            .map(|i| if i % 7 == 0 { None } else { Some(i as f64) })
            .collect();
        assert_eq!(history.iter().collect::<Vec<_>>(), expected);
    }

    #[test]
    fn test_partial_fill() {
        let mut history = PitchHistory::new(4);
        assert!(history.is_empty());
        history.append(Some(1.0));
        history.append(None);
        assert_eq!(history.iter().collect::<Vec<_>>(), vec![Some(1.0), None]);
    }

    #[test]
    fn test_segments_break_on_gaps() {
        let mut history = PitchHistory::new(8);
        for entry in [Some(10.0), Some(11.0), None, Some(12.0), Some(13.0), Some(14.0)] {
            history.append(entry);
        }

        let segments: Vec<(usize, f64, f64)> = history.segments().collect();
        // newest index is 5; pairs (0,1), (3,4), (4,5)
        assert_eq!(segments, vec![(5, 10.0, 11.0), (2, 12.0, 13.0), (1, 13.0, 14.0)]);
    }

    #[test]
    fn test_single_entry_has_no_segments() {
        let mut history = PitchHistory::new(3);
        history.append(Some(5.0));
        assert_eq!(history.segments().count(), 0);
    }
}
