//! Mutable table of code address ranges with lazy sorting.
//!
//! Ranges are appended in event order and only sorted when a lookup needs
//! them. Every mutation marks the table dirty; `lookup` re-sorts before
//! searching. Removed ranges stay in the table with zeroed bounds, so the
//! table never shrinks outside of `reset`.

use log::debug;

/// Address interval `[start, stop)` occupied by one compiled function
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressRange {
    pub symbol: String,
    pub start: u64,
    /// Exclusive upper bound
    pub stop: u64,
    /// Source file id, 0 when unknown
    pub source_id: u64,
    pub source_line: Option<u64>,
}

impl AddressRange {
    pub fn new(symbol: impl Into<String>, start: u64, stop: u64) -> Self {
        Self {
            symbol: symbol.into(),
            start,
            stop,
            source_id: 0,
            source_line: None,
        }
    }

    pub fn with_source(mut self, source_id: u64, source_line: Option<u64>) -> Self {
        self.source_id = source_id;
        self.source_line = source_line;
        self
    }

    pub fn contains(&self, address: u64) -> bool {
        self.start <= address && address < self.stop
    }

    pub fn len(&self) -> u64 {
        self.stop.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Zeroed by a remove event
    pub fn is_removed(&self) -> bool {
        self.start == 0 && self.stop == 0
    }

    fn same_as(&self, other: &AddressRange) -> bool {
        self.start == other.start && self.stop == other.stop && self.symbol == other.symbol
    }
}

/// Per-process collection of code ranges
///
/// **Public** - owned by [`crate::resolver::Context`]
#[derive(Debug, Default)]
pub struct AddressRangeTable {
    ranges: Vec<AddressRange>,
    /// Set by every mutation, cleared by the sort in `lookup`
    dirty: bool,
    /// Snapshot of the last appended range, for duplicate suppression
    last_added: Option<AddressRange>,
}

impl AddressRangeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a range unless it repeats the previous add exactly
    ///
    /// Returns false when the range was suppressed as a duplicate.
    pub fn add_range(&mut self, range: AddressRange) -> bool {
        if self
            .last_added
            .as_ref()
            .is_some_and(|last| last.same_as(&range))
        {
            return false;
        }

        self.last_added = Some(range.clone());
        self.ranges.push(range);
        self.dirty = true;
        true
    }

    /// Relocate the range starting at `old_start` so it starts at `new_start`
    ///
    /// The range keeps its length. Returns false if no range starts at
    /// `old_start`.
    pub fn move_range(&mut self, old_start: u64, new_start: u64) -> bool {
        let Some(index) = self.range_starting_at(old_start) else {
            debug!("Move of unknown range at {:#x} ignored", old_start);
            return false;
        };

        let range = &mut self.ranges[index];
        let len = range.len();
        range.start = new_start;
        range.stop = new_start.saturating_add(len);
        self.dirty = true;
        true
    }

    /// Disable the range starting at `old_start` by zeroing its bounds
    ///
    /// Returns false if no range starts at `old_start`.
    pub fn remove(&mut self, old_start: u64) -> bool {
        let Some(index) = self.range_starting_at(old_start) else {
            return false;
        };

        let range = &mut self.ranges[index];
        range.start = 0;
        range.stop = 0;
        self.dirty = true;
        true
    }

    /// Drop every range
    pub fn reset(&mut self) {
        self.ranges.clear();
        self.last_added = None;
        self.dirty = false;
    }

    /// Find the range whose `[start, stop)` contains `address`
    pub fn lookup(&mut self, address: u64) -> Option<&AddressRange> {
        self.position(address).map(|index| &self.ranges[index])
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// True when a mutation happened since the last sort
    pub fn needs_sort(&self) -> bool {
        self.dirty
    }

    /// Ranges in their current order (sorted only if `needs_sort` is false)
    pub fn ranges(&self) -> &[AddressRange] {
        &self.ranges
    }

    fn range_starting_at(&mut self, start: u64) -> Option<usize> {
        self.position(start)
            .filter(|&index| self.ranges[index].start == start)
    }

    fn sort_if_needed(&mut self) {
        if self.dirty {
            self.ranges.sort_by_key(|range| range.start);
            self.dirty = false;
        }
    }

    /// Binary search over half-open intervals sorted by start
    fn position(&mut self, address: u64) -> Option<usize> {
        if self.ranges.is_empty() {
            return None;
        }

        self.sort_if_needed();

        let mut low = 0;
        let mut high = self.ranges.len() - 1;

        // Most samples land in the newest or oldest code
        if self.ranges[high].contains(address) {
            return Some(high);
        }
        if self.ranges[low].contains(address) {
            return Some(low);
        }

        while high - low > 1 {
            let med = low + (high - low) / 2;
            let range = &self.ranges[med];

            if range.stop <= address {
                low = med;
            } else if range.start > address {
                high = med;
            } else {
                return Some(med);
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_with(ranges: &[(u64, u64, &str)]) -> AddressRangeTable {
        let mut table = AddressRangeTable::new();
        for &(start, stop, symbol) in ranges {
            table.add_range(AddressRange::new(symbol, start, stop));
        }
        table
    }

    #[test]
    fn test_lookup_empty() {
        let mut table = AddressRangeTable::new();
        assert!(table.lookup(0x1000).is_none());
        assert!(!table.needs_sort());
    }

    #[test]
    fn test_lookup_half_open() {
        let mut table = table_with(&[(0x100, 0x200, "a")]);
        assert_eq!(table.lookup(0x100).unwrap().symbol, "a");
        assert_eq!(table.lookup(0x1ff).unwrap().symbol, "a");
        assert!(table.lookup(0x200).is_none());
        assert!(table.lookup(0xff).is_none());
    }

    #[test]
    fn test_lookup_stop_boundary_in_middle() {
        let mut table = table_with(&[
            (0x100, 0x200, "a"),
            (0x300, 0x400, "b"),
            (0x500, 0x600, "c"),
            (0x700, 0x800, "d"),
        ]);
        // Gap addresses equal to a stop must not match the lower range
        assert!(table.lookup(0x400).is_none());
        assert!(table.lookup(0x600).is_none());
        assert_eq!(table.lookup(0x450).map(|r| r.symbol.as_str()), None);
        assert_eq!(table.lookup(0x5ff).unwrap().symbol, "c");
    }

    #[test]
    fn test_lookup_independent_of_insertion_order() {
        let ranges = [
            (0x1000, 0x1010, "a"),
            (0x1010, 0x1040, "b"),
            (0x2000, 0x2100, "c"),
            (0x2100, 0x2101, "d"),
            (0x3000, 0x3800, "e"),
            (0x9000, 0x9100, "f"),
        ];
        let probes = [
            0x0fff, 0x1000, 0x100f, 0x1010, 0x103f, 0x1040, 0x20ff, 0x2100, 0x2101, 0x3400,
            0x8fff, 0x90ff, 0x9100,
        ];

        let mut forward = table_with(&ranges);
        let mut reversed_ranges = ranges;
        reversed_ranges.reverse();
        let mut reversed = table_with(&reversed_ranges);
        let mut shuffled = table_with(&[
            ranges[3], ranges[0], ranges[5], ranges[2], ranges[4], ranges[1],
        ]);

        for probe in probes {
            let expected = ranges
                .iter()
                .find(|(start, stop, _)| *start <= probe && probe < *stop)
                .map(|(_, _, symbol)| symbol.to_string());

            let got = |table: &mut AddressRangeTable| table.lookup(probe).map(|r| r.symbol.clone());
            assert_eq!(got(&mut forward), expected, "probe {:#x}", probe);
            assert_eq!(got(&mut reversed), expected, "probe {:#x}", probe);
            assert_eq!(got(&mut shuffled), expected, "probe {:#x}", probe);
        }
    }

    #[test]
    fn test_consecutive_duplicate_suppressed() {
        let mut table = AddressRangeTable::new();
        assert!(table.add_range(AddressRange::new("a", 1, 2)));
        assert!(!table.add_range(AddressRange::new("a", 1, 2)));
        assert!(table.add_range(AddressRange::new("b", 1, 2)));
        assert!(table.add_range(AddressRange::new("a", 1, 2)));
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_duplicate_check_uses_append_order_not_sort_order() {
        let mut table = table_with(&[(0x500, 0x600, "late"), (0x100, 0x200, "early")]);
        table.lookup(0x150);
        // Sorted last element is "late", but the previous append was "early"
        assert!(!table.add_range(AddressRange::new("early", 0x100, 0x200)));
        assert!(table.add_range(AddressRange::new("late", 0x500, 0x600)));
    }

    #[test]
    fn test_move_preserves_length() {
        let mut table = table_with(&[(0x1000, 0x1100, "f"), (0x4000, 0x4010, "g")]);
        assert!(table.move_range(0x1000, 0x8000));

        assert!(table.lookup(0x1000).is_none());
        let moved = table.lookup(0x8000).unwrap();
        assert_eq!(moved.symbol, "f");
        assert_eq!(moved.stop - moved.start, 0x100);
        assert_eq!(table.lookup(0x4008).unwrap().symbol, "g");
    }

    #[test]
    fn test_move_requires_exact_start() {
        let mut table = table_with(&[(0x1000, 0x1100, "f")]);
        assert!(!table.move_range(0x1001, 0x8000));
        assert!(!table.move_range(0x9999, 0x8000));
        assert_eq!(table.lookup(0x1000).unwrap().symbol, "f");
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut table = table_with(&[(0x1000, 0x1100, "f"), (0x2000, 0x2100, "g")]);
        assert!(table.remove(0x1000));
        assert!(!table.remove(0x1000));

        assert_eq!(table.len(), 2);
        assert!(table.lookup(0x1000).is_none());
        assert!(table.lookup(0x1050).is_none());
        assert_eq!(table.lookup(0x2050).unwrap().symbol, "g");
        assert!(table.ranges().iter().any(AddressRange::is_removed));
    }

    #[test]
    fn test_zero_address_never_matches_removed_range() {
        let mut table = table_with(&[(0x1000, 0x1100, "f")]);
        table.remove(0x1000);
        assert!(table.lookup(0).is_none());
        assert!(table.lookup(1).is_none());
    }

    #[test]
    fn test_reset_clears_ranges() {
        let mut table = table_with(&[(0x1000, 0x1100, "f")]);
        table.reset();
        assert!(table.is_empty());
        assert!(table.lookup(0x1000).is_none());
        // Duplicate suppression does not survive a reset
        assert!(table.add_range(AddressRange::new("f", 0x1000, 0x1100)));
    }

    #[test]
    fn test_dirty_flag_tracks_mutations() {
        let mut table = AddressRangeTable::new();
        assert!(!table.needs_sort());

        table.add_range(AddressRange::new("a", 0x300, 0x400));
        table.add_range(AddressRange::new("b", 0x100, 0x200));
        assert!(table.needs_sort());

        table.lookup(0x150);
        assert!(!table.needs_sort());
        assert_eq!(table.ranges()[0].symbol, "b");

        // Suppressed duplicate leaves the table sorted
        table.add_range(AddressRange::new("b", 0x100, 0x200));
        assert!(!table.needs_sort());

        assert!(table.move_range(0x100, 0x900));
        assert!(table.needs_sort());
        table.lookup(0);
        assert!(!table.needs_sort());

        assert!(table.remove(0x300));
        assert!(table.needs_sort());
        table.lookup(0);

        // A failed move or remove changes nothing
        assert!(!table.move_range(0x5555, 0x1));
        assert!(!table.remove(0x5555));
        assert!(!table.needs_sort());
    }
}
