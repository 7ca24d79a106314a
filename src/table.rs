//! Dense per-code bookkeeping shared by both search strategies.
//!
//! One status byte per position code. The depth-first solver stores the
//! remaining depth a position was claimed with in the whole byte (0 means
//! unvisited). The scanner uses the byte as a set of flags and keeps a
//! predecessor code per entry for path reconstruction.
use crate::codec::PositionCode;

/// The code decodes to a legal board.
pub const LEGAL: u8 = 0x01;
/// The position has been reached from the start.
pub const REACHED: u8 = 0x02;
/// The position's neighbours have been generated.
pub const EXPANDED: u8 = 0x04;
/// The position has been reported as a solution.
pub const FOUND: u8 = 0x40;
/// The position satisfies the goal.
pub const FINAL: u8 = 0x80;

#[derive(Clone, Debug)]
pub struct VisitedTable {
    status: Vec<u8>,
    backtrace: Vec<PositionCode>,
}

impl VisitedTable {
    /// Allocates a zeroed table for `size` codes. The predecessor array is
    /// only allocated when `with_backtrace` is set.
    pub fn new(size: usize, with_backtrace: bool) -> Self {
        VisitedTable {
            status: vec![0; size],
            backtrace: if with_backtrace { vec![0; size] } else { Vec::new() },
        }
    }

    pub fn len(&self) -> usize {
        self.status.len()
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_empty()
    }

    pub fn has_backtrace(&self) -> bool {
        !self.backtrace.is_empty()
    }

    /// Resets every entry to unvisited.
    pub fn clear(&mut self) {
        self.status.fill(0);
        self.backtrace.fill(0);
    }

    /// Number of entries with a non-zero status byte.
    pub fn occupied(&self) -> usize {
        self.status.iter().filter(|&&s| s != 0).count()
    }

    pub fn status(&self, code: PositionCode) -> u8 {
        self.status[code as usize]
    }

    pub(crate) fn status_mut(&mut self) -> &mut [u8] {
        &mut self.status
    }

    /// Claims `code` for a search with `depth` moves left. Succeeds, and
    /// records `depth`, only if every earlier claim had strictly less budget.
    pub fn try_claim(&mut self, code: PositionCode, depth: u8) -> bool {
        let entry = &mut self.status[code as usize];
        if *entry < depth {
            *entry = depth;
            true
        } else {
            false
        }
    }

    /// The largest remaining depth `code` was claimed with, 0 if never.
    pub fn claimed_depth(&self, code: PositionCode) -> u8 {
        self.status[code as usize]
    }

    /// Overwrites the entry with the classification flags.
    pub fn classify(&mut self, code: PositionCode, legal: bool, is_final: bool) {
        self.status[code as usize] = classification_flags(legal, is_final);
    }

    /// Marks `code` as reached from `predecessor`. Only the first call for a
    /// code records anything; later ones return `false`.
    pub fn mark_reached(&mut self, code: PositionCode, predecessor: PositionCode) -> bool {
        let index = code as usize;
        if self.status[index] & REACHED != 0 {
            return false;
        }
        self.status[index] |= REACHED;
        if let Some(slot) = self.backtrace.get_mut(index) {
            *slot = predecessor;
        }
        true
    }

    pub fn mark_expanded(&mut self, code: PositionCode) {
        self.status[code as usize] |= EXPANDED;
    }

    pub fn mark_found(&mut self, code: PositionCode) {
        self.status[code as usize] |= FOUND;
    }

    pub fn is_legal(&self, code: PositionCode) -> bool {
        self.status(code) & LEGAL != 0
    }

    pub fn is_reached(&self, code: PositionCode) -> bool {
        self.status(code) & REACHED != 0
    }

    pub fn is_expanded(&self, code: PositionCode) -> bool {
        self.status(code) & EXPANDED != 0
    }

    pub fn is_found(&self, code: PositionCode) -> bool {
        self.status(code) & FOUND != 0
    }

    pub fn is_final(&self, code: PositionCode) -> bool {
        self.status(code) & FINAL != 0
    }

    /// The code `code` was first reached from, if it has been reached and the
    /// table keeps predecessors.
    pub fn predecessor(&self, code: PositionCode) -> Option<PositionCode> {
        if self.is_reached(code) {
            self.backtrace.get(code as usize).copied()
        } else {
            None
        }
    }
}

/// Status byte for a freshly classified code.
pub(crate) fn classification_flags(legal: bool, is_final: bool) -> u8 {
    match (legal, is_final) {
        (false, _) => 0,
        (true, false) => LEGAL,
        (true, true) => LEGAL | FINAL,
    }
}
