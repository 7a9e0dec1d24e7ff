//! In-memory reading store

use std::collections::{BTreeMap, HashMap};

use super::{BoardId, ReadingId, ReadingQuery, ReadingStore, StoreError, StoredBoard};
use crate::model::{Board, BoardSpecifier, Reading, Uid};

/// Keeps boards and readings in process memory. Ids start at 1.
#[derive(Debug, Default)]
pub struct MemoryStore {
    boards: Vec<StoredBoard>,
    by_identity: HashMap<Board, BoardId>,
    readings: BTreeMap<ReadingId, (BoardId, Reading)>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct boards
    pub fn board_count(&self) -> usize {
        self.boards.len()
    }

    /// Number of readings over all boards
    pub fn reading_count(&self) -> usize {
        self.readings.len()
    }

    /// All boards in creation order
    pub fn boards(&self) -> &[StoredBoard] {
        &self.boards
    }

    /// Look up a reading by id
    pub fn reading(&self, id: ReadingId) -> Option<&Reading> {
        self.readings.get(&id).map(|(_, r)| r)
    }

    fn contains_board(&self, id: BoardId) -> bool {
        self.boards.iter().any(|b| b.id == id)
    }
}

impl ReadingStore for MemoryStore {
    fn find_or_create_board(
        &mut self,
        specifier: BoardSpecifier,
        uid: Uid,
    ) -> Result<StoredBoard, StoreError> {
        let board = Board::new(specifier, uid);
        if let Some(id) = self.by_identity.get(&board) {
            return Ok(StoredBoard { id: *id, board });
        }

        let id = BoardId(self.boards.len() as u32 + 1);
        let stored = StoredBoard { id, board };
        self.boards.push(stored);
        self.by_identity.insert(board, id);
        tracing::debug!(board = %board, id = id.0, "created board");
        Ok(stored)
    }

    fn save_reading(&mut self, board: &StoredBoard, reading: Reading) -> Result<ReadingId, StoreError> {
        if !self.contains_board(board.id) {
            return Err(StoreError::UnknownBoard(board.id));
        }
        let id = ReadingId(self.readings.len() as u32 + 1);
        self.readings.insert(id, (board.id, reading));
        Ok(id)
    }

    fn query_readings(&self, board_id: BoardId, query: &ReadingQuery) -> Result<Vec<Reading>, StoreError> {
        if !self.contains_board(board_id) {
            return Err(StoreError::UnknownBoard(board_id));
        }
        Ok(self
            .readings
            .iter()
            .filter(|(id, (owner, reading))| *owner == board_id && query.matches(**id, reading))
            .map(|(_, (_, reading))| reading.clone())
            .collect())
    }
}
