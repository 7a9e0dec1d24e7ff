//! Reading Store
//!
//! The interface decoded readings are handed to, and the query side the
//! statistics are fed from. [`MemoryStore`] is the in-process implementation;
//! database backends implement [`ReadingStore`] outside this crate.

mod memory;

pub use memory::MemoryStore;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;
use thiserror::Error;

use crate::model::{Board, BoardSpecifier, Reading, Uid};

/// Store-assigned board key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BoardId(pub u32);

/// Store-assigned reading key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ReadingId(pub u32);

impl fmt::Display for BoardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ReadingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A board as persisted, with its store key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredBoard {
    /// Store key
    pub id: BoardId,
    /// Natural identity
    pub board: Board,
}

/// Which readings of a board to return
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadingQuery {
    /// Every reading of the board
    All,
    /// Readings whose id lies in the range
    IdRange(RangeInclusive<ReadingId>),
    /// Readings of exactly the PUF region `[start, end)`
    Address { start: u32, end: u32 },
}

impl ReadingQuery {
    /// Whether a reading with `id` matches
    pub fn matches(&self, id: ReadingId, reading: &Reading) -> bool {
        match self {
            ReadingQuery::All => true,
            ReadingQuery::IdRange(range) => range.contains(&id),
            ReadingQuery::Address { start, end } => {
                reading.puf_start() == *start && reading.puf_end() == *end
            }
        }
    }
}

/// Errors reported by a store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Unknown board id {0}")]
    UnknownBoard(BoardId),

    #[error("Store backend error: {0}")]
    Backend(String),
}

/// Persistence interface consumed by the acquisition session and the reports
pub trait ReadingStore: Send {
    /// Look up a board by its natural key, creating it if it does not exist
    fn find_or_create_board(
        &mut self,
        specifier: BoardSpecifier,
        uid: Uid,
    ) -> Result<StoredBoard, StoreError>;

    /// Persist a reading for a board previously returned by this store
    fn save_reading(&mut self, board: &StoredBoard, reading: Reading) -> Result<ReadingId, StoreError>;

    /// Readings of `board_id` matching `query`, in id order
    fn query_readings(&self, board_id: BoardId, query: &ReadingQuery) -> Result<Vec<Reading>, StoreError>;
}

/// Readings of consecutive PUF regions on one device.
///
/// Returns `count` lists; list `i` holds the readings of
/// `[first_address + i * puf_size, first_address + (i + 1) * puf_size)`.
pub fn multi_puf_query<S: ReadingStore + ?Sized>(
    store: &S,
    board_id: BoardId,
    first_address: u32,
    puf_size: u32,
    count: usize,
) -> Result<Vec<Vec<Reading>>, StoreError> {
    (0..count as u32)
        .map(|i| {
            let start = first_address + i * puf_size;
            store.query_readings(
                board_id,
                &ReadingQuery::Address {
                    start,
                    end: start + puf_size,
                },
            )
        })
        .collect()
}
