use crate::error::{SyncError, SyncResult};
use crate::model::price;

use super::generator::{ExtendReason, PriceGenerator};

/// Default number of points synthesized per refill.
pub const DEFAULT_REFILL_BATCH: usize = 50;

/// Owns the canonical price series and the cursor marking the present.
///
/// History is append-only. The only way to discard points is [`SeriesStore::rebase`],
/// which swaps in a whole new series at once.
#[derive(Debug)]
pub struct SeriesStore {
    series: Vec<f64>,
    cursor: usize,
    generator: PriceGenerator,
    refill_batch: usize,
}

impl SeriesStore {
    /// Build a store over `seed` with the cursor at `cursor`.
    pub fn new(seed: Vec<f64>, cursor: usize, generator: PriceGenerator) -> SyncResult<Self> {
        check_series(&seed)?;
        if cursor >= seed.len() {
            return Err(SyncError::InvariantViolation(format!(
                "cursor {} outside a {}-point seed",
                cursor,
                seed.len()
            )));
        }
        Ok(Self {
            series: seed,
            cursor,
            generator,
            refill_batch: DEFAULT_REFILL_BATCH,
        })
    }

    pub fn with_refill_batch(mut self, refill_batch: usize) -> Self {
        self.refill_batch = refill_batch.max(1);
        self
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.series
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.series.get(index).copied()
    }

    pub fn current_price(&self) -> f64 {
        self.series[self.cursor]
    }

    pub fn refill_batch(&self) -> usize {
        self.refill_batch
    }

    /// Points available strictly after the cursor.
    pub fn lookahead(&self) -> usize {
        self.series.len() - 1 - self.cursor
    }

    /// Extend the tail. Every point is checked before any is appended.
    pub fn append(&mut self, points: &[f64]) -> SyncResult<()> {
        for p in points {
            price::validate(*p).map_err(SyncError::InvariantViolation)?;
        }
        self.series.extend_from_slice(points);
        Ok(())
    }

    /// Guarantee at least `min_lookahead` points after the cursor.
    ///
    /// Refills in batches of at least `refill_batch` points. Returns how many
    /// points were added.
    pub fn ensure_lookahead(
        &mut self,
        min_lookahead: usize,
        reason: ExtendReason,
    ) -> SyncResult<usize> {
        let available = self.lookahead();
        if available >= min_lookahead {
            return Ok(0);
        }
        let count = self.refill_batch.max(min_lookahead - available);
        let tail = self.generator.extend_for(&self.series, count, reason);
        self.append(&tail)?;
        tracing::debug!(
            cursor = self.cursor,
            added = count,
            len = self.series.len(),
            ?reason,
            "Extended price series"
        );
        Ok(count)
    }

    /// Replace the whole series and move the cursor to its last point.
    pub fn rebase(&mut self, new_series: Vec<f64>) -> SyncResult<()> {
        check_series(&new_series)?;
        self.cursor = new_series.len() - 1;
        self.series = new_series;
        Ok(())
    }

    /// Rebase onto the history up to the cursor with a freshly generated tail
    /// of at least `min_lookahead` points, swapped in as one replacement.
    ///
    /// Returns how many future points were discarded. On error the store is
    /// left exactly as it was.
    pub fn rebase_with_fresh_tail(
        &mut self,
        min_lookahead: usize,
        reason: ExtendReason,
    ) -> SyncResult<usize> {
        let discarded = self.lookahead();
        let mut next = self.truncated_to_cursor();
        let count = self.refill_batch.max(min_lookahead);
        let tail = self.generator.extend_for(&next, count, reason);
        next.extend_from_slice(&tail);
        check_series(&next)?;
        self.series = next;
        tracing::debug!(
            cursor = self.cursor,
            discarded,
            added = count,
            len = self.series.len(),
            ?reason,
            "Rebased price series"
        );
        Ok(discarded)
    }

    /// Move the present forward by one point.
    pub fn advance_cursor(&mut self) -> SyncResult<usize> {
        let next = self.cursor + 1;
        if next >= self.series.len() {
            return Err(SyncError::OutOfRange {
                cursor: self.cursor,
                len: self.series.len(),
            });
        }
        self.cursor = next;
        Ok(next)
    }

    /// Copy of the history up to and including the cursor.
    pub fn truncated_to_cursor(&self) -> Vec<f64> {
        self.series[..=self.cursor].to_vec()
    }
}

fn check_series(series: &[f64]) -> SyncResult<()> {
    if series.is_empty() {
        return Err(SyncError::InvariantViolation(
            "price series must not be empty".to_string(),
        ));
    }
    for p in series {
        price::validate(*p).map_err(SyncError::InvariantViolation)?;
    }
    Ok(())
}
