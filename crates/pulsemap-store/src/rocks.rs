//! RocksDB store backend.
//!
//! Counter fields are 8-byte little-endian `f64` values mutated through an
//! associative add merge operator, which is the increment-only primitive the
//! engine requires: concurrent deltas become merge operands and RocksDB
//! folds them in, no read-modify-write. One delta is one `WriteBatch`, so a
//! cell never ends up with half a delta applied.

use crate::error::{Error, Result};
use crate::keys;
use crate::models::{now_ms, AggregateCell, CellDelta, PollRollupState, Submission};
use crate::store::{AggregateStore, MAX_READ_BATCH};
use pulsemap_grid::CellId;
use rocksdb::{MergeOperands, Options, WriteBatch, DB};
use std::collections::BTreeMap;
use std::path::Path;

/// Decode a stored numeric field; malformed values read as zero.
fn decode_f64(data: &[u8]) -> f64 {
    match <[u8; 8]>::try_from(data) {
        Ok(bytes) => f64::from_le_bytes(bytes),
        Err(_) => 0.0,
    }
}

/// Associative add over little-endian `f64` values.
fn f64_add_merge(
    _key: &[u8],
    existing: Option<&[u8]>,
    operands: &MergeOperands,
) -> Option<Vec<u8>> {
    let mut total = existing.map(decode_f64).unwrap_or(0.0);
    for op in operands {
        total += decode_f64(op);
    }
    Some(total.to_le_bytes().to_vec())
}

/// RocksDB-backed [`AggregateStore`].
pub struct RocksStore {
    db: DB,
}

impl RocksStore {
    /// Open or create storage at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.set_merge_operator_associative("f64_add", f64_add_merge);
        let db = DB::open(&opts, path.as_ref())?;
        tracing::info!(path = %path.as_ref().display(), "aggregate store opened");
        Ok(Self { db })
    }

    /// All numeric fields under a key prefix.
    fn prefixed_nums(&self, prefix: &str) -> Result<Vec<(String, f64)>> {
        let mut fields = Vec::new();
        for item in self.db.prefix_iterator(prefix.as_bytes()) {
            let (key, value) = item?;
            if !key.starts_with(prefix.as_bytes()) {
                break;
            }
            let key = String::from_utf8(key.to_vec())
                .map_err(|_| Error::CorruptRecord("non-utf8 key".into()))?;
            fields.push((key, decode_f64(&value)));
        }
        Ok(fields)
    }

    fn get_num(&self, key: &str) -> Result<Option<f64>> {
        Ok(self.db.get(key.as_bytes())?.map(|v| decode_f64(&v)))
    }
}

impl AggregateStore for RocksStore {
    fn put_submission(&self, sub: &Submission) -> Result<()> {
        keys::validate_id("poll", &sub.poll_id)?;
        keys::validate_id("user", &sub.user_id)?;
        let key = keys::submission_key(&sub.poll_id, &sub.user_id);
        let value = serde_json::to_vec(sub)?;
        self.db.put(key.as_bytes(), value)?;
        Ok(())
    }

    fn get_submission(&self, poll: &str, user: &str) -> Result<Option<Submission>> {
        let key = keys::submission_key(poll, user);
        match self.db.get(key.as_bytes())? {
            Some(data) => Ok(Some(serde_json::from_slice(&data)?)),
            None => Ok(None),
        }
    }

    fn delete_submission(&self, poll: &str, user: &str) -> Result<Option<Submission>> {
        let prior = self.get_submission(poll, user)?;
        if prior.is_some() {
            self.db
                .delete(keys::submission_key(poll, user).as_bytes())?;
        }
        Ok(prior)
    }

    fn list_submissions(&self, poll: &str) -> Result<Vec<Submission>> {
        let prefix = keys::submission_prefix(poll);
        let mut subs = Vec::new();
        for item in self.db.prefix_iterator(prefix.as_bytes()) {
            let (key, value) = item?;
            if !key.starts_with(prefix.as_bytes()) {
                break;
            }
            subs.push(serde_json::from_slice(&value)?);
        }
        Ok(subs)
    }

    fn apply_delta(&self, poll: &str, cell: CellId, delta: &CellDelta) -> Result<()> {
        keys::validate_id("poll", poll)?;
        for question in delta.stats.keys() {
            keys::validate_id("question", question)?;
        }
        if delta.is_empty() {
            return Ok(());
        }

        let mut batch = WriteBatch::default();
        for (suffix, value) in delta.field_increments() {
            let key = format!("{}{}", keys::cell_prefix(poll, cell), suffix);
            batch.merge(key.as_bytes(), value.to_le_bytes());
        }
        batch.put(
            keys::cell_field_key(poll, cell, keys::FIELD_UPDATED_AT).as_bytes(),
            (now_ms() as f64).to_le_bytes(),
        );
        self.db.write(batch)?;
        Ok(())
    }

    fn read_cells(
        &self,
        poll: &str,
        _res: u8,
        cells: &[CellId],
    ) -> Result<Vec<(CellId, AggregateCell)>> {
        if cells.len() > MAX_READ_BATCH {
            return Err(Error::BatchTooLarge {
                got: cells.len(),
                max: MAX_READ_BATCH,
            });
        }
        let mut out = Vec::new();
        for &cell in cells {
            let fields = self.prefixed_nums(&keys::cell_prefix(poll, cell))?;
            if fields.is_empty() {
                continue;
            }
            let mut agg = AggregateCell::default();
            for (key, value) in fields {
                let (_, suffix) = keys::parse_layer_key(poll, &key)?;
                agg.apply_field(suffix, value)?;
            }
            out.push((cell, agg));
        }
        Ok(out)
    }

    fn list_layer(&self, poll: &str, res: u8) -> Result<Vec<(CellId, AggregateCell)>> {
        let fields = self.prefixed_nums(&keys::layer_prefix(poll, res))?;

        let mut by_cell: BTreeMap<CellId, AggregateCell> = BTreeMap::new();
        for (key, value) in fields {
            let (cell, suffix) = keys::parse_layer_key(poll, &key)?;
            by_cell.entry(cell).or_default().apply_field(suffix, value)?;
        }
        Ok(by_cell.into_iter().collect())
    }

    fn replace_layer(&self, poll: &str, res: u8, cells: &[(CellId, AggregateCell)]) -> Result<()> {
        keys::validate_id("poll", poll)?;
        let prefix = keys::layer_prefix(poll, res);

        // Delete-then-write in one batch: the layer swap is atomic and
        // stale cells cannot survive it.
        let mut batch = WriteBatch::default();
        for item in self.db.prefix_iterator(prefix.as_bytes()) {
            let (key, _) = item?;
            if !key.starts_with(prefix.as_bytes()) {
                break;
            }
            batch.delete(&key);
        }
        for (cell, agg) in cells {
            for (suffix, value) in agg.field_values() {
                let key = format!("{}{}", keys::cell_prefix(poll, *cell), suffix);
                batch.put(key.as_bytes(), value.to_le_bytes());
            }
        }
        self.db.write(batch)?;
        Ok(())
    }

    fn mark_dirty(&self, poll: &str) -> Result<()> {
        keys::validate_id("poll", poll)?;
        let mut batch = WriteBatch::default();
        batch.put(keys::dirty_key(poll).as_bytes(), b"1");
        batch.put(
            keys::last_submission_key(poll).as_bytes(),
            (now_ms() as f64).to_le_bytes(),
        );
        self.db.write(batch)?;
        Ok(())
    }

    fn clear_dirty(&self, poll: &str) -> Result<()> {
        let mut batch = WriteBatch::default();
        batch.delete(keys::dirty_key(poll).as_bytes());
        batch.put(
            keys::last_rolled_key(poll).as_bytes(),
            (now_ms() as f64).to_le_bytes(),
        );
        self.db.write(batch)?;
        Ok(())
    }

    fn rollup_state(&self, poll: &str) -> Result<PollRollupState> {
        Ok(PollRollupState {
            dirty: self.db.get(keys::dirty_key(poll).as_bytes())?.is_some(),
            last_submission_at_ms: self
                .get_num(&keys::last_submission_key(poll))?
                .map(|v| v as u64),
            last_rolled_at_ms: self
                .get_num(&keys::last_rolled_key(poll))?
                .map(|v| v as u64),
        })
    }

    fn list_dirty_polls(&self) -> Result<Vec<String>> {
        let mut polls = Vec::new();
        for item in self.db.prefix_iterator(keys::ROLLUP_PREFIX.as_bytes()) {
            let (key, _) = item?;
            if !key.starts_with(keys::ROLLUP_PREFIX.as_bytes()) {
                break;
            }
            let key = String::from_utf8_lossy(&key);
            if let Some(poll) = key
                .strip_prefix(keys::ROLLUP_PREFIX)
                .and_then(|rest| rest.strip_suffix(keys::DIRTY_SUFFIX))
            {
                polls.push(poll.to_string());
            }
        }
        Ok(polls)
    }
}
