//! In-memory store backend.
//!
//! Ordered maps behind a single lock. A delta is applied under one write
//! guard, so applications are serialized and therefore atomic; increments
//! commute, so any application order converges.

use crate::error::{Error, Result};
use crate::keys;
use crate::models::{now_ms, AggregateCell, CellDelta, PollRollupState, Submission};
use crate::store::{AggregateStore, MAX_READ_BATCH};
use pulsemap_grid::CellId;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::RwLock;

#[derive(Debug, Default)]
struct Inner {
    /// JSON documents (submissions).
    docs: BTreeMap<String, String>,
    /// Numeric counter fields and timestamps.
    nums: BTreeMap<String, f64>,
    /// Presence flags (dirty markers).
    flags: BTreeSet<String>,
}

impl Inner {
    fn prefixed_nums(&self, prefix: &str) -> Vec<(String, f64)> {
        self.nums
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), *v))
            .collect()
    }
}

/// In-memory [`AggregateStore`] for tests and embedded use.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Inner>> {
        self.inner
            .read()
            .map_err(|_| Error::Storage("lock poisoned".into()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Inner>> {
        self.inner
            .write()
            .map_err(|_| Error::Storage("lock poisoned".into()))
    }
}

impl AggregateStore for MemoryStore {
    fn put_submission(&self, sub: &Submission) -> Result<()> {
        keys::validate_id("poll", &sub.poll_id)?;
        keys::validate_id("user", &sub.user_id)?;
        let json = serde_json::to_string(sub)?;
        self.write()?
            .docs
            .insert(keys::submission_key(&sub.poll_id, &sub.user_id), json);
        Ok(())
    }

    fn get_submission(&self, poll: &str, user: &str) -> Result<Option<Submission>> {
        match self.read()?.docs.get(&keys::submission_key(poll, user)) {
            Some(json) => Ok(Some(serde_json::from_str(json)?)),
            None => Ok(None),
        }
    }

    fn delete_submission(&self, poll: &str, user: &str) -> Result<Option<Submission>> {
        match self.write()?.docs.remove(&keys::submission_key(poll, user)) {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    fn list_submissions(&self, poll: &str) -> Result<Vec<Submission>> {
        let prefix = keys::submission_prefix(poll);
        let inner = self.read()?;
        inner
            .docs
            .range(prefix.clone()..)
            .take_while(|(k, _)| k.starts_with(&prefix))
            .map(|(_, json)| serde_json::from_str(json).map_err(Error::from))
            .collect()
    }

    fn apply_delta(&self, poll: &str, cell: CellId, delta: &CellDelta) -> Result<()> {
        keys::validate_id("poll", poll)?;
        for question in delta.stats.keys() {
            keys::validate_id("question", question)?;
        }
        if delta.is_empty() {
            return Ok(());
        }

        let mut inner = self.write()?;
        for (suffix, value) in delta.field_increments() {
            let key = format!("{}{}", keys::cell_prefix(poll, cell), suffix);
            *inner.nums.entry(key).or_insert(0.0) += value;
        }
        inner.nums.insert(
            keys::cell_field_key(poll, cell, keys::FIELD_UPDATED_AT),
            now_ms() as f64,
        );
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
        let inner = self.read()?;
        let mut out = Vec::new();
        for &cell in cells {
            let prefix = keys::cell_prefix(poll, cell);
            let fields = inner.prefixed_nums(&prefix);
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
        let prefix = keys::layer_prefix(poll, res);
        let fields = self.read()?.prefixed_nums(&prefix);

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

        let mut inner = self.write()?;
        let stale: Vec<String> = inner
            .nums
            .range(prefix.clone()..)
            .take_while(|(k, _)| k.starts_with(&prefix))
            .map(|(k, _)| k.clone())
            .collect();
        for key in stale {
            inner.nums.remove(&key);
        }

        for (cell, agg) in cells {
            for (suffix, value) in agg.field_values() {
                let key = format!("{}{}", keys::cell_prefix(poll, *cell), suffix);
                inner.nums.insert(key, value);
            }
        }
        Ok(())
    }

    fn mark_dirty(&self, poll: &str) -> Result<()> {
        keys::validate_id("poll", poll)?;
        let mut inner = self.write()?;
        inner.flags.insert(keys::dirty_key(poll));
        inner
            .nums
            .insert(keys::last_submission_key(poll), now_ms() as f64);
        Ok(())
    }

    fn clear_dirty(&self, poll: &str) -> Result<()> {
        let mut inner = self.write()?;
        inner.flags.remove(&keys::dirty_key(poll));
        inner
            .nums
            .insert(keys::last_rolled_key(poll), now_ms() as f64);
        Ok(())
    }

    fn rollup_state(&self, poll: &str) -> Result<PollRollupState> {
        let inner = self.read()?;
        Ok(PollRollupState {
            dirty: inner.flags.contains(&keys::dirty_key(poll)),
            last_submission_at_ms: inner
                .nums
                .get(&keys::last_submission_key(poll))
                .map(|v| *v as u64),
            last_rolled_at_ms: inner
                .nums
                .get(&keys::last_rolled_key(poll))
                .map(|v| *v as u64),
        })
    }

    fn list_dirty_polls(&self) -> Result<Vec<String>> {
        let inner = self.read()?;
        Ok(inner
            .flags
            .range(keys::ROLLUP_PREFIX.to_string()..)
            .take_while(|k| k.starts_with(keys::ROLLUP_PREFIX))
            .filter_map(|k| {
                k.strip_prefix(keys::ROLLUP_PREFIX)
                    .and_then(|rest| rest.strip_suffix(keys::DIRTY_SUFFIX))
                    .map(String::from)
            })
            .collect())
    }
}
