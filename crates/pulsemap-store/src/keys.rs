//! Storage key construction and parsing.
//!
//! All keys are `:`-separated strings so both backends can prefix-scan
//! them. Cell ids (`res-x-y`) never contain `:`, which keeps parsing a
//! simple split.

use crate::error::{Error, Result};
use pulsemap_grid::CellId;

/// Counter field name for the per-cell respondent count.
pub const FIELD_RESPONDENTS: &str = "totalRespondents";

/// Counter field name for the per-cell update timestamp.
pub const FIELD_UPDATED_AT: &str = "updatedAt";

/// True if an id is usable inside a storage key.
pub fn is_valid_id(id: &str) -> bool {
    !id.is_empty() && !id.contains(':')
}

/// Reject ids that would corrupt the key layout.
pub fn validate_id(kind: &str, id: &str) -> Result<()> {
    if is_valid_id(id) {
        Ok(())
    } else {
        Err(Error::InvalidId(format!("{kind} {id:?}")))
    }
}

pub fn submission_key(poll: &str, user: &str) -> String {
    format!("sub:{poll}:{user}")
}

pub fn submission_prefix(poll: &str) -> String {
    format!("sub:{poll}:")
}

/// Prefix of every counter field of one cell.
pub fn cell_prefix(poll: &str, cell: CellId) -> String {
    format!("agg:{poll}:{cell}:")
}

/// Prefix of every key in one (poll, resolution) layer.
///
/// Relies on cell ids starting with `{res}-`; the dash terminates the
/// resolution so `1-` never matches a resolution-15 cell.
pub fn layer_prefix(poll: &str, res: u8) -> String {
    format!("agg:{poll}:{res}-")
}

/// Key of one per-question counter field.
pub fn question_field_key(poll: &str, cell: CellId, question: &str, field: &str) -> String {
    format!("agg:{poll}:{cell}:q:{question}:{field}")
}

/// Key of a whole-cell field (`totalRespondents`, `updatedAt`).
pub fn cell_field_key(poll: &str, cell: CellId, field: &str) -> String {
    format!("agg:{poll}:{cell}:{field}")
}

pub fn dirty_key(poll: &str) -> String {
    format!("roll:{poll}:dirty")
}

pub fn last_submission_key(poll: &str) -> String {
    format!("roll:{poll}:subat")
}

pub fn last_rolled_key(poll: &str) -> String {
    format!("roll:{poll}:rolledat")
}

pub const ROLLUP_PREFIX: &str = "roll:";
pub const DIRTY_SUFFIX: &str = ":dirty";

/// Split an aggregate key under a layer prefix into its cell and field
/// suffix (`q:{question}:{field}`, `totalRespondents`, or `updatedAt`).
pub fn parse_layer_key<'a>(poll: &str, key: &'a str) -> Result<(CellId, &'a str)> {
    let rest = key
        .strip_prefix("agg:")
        .and_then(|k| k.strip_prefix(poll))
        .and_then(|k| k.strip_prefix(':'))
        .ok_or_else(|| Error::CorruptRecord(format!("aggregate key {key:?}")))?;
    let (cell_str, suffix) = rest
        .split_once(':')
        .ok_or_else(|| Error::CorruptRecord(format!("aggregate key {key:?}")))?;
    let cell = cell_str
        .parse::<CellId>()
        .map_err(|_| Error::CorruptRecord(format!("cell id in key {key:?}")))?;
    Ok((cell, suffix))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell() -> CellId {
        CellId::at(39.95, -75.16, 8).unwrap()
    }

    #[test]
    fn id_validation() {
        assert!(is_valid_id("poll-123"));
        assert!(!is_valid_id(""));
        assert!(!is_valid_id("a:b"));
    }

    #[test]
    fn layer_prefix_matches_only_its_resolution() {
        let c8 = cell();
        assert!(cell_prefix("p", c8).starts_with(&layer_prefix("p", 8)));

        // res-1 prefix must not match a res-15 cell
        let fine = CellId::at(39.95, -75.16, 15).unwrap();
        assert!(!cell_prefix("p", fine).starts_with(&layer_prefix("p", 1)));
    }

    #[test]
    fn parse_roundtrip() {
        let key = question_field_key("p", cell(), "q1", "posSum");
        let (parsed, suffix) = parse_layer_key("p", &key).unwrap();
        assert_eq!(parsed, cell());
        assert_eq!(suffix, "q:q1:posSum");

        let key = cell_field_key("p", cell(), FIELD_RESPONDENTS);
        let (_, suffix) = parse_layer_key("p", &key).unwrap();
        assert_eq!(suffix, FIELD_RESPONDENTS);
    }
}
