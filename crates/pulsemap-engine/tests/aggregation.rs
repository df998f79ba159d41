//! End-to-end aggregation scenarios over the in-memory store.

use pulsemap_engine::{
    RangeQueryService, ResolutionLadder, ResponseAggregator, RollupEngine,
};
use pulsemap_grid::{BoundingBox, CellId};
use pulsemap_store::{AggregateStore, GeoPoint, MemoryStore, Submission};
use std::sync::Arc;

const PHILLY: GeoPoint = GeoPoint {
    lat: 39.95,
    lng: -75.16,
};
const NYC: GeoPoint = GeoPoint {
    lat: 40.71,
    lng: -74.0,
};
const PARIS: GeoPoint = GeoPoint {
    lat: 48.85,
    lng: 2.35,
};
const LA: GeoPoint = GeoPoint {
    lat: 34.05,
    lng: -118.24,
};

struct Harness {
    store: Arc<MemoryStore>,
    aggregator: ResponseAggregator,
    rollup: RollupEngine,
    query: RangeQueryService,
}

fn harness() -> Harness {
    let store = Arc::new(MemoryStore::new());
    let ladder = ResolutionLadder::new(vec![4, 8]).unwrap();
    Harness {
        store: store.clone(),
        aggregator: ResponseAggregator::new(store.clone(), ladder.clone()),
        rollup: RollupEngine::new(store.clone(), ladder.clone()),
        query: RangeQueryService::new(store, ladder),
    }
}

impl Harness {
    /// The ingest path: persist the document, then aggregate the
    /// before/after transition.
    fn write(&self, sub: Submission) {
        let before = self
            .store
            .get_submission(&sub.poll_id, &sub.user_id)
            .unwrap();
        self.store.put_submission(&sub).unwrap();
        self.aggregator
            .on_response_written(before.as_ref(), Some(&sub))
            .unwrap();
    }

    fn withdraw(&self, poll: &str, user: &str) {
        let before = self.store.delete_submission(poll, user).unwrap();
        self.aggregator
            .on_response_written(before.as_ref(), None)
            .unwrap();
    }

}

fn submission(user: &str, loc: GeoPoint, answers: &[(&str, f64)]) -> Submission {
    Submission {
        poll_id: "p1".into(),
        user_id: user.into(),
        submitted: true,
        answers: answers
            .iter()
            .map(|(q, v)| (q.to_string(), *v))
            .collect(),
        location: Some(loc),
        cell: None,
        updated_at_ms: 1,
    }
}

#[test]
fn submit_then_edit_matches_expected_counters() {
    let h = harness();
    h.write(submission("u1", PHILLY, &[("q1", 5.0), ("q2", -3.0)]));

    let cell = CellId::at(PHILLY.lat, PHILLY.lng, 8).unwrap();
    let read = h.store.read_cells("p1", 8, &[cell]).unwrap();
    let agg = &read[0].1;
    assert_eq!(agg.total_respondents, 1);
    let q1 = &agg.stats["q1"];
    assert_eq!((q1.sum, q1.pos_sum, q1.pos_count), (5.0, 5.0, 1));
    let q2 = &agg.stats["q2"];
    assert_eq!((q2.sum, q2.neg_sum, q2.neg_count), (-3.0, -3.0, 1));

    // Edit q1 from 5 to -2; q2 untouched
    h.write(submission("u1", PHILLY, &[("q1", -2.0), ("q2", -3.0)]));

    let read = h.store.read_cells("p1", 8, &[cell]).unwrap();
    let agg = &read[0].1;
    assert_eq!(agg.total_respondents, 1);
    let q1 = &agg.stats["q1"];
    assert_eq!(q1.sum, -2.0);
    assert_eq!(q1.pos_sum, 0.0);
    assert_eq!(q1.pos_count, 0);
    assert_eq!(q1.neg_sum, -2.0);
    assert_eq!(q1.neg_count, 1);
    let q2 = &agg.stats["q2"];
    assert_eq!((q2.sum, q2.neg_sum, q2.neg_count), (-3.0, -3.0, 1));
}

#[test]
fn move_conserves_totals_and_empties_old_cell() {
    let h = harness();
    h.write(submission("u1", PHILLY, &[("q1", 5.0)]));
    h.write(submission("u1", PARIS, &[("q1", 5.0)]));

    let old_cell = CellId::at(PHILLY.lat, PHILLY.lng, 8).unwrap();
    let new_cell = CellId::at(PARIS.lat, PARIS.lng, 8).unwrap();
    assert_ne!(old_cell, new_cell);

    let layer = h.store.list_layer("p1", 8).unwrap();
    let total_respondents: i64 = layer.iter().map(|(_, a)| a.total_respondents).sum();
    let total_sum: f64 = layer
        .iter()
        .filter_map(|(_, a)| a.stats.get("q1").map(|c| c.sum))
        .sum();
    assert_eq!(total_respondents, 1);
    assert_eq!(total_sum, 5.0);

    for (cell, agg) in &layer {
        if *cell == old_cell {
            assert!(agg.is_empty());
        }
        if *cell == new_cell {
            assert_eq!(agg.total_respondents, 1);
            assert_eq!(agg.stats["q1"].sum, 5.0);
        }
    }
}

#[test]
fn respondents_is_cardinality_not_answer_count() {
    let h = harness();
    h.write(submission(
        "u1",
        PHILLY,
        &[("q1", 1.0), ("q2", 2.0), ("q3", 3.0)],
    ));

    let cell = CellId::at(PHILLY.lat, PHILLY.lng, 8).unwrap();
    let read = h.store.read_cells("p1", 8, &[cell]).unwrap();
    assert_eq!(read[0].1.total_respondents, 1);

    h.write(submission("u2", PHILLY, &[("q1", 4.0)]));
    let read = h.store.read_cells("p1", 8, &[cell]).unwrap();
    assert_eq!(read[0].1.total_respondents, 2);
}

#[test]
fn withdraw_removes_contribution() {
    let h = harness();
    h.write(submission("u1", PHILLY, &[("q1", 5.0)]));
    h.withdraw("p1", "u1");

    let layer = h.store.list_layer("p1", 8).unwrap();
    assert!(layer.iter().all(|(_, agg)| agg.is_empty()));
}

#[test]
fn unresolvable_location_skips_aggregation() {
    let h = harness();
    let mut sub = submission("u1", PHILLY, &[("q1", 5.0)]);
    sub.location = None;
    h.write(sub);

    assert!(h.store.list_layer("p1", 8).unwrap().is_empty());
    assert!(!h.store.rollup_state("p1").unwrap().dirty);
    // The document itself was stored
    assert!(h.store.get_submission("p1", "u1").unwrap().is_some());
}

#[test]
fn unsubmitted_draft_is_not_counted() {
    let h = harness();
    let mut sub = submission("u1", PHILLY, &[("q1", 5.0)]);
    sub.submitted = false;
    h.write(sub);

    assert!(h.store.list_layer("p1", 8).unwrap().is_empty());

    // Flipping to submitted counts it as a create
    h.write(submission("u1", PHILLY, &[("q1", 5.0)]));
    let cell = CellId::at(PHILLY.lat, PHILLY.lng, 8).unwrap();
    let read = h.store.read_cells("p1", 8, &[cell]).unwrap();
    assert_eq!(read[0].1.total_respondents, 1);
}

#[test]
fn rollup_is_idempotent() {
    let h = harness();
    h.write(submission("u1", PHILLY, &[("q1", 5.0), ("q2", -3.0)]));
    h.write(submission("u2", NYC, &[("q1", -1.0)]));
    h.write(submission("u3", PARIS, &[("q1", 2.0)]));

    let first = h.rollup.rollup("p1").unwrap();
    let after_first = (
        h.store.list_layer("p1", 4).unwrap(),
        h.store.list_layer("p1", 8).unwrap(),
    );

    let second = h.rollup.rollup("p1").unwrap();
    let after_second = (
        h.store.list_layer("p1", 4).unwrap(),
        h.store.list_layer("p1", 8).unwrap(),
    );

    // Identical including timestamps: the rebuild is a pure function of
    // the submissions
    assert_eq!(first, second);
    assert_eq!(after_first, after_second);
    assert_eq!(first.respondents_counted, 3);
}

#[test]
fn rollup_builds_coarse_layers_by_cardinality() {
    let h = harness();
    // Philly and NYC share the res-4 ancestor cell; Paris does not
    h.write(submission("u1", PHILLY, &[("q1", 5.0)]));
    h.write(submission("u2", NYC, &[("q1", 3.0)]));
    h.write(submission("u3", PARIS, &[("q1", 1.0)]));
    h.rollup.rollup("p1").unwrap();

    let east_coast = CellId::at(PHILLY.lat, PHILLY.lng, 4).unwrap();
    assert_eq!(east_coast, CellId::at(NYC.lat, NYC.lng, 4).unwrap());

    let coarse = h.store.read_cells("p1", 4, &[east_coast]).unwrap();
    let agg = &coarse[0].1;
    assert_eq!(agg.total_respondents, 2);
    assert_eq!(agg.stats["q1"].sum, 8.0);
    assert_eq!(agg.stats["q1"].pos_count, 2);
}

#[test]
fn bbox_query_returns_only_covered_cells() {
    let h = harness();
    h.write(submission("u1", PHILLY, &[("q1", 5.0)]));
    h.write(submission("u2", NYC, &[("q1", 3.0)]));
    h.write(submission("u3", LA, &[("q1", 100.0)]));

    // Northeast corridor viewport; excludes Los Angeles
    let bbox = BoundingBox::new(-76.0, 39.0, -73.5, 41.5).unwrap();
    let mut sums = h.query.query("p1", "q1", 8, Some(&bbox)).unwrap();
    sums.sort_by(|a, b| a.cell_id.cmp(&b.cell_id));

    assert_eq!(sums.len(), 2);
    let total: f64 = sums.iter().map(|s| s.sum).sum();
    assert_eq!(total, 8.0);
    assert!(sums
        .iter()
        .all(|s| s.cell_id != CellId::at(LA.lat, LA.lng, 8).unwrap()));

    // Unbounded read sees all three
    assert_eq!(h.query.query("p1", "q1", 8, None).unwrap().len(), 3);

    // A question nobody answered yields nothing
    assert!(h.query.query("p1", "q9", 8, Some(&bbox)).unwrap().is_empty());
}
