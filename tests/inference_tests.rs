//! End-to-end tests for the two-stage inference engine
//!
//! These tests run both stages against the in-memory store, plus a failing
//! store to verify the abort-without-rollback property.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use uuid::Uuid;

use cohort_rs::engine::{InferenceEngine, SubjectSelector};
use cohort_rs::error::EngineError;
use cohort_rs::model::{
    Behavior, BehaviorRequirement, Condition, FeatureValue, ScalarValue, State, Subject,
};
use cohort_rs::store::{parse_dataset, MemoryStore, StoreError, SubjectStore};

// ============================================================================
// Shared scenario: height/weight features, tall/fit states, athlete behavior
// ============================================================================

struct Scenario {
    height: Uuid,
    weight: Uuid,
    tall: State,
    fit: State,
    athlete: Behavior,
}

static SCENARIO: Lazy<Scenario> = Lazy::new(|| {
    let height = Uuid::new_v4();
    let weight = Uuid::new_v4();

    let tall = State {
        id: Uuid::new_v4(),
        name: "tall".to_string(),
        domain: "body".to_string(),
        conditions: vec![Condition {
            feature: height,
            operator: "gte".to_string(),
            base: ScalarValue::Number(180.0),
        }],
    };

    let fit = State {
        id: Uuid::new_v4(),
        name: "fit".to_string(),
        domain: "body".to_string(),
        conditions: vec![
            Condition {
                feature: height,
                operator: "gte".to_string(),
                base: ScalarValue::Number(170.0),
            },
            Condition {
                feature: weight,
                operator: "lte".to_string(),
                base: ScalarValue::Number(80.0),
            },
        ],
    };

    let athlete = Behavior {
        id: Uuid::new_v4(),
        name: "athlete".to_string(),
        domain: "sport".to_string(),
        requirements: vec![
            BehaviorRequirement {
                state: tall.id,
                required: true,
            },
            BehaviorRequirement {
                state: fit.id,
                required: true,
            },
        ],
    };

    Scenario {
        height,
        weight,
        tall,
        fit,
        athlete,
    }
});

fn subject(alias: &str, measurements: &[(Uuid, f64)]) -> Subject {
    Subject {
        id: Uuid::new_v4(),
        alias: alias.to_string(),
        age: 14,
        gender: "f".to_string(),
        features: measurements
            .iter()
            .map(|(feature, v)| FeatureValue {
                feature: *feature,
                value: ScalarValue::Number(*v),
            })
            .collect(),
        states: vec![],
        behaviors: vec![],
    }
}

async fn scenario_store(subjects: Vec<Subject>) -> MemoryStore {
    let store = MemoryStore::new();
    store.insert_state(SCENARIO.tall.clone()).await;
    store.insert_state(SCENARIO.fit.clone()).await;
    store.insert_behavior(SCENARIO.athlete.clone()).await;
    for s in subjects {
        store.insert_subject(s).await;
    }
    store
}

fn engine(store: &MemoryStore) -> InferenceEngine {
    InferenceEngine::new(Arc::new(store.clone()), Arc::new(store.clone()))
}

// ============================================================================
// Stage 1: state inference
// ============================================================================

#[tokio::test]
async fn test_tall_state_matches_on_height() {
    let tall_one = subject("ada", &[(SCENARIO.height, 190.0)]);
    let short_one = subject("bo", &[(SCENARIO.height, 170.0)]);
    let store = scenario_store(vec![tall_one, short_one]).await;

    let report = engine(&store)
        .run_state_inference(SubjectSelector::All, None)
        .await
        .unwrap();

    assert_eq!(report.len(), 2);
    let names: Vec<&str> = report[0].matched.iter().map(|r| r.name.as_str()).collect();
    assert!(names.contains(&"tall"));
    assert!(!report[1]
        .matched
        .iter()
        .any(|r| r.name == "tall"));
}

#[tokio::test]
async fn test_state_inference_persists_matched_set() {
    let s = subject("ada", &[(SCENARIO.height, 185.0), (SCENARIO.weight, 75.0)]);
    let id = s.id;
    let store = scenario_store(vec![s]).await;

    engine(&store)
        .run_state_inference(SubjectSelector::One(id), None)
        .await
        .unwrap();

    let persisted = store.get_subject(id).await.unwrap();
    assert_eq!(persisted.states, vec![SCENARIO.tall.id, SCENARIO.fit.id]);
}

#[tokio::test]
async fn test_state_inference_is_idempotent() {
    let s = subject("ada", &[(SCENARIO.height, 190.0)]);
    let id = s.id;
    let store = scenario_store(vec![s]).await;
    let engine = engine(&store);

    let first = engine
        .run_state_inference(SubjectSelector::One(id), None)
        .await
        .unwrap();
    let after_first = store.get_subject(id).await.unwrap().states;

    let second = engine
        .run_state_inference(SubjectSelector::One(id), None)
        .await
        .unwrap();
    let after_second = store.get_subject(id).await.unwrap().states;

    assert_eq!(after_first, after_second);
    assert_eq!(first[0].matched, second[0].matched);
}

#[tokio::test]
async fn test_rerun_overwrites_stale_states() {
    let s = subject("ada", &[(SCENARIO.height, 190.0)]);
    let id = s.id;
    let store = scenario_store(vec![s]).await;

    // Simulate a stale derived set from an earlier run
    store
        .write_matched_states(id, vec![SCENARIO.tall.id, SCENARIO.fit.id])
        .await
        .unwrap();

    engine(&store)
        .run_state_inference(SubjectSelector::One(id), None)
        .await
        .unwrap();

    // Full replace: only what the current feature values support remains
    let persisted = store.get_subject(id).await.unwrap();
    assert_eq!(persisted.states, vec![SCENARIO.tall.id]);
}

#[tokio::test]
async fn test_empty_selection_gives_empty_report() {
    let store = scenario_store(vec![]).await;
    let report = engine(&store)
        .run_state_inference(SubjectSelector::All, None)
        .await
        .unwrap();
    assert!(report.is_empty());
}

#[tokio::test]
async fn test_unknown_subject_is_not_found() {
    let store = scenario_store(vec![]).await;
    let err = engine(&store)
        .run_state_inference(SubjectSelector::One(Uuid::new_v4()), None)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_domain_filter_restricts_catalog() {
    let s = subject("ada", &[(SCENARIO.height, 190.0)]);
    let id = s.id;
    let store = scenario_store(vec![s]).await;
    store
        .insert_state(State {
            id: Uuid::new_v4(),
            name: "anyone".to_string(),
            domain: "misc".to_string(),
            conditions: vec![],
        })
        .await;

    let report = engine(&store)
        .run_state_inference(SubjectSelector::One(id), Some("body"))
        .await
        .unwrap();

    let names: Vec<&str> = report[0].matched.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["tall"]);
}

// ============================================================================
// Stage 2: behavior inference
// ============================================================================

#[tokio::test]
async fn test_athlete_requires_both_states() {
    let strong = subject("ada", &[(SCENARIO.height, 185.0), (SCENARIO.weight, 75.0)]);
    let heavy = subject("bo", &[(SCENARIO.height, 185.0), (SCENARIO.weight, 90.0)]);
    let strong_id = strong.id;
    let heavy_id = heavy.id;
    let store = scenario_store(vec![strong, heavy]).await;
    let engine = engine(&store);

    engine
        .run_state_inference(SubjectSelector::All, None)
        .await
        .unwrap();
    let report = engine
        .run_behavior_inference(SubjectSelector::All, None)
        .await
        .unwrap();

    let strong_report = report.iter().find(|r| r.id == strong_id).unwrap();
    assert_eq!(strong_report.matched.len(), 1);
    assert_eq!(strong_report.matched[0].name, "athlete");

    let heavy_report = report.iter().find(|r| r.id == heavy_id).unwrap();
    assert!(heavy_report.matched.is_empty());

    // Both derived sets are persisted
    assert_eq!(
        store.get_subject(strong_id).await.unwrap().behaviors,
        vec![SCENARIO.athlete.id]
    );
    assert!(store.get_subject(heavy_id).await.unwrap().behaviors.is_empty());
}

#[tokio::test]
async fn test_behavior_inference_reads_persisted_states() {
    // The subject's feature values support nothing, but a previously
    // persisted state set is what stage 2 actually consumes.
    let s = subject("ada", &[]);
    let id = s.id;
    let store = scenario_store(vec![s]).await;
    store
        .write_matched_states(id, vec![SCENARIO.tall.id, SCENARIO.fit.id])
        .await
        .unwrap();

    let report = engine(&store)
        .run_behavior_inference(SubjectSelector::One(id), None)
        .await
        .unwrap();

    assert_eq!(report[0].matched[0].name, "athlete");
}

#[tokio::test]
async fn test_behavior_inference_without_prior_state_run() {
    let s = subject("ada", &[(SCENARIO.height, 190.0)]);
    let id = s.id;
    let store = scenario_store(vec![s]).await;

    // No persisted states yet, so only empty-requirement behaviors match
    let report = engine(&store)
        .run_behavior_inference(SubjectSelector::One(id), None)
        .await
        .unwrap();
    assert!(report[0].matched.is_empty());
}

// ============================================================================
// Report bodies
// ============================================================================

#[tokio::test]
async fn test_report_body_shape() {
    let s = subject("ada", &[(SCENARIO.height, 190.0)]);
    let id = s.id;
    let store = scenario_store(vec![s]).await;

    let report = engine(&store)
        .run_state_inference(SubjectSelector::One(id), None)
        .await
        .unwrap();

    let body = report[0].to_body("states");
    assert_eq!(body["id"], json!(id));
    assert_eq!(body["alias"], json!("ada"));
    assert_eq!(body["age"], json!(14));
    assert_eq!(body["gender"], json!("f"));
    assert_eq!(body["states"][0]["name"], json!("tall"));
    assert_eq!(body["states"][0]["domain"], json!("body"));
    assert!(body.get("matched").is_none());
}

// ============================================================================
// Dataset-driven pipeline
// ============================================================================

const DATASET: &str = r#"
features:
  - { name: height, domain: body, unit: cm }
  - { name: weight, domain: body, unit: kg }

states:
  - name: tall
    domain: body
    conditions:
      - { feature: height, operator: gte, base: 180 }
  - name: fit
    domain: body
    conditions:
      - { feature: height, operator: gte, base: 170 }
      - { feature: weight, operator: lte, base: 80 }

behaviors:
  - name: athlete
    domain: sport
    states:
      - { state: tall }
      - { state: fit }

subjects:
  - alias: ada
    age: 14
    gender: f
    features:
      - { feature: height, value: 185 }
      - { feature: weight, value: 75 }
  - alias: bo
    age: 15
    gender: m
    features:
      - { feature: height, value: 185 }
      - { feature: weight, value: 90 }
"#;

#[tokio::test]
async fn test_full_pipeline_from_dataset() {
    let store = parse_dataset(DATASET).await.unwrap();
    let engine = engine(&store);

    engine
        .run_state_inference(SubjectSelector::All, None)
        .await
        .unwrap();
    let report = engine
        .run_behavior_inference(SubjectSelector::All, None)
        .await
        .unwrap();

    let ada = report.iter().find(|r| r.alias == "ada").unwrap();
    assert_eq!(ada.matched.len(), 1);
    assert_eq!(ada.matched[0].name, "athlete");

    let bo = report.iter().find(|r| r.alias == "bo").unwrap();
    assert!(bo.matched.is_empty());
}

// ============================================================================
// Store failure: abort without rollback
// ============================================================================

/// Subject store that refuses writes after the first `allowed` of them
struct FailingWrites {
    inner: MemoryStore,
    writes_left: AtomicUsize,
}

impl FailingWrites {
    fn new(inner: MemoryStore, allowed: usize) -> Self {
        Self {
            inner,
            writes_left: AtomicUsize::new(allowed),
        }
    }

    fn consume_write(&self) -> Result<(), StoreError> {
        let left = self.writes_left.load(Ordering::SeqCst);
        if left == 0 {
            return Err(StoreError::Unavailable("write refused".to_string()));
        }
        self.writes_left.store(left - 1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl SubjectStore for FailingWrites {
    async fn get_subject(&self, id: Uuid) -> Result<Subject, StoreError> {
        self.inner.get_subject(id).await
    }

    async fn list_subjects(
        &self,
        skip: Option<usize>,
        limit: Option<usize>,
    ) -> Result<Vec<Subject>, StoreError> {
        self.inner.list_subjects(skip, limit).await
    }

    async fn write_matched_states(&self, id: Uuid, states: Vec<Uuid>) -> Result<(), StoreError> {
        self.consume_write()?;
        self.inner.write_matched_states(id, states).await
    }

    async fn write_matched_behaviors(
        &self,
        id: Uuid,
        behaviors: Vec<Uuid>,
    ) -> Result<(), StoreError> {
        self.consume_write()?;
        self.inner.write_matched_behaviors(id, behaviors).await
    }
}

#[tokio::test]
async fn test_store_failure_aborts_run_keeping_earlier_writes() {
    let first = subject("ada", &[(SCENARIO.height, 190.0)]);
    let second = subject("bo", &[(SCENARIO.height, 190.0)]);
    let first_id = first.id;
    let second_id = second.id;
    let store = scenario_store(vec![first, second]).await;

    let engine = InferenceEngine::new(
        Arc::new(store.clone()),
        Arc::new(FailingWrites::new(store.clone(), 1)),
    );

    let err = engine
        .run_state_inference(SubjectSelector::All, None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Store(_)));

    // The first subject's write landed and stays; the second never ran
    let first_states = store.get_subject(first_id).await.unwrap().states;
    assert_eq!(first_states, vec![SCENARIO.tall.id]);
    assert!(store.get_subject(second_id).await.unwrap().states.is_empty());
}
