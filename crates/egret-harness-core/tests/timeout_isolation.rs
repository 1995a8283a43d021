//! A pattern that hangs, stalls or panics must not stall or sink its batch.

use std::sync::Arc;
use std::time::{Duration, Instant};

use egret_harness_core::fakes::{EngineScript, ScriptedEngine, StallingMatcher};
use egret_harness_core::{
    BatchOrchestrator, HarnessConfig, PatternEntry, PatternMatcher, RecordStatus, RegexMatcher,
    ThrownBy, METRICS,
};

const SHORT_MS: u64 = 100;

/// Generous slack for scheduler jitter on loaded CI machines.
const OVERHEAD: Duration = Duration::from_secs(2);

fn short_deadlines() -> HarnessConfig {
    HarnessConfig {
        generation_timeout_ms: SHORT_MS,
        validation_timeout_ms: SHORT_MS,
        ..HarnessConfig::default()
    }
}

fn batch(
    engine: ScriptedEngine,
    matcher: Arc<dyn PatternMatcher>,
    config: HarnessConfig,
) -> BatchOrchestrator {
    BatchOrchestrator::new(Arc::new(engine), matcher, &config).expect("valid config")
}

fn entries(patterns: &[&str]) -> Vec<PatternEntry> {
    patterns.iter().map(|p| PatternEntry::from(*p)).collect()
}

#[tokio::test]
async fn hanging_engine_times_out_and_batch_continues() {
    let engine = ScriptedEngine::new()
        .script("hang", EngineScript::Hang)
        .respond("a", &["BEGIN", "a"]);
    let orch = batch(engine, Arc::new(RegexMatcher::new()), short_deadlines());

    let started = Instant::now();
    let report = orch.run(entries(&["hang", "a"])).await;
    assert!(started.elapsed() < Duration::from_millis(SHORT_MS) + OVERHEAD);

    assert_eq!(report.records.len(), 2);
    let hung = &report.records[0];
    assert_eq!(hung.status, RecordStatus::Timeout);
    assert_eq!(
        hung.exception_stack_trace.as_ref().unwrap().thrown_by,
        ThrownBy::Egret
    );
    assert_eq!(report.records[1].status, RecordStatus::Ok);
    assert_eq!(report.records[1].matches, vec!["a"]);
    assert!(METRICS.generation_timeouts() >= 1);
}

#[tokio::test]
async fn slow_compile_counts_against_generation_deadline() {
    let matcher = StallingMatcher::new(Duration::from_secs(5)).on_patterns(&["stuck"]);
    let orch = batch(ScriptedEngine::new(), Arc::new(matcher), short_deadlines());

    let started = Instant::now();
    let report = orch.run(entries(&["stuck", "ok"])).await;
    assert!(started.elapsed() < Duration::from_millis(SHORT_MS) + OVERHEAD);

    assert_eq!(report.records[0].status, RecordStatus::Timeout);
    assert_eq!(report.records[1].status, RecordStatus::Ok);
}

#[tokio::test]
async fn stalled_candidate_truncates_only_its_own_record() {
    let engine = ScriptedEngine::new()
        .respond("a", &["BEGIN", "a", "b", "slow", "aa"])
        .respond("c", &["BEGIN", "c"]);
    let matcher = StallingMatcher::new(Duration::from_secs(5)).on_candidates(&["slow"]);
    let orch = batch(engine, Arc::new(matcher), short_deadlines());

    let started = Instant::now();
    let report = orch.run(entries(&["a", "c"])).await;
    assert!(started.elapsed() < Duration::from_millis(SHORT_MS) + OVERHEAD);

    let first = &report.records[0];
    assert_eq!(first.status, RecordStatus::Ok);
    assert!(first.exception_stack_trace.is_none());
    assert!(first.truncated);
    assert_eq!(first.matches, vec!["a"]);
    assert_eq!(first.non_matches, vec!["b"]);
    assert!(first.matches.len() + first.non_matches.len() < 4);

    let second = &report.records[1];
    assert!(!second.truncated);
    assert_eq!(second.matches, vec!["c"]);
    assert_eq!(report.summary.truncated, 1);
}

#[tokio::test]
async fn matcher_refusal_truncates_like_a_stall() {
    let engine = ScriptedEngine::new().respond("a", &["BEGIN", "a", "b", "heavy", "aa"]);
    let matcher = StallingMatcher::new(Duration::from_secs(5)).on_refused(&["heavy"]);
    let report = batch(engine, Arc::new(matcher), HarnessConfig::default())
        .run(entries(&["a"]))
        .await;

    let record = &report.records[0];
    assert_eq!(record.status, RecordStatus::Ok);
    assert!(record.exception_stack_trace.is_none());
    assert!(record.truncated);
    assert_eq!(record.matches, vec!["a"]);
    assert_eq!(record.non_matches, vec!["b"]);
    assert!(METRICS.matcher_refusals() >= 1);
}

#[tokio::test]
async fn panicking_engine_is_contained() {
    let engine = ScriptedEngine::new()
        .script("boom", EngineScript::Panic("engine blew up".to_string()))
        .respond("a", &["BEGIN", "a"]);
    let orch = batch(engine, Arc::new(RegexMatcher::new()), HarnessConfig::default());

    let report = orch.run(entries(&["boom", "a"])).await;

    assert_eq!(report.records.len(), 2);
    let record = &report.records[0];
    assert_eq!(record.status, RecordStatus::UnexpectedError);
    let trace = record.exception_stack_trace.as_ref().unwrap();
    assert_eq!(trace.thrown_by, ThrownBy::Egret);
    assert!(trace.message.contains("engine blew up"));
    assert_eq!(report.records[1].status, RecordStatus::Ok);
}

#[tokio::test]
async fn each_pattern_gets_a_fresh_deadline() {
    // Each answer takes most of the budget; a shared budget would expire.
    let delay = Duration::from_millis(120);
    let answer = vec!["BEGIN".to_string()];
    let engine = ScriptedEngine::new()
        .script("x", EngineScript::Delayed(delay, answer.clone()))
        .script("y", EngineScript::Delayed(delay, answer.clone()))
        .script("z", EngineScript::Delayed(delay, answer));
    let config = HarnessConfig {
        generation_timeout_ms: 300,
        ..HarnessConfig::default()
    };
    let report = batch(engine, Arc::new(RegexMatcher::new()), config)
        .run(entries(&["x", "y", "z"]))
        .await;

    assert!(report.records.iter().all(|r| r.status == RecordStatus::Ok));
}

#[tokio::test]
async fn concurrent_hangs_do_not_block_siblings() {
    let engine = ScriptedEngine::new()
        .script("h1", EngineScript::Hang)
        .script("h2", EngineScript::Hang)
        .respond("a", &["BEGIN", "a"]);
    let config = HarnessConfig {
        jobs: 3,
        ..short_deadlines()
    };
    let orch = batch(engine, Arc::new(RegexMatcher::new()), config);

    let started = Instant::now();
    let report = orch.run(entries(&["h1", "a", "h2"])).await;
    assert!(started.elapsed() < Duration::from_millis(SHORT_MS) + OVERHEAD);

    let statuses: Vec<RecordStatus> = report.records.iter().map(|r| r.status).collect();
    assert_eq!(
        statuses,
        vec![RecordStatus::Timeout, RecordStatus::Ok, RecordStatus::Timeout]
    );
}

#[cfg(unix)]
#[tokio::test]
async fn subprocess_engine_is_killed_at_deadline() {
    use egret_harness_core::CommandEngine;

    let engine = CommandEngine::new("sh").with_args(vec!["-c".to_string(), "sleep 30".to_string()]);
    let config = short_deadlines();
    let orch = BatchOrchestrator::new(Arc::new(engine), Arc::new(RegexMatcher::new()), &config)
        .expect("valid config");

    let started = Instant::now();
    let report = orch.run(entries(&["a"])).await;
    assert!(started.elapsed() < Duration::from_millis(SHORT_MS) + OVERHEAD);
    assert_eq!(report.records[0].status, RecordStatus::Timeout);
}

#[cfg(unix)]
#[tokio::test]
async fn subprocess_engine_output_is_validated() {
    use egret_harness_core::CommandEngine;

    let engine = CommandEngine::new("sh").with_args(vec![
        "-c".to_string(),
        r#"echo '["alert: star height 2","BEGIN","aa","ab"]'"#.to_string(),
    ]);
    let orch = BatchOrchestrator::new(
        Arc::new(engine),
        Arc::new(RegexMatcher::new()),
        &HarnessConfig::default(),
    )
    .expect("valid config");

    let report = orch.run(entries(&["^a+$"])).await;
    let record = &report.records[0];
    assert_eq!(record.status, RecordStatus::Ok);
    assert_eq!(record.alerts, vec!["alert: star height 2"]);
    assert_eq!(record.matches, vec!["aa"]);
    assert_eq!(record.non_matches, vec!["ab"]);
}
