//! End-to-end pipeline tests against in-memory backends.
//!
//! Exercises the full batch → judge → report flow with mock responders, so
//! every stage reads real output from the previous one.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::{json, Value};

use evalforge::error::LlmError;
use evalforge::llm::agent::{AgentResponder, ChunkStream};
use evalforge::llm::openai::{ChatResponder, Choice, GenerationRequest, GenerationResponse, Message};
use evalforge::llm::retrieval::{KnowledgeBase, Passage};
use evalforge::llm::FoundationResponder;
use evalforge::pipeline::{
    BatchConfig, BatchRunner, ContextBuilder, JudgeConfig, JudgeRunner, Mode, ReportBuilder,
    ReportConfig, ResponseGenerator,
};
use evalforge::record::{AssessmentRecord, InteractionRecord};
use evalforge::store::{MemoryStore, ObjectStore};

/// Foundation responder that answers generation calls with canned text and
/// judge calls with a structured score payload, while counting invocations.
struct MockFoundation {
    calls: AtomicUsize,
}

impl MockFoundation {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl FoundationResponder for MockFoundation {
    async fn invoke(&self, _model_id: &str, body: Value) -> Result<Value, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if body.get("anthropic_version").is_some() {
            // Claude envelope: used as the judge in these tests.
            let score = r#"{"scores": {"helpfulness": 4, "accuracy": 4, "clarity": 5, "tone": 4, "conciseness": 3}, "urls": {"totalURLs": 1, "validURLs": 1}, "assessment": "Solid answer."}"#;
            Ok(json!({"content": [{"text": score}]}))
        } else {
            Ok(json!({"output": {"message": {"content": [{"text": "Visit https://dol.wa.gov to renew."}]}}}))
        }
    }
}

struct MockChat;

#[async_trait]
impl ChatResponder for MockChat {
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse, LlmError> {
        Ok(GenerationResponse {
            model: request.model,
            choices: vec![Choice {
                message: Message {
                    role: "assistant".to_string(),
                    content: "Check wa.gov for details.".to_string(),
                },
                finish_reason: Some("stop".to_string()),
            }],
        })
    }
}

struct MockAgent;

#[async_trait]
impl AgentResponder for MockAgent {
    async fn invoke_agent(
        &self,
        _agent_id: &str,
        _alias_id: &str,
        _session_id: &str,
        _input_text: &str,
    ) -> Result<ChunkStream, LlmError> {
        let chunks: Vec<Result<String, LlmError>> =
            vec![Ok("agent ".to_string()), Ok("answer".to_string())];
        Ok(Box::pin(futures::stream::iter(chunks)))
    }
}

struct MockKb;

#[async_trait]
impl KnowledgeBase for MockKb {
    async fn retrieve(&self, _kb_id: &str, _query: &str) -> Result<Vec<Passage>, LlmError> {
        Ok(vec![Passage {
            text: "License renewals are handled at dol.wa.gov".to_string(),
            score: 0.9,
            source: Some("https://dol.wa.gov".to_string()),
        }])
    }
}

fn generator() -> Arc<ResponseGenerator> {
    Arc::new(ResponseGenerator::new(
        Arc::new(MockFoundation::new()),
        Arc::new(MockChat),
        Arc::new(MockAgent),
        ContextBuilder::new(Arc::new(MockKb), None),
        "TSTALIASID",
    ))
}

fn batch_config(cohort_tag: &str) -> BatchConfig {
    BatchConfig::new(
        vec![
            "How do I renew my driver's license?".to_string(),
            "How do I register to vote?".to_string(),
            "How do I file for unemployment?".to_string(),
        ],
        vec![
            "us.amazon.nova-pro-v1:0".to_string(),
            "gpt-4o".to_string(),
        ],
        vec![Mode::KbWebsite],
    )
    .with_kb_id("kb-test")
    .with_cohort_tag(cohort_tag)
    .with_file_tag(cohort_tag)
    .with_storage_prefix("evaluation_data/batch/")
}

fn judge_config(cohort_tag: &str) -> JudgeConfig {
    JudgeConfig::new(
        "evaluation_data/batch/",
        cohort_tag,
        "us.anthropic.claude-3-5-sonnet-20241022-v2:0",
    )
    .with_output_prefix("evaluation_data/assess/")
}

#[tokio::test]
async fn batch_produces_one_record_per_unit() {
    let store = Arc::new(MemoryStore::new());
    let runner = BatchRunner::new(generator(), Arc::clone(&store) as Arc<dyn ObjectStore>);

    // 3 prompts x 2 models x 1 mode
    let summary = runner.run(&batch_config("run01")).await.expect("batch");
    assert_eq!(summary.dispatched, 6);
    assert_eq!(summary.persisted, 6);

    let keys = store.list("evaluation_data/batch/").await.expect("list");
    assert_eq!(keys.len(), 6);
    for key in keys {
        let bytes = store.get(&key).await.expect("get");
        let record = InteractionRecord::from_json(&String::from_utf8(bytes).expect("utf8"))
            .expect("decode");
        assert_eq!(record.cohort_tag, "run01");
        assert!(!record.question.is_empty());
        assert!(!record.response.is_empty());
    }
}

#[tokio::test]
async fn batch_output_is_identical_across_concurrency_limits() {
    for concurrency in [1, 10] {
        let store = Arc::new(MemoryStore::new());
        let runner = BatchRunner::new(generator(), Arc::clone(&store) as Arc<dyn ObjectStore>);

        let summary = runner
            .run(&batch_config("run01").with_concurrency(concurrency))
            .await
            .expect("batch");
        assert_eq!(summary.persisted, 6, "concurrency {concurrency}");
    }
}

#[tokio::test]
async fn judge_assesses_only_the_target_cohort() {
    let store = Arc::new(MemoryStore::new());
    let gen = generator();
    let batch = BatchRunner::new(Arc::clone(&gen), Arc::clone(&store) as Arc<dyn ObjectStore>);

    batch.run(&batch_config("cohort_a")).await.expect("batch a");
    batch.run(&batch_config("cohort_b")).await.expect("batch b");

    let judge = JudgeRunner::new(gen, Arc::clone(&store) as Arc<dyn ObjectStore>);
    let summary = judge.run(&judge_config("cohort_a")).await.expect("judge");

    assert_eq!(summary.scanned, 12);
    assert_eq!(summary.matched, 6);
    assert_eq!(summary.assessed, 6);

    let keys = store.list("evaluation_data/assess/").await.expect("list");
    assert_eq!(keys.len(), 6);
    for key in keys {
        let bytes = store.get(&key).await.expect("get");
        let assessment = AssessmentRecord::from_json(&String::from_utf8(bytes).expect("utf8"))
            .expect("decode");
        assert_eq!(assessment.cohort_tag, "cohort_a_assess");
        assert!(assessment.source_record_id.is_some());
        assert_eq!(assessment.response["scores"]["clarity"], 5);
    }
}

#[tokio::test]
async fn judge_skips_corrupt_records_and_continues() {
    let store = Arc::new(MemoryStore::new());
    let gen = generator();
    let batch = BatchRunner::new(Arc::clone(&gen), Arc::clone(&store) as Arc<dyn ObjectStore>);

    let mut config = batch_config("cohort_a");
    config.prompts = (0..10).map(|i| format!("question {i}")).collect();
    config.models = vec!["us.amazon.nova-pro-v1:0".to_string()];
    batch.run(&config).await.expect("batch");

    // Corrupt one of the ten persisted records in place.
    let keys = store.list("evaluation_data/batch/").await.expect("list");
    assert_eq!(keys.len(), 10);
    store
        .put(&keys[3], b"{\"cohort_tag\": \"cohort_a\", truncated")
        .await
        .expect("corrupt");

    let judge = JudgeRunner::new(gen, Arc::clone(&store) as Arc<dyn ObjectStore>);
    let summary = judge.run(&judge_config("cohort_a")).await.expect("judge");

    assert_eq!(summary.scanned, 10);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.assessed, 9);
}

#[tokio::test]
async fn report_flattens_assessments_to_csv() {
    let store = Arc::new(MemoryStore::new());
    let gen = generator();
    BatchRunner::new(Arc::clone(&gen), Arc::clone(&store) as Arc<dyn ObjectStore>)
        .run(&batch_config("run01"))
        .await
        .expect("batch");
    JudgeRunner::new(gen, Arc::clone(&store) as Arc<dyn ObjectStore>)
        .run(&judge_config("run01"))
        .await
        .expect("judge");

    let config = ReportConfig::new(
        "evaluation_data/assess/",
        vec![
            "response.scores.accuracy".to_string(),
            "response.assessment".to_string(),
            "assess_model".to_string(),
            "cohort_tag".to_string(),
            "missing.path".to_string(),
        ],
    );
    let bytes = ReportBuilder::new(Arc::clone(&store) as Arc<dyn ObjectStore>)
        .build(&config)
        .await
        .expect("report");
    let text = String::from_utf8(bytes).expect("utf8");
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(
        lines[0],
        "response.scores.accuracy,response.assessment,assess_model,cohort_tag,missing.path"
    );
    assert_eq!(lines.len(), 7); // header + 6 assessments
    for row in &lines[1..] {
        assert!(row.starts_with("4,Solid answer.,us.anthropic.claude-3-5-sonnet-20241022-v2:0,run01_assess,"));
        // Missing path flattens to an empty trailing cell.
        assert!(row.ends_with("run01_assess,"));
    }
}
