//! End-to-end pipeline behavior against the mock backend.

use std::io;
use std::sync::{Arc, Mutex};

use serde_json::json;

use scholia_core::logging;
use scholia_core::{
    Insight, InsightCategory, JsonMap, Paper, PaperType, TagCategory, TagRepository, TagSource,
};
use scholia_extract::rubric::defaults;
use scholia_extract::{
    ExtractionConfig, InMemoryRubricStore, InMemoryTagRepository, ReasoningPipeline,
    ReviewDecision, Rubric, RuleCatalog,
};
use scholia_inference::mock::{MockBackend, MockReply};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Collects formatted log lines for assertions.
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn pipeline_with(
    mock: &MockBackend,
    tags: Arc<InMemoryTagRepository>,
    config: ExtractionConfig,
) -> ReasoningPipeline {
    let backend = Arc::new(mock.clone());
    let catalog = Arc::new(RuleCatalog::new(Arc::new(InMemoryRubricStore::new())));
    ReasoningPipeline::new(backend.clone(), backend, tags, catalog, config)
}

/// Framework rubric stored under its own id, with no key-finding rule.
fn rubric_without_key_finding() -> Rubric {
    let mut rubric = defaults::framework_default();
    rubric.id = "agent_frameworks".into();
    rubric
        .extraction_rules
        .retain(|r| r.category != InsightCategory::KeyFinding);
    rubric
}

fn pipeline_over(
    mock: &MockBackend,
    rubric: Rubric,
    config: ExtractionConfig,
) -> ReasoningPipeline {
    let backend = Arc::new(mock.clone());
    let store = InMemoryRubricStore::with_rubrics([rubric]);
    let catalog = Arc::new(RuleCatalog::new(Arc::new(store)));
    ReasoningPipeline::new(
        backend.clone(),
        backend,
        Arc::new(InMemoryTagRepository::new()),
        catalog,
        config,
    )
}

fn pipeline(mock: &MockBackend) -> ReasoningPipeline {
    pipeline_with(
        mock,
        Arc::new(InMemoryTagRepository::new()),
        ExtractionConfig::default(),
    )
}

fn context_steps(mock: MockBackend) -> MockBackend {
    mock.with_extract(
        "Step 1 of 5",
        MockReply::json(json!({
            "reasoning": "Architecture paper.",
            "domain": "natural language processing",
            "scope": "sequence transduction",
            "topics": ["attention"]
        })),
    )
    .with_extract(
        "Step 2 of 5",
        MockReply::json(json!({
            "reasoning": "Recurrence limits parallelism.",
            "problem_statement": "Slow recurrent training",
            "hypotheses": ["Attention suffices"],
            "methodology": "Attention-only encoder-decoder"
        })),
    )
    .with_extract(
        "Step 3 of 5",
        MockReply::json(json!({
            "reasoning": "BLEU improves.",
            "main_contributions": ["Transformer"],
            "key_findings": ["New state of the art"],
            "novel_techniques": ["Multi-head attention"]
        })),
    )
    .with_extract(
        "Step 4 of 5",
        MockReply::json(json!({
            "reasoning": "Broad uptake.",
            "applications": ["translation"],
            "target_audiences": ["NLP engineers"],
            "implementation_considerations": ["memory"]
        })),
    )
}

fn key_finding(contribution: &str) -> MockReply {
    MockReply::json(json!({
        "main_contribution": contribution,
        "significance": "Removes recurrence",
        "practical_impact": "Faster training",
        "surprising_insight": "Simple beats complex",
        "problem_solved": "Sequential bottleneck",
        "audience_hook": "No more RNNs",
        "field_advancement": "Basis for modern language models"
    }))
}

fn minimum_for(category: InsightCategory) -> f32 {
    defaults::all()
        .iter()
        .flat_map(|r| r.extraction_rules.iter())
        .filter(|rule| rule.category == category)
        .map(|rule| rule.minimum_confidence)
        .fold(f32::INFINITY, f32::min)
}

#[tokio::test]
async fn test_abstract_only_paper_with_empty_replies_is_not_an_error() {
    init_tracing();
    let mock = MockBackend::new();
    let paper = Paper::new("Scaling Laws")
        .with_abstract("We study how loss scales with compute.")
        .with_type(PaperType::EmpiricalStudy);

    let output = pipeline(&mock).process(&paper).await;

    assert_eq!(output.rubric.id, "empirical_default");
    assert!(output.insights.is_empty());
    assert!(output.tags.is_empty());
    // Five chain steps, then the key finding and data-point rules.
    assert_eq!(mock.extract_call_count(), 7);
}

#[tokio::test]
async fn test_abstract_only_paper_insights_meet_rule_minimums() {
    let mock = context_steps(MockBackend::new())
        .with_extract("Step 5 of 5", key_finding("A survey of attention"))
        .with_default_extract(json!({"research_domain": "nlp"}));
    let paper = Paper::new("Attention Survey")
        .with_abstract("A survey.")
        .with_type(PaperType::SurveyReview);

    let insights = pipeline(&mock).extract(&paper).await;

    assert!(!insights.is_empty());
    for insight in &insights {
        assert!(insight.confidence >= minimum_for(insight.category));
        assert!(insight.confidence <= 1.0);
    }
}

#[tokio::test]
async fn test_synthesis_failure_falls_back_to_single_shot() {
    init_tracing();
    let mock = context_steps(
        MockBackend::new().with_extract("Step 5 of 5", MockReply::fail("model overloaded")),
    )
    .with_extract("Extract the key finding", key_finding("Attention is enough"));
    let paper = Paper::new("Attention Is All You Need")
        .with_abstract("Transformers.")
        .with_type(PaperType::SurveyReview);
    let pipeline = pipeline(&mock);
    let rubric = pipeline.catalog().select_for(paper.paper_type);

    let chain = pipeline.extract_chain_of_thought(&paper, &rubric).await;
    assert!(chain.insights.is_empty());

    let insights = pipeline.extract(&paper).await;
    assert_eq!(insights.len(), 1);
    assert_eq!(insights[0].category, InsightCategory::KeyFinding);
    assert_eq!(insights[0].extraction_method, "rubric_key_finding_enhanced");
}

#[tokio::test]
async fn test_chain_key_finding_keeps_independent_rules() {
    let mock = context_steps(MockBackend::new())
        .with_extract("Step 5 of 5", key_finding("A composable agent framework"))
        .with_extract(
            "Identify the main framework",
            MockReply::json(json!({
                "name": "AgentKit",
                "core_concept": "Composable agents",
                "components": ["planner", "memory"],
                "innovations": ["component registry"],
                "architecture": "layered",
                "comparison_to_existing": "more modular"
            })),
        )
        .with_extract(
            "Describe the step-by-step",
            MockReply::json(json!({
                "steps": [{"step": "a"}, {"step": "b"}, {"step": "c"}],
                "inputs": ["spec"],
                "outputs": ["agent"],
                "validation_approach": "benchmarks"
            })),
        );
    let paper = Paper::new("AgentKit")
        .with_abstract("A framework architecture with component design.")
        .with_type(PaperType::ConceptualFramework);

    let insights = pipeline(&mock).extract(&paper).await;

    let labels: Vec<(InsightCategory, &str)> = insights
        .iter()
        .map(|i| (i.category, i.extraction_method.as_str()))
        .collect();
    assert_eq!(
        labels,
        vec![
            (InsightCategory::KeyFinding, "chain_of_thought"),
            (InsightCategory::Framework, "rubric_framework"),
            (InsightCategory::Methodology, "rubric_methodology"),
        ]
    );
}

#[tokio::test]
async fn test_chain_disabled_goes_straight_to_single_shot() {
    let mock = MockBackend::new().with_extract("Extract the key finding", key_finding("x"));
    let config = ExtractionConfig {
        chain_of_thought: false,
        ..ExtractionConfig::default()
    };
    let pipeline = pipeline_with(&mock, Arc::new(InMemoryTagRepository::new()), config);
    let paper = Paper::new("Survey").with_type(PaperType::PositionPaper);

    let insights = pipeline.extract(&paper).await;

    assert_eq!(insights.len(), 1);
    assert_eq!(mock.calls_containing("Step 1 of 5"), 0);
}

#[tokio::test]
async fn test_process_derives_and_reuses_labels_across_papers() {
    init_tracing();
    let mock = context_steps(MockBackend::new())
        .with_extract("Step 5 of 5", key_finding("Attention replaces recurrence"))
        .with_generation(
            "Input term: \"attention-mechanism\"",
            MockReply::text("attention-mechanism"),
        );
    let tags = Arc::new(InMemoryTagRepository::new());
    let pipeline = pipeline_with(&mock, tags.clone(), ExtractionConfig::default());

    let first = Paper::new("Paper one").with_type(PaperType::SurveyReview);
    let second = Paper::new("Paper two").with_type(PaperType::SurveyReview);

    let out1 = pipeline.process(&first).await;
    let out2 = pipeline.process(&second).await;

    assert_eq!(out1.tags.len(), 1);
    assert_eq!(out1.tags[0].name, "attention-mechanism");
    assert_eq!(out2.tags[0].id, out1.tags[0].id);
    assert_eq!(tags.all().await.len(), 1);

    let link = &out2.associations[0];
    assert_eq!(link.paper_id, second.id);
    assert_eq!(link.source, TagSource::Automatic);
    assert!((link.confidence - 0.8).abs() < f32::EPSILON);
    assert_eq!(out2.review(&out2.insights[0]), ReviewDecision::AutoApprove);
}

#[tokio::test]
async fn test_derive_tags_deduplicates_per_paper() {
    let mock = MockBackend::new()
        .with_dimension(3)
        .with_embedding("transformer", vec![1.0, 0.0, 0.0])
        .with_embedding("attention-mechanism", vec![0.0, 1.0, 0.0])
        .with_generation("Input term: \"transformer\"", MockReply::text("transformer"))
        .with_generation(
            "Input term: \"attention-mechanism\"",
            MockReply::text("attention-mechanism"),
        );
    let tags = Arc::new(InMemoryTagRepository::new());
    let pipeline = pipeline_with(&mock, tags.clone(), ExtractionConfig::default());

    let paper_id = uuid::Uuid::now_v7();
    let content = |value: serde_json::Value| -> JsonMap { value.as_object().cloned().unwrap() };
    let insights = vec![
        Insight::new(
            paper_id,
            InsightCategory::KeyFinding,
            "Key Finding Insight",
            "d",
            content(json!({"main_contribution": "Transformer attention"})),
            0.9,
            "chain_of_thought",
        )
        .unwrap(),
        Insight::new(
            paper_id,
            InsightCategory::Framework,
            "Framework: Transformer",
            "d",
            content(json!({"name": "Transformer", "components": []})),
            0.9,
            "rubric_framework",
        )
        .unwrap(),
    ];

    let derivation = pipeline.derive_tags(&insights).await;

    let names: Vec<&str> = derivation.tags.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["transformer", "attention-mechanism"]);
    assert_eq!(derivation.associations.len(), 2);
    assert_eq!(
        tags.list_by_category(TagCategory::Concept).await.unwrap().len(),
        2
    );
}

#[tokio::test]
async fn test_process_logs_schema_fields() {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let mock = MockBackend::new();
    let paper = Paper::new("Logged").with_type(PaperType::CaseStudy);
    pipeline(&mock).process(&paper).await;

    let output = logs.contents();
    assert!(output.contains("Paper processed"));
    for field in [
        logging::SUBSYSTEM,
        logging::OPERATION,
        logging::PAPER_ID,
        logging::RUBRIC_ID,
        logging::MODEL,
        logging::RESULT_COUNT,
        logging::DURATION_MS,
    ] {
        assert!(
            output.contains(&format!("{field}=")),
            "missing {field} in:\n{output}"
        );
    }
    assert!(output.contains(&paper.id.to_string()));
}

#[tokio::test]
async fn test_single_shot_without_key_finding_rule_still_synthesizes() {
    let mock = MockBackend::new()
        .with_extract("Extract the key finding", key_finding("Composable agents"))
        .with_extract(
            "Identify the main framework",
            MockReply::json(json!({
                "name": "AgentKit",
                "core_concept": "Composable agents",
                "components": ["planner", "memory"],
                "innovations": ["component registry"],
                "architecture": "layered",
                "comparison_to_existing": "more modular"
            })),
        );
    let config = ExtractionConfig {
        chain_of_thought: false,
        ..ExtractionConfig::default()
    };
    let pipeline = pipeline_over(&mock, rubric_without_key_finding(), config);
    let paper = Paper::new("AgentKit")
        .with_abstract("A framework architecture with component design.")
        .with_type(PaperType::ConceptualFramework);

    let output = pipeline.process(&paper).await;

    assert_eq!(output.rubric.id, "agent_frameworks");
    assert_eq!(output.insights[0].category, InsightCategory::KeyFinding);
    assert_eq!(
        output.insights[0].extraction_method,
        "rubric_key_finding_enhanced"
    );
    assert!(output
        .insights
        .iter()
        .any(|i| i.category == InsightCategory::Framework));
}

#[tokio::test]
async fn test_chain_without_key_finding_rule_still_synthesizes() {
    let mock = context_steps(MockBackend::new())
        .with_extract("Step 5 of 5", key_finding("Composable agents"));
    let pipeline = pipeline_over(
        &mock,
        rubric_without_key_finding(),
        ExtractionConfig::default(),
    );
    let paper = Paper::new("AgentKit").with_type(PaperType::ConceptualFramework);

    let insights = pipeline.extract(&paper).await;

    assert_eq!(insights[0].category, InsightCategory::KeyFinding);
    assert_eq!(insights[0].extraction_method, "chain_of_thought");
    assert_eq!(mock.calls_containing("Extract the key finding and main contribution"), 1);
}
