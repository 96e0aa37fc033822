//! Rubric catalog over YAML files on disk.

use scholia_core::{Error, InsightCategory, PaperType};
use scholia_extract::rubric::defaults;
use scholia_extract::{ConfidenceStrategy, RuleCatalog, ValidationPredicate};

const CUSTOM_RUBRIC: &str = r#"
id: robotics_case_study
name: Robotics Case Study
version: "2.0"
paper_types: [case_study]
domains: [robotics]
description: Field deployments of robot systems
independent_categories: [application]
quality_thresholds:
  auto_approve: 0.9
  manual_review: 0.7
  auto_reject: 0.2
extraction_rules:
  - insight_type: application
    prompt: Describe the deployment.
    expected_structure:
      problem_domain: string
      outcomes: [string]
    confidence_calculation:
      method: application_completeness
      required_fields: [problem_domain, outcomes]
    validation_rules:
      - problem_domain must not be empty
      - outcomes must have at least 2 items
    minimum_confidence: 0.55
  - insight_type: key_finding
    prompt: Extract the key finding.
    expected_structure:
      main_contribution: string
"#;

#[test]
fn test_bootstrap_writes_defaults_once() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = RuleCatalog::yaml(dir.path());

    assert_eq!(catalog.bootstrap().unwrap(), 6);
    assert!(dir.path().join("framework_default.yaml").is_file());
    assert_eq!(catalog.bootstrap().unwrap(), 0);

    let ids = catalog.list().unwrap();
    assert_eq!(
        ids,
        vec![
            "benchmark_default",
            "case_study_default",
            "empirical_default",
            "framework_default",
            "survey_default",
            "tutorial_default",
        ]
    );
    assert_eq!(
        *catalog.load("framework_default").unwrap(),
        defaults::framework_default()
    );
}

#[test]
fn test_custom_yaml_rubric_loads_with_defaults_filled() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("robotics_case_study.yaml"), CUSTOM_RUBRIC).unwrap();
    let catalog = RuleCatalog::yaml(dir.path());

    let rubric = catalog.load("robotics_case_study").unwrap();
    assert_eq!(rubric.version, "2.0");
    assert!(rubric.is_independent(InsightCategory::Application));
    assert!(!rubric.is_independent(InsightCategory::Methodology));

    let application = &rubric.extraction_rules[0];
    assert_eq!(
        application.confidence,
        ConfidenceStrategy::ApplicationCompleteness {
            required_fields: vec!["problem_domain".into(), "outcomes".into()],
            min_completeness: 0.75,
        }
    );
    assert_eq!(
        application.predicates,
        vec![
            ValidationPredicate::not_empty("problem_domain"),
            ValidationPredicate::min_items("outcomes", 2),
        ]
    );

    let key_finding = &rubric.extraction_rules[1];
    assert_eq!(key_finding.confidence, ConfidenceStrategy::default());
    assert!((key_finding.minimum_confidence - 0.5).abs() < f32::EPSILON);
}

#[test]
fn test_stored_rubric_wins_selection() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("robotics_case_study.yaml"), CUSTOM_RUBRIC).unwrap();
    let catalog = RuleCatalog::yaml(dir.path());
    catalog.bootstrap().unwrap();

    // case_study_default sorts first and also claims case studies.
    assert_eq!(
        catalog.select_for(Some(PaperType::CaseStudy)).id,
        "case_study_default"
    );

    std::fs::remove_file(dir.path().join("case_study_default.yaml")).unwrap();
    catalog.clear_cache();
    assert_eq!(
        catalog.select_for(Some(PaperType::CaseStudy)).id,
        "robotics_case_study"
    );
}

#[test]
fn test_unknown_confidence_method_is_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let broken = CUSTOM_RUBRIC.replace("application_completeness", "vibes");
    std::fs::write(dir.path().join("robotics_case_study.yaml"), broken).unwrap();
    let catalog = RuleCatalog::yaml(dir.path());

    let err = catalog.load("robotics_case_study").unwrap_err();
    assert!(matches!(err, Error::Config(_)));

    // Selection skips the broken file and falls back.
    assert_eq!(
        catalog.select_for(Some(PaperType::CaseStudy)).id,
        "case_study_default"
    );
}

#[test]
fn test_missing_directory_falls_back_to_builtins() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = RuleCatalog::yaml(dir.path().join("absent"));

    assert!(catalog.list().unwrap().is_empty());
    assert!(matches!(
        catalog.load("survey_default"),
        Err(Error::RubricNotFound(_))
    ));
    assert_eq!(
        catalog.select_for(Some(PaperType::TutorialMethodology)).id,
        "tutorial_default"
    );
    assert_eq!(catalog.select_for(None).id, "empirical_default");
}

#[test]
fn test_second_key_finding_rule_is_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let doubled = format!(
        "{CUSTOM_RUBRIC}  - insight_type: key_finding\n    prompt: Extract it again.\n    \
         expected_structure:\n      main_contribution: string\n"
    );
    let err = scholia_extract::rubric::store::parse_rubric(&doubled, "doubled").unwrap_err();
    assert!(err.to_string().contains("key_finding rules"));
    std::fs::write(dir.path().join("robotics_case_study.yaml"), doubled).unwrap();
    let catalog = RuleCatalog::yaml(dir.path());

    let err = catalog.load("robotics_case_study").unwrap_err();
    assert!(matches!(err, Error::Config(_)));
    assert_eq!(
        catalog.select_for(Some(PaperType::CaseStudy)).id,
        "case_study_default"
    );
}
