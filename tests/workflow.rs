use assert_fs::prelude::*;
use llm_qa_validator::{
    Config, Generator, Result, SectionStatus, SourceSpec, find_latest_report, generate, validate,
};
use std::fs;

struct Canned(&'static str);

impl Generator for Canned {
    fn generate(&self, _prompt: &str, _model: &str) -> Result<String> {
        Ok(self.0.to_string())
    }
}

const REPORT: &str = "The code lacks tests.\n\
--- GENERATED_TESTS ---\n\
def test_predict():\n    assert predict('good') == 'positive'\n\
--- REWRITTEN_PROMPTS ---\n\
{\"system\": \"Answer in one word.\"}\n\
--- DRIFT_MONITOR ---\n\
def check_drift(scores):\n    return max(scores) > 0.9\n";

fn workspace() -> (assert_fs::TempDir, Config) {
    let temp = assert_fs::TempDir::new().unwrap();
    temp.child("prompts/qa_unified_prompt.txt")
        .write_str("Review this code.")
        .unwrap();
    temp.child("apps/sentiment_analysis/app.py")
        .write_str("def predict(text):\n    return 'positive'\n")
        .unwrap();
    temp.child("apps/summarizer/pipeline/llm.py")
        .write_str("def summarize(q):\n    return q\n")
        .unwrap();
    temp.child("manifest.yaml")
        .write_str("entry_points:\n  - apps/sentiment_analysis/app.py\n  - apps/summarizer/pipeline/llm.py\n")
        .unwrap();

    let config = Config::builder()
        .prompt_file(temp.path().join("prompts/qa_unified_prompt.txt"))
        .apps_dir(temp.path().join("apps"))
        .generated_dir(temp.path().join("generated"))
        .results_dir(temp.path().join("results"))
        .manifest_file(temp.path().join("manifest.yaml"))
        .model("demo")
        .build()
        .unwrap();

    (temp, config)
}

#[test]
fn validate_then_generate() {
    let (temp, config) = workspace();

    let source = SourceSpec::select(None, None, true, &config.manifest_file).unwrap();
    let stats = validate(config.clone(), &source, &Canned(REPORT)).unwrap();
    assert_eq!(stats.source_files, 2);

    let report = find_latest_report(&config.results_dir).unwrap();
    assert_eq!(Some(report.clone()), stats.report_path);
    assert!(
        report
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("validation_report_demo_")
    );
    assert_eq!(fs::read_to_string(&report).unwrap(), REPORT);

    let summary = generate(config).unwrap();
    assert!(
        summary
            .sections
            .iter()
            .all(|s| s.status == SectionStatus::Generated)
    );
    assert_eq!(summary.apps, 2);
    assert_eq!(summary.artifacts_written, 6);

    temp.child("generated/sentiment_analysis/app/missing_tests.py")
        .assert("def test_predict():\n    assert predict('good') == 'positive'");
    temp.child("generated/summarizer/pipeline/llm/improved_prompts.json")
        .assert("{\"system\": \"Answer in one word.\"}");
    temp.child("generated/summarizer/pipeline/llm/drift_monitor.py")
        .assert("def check_drift(scores):\n    return max(scores) > 0.9");
}

#[test]
fn generate_twice_is_stable() {
    let (temp, config) = workspace();
    let code = temp.child("apps/sentiment_analysis/app.py");

    validate(
        config.clone(),
        &SourceSpec::File(code.path().to_path_buf()),
        &Canned(REPORT),
    )
    .unwrap();

    let first = generate(config.clone()).unwrap();
    let artifact = temp.child("generated/summarizer/pipeline/llm/missing_tests.py");
    let before = fs::read_to_string(artifact.path()).unwrap();

    let second = generate(config).unwrap();
    assert_eq!(first, second);
    assert_eq!(fs::read_to_string(artifact.path()).unwrap(), before);
}

#[test]
fn report_without_markers_writes_no_artifacts() {
    let (temp, config) = workspace();

    validate(
        config.clone(),
        &SourceSpec::Directory(config.apps_dir.clone()),
        &Canned("Everything looks fine."),
    )
    .unwrap();

    let summary = generate(config).unwrap();
    assert!(
        summary
            .sections
            .iter()
            .all(|s| s.status == SectionStatus::Missing)
    );
    assert_eq!(summary.artifacts_written, 0);
    assert!(!temp.child("generated/sentiment_analysis/app/missing_tests.py").exists());
}

#[test]
fn manifest_flag_without_manifest_is_no_source() {
    let temp = assert_fs::TempDir::new().unwrap();
    let err = SourceSpec::select(None, None, true, &temp.path().join("manifest.yaml")).unwrap_err();
    assert!(err.is_no_source());
}
