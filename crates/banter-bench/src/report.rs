//! Aggregation and persistence of benchmark results.
//!
//! [`analyze`] folds raw records into per-category summaries, overall
//! totals, and multiple-choice accuracy; [`save_report`] writes the whole
//! thing to a timestamped JSON file. Saving degrades rather than fails: if
//! the aggregated report cannot be serialized, the raw results plus the
//! error are saved instead, so a long run is never lost at the last step.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use serde::Serialize;
use tracing::warn;

use crate::runner::{CategoryResults, RunResults, is_error_text};

/// Names of the embedded sample sets, recorded in report metadata.
pub const DATASET_NAMES: [&str; 5] = [
    "TruthfulQA_samples",
    "MMLU_Law_samples",
    "ARC_Easy_samples",
    "Custom_scenarios",
    "Adversarial_prompts",
];

// ── Analysis ───────────────────────────────────────────────────────

/// Aggregated view of one category.
#[derive(Debug, Clone, Serialize)]
pub struct CategorySummary {
    pub total_questions: usize,
    pub errors: usize,
    /// Share of calls that produced model output rather than an error.
    pub success_rate: f64,
    /// Mean timing of completed calls; zero when none completed.
    pub avg_response_time: f64,
}

/// Run-wide totals.
#[derive(Debug, Clone, Serialize)]
pub struct PerformanceMetrics {
    pub total_questions: usize,
    pub total_errors: usize,
    pub overall_success_rate: f64,
    /// Mean of the per-category averages, not of all raw timings.
    pub avg_response_time: f64,
}

/// Multiple-choice accuracy for one category.
#[derive(Debug, Clone, Serialize)]
pub struct ChoiceAccuracy {
    pub accuracy: f64,
    pub correct_answers: usize,
    pub total_mc_questions: usize,
}

/// Everything [`analyze`] derives from a run.
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    pub summary: BTreeMap<String, CategorySummary>,
    pub performance_metrics: PerformanceMetrics,
    /// Choice accuracy, present only for categories with scored items.
    pub detailed_analysis: BTreeMap<String, ChoiceAccuracy>,
}

/// Fold raw results into summaries, totals, and choice accuracy.
pub fn analyze(results: &RunResults) -> Analysis {
    let mut summary = BTreeMap::new();
    let mut total_questions = 0;
    let mut total_errors = 0;
    let mut avg_sum = 0.0;

    for (name, category) in &results.tests {
        let count = category.interaction_count();
        let errors = category.error_count();
        let times = category.completed_times();
        let avg = if times.is_empty() {
            0.0
        } else {
            times.iter().sum::<f64>() / times.len() as f64
        };
        let success_rate = if count > 0 {
            (count - errors) as f64 / count as f64
        } else {
            0.0
        };
        summary.insert(
            name.clone(),
            CategorySummary {
                total_questions: count,
                errors,
                success_rate,
                avg_response_time: avg,
            },
        );
        total_questions += count;
        total_errors += errors;
        avg_sum += avg;
    }

    let performance_metrics = PerformanceMetrics {
        total_questions,
        total_errors,
        overall_success_rate: if total_questions > 0 {
            (total_questions - total_errors) as f64 / total_questions as f64
        } else {
            0.0
        },
        avg_response_time: if !results.tests.is_empty() && avg_sum > 0.0 {
            avg_sum / results.tests.len() as f64
        } else {
            0.0
        },
    };

    let mut detailed_analysis = BTreeMap::new();
    for (name, category) in &results.tests {
        if let CategoryResults::Knowledge(items) = category {
            let mut correct = 0;
            let mut scored = 0;
            for item in items {
                if let Some(expected) = &item.correct_answer
                    && !is_error_text(&item.response)
                {
                    scored += 1;
                    if choice_is_correct(&item.response, expected) {
                        correct += 1;
                    }
                }
            }
            if scored > 0 {
                detailed_analysis.insert(
                    name.clone(),
                    ChoiceAccuracy {
                        accuracy: correct as f64 / scored as f64,
                        correct_answers: correct,
                        total_mc_questions: scored,
                    },
                );
            }
        }
    }

    Analysis {
        summary,
        performance_metrics,
        detailed_analysis,
    }
}

/// Whether a multiple-choice response names the expected letter.
///
/// Looks for the letter within the first three characters of the trimmed,
/// uppercased response. Loose on purpose: it accepts "C", "C)", and
/// "C. because", but a verbose answer that buries its letter later is
/// counted wrong, and an unrelated early letter can count right.
pub fn choice_is_correct(response: &str, expected: &str) -> bool {
    let head: String = response.trim().to_uppercase().chars().take(3).collect();
    head.contains(&expected.to_uppercase())
}

// ── Persistence ────────────────────────────────────────────────────

#[derive(Serialize)]
struct Report<'a> {
    test_results: &'a RunResults,
    analysis: &'a Analysis,
    metadata: ReportMetadata,
}

#[derive(Serialize)]
struct ReportMetadata {
    test_type: String,
    datasets_used: Vec<String>,
    total_questions: usize,
    test_duration_estimate: String,
}

fn build_metadata(analysis: &Analysis) -> ReportMetadata {
    let metrics = &analysis.performance_metrics;
    let estimate = if metrics.avg_response_time > 0.0 && metrics.total_questions > 0 {
        let minutes = metrics.avg_response_time * metrics.total_questions as f64 / 60.0;
        format!("{minutes:.1} minutes")
    } else {
        "N/A".to_string()
    };
    ReportMetadata {
        test_type: "comprehensive_benchmark".to_string(),
        datasets_used: DATASET_NAMES.iter().map(|n| (*n).to_string()).collect(),
        total_questions: metrics.total_questions,
        test_duration_estimate: estimate,
    }
}

/// Analyze `results` and write the full report under `out_dir`.
///
/// The filename embeds the wall-clock time, so every run gets its own
/// file. Returns the path and the analysis for display.
pub fn save_report(results: &RunResults, out_dir: &Path) -> Result<(PathBuf, Analysis), String> {
    let analysis = analyze(results);
    fs::create_dir_all(out_dir)
        .map_err(|e| format!("failed to create {}: {e}", out_dir.display()))?;
    let filename = format!(
        "banter_benchmark_results_{}.json",
        Local::now().format("%Y%m%d_%H%M%S")
    );
    let path = out_dir.join(filename);

    let report = Report {
        test_results: results,
        analysis: &analysis,
        metadata: build_metadata(&analysis),
    };
    write_report(serde_json::to_string_pretty(&report), results, &path)?;
    Ok((path, analysis))
}

/// Write a rendered report to `path`. A failed rendering falls back to the
/// raw results plus the error, so collected data survives the save step.
fn write_report(
    rendered: serde_json::Result<String>,
    results: &RunResults,
    path: &Path,
) -> Result<(), String> {
    let body = match rendered {
        Ok(body) => body,
        Err(e) => {
            warn!("report aggregation failed, saving raw results instead: {e}");
            let fallback = serde_json::json!({
                "test_results": results,
                "error": e.to_string(),
            });
            serde_json::to_string_pretty(&fallback)
                .map_err(|e| format!("failed to serialize raw results: {e}"))?
        }
    };
    fs::write(path, body).map_err(|e| format!("failed to write {}: {e}", path.display()))
}

/// Print a readable run summary to stdout.
pub fn print_summary(results: &RunResults, analysis: &Analysis) {
    let metrics = &analysis.performance_metrics;
    println!();
    println!("Benchmark summary for {}", results.model);
    println!(
        "  overall: {} interactions, {} errors, {:.1}% served, {:.2}s avg",
        metrics.total_questions,
        metrics.total_errors,
        metrics.overall_success_rate * 100.0,
        metrics.avg_response_time,
    );

    for (name, summary) in &analysis.summary {
        print!(
            "  {name}: {} questions, {:.1}% served, {:.2}s avg",
            summary.total_questions,
            summary.success_rate * 100.0,
            summary.avg_response_time,
        );
        if let Some(accuracy) = analysis.detailed_analysis.get(name) {
            print!(
                ", choice accuracy {:.1}% ({}/{})",
                accuracy.accuracy * 100.0,
                accuracy.correct_answers,
                accuracy.total_mc_questions,
            );
        }
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::{KnowledgeRecord, OpenRecord, ScenarioRecord, TurnRecord};

    fn knowledge_record(
        response: &str,
        response_time: f64,
        answer: Option<&str>,
    ) -> KnowledgeRecord {
        KnowledgeRecord {
            question: "q".to_string(),
            formatted_question: "q formatted".to_string(),
            response: response.to_string(),
            response_time,
            choices: vec!["one".to_string(), "two".to_string(), "three".to_string()],
            correct_answer: answer.map(str::to_string),
            category: "law_knowledge".to_string(),
        }
    }

    fn open_record(response: &str, response_time: f64) -> OpenRecord {
        OpenRecord {
            question: "q".to_string(),
            response: response.to_string(),
            response_time,
            category: "truthfulness".to_string(),
        }
    }

    fn sample_results() -> RunResults {
        let mut tests = BTreeMap::new();
        tests.insert(
            "truthfulqa".to_string(),
            CategoryResults::Open(vec![
                open_record("The brain weighs about 1.4 kg.", 2.0),
                open_record("ERROR: generation failed: boom", 0.0),
            ]),
        );
        tests.insert(
            "mmlu_law".to_string(),
            CategoryResults::Knowledge(vec![
                knowledge_record("C) the Article IV clause", 1.0, Some("C")),
                knowledge_record("The answer is B", 3.0, Some("C")),
                knowledge_record("A contract needs offer and acceptance.", 2.0, None),
            ]),
        );
        RunResults {
            timestamp: "2026-01-01T00:00:00".to_string(),
            model: "test-model".to_string(),
            tests,
        }
    }

    #[test]
    fn lenient_scoring_checks_the_first_three_characters() {
        assert!(choice_is_correct("C) because the clause applies", "C"));
        assert!(choice_is_correct("  c. something", "C"));
        assert!(choice_is_correct("C", "C"));
        assert!(!choice_is_correct("The answer is B", "C"));
        assert!(!choice_is_correct("B", "C"));
        // Known looseness: any early occurrence of the letter counts.
        assert!(choice_is_correct("ABC are all wrong", "C"));
    }

    #[test]
    fn summaries_count_errors_and_average_completed_calls_only() {
        let analysis = analyze(&sample_results());

        let truthful = &analysis.summary["truthfulqa"];
        assert_eq!(truthful.total_questions, 2);
        assert_eq!(truthful.errors, 1);
        assert_eq!(truthful.success_rate, 0.5);
        // The failed call's zero timing is excluded, not averaged in.
        assert_eq!(truthful.avg_response_time, 2.0);

        let law = &analysis.summary["mmlu_law"];
        assert_eq!(law.total_questions, 3);
        assert_eq!(law.errors, 0);
        assert_eq!(law.avg_response_time, 2.0);
    }

    #[test]
    fn overall_average_is_the_mean_of_category_averages() {
        let analysis = analyze(&sample_results());
        let metrics = &analysis.performance_metrics;
        assert_eq!(metrics.total_questions, 5);
        assert_eq!(metrics.total_errors, 1);
        assert_eq!(metrics.overall_success_rate, 0.8);
        assert_eq!(metrics.avg_response_time, 2.0);
    }

    #[test]
    fn choice_accuracy_scores_only_answered_multiple_choice_items() {
        let analysis = analyze(&sample_results());
        let accuracy = &analysis.detailed_analysis["mmlu_law"];
        // The open question has no expected letter and is not scored.
        assert_eq!(accuracy.total_mc_questions, 2);
        assert_eq!(accuracy.correct_answers, 1);
        assert_eq!(accuracy.accuracy, 0.5);
        assert!(!analysis.detailed_analysis.contains_key("truthfulqa"));
    }

    #[test]
    fn errored_choice_responses_are_not_scored() {
        let mut tests = BTreeMap::new();
        tests.insert(
            "arc_easy".to_string(),
            CategoryResults::Knowledge(vec![knowledge_record(
                "ERROR: generation failed: boom",
                0.0,
                Some("C"),
            )]),
        );
        let results = RunResults {
            timestamp: "2026-01-01T00:00:00".to_string(),
            model: "test-model".to_string(),
            tests,
        };
        let analysis = analyze(&results);
        assert!(analysis.detailed_analysis.is_empty());
    }

    #[test]
    fn empty_runs_analyze_to_zeroes() {
        let results = RunResults {
            timestamp: "2026-01-01T00:00:00".to_string(),
            model: "test-model".to_string(),
            tests: BTreeMap::new(),
        };
        let analysis = analyze(&results);
        assert_eq!(analysis.performance_metrics.total_questions, 0);
        assert_eq!(analysis.performance_metrics.overall_success_rate, 0.0);
        assert_eq!(analysis.performance_metrics.avg_response_time, 0.0);
        assert!(analysis.summary.is_empty());
    }

    #[test]
    fn report_file_carries_results_analysis_and_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let (path, analysis) = save_report(&sample_results(), dir.path()).unwrap();

        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("banter_benchmark_results_"));
        assert!(name.ends_with(".json"));
        assert_eq!(analysis.performance_metrics.total_questions, 5);

        let body = std::fs::read_to_string(&path).unwrap();
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["test_results"]["model"], "test-model");
        assert_eq!(json["analysis"]["performance_metrics"]["total_questions"], 5);
        assert_eq!(json["metadata"]["test_type"], "comprehensive_benchmark");
        assert_eq!(json["metadata"]["datasets_used"].as_array().unwrap().len(), 5);
        assert_eq!(json["metadata"]["test_duration_estimate"], "0.2 minutes");
    }

    #[test]
    fn failed_rendering_saves_raw_results_with_the_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        let results = sample_results();

        // Non-string map keys are not representable as JSON.
        let rendered = serde_json::to_string_pretty(&BTreeMap::from([((1, 2), "x")]));
        assert!(rendered.is_err());
        write_report(rendered, &results, &path).unwrap();

        let body = std::fs::read_to_string(&path).unwrap();
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["test_results"]["model"], "test-model");
        assert!(!json["error"].as_str().unwrap().is_empty());
        assert!(json.get("analysis").is_none());
    }

    #[test]
    fn saving_creates_the_output_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("reports").join("nightly");
        let (path, _) = save_report(&sample_results(), &nested).unwrap();
        assert!(path.starts_with(&nested));
        assert!(path.exists());
    }

    #[test]
    fn scripted_sessions_serialize_as_scenario_lists() {
        let sessions = CategoryResults::Sessions(vec![ScenarioRecord {
            scenario: "Planning a trip".to_string(),
            turns: vec![TurnRecord {
                turn: 1,
                question: "q".to_string(),
                response: "r".to_string(),
                response_time: 1.0,
            }],
        }]);
        let json = serde_json::to_value(&sessions).unwrap();
        assert_eq!(json[0]["scenario"], "Planning a trip");
        assert_eq!(json[0]["turns"][0]["turn"], 1);
    }
}
