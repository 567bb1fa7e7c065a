// End-to-end pipeline scenarios driven by MockToolRunner.

use std::fs;
use std::path::{Path, PathBuf};

use rand::SeedableRng;
use rand::rngs::StdRng;
use tempfile::TempDir;

use super::pipeline::Pipeline;
use crate::config::{MixConfig, MixConfigBuilder, ProcessingMode};
use crate::context::RunContext;
use crate::error::{CoreError, CoreResult};
use crate::external::mocks::{MockOutcome, MockToolRunner, split_frame};
use crate::external::{ToolInvocation, ToolPaths};
use crate::gates::{InputLimit, ReviewGate};
use crate::reporting::{RecordedEvent, RecordingReporter};

struct Workspace {
    _root: TempDir,
    input: PathBuf,
    output: PathBuf,
    processed: PathBuf,
}

fn workspace(files: &[&str]) -> Workspace {
    let root = tempfile::tempdir().unwrap();
    let input = root.path().join("input");
    fs::create_dir_all(&input).unwrap();
    for name in files {
        fs::write(input.join(name), b"source video").unwrap();
    }
    Workspace {
        input,
        output: root.path().join("output"),
        processed: root.path().join("processed"),
        _root: root,
    }
}

fn builder(ws: &Workspace) -> MixConfigBuilder {
    MixConfigBuilder::new()
        .input_dir(&ws.input)
        .output_dir(&ws.output)
        .processed_dir(&ws.processed)
}

fn run(
    mock: &MockToolRunner,
    config: &MixConfig,
    ctx: &RunContext,
    reporter: &RecordingReporter,
    seed: u64,
) -> CoreResult<crate::progress::BatchSummary> {
    let tools = ToolPaths::default();
    Pipeline::new(mock, &tools, config, ctx, reporter).run(&mut StdRng::seed_from_u64(seed))
}

fn files_with_prefix(dir: &Path, prefix: &str) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|n| n.starts_with(prefix))
        .collect();
    names.sort();
    names
}

fn cut_lengths(calls: &[ToolInvocation]) -> Vec<f64> {
    calls
        .iter()
        .filter_map(|inv| {
            let pos = inv.args.iter().position(|a| a == "-t")?;
            inv.args.get(pos + 1)?.parse().ok()
        })
        .collect()
}

fn mix_selections(reporter: &RecordingReporter) -> Vec<Vec<usize>> {
    reporter
        .lines()
        .iter()
        .filter_map(|l| l.strip_prefix("Mix ").map(str::to_string))
        .map(|rest| {
            let key = rest.split_once(": ").unwrap().1.to_string();
            key.split(',').map(|i| i.parse().unwrap()).collect()
        })
        .collect()
}

#[test]
fn test_split_only_sixty_seconds() {
    let ws = workspace(&["clip.mp4"]);
    let config = builder(&ws).segment_range(15, 20).build();
    let mock = MockToolRunner::new();
    mock.expect_media("clip.mp4", 60.0, 1920, 1080);
    let reporter = RecordingReporter::new();

    let summary = run(&mock, &config, &RunContext::new(), &reporter, 11).unwrap();

    let scenes = files_with_prefix(&ws.output, "clip_scene_");
    assert!((3..=4).contains(&scenes.len()), "got {scenes:?}");
    assert_eq!(summary.generated_outputs, scenes.len());
    assert_eq!(summary.succeeded, 1);

    let lengths = cut_lengths(&mock.calls_matching("-ss"));
    assert_eq!(lengths.len(), scenes.len());
    assert!(lengths.iter().sum::<f64>() <= 60.0 + 1e-9);

    assert!(ws.processed.join("clip.mp4").exists());
    assert!(!ws.input.join("clip.mp4").exists());

    let last = reporter.snapshots().pop().unwrap();
    assert_eq!(last.total_outputs, scenes.len());
    assert_eq!(reporter.lines().last().unwrap(), "All done!");
}

#[test]
fn test_split_review_draws_one_segment_per_bucket() {
    let ws = workspace(&["v1.mp4"]);
    let config = builder(&ws)
        .mode(ProcessingMode::SplitReview)
        .segment_range(10, 10)
        .segments_per_output(3)
        .outputs_per_input(2)
        .auto_dedup(false)
        .pause_for_manual_delete(false)
        .build();
    let mock = MockToolRunner::new();
    mock.expect_media("v1.mp4", 90.0, 1280, 720);
    let reporter = RecordingReporter::new();

    let summary = run(&mock, &config, &RunContext::new(), &reporter, 5).unwrap();

    assert_eq!(mock.calls_matching("-ss").len(), 9);
    assert_eq!(summary.generated_outputs, 2);
    assert_eq!(files_with_prefix(&ws.output, "v1_mix_").len(), 2);
    // Log lines and file names share 0-based mix numbering
    for idx in 0..2 {
        assert!(reporter.has_line(&format!("Mix {idx}: ")));
        assert_eq!(files_with_prefix(&ws.output, &format!("v1_mix_{idx}_")).len(), 1);
    }
    assert!(!reporter.has_line("Mix 2: "));

    let selections = mix_selections(&reporter);
    assert_eq!(selections.len(), 2);
    for picks in &selections {
        assert_eq!(picks.len(), 3);
        assert!(picks[0] < 3);
        assert!((3..6).contains(&picks[1]));
        assert!((6..9).contains(&picks[2]));
    }
    assert_ne!(selections[0], selections[1]);

    assert!(!ws.output.join("_segments").exists());
    assert!(ws.processed.join("v1.mp4").exists());
}

#[test]
fn test_cancel_during_second_file_stops_batch() {
    let names = ["v1.mp4", "v2.mp4", "v3.mp4", "v4.mp4", "v5.mp4"];
    let ws = workspace(&names);
    let config = builder(&ws).segment_range(10, 10).build();
    let mock = MockToolRunner::new();
    for name in names {
        mock.expect_media(name, 30.0, 640, 360);
    }
    let ctx = RunContext::new();
    let control = ctx.control();
    mock.on_call("v2.mp4", move |_| control.cancel());
    let reporter = RecordingReporter::new();

    let result = run(&mock, &config, &ctx, &reporter, 1);

    assert!(matches!(result, Err(CoreError::Cancelled)));
    assert!(ws.processed.join("v1.mp4").exists());
    for name in &names[1..] {
        assert!(ws.input.join(name).exists(), "{name} should stay in input");
        assert!(!ws.processed.join(name).exists());
    }
    assert!(reporter.has_line("Run cancelled."));
    assert!(reporter.summary().is_none());
}

#[test]
fn test_failed_file_does_not_stop_batch() {
    let ws = workspace(&["v1.mp4", "v2.mp4"]);
    let config = builder(&ws).segment_range(10, 10).build();
    let mock = MockToolRunner::new();
    mock.expect(
        &["stream=width,height", "v1.mp4"],
        MockOutcome::Failure("moov atom not found".to_string()),
    );
    mock.expect_media("v2.mp4", 20.0, 640, 360);
    let reporter = RecordingReporter::new();

    let summary = run(&mock, &config, &RunContext::new(), &reporter, 1).unwrap();

    assert_eq!(summary.failed, 1);
    assert_eq!(summary.succeeded, 1);
    assert!(ws.input.join("v1.mp4").exists());
    assert!(ws.processed.join("v2.mp4").exists());
    assert!(reporter.has_line("Error processing v1.mp4"));
    assert!(reporter.events().iter().any(|e| matches!(
        e,
        RecordedEvent::FileFailed { file_name, .. } if file_name == "v1.mp4"
    )));

    let snapshots = reporter.snapshots();
    // initial, one per file, final
    assert_eq!(snapshots.len(), 4);
    assert_eq!(snapshots[1].failed_inputs, 1);
    assert_eq!(snapshots[2].processed_inputs, 2);
}

#[test]
fn test_similar_segments_are_removed_before_mixing() {
    let ws = workspace(&["v1.mp4"]);
    let config = builder(&ws)
        .mode(ProcessingMode::SplitReview)
        .segment_range(10, 10)
        .segments_per_output(2)
        .outputs_per_input(2)
        .pause_for_manual_delete(false)
        .build();
    let mock = MockToolRunner::new();
    mock.expect_media("v1.mp4", 40.0, 640, 360);
    for (scene, dark_left) in [(1, true), (2, false), (3, true), (4, false)] {
        let pattern = format!("scene_{scene}_");
        mock.expect(&["format=gray", &pattern], MockOutcome::Frame(split_frame(dark_left)));
    }
    let reporter = RecordingReporter::new();

    let summary = run(&mock, &config, &RunContext::new(), &reporter, 3).unwrap();

    assert_eq!(summary.succeeded, 1);
    let deleted: Vec<String> = reporter
        .lines()
        .into_iter()
        .filter(|l| l.starts_with("Delete similar segment: "))
        .collect();
    assert_eq!(deleted.len(), 2);
    assert!(deleted[0].contains("scene_3_"));
    assert!(deleted[1].contains("scene_4_"));
    // Two survivors, two buckets: both mixes must take both segments
    assert_eq!(mix_selections(&reporter), vec![vec![0, 1], vec![0, 1]]);
    assert_eq!(files_with_prefix(&ws.output, "v1_mix_").len(), 2);
}

#[test]
fn test_fingerprint_failure_keeps_segment() {
    let ws = workspace(&["v1.mp4"]);
    let config = builder(&ws)
        .mode(ProcessingMode::SplitReview)
        .segment_range(10, 10)
        .segments_per_output(3)
        .outputs_per_input(1)
        .pause_for_manual_delete(false)
        .build();
    let mock = MockToolRunner::new();
    mock.expect_media("v1.mp4", 30.0, 640, 360);
    // Unscripted thumbnail calls write a dummy file that is not a PNG
    let reporter = RecordingReporter::new();

    let summary = run(&mock, &config, &RunContext::new(), &reporter, 3).unwrap();

    assert_eq!(summary.succeeded, 1);
    assert_eq!(reporter.warnings().len(), 3);
    assert!(reporter.warnings()[0].starts_with("Skip hash scene_1_"));
}

struct EditFolder {
    delete: Vec<&'static str>,
    add: Option<&'static str>,
}

impl ReviewGate for EditFolder {
    fn wait_for_review(&self, folder: &Path, ctx: &RunContext) -> CoreResult<()> {
        for entry in fs::read_dir(folder)? {
            let path = entry?.path();
            let name = path.file_name().unwrap().to_string_lossy().into_owned();
            if self.delete.iter().any(|prefix| name.starts_with(prefix)) {
                fs::remove_file(&path)?;
            }
        }
        if let Some(extra) = self.add {
            fs::write(folder.join(extra), b"user clip")?;
        }
        ctx.checkpoint()
    }
}

#[test]
fn test_manual_review_picks_up_folder_changes() {
    let ws = workspace(&["v1.mp4"]);
    let config = builder(&ws)
        .mode(ProcessingMode::SplitReview)
        .segment_range(10, 10)
        .segments_per_output(3)
        .outputs_per_input(1)
        .auto_dedup(false)
        .build();
    let mock = MockToolRunner::new();
    mock.expect_media("v1.mp4", 40.0, 640, 360);
    mock.expect(
        &["format=duration", "scene_99_user"],
        MockOutcome::Output("12.000000\n".to_string()),
    );
    let review = EditFolder {
        delete: vec!["scene_2_", "scene_3_"],
        add: Some("scene_99_user.mp4"),
    };
    let reporter = RecordingReporter::new();
    let tools = ToolPaths::default();
    let ctx = RunContext::new();

    let summary = Pipeline::new(&mock, &tools, &config, &ctx, &reporter)
        .with_review(&review)
        .run(&mut StdRng::seed_from_u64(8))
        .unwrap();

    assert_eq!(summary.succeeded, 1);
    assert!(reporter
        .events()
        .iter()
        .any(|e| matches!(e, RecordedEvent::ReviewRequested(p) if p.ends_with("_segments/v1"))));
    // The extra clip had no metadata and was probed
    assert_eq!(
        mock.calls_matching("scene_99_user")
            .iter()
            .filter(|c| c.tool == "ffprobe")
            .count(),
        1
    );
    // scene_1, scene_4 and the user clip remain, one per bucket
    assert_eq!(mix_selections(&reporter), vec![vec![0, 1, 2]]);
}

#[test]
fn test_manual_review_leaving_too_few_fails_file() {
    let ws = workspace(&["v1.mp4"]);
    let config = builder(&ws)
        .mode(ProcessingMode::SplitReview)
        .segment_range(10, 10)
        .segments_per_output(3)
        .auto_dedup(false)
        .build();
    let mock = MockToolRunner::new();
    mock.expect_media("v1.mp4", 40.0, 640, 360);
    let review = EditFolder {
        delete: vec!["scene_1_", "scene_2_"],
        add: None,
    };
    let reporter = RecordingReporter::new();
    let tools = ToolPaths::default();
    let ctx = RunContext::new();

    let summary = Pipeline::new(&mock, &tools, &config, &ctx, &reporter)
        .with_review(&review)
        .run(&mut StdRng::seed_from_u64(8))
        .unwrap();

    assert_eq!(summary.failed, 1);
    assert!(reporter.has_line("Not enough segments after manual delete."));
    assert!(ws.input.join("v1.mp4").exists());
    assert!(!ws.output.join("_segments").exists());
}

#[test]
fn test_too_few_segments_for_mixing() {
    let ws = workspace(&["v1.mp4"]);
    let config = builder(&ws)
        .mode(ProcessingMode::SplitReview)
        .segment_range(10, 10)
        .segments_per_output(3)
        .build();
    let mock = MockToolRunner::new();
    mock.expect_media("v1.mp4", 25.0, 640, 360);
    let reporter = RecordingReporter::new();

    let summary = run(&mock, &config, &RunContext::new(), &reporter, 1).unwrap();

    assert_eq!(summary.failed, 1);
    assert!(reporter.has_line("Not enough segments for mixing."));
    assert!(
        reporter
            .events()
            .iter()
            .all(|e| !matches!(e, RecordedEvent::ReviewRequested(_)))
    );
}

#[test]
fn test_concat_copy_failure_falls_back_to_reencode() {
    let ws = workspace(&["v1.mp4"]);
    let config = builder(&ws)
        .mode(ProcessingMode::SplitReview)
        .segment_range(10, 10)
        .segments_per_output(3)
        .outputs_per_input(1)
        .auto_dedup(false)
        .pause_for_manual_delete(false)
        .build();
    let mock = MockToolRunner::new();
    mock.expect_media("v1.mp4", 30.0, 640, 360);
    mock.expect_once(
        &["concat", "copy"],
        MockOutcome::Failure("Non-monotonous DTS".to_string()),
    );
    let reporter = RecordingReporter::new();

    let summary = run(&mock, &config, &RunContext::new(), &reporter, 2).unwrap();

    assert_eq!(summary.succeeded, 1);
    assert!(reporter.has_line("Concat copy failed, re-encoding"));
    let joins = mock.calls_matching("concat");
    assert_eq!(joins.len(), 2);
    assert!(joins[1].args.iter().any(|a| a == "libx264"));
}

#[test]
fn test_crossfade_mix_uses_one_filter_graph() {
    let ws = workspace(&["v1.mp4"]);
    let config = builder(&ws)
        .mode(ProcessingMode::SplitReview)
        .segment_range(10, 10)
        .segments_per_output(3)
        .outputs_per_input(1)
        .auto_dedup(false)
        .pause_for_manual_delete(false)
        .crossfade(true)
        .build();
    let mock = MockToolRunner::new();
    mock.expect_media("v1.mp4", 30.0, 640, 360);
    // Copied cuts land on keyframes, so the files run longer than planned
    mock.expect(
        &["format=duration", "scene_"],
        MockOutcome::Output("11.500000\n".to_string()),
    );
    let reporter = RecordingReporter::new();

    run(&mock, &config, &RunContext::new(), &reporter, 2).unwrap();

    assert_eq!(mock.calls_matching("scene_").iter().filter(|c| c.tool == "ffprobe").count(), 3);
    let joins = mock.calls_matching("-filter_complex");
    assert_eq!(joins.len(), 1);
    assert_eq!(joins[0].args.iter().filter(|a| *a == "-i").count(), 3);
    let graph = joins[0].args.join(" ");
    assert!(graph.contains("offset=11[v1]"), "{graph}");
    assert!(graph.contains("offset=22[v2]"), "{graph}");
    assert!(mock.calls_matching("concat").is_empty());
}

#[test]
fn test_odd_dimensions_are_normalized_first() {
    let ws = workspace(&["v1.mp4"]);
    let config = builder(&ws).segment_range(10, 10).build();
    let mock = MockToolRunner::new();
    mock.expect_media("v1.mp4", 30.0, 1919, 1080);
    let reporter = RecordingReporter::new();

    let summary = run(&mock, &config, &RunContext::new(), &reporter, 1).unwrap();

    assert_eq!(summary.generated_outputs, 3);
    assert!(reporter.has_line("Re-encoding v1.mp4..."));
    let normalize = mock.calls_matching("trunc(iw/2)*2");
    assert_eq!(normalize.len(), 1);
    let safe_cuts = mock
        .calls_matching("v1_safe.mp4")
        .into_iter()
        .filter(|c| c.args.iter().any(|a| a == "-ss"))
        .count();
    assert_eq!(safe_cuts, 3);
    // Duration is probed once, on the source
    assert_eq!(mock.calls_matching("format=duration").len(), 1);
    assert!(!ws.output.join("_normalized").exists());
    assert!(ws.processed.join("v1.mp4").exists());
}

#[test]
fn test_input_limit_skips_remaining_files() {
    let ws = workspace(&["v1.mp4", "v2.mp4", "v3.mp4"]);
    let config = builder(&ws).segment_range(10, 10).build();
    let mock = MockToolRunner::new();
    for name in ["v1.mp4", "v2.mp4", "v3.mp4"] {
        mock.expect_media(name, 20.0, 640, 360);
    }
    let gate = InputLimit::new(1);
    let reporter = RecordingReporter::new();
    let tools = ToolPaths::default();
    let ctx = RunContext::new();

    let summary = Pipeline::new(&mock, &tools, &config, &ctx, &reporter)
        .with_gate(&gate)
        .run(&mut StdRng::seed_from_u64(1))
        .unwrap();

    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.skipped, 2);
    assert_eq!(gate.processed(), 1);
    assert!(reporter.has_line("Input limit reached. Skipping remaining files."));
    assert!(ws.input.join("v2.mp4").exists());
    assert!(ws.input.join("v3.mp4").exists());
}

#[test]
fn test_direct_mix_writes_each_output() {
    let ws = workspace(&["v1.mp4"]);
    let config = builder(&ws)
        .mode(ProcessingMode::DirectMix)
        .segment_range(15, 20)
        .segments_per_output(3)
        .outputs_per_input(2)
        .build();
    let mock = MockToolRunner::new();
    mock.expect_media("v1.mp4", 90.0, 640, 360);
    let reporter = RecordingReporter::new();

    let summary = run(&mock, &config, &RunContext::new(), &reporter, 4).unwrap();

    assert_eq!(summary.generated_outputs, 2);
    assert_eq!(mock.calls_matching("-ss").len(), 6);
    let mixes = files_with_prefix(&ws.output, "v1_mix_");
    assert_eq!(mixes.len(), 2);
    assert!(mixes[0].starts_with("v1_mix_0_"));
    assert!(!ws.output.join("_direct").exists());
    let totals = reporter.snapshots();
    assert_eq!(totals[0].total_outputs, 2);
}

#[test]
fn test_direct_mix_too_short_fails_file() {
    let ws = workspace(&["v1.mp4"]);
    let config = builder(&ws)
        .mode(ProcessingMode::DirectMix)
        .segment_range(15, 20)
        .segments_per_output(3)
        .build();
    let mock = MockToolRunner::new();
    mock.expect_media("v1.mp4", 20.0, 640, 360);
    let reporter = RecordingReporter::new();

    let summary = run(&mock, &config, &RunContext::new(), &reporter, 4).unwrap();

    assert_eq!(summary.failed, 1);
    assert!(reporter.has_line("Video is too short for the selected min seconds."));
    assert!(ws.input.join("v1.mp4").exists());
    assert!(mock.calls_matching("-ss").is_empty());
}

#[test]
fn test_empty_input_folder_finishes_cleanly() {
    let ws = workspace(&[]);
    let config = builder(&ws).build();
    let mock = MockToolRunner::new();
    let reporter = RecordingReporter::new();

    let summary = run(&mock, &config, &RunContext::new(), &reporter, 1).unwrap();

    assert_eq!(summary.total_inputs, 0);
    assert!(reporter.has_line("Input folder is empty."));
    assert_eq!(reporter.lines().last().unwrap(), "All done!");
    assert!(mock.get_received_calls().is_empty());
    assert!(ws.output.is_dir());
    assert!(ws.processed.is_dir());
}

#[test]
fn test_unsupported_files_only() {
    let ws = workspace(&["notes.txt"]);
    let config = builder(&ws).build();
    let reporter = RecordingReporter::new();

    let summary = run(&MockToolRunner::new(), &config, &RunContext::new(), &reporter, 1).unwrap();

    assert_eq!(summary.total_inputs, 0);
    assert!(reporter.has_line("No supported video files found"));
}

#[test]
fn test_missing_input_folder_is_fatal() {
    let ws = workspace(&[]);
    let mut config = builder(&ws).build();
    config.input_dir = ws.input.join("missing");
    let reporter = RecordingReporter::new();

    let result = run(&MockToolRunner::new(), &config, &RunContext::new(), &reporter, 1);

    assert!(matches!(result, Err(CoreError::Discovery(_))));
    assert!(reporter.summary().is_none());
}

#[test]
fn test_invalid_config_is_rejected_before_discovery() {
    let ws = workspace(&["v1.mp4"]);
    let config = builder(&ws).segment_range(20, 10).build();
    let mock = MockToolRunner::new();

    let result = run(&mock, &config, &RunContext::new(), &RecordingReporter::new(), 1);

    assert!(matches!(result, Err(CoreError::Config(_))));
    assert!(mock.get_received_calls().is_empty());
}
