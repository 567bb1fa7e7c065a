// reelmix-core/src/external/mocks.rs

// --- Mocking Infrastructure (for testing) ---

// Compiled for unit tests only.

use std::fs;
use std::sync::{Arc, Mutex};

use image::{GrayImage, ImageFormat};

use super::tool_runner::{ToolInvocation, ToolRunner};
use crate::context::RunContext;
use crate::error::{CoreError, CoreResult};

/// Scripted result of a matched invocation.
#[derive(Debug, Clone)]
pub enum MockOutcome {
    /// Succeeds with this captured output and creates a dummy output file.
    Output(String),
    /// Fails with `ToolFailure` carrying this stderr. No output file is created.
    Failure(String),
    /// Succeeds and writes a 32x32 grayscale PNG (1024 luma bytes) to the output path.
    Frame(Vec<u8>),
}

struct MockExpectation {
    patterns: Vec<String>,
    outcome: MockOutcome,
    once: bool,
}

type HookFn = Box<dyn Fn(&ToolInvocation) + Send + Sync>;

struct MockHook {
    pattern: String,
    action: HookFn,
}

/// A pattern matches when the tool name equals it or any argument contains it.
fn pattern_matches(pattern: &str, invocation: &ToolInvocation) -> bool {
    invocation.tool == pattern || invocation.args.iter().any(|arg| arg.contains(pattern))
}

/// ToolRunner that never starts a process.
///
/// Unmatched invocations succeed with empty output and get a dummy output
/// file, so a pipeline run only needs scripting for probe results, failures
/// and fingerprint frames.
#[derive(Clone, Default)]
pub struct MockToolRunner {
    expectations: Arc<Mutex<Vec<MockExpectation>>>,
    hooks: Arc<Mutex<Vec<MockHook>>>,
    received_calls: Arc<Mutex<Vec<ToolInvocation>>>,
}

impl MockToolRunner {
    pub fn new() -> Self {
        Default::default()
    }

    /// Adds a reusable expectation. All `patterns` must match. First match wins.
    pub fn expect(&self, patterns: &[&str], outcome: MockOutcome) {
        self.push(patterns, outcome, false);
    }

    /// Adds an expectation that is consumed by its first match.
    pub fn expect_once(&self, patterns: &[&str], outcome: MockOutcome) {
        self.push(patterns, outcome, true);
    }

    fn push(&self, patterns: &[&str], outcome: MockOutcome, once: bool) {
        self.expectations.lock().unwrap().push(MockExpectation {
            patterns: patterns.iter().map(|p| p.to_string()).collect(),
            outcome,
            once,
        });
    }

    /// Scripts both probe queries for files whose path contains `file_pattern`.
    pub fn expect_media(&self, file_pattern: &str, duration: f64, width: u32, height: u32) {
        self.expect(
            &["format=duration", file_pattern],
            MockOutcome::Output(format!("{duration:.6}\n")),
        );
        self.expect(
            &["stream=width,height", file_pattern],
            MockOutcome::Output(format!("{width}x{height}\n")),
        );
    }

    /// Runs `action` on every invocation matching `pattern`, before the outcome.
    pub fn on_call<F>(&self, pattern: &str, action: F)
    where
        F: Fn(&ToolInvocation) + Send + Sync + 'static,
    {
        self.hooks.lock().unwrap().push(MockHook {
            pattern: pattern.to_string(),
            action: Box::new(action),
        });
    }

    pub fn get_received_calls(&self) -> Vec<ToolInvocation> {
        self.received_calls.lock().unwrap().clone()
    }

    /// Received calls whose arguments contain `pattern`.
    pub fn calls_matching(&self, pattern: &str) -> Vec<ToolInvocation> {
        self.get_received_calls()
            .into_iter()
            .filter(|inv| pattern_matches(pattern, inv))
            .collect()
    }

    fn fire_hooks(&self, invocation: &ToolInvocation) {
        let hooks = self.hooks.lock().unwrap();
        for hook in hooks.iter().filter(|h| pattern_matches(&h.pattern, invocation)) {
            (hook.action)(invocation);
        }
    }

    fn take_outcome(&self, invocation: &ToolInvocation) -> Option<MockOutcome> {
        let mut expectations = self.expectations.lock().unwrap();
        let index = expectations.iter().position(|exp| {
            exp.patterns
                .iter()
                .all(|pattern| pattern_matches(pattern, invocation))
        })?;
        if expectations[index].once {
            Some(expectations.remove(index).outcome)
        } else {
            Some(expectations[index].outcome.clone())
        }
    }
}

fn create_dummy_output(invocation: &ToolInvocation) -> CoreResult<()> {
    if let Some(output) = &invocation.output {
        if let Some(parent) = output.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(output, b"mock media")?;
        log::debug!("MockToolRunner created dummy output file: {}", output.display());
    }
    Ok(())
}

fn write_frame(invocation: &ToolInvocation, luma: Vec<u8>) -> CoreResult<()> {
    let output = invocation.output.as_ref().ok_or_else(|| {
        CoreError::PathError("Frame outcome scripted for a call without output".to_string())
    })?;
    let frame = GrayImage::from_raw(32, 32, luma).ok_or_else(|| {
        CoreError::Config("Mock frame must hold exactly 1024 luma bytes".to_string())
    })?;
    frame.save_with_format(output, ImageFormat::Png)?;
    Ok(())
}

impl ToolRunner for MockToolRunner {
    fn run(&self, invocation: &ToolInvocation, ctx: &RunContext) -> CoreResult<String> {
        ctx.checkpoint()?;
        self.received_calls.lock().unwrap().push(invocation.clone());

        self.fire_hooks(invocation);
        // A hook may have cancelled the run; behave like a killed process
        ctx.checkpoint()?;

        match self.take_outcome(invocation) {
            Some(MockOutcome::Output(output)) => {
                create_dummy_output(invocation)?;
                Ok(output)
            }
            Some(MockOutcome::Failure(stderr)) => {
                log::debug!("MockToolRunner simulating failure: {}", stderr);
                Err(CoreError::ToolFailure {
                    tool: invocation.tool.clone(),
                    message: stderr,
                })
            }
            Some(MockOutcome::Frame(luma)) => {
                write_frame(invocation, luma)?;
                Ok(String::new())
            }
            None => {
                create_dummy_output(invocation)?;
                Ok(String::new())
            }
        }
    }
}

/// Luma bytes for a frame whose left half is dark and right half is bright.
pub fn split_frame(dark_left: bool) -> Vec<u8> {
    let (left, right) = if dark_left { (0u8, 255u8) } else { (255u8, 0u8) };
    (0..32 * 32)
        .map(|i| if i % 32 < 16 { left } else { right })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn invocation(args: &[&str], output: Option<PathBuf>) -> ToolInvocation {
        let mut inv = ToolInvocation::new(
            "ffmpeg",
            "ffmpeg",
            args.iter().map(|s| s.to_string()).collect(),
        );
        inv.output = output;
        inv
    }

    #[test]
    fn test_unmatched_call_creates_dummy_output() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested").join("o.mp4");
        let mock = MockToolRunner::new();
        let result = mock
            .run(&invocation(&["-i", "x.mp4"], Some(out.clone())), &RunContext::new())
            .unwrap();
        assert!(result.is_empty());
        assert!(out.exists());
        assert_eq!(mock.get_received_calls().len(), 1);
    }

    #[test]
    fn test_once_expectation_is_consumed() {
        let mock = MockToolRunner::new();
        mock.expect_once(&["-c", "copy"], MockOutcome::Failure("bad".into()));
        let inv = invocation(&["-c", "copy"], None);
        let ctx = RunContext::new();
        assert!(matches!(mock.run(&inv, &ctx), Err(CoreError::ToolFailure { .. })));
        assert!(mock.run(&inv, &ctx).is_ok());
    }

    #[test]
    fn test_hook_cancel_surfaces_as_cancelled() {
        let mock = MockToolRunner::new();
        let ctx = RunContext::new();
        let control = ctx.control();
        mock.on_call("b.mp4", move |_| control.cancel());
        assert!(mock.run(&invocation(&["a.mp4"], None), &ctx).is_ok());
        assert!(matches!(
            mock.run(&invocation(&["b.mp4"], None), &ctx),
            Err(CoreError::Cancelled)
        ));
    }

    #[test]
    fn test_frame_outcome_writes_png() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("f.png");
        let mock = MockToolRunner::new();
        mock.expect(&["seg.mp4"], MockOutcome::Frame(split_frame(true)));
        mock.run(&invocation(&["seg.mp4"], Some(out.clone())), &RunContext::new())
            .unwrap();
        let decoded = image::open(&out).unwrap().to_luma8();
        assert_eq!(decoded.dimensions(), (32, 32));
        assert_eq!(decoded.get_pixel(0, 0).0[0], 0);
        assert_eq!(decoded.get_pixel(31, 0).0[0], 255);
    }
}
