// tests/pipeline_execution_tests.rs
mod common;

use common::*;
use ordergate::{ContextData, Pipeline, PipelineControl, PipelineResult};
use serial_test::serial;
use std::sync::Arc;

#[tokio::test]
#[serial]
async fn test_pipeline_runs_stages_in_order() {
  setup_tracing();
  let mut pipeline =
    Pipeline::<TestContext, TestError>::new(&[("stage1", false, None), ("stage2", false, None), ("stage3", false, None)]);

  pipeline.on("stage1", create_simple_handler("stage1", " S1"));
  pipeline.on("stage2", create_simple_handler("stage2", " S2"));
  pipeline.on("stage3", create_simple_handler("stage3", " S3"));

  let ctx = ContextData::new(TestContext::default());
  let result = pipeline.run(ctx.clone()).await;

  assert_eq!(result.unwrap(), PipelineResult::Completed);
  let guard = ctx.read();
  assert_eq!(guard.counter, 3);
  assert_eq!(guard.message, " S1 S2 S3");
  assert_eq!(guard.stages_executed, vec!["stage1", "stage2", "stage3"]);
}

#[tokio::test]
#[serial]
async fn test_pipeline_stops_on_pipeline_control_stop() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new(&[
    ("stageA", false, None),
    ("stopStage", false, None),
    ("stageC", false, None),
  ]);

  pipeline.on("stageA", create_simple_handler("stageA", "A"));
  pipeline.on("stopStage", create_simple_handler("stopStage", "Stop"));
  pipeline.on("stageC", create_simple_handler("stageC", "C"));

  let ctx = ContextData::new(TestContext {
    should_stop_at: Some("stopStage".to_string()),
    ..Default::default()
  });
  let result = pipeline.run(ctx.clone()).await;

  assert_eq!(result.unwrap(), PipelineResult::Stopped);
  let guard = ctx.read();
  assert_eq!(guard.message, "AStop");
  assert_eq!(guard.stages_executed, vec!["stageA", "stopStage"]);
}

#[tokio::test]
#[serial]
async fn test_pipeline_propagates_handler_error() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new(&[
    ("good_stage", false, None),
    ("bad_stage", false, None),
    ("another_stage", false, None),
  ]);

  pipeline.on("good_stage", create_simple_handler("good_stage", "Good"));
  pipeline.on("bad_stage", create_failing_handler("bad_stage", "I am a bad stage!"));
  pipeline.on("another_stage", create_simple_handler("another_stage", "NeverRun"));

  let ctx = ContextData::new(TestContext::default());
  let result = pipeline.run(ctx.clone()).await;

  assert_eq!(result.unwrap_err(), TestError::Handler("I am a bad stage!".to_string()));
  let guard = ctx.read();
  assert_eq!(guard.counter, 1);
  assert_eq!(guard.stages_executed, vec!["good_stage", "bad_stage"]);
}

#[tokio::test]
#[serial]
async fn test_pipeline_skips_stage_if_condition_met() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new(&[
    ("stage1", false, None),
    (
      "stage_to_skip",
      false,
      Some(Arc::new(|ctx: ContextData<TestContext>| ctx.read().counter > 0)),
    ),
    ("stage3", false, None),
  ]);

  pipeline.on("stage1", create_simple_handler("stage1", " S1"));
  pipeline.on("stage_to_skip", create_simple_handler("stage_to_skip", " SKIPPED_THIS"));
  pipeline.on("stage3", create_simple_handler("stage3", " S3"));

  let ctx = ContextData::new(TestContext::default());
  assert_eq!(pipeline.run(ctx.clone()).await.unwrap(), PipelineResult::Completed);

  let guard = ctx.read();
  assert_eq!(guard.message, " S1 S3");
  assert_eq!(guard.stages_executed, vec!["stage1", "stage3"]);
}

#[tokio::test]
#[serial]
async fn test_skip_condition_can_be_replaced_after_setup() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new(&[("only", false, None)]);
  pipeline.on("only", create_simple_handler("only", "ran"));
  pipeline.set_skip_condition("only", Some(Arc::new(|_ctx: ContextData<TestContext>| true)));

  let ctx = ContextData::new(TestContext::default());
  pipeline.run(ctx.clone()).await.unwrap();
  assert!(ctx.read().stages_executed.is_empty());
}

#[tokio::test]
#[serial]
async fn test_mandatory_stage_missing_handler_fails() {
  setup_tracing();
  let pipeline = Pipeline::<TestContext, TestError>::new(&[("stage_with_no_handler", false, None)]);

  let result = pipeline.run(ContextData::new(TestContext::default())).await;

  match result {
    Err(TestError::Pipeline(s)) => {
      assert!(s.contains("HandlerMissing"));
      assert!(s.contains("stage_with_no_handler"));
    }
    other => panic!("Expected PipelineError::HandlerMissing, got {:?}", other),
  }
}

#[tokio::test]
#[serial]
async fn test_optional_stage_missing_handler_succeeds() {
  setup_tracing();
  let mut pipeline =
    Pipeline::<TestContext, TestError>::new(&[("optional_stage_no_handler", true, None), ("real", false, None)]);
  pipeline.on("real", create_simple_handler("real", "R"));

  let ctx = ContextData::new(TestContext::default());
  assert_eq!(pipeline.run(ctx.clone()).await.unwrap(), PipelineResult::Completed);
  assert_eq!(ctx.read().stages_executed, vec!["real"]);
}

#[tokio::test]
#[serial]
async fn test_before_on_after_execution_order() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new(&[("main_stage", false, None)]);

  pipeline.after("main_stage", create_simple_handler("after_main", "After;"));
  pipeline.on("main_stage", create_simple_handler("on_main", "On;"));
  pipeline.before("main_stage", create_simple_handler("before_main", "Before;"));

  let ctx = ContextData::new(TestContext::default());
  pipeline.run(ctx.clone()).await.unwrap();

  let guard = ctx.read();
  assert_eq!(guard.message, "Before;On;After;");
  assert_eq!(guard.stages_executed, vec!["before_main", "on_main", "after_main"]);
}

#[tokio::test]
#[serial]
async fn test_after_hook_does_not_run_when_on_handler_fails() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new(&[("commit", false, None)]);
  pipeline.on("commit", create_failing_handler("commit", "write rejected"));
  pipeline.after("commit", create_simple_handler("notify", "Notified"));

  let ctx = ContextData::new(TestContext::default());
  assert!(pipeline.run(ctx.clone()).await.is_err());
  assert_eq!(ctx.read().stages_executed, vec!["commit"]);
}

#[tokio::test]
#[serial]
async fn test_multiple_handlers_in_one_phase_run_in_registration_order() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new(&[("stage", false, None)]);
  pipeline.on("stage", create_simple_handler("first", "1"));
  pipeline.on("stage", create_simple_handler("second", "2"));

  let ctx = ContextData::new(TestContext::default());
  pipeline.run(ctx.clone()).await.unwrap();
  assert_eq!(ctx.read().message, "12");
}

#[tokio::test]
#[serial]
async fn test_handler_error_type_converts_into_pipeline_error_type() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new(&[("strict", false, None)]);
  pipeline.on("strict", |_ctx: ContextData<TestContext>| {
    Box::pin(async move {
      Err::<PipelineControl, _>(ordergate::PipelineError::Internal("engine says no".to_string()))
    })
  });

  match pipeline.run(ContextData::new(TestContext::default())).await {
    Err(TestError::Pipeline(s)) => assert!(s.contains("engine says no")),
    other => panic!("Expected converted PipelineError, got {:?}", other),
  }
}

#[test]
fn test_stage_names_follow_declaration_order() {
  let pipeline = Pipeline::<TestContext, TestError>::new(&[("a", false, None), ("b", true, None), ("c", false, None)]);
  assert_eq!(pipeline.stage_names(), vec!["a", "b", "c"]);
}

#[test]
#[should_panic(expected = "declared twice")]
fn test_duplicate_stage_names_panic() {
  let _ = Pipeline::<TestContext, TestError>::new(&[("a", false, None), ("a", false, None)]);
}

#[test]
#[should_panic(expected = "not found in pipeline definition")]
fn test_registering_on_unknown_stage_panics() {
  let mut pipeline = Pipeline::<TestContext, TestError>::new(&[("a", false, None)]);
  pipeline.on("typo", create_simple_handler("typo", ""));
}
