// ordergate/src/pipeline/execution.rs

//! `Pipeline::run`: executes stages in declaration order against one shared context.

use crate::error::PipelineError;
use crate::pipeline::context_data::ContextData;
use crate::pipeline::control::{PipelineControl, PipelineResult};
use crate::pipeline::definition::Pipeline;
use crate::pipeline::stage::Handler;
use tracing::{event, instrument, span, Instrument, Level};

/// What happened when one phase of a stage ran.
enum PhaseOutcome {
  Continue,
  Stopped,
}

impl<TData, Err> Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<PipelineError> + Send + Sync + 'static,
{
  /// Runs every stage once, in order. Stages are never revisited.
  ///
  /// - a stage whose `skip_if` predicate holds is skipped;
  /// - an optional stage without handlers is skipped, a mandatory one fails the run with
  ///   `PipelineError::HandlerMissing`;
  /// - within a stage, `before`, `on` and `after` handlers run in registration order;
  /// - the first handler error ends the run and is returned unchanged;
  /// - `PipelineControl::Stop` ends the run with `PipelineResult::Stopped`.
  #[instrument(
    name = "Pipeline::run",
    skip_all,
    fields(context = %std::any::type_name::<TData>(), num_stages = self.stages.len()),
    err(Display)
  )]
  pub async fn run(&self, ctx_data: ContextData<TData>) -> Result<PipelineResult, Err> {
    event!(Level::DEBUG, "Pipeline run starting.");

    for (stage_idx, stage) in self.stages.iter().enumerate() {
      let stage_name = stage.name.as_str();
      let stage_span = span!(
        Level::INFO,
        "pipeline_stage",
        stage = stage_name,
        stage_index = stage_idx,
        optional = stage.optional
      );

      if let Some(skip_if) = &stage.skip_if {
        if skip_if(ctx_data.clone()) {
          event!(parent: &stage_span, Level::DEBUG, "Stage skipped by its condition.");
          continue;
        }
      }

      let phases = [
        ("before", self.before.get(stage_name)),
        ("on", self.on.get(stage_name)),
        ("after", self.after.get(stage_name)),
      ];
      let has_handlers = phases.iter().any(|(_, h)| matches!(h, Some(v) if !v.is_empty()));
      if !has_handlers {
        if stage.optional {
          event!(parent: &stage_span, Level::DEBUG, "Optional stage has no handlers, skipping.");
          continue;
        }
        event!(parent: &stage_span, Level::ERROR, "Mandatory stage has no handlers.");
        return Err(Err::from(PipelineError::HandlerMissing {
          stage_name: stage.name.clone(),
        }));
      }

      for (phase_name, handlers) in phases {
        let Some(handlers) = handlers else { continue };
        let outcome = run_phase(handlers, &ctx_data, phase_name)
          .instrument(stage_span.clone())
          .await?;
        if let PhaseOutcome::Stopped = outcome {
          event!(parent: &stage_span, Level::INFO, phase = phase_name, "Pipeline stopped by a handler.");
          return Ok(PipelineResult::Stopped);
        }
      }
      event!(parent: &stage_span, Level::DEBUG, "Stage finished.");
    }

    event!(Level::DEBUG, "Pipeline run completed.");
    Ok(PipelineResult::Completed)
  }
}

async fn run_phase<TData, Err>(
  handlers: &[Handler<TData, Err>],
  ctx_data: &ContextData<TData>,
  phase_name: &'static str,
) -> Result<PhaseOutcome, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + Send + Sync + 'static,
{
  for (handler_idx, handler_fn) in handlers.iter().enumerate() {
    let handler_span = span!(Level::DEBUG, "stage_handler", phase = phase_name, handler_index = handler_idx);
    match handler_fn(ctx_data.clone()).instrument(handler_span).await {
      Ok(PipelineControl::Continue) => {}
      Ok(PipelineControl::Stop) => return Ok(PhaseOutcome::Stopped),
      Err(e) => {
        event!(Level::WARN, phase = phase_name, error = %e, "Stage handler failed.");
        return Err(e);
      }
    }
  }
  Ok(PhaseOutcome::Continue)
}
