// ordergate/src/pipeline/definition.rs

//! The `Pipeline<TData, Err>` definition and its structural setup.

use crate::error::PipelineError;
use crate::pipeline::stage::{Handler, SkipCondition, StageDef};
use std::collections::HashMap;

/// An ordered list of stages over a root data type `TData`, whose handlers fail with `Err`.
///
/// `Err` must be constructible from `PipelineError` so that engine-level failures
/// (a mandatory stage without handlers, for instance) surface in the caller's own error type.
pub struct Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<PipelineError> + Send + Sync + 'static,
{
  pub(crate) stages: Vec<StageDef<TData>>,
  pub(crate) before: HashMap<String, Vec<Handler<TData, Err>>>,
  pub(crate) on: HashMap<String, Vec<Handler<TData, Err>>>,
  pub(crate) after: HashMap<String, Vec<Handler<TData, Err>>>,
}

impl<TData, Err> Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<PipelineError> + Send + Sync + 'static,
{
  /// Creates a pipeline from `(name, optional, skip_if)` triples, in run order.
  ///
  /// # Panics
  ///
  /// Panics when two stages share a name; stage names key the handler tables.
  pub fn new(stage_defs: &[(&str, bool, Option<SkipCondition<TData>>)]) -> Self {
    let mut stages: Vec<StageDef<TData>> = Vec::with_capacity(stage_defs.len());
    for (name, optional, skip_if) in stage_defs {
      if stages.iter().any(|s| s.name == *name) {
        panic!("Pipeline setup error: stage '{}' declared twice.", name);
      }
      stages.push(StageDef {
        name: (*name).to_string(),
        optional: *optional,
        skip_if: skip_if.clone(),
      });
    }

    Self {
      stages,
      before: HashMap::new(),
      on: HashMap::new(),
      after: HashMap::new(),
    }
  }

  /// Stage names in run order.
  pub fn stage_names(&self) -> Vec<&str> {
    self.stages.iter().map(|s| s.name.as_str()).collect()
  }

  /// Replaces the skip predicate of an existing stage.
  pub fn set_skip_condition(&mut self, stage_name: &str, skip_if: Option<SkipCondition<TData>>) {
    self.stage_mut(stage_name).skip_if = skip_if;
  }

  /// Panics on an unknown stage name: registering against a typo is a setup bug, not a
  /// runtime condition.
  pub(crate) fn ensure_stage_exists(&self, stage_name: &str) {
    if !self.stages.iter().any(|s| s.name == stage_name) {
      panic!("Pipeline setup error: stage '{}' not found in pipeline definition.", stage_name);
    }
  }

  fn stage_mut(&mut self, stage_name: &str) -> &mut StageDef<TData> {
    match self.stages.iter_mut().find(|s| s.name == stage_name) {
      Some(stage) => stage,
      None => panic!("Pipeline setup error: stage '{}' not found in pipeline definition.", stage_name),
    }
  }
}
