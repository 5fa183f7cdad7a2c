// ordergate/src/pipeline/stage.rs

use super::ContextData;
use super::PipelineControl;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Predicate evaluated right before a stage; `true` skips the stage for this run.
pub type SkipCondition<TData> = Arc<dyn Fn(ContextData<TData>) -> bool + Send + Sync + 'static>;

/// A stage handler: takes a clone of the shared context and resolves to a flow signal.
///
/// Handlers must not hold a context guard across an `.await`.
pub type Handler<TData, Err> = Box<
  dyn Fn(ContextData<TData>) -> Pin<Box<dyn Future<Output = Result<PipelineControl, Err>> + Send>>
    + Send
    + Sync,
>;

/// Declaration of one stage: its name, whether it may run without handlers, and an
/// optional skip predicate.
#[derive(Clone)]
pub struct StageDef<T: 'static + Send + Sync> {
  pub name: String,
  pub optional: bool,
  pub skip_if: Option<SkipCondition<T>>,
}

impl<T: 'static + Send + Sync> std::fmt::Debug for StageDef<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("StageDef")
      .field("name", &self.name)
      .field("optional", &self.optional)
      .field("skip_if_present", &self.skip_if.is_some())
      .finish()
  }
}
