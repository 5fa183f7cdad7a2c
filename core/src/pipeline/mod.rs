// ordergate/src/pipeline/mod.rs

//! A small async stage runner. Checkout is declared as a `Pipeline` of named stages that
//! run strictly in order over one shared `ContextData`.

pub mod context_data;
pub mod control;
pub mod definition;
pub mod execution;
pub mod hooks;
pub mod stage;

pub use context_data::ContextData;
pub use control::{PipelineControl, PipelineResult};
pub use definition::Pipeline;
pub use stage::{Handler, SkipCondition, StageDef};
