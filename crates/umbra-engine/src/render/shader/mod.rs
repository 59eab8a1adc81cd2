//! Named shader parameter binding.
//!
//! A `ShaderProgram` declares its uniform block (`ParamLayout`) and named
//! resource slots. `ShaderBindings` stages values by name and commits them as
//! a `CommittedParams` snapshot that the renderer turns into a bind group.

mod bindings;
mod layout;
mod library;
mod program;

pub use bindings::{CommittedParams, ShaderBindings};
pub use layout::{ParamField, ParamLayout, ParamLayoutBuilder, ParamType};
pub use library::ShaderLibrary;
pub use program::{ProgramId, ResourceKind, ResourceSlot, ShaderProgram, ShaderStage};
