pub mod libs;

pub use crate::libs::artifact::*;
pub use crate::libs::error::{PipelineError, Result};
pub use crate::libs::resource::*;
