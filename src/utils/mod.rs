pub mod error;
pub mod validation;
pub mod formats;
pub mod fs;

pub use error::{
    PipelineError, PipelineResult, Rejection, RejectionReason, ResourceError, ValidationError,
};
pub use validation::{MAX_PAGE_SIDE, validate_config};
pub use formats::{FileKind, kind_from_extension, resolve_kind};
pub use fs::{extract_filename, load_config, read_source_file, write_output};
