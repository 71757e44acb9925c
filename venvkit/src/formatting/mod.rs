//! CLI formatting utilities.
//!
//! Status lines go to stderr so they never mix with the dispatched
//! command's stdout. Reports such as `--venvkit-status` go to stdout.

mod headers;
mod output;
mod status;

pub use headers::{print_section_header, SectionStyle};
pub use output::{format_duration, print_key_value};
pub use status::{print_failure, print_success, print_warning};
