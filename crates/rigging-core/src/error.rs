use miette::Diagnostic;
use thiserror::Error;

/// An invalid argument passed to a declaration mutator.
///
/// Declaration errors are raised synchronously at the call site and never
/// leave a half-applied mutation behind.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum DeclarationError {
    #[error("dependency name can't be empty")]
    EmptyName,

    #[error("the target configuration of {dependency} can't be empty")]
    #[diagnostic(help("omit the configuration to use `default`"))]
    EmptyTargetConfiguration { dependency: String },

    #[error("exclude rule must name a group or a module")]
    #[diagnostic(help("use `group:module`, `group` or `*:module`"))]
    EmptyExcludeRule,

    #[error("invalid exclude pattern `{pattern}`: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("`{value}` can't be used as a coordinate")]
    #[diagnostic(help("group, name and version must not contain `/` or `\\` or be `.` or `..`"))]
    UnsafeCoordinate { value: String },

    #[error("invalid dependency notation `{notation}`")]
    #[diagnostic(help("expected `group:name[:version[:classifier]][@extension]`"))]
    InvalidNotation { notation: String },
}
