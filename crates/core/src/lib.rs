#![deny(missing_docs)]
//! r2b core: the document tree, settings schema, layout directives and the
//! Markdown front end that builds trees for the translators.

/// Code fence tracking for the directive scanner.
pub mod code_fence;
/// mdast to document tree conversion.
pub mod convert;
/// Layout directives and the directive registry.
pub mod directives;
/// Document tree model.
pub mod doctree;
/// Core error and diagnostic types.
pub mod error;
/// YAML front matter extraction.
pub mod frontmatter;
/// Markdown front end.
pub mod parse;
/// Directive block scanning.
pub mod scan;
/// Settings schema and typed settings.
pub mod settings;
/// Section identifiers.
pub mod slug;
/// Section nesting, title promotion and contents generation.
pub mod structure;

pub use directives::{
    DEFAULT_COLUMNSET_WIDTH, DirectiveHandler, DirectiveInvocation, DirectiveRegistry,
    NestedParser, check_width, resolve_column_widths, wrap_in_columns,
};
pub use doctree::{Attributes, ImageAttributes, Node, NodeKind, normalize_name};
pub use error::{
    DirectiveError, ErrorSeverity, ParseDiagnostics, ParseWarning, R2bError, RecoverableError,
    SettingsError, SourceLocation, TranslateError,
};
pub use frontmatter::{DocumentMeta, FrontMatter, FrontmatterError, split_front_matter};
pub use parse::{ParseOptions, ParseOutcome, ParserPipeline};
pub use settings::{
    BEAMER_DEFAULTS, NotesMode, OptionKind, OptionSpec, Settings, SettingsBuilder, SettingsSpec,
    beamer_settings_spec, latex_settings_spec, string_to_bool,
};
pub use slug::{Slugger, extract_custom_id, make_id};
