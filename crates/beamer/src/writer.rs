//! Writers: a settings schema plus the translator that produces the output.

use crate::beamer::BeamerTranslator;
use crate::latex::LatexTranslator;
use crate::visitor::walk;
use r2b_core::{
    BEAMER_DEFAULTS, DirectiveRegistry, Node, NodeKind, ParseDiagnostics, ParseOptions,
    ParserPipeline, R2bError, Settings, SettingsBuilder, SettingsSpec, TranslateError,
    beamer_settings_spec, latex_settings_spec,
};

/// Output of one translation.
#[derive(Debug, Clone, PartialEq)]
pub struct Translation {
    /// The generated document.
    pub output: String,
    /// Files referenced by the output (images), in first-use order.
    pub dependencies: Vec<String>,
}

/// Output of a Markdown conversion.
#[derive(Debug, Clone)]
pub struct Conversion {
    /// The generated document.
    pub output: String,
    /// Files referenced by the output.
    pub dependencies: Vec<String>,
    /// Front end warnings and recoverable errors.
    pub diagnostics: ParseDiagnostics,
}

/// A target format.
pub trait Writer {
    /// Short name, as used on the command line.
    fn name(&self) -> &'static str;

    /// Options understood by this writer.
    fn settings_spec(&self) -> &'static SettingsSpec;

    /// Values that override the schema defaults.
    fn settings_defaults(&self) -> &'static [(&'static str, &'static str)];

    /// A settings builder seeded with this writer's defaults.
    fn settings_builder(&self) -> SettingsBuilder {
        SettingsBuilder::new(self.settings_spec(), self.settings_defaults())
    }

    /// Translates a document tree.
    fn translate(
        &self,
        document: &Node,
        settings: &Settings,
    ) -> Result<Translation, TranslateError>;
}

fn check_root(document: &Node) -> Result<(), TranslateError> {
    match document.kind {
        NodeKind::Document => Ok(()),
        _ => Err(TranslateError::invariant(format!(
            "tree root must be a document, found '{}'",
            document.tag_name()
        ))),
    }
}

/// Plain LaTeX.
#[derive(Debug, Clone, Copy, Default)]
pub struct LatexWriter;

impl Writer for LatexWriter {
    fn name(&self) -> &'static str {
        "latex"
    }

    fn settings_spec(&self) -> &'static SettingsSpec {
        latex_settings_spec()
    }

    fn settings_defaults(&self) -> &'static [(&'static str, &'static str)] {
        &[]
    }

    fn translate(
        &self,
        document: &Node,
        settings: &Settings,
    ) -> Result<Translation, TranslateError> {
        check_root(document)?;
        let mut translator = LatexTranslator::new(settings);
        walk(document, None, &mut translator)?;
        Ok(Translation {
            output: translator.astext(),
            dependencies: translator.dependencies().to_vec(),
        })
    }
}

/// Beamer-flavoured LaTeX.
#[derive(Debug, Clone, Copy, Default)]
pub struct BeamerWriter;

impl Writer for BeamerWriter {
    fn name(&self) -> &'static str {
        "beamer"
    }

    fn settings_spec(&self) -> &'static SettingsSpec {
        beamer_settings_spec()
    }

    fn settings_defaults(&self) -> &'static [(&'static str, &'static str)] {
        BEAMER_DEFAULTS
    }

    fn translate(
        &self,
        document: &Node,
        settings: &Settings,
    ) -> Result<Translation, TranslateError> {
        check_root(document)?;
        let mut translator = BeamerTranslator::new(settings);
        walk(document, None, &mut translator)?;
        log::debug!("translated with frame level {}", translator.frame_level());
        Ok(Translation {
            output: translator.astext(),
            dependencies: translator.dependencies().to_vec(),
        })
    }
}

/// Parses Markdown with the default directives and translates it.
///
/// `source` names the input in diagnostic locations.
pub fn convert_markdown(
    input: &str,
    source: Option<&str>,
    writer: &dyn Writer,
    settings: &Settings,
) -> Result<Conversion, R2bError> {
    convert_markdown_with(input, source, writer, settings, ParseOptions::default())
}

/// [`convert_markdown`] with explicit front end options.
pub fn convert_markdown_with(
    input: &str,
    source: Option<&str>,
    writer: &dyn Writer,
    settings: &Settings,
    options: ParseOptions,
) -> Result<Conversion, R2bError> {
    let registry = DirectiveRegistry::with_defaults();
    let pipeline = ParserPipeline::new(&registry, options);
    let outcome = pipeline.parse_source(input, source)?;
    let translation = writer.translate(&outcome.document, settings)?;
    Ok(Conversion {
        output: translation.output,
        dependencies: translation.dependencies,
        diagnostics: outcome.diagnostics,
    })
}

/// Converts Markdown to Beamer-flavoured LaTeX.
///
/// ```
/// use r2b_beamer::markdown_to_beamer;
/// use r2b_core::Settings;
///
/// let conversion = markdown_to_beamer("# Talk\n\n## Slide\n\nHello", &Settings::default()).unwrap();
/// assert!(conversion.output.contains("\\begin{frame}"));
/// ```
pub fn markdown_to_beamer(input: &str, settings: &Settings) -> Result<Conversion, R2bError> {
    convert_markdown(input, None, &BeamerWriter, settings)
}
