//! r2b: convert Markdown slides (or JSON document trees) to Beamer LaTeX.

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, ValueEnum};
use encoding_rs::Encoding;
use r2b_beamer::latex::latex_encoding;
use r2b_beamer::{BeamerWriter, LatexWriter, Writer, convert_markdown_with};
use r2b_core::{
    DirectiveRegistry, Node, ParseDiagnostics, ParseOptions, ParserPipeline, Settings,
    SettingsBuilder,
};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Convert Markdown slides to Beamer-flavoured LaTeX.
#[derive(Parser, Debug)]
#[command(name = "r2b")]
#[command(version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    r2b talk.md                      Write talk.tex next to talk.md
    r2b talk.md -o slides.tex        Choose the output file
    r2b --shownotes right talk.md    Notes on a second screen
    r2b --tree talk.json --stdout    Translate a serialized tree

A lone top-level heading becomes the document title, so its content lands
outside any frame. Pass --no-doctitle to keep it as a slide.")]
struct Args {
    /// Input files (Markdown, or JSON document trees with --tree)
    #[arg(required = true, value_name = "INPUT")]
    inputs: Vec<PathBuf>,

    /// Inputs are JSON document trees instead of Markdown
    #[arg(long)]
    tree: bool,

    /// Output file (single input only)
    #[arg(short, long, conflicts_with_all = ["output_dir", "stdout"])]
    output: Option<PathBuf>,

    /// Directory for generated files (default: next to each input)
    #[arg(long, conflicts_with = "stdout")]
    output_dir: Option<PathBuf>,

    /// Print output to stdout instead of writing files
    #[arg(long)]
    stdout: bool,

    /// Target format
    #[arg(long, value_enum, default_value_t = WriterKind::Beamer)]
    writer: WriterKind,

    /// YAML file of option values (flat keys, as accepted by --set)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Set a writer option, e.g. --set hyperlink_color=red
    #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_pair)]
    set: Vec<(String, String)>,

    /// Beamer theme
    #[arg(long)]
    theme: Option<String>,

    /// Reveal bullets one at a time
    #[arg(long, value_name = "BOOL")]
    overlaybullets: Option<String>,

    /// Center figures
    #[arg(long, value_name = "BOOL")]
    centerfigs: Option<String>,

    /// Document class options
    #[arg(long, value_name = "OPTIONS")]
    documentoptions: Option<String>,

    /// Notes display: false, true, only, left, right, top or bottom
    #[arg(long, value_name = "MODE")]
    shownotes: Option<String>,

    /// Write the parsed document tree as JSON instead of LaTeX
    #[arg(long, conflicts_with = "tree")]
    dump_tree: bool,

    /// Keep a lone top-level heading as a section instead of the title
    #[arg(long)]
    no_doctitle: bool,

    /// Fail an input when its directives report errors
    #[arg(long)]
    strict: bool,

    /// Write the files referenced by the output (images) to FILE
    #[arg(long, value_name = "FILE")]
    record_dependencies: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum WriterKind {
    Beamer,
    Latex,
}

impl WriterKind {
    fn writer(self) -> &'static (dyn Writer + Sync) {
        match self {
            WriterKind::Beamer => &BeamerWriter,
            WriterKind::Latex => &LatexWriter,
        }
    }
}

/// How text becomes output bytes.
#[derive(Debug, Clone, Copy, PartialEq)]
enum OutputEncoding {
    /// One byte per code point up to `max`, matching `inputenc` latin1 or ascii.
    SingleByte { name: &'static str, max: u32 },
    Standard(&'static Encoding),
}

impl OutputEncoding {
    /// Resolves a label to the byte encoding `inputenc` will expect.
    fn for_label(label: &str) -> Result<Self> {
        match latex_encoding(label).as_str() {
            "latin1" => return Ok(Self::SingleByte { name: "ISO-8859-1", max: 0xFF }),
            "ascii" => return Ok(Self::SingleByte { name: "US-ASCII", max: 0x7F }),
            _ => {}
        }
        let label = label.trim();
        Encoding::for_label(label.as_bytes())
            .or_else(|| Encoding::for_label(label.replace(['-', '_'], "").as_bytes()))
            .map(Self::Standard)
            .ok_or_else(|| anyhow!("unknown output encoding '{}'", label))
    }

    fn name(self) -> &'static str {
        match self {
            Self::SingleByte { name, .. } => name,
            Self::Standard(encoding) => encoding.name(),
        }
    }

    /// Encodes `text`, failing on the first character the encoding lacks.
    fn encode(self, text: &str) -> Result<Vec<u8>> {
        let unencodable = |c: char| {
            anyhow!(
                "character '{}' (U+{:04X}) cannot be written as {}",
                c,
                c as u32,
                self.name()
            )
        };
        match self {
            Self::SingleByte { max, .. } => text
                .chars()
                .map(|c| {
                    u8::try_from(c as u32)
                        .ok()
                        .filter(|b| u32::from(*b) <= max)
                        .ok_or_else(|| unencodable(c))
                })
                .collect(),
            Self::Standard(encoding) => {
                let (bytes, _, had_errors) = encoding.encode(text);
                if had_errors {
                    let mut buffer = [0u8; 4];
                    let c = text
                        .chars()
                        .find(|c| encoding.encode(c.encode_utf8(&mut buffer)).2)
                        .unwrap_or(char::REPLACEMENT_CHARACTER);
                    return Err(unencodable(c));
                }
                Ok(bytes.into_owned())
            }
        }
    }
}

/// One converted input, ready to be written.
struct Rendered {
    input: PathBuf,
    output: Vec<u8>,
    dependencies: Vec<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if args.output.is_some() && args.inputs.len() > 1 {
        bail!("--output accepts a single input; use --output-dir for several");
    }

    let writer = args.writer.writer();
    let settings = resolve_settings(&args, writer)?;
    let encoding = OutputEncoding::for_label(&settings.output_encoding)?;
    log::debug!(
        "writer '{}' with encoding {}",
        writer.name(),
        encoding.name()
    );

    let results: Vec<Result<Rendered>> = args
        .inputs
        .par_iter()
        .map(|input| {
            process_file(input, &args, writer, &settings, encoding)
                .with_context(|| format!("Failed to convert {}", input.display()))
        })
        .collect();

    let mut failures = 0;
    let mut dependencies: Vec<String> = Vec::new();
    let mut stdout = std::io::stdout().lock();
    for result in results {
        let rendered = match result {
            Ok(rendered) => rendered,
            Err(err) => {
                eprintln!("error: {err:#}");
                failures += 1;
                continue;
            }
        };
        if args.stdout {
            stdout.write_all(&rendered.output)?;
        } else {
            let path = output_path(&rendered.input, &args)?;
            fs::write(&path, &rendered.output)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            if args.verbose {
                eprintln!("Written to: {}", path.display());
            }
        }
        for dependency in rendered.dependencies {
            if !dependencies.contains(&dependency) {
                dependencies.push(dependency);
            }
        }
    }
    stdout.flush()?;

    if let Some(path) = &args.record_dependencies {
        let mut listing = dependencies.join("\n");
        if !listing.is_empty() {
            listing.push('\n');
        }
        fs::write(path, listing)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }

    if failures > 0 {
        bail!("{} of {} inputs failed", failures, args.inputs.len());
    }
    Ok(())
}

/// Writer defaults, then the config file, then --set pairs, then dedicated flags.
fn resolve_settings(args: &Args, writer: &dyn Writer) -> Result<Settings> {
    let mut builder = writer.settings_builder();
    if let Some(path) = &args.config {
        let pairs = read_config(path)?;
        builder
            .extend(pairs)
            .with_context(|| format!("Invalid option in {}", path.display()))?;
    }
    builder.extend(args.set.iter().map(|(k, v)| (k.as_str(), v.as_str())))?;
    apply_flags(&mut builder, args)?;
    Ok(builder.build()?)
}

fn apply_flags(builder: &mut SettingsBuilder, args: &Args) -> Result<()> {
    let flags = [
        ("theme", &args.theme),
        ("overlaybullets", &args.overlaybullets),
        ("centerfigs", &args.centerfigs),
        ("documentoptions", &args.documentoptions),
        ("shownotes", &args.shownotes),
    ];
    for (key, value) in flags {
        if let Some(value) = value {
            builder
                .set(key, value.as_str())
                .with_context(|| format!("--{} is not available here", key))?;
        }
    }
    Ok(())
}

fn read_config(path: &Path) -> Result<Vec<(String, String)>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    config_pairs(&text).with_context(|| format!("Invalid config file {}", path.display()))
}

/// Flattens a YAML mapping of scalars into option pairs.
fn config_pairs(text: &str) -> Result<Vec<(String, String)>> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    let values: BTreeMap<String, serde_yaml::Value> = serde_yaml::from_str(text)?;
    values
        .into_iter()
        .map(|(key, value)| {
            let value = match value {
                serde_yaml::Value::String(s) => s,
                serde_yaml::Value::Bool(b) => b.to_string(),
                serde_yaml::Value::Number(n) => n.to_string(),
                serde_yaml::Value::Null => String::new(),
                _ => bail!("option '{}' must be a scalar", key),
            };
            Ok((key, value))
        })
        .collect()
}

fn parse_pair(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", raw))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing option name in '{}'", raw));
    }
    Ok((key.to_string(), value.to_string()))
}

fn process_file(
    input: &Path,
    args: &Args,
    writer: &dyn Writer,
    settings: &Settings,
    encoding: OutputEncoding,
) -> Result<Rendered> {
    log::debug!("processing {}", input.display());
    let text = fs::read_to_string(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let source = input.display().to_string();

    if args.tree {
        let document: Node = serde_json::from_str(&text).context("Invalid document tree")?;
        let translation = writer.translate(&document, settings)?;
        return Ok(Rendered {
            input: input.to_path_buf(),
            output: encoding.encode(&translation.output)?,
            dependencies: translation.dependencies,
        });
    }

    if args.dump_tree {
        let registry = DirectiveRegistry::with_defaults();
        let pipeline = ParserPipeline::new(&registry, parse_options(args));
        let outcome = pipeline.parse_source(&text, Some(&source))?;
        report(&outcome.diagnostics, input, args.strict)?;
        let mut output = serde_json::to_string_pretty(&outcome.document)?;
        output.push('\n');
        return Ok(Rendered {
            input: input.to_path_buf(),
            output: output.into_bytes(),
            dependencies: Vec::new(),
        });
    }

    let conversion =
        convert_markdown_with(&text, Some(&source), writer, settings, parse_options(args))?;
    report(&conversion.diagnostics, input, args.strict)?;
    Ok(Rendered {
        input: input.to_path_buf(),
        output: encoding.encode(&conversion.output)?,
        dependencies: conversion.dependencies,
    })
}

fn parse_options(args: &Args) -> ParseOptions {
    ParseOptions {
        doctitle_xform: !args.no_doctitle,
        ..ParseOptions::default()
    }
}

fn report(diagnostics: &ParseDiagnostics, input: &Path, strict: bool) -> Result<()> {
    for warning in &diagnostics.warnings {
        log::warn!("{}", warning);
    }
    for error in &diagnostics.errors {
        log::error!("{}", error);
    }
    if strict && diagnostics.has_errors() {
        bail!(
            "{} directive error(s) in {}",
            diagnostics.errors.len(),
            input.display()
        );
    }
    Ok(())
}

fn output_path(input: &Path, args: &Args) -> Result<PathBuf> {
    if let Some(output) = &args.output {
        return Ok(output.clone());
    }
    let extension = if args.dump_tree { "json" } else { "tex" };
    let file_name = input
        .file_stem()
        .ok_or_else(|| anyhow!("{} has no file name", input.display()))?;
    let mut path = match &args.output_dir {
        Some(dir) => dir.join(file_name),
        None => input.with_file_name(file_name),
    };
    path.set_extension(extension);
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(argv: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("r2b").chain(argv.iter().copied())).unwrap()
    }

    #[test]
    fn set_pairs_split_on_the_first_equals() {
        assert_eq!(
            parse_pair("hyperlink_color=a=b").unwrap(),
            ("hyperlink_color".to_string(), "a=b".to_string())
        );
        assert!(parse_pair("theme").is_err());
        assert!(parse_pair("=x").is_err());
    }

    #[test]
    fn flags_override_config_and_set() {
        let args = args(&[
            "--set",
            "theme=Madrid",
            "--set",
            "overlaybullets=false",
            "--theme",
            "Berlin",
            "--shownotes",
            "right",
            "talk.md",
        ]);
        let settings = resolve_settings(&args, args.writer.writer()).unwrap();
        assert_eq!(settings.theme, "Berlin");
        assert!(!settings.overlay_bullets);
        assert_eq!(settings.show_notes.as_str(), "right");
    }

    #[test]
    fn beamer_only_flags_fail_for_latex() {
        let args = args(&["--writer", "latex", "--theme", "Warsaw", "talk.md"]);
        assert!(resolve_settings(&args, args.writer.writer()).is_err());
    }

    #[test]
    fn config_files_are_flat_scalar_maps() {
        let pairs = config_pairs("theme: Madrid\noverlaybullets: false\ncenterfigs: 1\n").unwrap();
        assert_eq!(
            pairs,
            vec![
                ("centerfigs".to_string(), "1".to_string()),
                ("overlaybullets".to_string(), "false".to_string()),
                ("theme".to_string(), "Madrid".to_string()),
            ]
        );
        assert!(config_pairs("theme: [a, b]\n").is_err());
        assert!(config_pairs("").unwrap().is_empty());
    }

    #[test]
    fn output_paths() {
        let plain = args(&["slides/talk.md"]);
        assert_eq!(
            output_path(Path::new("slides/talk.md"), &plain).unwrap(),
            PathBuf::from("slides/talk.tex")
        );

        let dir = args(&["--output-dir", "out", "--dump-tree", "slides/talk.md"]);
        assert_eq!(
            output_path(Path::new("slides/talk.md"), &dir).unwrap(),
            PathBuf::from("out/talk.json")
        );

        let explicit = args(&["-o", "deck.tex", "talk.md"]);
        assert_eq!(
            output_path(Path::new("talk.md"), &explicit).unwrap(),
            PathBuf::from("deck.tex")
        );
    }

    #[test]
    fn encoding_labels() {
        let latin1 = OutputEncoding::for_label("latin-1").unwrap();
        assert_eq!(latin1.name(), "ISO-8859-1");
        assert_eq!(
            OutputEncoding::for_label("utf-8").unwrap(),
            OutputEncoding::Standard(encoding_rs::UTF_8)
        );
        assert_eq!(
            OutputEncoding::for_label("cp1252").unwrap(),
            OutputEncoding::Standard(encoding_rs::WINDOWS_1252)
        );
        assert!(OutputEncoding::for_label("klingon").is_err());
    }

    #[test]
    fn latin1_output_matches_inputenc() {
        let latin1 = OutputEncoding::for_label("latin-1").unwrap();
        assert_eq!(latin1.encode("café").unwrap(), b"caf\xe9".to_vec());
        let err = latin1.encode("5 €").unwrap_err();
        assert!(err.to_string().contains("U+20AC"), "{err}");

        let ascii = OutputEncoding::for_label("ascii").unwrap();
        assert!(ascii.encode("café").is_err());
    }

    #[test]
    fn unencodable_characters_fail_instead_of_html_references() {
        let cp1252 = OutputEncoding::for_label("windows-1252").unwrap();
        assert_eq!(cp1252.encode("5 €").unwrap(), b"5 \x80".to_vec());
        let err = cp1252.encode("λ").unwrap_err();
        assert!(err.to_string().contains("U+03BB"), "{err}");
    }

    #[test]
    fn doctitle_promotion_can_be_disabled() {
        assert!(parse_options(&args(&["talk.md"])).doctitle_xform);
        assert!(!parse_options(&args(&["--no-doctitle", "talk.md"])).doctitle_xform);
    }
}
