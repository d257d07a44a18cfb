//! Settings schema, defaults and the typed settings the translators read.
//!
//! Writers describe their options with a [`SettingsSpec`]. A
//! [`SettingsBuilder`] seeds values from the schema defaults, overlays the
//! writer defaults, validates user values and produces an immutable
//! [`Settings`].

use crate::error::SettingsError;
use once_cell::sync::Lazy;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// How an option value is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    /// Free text.
    Text,
    /// Boolean-like string (`false`, `true`, `0`, `1`).
    Flag,
    /// One of a fixed set of values.
    Choice(&'static [&'static str]),
}

/// A single recognized option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionSpec {
    /// Flat option key (also the long command line flag).
    pub name: &'static str,
    /// Help text.
    pub help: &'static str,
    /// Schema default.
    pub default: &'static str,
    /// Value interpretation.
    pub kind: OptionKind,
}

/// A group of options contributed by a writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsSpec {
    /// Group title.
    pub title: &'static str,
    /// Group description.
    pub description: &'static str,
    /// Recognized options, in display order.
    pub options: Vec<OptionSpec>,
}

impl SettingsSpec {
    /// Looks up an option by name.
    pub fn option(&self, name: &str) -> Option<&OptionSpec> {
        self.options.iter().find(|o| o.name == name)
    }
}

/// Values accepted by `shownotes`.
pub const SHOWNOTES_OPTIONS: &[&str] = &["false", "true", "only", "left", "right", "top", "bottom"];

/// Where speaker notes are shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NotesMode {
    /// Notes are hidden.
    #[default]
    False,
    /// Notes are shown on the default (right) second screen.
    True,
    /// Only the notes are shown.
    Only,
    /// Notes on a second screen to the left.
    Left,
    /// Notes on a second screen to the right.
    Right,
    /// Notes on a second screen above.
    Top,
    /// Notes on a second screen below.
    Bottom,
}

impl NotesMode {
    /// Option value for this mode.
    pub fn as_str(self) -> &'static str {
        match self {
            NotesMode::False => "false",
            NotesMode::True => "true",
            NotesMode::Only => "only",
            NotesMode::Left => "left",
            NotesMode::Right => "right",
            NotesMode::Top => "top",
            NotesMode::Bottom => "bottom",
        }
    }

    /// Whether the `pgfpages` package is needed, and the `\setbeameroption` value.
    pub fn beamer_option(self) -> (bool, String) {
        let position = match self {
            NotesMode::False => return (false, "hide notes".to_string()),
            NotesMode::Only => return (true, "show only notes".to_string()),
            NotesMode::Left => "left",
            NotesMode::Right | NotesMode::True => "right",
            NotesMode::Top => "top",
            NotesMode::Bottom => "bottom",
        };
        (true, format!("show notes on second screen={}", position))
    }
}

impl FromStr for NotesMode {
    type Err = SettingsError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "false" => Ok(NotesMode::False),
            "true" => Ok(NotesMode::True),
            "only" => Ok(NotesMode::Only),
            "left" => Ok(NotesMode::Left),
            "right" => Ok(NotesMode::Right),
            "top" => Ok(NotesMode::Top),
            "bottom" => Ok(NotesMode::Bottom),
            _ => Err(SettingsError::InvalidChoice {
                name: "shownotes".to_string(),
                value: value.to_string(),
                choices: SHOWNOTES_OPTIONS.join(", "),
            }),
        }
    }
}

impl fmt::Display for NotesMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Turns a boolean-like string into a bool.
///
/// Unrecognized strings yield `default`. Writers pass `false`: the schema
/// defaults are `true`, so a value that cannot be understood is taken to mean
/// something other than the default.
pub fn string_to_bool(value: &str, default: bool) -> bool {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => true,
        "false" | "0" => false,
        _ => default,
    }
}

static LATEX_SPEC: Lazy<SettingsSpec> = Lazy::new(|| SettingsSpec {
    title: "LaTeX-Specific Options",
    description: "Options for the base LaTeX writer",
    options: vec![
        OptionSpec {
            name: "documentclass",
            help: "Specify documentclass.",
            default: "article",
            kind: OptionKind::Text,
        },
        OptionSpec {
            name: "documentoptions",
            help: "Specify document options. Multiple options can be given, separated by commas.",
            default: "10pt,a4paper",
            kind: OptionKind::Text,
        },
        OptionSpec {
            name: "use_latex_toc",
            help: "Let LaTeX print the table of contents.",
            default: "false",
            kind: OptionKind::Flag,
        },
        OptionSpec {
            name: "output_encoding",
            help: "Text encoding of the generated file.",
            default: "utf-8",
            kind: OptionKind::Text,
        },
        OptionSpec {
            name: "hyperlink_color",
            help: "Color of any hyperlinks embedded in text. Empty disables coloured links.",
            default: "blue",
            kind: OptionKind::Text,
        },
    ],
});

static BEAMER_SPEC: Lazy<SettingsSpec> = Lazy::new(|| {
    let mut options = vec![
        OptionSpec {
            name: "theme",
            help: "Specify theme.",
            default: "Warsaw",
            kind: OptionKind::Text,
        },
        OptionSpec {
            name: "overlaybullets",
            help: "Overlay bulleted items. Put [<+-| alert@+>] at the end of \\begin{itemize} \
                   so that Beamer creates an overlay for each bulleted item and the \
                   presentation reveals one bullet at a time.",
            default: "true",
            kind: OptionKind::Flag,
        },
        OptionSpec {
            name: "centerfigs",
            help: "Center figures. All includegraphics statements will be put inside center \
                   environments.",
            default: "true",
            kind: OptionKind::Flag,
        },
        OptionSpec {
            name: "documentoptions",
            help: "Specify document options. Multiple options can be given, separated by commas.",
            default: "",
            kind: OptionKind::Text,
        },
        OptionSpec {
            name: "shownotes",
            help: "Print embedded notes along with the slides. 'false' hides them, 'only' shows \
                   only notes, 'left', 'right', 'top', 'bottom' place them relative to the \
                   annotated slide.",
            default: "false",
            kind: OptionKind::Choice(SHOWNOTES_OPTIONS),
        },
    ];
    // The first two LaTeX options (documentclass, documentoptions) are fixed by Beamer.
    options.extend(LATEX_SPEC.options.iter().skip(2).cloned());
    SettingsSpec {
        title: "Beamer options",
        description: "These are derived almost entirely from the LaTeX2e options",
        options,
    }
});

/// Defaults the Beamer writer applies over its schema.
pub const BEAMER_DEFAULTS: &[(&str, &str)] = &[
    ("use_latex_toc", "true"),
    ("output_encoding", "latin-1"),
    ("documentclass", "beamer"),
    // Text starts at the top of each slide; 'c' centres it vertically.
    ("documentoptions", "t"),
];

/// Schema of the base LaTeX writer.
pub fn latex_settings_spec() -> &'static SettingsSpec {
    &LATEX_SPEC
}

/// Schema of the Beamer writer.
pub fn beamer_settings_spec() -> &'static SettingsSpec {
    &BEAMER_SPEC
}

/// Resolved, read-only settings for one conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Beamer theme; empty for none.
    pub theme: String,
    /// Reveal list items one at a time.
    pub overlay_bullets: bool,
    /// Wrap images in a center environment.
    pub center_figures: bool,
    /// LaTeX document class.
    pub documentclass: String,
    /// Document class options.
    pub documentoptions: String,
    /// Speaker notes display.
    pub show_notes: NotesMode,
    /// Use `\tableofcontents` instead of generated lists.
    pub use_latex_toc: bool,
    /// Output encoding label.
    pub output_encoding: String,
    /// Hyperlink colour for the base head; empty disables it.
    pub hyperlink_color: String,
}

impl Default for Settings {
    /// Beamer writer defaults.
    fn default() -> Self {
        SettingsBuilder::new(beamer_settings_spec(), BEAMER_DEFAULTS)
            .build()
            .unwrap_or_else(|err| unreachable!("built-in defaults are valid: {err}"))
    }
}

/// Accumulates raw option values and builds [`Settings`].
#[derive(Debug, Clone)]
pub struct SettingsBuilder {
    spec: &'static SettingsSpec,
    values: BTreeMap<String, String>,
}

impl SettingsBuilder {
    /// Seeds the builder from schema defaults, then writer defaults.
    pub fn new(spec: &'static SettingsSpec, defaults: &[(&str, &str)]) -> Self {
        let mut values: BTreeMap<String, String> = latex_settings_spec()
            .options
            .iter()
            .chain(spec.options.iter())
            .map(|o| (o.name.to_string(), o.default.to_string()))
            .collect();
        for (key, value) in defaults {
            values.insert((*key).to_string(), (*value).to_string());
        }
        Self { spec, values }
    }

    /// Sets an option, rejecting unknown keys and invalid choices.
    pub fn set(&mut self, key: &str, value: impl Into<String>) -> Result<&mut Self, SettingsError> {
        let key = key.trim().replace('-', "_");
        let option = self
            .spec
            .option(&key)
            .ok_or_else(|| SettingsError::UnknownOption(key.clone()))?;
        let value = value.into();
        if let OptionKind::Choice(choices) = option.kind
            && !choices.iter().any(|c| c.eq_ignore_ascii_case(&value))
        {
            return Err(SettingsError::InvalidChoice {
                name: key,
                value,
                choices: choices.join(", "),
            });
        }
        self.values.insert(key, value);
        Ok(self)
    }

    /// Sets every pair in order.
    pub fn extend<I, K, V>(&mut self, pairs: I) -> Result<&mut Self, SettingsError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        for (key, value) in pairs {
            self.set(key.as_ref(), value)?;
        }
        Ok(self)
    }

    /// Current raw value of an option.
    pub fn value(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Produces typed settings.
    pub fn build(&self) -> Result<Settings, SettingsError> {
        let text = |key: &str| self.value(key).unwrap_or_default().to_string();
        let flag = |key: &str| string_to_bool(self.value(key).unwrap_or_default(), false);
        Ok(Settings {
            theme: text("theme"),
            overlay_bullets: flag("overlaybullets"),
            center_figures: flag("centerfigs"),
            documentclass: text("documentclass"),
            documentoptions: text("documentoptions"),
            show_notes: self.value("shownotes").unwrap_or("false").parse()?,
            use_latex_toc: flag("use_latex_toc"),
            output_encoding: text("output_encoding"),
            hyperlink_color: text("hyperlink_color"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn beamer_builder() -> SettingsBuilder {
        SettingsBuilder::new(beamer_settings_spec(), BEAMER_DEFAULTS)
    }

    #[test]
    fn beamer_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.theme, "Warsaw");
        assert!(settings.overlay_bullets);
        assert!(settings.center_figures);
        assert_eq!(settings.documentclass, "beamer");
        assert_eq!(settings.documentoptions, "t");
        assert_eq!(settings.show_notes, NotesMode::False);
        assert!(settings.use_latex_toc);
        assert_eq!(settings.output_encoding, "latin-1");
        assert_eq!(settings.hyperlink_color, "blue");
    }

    #[test]
    fn beamer_spec_skips_fixed_latex_options() {
        let spec = beamer_settings_spec();
        let names: Vec<_> = spec.options.iter().map(|o| o.name).collect();
        assert_eq!(
            names,
            [
                "theme",
                "overlaybullets",
                "centerfigs",
                "documentoptions",
                "shownotes",
                "use_latex_toc",
                "output_encoding",
                "hyperlink_color",
            ]
        );
        assert!(spec.option("documentclass").is_none());
    }

    #[test]
    fn boolean_like_strings() {
        assert!(string_to_bool("TRUE", false));
        assert!(string_to_bool("1", false));
        assert!(!string_to_bool("0", true));
        assert!(!string_to_bool("yes", false));
        assert!(string_to_bool("yes", true));
    }

    #[test]
    fn unrecognized_flag_values_mean_off() {
        let mut builder = beamer_builder();
        builder.set("overlaybullets", "maybe").unwrap();
        builder.set("centerfigs", "0").unwrap();
        let settings = builder.build().unwrap();
        assert!(!settings.overlay_bullets);
        assert!(!settings.center_figures);
    }

    #[test]
    fn shownotes_choices_are_enforced() {
        let mut builder = beamer_builder();
        let err = builder.set("shownotes", "sideways").unwrap_err();
        assert!(matches!(err, SettingsError::InvalidChoice { ref value, .. } if value == "sideways"));
        builder.set("shownotes", "Left").unwrap();
        assert_eq!(builder.build().unwrap().show_notes, NotesMode::Left);
    }

    #[test]
    fn unknown_options_are_rejected() {
        let mut builder = beamer_builder();
        assert_eq!(
            builder.set("documentclass", "article").unwrap_err(),
            SettingsError::UnknownOption("documentclass".into())
        );
        assert!(builder.set("no-such-option", "1").is_err());
        builder.set("use-latex-toc", "false").unwrap();
        assert!(!builder.build().unwrap().use_latex_toc);
    }

    #[test]
    fn notes_modes_map_to_beamer_options() {
        let expected = [
            ("false", false, "hide notes"),
            ("true", true, "show notes on second screen=right"),
            ("only", true, "show only notes"),
            ("left", true, "show notes on second screen=left"),
            ("right", true, "show notes on second screen=right"),
            ("top", true, "show notes on second screen=top"),
            ("bottom", true, "show notes on second screen=bottom"),
        ];
        for (value, pgfpages, option) in expected {
            let mode: NotesMode = value.parse().unwrap();
            assert_eq!(mode.as_str(), value);
            assert_eq!(mode.beamer_option(), (pgfpages, option.to_string()), "{value}");
        }
    }
}
