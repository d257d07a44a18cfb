//! Text escaping for LaTeX output.

/// Escapes LaTeX special characters.
///
/// ```
/// use r2b_beamer::latex::encode;
///
/// assert_eq!(encode("50% of $x_1$"), r"50\% of \$x\_1\$");
/// ```
pub fn encode(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => result.push_str(r"\textbackslash{}"),
            '{' => result.push_str(r"\{"),
            '}' => result.push_str(r"\}"),
            '$' => result.push_str(r"\$"),
            '&' => result.push_str(r"\&"),
            '%' => result.push_str(r"\%"),
            '#' => result.push_str(r"\#"),
            '_' => result.push_str(r"\_"),
            '~' => result.push_str(r"\textasciitilde{}"),
            '^' => result.push_str(r"\textasciicircum{}"),
            '<' => result.push_str(r"\textless{}"),
            '>' => result.push_str(r"\textgreater{}"),
            '|' => result.push_str(r"\textbar{}"),
            // Brackets would be read as optional arguments after macros.
            '[' => result.push_str("{[}"),
            ']' => result.push_str("{]}"),
            _ => result.push(c),
        }
    }
    result
}

/// Escapes text inside a literal block: spacing and line breaks survive.
pub fn encode_literal(text: &str) -> String {
    encode(text).replace(' ', "~").replace('\n', "\\\\\n")
}

/// Escapes a URL for `\href`.
pub fn encode_url(url: &str) -> String {
    url.replace('%', r"\%").replace('#', r"\#")
}

/// Maps an output encoding label to the `inputenc` option.
pub fn latex_encoding(label: &str) -> String {
    let label = label.trim().to_ascii_lowercase();
    match label.as_str() {
        "latin-1" | "latin1" | "iso-8859-1" | "iso8859-1" | "l1" => "latin1".to_string(),
        "latin-9" | "iso-8859-15" => "latin9".to_string(),
        "utf-8" | "utf8" => "utf8".to_string(),
        "ascii" | "us-ascii" => "ascii".to_string(),
        "windows-1252" | "cp1252" => "cp1252".to_string(),
        _ => label.replace(['-', '_'], ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_every_special_character() {
        assert_eq!(encode(r"a\b"), r"a\textbackslash{}b");
        assert_eq!(encode("{x}"), r"\{x\}");
        assert_eq!(encode("R&D #1 ~ 2^3"), r"R\&D \#1 \textasciitilde{} 2\textasciicircum{}3");
        assert_eq!(encode("a<b>c|d"), r"a\textless{}b\textgreater{}c\textbar{}d");
        assert_eq!(encode("[opt]"), "{[}opt{]}");
    }

    #[test]
    fn plain_text_is_untouched() {
        assert_eq!(encode("Grüße, world."), "Grüße, world.");
    }

    #[test]
    fn literal_text_keeps_layout() {
        assert_eq!(encode_literal("a  b\nc_d"), "a~~b\\\\\nc\\_d");
    }

    #[test]
    fn urls_escape_percent_and_hash() {
        assert_eq!(
            encode_url("http://x.org/a%20b#frag"),
            r"http://x.org/a\%20b\#frag"
        );
    }

    #[test]
    fn encoding_labels_map_to_inputenc() {
        assert_eq!(latex_encoding("latin-1"), "latin1");
        assert_eq!(latex_encoding("UTF-8"), "utf8");
        assert_eq!(latex_encoding("koi8-r"), "koi8r");
    }
}
