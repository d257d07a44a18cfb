//! `\includegraphics` construction shared by the LaTeX and Beamer translators.

use r2b_core::ImageAttributes;

/// Converts an image length to LaTeX.
///
/// Percentages become fractions of `\linewidth`, bare numbers and pixels
/// become points, anything else (`3cm`, `0.5\textwidth`) is kept.
pub fn latex_image_length(length: &str) -> String {
    let length = length.trim();
    let split = length
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(length.len());
    let (amount, unit) = length.split_at(split);
    let Ok(value) = amount.parse::<f64>() else {
        return length.to_string();
    };
    match unit.trim() {
        "%" => format!("{:.3}\\linewidth", value / 100.0),
        "" | "px" => format!("{}pt", amount),
        _ => length.to_string(),
    }
}

/// Renders an image as `\includegraphics` with its wrappers.
///
/// `inline` images sit in running text; block images get their own lines.
/// `default_height` applies when neither width nor height is set.
pub fn include_graphics(
    image: &ImageAttributes,
    inline: bool,
    default_height: Option<&str>,
) -> String {
    let scalebox = image
        .scale
        .map(|scale| format!("\\scalebox{{{:.6}}}{{", scale / 100.0));
    // Wrappers opened before the image, innermost last.
    let mut pre: Vec<&str> = Vec::new();
    let mut post: Vec<&str> = Vec::new();
    let mut options = Vec::new();

    if let Some(open) = &scalebox {
        pre.push(open.as_str());
        post.push("}");
    }
    if let Some(width) = &image.width {
        options.push(format!("width={}", latex_image_length(width)));
    }
    if let Some(height) = &image.height {
        options.push(format!("height={}", latex_image_length(height)));
    }
    if image.width.is_none()
        && image.height.is_none()
        && let Some(height) = default_height
    {
        options.push(format!("height={}", height));
    }

    if let Some(align) = &image.align {
        let wrapper = match (inline, align.as_str()) {
            (true, "bottom") => Some(("", "")),
            (true, "middle") => Some(("\\raisebox{-0.5\\height}{", "}")),
            (true, "top") => Some(("\\raisebox{-\\height}{", "}")),
            (false, "center") => Some(("{\\hfill", "\\hfill}")),
            (false, "left") => Some(("{", "\\hfill}")),
            (false, "right") => Some(("{\\hfill", "}")),
            _ => None,
        };
        match wrapper {
            Some((open, close)) => {
                pre.push(open);
                post.push(close);
            }
            None => log::warn!(
                "image '{}': alignment '{}' is not supported for {} images",
                image.uri,
                align,
                if inline { "inline" } else { "block" }
            ),
        }
    }
    if !inline {
        pre.push("\n");
        post.push("\n");
    }

    let mut out = String::new();
    for open in pre.iter().rev() {
        out.push_str(open);
    }
    out.push_str("\\includegraphics");
    if !options.is_empty() {
        out.push('[');
        out.push_str(&options.join(","));
        out.push(']');
    }
    out.push('{');
    out.push_str(&image.uri);
    out.push('}');
    for close in &post {
        out.push_str(close);
    }
    out
}
