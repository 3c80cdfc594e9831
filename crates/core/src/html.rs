//! Markup generation and stripping.
//!
//! Stripping is a regex approximation, not a parser. It is correct for
//! well-formed, simple markup; malformed or deeply nested input gets a best
//! effort.

use crate::table::TableModel;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static RE_SCRIPT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>").unwrap());
static RE_STYLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<style\b[^>]*>.*?</style\s*>").unwrap());
static RE_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());
static RE_ENTITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&(nbsp|amp|lt|gt|quot|#0?39);").unwrap());
static RE_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

const BASE_STYLE: &str = "        body {
            font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif;
            line-height: 1.6;
            max-width: 800px;
            margin: 0 auto;
            padding: 20px;
            color: #333;
        }";

const PRE_STYLE: &str = "
        pre {
            white-space: pre-wrap;
            word-wrap: break-word;
            background: #f5f5f5;
            padding: 15px;
            border-radius: 5px;
            border-left: 4px solid #007bff;
        }";

const TABLE_STYLE: &str = "        body {
            font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif;
            margin: 20px;
            color: #333;
        }
        table {
            border-collapse: collapse;
            width: 100%;
            margin: 20px 0;
        }
        th, td {
            border: 1px solid #ddd;
            padding: 8px;
            text-align: left;
        }
        th {
            background-color: #f2f2f2;
            font-weight: bold;
        }
        tr:nth-child(even) {
            background-color: #f9f9f9;
        }";

/// Escape `& < > " '` for use in markup text or attribute values.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }
    out
}

/// Decode the fixed entity set in a single pass. `&nbsp;` becomes a plain
/// space; any other entity is left as-is.
pub fn unescape(text: &str) -> String {
    RE_ENTITY
        .replace_all(text, |caps: &Captures| {
            match &caps[1] {
                "nbsp" => " ",
                "amp" => "&",
                "lt" => "<",
                "gt" => ">",
                "quot" => "\"",
                _ => "'",
            }
        })
        .into_owned()
}

/// Reduce markup to plain text.
///
/// Drops `<script>` and `<style>` blocks, then every remaining tag, decodes
/// entities, collapses whitespace runs to one space and trims.
pub fn to_plain_text(markup: &str) -> String {
    let text = RE_SCRIPT.replace_all(markup, "");
    let text = RE_STYLE.replace_all(&text, "");
    let text = RE_TAG.replace_all(&text, "");
    let text = unescape(&text);
    RE_WHITESPACE.replace_all(&text, " ").trim().to_string()
}

fn page(title: &str, style: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>
<html lang=\"en\">
<head>
    <meta charset=\"UTF-8\">
    <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">
    <title>{title}</title>
    <style>
{style}
    </style>
</head>
<body>
{body}
</body>
</html>",
        title = escape(title),
        style = style,
        body = body,
    )
}

/// Page for plain text: the escaped text inside a `<pre>` block.
pub fn text_page(text: &str) -> String {
    let style = format!("{}{}", BASE_STYLE, PRE_STYLE);
    let body = format!(
        "    <h1>Converted Text Document</h1>\n    <pre>{}</pre>",
        escape(text)
    );
    page("Converted Document", &style, &body)
}

/// Page around already-rendered markup fragments.
pub fn document_page(fragments: &str) -> String {
    page("Converted Document", BASE_STYLE, &format!("    {}", fragments))
}

/// Page holding a styled table. Row 0 renders as header cells.
pub fn table_page(title: &str, heading: &str, table: &TableModel) -> String {
    let body = format!(
        "    <h1>{}</h1>\n{}",
        escape(heading),
        render_table(table)
    );
    page(title, TABLE_STYLE, &body)
}

/// `<table>` markup for a table model, every cell escaped.
pub fn render_table(table: &TableModel) -> String {
    let mut out = String::from("    <table>\n");
    for (index, row) in table.rows.iter().enumerate() {
        let tag = if index == 0 { "th" } else { "td" };
        out.push_str("        <tr>");
        for cell in row {
            out.push_str(&format!("<{tag}>{}</{tag}>", escape(cell), tag = tag));
        }
        out.push_str("</tr>\n");
    }
    out.push_str("    </table>");
    out
}
