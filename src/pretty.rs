//! HTML rendering of the JSON blobs held on department users

use serde_json::Value as Json;

/// Alesco payroll keys, in display order
pub const ALESCO_KEYS: [&str; 19] = [
    "FIRST_NAME",
    "SECOND_NAME",
    "SURNAME",
    "EMPLOYEE_NO",
    "PAYPOINT",
    "PAYPOINT_DESC",
    "MANAGER_POS#",
    "MANAGER_NAME",
    "JOB_NO",
    "FIRST_COMMENCE",
    "OCCUP_TERM_DATE",
    "POSITION_NO",
    "OCCUP_POS_TITLE",
    "LOC_DESC",
    "CLEVEL1_ID",
    "CLEVEL2_DESC",
    "CLEVEL3_DESC",
    "EMP_STAT_DESC",
    "GEO_LOCATION_DESC",
];

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

fn scalar(value: &Json) -> String {
    match value {
        Json::Null => String::new(),
        Json::String(s) => escape_html(s),
        other => escape_html(&other.to_string()),
    }
}

/// Keys shared by every element, if the array is a non-empty list of objects
/// with identical key sets.
fn common_keys(items: &[Json]) -> Option<Vec<&String>> {
    let first = items.first()?.as_object()?;
    let keys: Vec<&String> = first.keys().collect();
    for item in &items[1..] {
        let obj = item.as_object()?;
        if obj.len() != keys.len() || !keys.iter().all(|k| obj.contains_key(*k)) {
            return None;
        }
    }
    Some(keys)
}

fn render(value: &Json, out: &mut String) {
    match value {
        Json::Object(map) => {
            if map.is_empty() {
                return;
            }
            out.push_str("<table border=\"1\">");
            for (key, item) in map {
                out.push_str(&format!("<tr><th>{}</th><td>", escape_html(key)));
                render(item, out);
                out.push_str("</td></tr>");
            }
            out.push_str("</table>");
        }
        Json::Array(items) => {
            if items.is_empty() {
                return;
            }
            if let Some(keys) = common_keys(items) {
                out.push_str("<table border=\"1\"><thead><tr>");
                for key in &keys {
                    out.push_str(&format!("<th>{}</th>", escape_html(key)));
                }
                out.push_str("</tr></thead><tbody>");
                for item in items {
                    out.push_str("<tr>");
                    for key in &keys {
                        out.push_str("<td>");
                        if let Some(cell) = item.get(key.as_str()) {
                            render(cell, out);
                        }
                        out.push_str("</td>");
                    }
                    out.push_str("</tr>");
                }
                out.push_str("</tbody></table>");
            } else {
                out.push_str("<ul>");
                for item in items {
                    out.push_str("<li>");
                    render(item, out);
                    out.push_str("</li>");
                }
                out.push_str("</ul>");
            }
        }
        other => out.push_str(&scalar(other)),
    }
}

/// Render an arbitrary JSON value as nested HTML tables and lists
pub fn json_to_html(value: &Json) -> String {
    let mut out = String::new();
    render(value, &mut out);
    out
}

fn is_blank(value: &Json) -> bool {
    match value {
        Json::Null => true,
        Json::String(s) => s.is_empty(),
        Json::Array(a) => a.is_empty(),
        Json::Object(o) => o.is_empty(),
        _ => false,
    }
}

/// HTML for `org_data` / `ad_data` style fields; blank values give `None`.
pub fn pretty_field(value: Option<&Json>) -> Option<String> {
    value.filter(|v| !is_blank(v)).map(json_to_html)
}

/// Fixed-order Alesco table; keys the record lacks render as empty cells.
pub fn alesco_table(value: Option<&Json>) -> Option<String> {
    let data = value.filter(|v| !is_blank(v))?;
    let mut out = String::from("<table border=\"1\">");
    for key in ALESCO_KEYS {
        let cell = data.get(key).map(scalar).unwrap_or_default();
        out.push_str(&format!("<tr><th>{}</th><td>{}</td></tr>", escape_html(key), cell));
    }
    out.push_str("</table>");
    Some(out)
}
