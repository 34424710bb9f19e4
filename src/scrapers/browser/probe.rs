//! In-page price probes.
//!
//! The scripts run inside the rendered page and always return a JSON string,
//! so an absent node or an empty match list never surfaces as a CDP error.

use crate::extract::parse_price;

/// Script returning the text of the node at `xpath` (JSON string or null).
pub fn xpath_script(xpath: &str) -> String {
    let xpath = serde_json::to_string(xpath).unwrap_or_else(|_| "\"\"".to_string());
    format!(
        r#"(() => {{
    try {{
        const r = document.evaluate({xpath}, document, null, XPathResult.FIRST_ORDERED_NODE_TYPE, null);
        const n = r.singleNodeValue;
        return JSON.stringify(n ? (n.innerText || n.textContent || '') : null);
    }} catch (e) {{
        return JSON.stringify(null);
    }}
}})()"#
    )
}

/// Script returning every won amount near an element labelled with any of
/// `labels` (JSON array of strings).
///
/// A label element is one whose own text is short and contains the label.
/// Its ancestors are searched outward, three levels at most, and the search
/// stops at the first level that contains an amount.
pub fn label_script(labels: &[String]) -> String {
    let labels = serde_json::to_string(labels).unwrap_or_else(|_| "[]".to_string());
    format!(
        r#"(() => {{
    const labels = {labels};
    const out = [];
    for (const el of document.querySelectorAll('body *')) {{
        const own = Array.from(el.childNodes)
            .filter(n => n.nodeType === 3)
            .map(n => n.textContent)
            .join('')
            .trim();
        if (!own || own.length > 20) continue;
        if (!labels.some(l => own.includes(l))) continue;
        let scope = el;
        for (let i = 0; i < 3 && scope; i++) {{
            const text = scope.innerText || scope.textContent || '';
            const found = Array.from(text.matchAll(/(\d[\d,]*)\s*원/g), m => m[1]);
            if (found.length) {{
                out.push(...found);
                break;
            }}
            scope = scope.parentElement;
        }}
    }}
    return JSON.stringify(out);
}})()"#
    )
}

/// Parse probe output strings into amounts.
pub fn amounts(raw: &[String]) -> Vec<u64> {
    raw.iter().filter_map(|s| parse_price(Some(s.as_str()))).collect()
}

/// Largest candidate above `spam_threshold`; smaller amounts are shipping
/// fees and benefits.
pub fn pick_probe_price(candidates: &[u64], spam_threshold: u64) -> Option<u64> {
    candidates
        .iter()
        .copied()
        .filter(|v| *v > spam_threshold)
        .max()
}
