//! The dashboard page.
//!
//! A single self-contained HTML document: selector groups, two chart
//! containers and the map frame. The inline script turns each selector
//! change into one request against the JSON endpoints and re-renders the
//! matching view.

use crate::analyzers::{CategoryDimension, TimeDimension};
use crate::maps::{DEFAULT_MAP, MAP_DOCUMENTS};

const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

/// Renders the full dashboard page.
pub fn render_page() -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Accidents</title>
    <script src="{plotly}"></script>
    <style>{css}</style>
</head>
<body>
    <h1>Accidents</h1>
    <div class="selector" id="time-dimension">{time_selector}</div>
    <div id="bar-graph" class="graph"></div>

    <h1>Pie Charts</h1>
    <select id="category">{category_selector}</select>
    <div id="pie-graph" class="graph"></div>

    <h1>Maps</h1>
    <div class="selector" id="map-selector">{map_selector}</div>
    <iframe id="map" width="90%" height="650"></iframe>

    <script>{js}</script>
</body>
</html>"#,
        plotly = PLOTLY_CDN,
        css = inline_css(),
        js = inline_javascript(),
        time_selector = render_time_selector(),
        category_selector = render_category_selector(),
        map_selector = render_map_selector(),
    )
}

fn radio(group: &str, value: &str, label: &str, checked: bool) -> String {
    format!(
        r#"<label><input type="radio" name="{group}" value="{value}"{checked}> {label}</label>"#,
        group = group,
        value = escape_html(value),
        label = escape_html(label),
        checked = if checked { " checked" } else { "" },
    )
}

fn render_time_selector() -> String {
    TimeDimension::ALL
        .iter()
        .map(|d| radio("time-dimension", d.name(), d.label(), *d == TimeDimension::Year))
        .collect()
}

fn render_category_selector() -> String {
    CategoryDimension::ALL
        .iter()
        .map(|c| {
            let selected = if *c == CategoryDimension::AreaType { " selected" } else { "" };
            format!(
                r#"<option value="{}"{}>{}</option>"#,
                escape_html(c.name()),
                selected,
                escape_html(c.label())
            )
        })
        .collect()
}

fn render_map_selector() -> String {
    MAP_DOCUMENTS
        .iter()
        .map(|doc| radio("map", doc.file_name, doc.label, doc.file_name == DEFAULT_MAP))
        .collect()
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn inline_css() -> &'static str {
    r#"
body { font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", sans-serif; margin: 2rem; color: #222; }
h1 { font-size: 1.6rem; margin-top: 2rem; }
.selector label { margin-right: 1rem; cursor: pointer; }
.graph { min-height: 450px; }
.error { color: #b00020; padding: 1rem; }
iframe { border: 1px solid #ccc; }
"#
}

fn inline_javascript() -> &'static str {
    r#"
async function fetchFigure(url) {
    const response = await fetch(url);
    const body = await response.json();
    if (!response.ok) {
        throw new Error(body.error || response.statusText);
    }
    return body;
}

function showError(id, err) {
    const el = document.getElementById(id);
    Plotly.purge(el);
    el.innerHTML = '<div class="error">' + err.message + '</div>';
}

async function renderFigure(id, url) {
    try {
        const figure = await fetchFigure(url);
        const el = document.getElementById(id);
        el.innerHTML = '';
        Plotly.react(el, figure.data, figure.layout);
    } catch (err) {
        showError(id, err);
    }
}

function updateBar(dimension) {
    return renderFigure('bar-graph', '/api/figures/bar?dimension=' + encodeURIComponent(dimension));
}

function updatePie(category) {
    return renderFigure('pie-graph', '/api/figures/pie?category=' + encodeURIComponent(category));
}

async function updateMap(name) {
    const frame = document.getElementById('map');
    try {
        const response = await fetch('/api/maps/' + encodeURIComponent(name));
        frame.srcdoc = response.ok ? await response.text() : '';
    } catch (err) {
        frame.srcdoc = '';
    }
}

function checkedValue(name) {
    const el = document.querySelector('input[name="' + name + '"]:checked');
    return el ? el.value : null;
}

document.querySelectorAll('input[name="time-dimension"]').forEach(function (el) {
    el.addEventListener('change', function (e) { updateBar(e.target.value); });
});
document.getElementById('category').addEventListener('change', function (e) {
    updatePie(e.target.value);
});
document.querySelectorAll('input[name="map"]').forEach(function (el) {
    el.addEventListener('change', function (e) { updateMap(e.target.value); });
});

updateBar(checkedValue('time-dimension'));
updatePie(document.getElementById('category').value);
updateMap(checkedValue('map'));
"#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_has_all_selectors() {
        let page = render_page();

        for dimension in TimeDimension::ALL {
            assert!(page.contains(&format!(r#"value="{}""#, dimension.name())));
        }
        for category in CategoryDimension::ALL {
            assert!(page.contains(&format!(r#"value="{}""#, category.name())));
        }
        for doc in MAP_DOCUMENTS {
            assert!(page.contains(&format!(r#"value="{}""#, doc.file_name)));
        }
    }

    #[test]
    fn test_page_defaults() {
        let page = render_page();

        assert!(page.contains(r#"value="Year" checked"#));
        assert!(page.contains(r#"value="area_type" selected"#));
        assert!(page.contains(r#"value="map_uk.html" checked"#));
        assert_eq!(page.matches(" checked>").count(), 2);
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html(r#"<a href="x">&</a>"#), "&lt;a href=&quot;x&quot;&gt;&amp;&lt;/a&gt;");
    }
}
