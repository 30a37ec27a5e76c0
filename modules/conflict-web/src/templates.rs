use conflict_common::{Dataset, FilterState, SeverityCategory};

use crate::query::encode_selection;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Overview,
    Clusters,
    Pareto,
    Conclusions,
}

impl Page {
    pub const ALL: [Page; 4] = [Page::Overview, Page::Clusters, Page::Pareto, Page::Conclusions];

    pub fn path(self) -> &'static str {
        match self {
            Page::Overview => "/",
            Page::Clusters => "/clusters",
            Page::Pareto => "/pareto",
            Page::Conclusions => "/conclusions",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Page::Overview => "Overview",
            Page::Clusters => "Conflict Cluster Insights",
            Page::Pareto => "Pareto Modelling of Conflict Severity",
            Page::Conclusions => "Conclusions",
        }
    }
}

/// Wrap page content with the header, navigation and filter sidebar.
///
/// Navigation links carry the current selection so filters survive page changes.
pub fn build_page(page: Page, dataset: &Dataset, state: &FilterState, content: &str) -> String {
    let query = encode_selection(&state.selection);
    let nav: String = Page::ALL
        .iter()
        .map(|p| {
            let class = if *p == page { " class=\"active\"" } else { "" };
            format!(
                r#"<a href="{path}?{query}"{class}>{title}</a>"#,
                path = p.path(),
                query = html_escape(&query),
                title = p.title(),
            )
        })
        .collect();
    let sidebar = render_sidebar(page, dataset, state);

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title} | Armed Conflicts Analytics</title>
<link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css" />
<script src="https://cdn.jsdelivr.net/npm/chart.js@4.4.1/dist/chart.umd.min.js"></script>
<style>
*{{margin:0;padding:0;box-sizing:border-box;}}
body{{font-family:-apple-system,BlinkMacSystemFont,"Segoe UI",Roboto,sans-serif;color:#1a1a1a;background:#fafafa;}}
.header{{background:#1a1a1a;color:#fff;padding:12px 24px;display:flex;align-items:center;justify-content:space-between;}}
.header h1{{font-size:18px;font-weight:600;}}
.header nav a{{color:#ccc;text-decoration:none;margin-left:20px;font-size:14px;}}
.header nav a:hover,.header nav a.active{{color:#fff;}}
.layout{{display:flex;align-items:flex-start;}}
.sidebar{{width:280px;flex-shrink:0;background:#fff;border-right:1px solid #e0e0e0;padding:16px;min-height:calc(100vh - 48px);font-size:13px;}}
.sidebar h2{{font-size:16px;margin-bottom:12px;}}
.sidebar fieldset{{border:none;margin-bottom:14px;}}
.sidebar legend{{font-weight:600;margin-bottom:4px;}}
.sidebar label{{display:block;padding:1px 0;}}
.sidebar input[type=number]{{width:80px;padding:2px 4px;}}
.sidebar .info{{background:#e3f2fd;color:#0d47a1;padding:8px;border-radius:4px;font-weight:600;margin-top:12px;}}
.btn{{display:inline-block;padding:6px 16px;background:#0066cc;color:#fff;border:none;border-radius:4px;text-decoration:none;font-size:13px;cursor:pointer;}}
.btn:hover{{background:#004499;}}
.container{{flex:1;min-width:0;max-width:1100px;margin:0 auto;padding:24px;}}
.container h2{{margin-bottom:12px;}}
.container h3{{margin:20px 0 10px 0;}}
.lead{{color:#555;margin-bottom:16px;}}
.card{{background:#fff;border:1px solid #e0e0e0;border-radius:8px;padding:16px;margin-bottom:12px;}}
.kpis{{display:grid;grid-template-columns:repeat(4,1fr);gap:12px;margin-bottom:16px;}}
.kpi{{text-align:center;}}
.kpi .value{{font-size:30px;font-weight:700;color:#1565c0;}}
.kpi .label{{font-size:13px;color:#888;}}
.figure img{{max-width:100%;border-radius:4px;}}
.error{{background:#fdecea;border:1px solid #f5c6cb;color:#b71c1c;padding:8px 12px;border-radius:4px;font-size:13px;}}
.notice{{background:#fff8e1;border:1px solid #ffecb3;color:#795548;padding:8px 12px;border-radius:4px;font-size:13px;}}
table.summary{{width:100%;font-size:14px;border-collapse:collapse;}}
table.summary th,table.summary td{{padding:4px 8px;border-bottom:1px solid #eee;text-align:left;}}
.caption{{font-size:12px;color:#888;margin-top:16px;}}
.highlight{{padding:18px;border-radius:8px;background:#2b2b2b;color:#fff;margin-bottom:16px;}}
.highlight h3{{color:#ffd700;margin-top:0;}}
.highlight li{{margin-left:20px;}}
#heatmap{{height:520px;border-radius:8px;border:1px solid #ddd;}}
</style>
</head>
<body>
<div class="header">
    <h1>Armed Conflicts Analytics</h1>
    <nav>{nav}</nav>
</div>
<div class="layout">
{sidebar}
<div class="container">
{content}
</div>
</div>
</body>
</html>"#,
        title = html_escape(page.title()),
    )
}

fn render_sidebar(page: Page, dataset: &Dataset, state: &FilterState) -> String {
    let selection = &state.selection;

    let event_types = checkbox_group(
        "Event Type",
        "event_type",
        dataset
            .event_types()
            .into_iter()
            .map(|v| {
                let checked = selection.event_types.contains(&v);
                (v.clone(), v, checked)
            })
            .collect(),
    );
    let regions = checkbox_group(
        "Region",
        "region",
        dataset
            .regions()
            .into_iter()
            .map(|v| {
                let checked = selection.regions.contains(&v);
                (v.clone(), v, checked)
            })
            .collect(),
    );
    let clusters = checkbox_group(
        "Cluster (Top 15 by Size)",
        "cluster",
        state
            .top_clusters
            .iter()
            .map(|id| (id.to_string(), id.to_string(), selection.clusters.contains(id)))
            .collect(),
    );
    let severities = checkbox_group(
        "Fatality Severity",
        "severity",
        SeverityCategory::ALL
            .iter()
            .map(|c| {
                (
                    c.label().to_string(),
                    c.label().to_string(),
                    selection.severities.contains(c),
                )
            })
            .collect(),
    );

    let (lo, hi) = dataset
        .year_bounds()
        .unwrap_or((selection.years.start, selection.years.end));

    format!(
        r#"<aside class="sidebar">
<h2>Filters</h2>
<form method="get" action="{action}">
<input type="hidden" name="applied" value="1">
{event_types}
{regions}
{clusters}
<fieldset><legend>Year Range</legend>
<input type="number" name="year_min" min="{lo}" max="{hi}" value="{start}"> &ndash;
<input type="number" name="year_max" min="{lo}" max="{hi}" value="{end}">
</fieldset>
{severities}
<button type="submit" class="btn">Apply filters</button>
<a href="{action}" style="margin-left:8px;font-size:12px;">Reset</a>
</form>
<div class="info">Events after filtering: {count}</div>
</aside>"#,
        action = page.path(),
        start = selection.years.start,
        end = selection.years.end,
        count = format_thousands(state.event_count() as u64),
    )
}

/// `options` are `(value, label, checked)`.
fn checkbox_group(legend: &str, name: &str, options: Vec<(String, String, bool)>) -> String {
    let boxes: String = options
        .iter()
        .map(|(value, label, checked)| {
            format!(
                r#"<label><input type="checkbox" name="{name}" value="{value}"{checked}> {label}</label>"#,
                value = html_escape(value),
                label = html_escape(label),
                checked = if *checked { " checked" } else { "" },
            )
        })
        .collect();
    format!(r#"<fieldset><legend>{legend}</legend>{boxes}</fieldset>"#)
}

// --- Fragments ---

pub fn kpi_card(value: &str, label: &str) -> String {
    format!(
        r#"<div class="card kpi"><div class="value">{}</div><div class="label">{}</div></div>"#,
        html_escape(value),
        html_escape(label)
    )
}

pub fn figure(file: &str, caption: &str) -> String {
    format!(
        r#"<div class="card figure"><h3 style="margin-top:0;">{caption}</h3><img src="/figures/{file}" alt="{caption}"></div>"#,
        caption = html_escape(caption),
        file = html_escape(file),
    )
}

pub fn chart_card(heading: &str, canvas_id: &str, script: &str) -> String {
    format!(
        r#"<div class="card"><h3 style="margin-top:0;">{heading}</h3><canvas id="{canvas_id}" height="120"></canvas></div>
<script>{script}</script>"#,
        heading = html_escape(heading),
    )
}

pub fn section_error(message: &str) -> String {
    format!(r#"<div class="error">{}</div>"#, html_escape(message))
}

pub fn notice(message: &str) -> String {
    format!(r#"<div class="notice">{}</div>"#, html_escape(message))
}

// --- Helpers ---

pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// `1234567` → `1,234,567`
pub fn format_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Two decimals, or `N/A` when there is nothing to average.
pub fn format_decimal(value: Option<f64>) -> String {
    value
        .map(|v| format!("{v:.2}"))
        .unwrap_or_else(|| "N/A".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thousands_separators() {
        assert_eq!(format_thousands(0), "0");
        assert_eq!(format_thousands(999), "999");
        assert_eq!(format_thousands(1000), "1,000");
        assert_eq!(format_thousands(1234567), "1,234,567");
    }

    #[test]
    fn decimals_fall_back_to_na() {
        assert_eq!(format_decimal(Some(4.0)), "4.00");
        assert_eq!(format_decimal(Some(2.345)), "2.35");
        assert_eq!(format_decimal(None), "N/A");
    }

    #[test]
    fn escape_covers_markup() {
        assert_eq!(html_escape("<a href=\"x\">&'"), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;");
    }
}
