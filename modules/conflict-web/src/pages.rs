//! Page renderers. Each reads the filter state for the current request and
//! derives its own aggregates; none of them touch the selection.

use std::collections::BTreeSet;

use conflict_common::pareto::{empirical_ccdf, FITTED_POWER_LAW};
use conflict_common::stats::{
    cluster_profile, cluster_totals, cluster_year_counts, events_per_year, fatality_share,
    heat_points, mean_location, overview_kpis, severity_counts, ClusterProfile,
};
use conflict_common::{ClusterId, Dataset, EventRecord, FilterState, SeverityCategory};

use crate::charts::{
    build_ccdf_chart, build_colored_bar_chart, build_line_chart, build_multi_line_chart,
    script_json,
};
use crate::query::selection_pairs;
use crate::templates::{
    build_page, chart_card, figure, format_decimal, format_thousands, html_escape, kpi_card,
    notice, section_error, Page,
};

const PROFILE_COLUMNS: [&str; 4] = ["sub_event_type", "interaction", "country", "population_best"];

// =============================================================================
// Overview
// =============================================================================

pub fn render_overview(dataset: &Dataset, state: &FilterState) -> String {
    let rows = state.filtered_view.rows();
    let kpis = overview_kpis(rows);

    let kpi_row = format!(
        r#"<div class="kpis">{}{}{}{}</div>"#,
        kpi_card(&format_thousands(kpis.total_events as u64), "Total Events"),
        kpi_card(&format_thousands(kpis.total_fatalities), "Total Fatalities"),
        kpi_card(&format_decimal(kpis.avg_fatalities), "Avg Fatalities / Event"),
        kpi_card(&kpis.clusters_represented.to_string(), "Clusters Represented"),
    );

    let per_year: Vec<(String, u64)> = events_per_year(rows)
        .into_iter()
        .map(|(year, n)| (year.to_string(), n))
        .collect();

    let content = format!(
        r#"<h2>Armed Conflict Overview</h2>
<p class="lead">A high-level snapshot of the filtered conflict dataset.</p>
<h3>Key Metrics</h3>
{kpi_row}
{geo}
{temporal}
{per_year_chart}
{severity_chart}"#,
        geo = figure("geo_kde.png", "Spatial Distribution of Conflict Events"),
        temporal = figure("temporal_plot.png", "Temporal Severity of Conflict Events"),
        per_year_chart = chart_card(
            "Events Over Time",
            "chart-events-per-year",
            &build_line_chart("chart-events-per-year", &per_year, "#1565c0"),
        ),
        severity_chart = severity_section("Fatality Severity Distribution", "chart-severity", rows, state),
    );

    build_page(Page::Overview, dataset, state, &content)
}

fn severity_section(heading: &str, id: &str, rows: &[&EventRecord], state: &FilterState) -> String {
    let counts = severity_counts(rows, &state.color_map);
    let data: Vec<(String, u64)> = counts
        .iter()
        .map(|(category, n)| (category.label().to_string(), *n))
        .collect();
    let colors: Vec<&str> = counts
        .iter()
        .map(|(category, _)| state.color_map.color(*category))
        .collect();
    chart_card(heading, id, &build_colored_bar_chart(id, &data, &colors))
}

// =============================================================================
// Cluster insights
// =============================================================================

pub fn render_clusters(dataset: &Dataset, state: &FilterState, profile: Option<ClusterId>) -> String {
    let content = format!(
        r#"<h2>Conflict Cluster Insights</h2>
<p class="lead">Explore data-driven clusters of armed conflict events.</p>
{fatalities}
{density}
{activity}
{heatmap}
{profile}"#,
        fatalities = figure("cluster_fatalities.png", "Total Fatalities per Cluster"),
        density = figure("cluster_pop_density.png", "Cluster Fatalities vs Population Density"),
        activity = cluster_activity_section(state),
        heatmap = heat_map_section(dataset, state),
        profile = profile_section(dataset, state, profile),
    );

    build_page(Page::Clusters, dataset, state, &content)
}

/// One line per top cluster, zero-filled across the years present in the view.
fn cluster_activity_section(state: &FilterState) -> String {
    let counts = cluster_year_counts(state.filtered_view.rows(), state.top_clusters);
    if counts.is_empty() {
        return format!(
            "<h3>Temporal Activity of Selected Clusters</h3>{}",
            notice("None of the top clusters have events in the current selection.")
        );
    }

    let years: Vec<i32> = counts
        .iter()
        .map(|c| c.year)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let series: Vec<(String, Vec<u64>)> = state
        .top_clusters
        .iter()
        .filter(|id| counts.iter().any(|c| c.cluster == **id))
        .map(|id| {
            let values = years
                .iter()
                .map(|year| {
                    counts
                        .iter()
                        .find(|c| c.cluster == *id && c.year == *year)
                        .map(|c| c.events)
                        .unwrap_or(0)
                })
                .collect();
            (format!("Cluster {id}"), values)
        })
        .collect();
    let labels: Vec<String> = years.iter().map(|y| y.to_string()).collect();

    chart_card(
        "Temporal Activity of Selected Clusters",
        "chart-cluster-activity",
        &build_multi_line_chart("chart-cluster-activity", &labels, &series),
    )
}

fn heat_map_section(dataset: &Dataset, state: &FilterState) -> String {
    let heading = "<h3>Spatial Density of Selected Clusters</h3>";
    if let Some(missing) = missing_columns(dataset, &["latitude", "longitude"]) {
        return format!(
            "{heading}{}",
            section_error(&format!("Heat map unavailable: dataset has no {missing} column."))
        );
    }

    let rows = state.filtered_view.rows();
    let Some((lat, lng)) = mean_location(rows) else {
        return format!(
            "{heading}{}",
            notice("No events with coordinates in the current selection.")
        );
    };

    format!(
        r#"{heading}
<p class="lead"><b>Note:</b> Select fewer clusters for better performance.</p>
<div id="heatmap"></div>
<script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js"></script>
<script src="https://unpkg.com/leaflet.heat@0.2.0/dist/leaflet-heat.js"></script>
<script>
(function(){{
var map=L.map('heatmap').setView([{lat},{lng}],2);
L.tileLayer('https://{{s}}.basemaps.cartocdn.com/light_all/{{z}}/{{x}}/{{y}}{{r}}.png',{{attribution:'&copy; OpenStreetMap contributors &copy; CARTO',subdomains:'abcd',maxZoom:19}}).addTo(map);
L.heatLayer({points},{{radius:8,blur:15,maxZoom:4}}).addTo(map);
}})();
</script>"#,
        points = script_json(&heat_points(rows)),
    )
}

fn profile_section(dataset: &Dataset, state: &FilterState, requested: Option<ClusterId>) -> String {
    let heading = "<h3>Select a Cluster for Detailed Profile</h3>";
    if let Some(missing) = missing_columns(dataset, &PROFILE_COLUMNS) {
        return format!(
            "{heading}{}",
            section_error(&format!("Cluster profile unavailable: dataset has no {missing} column."))
        );
    }

    let available = state.available_clusters();
    let Some(first) = available.first().copied() else {
        return format!(
            "{heading}{}",
            notice("No clusters available with the current filters.")
        );
    };
    let selected = requested.filter(|id| available.contains(id)).unwrap_or(first);

    let hidden: String = selection_pairs(&state.selection)
        .into_iter()
        .map(|(key, value)| {
            format!(
                r#"<input type="hidden" name="{key}" value="{}">"#,
                html_escape(&value)
            )
        })
        .collect();
    let options: String = available
        .iter()
        .map(|id| {
            let sel = if *id == selected { " selected" } else { "" };
            format!(r#"<option value="{id}"{sel}>{id}</option>"#)
        })
        .collect();

    let cluster_view = state.filtered_view.for_cluster(selected);
    let rows = cluster_view.rows();
    let profile = cluster_profile(rows, selected);

    let per_year: Vec<(String, u64)> = events_per_year(rows)
        .into_iter()
        .map(|(year, n)| (year.to_string(), n))
        .collect();

    format!(
        r#"{heading}
<form method="get" action="/clusters" class="card">
{hidden}
<label>Choose a Cluster <select name="profile" onchange="this.form.submit()">{options}</select></label>
<button type="submit" class="btn" style="margin-left:8px;">Show</button>
</form>
<h3>Cluster {selected} Summary</h3>
<div class="card">{table}</div>
{temporal}
{severity}"#,
        table = profile_table(&profile),
        temporal = chart_card(
            "Temporal Pattern",
            "chart-profile-per-year",
            &build_line_chart("chart-profile-per-year", &per_year, "steelblue"),
        ),
        severity = severity_section("Fatality Severity Breakdown", "chart-profile-severity", rows, state),
    )
}

fn profile_table(profile: &ClusterProfile) -> String {
    let text = |v: &Option<String>| v.clone().unwrap_or_else(|| "N/A".to_string());
    let date = |d: Option<chrono::NaiveDate>| {
        d.map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "N/A".to_string())
    };

    let fields = [
        ("ID", profile.cluster.to_string()),
        ("No. of Events", profile.events.to_string()),
        ("Mean fatalities", format_decimal(profile.mean_fatalities)),
        ("Median fatalities", format_decimal(profile.median_fatalities)),
        ("Dominant Event", text(&profile.dominant_event_type)),
        ("Dom. Sub Event", text(&profile.dominant_sub_event_type)),
        ("Dom. Interaction", text(&profile.dominant_interaction)),
        ("Dom. Region", text(&profile.dominant_region)),
        ("Dom. Country", text(&profile.dominant_country)),
        (
            "Median Pop. density",
            profile
                .median_population
                .map(|p| p.to_string())
                .unwrap_or_else(|| "N/A".to_string()),
        ),
        ("Earliest event", date(profile.earliest)),
        ("Latest event", date(profile.latest)),
    ];

    let head: String = fields
        .iter()
        .map(|(label, _)| format!("<th>{label}</th>"))
        .collect();
    let cells: String = fields
        .iter()
        .map(|(_, value)| format!("<td>{}</td>", html_escape(value)))
        .collect();
    format!(r#"<table class="summary"><tr>{head}</tr><tr>{cells}</tr></table>"#)
}

/// Comma-separated quoted names of the columns the dataset lacks, if any.
fn missing_columns(dataset: &Dataset, wanted: &[&str]) -> Option<String> {
    let missing: Vec<String> = wanted
        .iter()
        .filter(|c| !dataset.has_column(c))
        .map(|c| format!("'{c}'"))
        .collect();
    if missing.is_empty() {
        None
    } else {
        Some(missing.join(", "))
    }
}

// =============================================================================
// Pareto modelling
// =============================================================================

pub fn render_pareto(dataset: &Dataset, state: &FilterState) -> String {
    let fit = FITTED_POWER_LAW;

    let fit_cards = format!(
        r#"<div class="kpis" style="grid-template-columns:repeat(3,1fr);">
<div><h4>Pareto Parameters</h4>{alpha}{xmin}</div>
<div><h4>Lognormal Comparison</h4>{r_logn}{p_logn}</div>
<div><h4>Exponential Comparison</h4>{r_exp}{p_exp}</div>
</div>"#,
        alpha = kpi_card(&format!("{:.2}", fit.alpha), "α (Alpha)"),
        xmin = kpi_card(&fit.xmin.to_string(), "xmin"),
        r_logn = kpi_card(&format!("{:.2}", fit.r_lognormal), "R (PL vs Lognormal)"),
        p_logn = kpi_card(fit.p_lognormal, "p-value"),
        r_exp = kpi_card(&format!("{:.2}", fit.r_exponential), "R (PL vs Exponential)"),
        p_exp = kpi_card(fit.p_exponential, "p-value"),
    );

    let ccdf = empirical_ccdf(state.filtered_view.rows());
    let live = if ccdf.is_empty() {
        notice("No events with fatalities in the current selection.")
    } else {
        let tail = fit.tail_curve(&ccdf);
        let share = fit
            .tail_share(&ccdf)
            .map(|s| format!("{:.1}%", s * 100.0))
            .unwrap_or_else(|| "N/A".to_string());
        format!(
            r#"{chart}
<p class="lead">Share of fatal events in the current selection at or above xmin = {xmin}: <b>{share}</b>.
The fitted curve is the model above, anchored at the first observed count ≥ xmin; it is not refitted to the selection.</p>"#,
            chart = chart_card(
                "Filtered Fatalities vs Fitted Tail",
                "chart-ccdf",
                &build_ccdf_chart("chart-ccdf", &ccdf, &tail),
            ),
            xmin = fit.xmin,
        )
    };

    let content = format!(
        r#"<h2>Pareto Modelling of Conflict Severity</h2>
<div class="card">
<h3 style="margin-top:0;">Power-Law / Pareto Severity Analysis</h3>
<p><b>Why fit a Pareto/power-law model?</b></p>
<p>Conflict fatalities are not distributed normally: most events cause few deaths, while a small number cause extremely high casualties. A power-law (Pareto) distribution may capture this imbalance by modelling how <b><i>rare, catastrophic events dominate the overall dynamics of violence</i></b>.</p>
<p>Confirming whether fatalities follow the power law matters because:</p>
<ol style="margin-left:20px;">
<li>It reveals the risk structure of violent conflict.</li>
<li>It identifies scale-free dynamics: if severe conflicts follow the power law, the same mechanisms may apply across scales, from skirmishes to regional wars.</li>
<li>It may guide further modelling and scenario planning.</li>
</ol>
<p><b>In short:</b> conflict fatalities follow a heavy-tailed distribution, so rare extreme events play a disproportionate role.</p>
</div>
{image}
<div class="card">
<p><b>Empirical CCDF (blue line):</b> the observed probability that an event has fatalities ≥ x. This is the true severity tail of the dataset.</p>
<p><b>Power-law fit (red dashed line):</b> the theoretical model fitted to the tail (x ≥ xmin), used to estimate α and assess whether the distribution is heavy-tailed.</p>
</div>
<h3>Model Fit Summary</h3>
{fit_cards}
<h3>Interpretation of Results</h3>
<div class="card">
<ol style="margin-left:20px;">
<li>α = {alpha:.2} implies a moderately heavy-tailed distribution: extreme events are rare but systematically present, and the tail decays slower than an exponential.</li>
<li>xmin = {xmin} fatalities: power-law behaviour holds only for events with <b>{xmin}+ fatalities</b>; below the threshold the distribution is different.</li>
<li>The CCDF tapers off at the end: real events have natural constraints such as population and geography, and observations at the high end are sparse and noisy.</li>
<li>Versus lognormal, R = {r_logn:.1} and p {p_logn}: the lognormal fits the tail significantly better, due to the non-power-law behaviour of the tail's end.</li>
<li>Versus exponential, R = {r_exp:.1} and p {p_exp}: the power law fits significantly better; extreme-fatality events are far more common than an exponential model predicts.</li>
</ol>
</div>
<h3>Empirical CCDF of the Current Selection</h3>
{live}"#,
        image = figure("cluster_ccdf_powerlaw.png", "Empirical CCDF vs Fitted Power-Law Model"),
        alpha = fit.alpha,
        xmin = fit.xmin,
        r_logn = fit.r_lognormal,
        p_logn = html_escape(fit.p_lognormal),
        r_exp = fit.r_exponential,
        p_exp = html_escape(fit.p_exponential),
    );

    build_page(Page::Pareto, dataset, state, &content)
}

// =============================================================================
// Conclusions
// =============================================================================

pub fn render_conclusions(dataset: &Dataset, state: &FilterState) -> String {
    let rows = state.filtered_view.rows();
    let fit = FITTED_POWER_LAW;

    let leaders: String = cluster_totals(rows)
        .iter()
        .take(3)
        .map(|t| {
            format!(
                "<li>Cluster {}: {} events, {} fatalities</li>",
                t.cluster,
                format_thousands(t.events),
                format_thousands(t.fatalities)
            )
        })
        .collect();
    let leaders = if leaders.is_empty() {
        "<li>No events in the current selection.</li>".to_string()
    } else {
        leaders
    };
    let extreme_share = fatality_share(rows, SeverityCategory::Extreme)
        .map(|s| format!("{:.1}%", s * 100.0))
        .unwrap_or_else(|| "N/A".to_string());

    let content = format!(
        r#"<h2>Conclusions</h2>
<p class="lead">A high-level summary of findings from the clustering analysis and severity modelling.</p>
<div class="highlight">
<h3>Cluster Insights: Summary</h3>
<p>Density-based clustering groups events that are close in space and time. The clusters carrying the most fatalities in the current selection:</p>
<ul>{leaders}</ul>
<p>Events classed as {extreme} account for <b>{extreme_share}</b> of all fatalities in the current selection.</p>
</div>
<div class="highlight">
<h3>Pareto Severity Modelling: Summary</h3>
<p><i>Fitting the Pareto distribution to the dataset revealed key insights about the nature of conflict severity:</i></p>
<ul>
<li>Conflict severity follows a heavy-tailed distribution: most events cause few fatalities, but rare events cause extremely high casualties.</li>
<li>The fit is particularly strong past {xmin}+ fatalities per event.</li>
<li>It is not perfect, mostly because of the natural constraints of conflicts: severity cannot rise without bound.</li>
</ul>
<p><b>Unfortunate practical implication:</b> "extreme violence is statistically expected rather than exceptional".</p>
</div>
<p class="caption">Dashboard created by Cosmin Manolescu<br>
Data Source: ACLED @ <a href="https://acleddata.com/">https://acleddata.com/</a><br>
Project: Armed Conflict Analytics<br>
GitHub: <a href="https://github.com/CoMa95/Armed-Conflict-Analytics">https://github.com/CoMa95/Armed-Conflict-Analytics</a></p>"#,
        extreme = html_escape(SeverityCategory::Extreme.label()),
        xmin = fit.xmin,
    );

    build_page(Page::Conclusions, dataset, state, &content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use conflict_common::testing::{dataset, event, event_in};
    use conflict_common::{FilterSelection, YearRange};

    fn sample() -> Dataset {
        dataset(vec![
            event_in(0, "2019-03-01", 4, 2, "Battles", "Middle East"),
            event_in(1, "2020-03-01", 4, 4, "Battles", "Middle East"),
            event_in(2, "2021-03-01", 4, 6, "Riots", "Africa"),
            event_in(3, "2021-05-01", 9, 80, "Battles", "Africa"),
        ])
    }

    #[test]
    fn overview_shows_kpis_and_sidebar_count() {
        let ds = sample();
        let state = FilterState::build(&ds, FilterSelection::defaults(&ds));
        let html = render_overview(&ds, &state);
        assert!(html.contains("Total Fatalities"));
        assert!(html.contains(">92<"));
        assert!(html.contains("23.00"));
        assert!(html.contains("Events after filtering: 4"));
        assert!(html.contains("/figures/geo_kde.png"));
    }

    #[test]
    fn overview_of_empty_view_renders_na() {
        let ds = sample();
        let mut selection = FilterSelection::defaults(&ds);
        selection.years = YearRange::new(1990, 1991);
        let state = FilterState::build(&ds, selection);
        let html = render_overview(&ds, &state);
        assert!(html.contains("N/A"));
        assert!(html.contains("Events after filtering: 0"));
    }

    #[test]
    fn profile_defaults_to_first_available_cluster() {
        let ds = sample();
        let state = FilterState::build(&ds, FilterSelection::defaults(&ds));
        let html = render_clusters(&ds, &state, None);
        assert!(html.contains("Cluster 4 Summary"));
        assert!(html.contains("<td>4.00</td>"));
        assert!(html.contains("<td>2019-03-01</td>"));
    }

    #[test]
    fn profile_ignores_cluster_not_in_view() {
        let ds = sample();
        let state = FilterState::build(&ds, FilterSelection::defaults(&ds));
        assert!(render_clusters(&ds, &state, Some(9)).contains("Cluster 9 Summary"));
        assert!(render_clusters(&ds, &state, Some(77)).contains("Cluster 4 Summary"));
    }

    #[test]
    fn empty_view_has_no_profile_to_pick() {
        let ds = sample();
        let mut selection = FilterSelection::defaults(&ds);
        selection.years = YearRange::new(1990, 1991);
        let state = FilterState::build(&ds, selection);
        let html = render_clusters(&ds, &state, None);
        assert!(html.contains("No clusters available with the current filters."));
    }

    #[test]
    fn missing_coordinates_only_halt_the_heat_map() {
        let events = vec![event(0, "2020-01-01", 1, 3)];
        let columns = ["event_date", "event_type", "region", "fatalities", "cluster"]
            .into_iter()
            .chain(PROFILE_COLUMNS)
            .map(String::from)
            .collect();
        let ds = Dataset::new(events, columns);
        let state = FilterState::build(&ds, FilterSelection::defaults(&ds));
        let html = render_clusters(&ds, &state, None);
        assert!(html.contains("Heat map unavailable: dataset has no &#39;latitude&#39;, &#39;longitude&#39; column."));
        assert!(!html.contains("L.heatLayer"));
        assert!(html.contains("Cluster 1 Summary"));
    }

    #[test]
    fn pareto_page_overlays_tail_on_filtered_ccdf() {
        let ds = sample();
        let state = FilterState::build(&ds, FilterSelection::defaults(&ds));
        let html = render_pareto(&ds, &state);
        assert!(html.contains("2.55"));
        assert!(html.contains("-168.50"));
        assert!(html.contains("3739.70"));
        assert!(html.contains("getElementById('chart-ccdf')"));
        assert!(html.contains("Power-law fit"));
    }

    #[test]
    fn conclusions_rank_clusters_by_fatalities() {
        let ds = sample();
        let state = FilterState::build(&ds, FilterSelection::defaults(&ds));
        let html = render_conclusions(&ds, &state);
        let nine = html.find("Cluster 9:").unwrap();
        let four = html.find("Cluster 4:").unwrap();
        assert!(nine < four);
        assert!(html.contains("acleddata.com"));
    }
}
