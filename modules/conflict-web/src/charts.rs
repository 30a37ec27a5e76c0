// Chart.js script builders. Each returns a statement that draws into the
// canvas with the given id.

use serde::Serialize;

use conflict_common::pareto::CcdfPoint;

const PALETTE: [&str; 15] = [
    "#1565c0", "#c62828", "#2e7d32", "#e65100", "#7b1fa2", "#00838f", "#ad1457", "#f9a825",
    "#4e342e", "#37474f", "#6a1b9a", "#558b2f", "#d84315", "#283593", "#00695c",
];

/// JSON that is safe to inline inside a `<script>` element.
pub fn script_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string(value)
        .unwrap_or_default()
        .replace("</", "<\\/")
}

pub fn palette_color(i: usize) -> &'static str {
    PALETTE[i % PALETTE.len()]
}

pub fn build_line_chart(id: &str, data: &[(String, u64)], color: &str) -> String {
    let labels: Vec<&str> = data.iter().map(|(l, _)| l.as_str()).collect();
    let values: Vec<u64> = data.iter().map(|(_, c)| *c).collect();

    format!(
        r#"new Chart(document.getElementById('{id}'),{{type:'line',data:{{labels:{labels},datasets:[{{data:{values},borderColor:'{color}',backgroundColor:'{color}',tension:0.2,fill:false}}]}},options:{{responsive:true,plugins:{{legend:{{display:false}}}},scales:{{y:{{beginAtZero:true,ticks:{{precision:0}}}}}}}}}});"#,
        labels = script_json(&labels),
        values = script_json(&values),
    )
}

/// Vertical bars with one color per bar.
pub fn build_colored_bar_chart(id: &str, data: &[(String, u64)], colors: &[&str]) -> String {
    let labels: Vec<&str> = data.iter().map(|(l, _)| l.as_str()).collect();
    let values: Vec<u64> = data.iter().map(|(_, c)| *c).collect();

    format!(
        r#"new Chart(document.getElementById('{id}'),{{type:'bar',data:{{labels:{labels},datasets:[{{data:{values},backgroundColor:{colors}}}]}},options:{{responsive:true,plugins:{{legend:{{display:false}}}},scales:{{x:{{title:{{display:true,text:'Severity Category'}}}},y:{{beginAtZero:true,title:{{display:true,text:'Event Count'}},ticks:{{precision:0}}}}}}}}}});"#,
        labels = script_json(&labels),
        values = script_json(&values),
        colors = script_json(colors),
    )
}

/// One line per series over shared x labels.
pub fn build_multi_line_chart(id: &str, labels: &[String], series: &[(String, Vec<u64>)]) -> String {
    let datasets: Vec<serde_json::Value> = series
        .iter()
        .enumerate()
        .map(|(i, (label, values))| {
            let color = palette_color(i);
            serde_json::json!({
                "label": label,
                "data": values,
                "borderColor": color,
                "backgroundColor": color,
                "tension": 0.2,
                "fill": false,
            })
        })
        .collect();

    format!(
        r#"new Chart(document.getElementById('{id}'),{{type:'line',data:{{labels:{labels},datasets:{datasets}}},options:{{responsive:true,plugins:{{legend:{{position:'bottom',labels:{{boxWidth:12,padding:8}}}}}},scales:{{x:{{title:{{display:true,text:'Year'}}}},y:{{beginAtZero:true,title:{{display:true,text:'Event Count'}},ticks:{{precision:0}}}}}}}}}});"#,
        labels = script_json(labels),
        datasets = script_json(&datasets),
    )
}

/// Empirical CCDF points with the fitted tail on log-log axes.
pub fn build_ccdf_chart(id: &str, empirical: &[CcdfPoint], fitted: &[CcdfPoint]) -> String {
    let to_xy = |points: &[CcdfPoint]| -> Vec<serde_json::Value> {
        points
            .iter()
            .map(|p| serde_json::json!({ "x": p.x, "y": p.p }))
            .collect()
    };

    format!(
        r#"new Chart(document.getElementById('{id}'),{{type:'scatter',data:{{datasets:[{{label:'Empirical CCDF',data:{empirical},borderColor:'#1565c0',backgroundColor:'#1565c0',pointRadius:2,showLine:true}},{{label:'Power-law fit',data:{fitted},borderColor:'#c62828',borderDash:[6,4],pointRadius:0,showLine:true}}]}},options:{{responsive:true,plugins:{{legend:{{position:'bottom'}}}},scales:{{x:{{type:'logarithmic',title:{{display:true,text:'Fatalities (x)'}}}},y:{{type:'logarithmic',title:{{display:true,text:'P(X ≥ x)'}}}}}}}}}});"#,
        empirical = script_json(&to_xy(empirical)),
        fitted = script_json(&to_xy(fitted)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_json_escapes_closing_tags() {
        let out = script_json(&["</script><b>"]);
        assert!(!out.contains("</script>"));
        assert!(out.contains("<\\/script>"));
    }

    #[test]
    fn bar_chart_carries_colors_in_order() {
        let data = vec![("Low (0-3)".to_string(), 4), ("Extreme (50+)".to_string(), 1)];
        let js = build_colored_bar_chart("chart-severity", &data, &["#91cfff", "#8b0000"]);
        assert!(js.contains("getElementById('chart-severity')"));
        assert!(js.contains(r##"["#91cfff","#8b0000"]"##));
        assert!(js.contains("[4,1]"));
    }

    #[test]
    fn multi_line_assigns_distinct_colors() {
        let labels = vec!["2020".to_string(), "2021".to_string()];
        let series = vec![
            ("Cluster 1".to_string(), vec![3, 0]),
            ("Cluster 2".to_string(), vec![1, 5]),
        ];
        let js = build_multi_line_chart("chart-cluster-activity", &labels, &series);
        assert!(js.contains(palette_color(0)));
        assert!(js.contains(palette_color(1)));
        assert!(js.contains("\"Cluster 2\""));
    }
}
