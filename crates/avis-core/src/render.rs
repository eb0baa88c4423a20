// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::join::RenderSegment;
use crate::Result;
use log::info;
use rand::seq::SliceRandom;
use rand::Rng;
use serde_json::{json, Value};
use std::io::Write;

pub const LINE_COLORS: [&str; 4] = ["red", "blue", "green", "orange"];
const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

pub fn hover_text(row: &RenderSegment) -> String {
    format!(
        "Origin: {}<br>Destination: {}<br>Airline: {}<br>Flight Number: {}<br>",
        row.city_org, row.city_dest, row.airline, row.flight_number
    )
}

/// Builds a Plotly `scattergeo` figure: one marker trace for the origins and
/// one line trace per route.
pub fn figure(rows: &[RenderSegment]) -> Value {
    figure_with_rng(rows, &mut rand::thread_rng())
}

pub fn figure_with_rng<R: Rng + ?Sized>(rows: &[RenderSegment], rng: &mut R) -> Value {
    info!("Creating geomap; routes={}", rows.len());

    let mut traces = Vec::with_capacity(rows.len() + 1);
    traces.push(json!({
        "type": "scattergeo",
        "mode": "markers",
        "showlegend": false,
        "lat": rows.iter().map(|r| r.lat_org).collect::<Vec<_>>(),
        "lon": rows.iter().map(|r| r.lon_org).collect::<Vec<_>>(),
        "hovertext": rows.iter().map(|r| r.city_org.as_str()).collect::<Vec<_>>(),
        "customdata": rows
            .iter()
            .map(|r| json!([r.airline, r.flight_number]))
            .collect::<Vec<_>>(),
        "hovertemplate": "<b>%{hovertext}</b><br>airline=%{customdata[0]}<br>flight_number=%{customdata[1]}<extra></extra>",
    }));

    for row in rows {
        let color = LINE_COLORS.choose(rng).copied().unwrap_or("red");
        traces.push(json!({
            "type": "scattergeo",
            "mode": "lines",
            "showlegend": false,
            "lat": [row.lat_org, row.lat_dest],
            "lon": [row.lon_org, row.lon_dest],
            "line": {"width": 1.5, "color": color},
            "opacity": 0.6,
            "text": hover_text(row),
            "hoverinfo": "text",
        }));
    }

    json!({
        "data": traces,
        "layout": {
            "title": {"text": "Flight Connection Map"},
            "geo": {"scope": "world", "projection": {"type": "natural earth"}},
            "height": 900,
            "width": 1800,
        },
    })
}

/// Standalone HTML page that draws the figure with Plotly from the CDN.
/// Route lines are drawn in with a short stroke animation.
pub fn render_html(rows: &[RenderSegment]) -> Result<String> {
    let fig = serde_json::to_string(&figure(rows))?.replace("</", "<\\/");
    Ok(format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <title>Aviation Visualisation</title>
  <script src="{PLOTLY_CDN}"></script>
  <style>
    body {{ margin: 0; display: flex; justify-content: center; }}
    #map path.js-line {{
      stroke-dasharray: 1000;
      stroke-dashoffset: 1000;
      animation: draw-route 2.5s ease-out forwards;
    }}
    @keyframes draw-route {{ to {{ stroke-dashoffset: 0; }} }}
  </style>
</head>
<body>
  <div id="map"></div>
  <script>
    const figure = {fig};
    Plotly.newPlot("map", figure.data, figure.layout);
  </script>
</body>
</html>
"#
    ))
}

/// Writes the render table as CSV with a header row.
pub fn write_csv<W: Write>(rows: &[RenderSegment], writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}
