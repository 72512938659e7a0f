use std::fmt::Write as _;
use std::io::Write;

use serde::Serialize;

use super::{row_runs, scales, RenderError};
use crate::color::{to_hex, ColorMap};
use crate::config::ExplorerConfig;
use crate::data::projection::Projection;

const MARGIN: f64 = 48.0;
const AXIS_SPACING: f64 = 160.0;
const MIN_WIDTH: f64 = 640.0;

/// A rendered, self-contained HTML document.
#[derive(Debug, Clone)]
pub struct HtmlDocument {
    pub html: String,
}

impl HtmlDocument {
    /// Size of the document in bytes.
    pub fn len(&self) -> usize {
        self.html.len()
    }

    pub fn is_empty(&self) -> bool {
        self.html.is_empty()
    }
}

/// Column-oriented copy of the projection embedded in the document.
#[derive(Serialize)]
struct Payload<'a> {
    columns: Vec<&'a str>,
    uid: Vec<String>,
    axes: Vec<AxisPayload<'a>>,
    color: Option<&'a [String]>,
    config: &'a ExplorerConfig,
}

#[derive(Serialize)]
struct AxisPayload<'a> {
    name: &'a str,
    min: f64,
    max: f64,
    values: &'a [Option<f64>],
}

/// Render `projection` to an HTML document.
///
/// The document is written to a scratch file, read back once, and the file
/// is removed before returning.
pub fn render_html(projection: &Projection, config: &ExplorerConfig) -> Result<HtmlDocument, RenderError> {
    if projection.is_empty() {
        return Err(RenderError::EmptyProjection);
    }

    let mut scratch = tempfile::Builder::new()
        .prefix("parallel-explorer-")
        .suffix(".html")
        .tempfile()?;
    write_document(projection, config, scratch.as_file_mut())?;
    scratch.flush()?;

    let html = std::fs::read_to_string(scratch.path())?;
    log::debug!(
        "Rendered {} rows to {} ({} bytes)",
        projection.num_rows(),
        scratch.path().display(),
        html.len()
    );

    Ok(HtmlDocument { html })
}

/// Write the full HTML document for `projection` into `out`.
pub fn write_document(
    projection: &Projection,
    config: &ExplorerConfig,
    out: &mut impl Write,
) -> Result<(), RenderError> {
    let svg = svg_chart(projection, config);
    let data = embedded_json(projection, config)?;

    let html = format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
         <title>Parallel coordinates</title>\n\
         <style>body{{margin:0;font-family:sans-serif}} \
         polyline{{fill:none;stroke-opacity:0.6}} \
         polyline:hover{{stroke-width:3;stroke-opacity:1}}</style>\n\
         </head>\n<body>\n{svg}\n\
         <script type=\"application/json\" id=\"projection-data\">{data}</script>\n\
         </body>\n</html>\n"
    );
    out.write_all(html.as_bytes())?;
    Ok(())
}

fn embedded_json(projection: &Projection, config: &ExplorerConfig) -> Result<String, RenderError> {
    let payload = Payload {
        columns: projection.column_names(),
        uid: projection.uid().iter().map(|id| id.to_string()).collect(),
        axes: projection
            .axes()
            .iter()
            .zip(scales(projection))
            .map(|(axis, scale)| AxisPayload {
                name: &axis.name,
                min: scale.min,
                max: scale.max,
                values: &axis.values,
            })
            .collect(),
        color: projection.color(),
        config,
    };
    // keep the payload from closing its <script> element
    Ok(serde_json::to_string(&payload)?.replace("</", "<\\/"))
}

fn svg_chart(projection: &Projection, config: &ExplorerConfig) -> String {
    let n_axes = projection.axes().len();
    let width = (AXIS_SPACING * n_axes as f64).max(MIN_WIDTH);
    let height = f64::from(config.viewport_height);
    let plot_height = height - 2.0 * MARGIN;

    let axis_x = |i: usize| {
        if n_axes <= 1 {
            width / 2.0
        } else {
            MARGIN + i as f64 * (width - 2.0 * MARGIN) / (n_axes - 1) as f64
        }
    };
    let value_y = |norm: f64| MARGIN + (1.0 - norm) * plot_height;

    let color_map = match projection.color() {
        Some(labels) => ColorMap::new(labels, config.palette_saturation, config.palette_lightness),
        None => ColorMap::uniform(),
    };
    let axis_scales = scales(projection);

    let mut svg = String::new();
    let _ = writeln!(
        svg,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" \
         viewBox=\"0 0 {width} {height}\">"
    );

    for row in 0..projection.num_rows() {
        let stroke = match projection.color() {
            Some(labels) => to_hex(color_map.color_for(&labels[row])),
            None => to_hex(color_map.default_color()),
        };
        let uid = projection.uid()[row];
        for run in row_runs(projection, &axis_scales, row) {
            if let [(i, norm)] = run.as_slice() {
                let _ = writeln!(
                    svg,
                    "<circle cx=\"{:.2}\" cy=\"{:.2}\" r=\"3\" fill=\"{stroke}\"><title>uid {uid}</title></circle>",
                    axis_x(*i),
                    value_y(*norm)
                );
                continue;
            }
            let points: Vec<String> = run
                .iter()
                .map(|&(i, norm)| format!("{:.2},{:.2}", axis_x(i), value_y(norm)))
                .collect();
            let _ = writeln!(
                svg,
                "<polyline points=\"{}\" stroke=\"{stroke}\"><title>uid {uid}</title></polyline>",
                points.join(" ")
            );
        }
    }

    for (i, (axis, scale)) in projection.axes().iter().zip(&axis_scales).enumerate() {
        let x = axis_x(i);
        let _ = writeln!(
            svg,
            "<line x1=\"{x:.2}\" y1=\"{MARGIN}\" x2=\"{x:.2}\" y2=\"{:.2}\" stroke=\"#333\"/>",
            MARGIN + plot_height
        );
        let _ = writeln!(
            svg,
            "<text x=\"{x:.2}\" y=\"{:.2}\" text-anchor=\"middle\" font-weight=\"bold\">{}</text>",
            MARGIN / 2.0,
            escape_xml(&axis.name)
        );
        let _ = writeln!(
            svg,
            "<text x=\"{x:.2}\" y=\"{:.2}\" text-anchor=\"middle\" font-size=\"11\">{}</text>",
            MARGIN - 6.0,
            format_tick(scale.max)
        );
        let _ = writeln!(
            svg,
            "<text x=\"{x:.2}\" y=\"{:.2}\" text-anchor=\"middle\" font-size=\"11\">{}</text>",
            MARGIN + plot_height + 14.0,
            format_tick(scale.min)
        );
    }

    for (k, (label, color)) in color_map.legend_entries().iter().enumerate() {
        let y = MARGIN + 16.0 * k as f64;
        let _ = writeln!(
            svg,
            "<text x=\"{:.2}\" y=\"{y:.2}\" text-anchor=\"end\" font-size=\"12\" fill=\"{}\">{}</text>",
            width - 4.0,
            to_hex(*color),
            escape_xml(label)
        );
    }

    svg.push_str("</svg>");
    svg
}

fn format_tick(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{v:.0}")
    } else {
        format!("{v:.3}")
    }
}

fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
