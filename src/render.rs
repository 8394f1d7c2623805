use crate::color::{Rgb, SequentialScale};
use crate::config::{AppConfig, CanvasConfig, LegendConfig, TextConfig};
use crate::data;
use crate::hexbin::Hexbin;
use crate::processing::{project_points, summarize_cells, PixelScales};
use crate::scale::LinearScale;
use crate::svg::{escape, fmt_num, geometry_to_path, save_svg, SvgStringWriter};
use crate::types::{Boundary, HexCell, SamplePoint};
use anyhow::Result;
use geo::Coord;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

const BOUNDARY_STROKE: &str = "#7c7c7cff";
const TEXT_FILL: &str = "#373737ff";
const LEGEND_STROKE: &str = "#f7f7f7";

/// A finished map document.
#[derive(Debug, Clone)]
pub struct RenderedMap {
    pub svg: String,
    pub hexagons: usize,
    pub boundaries: usize,
}

/// Load both inputs, render, and write the SVG. Nothing is written unless every step succeeds.
pub async fn generate_map(config: &AppConfig, output: &Path) -> Result<RenderedMap> {
    let (points, boundaries) = data::load_inputs(config).await?;
    let map = render_map(config, points, &boundaries)?;

    save_svg(output, &map.svg)?;
    info!(
        "Wrote {:?} ({} hexagons, {} boundaries)",
        output, map.hexagons, map.boundaries
    );
    Ok(map)
}

/// Render the map document from already loaded data.
pub fn render_map(config: &AppConfig, mut points: Vec<SamplePoint>, boundaries: &[Boundary]) -> Result<RenderedMap> {
    let canvas = &config.canvas;

    let scales = PixelScales::fit(&points, canvas)?;
    project_points(&mut points, &scales);

    let hexbin = Hexbin::new(config.hexbin.radius, [[0.0, 0.0], [canvas.width, canvas.height]]);
    let [d0, d1] = config.color.domain;
    let color = SequentialScale::viridis((d0, d1));
    let cells = summarize_cells(&points, &hexbin, &color);
    debug!(
        "{} of {} grid cells occupied, largest holds {} samples",
        cells.len(),
        hexbin.centers().len(),
        cells.iter().map(|c| c.count).max().unwrap_or(0)
    );

    let mut svg = SvgStringWriter::new();
    svg.write_header(canvas.width, canvas.document_height())?;
    svg.write_styles()?;
    write_shadow_filter(&mut svg)?;
    let drawn = write_boundaries(&mut svg, boundaries, &scales, canvas.map_offset)?;
    write_hexagons(&mut svg, &cells, &hexbin, canvas.map_offset)?;
    write_legend(&mut svg, &config.legend, &color, canvas)?;
    write_annotations(&mut svg, &config.text, canvas)?;
    svg.write_footer()?;

    Ok(RenderedMap {
        svg: svg.into_string()?,
        hexagons: cells.len(),
        boundaries: drawn,
    })
}

/// Drop shadow shared by every boundary stroke.
fn write_shadow_filter(writer: &mut impl Write) -> Result<()> {
    writeln!(writer, r##"<defs>
<filter id="boundary-shadow" filterUnits="userSpaceOnUse">
    <feOffset dx="1.5" dy="1.5" in="SourceAlpha" result="offset"/>
    <feGaussianBlur in="offset" stdDeviation="2" result="blur"/>
    <feFlood flood-color="#000" flood-opacity="0.6" result="color"/>
    <feComposite in="color" in2="blur" operator="in" result="shadow"/>
    <feMerge>
        <feMergeNode in="shadow"/>
        <feMergeNode in="SourceGraphic"/>
    </feMerge>
</filter>
</defs>"##)?;
    Ok(())
}

/// Outline every boundary through the same scales as the sample points.
fn write_boundaries(writer: &mut impl Write, boundaries: &[Boundary], scales: &PixelScales, offset: f64) -> Result<usize> {
    let project = |c: &Coord<f64>| scales.project(c.x, c.y);
    let mut drawn = 0;

    writeln!(writer, r#"<g class="boundaries" transform="translate(0,{})">"#, fmt_num(offset))?;
    for boundary in boundaries {
        let d = geometry_to_path(&boundary.geometry, &project);
        if d.is_empty() {
            continue;
        }
        writeln!(
            writer,
            r#"<path d="{d}" fill="none" stroke="{BOUNDARY_STROKE}" stroke-width="1" opacity="1" filter="url(#boundary-shadow)"/>"#
        )?;
        drawn += 1;
    }
    writeln!(writer, "</g>")?;

    debug!("Drew {} boundary outlines", drawn);
    Ok(drawn)
}

fn write_hexagons(writer: &mut impl Write, cells: &[HexCell], hexbin: &Hexbin, offset: f64) -> Result<()> {
    let hexagon = hexbin.hexagon_path();

    writeln!(writer, r#"<g class="hexagons" transform="translate(0,{})">"#, fmt_num(offset))?;
    for cell in cells {
        writeln!(
            writer,
            r#"<path class="hex" d="{hexagon}" transform="translate({},{})" fill="{}" stroke="black" stroke-width="1" opacity="1"><title>{}</title></path>"#,
            fmt_num(cell.x),
            fmt_num(cell.y),
            cell.fill,
            escape(&cell.tooltip()),
        )?;
    }
    writeln!(writer, "</g>")?;
    Ok(())
}

/// Gradient stops `(offset %, color)` sampled evenly over `[0, domain_max]`.
pub fn legend_stops(legend: &LegendConfig, color: &SequentialScale) -> Vec<(f64, Rgb)> {
    let n = legend.stops as f64;
    (0..=legend.stops)
        .map(|i| {
            let i = i as f64;
            (i / n * 100.0, color.apply(legend.domain_max * i / n))
        })
        .collect()
}

/// Axis label for a legend tick: the fraction as a whole percentage, halves rounded up.
pub fn tick_label(value: f64) -> String {
    let label = format!("{:.0}", (value * 100.0).round());
    if label == "-0" { "0".to_string() } else { label }
}

fn write_legend(writer: &mut impl Write, legend: &LegendConfig, color: &SequentialScale, canvas: &CanvasConfig) -> Result<()> {
    let legend_x = canvas.width / 2.0 - legend.width / 2.0;
    let width = fmt_num(legend.width);
    let height = fmt_num(legend.height);

    writeln!(writer, r#"<defs>"#)?;
    writeln!(writer, r#"<linearGradient id="legend-gradient">"#)?;
    for (offset, rgb) in legend_stops(legend, color) {
        writeln!(writer, r#"    <stop offset="{}%" stop-color="{}"/>"#, fmt_num(offset), rgb)?;
    }
    writeln!(writer, "</linearGradient>")?;
    writeln!(writer, "</defs>")?;

    writeln!(writer, r#"<g class="legend" transform="translate({},{})">"#, fmt_num(legend_x), fmt_num(legend.top))?;
    writeln!(
        writer,
        r#"<rect width="{width}" height="{height}" style="fill: url(#legend-gradient); stroke: {LEGEND_STROKE}; stroke-width: 1;"/>"#
    )?;

    // Bottom axis with inner ticks drawn upward across the bar.
    let axis = LinearScale::new((0.0, legend.domain_max), (0.0, legend.width));
    writeln!(
        writer,
        r#"<g transform="translate(0,{height})" fill="none" font-size="10" font-family="sans-serif" text-anchor="middle">"#
    )?;
    writeln!(writer, r#"<path class="domain" stroke="currentColor" d="M0,0V0H{width}V0"/>"#)?;
    for tick in axis.ticks(legend.ticks) {
        writeln!(
            writer,
            r#"<g class="tick" opacity="1" transform="translate({},0)"><line stroke="currentColor" y2="-{height}"/><text fill="currentColor" y="3" dy="1.0em">{}</text></g>"#,
            fmt_num(axis.apply(tick)),
            tick_label(tick),
        )?;
    }
    writeln!(writer, "</g>")?;

    writeln!(
        writer,
        r#"<text class="legendText" x="0" y="-8" text-anchor="start">{}</text>"#,
        escape(&legend.label)
    )?;
    writeln!(writer, "</g>")?;
    Ok(())
}

/// Title, subtitle and the linked source footnote.
fn write_annotations(writer: &mut impl Write, text: &TextConfig, canvas: &CanvasConfig) -> Result<()> {
    let center = fmt_num(canvas.width / 2.0);

    writeln!(
        writer,
        r#"<text class="map-title" text-anchor="middle" x="{center}" y="80"><tspan style="fill: {TEXT_FILL};">{}</tspan></text>"#,
        escape(&text.title)
    )?;
    writeln!(
        writer,
        r#"<text class="map-subtitle" text-anchor="middle" x="{center}" y="107.5" style="fill: {TEXT_FILL};">{}</text>"#,
        escape(&text.subtitle)
    )?;

    let url = escape(&text.source_url);
    writeln!(
        writer,
        r#"<text text-anchor="middle" x="0" y="{}" class="referenceText"><a href="{url}" xlink:href="{url}" target="_blank"><tspan x="{center}" dy="1.4em">{}</tspan></a></text>"#,
        fmt_num(canvas.height + 160.0),
        escape(&text.source)
    )?;
    Ok(())
}
