//! Chart and map blocks.
//!
//! Charts are drawn server-side with plotters' SVG backend and inlined, so
//! the page needs no script. Maps are drawn as a ranked colour table:
//! countries are only known by name, so there is no geometry to fill.

use maud::{html, Markup, PreEscaped};
use plotters::prelude::*;
use tracing::warn;

use crate::dashboard::view::{format_compact, format_thousands, Chart, ChartKind, Choropleth};

const SIZE: (u32, u32) = (760, 420);

type DrawResult<T> = Result<T, DrawingAreaErrorKind<std::io::Error>>;

/// Qualitative palette for series colours.
const PALETTE: [RGBColor; 10] = [
    RGBColor(0x63, 0x6e, 0xfa),
    RGBColor(0xef, 0x55, 0x3b),
    RGBColor(0x00, 0xcc, 0x96),
    RGBColor(0xab, 0x63, 0xfa),
    RGBColor(0xff, 0xa1, 0x5a),
    RGBColor(0x19, 0xd3, 0xf3),
    RGBColor(0xff, 0x66, 0x92),
    RGBColor(0xb6, 0xe8, 0x80),
    RGBColor(0xff, 0x97, 0xff),
    RGBColor(0xfe, 0xcb, 0x52),
];

fn series_color(index: usize) -> RGBColor {
    PALETTE[index % PALETTE.len()]
}

/// Viridis control points, dark to light.
const VIRIDIS: [(u8, u8, u8); 5] = [(68, 1, 84), (59, 82, 139), (33, 145, 140), (94, 201, 98), (253, 231, 37)];

/// Colour for `t` in `[0, 1]` on the Viridis scale; out-of-range values are clamped.
pub fn viridis(t: f64) -> String {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
    let scaled = t * (VIRIDIS.len() - 1) as f64;
    let i = (scaled.floor() as usize).min(VIRIDIS.len() - 2);
    let f = scaled - i as f64;
    let (a, b) = (VIRIDIS[i], VIRIDIS[i + 1]);
    let mix = |x: u8, y: u8| (x as f64 + (y as f64 - x as f64) * f).round() as u8;
    format!("#{:02x}{:02x}{:02x}", mix(a.0, b.0), mix(a.1, b.1), mix(a.2, b.2))
}

/// Distinct x values in first-seen order, one slot each.
fn categories(chart: &Chart) -> Vec<&str> {
    let mut seen: Vec<&str> = Vec::new();
    for point in chart.series.iter().flat_map(|s| &s.points) {
        if !seen.contains(&point.x.as_str()) {
            seen.push(point.x.as_str());
        }
    }
    seen
}

/// Y range covering every finite value and zero; `0..1` when that is empty.
fn y_range(chart: &Chart) -> (f64, f64) {
    let (min, max) = chart
        .series
        .iter()
        .flat_map(|s| s.points.iter().map(|p| p.y))
        .filter(|y| y.is_finite())
        .fold((0.0_f64, 0.0_f64), |(lo, hi), y| (lo.min(y), hi.max(y)));
    if max > min {
        (min, max * 1.05)
    } else {
        (0.0, 1.0)
    }
}

fn draw(chart: &Chart, out: &mut String) -> DrawResult<()> {
    let root = SVGBackend::with_string(out, SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let slots = categories(chart);
    let slot_of = |x: &str| slots.iter().position(|s| *s == x).unwrap_or(0) as u32;
    let label_of = |v: &SegmentValue<u32>| match v {
        SegmentValue::Exact(i) | SegmentValue::CenterOf(i) => {
            slots.get(*i as usize).map(|s| s.to_string()).unwrap_or_default()
        }
        SegmentValue::Last => String::new(),
    };
    let (y_min, y_max) = y_range(chart);

    let mut ctx = ChartBuilder::on(&root)
        .caption(&chart.title, ("sans-serif", 18))
        .margin(10)
        .x_label_area_size(90)
        .y_label_area_size(70)
        .build_cartesian_2d((0..slots.len() as u32).into_segmented(), y_min..y_max)?;

    ctx.configure_mesh()
        .disable_x_mesh()
        .x_labels(slots.len().max(1))
        .x_label_style(("sans-serif", 11).into_font().transform(FontTransform::Rotate90))
        .x_label_formatter(&label_of)
        .y_label_formatter(&|y| format_compact(*y))
        .x_desc(chart.x_label.as_str())
        .y_desc(chart.y_label.as_str())
        .draw()?;

    match chart.kind {
        ChartKind::Bar => {
            for (i, series) in chart.series.iter().enumerate() {
                let bars = series
                    .points
                    .iter()
                    .filter(|p| p.y.is_finite())
                    .map(|p| (slot_of(&p.x), p.y));
                ctx.draw_series(
                    Histogram::vertical(&ctx)
                        .style(series_color(i).filled())
                        .margin(4)
                        .data(bars),
                )?;
            }
        }
        ChartKind::Line => {
            for (i, series) in chart.series.iter().enumerate() {
                let color = series_color(i);
                let coords: Vec<(SegmentValue<u32>, f64)> = series
                    .points
                    .iter()
                    .filter(|p| p.y.is_finite())
                    .map(|p| (SegmentValue::CenterOf(slot_of(&p.x)), p.y))
                    .collect();
                ctx.draw_series(LineSeries::new(coords.iter().cloned(), color.stroke_width(2)))?
                    .label(series.name.as_str())
                    .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 16, y)], color.stroke_width(2)));
                ctx.draw_series(coords.into_iter().map(|c| Circle::new(c, 3, color.filled())))?;
            }
            ctx.configure_series_labels()
                .background_style(&WHITE.mix(0.8))
                .border_style(&BLACK)
                .draw()?;
        }
    }

    root.present()?;
    Ok(())
}

/// Inline SVG for a bar or line chart.
pub fn render_chart(chart: &Chart) -> Markup {
    if chart.series.iter().all(|s| s.points.is_empty()) {
        return html! {
            div.chart {
                p."chart-title" { (chart.title) }
                p.empty { "No data" }
            }
        };
    }
    let mut svg = String::new();
    if let Err(err) = draw(chart, &mut svg) {
        warn!(title = %chart.title, error = %err, "chart rendering failed");
        return html! {
            div.chart {
                p."chart-title" { (chart.title) }
                p.empty { "Chart unavailable" }
            }
        };
    }
    html! {
        div.chart { (PreEscaped(svg)) }
    }
}

/// Countries ranked by value, each with its colour on the Viridis scale.
pub fn render_choropleth(map: &Choropleth) -> Markup {
    let values: Vec<f64> = map.entries.iter().filter_map(|e| e.value).collect();
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = if max > min { max - min } else { 1.0 };

    let mut ranked: Vec<_> = map.entries.iter().collect();
    ranked.sort_by(|a, b| match (a.value, b.value) {
        (Some(a), Some(b)) => b.total_cmp(&a),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });

    let gradient = (0..VIRIDIS.len())
        .map(|i| viridis(i as f64 / (VIRIDIS.len() - 1) as f64))
        .collect::<Vec<_>>()
        .join(",");

    html! {
        div.map {
            p."chart-title" { (map.title) }
            @if !values.is_empty() {
                div.scale {
                    span { (format_compact(min)) }
                    span.gradient style={ "background:linear-gradient(to right," (gradient) ")" } {}
                    span { (format_compact(max)) }
                }
            }
            div."map-table" {
                table {
                    thead { tr { th { "country" } th { (map.value_label) } } }
                    tbody {
                        @for entry in &ranked {
                            @let (color, value) = match entry.value {
                                Some(v) => (viridis((v - min) / span), format_thousands(v)),
                                None => ("#cccccc".to_string(), String::new()),
                            };
                            tr {
                                td { span.swatch style={ "background:" (color) } {} (entry.country) }
                                td.num { (value) }
                            }
                        }
                    }
                }
            }
        }
    }
}
