use chrono::Duration;
use plotters::prelude::*;
use tracing::debug;

use crate::models::PricePoint;
use crate::utils::group_thousands;

/// Percentage change across the series: `(last - first) / first * 100`.
///
/// Not computable for fewer than two points or a zero base price; those
/// cases return `None` and the chart overlay is simply omitted.
pub fn change_pct(points: &[PricePoint]) -> Option<f64> {
    if points.len() < 2 {
        return None;
    }
    let first = points[0].price;
    let last = points[points.len() - 1].price;
    if first == 0.0 {
        return None;
    }
    Some((last - first) / first * 100.0)
}

/// Overlay color for the change label: green for gains (and flat), red for losses
pub fn overlay_color(pct: f64) -> RGBColor {
    if pct >= 0.0 {
        GREEN
    } else {
        RED
    }
}

/// Render the price history as a PNG line chart and return the encoded bytes.
///
/// An empty series is a no-op: nothing is drawn and the returned buffer is
/// empty. The caller decides where the bytes go and checks for the empty
/// buffer before writing.
pub fn render_chart(
    points: &[PricePoint],
    days: u32,
    width: u32,
    height: u32,
) -> Result<Vec<u8>, String> {
    if points.is_empty() {
        debug!("Empty price series, skipping chart render");
        return Ok(Vec::new());
    }

    // Use a temporary file path for BitMapBackend
    let temp_file = format!(
        "/tmp/btcwatch_chart_{}.png",
        chrono::Utc::now().timestamp_millis()
    );

    // The temp file is unlinked whether the draw succeeded or not
    match draw_chart(&temp_file, points, days, width, height) {
        Ok(()) => collect_chart_file(&temp_file),
        Err(e) => {
            let _ = std::fs::remove_file(&temp_file);
            Err(e)
        }
    }
}

/// Draw the full chart into `path`; file handling stays with the caller
fn draw_chart(
    path: &str,
    points: &[PricePoint],
    days: u32,
    width: u32,
    height: u32,
) -> Result<(), String> {
    let backend = BitMapBackend::new(path, (width, height));
    let root = backend.into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| format!("Failed to fill canvas: {}", e))?;

    // Find price range
    let min_price = points.iter().map(|p| p.price).fold(f64::INFINITY, f64::min);
    let max_price = points
        .iter()
        .map(|p| p.price)
        .fold(f64::NEG_INFINITY, f64::max);

    // Add some padding to the price range
    let price_range = (max_price - min_price).max(1e-8); // Flat series still need a non-zero span
    let padding = price_range * 0.1;
    let y_min = (min_price - padding).max(0.0);
    let y_max = max_price + padding;

    // Get time range; a single-point series is padded so the axis stays
    // non-degenerate
    let mut x_min = points[0].timestamp;
    let mut x_max = points[points.len() - 1].timestamp;
    if x_min == x_max {
        x_min = x_min - Duration::hours(12);
        x_max = x_max + Duration::hours(12);
    }

    let mut chart = ChartBuilder::on(&root)
        .caption("Bitcoin Price History (USD)", ("sans-serif", 30.0).into_font())
        .margin(15)
        .x_label_area_size(80)
        .y_label_area_size(80)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)
        .map_err(|e| format!("Failed to build chart: {}", e))?;

    // One tick per data point, rotated date labels, dollar-formatted
    // prices without decimals
    chart
        .configure_mesh()
        .x_desc("Date")
        .y_desc("Price (USD)")
        .x_labels(points.len())
        .x_label_formatter(&|ts| ts.format("%Y-%m-%d").to_string())
        .x_label_style(
            ("sans-serif", 13)
                .into_font()
                .transform(FontTransform::Rotate90),
        )
        .y_label_formatter(&|price| format!("${}", group_thousands(*price, 0)))
        .draw()
        .map_err(|e| format!("Failed to draw mesh: {}", e))?;

    // Draw price points as circles connected by lines
    for i in 0..points.len() {
        if i > 0 {
            chart
                .draw_series(std::iter::once(PathElement::new(
                    vec![
                        (points[i - 1].timestamp, points[i - 1].price),
                        (points[i].timestamp, points[i].price),
                    ],
                    &BLUE,
                )))
                .map_err(|e| format!("Failed to draw line: {}", e))?;
        }
        chart
            .draw_series(std::iter::once(Circle::new(
                (points[i].timestamp, points[i].price),
                3,
                BLUE.filled(),
            )))
            .map_err(|e| format!("Failed to draw point: {}", e))?;
    }

    // Change-over-window label in the top-left corner, on a translucent
    // backing box so it stays readable over the series
    if let Some(pct) = change_pct(points) {
        let label = format!("{}d Change: {:.2}%", days, pct);
        let style = ("sans-serif", 22)
            .into_font()
            .color(&overlay_color(pct));
        let (text_w, text_h) = root
            .estimate_text_size(&label, &style)
            .map_err(|e| format!("Failed to measure label: {}", e))?;
        let (x, y) = (70, 55);
        root.draw(&Rectangle::new(
            [
                (x - 6, y - 4),
                (x + text_w as i32 + 6, y + text_h as i32 + 4),
            ],
            WHITE.mix(0.8).filled(),
        ))
        .map_err(|e| format!("Failed to draw label box: {}", e))?;
        root.draw(&Text::new(label, (x, y), style))
            .map_err(|e| format!("Failed to draw label: {}", e))?;
    }

    root.present()
        .map_err(|e| format!("Failed to render chart: {}", e))?;

    Ok(())
}

/// Read the rendered file into memory, unlinking it whether or not the
/// read worked
fn collect_chart_file(path: &str) -> Result<Vec<u8>, String> {
    let image_data =
        std::fs::read(path).map_err(|e| format!("Failed to read chart file: {}", e));
    let _ = std::fs::remove_file(path);
    image_data
}
