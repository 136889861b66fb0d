//! Shared chart-data shaping: the color palette, percentage math and the
//! bubble layout used by the top-expenses chart.

/// Fixed palette cycled through when an entity has no explicit color.
pub const CHART_PALETTE: [&str; 10] = [
    "#FF6384", "#36A2EB", "#FFCE56", "#4BC0C0", "#9966FF", "#FF9F40", "#FF6B6B", "#4ECDC4",
    "#45B7D1", "#96CEB4",
];

/// How many categories the top-expenses chart shows.
pub const TOP_CATEGORIES_LIMIT: usize = 10;

/// Pick the display color for a series entry. An explicit color wins; empty
/// or the black placeholder falls back to the palette by position.
pub fn series_color(explicit: Option<&str>, index: usize) -> String {
    match explicit {
        Some(color) if !color.is_empty() && color != "#000000" => color.to_string(),
        _ => CHART_PALETTE[index % CHART_PALETTE.len()].to_string(),
    }
}

/// Share of `value` in `total` as a percentage with one decimal place.
/// A zero or negative total means there is no data, not a zero share.
pub fn percentage(value: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    (value as f64 / total as f64 * 1000.0).round() / 10.0
}

/// Like [`percentage`] but with two decimal places, used by the dashboard
/// category breakdown.
pub fn percentage_precise(value: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    (value as f64 / total as f64 * 10000.0).round() / 100.0
}

/// One positioned bubble in the top-expenses layout. Coordinates and radius
/// are percentages of the chart viewport.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct Bubble {
    pub x: f64,
    pub y: f64,
    pub r: f64,
}

const GOLDEN_ANGLE_DEG: f64 = 137.50776405003785;
const SPIRAL_STEP: f64 = 11.0;
const MIN_RADIUS: f64 = 8.0;
const MAX_RADIUS: f64 = 26.0;

/// Lay out bubbles on a golden-angle spiral around the viewport center.
///
/// Position depends only on the series index, radius only on the value's
/// share of the maximum, so the same series always yields the same layout.
pub fn bubble_layout(values: &[i64]) -> Vec<Bubble> {
    let max = values.iter().copied().max().unwrap_or(0);
    if max <= 0 {
        return Vec::new();
    }

    values
        .iter()
        .enumerate()
        .map(|(i, &value)| {
            let angle = (i as f64 * GOLDEN_ANGLE_DEG).to_radians();
            let distance = SPIRAL_STEP * (i as f64).sqrt();
            let share = (value.max(0) as f64 / max as f64).sqrt();
            Bubble {
                x: round2(50.0 + distance * angle.cos()),
                y: round2(50.0 + distance * angle.sin()),
                r: round2(MIN_RADIUS + (MAX_RADIUS - MIN_RADIUS) * share),
            }
        })
        .collect()
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage_one_decimal() {
        assert_eq!(percentage(12000, 100000), 12.0);
        assert_eq!(percentage(88000, 100000), 88.0);
        assert_eq!(percentage(1, 3), 33.3);
    }

    #[test]
    fn test_percentage_sums_to_hundred() {
        let total = 100000;
        let parts = [12000, 88000];
        let sum: f64 = parts.iter().map(|&p| percentage(p, total)).sum();
        assert!((sum - 100.0).abs() < 0.001);
    }

    #[test]
    fn test_percentage_zero_total() {
        assert_eq!(percentage(500, 0), 0.0);
        assert_eq!(percentage_precise(500, 0), 0.0);
    }

    #[test]
    fn test_percentage_precise_two_decimals() {
        assert_eq!(percentage_precise(1, 3), 33.33);
    }

    #[test]
    fn test_explicit_color_wins() {
        assert_eq!(series_color(Some("#123456"), 0), "#123456");
    }

    #[test]
    fn test_placeholder_color_falls_back_to_palette() {
        assert_eq!(series_color(Some("#000000"), 0), CHART_PALETTE[0]);
        assert_eq!(series_color(Some(""), 1), CHART_PALETTE[1]);
        assert_eq!(series_color(None, 2), CHART_PALETTE[2]);
    }

    #[test]
    fn test_palette_cycles() {
        assert_eq!(series_color(None, 10), CHART_PALETTE[0]);
        assert_eq!(series_color(None, 13), CHART_PALETTE[3]);
    }

    #[test]
    fn test_bubble_layout_deterministic() {
        let values = [500, 300, 200];
        assert_eq!(bubble_layout(&values), bubble_layout(&values));
    }

    #[test]
    fn test_first_bubble_centered_and_largest() {
        let bubbles = bubble_layout(&[500, 300, 200]);
        assert_eq!(bubbles[0].x, 50.0);
        assert_eq!(bubbles[0].y, 50.0);
        assert_eq!(bubbles[0].r, MAX_RADIUS);
        assert!(bubbles[1].r > bubbles[2].r);
    }

    #[test]
    fn test_bubble_layout_empty_series() {
        assert!(bubble_layout(&[]).is_empty());
        assert!(bubble_layout(&[0, 0]).is_empty());
    }
}
