//! Colors shared by every chart.

use plotters::style::RGBColor;

/// Ground-truth label bands.
pub const LABEL_COLOR: RGBColor = RGBColor(214, 39, 40);
/// Predicted range bands.
pub const PREDICTION_COLOR: RGBColor = RGBColor(31, 119, 180);
/// Importance that no component accounts for.
pub const UNMAPPED_COLOR: RGBColor = RGBColor(127, 127, 127);

/// Line colors for sensor series; blue and red are left to the bands.
const SERIES: [RGBColor; 8] = [
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
    RGBColor(227, 119, 194),
    RGBColor(188, 189, 34),
    RGBColor(23, 190, 207),
    RGBColor(64, 64, 64),
];

pub fn series_color(index: usize) -> RGBColor {
    SERIES[index % SERIES.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_series_colors_cycle_and_avoid_band_colors() {
        assert_eq!(series_color(0), series_color(SERIES.len()));
        for i in 0..SERIES.len() {
            assert_ne!(series_color(i), LABEL_COLOR);
            assert_ne!(series_color(i), PREDICTION_COLOR);
        }
    }
}
