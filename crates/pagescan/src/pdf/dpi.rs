//! Density selection shared by the rasterizers.

use crate::core::config::{MAX_DPI, MIN_DPI};

pub(crate) const PDF_POINTS_PER_INCH: f64 = 72.0;

/// Highest density at or below `target_dpi` whose output for a
/// `page_width` x `page_height` point page fits within `max_dimension` pixels
/// on both edges, clamped to `MIN_DPI..=MAX_DPI`.
pub(crate) fn calculate_optimal_dpi(page_width: f64, page_height: f64, target_dpi: i32, max_dimension: i32) -> i32 {
    let width_inches = page_width / PDF_POINTS_PER_INCH;
    let height_inches = page_height / PDF_POINTS_PER_INCH;

    let width_at_target = (width_inches * target_dpi as f64) as i32;
    let height_at_target = (height_inches * target_dpi as f64) as i32;

    if width_at_target <= max_dimension && height_at_target <= max_dimension {
        return target_dpi.clamp(MIN_DPI, MAX_DPI);
    }

    let width_limited_dpi = (max_dimension as f64 / width_inches) as i32;
    let height_limited_dpi = (max_dimension as f64 / height_inches) as i32;

    width_limited_dpi.min(height_limited_dpi).clamp(MIN_DPI, MAX_DPI)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letter_page_keeps_target_dpi() {
        assert_eq!(calculate_optimal_dpi(612.0, 792.0, 300, 65536), 300);
    }

    #[test]
    fn test_a4_at_300_fits_default_bound() {
        assert_eq!(calculate_optimal_dpi(595.0, 842.0, 300, 3508), 300);
    }

    #[test]
    fn test_oversized_page_lowers_dpi() {
        let dpi = calculate_optimal_dpi(612.0, 792.0, 300, 2000);
        assert!(dpi < 300);
        assert!((792.0 / PDF_POINTS_PER_INCH * dpi as f64) as i32 <= 2000);
    }

    #[test]
    fn test_dpi_clamped_to_bounds() {
        assert_eq!(calculate_optimal_dpi(612.0, 792.0, 1200, 65536), MAX_DPI);
        assert_eq!(calculate_optimal_dpi(14400.0, 14400.0, 300, 100), MIN_DPI);
    }
}
