//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Fit an image into a maximum width, preserving aspect ratio.
///
/// Images already narrower than `max_width` keep their size (never
/// upscaled). The scaled height is rounded and never drops below 1px.
///
/// # Examples
/// ```
/// # use gallery_scan::imaging::calculate_bounded_dimensions;
/// // 4032x3024 landscape into 400px → 400x300
/// assert_eq!(calculate_bounded_dimensions((4032, 3024), 400), (400, 300));
///
/// // Already small enough → unchanged
/// assert_eq!(calculate_bounded_dimensions((320, 240), 400), (320, 240));
/// ```
pub fn calculate_bounded_dimensions(source: (u32, u32), max_width: u32) -> (u32, u32) {
    let (src_w, src_h) = source;

    if src_w <= max_width || src_w == 0 {
        return (src_w, src_h);
    }

    let ratio = max_width as f64 / src_w as f64;
    let h = ((src_h as f64 * ratio).round() as u32).max(1);
    (max_width, h)
}
