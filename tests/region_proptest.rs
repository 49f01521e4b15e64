// Property tests for display-space crop geometry: clamping, aspect
// constraint and scale-factor mapping must hold for arbitrary inputs.

use banner_crop::crop_pipeline::{CropRegion, CropSelection, DisplaySize, ScaleFactors};
use proptest::prelude::*;

proptest! {
    #[test]
    fn clamped_region_always_stays_within_bounds(
        x in -500f32..500.0,
        y in -500f32..500.0,
        width in 0f32..1000.0,
        height in 0f32..1000.0,
        bounds_width in 1f32..2000.0,
        bounds_height in 1f32..2000.0,
    ) {
        let bounds = DisplaySize::new(bounds_width, bounds_height)
            .expect("generated bounds are positive");
        let region = CropRegion::new(x, y, width, height).clamped_to(bounds);

        prop_assert!(region.x >= 0.0);
        prop_assert!(region.y >= 0.0);
        prop_assert!(region.width >= 0.0);
        prop_assert!(region.height >= 0.0);
        prop_assert!(region.x + region.width <= bounds_width + 1e-3);
        prop_assert!(region.y + region.height <= bounds_height + 1e-3);
    }

    #[test]
    fn aspect_locked_drag_never_leaves_bounds_or_ratio(
        // 锚点与指针都可能落在显示边界外（组件外按下/拖出），选区仍不得越界。
        anchor_x in -100f32..400.0,
        anchor_y in -100f32..200.0,
        pointer_x in -100f32..400.0,
        pointer_y in -100f32..200.0,
    ) {
        let bounds = DisplaySize::new(300.0, 100.0).expect("bounds are positive");
        let mut selection = CropSelection::default();
        selection.start_new_selection(anchor_x, anchor_y);
        selection.update_drag(pointer_x, pointer_y, bounds, Some(3.0), 1.0);

        let region = selection.region.expect("drag always yields a region");
        prop_assert!(region.x >= -1e-3);
        prop_assert!(region.y >= -1e-3);
        prop_assert!(region.width >= 0.0);
        prop_assert!(region.height >= 0.0);
        prop_assert!(region.x + region.width <= 300.0 + 1e-3);
        prop_assert!(region.y + region.height <= 100.0 + 1e-3);

        if region.height > 1e-3 {
            prop_assert!((region.width / region.height - 3.0).abs() < 1e-2);
        }
    }

    #[test]
    fn source_rect_is_region_times_scale_factors(
        x in 0f32..100.0,
        y in 0f32..50.0,
        width in 1f32..100.0,
        height in 1f32..50.0,
    ) {
        // Display at half the natural resolution: scaleX = scaleY = 2.
        let display = DisplaySize::new(200.0, 100.0).expect("display is positive");
        let scale = ScaleFactors::compute(400, 200, display).expect("scale computes");

        let region = CropRegion::new(x, y, width, height);
        let (src_x, src_y, src_width, src_height) = scale.source_rect(&region);

        prop_assert_eq!(src_x, (x * 2.0).round() as u32);
        prop_assert_eq!(src_y, (y * 2.0).round() as u32);
        prop_assert_eq!(src_width, ((width * 2.0).round() as u32).max(1));
        prop_assert_eq!(src_height, ((height * 2.0).round() as u32).max(1));
    }

    #[test]
    fn output_size_is_display_space_rounded(
        width in 0.1f32..1000.0,
        height in 0.1f32..1000.0,
    ) {
        let (out_width, out_height) = CropRegion::new(0.0, 0.0, width, height).output_size();
        prop_assert_eq!(out_width, (width.round() as u32).max(1));
        prop_assert_eq!(out_height, (height.round() as u32).max(1));
    }
}
