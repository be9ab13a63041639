use super::*;

#[test]
fn landscape_hd_is_scaled_to_height_and_center_cropped() {
    let g = FrameGeometry::fit(1920, 1080, 1080, 1920).unwrap();
    // 1920 * 1920 / 1080 = 3413.33 -> 3414 (even).
    assert_eq!(g.scaled_height, 1920);
    assert_eq!(g.scaled_width, 3414);
    assert_eq!(g.visible_width, 1080);
    assert_eq!(g.crop_x, (3414 - 1080) / 2);
    assert_eq!(g.offset_x, 0);
    assert!(!g.is_pillarboxed());
}

#[test]
fn exact_portrait_source_needs_no_crop() {
    let g = FrameGeometry::fit(720, 1280, 1080, 1920).unwrap();
    assert_eq!(g.scaled_width, 1080);
    assert_eq!(g.crop_x, 0);
    assert_eq!(g.visible_width, 1080);
}

#[test]
fn narrow_source_is_pillarboxed_and_centered() {
    let g = FrameGeometry::fit(400, 1000, 1080, 1920).unwrap();
    assert_eq!(g.scaled_width, 768);
    assert!(g.is_pillarboxed());
    assert_eq!(g.visible_width, 768);
    assert_eq!(g.offset_x, (1080 - 768) / 2);
    assert_eq!(g.video_rect(), Rect::new(156.0, 0.0, 924.0, 1920.0));
}

#[test]
fn zero_dimensions_are_geometry_errors() {
    for (sw, sh, tw, th) in [(0, 1080, 1080, 1920), (1920, 0, 1080, 1920), (1920, 1080, 0, 1920), (1920, 1080, 1080, 0)] {
        assert!(matches!(
            FrameGeometry::fit(sw, sh, tw, th).unwrap_err(),
            ReelError::Geometry(_)
        ));
    }
}

#[test]
fn degenerate_aspect_ratio_is_rejected() {
    assert!(matches!(
        FrameGeometry::fit(1, 100_000, 1080, 1920).unwrap_err(),
        ReelError::Geometry(_)
    ));
}

#[test]
fn filter_graph_scales_then_crops() {
    let g = FrameGeometry::fit(1920, 1080, 1080, 1920).unwrap();
    let fps = Fps::new(30, 1).unwrap();
    assert_eq!(g.ffmpeg_filter(fps), "fps=30/1,scale=3414:1920,crop=1080:1920:1167:0");
    assert_eq!(g.frame_len(), 1080 * 1920 * 4);
}
