pub(crate) mod normalize;
pub(crate) mod render_timeline;
