pub(crate) mod compositor;
pub(crate) mod frame;
pub(crate) mod geometry;
pub(crate) mod source;
