pub(crate) mod adapter;
pub(crate) mod backend;
pub(crate) mod canonical;
