pub(crate) mod hierarchy;
pub(crate) mod transforms;
