pub(crate) mod parallel;
pub(crate) mod spatial;
