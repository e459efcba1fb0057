pub(crate) mod export;
pub(crate) mod limits;
pub(crate) mod meta;
pub(crate) mod migrate;
