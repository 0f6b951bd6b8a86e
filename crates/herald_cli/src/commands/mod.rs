pub(crate) mod health;
pub(crate) mod meta;
pub(crate) mod run;
pub(crate) mod shared;
pub(crate) mod validate;
