mod builder;
mod document;
mod value;

pub(crate) use builder::Builder;
