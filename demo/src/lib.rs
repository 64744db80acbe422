//! Types generated from `schema/messages.msg` by the build script.

#[allow(clippy::all)]
pub mod generated {
    include!(concat!(env!("OUT_DIR"), "/messages.rs"));
}

pub use generated::*;
