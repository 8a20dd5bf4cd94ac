pub mod buildspec;
pub mod diff;
pub mod list;
pub mod synth;
pub mod validate;
