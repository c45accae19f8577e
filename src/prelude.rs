/*!
Re-exports shared by every module of the crate.
*/

pub use snafu::{ensure, OptionExt, ResultExt, Snafu};
