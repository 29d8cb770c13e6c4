pub use sift_core::*;
pub use sift_macros::*;
