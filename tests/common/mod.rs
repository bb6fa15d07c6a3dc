#![allow(dead_code)]

pub use watchlines_test_utils::builders;
pub use watchlines_test_utils::lines;
pub use watchlines_test_utils::recorder;
pub use watchlines_test_utils::{init_tracing, wait_until};
