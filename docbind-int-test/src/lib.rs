pub mod test_model;
pub mod test_util;
