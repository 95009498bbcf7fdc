pub mod problem;
pub mod shared;
pub mod submission;
pub mod test_case;
