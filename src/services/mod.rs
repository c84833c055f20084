pub mod question_bank;
pub mod session;
pub mod summary;
pub mod validation;
pub mod wizard;
