pub mod assessment;
pub mod extraction;
pub mod user;
