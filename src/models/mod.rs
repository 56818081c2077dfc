pub mod avatar;
pub mod job;
