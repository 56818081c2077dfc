pub mod glb;
pub mod scheduler;
pub mod store;
