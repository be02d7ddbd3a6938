pub mod participant;
pub mod timestamp;
pub mod trip;
