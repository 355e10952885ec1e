pub mod alert;
pub mod network;
