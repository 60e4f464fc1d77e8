pub mod dispatch;
pub mod providers;
pub mod timeapi;
