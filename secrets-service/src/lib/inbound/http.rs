pub mod handlers;
pub mod router;
pub mod session;
pub mod views;
