pub mod identity;
pub mod repositories;
