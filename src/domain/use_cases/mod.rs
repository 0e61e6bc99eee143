pub mod home;
pub(crate) mod in_flight;
pub mod scan_cache;
pub mod upload;
