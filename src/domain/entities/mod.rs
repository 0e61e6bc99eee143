pub mod asset;
pub mod cache;
pub mod identity;
pub mod notice;
pub mod scan;
