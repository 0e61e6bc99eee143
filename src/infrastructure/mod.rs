pub mod auth;
pub mod db;
pub mod device;
pub mod imaging;
pub mod notify;
pub mod storage;
