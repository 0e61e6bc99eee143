pub mod device;
pub mod preprocessor;
pub mod scan;
pub mod session;
pub mod storage;
