/// JPEG quality applied to every scan before upload (0.0..=1.0).
pub const DEFAULT_JPEG_QUALITY: f32 = 0.75;

/// The home screen only needs the newest scan.
pub const DEFAULT_INITIAL_PAGE_SIZE: u32 = 1;

pub const DEFAULT_HISTORY_PAGE_SIZE: u32 = 10;

pub const MAX_PAGE_SIZE: u32 = 100;
