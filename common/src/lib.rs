pub mod bit_buffer2;
pub mod buffer2;
pub mod log_setup;
pub mod parallel;

pub use bit_buffer2::BitBuffer2;
pub use buffer2::Buffer2;
