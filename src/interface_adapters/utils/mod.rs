pub mod sleep;

pub use sleep::TokioSleeper;
