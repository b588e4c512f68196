pub mod chromium;
pub mod readiness;
pub mod traits;

pub use chromium::{ChromiumDriver, LaunchOptions};
pub use readiness::ReadinessGate;
pub use traits::PageDriver;

#[cfg(test)]
pub use traits::MockPageDriver;
