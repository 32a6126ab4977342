//! Chromium automation over the DevTools protocol

pub mod cdp;
pub mod chrome;
pub mod page;
pub mod scripts;

pub use cdp::CdpClient;
pub use chrome::{ChromeLauncher, ChromeSession, BROWSER_ENV};
pub use page::CdpPage;
