//! Platform-specific auto-launch store implementations

#[cfg(windows)]
pub mod windows;

#[cfg(target_os = "linux")]
pub mod xdg;

use crate::core::StartupStore;

/// The native auto-launch stores for this platform, user scope first.
///
/// The same enumeration order as the original registry scan: current-user
/// entries, then machine-wide ones.
pub fn native_stores() -> Vec<Box<dyn StartupStore>> {
    #[cfg(windows)]
    {
        vec![
            Box::new(windows::RegistryRunStore::current_user()) as Box<dyn StartupStore>,
            Box::new(windows::RegistryRunStore::local_machine()),
        ]
    }

    #[cfg(target_os = "linux")]
    {
        vec![
            Box::new(xdg::XdgAutostartStore::user()) as Box<dyn StartupStore>,
            Box::new(xdg::XdgAutostartStore::system()),
        ]
    }

    #[cfg(not(any(windows, target_os = "linux")))]
    {
        tracing::warn!("No native auto-launch stores on this platform");
        Vec::new()
    }
}
