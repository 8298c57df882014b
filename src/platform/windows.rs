//! Windows registry Run-key store

use winreg::enums::{HKEY_CURRENT_USER, HKEY_LOCAL_MACHINE, KEY_READ, REG_BINARY};
use winreg::{RegKey, RegValue};

use crate::core::{SourceError, StartupStore};

const RUN_KEY: &str = r"Software\Microsoft\Windows\CurrentVersion\Run";
const STARTUP_APPROVED_KEY: &str =
    r"Software\Microsoft\Windows\CurrentVersion\Explorer\StartupApproved\Run";

/// Flag byte Explorer reads as "disabled" for a StartupApproved value.
const DISABLED_FLAG: u8 = 0x03;

/// One `Run` registry key as an auto-launch store.
///
/// Disabling never deletes the `Run` value itself; it writes the
/// StartupApproved flag Explorer honors, so the entry stays visible (and
/// re-enableable) in Task Manager.
pub struct RegistryRunStore {
    root: RegKey,
    scope: &'static str,
}

impl RegistryRunStore {
    pub fn current_user() -> Self {
        Self {
            root: RegKey::predef(HKEY_CURRENT_USER),
            scope: "user",
        }
    }

    pub fn local_machine() -> Self {
        Self {
            root: RegKey::predef(HKEY_LOCAL_MACHINE),
            scope: "machine",
        }
    }
}

impl StartupStore for RegistryRunStore {
    fn scope(&self) -> &str {
        self.scope
    }

    fn list(&self) -> Result<Vec<(String, String)>, SourceError> {
        let key = self.root.open_subkey_with_flags(RUN_KEY, KEY_READ)?;

        let mut entries = Vec::new();
        for value in key.enum_values() {
            let (name, data) = value?;
            entries.push((name, data.to_string()));
        }
        Ok(entries)
    }

    fn disable(&self, name: &str) -> Result<(), SourceError> {
        // Approval state lives per-user regardless of which hive the Run
        // value came from.
        let (key, _) = RegKey::predef(HKEY_CURRENT_USER).create_subkey(STARTUP_APPROVED_KEY)?;
        key.set_raw_value(
            name,
            &RegValue {
                bytes: vec![DISABLED_FLAG],
                vtype: REG_BINARY,
            },
        )?;
        Ok(())
    }
}
