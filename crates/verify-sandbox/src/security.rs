//! Security policy governing sandboxed container resource limits.

use bollard::models::HostConfig;
use std::collections::HashMap;

use crate::error::{Result, SandboxError};

/// Immutable security policy for a single sandboxed run.
///
/// `network_disabled` is always `true`: sandboxed containers are never
/// allowed network access, and [`SecurityPolicy::new`] rejects any attempt
/// to set it otherwise. `to_host_config` hard-codes `network_mode: "none"`
/// regardless, so this is belt-and-suspenders rather than the only guard.
#[derive(Debug, Clone)]
pub struct SecurityPolicy {
    network_disabled: bool,
    read_only_rootfs: bool,
    memory_limit_mb: u32,
    cpu_period: i64,
    cpu_quota: i64,
    pids_limit: i64,
    tmpfs_size_mb: u32,
    timeout_seconds: u32,
    no_new_privileges: bool,
    cap_drop: Vec<String>,
}

impl SecurityPolicy {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        network_disabled: bool,
        read_only_rootfs: bool,
        memory_limit_mb: u32,
        cpu_period: i64,
        cpu_quota: i64,
        pids_limit: u32,
        tmpfs_size_mb: u32,
        timeout_seconds: u32,
        no_new_privileges: bool,
        cap_drop: Vec<String>,
    ) -> Result<Self> {
        if !network_disabled {
            return Err(SandboxError::InvalidPolicy(
                "network_disabled must be true: sandboxed containers are never allowed network access"
                    .to_string(),
            ));
        }
        if memory_limit_mb == 0 {
            return Err(SandboxError::InvalidPolicy(
                "memory_limit_mb must be a positive integer".to_string(),
            ));
        }
        if timeout_seconds == 0 {
            return Err(SandboxError::InvalidPolicy(
                "timeout_seconds must be a positive integer".to_string(),
            ));
        }
        if pids_limit == 0 {
            return Err(SandboxError::InvalidPolicy(
                "pids_limit must be a positive integer".to_string(),
            ));
        }
        if cpu_period <= 0 {
            return Err(SandboxError::InvalidPolicy(
                "cpu_period must be a positive integer".to_string(),
            ));
        }
        if cpu_quota <= 0 {
            return Err(SandboxError::InvalidPolicy(
                "cpu_quota must be a positive integer".to_string(),
            ));
        }
        if tmpfs_size_mb == 0 {
            return Err(SandboxError::InvalidPolicy(
                "tmpfs_size_mb must be a positive integer".to_string(),
            ));
        }

        Ok(Self {
            network_disabled,
            read_only_rootfs,
            memory_limit_mb,
            cpu_period,
            cpu_quota,
            pids_limit: pids_limit as i64,
            tmpfs_size_mb,
            timeout_seconds,
            no_new_privileges,
            cap_drop,
        })
    }

    /// Build a policy from a job's resource limits, keeping every other
    /// field at its locked-down default.
    pub fn from_resource_limits(
        memory_limit_mb: u32,
        timeout_seconds: u32,
        pids_limit: u32,
        tmpfs_size_mb: u32,
    ) -> Result<Self> {
        let defaults = Self::default();
        Self::new(
            true,
            defaults.read_only_rootfs,
            memory_limit_mb,
            defaults.cpu_period,
            defaults.cpu_quota,
            pids_limit,
            tmpfs_size_mb,
            timeout_seconds,
            defaults.no_new_privileges,
            defaults.cap_drop,
        )
    }

    pub fn timeout_seconds(&self) -> u32 {
        self.timeout_seconds
    }

    /// Convert to the bollard `HostConfig` fields this policy controls.
    /// `binds` is left unset here; the caller fills it in with the
    /// code/data bind mounts.
    pub fn to_host_config(&self) -> HostConfig {
        let mut tmpfs = HashMap::new();
        // /tmp must stay executable: interpreters (Python, R, Julia) write
        // and exec helper files there during startup.
        tmpfs.insert(
            "/tmp".to_string(),
            format!("size={}m,nosuid", self.tmpfs_size_mb),
        );
        // /output holds only artifacts the runner writes back; it never
        // needs to execute anything.
        tmpfs.insert(
            "/output".to_string(),
            format!("size={}m,noexec,nosuid", self.tmpfs_size_mb),
        );

        HostConfig {
            network_mode: Some("none".to_string()),
            read_only_rootfs: Some(self.read_only_rootfs),
            memory: Some(self.memory_limit_mb as i64 * 1024 * 1024),
            memory_swap: Some(self.memory_limit_mb as i64 * 1024 * 1024),
            cpu_period: Some(self.cpu_period),
            cpu_quota: Some(self.cpu_quota),
            pids_limit: Some(self.pids_limit),
            security_opt: if self.no_new_privileges {
                Some(vec!["no-new-privileges".to_string()])
            } else {
                Some(vec![])
            },
            cap_drop: Some(self.cap_drop.clone()),
            tmpfs: Some(tmpfs),
            ..Default::default()
        }
    }
}

impl Default for SecurityPolicy {
    fn default() -> Self {
        Self::new(true, true, 2048, 100_000, 100_000, 64, 256, 120, true, vec!["ALL".to_string()])
            .expect("default security policy parameters are always valid")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_network_enabled() {
        let result = SecurityPolicy::new(false, true, 2048, 100_000, 100_000, 64, 256, 120, true, vec![]);
        assert!(result.is_err());
    }

    #[test]
    fn rejects_zero_memory() {
        let result = SecurityPolicy::new(true, true, 0, 100_000, 100_000, 64, 256, 120, true, vec![]);
        assert!(result.is_err());
    }

    #[test]
    fn rejects_zero_timeout() {
        let result = SecurityPolicy::new(true, true, 2048, 100_000, 100_000, 64, 256, 0, true, vec![]);
        assert!(result.is_err());
    }

    #[test]
    fn default_policy_hard_codes_no_network() {
        let policy = SecurityPolicy::default();
        let host_config = policy.to_host_config();
        assert_eq!(host_config.network_mode.as_deref(), Some("none"));
    }

    #[test]
    fn from_resource_limits_locks_network_regardless() {
        let policy = SecurityPolicy::from_resource_limits(1024, 60, 32, 128).unwrap();
        let host_config = policy.to_host_config();
        assert_eq!(host_config.network_mode.as_deref(), Some("none"));
        assert_eq!(host_config.memory, Some(1024 * 1024 * 1024));
        assert_eq!(host_config.pids_limit, Some(32));
    }
}
