//! `ip link` based interface driver
//!
//! Runs the iproute2 `ip` binary directly with argument vectors (no shell), so
//! interface names coming from resource specs are never interpreted by `sh`.

use crate::driver_trait::InterfaceDriver;
use crate::error::DriverError;
use crate::models::{LinkDetails, VlanLink};
use crate::plan::{LinkAction, check_owned, plan_link};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, trace, warn};

/// Default path of the `ip` command
pub const DEFAULT_IP_CMD: &str = "/sbin/ip";

/// Kernel limit on interface name length (IFNAMSIZ - 1)
pub const MAX_IFNAME_LEN: usize = 15;

/// Result of a command execution.
#[derive(Debug, Clone)]
struct ExecResult {
    exit_code: i32,
    stdout: String,
    stderr: String,
}

impl ExecResult {
    fn success(&self) -> bool {
        self.exit_code == 0
    }

    fn combined_output(&self) -> String {
        if self.stderr.is_empty() {
            self.stdout.clone()
        } else if self.stdout.is_empty() {
            self.stderr.clone()
        } else {
            format!("{}\n{}", self.stdout, self.stderr)
        }
    }
}

/// Interface driver backed by iproute2
#[derive(Debug, Clone)]
pub struct IpLinkDriver {
    ip_cmd: String,
}

impl Default for IpLinkDriver {
    fn default() -> Self {
        Self::new(DEFAULT_IP_CMD)
    }
}

impl IpLinkDriver {
    /// Create a driver invoking the `ip` binary at `ip_cmd`
    pub fn new(ip_cmd: impl Into<String>) -> Self {
        Self { ip_cmd: ip_cmd.into() }
    }

    /// Path of the `ip` binary
    pub fn ip_cmd(&self) -> &str {
        &self.ip_cmd
    }

    /// Looks up `name`, returning `None` when no such interface exists.
    pub async fn show(&self, name: &str) -> Result<Option<LinkDetails>, DriverError> {
        let args = show_args(name);
        let result = self.exec(&args).await?;

        if !result.success() {
            if is_missing_device(&result) {
                return Ok(None);
            }
            return Err(self.command_failed(&args, &result));
        }

        Ok(LinkDetails::parse_list(&result.stdout)?
            .into_iter()
            .find(|l| l.ifname == name))
    }

    async fn exec(&self, args: &[String]) -> Result<ExecResult, DriverError> {
        let command = self.render(args);
        debug!(command = %command, "Executing ip command");

        let output = Command::new(&self.ip_cmd)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| DriverError::Spawn {
                command: command.clone(),
                source: e,
            })?;

        let result = ExecResult {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        };

        if result.success() {
            trace!(command = %command, "Command succeeded");
        } else {
            warn!(
                command = %command,
                exit_code = result.exit_code,
                stderr = %result.stderr,
                "Command failed"
            );
        }

        Ok(result)
    }

    async fn exec_checked(&self, args: &[String]) -> Result<(), DriverError> {
        let result = self.exec(args).await?;
        if result.success() {
            Ok(())
        } else {
            Err(self.command_failed(args, &result))
        }
    }

    fn command_failed(&self, args: &[String], result: &ExecResult) -> DriverError {
        DriverError::CommandFailed {
            command: self.render(args),
            exit_code: result.exit_code,
            output: result.combined_output(),
        }
    }

    fn render(&self, args: &[String]) -> String {
        format!("{} {}", self.ip_cmd, args.join(" "))
    }
}

#[async_trait::async_trait]
impl InterfaceDriver for IpLinkDriver {
    async fn create_or_update(&self, link: &VlanLink) -> Result<(), DriverError> {
        validate_link(link)?;

        let current = self.show(&link.name).await?;
        let actions = plan_link(current.as_ref(), link)?;
        if actions.is_empty() {
            debug!("VLAN interface {} already up to date", link.name);
            return Ok(());
        }

        for action in &actions {
            let args = match action {
                LinkAction::Create => add_args(link),
                LinkAction::SetMtu(mtu) => set_mtu_args(&link.name, *mtu),
                LinkAction::SetUp => set_up_args(&link.name),
            };
            self.exec_checked(&args).await?;
        }

        info!("Applied {:?} to VLAN interface {}", actions, link.name);
        Ok(())
    }

    async fn delete(&self, link: &VlanLink) -> Result<(), DriverError> {
        validate_name(&link.name)?;

        let Some(current) = self.show(&link.name).await? else {
            debug!("Interface {} already absent", link.name);
            return Ok(());
        };
        check_owned(&current, link)?;

        self.exec_checked(&delete_args(&link.name)).await?;
        info!("Deleted interface {}", link.name);
        Ok(())
    }
}

fn is_missing_device(result: &ExecResult) -> bool {
    result.combined_output().contains("does not exist")
}

/// Checks `name` is usable as a kernel interface name.
pub fn validate_name(name: &str) -> Result<(), DriverError> {
    if name.is_empty() {
        return Err(DriverError::InvalidRequest("interface name is empty".to_string()));
    }
    if name.len() > MAX_IFNAME_LEN {
        return Err(DriverError::InvalidRequest(format!(
            "interface name {name} exceeds {MAX_IFNAME_LEN} characters"
        )));
    }
    if name.chars().any(|c| c.is_whitespace() || c == '/') {
        return Err(DriverError::InvalidRequest(format!(
            "interface name {name:?} contains whitespace or '/'"
        )));
    }
    Ok(())
}

pub(crate) fn validate_link(link: &VlanLink) -> Result<(), DriverError> {
    validate_name(&link.name)?;
    if link.master.is_empty() {
        return Err(DriverError::InvalidRequest("master interface is empty".to_string()));
    }
    if !(1..=4094).contains(&link.vlan_id) {
        return Err(DriverError::InvalidRequest(format!(
            "VLAN ID {} outside 1-4094",
            link.vlan_id
        )));
    }
    Ok(())
}

fn show_args(name: &str) -> Vec<String> {
    ["-details", "-json", "link", "show", "dev", name]
        .map(str::to_string)
        .to_vec()
}

fn add_args(link: &VlanLink) -> Vec<String> {
    let mut args: Vec<String> = ["link", "add", "link", link.master.as_str(), "name", link.name.as_str()]
        .map(str::to_string)
        .to_vec();
    if let Some(mtu) = link.mtu {
        args.push("mtu".to_string());
        args.push(mtu.to_string());
    }
    args.extend(["type", "vlan", "id"].map(str::to_string));
    args.push(link.vlan_id.to_string());
    args
}

fn set_mtu_args(name: &str, mtu: u32) -> Vec<String> {
    vec![
        "link".to_string(),
        "set".to_string(),
        "dev".to_string(),
        name.to_string(),
        "mtu".to_string(),
        mtu.to_string(),
    ]
}

fn set_up_args(name: &str) -> Vec<String> {
    ["link", "set", "dev", name, "up"].map(str::to_string).to_vec()
}

fn delete_args(name: &str) -> Vec<String> {
    ["link", "delete", "dev", name].map(str::to_string).to_vec()
}
