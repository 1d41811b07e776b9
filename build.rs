//! Captures the rustc version for the `tgt.distro.runtime_version` resource attribute.

use std::process::Command;

fn main() {
    println!("cargo::rerun-if-env-changed=RUSTC");

    let rustc = std::env::var("RUSTC").unwrap_or_else(|_| "rustc".to_string());

    // "rustc 1.88.0 (6b00bc388 2025-06-23)" -> "1.88.0"
    if let Ok(output) = Command::new(&rustc).arg("--version").output()
        && let Ok(version_str) = String::from_utf8(output.stdout)
        && let Some(version) = version_str.trim().strip_prefix("rustc ")
        && let Some(ver) = version.split_whitespace().next()
    {
        println!("cargo::rustc-env=TGT_OTEL_RUSTC_VERSION={ver}");
    }
}
