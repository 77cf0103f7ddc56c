// build.rs
use std::process::Command;

fn main() {
    let version = std::env::var("CARGO_PKG_VERSION").unwrap_or_else(|_| "0.0.0".to_string());
    let profile = std::env::var("PROFILE").unwrap_or_else(|_| "unknown".to_string());

    let local_hash = Command::new("git")
        .args(["rev-parse", "HEAD"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .map(|output| {
            let hash = String::from_utf8_lossy(&output.stdout).trim().to_string();
            if hash.len() >= 8 {
                hash[..8].to_string()
            } else {
                hash
            }
        })
        .unwrap_or_else(|| "unknown".to_string());

    let local_dirty = Command::new("git")
        .args(["diff", "--quiet"])
        .status()
        .map(|status| if status.success() { "" } else { "-dirty" })
        .unwrap_or("");

    println!(
        "cargo:rustc-env=CARTGRID_VERSION={} {}{}-{}",
        version, local_hash, local_dirty, profile
    );
    println!("cargo:rerun-if-changed=.git/HEAD");
}
