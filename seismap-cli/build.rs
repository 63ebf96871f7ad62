// Build script to inject version information from git tags
//
// Produces SEISMAP_VERSION for `seismap --version`:
// - "0.3.0" on a clean tag v0.3.0
// - "0.3.0" for commits after a tag (suffix dropped)
// - "<pkg version>-<describe>" when no tag is reachable
// Falls back to CARGO_PKG_VERSION when git is unavailable.

use std::process::Command;

fn main() {
    let version = git_version().unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string());

    println!("cargo:rustc-env=SEISMAP_VERSION={}", version);
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/heads");
    println!("cargo:rerun-if-changed=.git/refs/tags");
}

fn git_version() -> Option<String> {
    let output = Command::new("git")
        .args(["describe", "--tags", "--always", "--dirty"])
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }

    let describe = String::from_utf8(output.stdout).ok()?;
    Some(version_from_describe(describe.trim(), env!("CARGO_PKG_VERSION")))
}

fn version_from_describe(describe: &str, base_version: &str) -> String {
    match describe.strip_prefix('v') {
        Some(tagged) => match tagged.split_once('-') {
            Some((version, _)) => version.to_string(),
            None => tagged.to_string(),
        },
        None => format!("{}-{}", base_version, describe),
    }
}
