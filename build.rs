use std::process::Command;

fn main() {
    let git_hash = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()
        .map(|output| String::from_utf8_lossy(&output.stdout).trim().to_string())
        .filter(|hash| !hash.is_empty())
        .unwrap_or_else(|| "unknown".to_string());
    println!("cargo:rustc-env=GIT_SHORT_HASH={git_hash}");

    // Determine build profile from OUT_DIR
    let out_dir = std::env::var("OUT_DIR").unwrap_or_default();
    let profile =
        out_dir.split("/target/").nth(1).unwrap_or_default().split('/').next().unwrap_or("unknown");

    println!("cargo:rustc-env=BUILD_PROFILE={profile}");

    // Rebuild when Git changes
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs");
}
