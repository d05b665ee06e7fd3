use std::process::Command;

fn git(args: &[&str]) -> Option<String> {
    let out = Command::new("git").args(args).output().ok()?;
    out.status
        .success()
        .then(|| String::from_utf8_lossy(&out.stdout).trim().to_string())
}

fn main() {
    // Pick up new commits and checkouts without a clean build.
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/");

    // Tagged builds report the crate version; dev builds report the short
    // hash so a snapshot or queue written by one is traceable to a commit.
    let version = if git(&["describe", "--exact-match", "--tags", "HEAD"]).is_some() {
        env!("CARGO_PKG_VERSION").to_string()
    } else {
        match git(&["rev-parse", "--short", "HEAD"]) {
            Some(hash) if !hash.is_empty() => format!("dev@{hash}"),
            _ => "dev@unknown".to_string(),
        }
    };
    println!("cargo:rustc-env=SYNC_VERSION={version}");
}
