use std::env;

fn main() {
    // Surface the compiler version to `ayre version`
    println!(
        "cargo:rustc-env=AYRE_RUSTC_VERSION={}",
        env::var("RUSTC_VERSION").unwrap_or_else(|_| "unknown".to_string())
    );
    println!("cargo:rerun-if-env-changed=RUSTC_VERSION");

    if env::var("CARGO_CFG_TARGET_OS").unwrap_or_default() == "windows" {
        println!("cargo:rustc-link-arg=/SUBSYSTEM:CONSOLE");
    }
}
