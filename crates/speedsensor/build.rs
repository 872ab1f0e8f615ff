// Build script for speedsensor - embeds version at compile time

fn main() {
    // Get version from environment (set by CI) or Cargo.toml
    let version = std::env::var("SPEEDSENSOR_VERSION")
        .unwrap_or_else(|_| env!("CARGO_PKG_VERSION").to_string());

    println!("cargo:rustc-env=SPEEDSENSOR_VERSION={}", version);

    println!("cargo:rerun-if-changed=Cargo.toml");
    println!("cargo:rerun-if-env-changed=SPEEDSENSOR_VERSION");
}
