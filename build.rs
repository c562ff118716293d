//! Build script for the Spotify collector.
//!
//! Copies the configuration templates (`info.example.json` and
//! `.env.example`) into the user's local data directory, next to where the
//! application looks for `info.json` and `.env`:
//!
//! - Linux: `~/.local/share/spotcollect/`
//! - macOS: `~/Library/Application Support/spotcollect/`
//! - Windows: `%LOCALAPPDATA%/spotcollect/`
//!
//! A missing template only produces a cargo warning.

use std::{env, fs, path::PathBuf};

const TEMPLATES: [&str; 2] = ["info.example.json", ".env.example"];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    for template in TEMPLATES {
        println!("cargo:rerun-if-changed={template}");
    }

    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?);

    let mut out_dir = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    out_dir.push("spotcollect");
    fs::create_dir_all(&out_dir)?;

    for template in TEMPLATES {
        let source = manifest_dir.join(template);
        if source.is_file() {
            fs::copy(&source, out_dir.join(template))?;
        } else {
            println!("cargo:warning={} not found at {}", template, source.display());
        }
    }

    Ok(())
}
