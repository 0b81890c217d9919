// build.rs

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::Path;

fn main() {
    // --- 1. Pick the message catalog language ---
    // Cargo `lang_*` features win over the DUET_LANG variable; English is the fallback.
    let mut requested: Vec<String> = env::vars()
        .filter_map(|(key, _)| {
            key.strip_prefix("CARGO_FEATURE_LANG_")
                .map(|lang| lang.to_lowercase())
        })
        .collect();
    requested.sort();

    let lang = match requested.first() {
        Some(first) => {
            if requested.len() > 1 {
                println!(
                    "cargo:warning=Multiple language features enabled ({:?}). Using '{}'.",
                    requested, first
                );
            }
            first.clone()
        }
        None => env::var("DUET_LANG").unwrap_or_else(|_| "en".to_string()),
    };

    println!("cargo:rustc-env=DUET_LANG_EFFECTIVE={}", lang);
    println!("cargo:rerun-if-env-changed=DUET_LANG");
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=locales/");

    // --- 2. Load the English catalog, then overlay the selected language ---
    let fallback = fs::read_to_string("locales/en.toml")
        .expect("Failed to read fallback message catalog: locales/en.toml");
    let mut messages: BTreeMap<String, String> =
        toml::from_str(&fallback).expect("Failed to parse locales/en.toml");

    if lang != "en" {
        let path = format!("locales/{}.toml", lang);
        match fs::read_to_string(&path) {
            Ok(content) => {
                let overlay: BTreeMap<String, String> = toml::from_str(&content)
                    .unwrap_or_else(|_| panic!("Failed to parse {}", path));
                messages.extend(overlay);
            }
            Err(_) => println!(
                "cargo:warning=Message catalog '{}' not found. Falling back to 'en'.",
                path
            ),
        }
    }

    // --- 3. Generate the `t!` macro ---
    let mut code = String::from("#[macro_export]\nmacro_rules! t {\n");
    for (key, value) in &messages {
        let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
        code.push_str(&format!("    (\"{}\") => {{ \"{}\" }};\n", key, escaped));
    }
    // Unknown keys fail the build instead of printing a raw key at runtime.
    code.push_str(
        "    ($key:expr) => {{ compile_error!(concat!(\"Missing message key: \", $key)) }};\n",
    );
    code.push('}');

    let out_dir = env::var("OUT_DIR").expect("OUT_DIR is set by cargo");
    fs::write(Path::new(&out_dir).join("messages.rs"), code)
        .expect("Failed to write generated message macro");
}
