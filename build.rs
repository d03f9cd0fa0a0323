// build.rs

//! Generates the `t!` macro from the TOML message catalogs in `locales/`.
//!
//! `en.toml` is always loaded; the selected language is merged over it. The language
//! comes from a `lang_*` feature, else `OPSMATRIX_LANG`, else English.

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::Path;

const LOCALES_DIR: &str = "locales";
const FALLBACK_LANG: &str = "en";

type Catalog = BTreeMap<String, String>;

fn main() -> Result<(), String> {
    println!("cargo:rerun-if-env-changed=OPSMATRIX_LANG");
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed={}/", LOCALES_DIR);

    let lang = selected_language();
    println!("cargo:rustc-env=OPSMATRIX_LANG_EFFECTIVE={}", lang);

    let mut catalog = read_catalog(FALLBACK_LANG)?;
    if lang != FALLBACK_LANG {
        match read_catalog(&lang) {
            Ok(overlay) => catalog.extend(overlay),
            Err(e) => println!(
                "cargo:warning=Catalog for '{}' unusable ({}). Falling back to '{}'.",
                lang, e, FALLBACK_LANG
            ),
        }
    }

    let out_dir = env::var("OUT_DIR").map_err(|e| format!("OUT_DIR: {}", e))?;
    let dest = Path::new(&out_dir).join("translations.rs");
    fs::write(&dest, render_macro(&catalog))
        .map_err(|e| format!("{}: {}", dest.display(), e))
}

/// The first enabled `lang_*` feature wins; a second one only produces a warning.
fn selected_language() -> String {
    let mut features: Vec<String> = env::vars()
        .filter_map(|(key, _)| key.strip_prefix("CARGO_FEATURE_LANG_").map(str::to_lowercase))
        .collect();
    features.sort();

    match features.split_first() {
        Some((first, rest)) => {
            if !rest.is_empty() {
                println!(
                    "cargo:warning=Several language features enabled ({:?}); using '{}'.",
                    features, first
                );
            }
            first.clone()
        }
        None => env::var("OPSMATRIX_LANG").unwrap_or_else(|_| FALLBACK_LANG.to_string()),
    }
}

fn read_catalog(lang: &str) -> Result<Catalog, String> {
    let path = format!("{}/{}.toml", LOCALES_DIR, lang);
    let text = fs::read_to_string(&path).map_err(|e| format!("{}: {}", path, e))?;
    toml::from_str(&text).map_err(|e| format!("{}: {}", path, e))
}

/// One arm per key expanding to a string literal, so the messages can be used as
/// `format!` strings. Unknown keys fail to compile.
fn render_macro(catalog: &Catalog) -> String {
    let arms: String = catalog
        .iter()
        .map(|(key, value)| format!("    ({:?}) => {{ {:?} }};\n", key, value))
        .collect();
    let fallback = concat!(
        "    ($key:expr) => { ",
        "compile_error!(concat!(\"Missing translation key: \", $key)) };\n"
    );
    format!("#[macro_export]\nmacro_rules! t {{\n{}{}}}\n", arms, fallback)
}
