//! Example: Locate a dependency specifier and rewrite it in place
//!
//! Run with: cargo run --package upd-deps --example parse_and_update

use upd_deps::{rewrite_specifier, Bindings, Document, Query, SPECIFIER_QUERY};

const MANIFEST: &str = r#"{
    "name": "demo",
    "dependencies": {
        "react": "^17.0.2",   // UI
        "lodash": "~4.17.0"
    }
}
"#;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== upd-deps: Query and Patch ===\n");

    let mut document = Document::parse(MANIFEST)?;
    let query = Query::compile(SPECIFIER_QUERY)?;

    let bindings = Bindings::new()
        .bind("section", "dependencies")
        .bind("module", "react");
    let path = query.execute_one(&document, &bindings)?;

    let old = document
        .node(&path)
        .and_then(|node| node.as_str())
        .unwrap_or_default()
        .to_string();
    let new = rewrite_specifier("react", &old, "17.0.2", "18.2.0")?;
    println!("react at {path}: {old} -> {new}\n");

    document.set_string(&path, &new)?;
    print!("{document}");

    Ok(())
}
