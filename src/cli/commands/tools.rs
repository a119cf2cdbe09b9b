//! External tool check.

use console::style;

use ocrmerge::ocr::check_tools;

use crate::cli::icons::{error, success, warn};

/// Report which of the external tools are on PATH.
pub fn cmd_tools() -> anyhow::Result<()> {
    println!("{}", style("External tools").bold());

    let tools = check_tools();
    for (tool, available) in &tools {
        if *available {
            println!("  {} {}", success(), tool);
        } else {
            println!("  {} {} {}", error(), tool, style("(not found)").dim());
        }
    }

    let missing = tools.iter().filter(|(_, available)| !available).count();
    if missing > 0 {
        println!();
        println!(
            "{} Install poppler-utils and tesseract-ocr to process PDFs",
            warn()
        );
    }

    Ok(())
}
