//! The `tools` command: report external tool and backend availability.

use console::style;

use plagiscan::config::Settings;
use plagiscan::ocr::{check_binary, OcrBackend, TesseractBackend};

pub fn cmd_tools(settings: &Settings) -> anyhow::Result<()> {
    println!("\n{}", style("Tool Status").bold());
    println!("{}", "-".repeat(50));

    println!("\n{}", style("Rendering:").cyan());
    let mut all_found = true;
    for tool in ["pdfinfo", "pdftoppm"] {
        let status = if check_binary(tool) {
            style("✓ found").green()
        } else {
            all_found = false;
            style("✗ not found").red()
        };
        println!("  {:<15} {}", tool, status);
    }

    println!("\n{}", style("OCR Backends:").cyan());

    let tesseract = TesseractBackend::with_config(settings.ocr_config());
    if tesseract.is_available() {
        println!("  {:<15} {}", "Tesseract", style("✓ available").green());
    } else {
        all_found = false;
        println!("  {:<15} {}", "Tesseract", style("✗ not available").red());
        println!(
            "                  {}",
            style(tesseract.availability_hint()).dim()
        );
    }

    #[cfg(feature = "ocr-ocrs")]
    {
        println!("  {:<15} {}", "OCRS", style("✓ compiled").green());
        println!(
            "                  {}",
            style(plagiscan::ocr::ocrs_models_hint(settings.model_path.as_deref())).dim()
        );
    }
    #[cfg(not(feature = "ocr-ocrs"))]
    {
        println!(
            "  {:<15} {}",
            "OCRS",
            style("not compiled (enable ocr-ocrs feature)").dim()
        );
    }

    println!();
    if all_found {
        println!("{} All tools for the default pipeline are installed", style("✓").green());
    } else {
        println!(
            "{} Some tools are missing; PDF documents or tesseract OCR will fail",
            style("!").yellow()
        );
    }

    Ok(())
}
