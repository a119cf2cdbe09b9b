//! Document processing command.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc;

use ocrmerge::ocr::{OcrBackend, PdfPageRenderer, PdfTextExtractor, TesseractBackend};
use ocrmerge::{
    Config, Document, DocumentPipeline, PipelineError, PipelineEvent, SourceDocument,
    SourceMetadata,
};

use crate::cli::icons::{dim_arrow, error, success, warn};

#[derive(clap::Args, Debug)]
pub struct ProcessArgs {
    /// Document to process (PDF, image, or plain text)
    pub file: PathBuf,

    /// Minimum characters for a page's text layer to be kept without OCR
    #[arg(long)]
    pub threshold: Option<usize>,

    /// OCR language (Tesseract code, repeatable, in preference order)
    #[arg(short, long)]
    pub lang: Vec<String>,

    /// Maximum concurrent OCR calls
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Per-page OCR timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Document title (overrides embedded metadata)
    #[arg(long)]
    pub title: Option<String>,

    /// Document author (overrides embedded metadata)
    #[arg(long)]
    pub author: Option<String>,

    /// Document description (overrides embedded metadata)
    #[arg(long)]
    pub description: Option<String>,

    /// Where the document came from
    #[arg(long)]
    pub source: Option<String>,

    /// Print the full document as JSON instead of the body text
    #[arg(long)]
    pub json: bool,

    /// Write output to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl ProcessArgs {
    /// Apply command-line overrides on top of the loaded config.
    fn apply_to(&self, mut config: Config) -> anyhow::Result<Config> {
        if let Some(threshold) = self.threshold {
            config.threshold = threshold;
        }
        if !self.lang.is_empty() {
            config.languages = self.lang.clone();
        }
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if let Some(timeout) = self.timeout {
            config.timeout_secs = timeout;
        }
        config.validate()?;
        Ok(config)
    }

    fn metadata(&self) -> SourceMetadata {
        SourceMetadata {
            title: self.title.clone(),
            author: self.author.clone(),
            description: self.description.clone(),
            source: self.source.clone(),
        }
    }
}

/// Process one document and print the result.
pub async fn cmd_process(config: Config, args: ProcessArgs) -> anyhow::Result<()> {
    if !args.file.is_file() {
        anyhow::bail!("File not found: {}", args.file.display());
    }

    let config = args.apply_to(config)?;
    let source = SourceDocument::from_path(&args.file);
    tracing::info!("Processing {} as {}", source.name(), source.mime_type);

    let ocr = Arc::new(TesseractBackend::new());
    if !ocr.is_available() {
        eprintln!(
            "{} {} is not available; pages below the threshold keep their text",
            warn(),
            ocr.availability_hint()
        );
    }

    let (tx, rx) = mpsc::channel(64);
    let progress = tokio::spawn(show_progress(rx));

    let pipeline = DocumentPipeline::new(
        Arc::new(PdfTextExtractor::new()),
        Arc::new(PdfPageRenderer::new().with_dpi(config.dpi)),
        ocr,
        config.pipeline_options(),
    )?
    .with_events(tx);

    let result = pipeline.process(&source, &args.metadata()).await;

    // Closing the channel ends the progress task
    drop(pipeline);
    let _ = progress.await;

    let document = match result {
        Ok(document) => document,
        Err(e) => {
            // Reported once here, not again by main
            eprintln!("{}", failure_line(&e));
            std::process::exit(1);
        }
    };

    print_summary(&document);

    let rendered = if args.json {
        serde_json::to_string_pretty(&document)?
    } else {
        document.body
    };

    match &args.output {
        Some(path) => {
            tokio::fs::write(path, rendered).await?;
            eprintln!("  {} Written to {}", dim_arrow(), path.display());
        }
        None => println!("{}", rendered),
    }

    Ok(())
}

fn failure_line(e: &PipelineError) -> String {
    format!("{} {} ({})", error(), e, style(e.kind()).dim())
}

fn print_summary(document: &Document) {
    eprintln!("{} {}", success(), style(&document.title).bold());
    eprintln!(
        "  {} {} pages, {} words, ~{} tokens",
        dim_arrow(),
        document.page_count,
        document.word_count,
        document.token_estimate
    );
    if !document.ocr_pages.is_empty() {
        let pages: Vec<String> = document.ocr_pages.iter().map(u32::to_string).collect();
        eprintln!("  {} OCR text used for pages {}", dim_arrow(), pages.join(", "));
    }
}

/// Drive a progress bar from pipeline events until the channel closes.
async fn show_progress(mut rx: mpsc::Receiver<PipelineEvent>) {
    let pb = ProgressBar::new_spinner();
    pb.enable_steady_tick(Duration::from_millis(100));

    while let Some(event) = rx.recv().await {
        match event {
            PipelineEvent::ExtractionStarted { document } => {
                pb.set_message(format!("Extracting text from {}...", document));
            }
            PipelineEvent::ExtractionCompleted { pages, .. } => {
                pb.set_message(format!("Extracted {} pages", pages));
            }
            PipelineEvent::FallbackStarted { pages, .. } => {
                pb.println(format!(
                    "  {} No text layer found, running OCR on all {} pages",
                    dim_arrow(),
                    pages
                ));
            }
            PipelineEvent::Classified {
                sufficient,
                insufficient,
            } => {
                if insufficient > 0 {
                    pb.println(format!(
                        "  {} {} pages usable, {} need OCR",
                        dim_arrow(),
                        sufficient,
                        insufficient
                    ));
                }
            }
            PipelineEvent::OcrStarted { total_pages } => {
                pb.set_style(
                    ProgressStyle::default_bar()
                        .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {wide_msg}")
                        .unwrap_or_else(|_| ProgressStyle::default_bar())
                        .progress_chars("█▓░"),
                );
                pb.set_length(total_pages as u64);
                pb.set_position(0);
                pb.set_message("Running OCR...");
            }
            PipelineEvent::PageOcrFinished {
                page_number,
                succeeded,
            } => {
                if !succeeded {
                    pb.println(format!("  {} OCR failed for page {}", warn(), page_number));
                }
                pb.inc(1);
            }
            PipelineEvent::OcrComplete { failed, .. } => {
                if failed > 0 {
                    pb.set_message(format!("OCR done, {} pages failed", failed));
                }
            }
            PipelineEvent::Merged { replaced, failed } => {
                pb.println(format!(
                    "  {} {} pages replaced by OCR, {} failed and kept their text layer",
                    dim_arrow(),
                    replaced,
                    failed
                ));
            }
            PipelineEvent::DocumentAssembled { .. } => {}
        }
    }

    pb.finish_and_clear();
}
