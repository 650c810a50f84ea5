use std::any::Any;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, info, warn};

#[cfg(feature = "rayon")]
use rayon::prelude::*;

use crate::error::{PrepError, Result};
use crate::parser::{self, markup::Normalizer, ArticleOutcome};
use crate::record::{NormalizedArticle, RawArticle};

pub const DEFAULT_FILE_PREFIX: &str = "wiki_";

/// Counters for one input file. `kept + filtered == total`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FileStats {
    pub kept: usize,
    pub filtered: usize,
    pub total: usize,
    /// Subset of `filtered` that could not be parsed as a record.
    pub malformed: usize,
}

/// Totals folded over every file of a run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunStats {
    pub files_processed: usize,
    pub files_failed: usize,
    pub kept: usize,
    pub filtered: usize,
    pub total: usize,
    pub malformed: usize,
}

impl RunStats {
    pub fn add(&mut self, file: FileStats) {
        self.files_processed += 1;
        self.kept += file.kept;
        self.filtered += file.filtered;
        self.total += file.total;
        self.malformed += file.malformed;
    }

    pub fn kept_pct(&self) -> f64 {
        percent(self.kept, self.total)
    }

    pub fn filtered_pct(&self) -> f64 {
        percent(self.filtered, self.total)
    }

    pub fn print(&self, output_dir: &Path) {
        println!("{}", "=".repeat(70));
        println!("Complete!");
        println!("  Processed {} files ({} failed)", self.files_processed, self.files_failed);
        println!("  Total articles processed: {}", self.total);
        println!("  Articles kept: {} ({:.1}%)", self.kept, self.kept_pct());
        println!(
            "  Articles filtered: {} ({:.1}%, {} malformed)",
            self.filtered,
            self.filtered_pct(),
            self.malformed
        );
        println!("  Output directory: {}", output_dir.display());
        println!("{}", "=".repeat(70));
    }
}

fn percent(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 * 100.0 / total as f64
    }
}

/// Parse one dump line and run it through the pipeline. A panic anywhere in
/// the pipeline is turned into a `RecordFault` for this line only.
pub fn process_line(normalizer: &Normalizer, line_no: usize, line: &str) -> Result<ArticleOutcome> {
    let article: RawArticle = serde_json::from_str(line)
        .map_err(|source| PrepError::MalformedRecord { line: line_no, source })?;

    panic::catch_unwind(AssertUnwindSafe(|| parser::process_article(normalizer, article))).map_err(
        |payload| PrepError::RecordFault {
            line: line_no,
            message: panic_message(payload.as_ref()),
        },
    )
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(feature = "rayon")]
fn run_lines(normalizer: &Normalizer, lines: &[(usize, String)]) -> Vec<Result<ArticleOutcome>> {
    lines
        .par_iter()
        .map(|(line_no, line)| process_line(normalizer, *line_no, line))
        .collect()
}

#[cfg(not(feature = "rayon"))]
fn run_lines(normalizer: &Normalizer, lines: &[(usize, String)]) -> Vec<Result<ArticleOutcome>> {
    lines
        .iter()
        .map(|(line_no, line)| process_line(normalizer, *line_no, line))
        .collect()
}

/// Process numbered lines of one file. Kept articles come back in input order.
pub fn process_lines(
    normalizer: &Normalizer,
    file_label: &str,
    lines: &[(usize, String)],
) -> (Vec<NormalizedArticle>, FileStats) {
    let mut stats = FileStats::default();
    let mut kept = Vec::new();

    for result in run_lines(normalizer, lines) {
        stats.total += 1;
        match result {
            Ok(ArticleOutcome::Kept(article)) => {
                stats.kept += 1;
                kept.push(article);
            }
            Ok(ArticleOutcome::Rejected(reason)) => {
                stats.filtered += 1;
                debug!(file = file_label, %reason, "article filtered");
            }
            Err(e) => {
                stats.filtered += 1;
                if matches!(e, PrepError::MalformedRecord { .. }) {
                    stats.malformed += 1;
                }
                warn!("Error in {}: {}", file_label, e);
            }
        }
    }

    (kept, stats)
}

/// Clean, filter and split one dump file, writing kept articles to `output`.
/// Nothing is written (and no directory created) when no article survives.
pub fn process_file(normalizer: &Normalizer, input: &Path, output: &Path) -> Result<FileStats> {
    let lines = read_lines(input)?;
    let label = input
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| input.display().to_string());

    let (kept, stats) = process_lines(normalizer, &label, &lines);
    if !kept.is_empty() {
        write_records(output, &kept)?;
    }
    Ok(stats)
}

/// Non-blank lines with their 1-based line numbers.
fn read_lines(path: &Path) -> Result<Vec<(usize, String)>> {
    let read_err = |source| PrepError::Read {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(read_err)?;
    let mut lines = Vec::new();
    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(read_err)?;
        if line.trim().is_empty() {
            continue;
        }
        lines.push((idx + 1, line));
    }
    Ok(lines)
}

/// Write records as JSON lines, creating parent directories as needed.
pub fn write_records(path: &Path, records: &[NormalizedArticle]) -> Result<()> {
    let write_err = |source| PrepError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(write_err)?;
    }

    let mut writer = BufWriter::new(File::create(path).map_err(write_err)?);
    for record in records {
        serde_json::to_writer(&mut writer, record).map_err(PrepError::Serialize)?;
        writer.write_all(b"\n").map_err(write_err)?;
    }
    writer.flush().map_err(write_err)
}

/// All regular files under `root` whose name starts with `prefix`, sorted.
pub fn discover_files(root: &Path, prefix: &str) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    walk(root, prefix, &mut files)?;
    files.sort();
    Ok(files)
}

fn walk(dir: &Path, prefix: &str, files: &mut Vec<PathBuf>) -> Result<()> {
    let entries = fs::read_dir(dir).map_err(|source| PrepError::Read {
        path: dir.to_path_buf(),
        source,
    })?;

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!(dir = %dir.display(), error = %err, "skipping unreadable entry");
                continue;
            }
        };
        let path = entry.path();
        // Symlinked directories are not followed.
        let is_dir = entry.file_type().is_ok_and(|ft| ft.is_dir());
        if is_dir {
            if let Err(err) = walk(&path, prefix, files) {
                warn!(dir = %path.display(), error = %err, "skipping unreadable directory");
            }
        } else if path.is_file()
            && path
                .file_name()
                .is_some_and(|name| name.to_string_lossy().starts_with(prefix))
        {
            files.push(path);
        }
    }
    Ok(())
}

/// Process every dump file under `input_root`, mirroring the layout under
/// `output_root`. A failing file is reported and skipped; only a missing input
/// root stops the run.
pub fn process_directory(
    normalizer: &Normalizer,
    input_root: &Path,
    output_root: &Path,
    prefix: &str,
) -> Result<RunStats> {
    if !input_root.exists() {
        return Err(PrepError::InputRootMissing(input_root.to_path_buf()));
    }

    let files = discover_files(input_root, prefix)?;
    let mut run = RunStats::default();
    if files.is_empty() {
        warn!("No wiki files found in {}", input_root.display());
        return Ok(run);
    }

    println!("Found {} files to process", files.len());
    println!("Using {} parser\n", normalizer.strategy().name());
    info!(files = files.len(), parser = normalizer.strategy().name(), "processing dump");

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );

    for file in files {
        let relative = file.strip_prefix(input_root).unwrap_or(&file);
        let output = output_root.join(relative);

        match process_file(normalizer, &file, &output) {
            Ok(stats) => {
                pb.suspend(|| {
                    println!(
                        "Processing {}... ✓ (kept {}/{}, filtered {})",
                        relative.display(),
                        stats.kept,
                        stats.total,
                        stats.filtered
                    )
                });
                run.add(stats);
            }
            Err(e) => {
                pb.suspend(|| println!("Processing {}... ✗ Error: {}", relative.display(), e));
                error!("Failed to process {}: {}", file.display(), e);
                run.files_failed += 1;
            }
        }
        pb.inc(1);
    }

    pb.finish_and_clear();
    info!(
        kept = run.kept,
        filtered = run.filtered,
        total = run.total,
        "dump processed"
    );
    Ok(run)
}

// ── Tests ──
