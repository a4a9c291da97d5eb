//! Example: index a directory of text files and run one query
//!
//! Usage: file_search <directory> <query> [index-dir]
//!
//! Only `.txt` and `.html` files are indexed; other files are listed as
//! ignored. Unreadable files are reported and skipped. With an index
//! directory the index persists between runs.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use ricerca::{Config, DocumentOutcome, FileSource, Index, Schema};

const EXTENSIONS: &[&str] = &["txt", "html"];

fn indexable(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| EXTENSIONS.contains(&ext.to_lowercase().as_str()))
}

fn collect_files(dir: &Path, out: &mut Vec<PathBuf>, ignored: &mut Vec<PathBuf>) -> std::io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_files(&path, out, ignored)?;
        } else if indexable(&path) {
            out.push(path);
        } else {
            ignored.push(path);
        }
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        eprintln!("usage: {} <directory> <query> [index-dir]", args[0]);
        std::process::exit(2);
    }

    let root = Path::new(&args[1]);
    if !root.exists() {
        eprintln!("{} does not exist", root.display());
        std::process::exit(1);
    }

    // 1. Open the index, in memory unless a directory is given
    let config = match args.get(3) {
        Some(dir) => Config::persistent(dir),
        None => Config::in_memory(),
    };
    let index = Index::open(Schema::file_documents()?, config)?;

    // 2. Index every matching file under the directory
    let mut files = Vec::new();
    let mut ignored = Vec::new();
    if root.is_dir() {
        collect_files(root, &mut files, &mut ignored)?;
    } else if indexable(root) {
        files.push(root.to_path_buf());
    } else {
        ignored.push(root.to_path_buf());
    }
    files.sort();
    ignored.sort();
    for path in &ignored {
        println!("  ignored {} (not .txt or .html)", path.display());
    }

    let mut writer = index.writer()?;
    let report = writer.add_sources(files.into_iter().map(FileSource::new))?;
    let info = writer.commit()?;
    drop(writer);

    println!("✓ Indexed {} files (generation {}, {} documents total)",
        report.added_count(), info.generation, info.total_documents);
    for (identity, outcome) in &report.outcomes {
        if let DocumentOutcome::Skipped(err) = outcome {
            println!("  skipped {}: {}", identity, err);
        }
    }

    // 3. Search
    let page = index.searcher().search(&args[2], None)?;
    println!("\n{} hits for {:?} ({} µs)", page.total_hits, args[2], page.took_micros);
    for hit in &page.hits {
        println!("{:>3}. {:.4}  {}", hit.rank, hit.score, hit.path.as_deref().unwrap_or("?"));
    }

    Ok(())
}
