// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command execution: all file reading and writing happens here, around the
// in-memory engine calls.

use std::fs;
use std::path::Path;
use std::time::Duration;

use bindery_core::{CancelToken, EngineConfig, MergeSource, Result, SplitSpec};
use bindery_document::Bindery;
use tracing::{info, warn};

use crate::cli::{Command, CompressArgs, ImagesArgs, MergeArgs, SplitArgs};

/// Load the engine configuration, or the defaults when no file is given.
pub fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(path) => EngineConfig::from_json(&fs::read_to_string(path)?),
        None => Ok(EngineConfig::default()),
    }
}

/// Token for `--timeout`; without one the operation runs to completion.
pub fn cancel_token(timeout_secs: Option<u64>) -> CancelToken {
    match timeout_secs {
        Some(secs) => CancelToken::with_deadline(Duration::from_secs(secs)),
        None => CancelToken::none(),
    }
}

pub fn run(engine: &Bindery, command: &Command, cancel: &CancelToken) -> Result<()> {
    match command {
        Command::Merge(args) => merge(engine, args, cancel),
        Command::Split(args) => split(engine, args, cancel),
        Command::Compress(args) => compress(engine, args, cancel),
        Command::Images(args) => images(engine, args, cancel),
    }
}

fn merge(engine: &Bindery, args: &MergeArgs, cancel: &CancelToken) -> Result<()> {
    let sources = args
        .inputs
        .iter()
        .map(|path| {
            let name = path.file_stem().map(|stem| stem.to_string_lossy().into_owned());
            Ok(MergeSource {
                name,
                bytes: fs::read(path)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let merged = engine.merge_with_cancel(&sources, &args.spec(), cancel)?;
    fs::write(&args.output, &merged)?;
    info!(output = %args.output.display(), bytes = merged.len(), "Wrote merged document");
    Ok(())
}

fn split(engine: &Bindery, args: &SplitArgs, cancel: &CancelToken) -> Result<()> {
    let data = fs::read(&args.input)?;
    let base_name = args.base_name.clone().unwrap_or_else(|| {
        args.input
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".into())
    });
    let spec = SplitSpec {
        strategy: args.strategy()?,
        base_name,
        preserve_metadata: !args.no_metadata,
        preserve_bookmarks: !args.no_bookmarks,
    };

    let outputs = engine.split_with_cancel(&data, &spec, cancel)?;
    fs::create_dir_all(&args.output)?;
    for output in &outputs {
        let path = args.output.join(&output.name);
        fs::write(&path, &output.bytes)?;
        info!(
            output = %path.display(),
            pages = output.page_count,
            start = output.range.start,
            end = output.range.end,
            "Wrote split part"
        );
    }
    println!("{}", serde_json::to_string_pretty(&outputs)?);
    Ok(())
}

fn compress(engine: &Bindery, args: &CompressArgs, cancel: &CancelToken) -> Result<()> {
    let data = fs::read(&args.input)?;
    let (compressed, report) = engine.compress_with_cancel(&data, &args.spec(), cancel)?;

    if report.is_worthwhile() || args.force {
        fs::write(&args.output, &compressed)?;
        info!(output = %args.output.display(), bytes = compressed.len(), "Wrote compressed document");
    } else {
        warn!(
            saved_percent = report.compression_ratio,
            "Compression saved too little; output not written (use --force to keep it)"
        );
    }
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn images(engine: &Bindery, args: &ImagesArgs, cancel: &CancelToken) -> Result<()> {
    let images = args
        .inputs
        .iter()
        .map(fs::read)
        .collect::<std::io::Result<Vec<_>>>()?;
    let document = engine.images_to_document_with_cancel(&images, &args.spec(), cancel)?;
    fs::write(&args.output, &document)?;
    info!(
        output = %args.output.display(),
        images = images.len(),
        bytes = document.len(),
        "Wrote image document"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;
    use lopdf::{Document, Object, Stream, dictionary};

    fn write_pdf(path: &Path, pages: u32) {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let kids: Vec<Object> = (1..=pages)
            .map(|n| {
                let content = format!("BT /F1 12 Tf 72 700 Td (Page {n}) Tj ET").into_bytes();
                let content_id = doc.add_object(Stream::new(dictionary! {}, content));
                doc.add_object(dictionary! {
                    "Type" => "Page",
                    "Parent" => pages_id,
                    "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
                    "Contents" => content_id,
                })
                .into()
            })
            .collect();
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! { "Type" => "Pages", "Kids" => kids, "Count" => pages as i64 }),
        );
        let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
        doc.trailer.set("Root", catalog_id);
        doc.save(path).unwrap();
    }

    fn run_args(args: &[&str]) -> Result<()> {
        let cli = Cli::try_parse_from(args).unwrap();
        run(&Bindery::default(), &cli.command, &cancel_token(cli.timeout))
    }

    #[test]
    fn merge_writes_output_file() {
        let dir = tempfile::tempdir().unwrap();
        let (a, b, out) = (dir.path().join("a.pdf"), dir.path().join("b.pdf"), dir.path().join("out.pdf"));
        write_pdf(&a, 1);
        write_pdf(&b, 2);

        run_args(&[
            "bindery",
            "merge",
            a.to_str().unwrap(),
            b.to_str().unwrap(),
            "-o",
            out.to_str().unwrap(),
        ])
        .unwrap();
        let merged = Document::load(&out).unwrap();
        assert_eq!(merged.get_pages().len(), 3);
    }

    #[test]
    fn split_names_outputs_after_input() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("report.pdf");
        write_pdf(&input, 3);
        let out_dir = dir.path().join("parts");

        run_args(&[
            "bindery",
            "split",
            input.to_str().unwrap(),
            "-o",
            out_dir.to_str().unwrap(),
            "--pages-per-file",
            "2",
        ])
        .unwrap();
        assert!(out_dir.join("report_pages-1-2.pdf").exists());
        assert!(out_dir.join("report_page-3.pdf").exists());
    }

    #[test]
    fn missing_input_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.pdf");
        let err = run_args(&[
            "bindery",
            "compress",
            missing.to_str().unwrap(),
            "-o",
            dir.path().join("out.pdf").to_str().unwrap(),
        ])
        .unwrap_err();
        assert!(matches!(err, bindery_core::BinderyError::Io(_)));
    }

    #[test]
    fn expired_timeout_stops_the_command() {
        let dir = tempfile::tempdir().unwrap();
        let (a, b) = (dir.path().join("a.pdf"), dir.path().join("b.pdf"));
        write_pdf(&a, 1);
        write_pdf(&b, 1);
        let cli = Cli::try_parse_from([
            "bindery",
            "merge",
            a.to_str().unwrap(),
            b.to_str().unwrap(),
            "-o",
            dir.path().join("out.pdf").to_str().unwrap(),
        ])
        .unwrap();

        let err = run(&Bindery::default(), &cli.command, &cancel_token(Some(0))).unwrap_err();
        assert!(matches!(err, bindery_core::BinderyError::DeadlineExceeded));
    }

    #[test]
    fn config_file_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bindery.json");
        fs::write(&path, r#"{"producer":"Test Press","parallel":false}"#).unwrap();
        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.producer, "Test Press");
        assert!(!config.parallel);
        assert_eq!(load_config(None).unwrap(), EngineConfig::default());
    }
}
