//! ShowRaw.
//!
//! Demosaics a raw stream (or a simulated one built from an ordinary image)
//! on the background worker and writes the result as a PNG.

use std::env;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use rawbayer::{ComputeWorker, DemosaicMode, LoadRequest, RawSource, WorkerConfig};
use tracing::{error, info};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

fn main() {
    init_logging();

    let args: Vec<String> = env::args().skip(1).collect();
    if args.len() < 2 {
        usage();
        return;
    }

    let mode = match args[0].parse::<DemosaicMode>() {
        Ok(mode) => mode,
        Err(e) => {
            error!("{}", e);
            usage();
            return;
        }
    };

    let mut output_shift = 4;
    let mut left_shift = 0;
    let mut size = None;
    let mut files = Vec::new();

    let mut iter = args[1..].iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--shift" => output_shift = parse_num(iter.next(), "--shift"),
            "--left" => left_shift = parse_num(iter.next(), "--left"),
            "--size" => {
                let w = parse_num(iter.next(), "--size");
                let h = parse_num(iter.next(), "--size");
                size = Some((w as i64, h as i64));
            }
            _ => files.push(arg.clone()),
        }
    }

    let worker = match ComputeWorker::new(WorkerConfig {
        mode,
        output_shift,
        left_shift,
        ..WorkerConfig::default()
    }) {
        Ok(worker) => worker,
        Err(e) => {
            error!("could not start worker - {}", e);
            return;
        }
    };

    for f in &files {
        let src = Path::new(f);
        if !src.exists() {
            error!("{} does not exist", f);
            continue;
        }

        worker.request_load(load_request(src, size));
        while !worker.is_ready() {
            thread::sleep(Duration::from_millis(5));
        }

        if let Some(e) = worker.last_error() {
            error!("{}: {}", f, e);
            continue;
        }

        info!(
            file = %f,
            mode = %worker.mode(),
            width = worker.width(),
            height = worker.height(),
            elapsed_ms = worker.elapsed_time().as_secs_f64() * 1000.0,
            "demosaiced"
        );

        let mut dst = PathBuf::from(f);
        dst.set_extension("demosaic.png");
        if dst.exists() {
            error!("{} already exists", dst.display());
            continue;
        }

        let image = worker.image();
        let rgb = match image::RgbImage::from_raw(
            image.width() as u32,
            image.height() as u32,
            image.to_rgb8(),
        ) {
            Some(rgb) => rgb,
            None => {
                error!("{}: image buffer size mismatch", f);
                continue;
            }
        };
        match rgb.save(&dst) {
            Ok(()) => info!("wrote {}", dst.display()),
            Err(e) => error!("{}: {}", dst.display(), e),
        }
    }
}

fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(false))
        .init();
}

fn usage() {
    println!("usage: ShowRaw <mode> [options] <filename> [filenames ...]");
    println!();
    println!("  mode          gray, nearest, bilinear");
    println!();
    println!("  --shift N     Output right shift (default 4).");
    println!("  --left N      Left shift applied to every sample (default 0).");
    println!("  --size W H    Treat inputs as headerless sample streams.");
    println!();
    println!("  Files ending in .png or .jpg are mosaiced before demosaicing.");
    println!();
}

fn parse_num(s: Option<&String>, flag: &str) -> i32 {
    match s.and_then(|s| s.parse().ok()) {
        Some(n) => n,
        None => panic!("{} expects a number", flag),
    }
}

fn load_request(path: &Path, size: Option<(i64, i64)>) -> LoadRequest {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match (ext.as_deref(), size) {
        (Some("png"), _) | (Some("jpg"), _) | (Some("jpeg"), _) => {
            LoadRequest::File(path.to_path_buf(), RawSource::FromImage)
        }
        (_, Some((width, height))) => {
            LoadRequest::File(path.to_path_buf(), RawSource::External { width, height })
        }
        (_, None) => LoadRequest::File(path.to_path_buf(), RawSource::Embedded),
    }
}
