//! WriteRaw.
//!
//! Simulates a sensor capture of each input image and writes it as a raw
//! stream with an embedded header, next to the source.

use std::env;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use rawbayer::{encode, from_image, load_image, DemosaicResult};

fn main() {
    let files: Vec<String> = env::args().skip(1).collect();

    if files.is_empty() {
        usage();
        return;
    }

    for f in &files {
        let src = Path::new(f);
        if !src.exists() {
            println!("{} does not exist", f);
            continue;
        }

        let mut dst = PathBuf::from(f);
        dst.set_extension("raw");
        if dst.exists() {
            println!("{} already exists", dst.display());
            continue;
        }

        match write_mosaic(src, &dst) {
            Ok(()) => println!("{} -> {}", f, dst.display()),
            Err(e) => println!("Error occurred - {}", e),
        }
    }
}

fn usage() {
    println!("usage: WriteRaw <filename> [filenames ...]");
    println!();
}

fn write_mosaic(src: &Path, dst: &Path) -> DemosaicResult<()> {
    let image = load_image(src)?;
    let grid = from_image(&image)?;
    let mut w = BufWriter::new(File::create(dst)?);
    encode(&grid, &mut w)?;
    w.flush()?;
    Ok(())
}
