use std::env;
use std::path::Path;

use welllog_reader::lis::{FileIndex, IndexEntry, ReadOptions};
use welllog_reader::rp66v1::{IndexOptions, LogicalIndex};
use welllog_reader::{Dialect, NoProgress, Result};

fn summarise_rp66v1(path: &Path) -> Result<()> {
    let index = LogicalIndex::open(path, IndexOptions { skip_malformed: true }, &mut NoProgress)?;
    let records = index.logical_record_index();
    println!("  Storage Unit Label: {}", records.sul());
    println!("  Logical records: {}", records.len());
    println!("  Logical files: {}", index.len());
    for (i, lf) in index.logical_files().iter().enumerate() {
        println!("\nLogical file {}: {} EFLRs", i, lf.eflrs().len());
        for (ident, x_axis) in lf.iflr_position_map() {
            print!("  Frame {}: {} IFLRs", ident, x_axis.len());
            if let Some(summary) = x_axis.summary() {
                print!(" X {} to {}", summary.min, summary.max);
            }
            println!();
        }
    }
    index.close()
}

fn summarise_lis(path: &Path) -> Result<()> {
    let index = FileIndex::open(
        path,
        ReadOptions {
            keep_going: true,
            ..ReadOptions::default()
        },
    )?;
    println!("  Logical records: {}", index.len());
    println!("  Data records: {}", index.num_data_records());
    println!();
    for entry in index.entries() {
        println!("  {}", entry);
        if let IndexEntry::LogPass(_, pass) = entry {
            let mnems: Vec<String> = pass
                .mnems()
                .iter()
                .map(|m| String::from_utf8_lossy(m).into_owned())
                .collect();
            println!("    Channels: {}", mnems.join(", "));
            if let (Some(first), Ok(Some(last))) = (pass.x_axis_first_val(), pass.x_axis_last_val()) {
                println!("    X: {} to {}", first, last);
            }
        }
    }
    Ok(())
}

fn main() {
    env_logger::init();
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <path-to-dlis-or-lis-file>", args[0]);
        std::process::exit(1);
    }

    let path = Path::new(&args[1]);
    let result = match Dialect::of_path(path) {
        Ok(Some(dialect)) => {
            println!("Reading {} file: {}", dialect, path.display());
            println!("{}", "=".repeat(60));
            match dialect {
                Dialect::Rp66v1 => summarise_rp66v1(path),
                Dialect::Lis => summarise_lis(path),
            }
        }
        Ok(None) => {
            eprintln!("ERROR: {} is neither RP66V1 nor LIS", path.display());
            std::process::exit(1);
        }
        Err(e) => Err(e),
    };
    if let Err(e) = result {
        eprintln!("\nERROR: Failed to read {}", path.display());
        eprintln!("  {}", e);
        std::process::exit(1);
    }
}
