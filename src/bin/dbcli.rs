use anyhow::{Result, anyhow};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use argon::api::Database;
use argon::config;
use argon::debugger::{DebugLevel, set_debug_level};
use argon::storage::Record;

fn main() -> Result<()> {
    let mut block_size = config::BLOCK_SIZE;
    for arg in std::env::args().skip(1) {
        if let Some(level) = arg.strip_prefix("--debug=") {
            let level: u8 = level.parse().map_err(|_| anyhow!("bad debug level"))?;
            set_debug_level(DebugLevel::from_u8(level));
        } else if let Some(size) = arg.strip_prefix("--block=") {
            block_size = size.parse().map_err(|_| anyhow!("bad block size"))?;
        } else {
            return Err(anyhow!("unknown argument {arg}"));
        }
    }

    let mut db = Database::open(block_size);
    let mut rl = DefaultEditor::new()?;
    println!("argon ({} B blocks). Type `help` for commands.", block_size);

    loop {
        match rl.readline("argon> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                rl.add_history_entry(line)?;
                if line == "exit" || line == "quit" {
                    break;
                }
                if let Err(e) = dispatch(&mut db, line) {
                    eprintln!("error: {e:#}");
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

fn dispatch(db: &mut Database, line: &str) -> Result<()> {
    let mut parts = line.split_whitespace();
    let cmd = parts.next().unwrap_or_default();
    let args: Vec<&str> = parts.collect();

    match cmd {
        "help" => print_help(),
        "load" => {
            let path = args.first().copied().unwrap_or(config::DATA_FILE_PATH);
            let n = db.load_tsv(path)?;
            println!("loaded {n} records from {path}");
            println!("{}", db.storage_report());
        }
        "blocks" => println!("{}", db.storage_report()),
        "tree" => println!("{}", db.tree_report()),
        "insert" => {
            let &[title, rating, votes] = args.as_slice() else {
                return Err(anyhow!("usage: insert <tconst> <rating> <votes>"));
            };
            db.insert(Record::new(title, rating.parse()?, votes.parse()?))?;
            println!("ok");
        }
        "search" => {
            let &[votes] = args.as_slice() else {
                return Err(anyhow!("usage: search <votes>"));
            };
            print_query(db, votes.parse()?, votes.parse()?)?;
        }
        "range" => {
            let &[low, high] = args.as_slice() else {
                return Err(anyhow!("usage: range <low> <high>"));
            };
            print_query(db, low.parse()?, high.parse()?)?;
        }
        "delete" => {
            let &[low, high] = args.as_slice() else {
                return Err(anyhow!("usage: delete <low> <high>"));
            };
            let report = db.delete_range(low.parse()?, high.parse()?)?;
            println!(
                "deleted {} records (index {:?}, scan baseline {:?})",
                report.removed, report.index_time, report.scan_time
            );
            println!("{}", db.tree_report());
        }
        other => return Err(anyhow!("unknown command `{other}`, try `help`")),
    }
    Ok(())
}

fn print_query(db: &Database, low: u64, high: u64) -> Result<()> {
    let report = db.query_range(low, high)?;
    for r in report.records.iter().take(20) {
        println!("{}\t{:.1}\t{}", r.title_id, r.rating, r.votes);
    }
    if report.records.len() > 20 {
        println!("... {} more", report.records.len() - 20);
    }
    println!("matches:              {}", report.records.len());
    println!("average rating:       {:.3}", report.avg_rating);
    println!("index nodes accessed: {}", report.index_nodes_accessed);
    println!("index blocks read:    {}", report.index_blocks_accessed);
    println!("index time:           {:?}", report.index_time);
    println!("scan blocks read:     {}", report.scan_blocks_accessed);
    println!("scan time:            {:?}", report.scan_time);
    Ok(())
}

fn print_help() {
    println!("commands:");
    println!("  load [path]                  load a TSV dataset");
    println!("  insert <tconst> <r> <votes>  add one record");
    println!("  search <votes>               exact-match query, both ways");
    println!("  range <low> <high>           range query, both ways");
    println!("  delete <low> <high>          remove records by vote count");
    println!("  tree                         index statistics");
    println!("  blocks                       storage statistics");
    println!("  exit");
}
