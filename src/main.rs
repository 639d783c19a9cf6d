//! Content generation pipeline for the Legion simulation game.
//!
//! Two offline stages:
//! - `tech`: tech-tree synthesis from a hand-authored description
//! - `db`: header fragment generation from the canonical tech database

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
enum Gen {
    #[command(about = "Generate the tech database from a tech-tree description")]
    Tech {
        #[arg(required = true, help = "directory holding tech.lisp")]
        res: PathBuf,
        #[arg(required = true, help = "directory receiving the canonical tech.lisp")]
        src: PathBuf,
        #[arg(required = true, help = "directory receiving tech.dot")]
        output: PathBuf,
        #[arg(short, long)]
        verbose: bool,
    },
    #[command(about = "Generate the db header fragments from the canonical tech database")]
    Db {
        #[arg(required = true, help = "directory holding io.lisp and stars/")]
        res: PathBuf,
        #[arg(required = true, help = "directory holding tech.lisp and receiving gen/")]
        src: PathBuf,
        #[arg(short, long)]
        verbose: bool,
    },
}

fn main() {
    let errors = match Gen::parse() {
        Gen::Tech {
            res,
            src,
            output,
            verbose,
        } => {
            legion_gen::init(verbose);
            legion_gen::tech::run(&res, &src, &output)
        }
        Gen::Db { res, src, verbose } => {
            legion_gen::init(verbose);
            legion_gen::db::run(&res, &src)
        }
    };

    match errors {
        Ok(0) => {}
        Ok(n) => {
            log::error!("{} error(s); no outputs written", n);
            std::process::exit(1);
        }
        Err(err) => {
            log::error!("{:#}", err);
            std::process::exit(1);
        }
    }
}
