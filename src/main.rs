use crate::options::{Args, Command};
use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use std::path::Path;
use uplift::analyze::{Config, Inputs};
use uplift::marketing::Bundle;

mod options {
    use std::path::PathBuf;

    #[derive(Debug, clap::Parser)]
    #[clap(name = "uplift", about = "Compare delivery platform performance before and after a change")]
    pub struct Args {
        /// Log what's happening in detail.
        #[clap(long, short = 'v', global = true)]
        pub verbose: bool,
        #[clap(subcommand)]
        pub command: Command,
    }

    #[derive(Debug, clap::Subcommand)]
    pub enum Command {
        /// Aggregate DoorDash and UberEats exports into pre vs post and year-over-year tables.
        Analyze {
            /// The window before the change, like 11/01/2024-11/30/2024.
            #[clap(long)]
            pre: Option<String>,
            /// The window after the change, like 12/01/2024-12/31/2024.
            #[clap(long)]
            post: Option<String>,
            /// The DoorDash financial export.
            #[clap(long)]
            dd: Option<PathBuf>,
            /// The UberEats payment export.
            #[clap(long)]
            ue: Option<PathBuf>,
            /// A directory or zip archive with one marketing_<store> folder per store.
            #[clap(long, short = 'm')]
            marketing: Option<PathBuf>,
            /// A MM/DD/YYYY day to leave out of every window. May be given multiple times.
            #[clap(long, short = 'x')]
            exclude: Vec<String>,
            /// Report only on this store. May be given multiple times.
            #[clap(long, short = 's')]
            store: Vec<String>,
            /// Also produce DoorDash time-of-day tables.
            #[clap(long)]
            slots: bool,
            /// A RON file with settings. Flags override its values.
            #[clap(long, short = 'c')]
            config: Option<PathBuf>,
            /// Write one CSV file per table into this directory instead of all tables to stdout.
            #[clap(long, short = 'o')]
            out: Option<PathBuf>,
        },
        /// Print the canonical form of store ids.
        Normalize {
            /// The store ids as found in exports.
            id: Vec<String>,
        },
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    env_logger::Builder::from_env(Env::default().default_filter_or(if args.verbose { "debug" } else { "info" }))
        .init();
    match args.command {
        Command::Analyze {
            pre,
            post,
            dd,
            ue,
            marketing,
            exclude,
            store,
            slots,
            config,
            out,
        } => {
            let mut config = match config {
                Some(path) => {
                    let data = std::fs::read_to_string(&path)
                        .with_context(|| format!("Could not read configuration at '{}'", path.display()))?;
                    Config::from_ron(&data)
                        .with_context(|| format!("Could not parse configuration at '{}'", path.display()))?
                }
                None => Config::default(),
            };
            if let Some(pre) = pre {
                config.pre = pre;
            }
            if let Some(post) = post {
                config.post = post;
            }
            config.excluded_dates.extend(exclude);
            config.stores.extend(store);
            config.slots |= slots;

            let inputs = Inputs {
                doordash: dd.as_deref().map(open).transpose()?,
                ubereats: ue.as_deref().map(open).transpose()?,
                marketing: marketing.as_deref().map(bundle).transpose()?,
            };
            let report = uplift::analyze(inputs, &config)?;
            for warning in &report.warnings {
                log::warn!("{warning}");
            }
            match out {
                Some(dir) => {
                    std::fs::create_dir_all(&dir)
                        .with_context(|| format!("Could not create output directory at '{}'", dir.display()))?;
                    for table in &report.tables {
                        let path = dir.join(uplift::export::file_name(table));
                        let file = std::fs::File::create(&path)
                            .with_context(|| format!("Could not create '{}'", path.display()))?;
                        uplift::export::write_table(table, std::io::BufWriter::new(file))
                            .with_context(|| format!("Could not write '{}'", path.display()))?;
                    }
                    log::info!("wrote {} table(s) to '{}'", report.tables.len(), dir.display());
                }
                None => uplift::export::write_tables(&report.tables, std::io::BufWriter::new(std::io::stdout()))?,
            }
        }
        Command::Normalize { id } => {
            for id in id {
                println!("{}", uplift::normalize_store_id(&id));
            }
        }
    }
    Ok(())
}

fn open(path: &Path) -> anyhow::Result<std::io::BufReader<std::fs::File>> {
    Ok(std::io::BufReader::new(std::fs::File::open(path).with_context(|| {
        format!("Could not open export at '{}'", path.display())
    })?))
}

fn bundle(path: &Path) -> anyhow::Result<Bundle> {
    if path.is_dir() {
        return Bundle::from_directory(path)
            .with_context(|| format!("Could not read marketing directory at '{}'", path.display()));
    }
    let file = std::fs::File::open(path)
        .with_context(|| format!("Could not open marketing archive at '{}'", path.display()))?;
    Bundle::from_archive(std::io::BufReader::new(file))
        .with_context(|| format!("Could not read marketing archive at '{}'", path.display()))
}
