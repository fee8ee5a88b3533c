use clap::{Args, Parser, Subcommand};
use rowcache::{
    load_text, read_header, save_binary, save_text, CacheCapacity, CacheConfig, CacheCost,
    CachedMatrix, MatrixElement, RowStream, RowStreamHeader,
};
use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
    time::Instant,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, long_about = None)]
#[command(about = "rowcache CLI - inspect, convert and scan sparse row-stream files")]
struct Cli {
    /// Log every cache refill
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone, Copy)]
struct Budget {
    /// Cache budget in bytes (0 keeps the whole dataset resident)
    #[arg(long, default_value_t = 0, conflicts_with = "budget_mb")]
    budget_bytes: u64,

    /// Cache budget in megabytes
    #[arg(long)]
    budget_mb: Option<u64>,
}

impl Budget {
    fn config(&self, path: &Path) -> CacheConfig {
        match self.budget_mb {
            Some(mb) => CacheConfig::new(path).with_budget_mb(mb),
            None => CacheConfig::new(path).with_budget_bytes(self.budget_bytes),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Show the header and the cache layout a budget would produce
    Info {
        /// Binary row-stream file
        file: PathBuf,

        #[command(flatten)]
        budget: Budget,
    },
    /// Convert a binary row-stream file to text
    ToText {
        /// Binary row-stream file
        input: PathBuf,

        /// Text output file
        output: PathBuf,

        #[command(flatten)]
        budget: Budget,
    },
    /// Convert a text row file to the binary format
    ToBinary {
        /// Text row file (`id:value` tokens, one row per line)
        input: PathBuf,

        /// Binary output file
        output: PathBuf,

        /// Minimum number of columns
        #[arg(long, default_value_t = 0)]
        ncols: u32,

        /// Store 32-bit values instead of 64-bit
        #[arg(long)]
        f32: bool,
    },
    /// Stream every row through the cache and report statistics
    Scan {
        /// Binary row-stream file
        file: PathBuf,

        #[command(flatten)]
        budget: Budget,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();

    let start_time = Instant::now();

    match &cli.command {
        Commands::Info { file, budget } => handle_info(&budget.config(file))?,
        Commands::ToText {
            input,
            output,
            budget,
        } => {
            let config = budget.config(input);
            match header_of(input)?.value_width {
                4 => to_text::<f32>(&config, output)?,
                _ => to_text::<f64>(&config, output)?,
            }
        }
        Commands::ToBinary {
            input,
            output,
            ncols,
            f32,
        } => {
            if *f32 {
                to_binary::<f32>(input, output, *ncols)?
            } else {
                to_binary::<f64>(input, output, *ncols)?
            }
        }
        Commands::Scan { file, budget } => {
            let config = budget.config(file);
            match header_of(file)?.value_width {
                4 => scan::<f32>(&config)?,
                _ => scan::<f64>(&config)?,
            }
        }
    }

    let elapsed = start_time.elapsed();
    println!("Completed in {elapsed:.2?}");

    Ok(())
}

/// Read just the header, without committing to a value type
fn header_of(path: &Path) -> rowcache::Result<RowStreamHeader> {
    read_header(&mut BufReader::new(File::open(path)?))
}

fn handle_info(config: &CacheConfig) -> rowcache::Result<()> {
    let header = header_of(&config.path)?;

    println!("File: {}", config.path.display());
    println!("   Format id:    {}", header.format_id);
    println!("   Value width:  {} bytes", header.value_width);
    println!("   Dimensions:   {} x {}", header.nrows, header.ncols);
    println!("   Entries:      {}", header.nnz);
    println!("   Avg row:      {:.2} entries", header.avg_entries_per_row());
    println!("   Stream size:  {} bytes", header.stream_size());

    let cost = match header.value_width {
        4 => CacheCost::resident::<f32>(),
        _ => CacheCost::resident::<f64>(),
    };
    let capacity = CacheCapacity::plan(&header, config.cache_budget_bytes, cost)?;
    let budget = if config.is_unbounded() {
        "unbounded".to_string()
    } else {
        format!("{} bytes", config.cache_budget_bytes)
    };
    println!("Cache ({budget}):");
    println!("   Rows:         {}", capacity.rows);
    println!("   Entries:      {}", capacity.entries);
    println!("   Buffers:      {} bytes", capacity.bytes(cost));
    println!(
        "   Per refill:   up to {} bytes read from disk",
        capacity.bytes(CacheCost::serialized(&header))
    );
    println!("   Whole file:   {}", capacity.holds_all(&header));
    Ok(())
}

fn to_text<T: MatrixElement>(config: &CacheConfig, output: &Path) -> rowcache::Result<()> {
    let mut matrix = CachedMatrix::<T>::from_config(config)?;
    save_text(&mut matrix, output)?;
    println!(
        "Wrote {} rows to {} ({} refills)",
        matrix.nrows(),
        output.display(),
        matrix.refill_count()
    );
    Ok(())
}

fn to_binary<T: MatrixElement>(input: &Path, output: &Path, ncols: u32) -> rowcache::Result<()> {
    let mut matrix = load_text::<T, _>(input, ncols)?;
    save_binary(&mut matrix, output)?;
    println!(
        "Wrote {} x {} matrix with {} entries to {}",
        matrix.nrows(),
        matrix.ncols(),
        matrix.nnz(),
        output.display()
    );
    Ok(())
}

fn scan<T: MatrixElement>(config: &CacheConfig) -> rowcache::Result<()> {
    let mut matrix = CachedMatrix::<T>::from_config(config)?;

    let mut rows = 0u64;
    let mut entries = 0u64;
    let mut longest = 0u32;
    let mut sum = 0.0f64;
    matrix.for_each_row(|_, row| {
        rows += 1;
        entries += row.len() as u64;
        longest = longest.max(row.len());
        sum += row.iter().map(|e| e.value.to_f64()).sum::<f64>();
    })?;

    println!("Scanned {rows} rows, {entries} entries");
    println!("   Longest row:  {longest} entries");
    println!("   Value sum:    {sum}");
    println!("   Refills:      {}", matrix.refill_count());
    println!("   Cache:        {} bytes", matrix.resident_bytes());
    println!("   Resident:     {}", matrix.is_fully_resident());
    Ok(())
}
