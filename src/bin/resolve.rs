use clap::Parser;
use log::LevelFilter;
use shorturl_rs::{charset::Codes, registry, ConfigError, Outcome, Service};
use std::io::{BufRead, Write};

fn main() -> Result<(), Error> {
    let opts: Opts = Opts::parse();
    let _ = init_logging(opts.verbose);

    if opts.list {
        for name in registry::names() {
            println!("{}", name);
        }
        return Ok(());
    }

    let name = opts.service.as_deref().ok_or(Error::MissingService)?;
    let mut service = registry::build(name)?;

    let codes: Box<dyn Iterator<Item = Result<String, Error>>> = if !opts.codes.is_empty() {
        Box::new(opts.codes.into_iter().map(Ok))
    } else if let Some(start) = opts.start {
        let codes = Codes::new(service.charset(), start).take(opts.count);
        Box::new(codes.map(Ok))
    } else {
        Box::new(
            std::io::stdin()
                .lock()
                .lines()
                .map(|line| line.map_err(Error::from)),
        )
    };

    let mut writer = csv::WriterBuilder::new().from_writer(std::io::stdout());
    writer.write_record(["code", "outcome", "detail"])?;

    let interval = service.rate_limit().map(|limit| limit.interval());
    let mut first = true;

    for code in codes {
        let code = code?;
        let code = code.trim();

        if code.is_empty() {
            continue;
        }

        if !first {
            if let Some(interval) = interval {
                std::thread::sleep(interval);
            }
        }
        first = false;

        let outcome = resolve(service.as_mut(), code);
        log::info!("{}: {}", code, outcome.kind());

        write_outcome(&mut writer, code, &outcome)?;
    }

    std::io::stdout().flush()?;

    Ok(())
}

fn resolve(service: &mut dyn Service, code: &str) -> Outcome {
    Outcome::from(service.fetch(code))
}

/// Write one row with the detail bytes unchanged.
fn write_outcome<W: Write>(
    writer: &mut csv::Writer<W>,
    code: &str,
    outcome: &Outcome,
) -> Result<(), Error> {
    writer.write_record([
        code.as_bytes(),
        outcome.kind().as_bytes(),
        outcome.detail().unwrap_or_default(),
    ])?;
    writer.flush()?;

    Ok(())
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("I/O error")]
    Io(#[from] std::io::Error),
    #[error("CSV writing error")]
    Csv(#[from] csv::Error),
    #[error("Service configuration error")]
    Config(#[from] ConfigError),
    #[error("Logging initialization error")]
    LogInit(#[from] log::SetLoggerError),
    #[error("Must provide a service name")]
    MissingService,
}

#[derive(Parser)]
#[clap(name = "resolve", version, author)]
struct Opts {
    /// Level of verbosity
    #[clap(short, long, parse(from_occurrences))]
    verbose: i32,
    /// Print the names of the supported services
    #[clap(long)]
    list: bool,
    /// The service name (e.g. bitly)
    service: Option<String>,
    /// Codes to resolve (if not provided, will enumerate or read stdin)
    codes: Vec<String>,
    /// Enumerate codes from this index in the service's charset
    #[clap(long)]
    start: Option<u128>,
    /// Number of codes to enumerate
    #[clap(long, default_value = "100")]
    count: usize,
}

fn select_log_level_filter(verbosity: i32) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Off,
        1 => LevelFilter::Error,
        2 => LevelFilter::Warn,
        3 => LevelFilter::Info,
        4 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn init_logging(verbosity: i32) -> Result<(), log::SetLoggerError> {
    simplelog::TermLogger::init(
        select_log_level_filter(verbosity),
        simplelog::Config::default(),
        simplelog::TerminalMode::Stderr,
        simplelog::ColorChoice::Auto,
    )
}

#[cfg(test)]
mod tests {
    use super::write_outcome;
    use shorturl_rs::{LongUrl, Outcome};

    #[test]
    fn non_utf8_detail_is_written_unchanged() {
        let mut output = vec![];
        let mut writer = csv::WriterBuilder::new().from_writer(&mut output);
        let outcome = Outcome::LongUrl(LongUrl::from(&b"http://example.org/\xff"[..]));

        write_outcome(&mut writer, "abc", &outcome).unwrap();
        write_outcome(&mut writer, "def", &Outcome::NoRedirect).unwrap();
        drop(writer);

        assert_eq!(
            output,
            b"abc,redirect,http://example.org/\xff\ndef,no-redirect,\n".to_vec()
        );
    }
}
